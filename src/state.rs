// src/state.rs
use crate::auth;
use crate::game::GameLog;
use crate::models::{GameDraft, HoldingDraft, UserView, WatchlistDraft};
use crate::portfolio::{HoldingsStore, WatchlistStore};
use log::info;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const STARTING_BALANCE: f64 = 1_000_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingCredentials,
    NicknameTaken,
    InvalidCredentials,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "nickname and password are required"),
            AuthError::NicknameTaken => write!(f, "nickname is already registered"),
            AuthError::InvalidCredentials => write!(f, "authentication failed"),
        }
    }
}

#[derive(Clone, Debug)]
struct UserRecord {
    nickname: String,
    password_hash: String,
    balance: f64,
}

impl UserRecord {
    fn view(&self) -> UserView {
        UserView {
            nickname: self.nickname.clone(),
            balance: self.balance,
        }
    }
}

/// One user's session-scoped stores. Materialized on first touch; a fresh
/// account starts empty like a new browser session.
#[derive(Clone, Debug, Default)]
pub struct Account {
    pub watchlist: WatchlistStore,
    pub holdings: HoldingsStore,
    pub games: GameLog,
}

/// Whole-process in-memory state. Every mutation runs to completion under
/// the write guard, so store transitions never interleave.
pub struct AppState {
    users: RwLock<HashMap<String, UserRecord>>,
    accounts: RwLock<HashMap<String, Account>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new() -> SharedState {
        Arc::new(AppState {
            users: RwLock::new(HashMap::new()),
            accounts: RwLock::new(HashMap::new()),
        })
    }

    pub async fn register(&self, nickname: &str, password: &str) -> Result<UserView, AuthError> {
        if nickname.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let mut users = self.users.write().await;
        if users.contains_key(nickname) {
            return Err(AuthError::NicknameTaken);
        }
        let record = UserRecord {
            nickname: nickname.to_string(),
            password_hash: auth::hash_password(password),
            balance: STARTING_BALANCE,
        };
        let view = record.view();
        users.insert(nickname.to_string(), record);
        info!("Registered user {}", nickname);
        Ok(view)
    }

    pub async fn login(&self, nickname: &str, password: &str) -> Result<UserView, AuthError> {
        let users = self.users.read().await;
        let record = users.get(nickname).ok_or(AuthError::InvalidCredentials)?;
        if !auth::verify_password(password, &record.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(record.view())
    }

    pub async fn user_view(&self, nickname: &str) -> Option<UserView> {
        self.users.read().await.get(nickname).map(UserRecord::view)
    }

    /// Runs `f` against the user's account, creating an empty one first if
    /// this is the user's first touch.
    pub async fn with_account<R>(&self, user: &str, f: impl FnOnce(&mut Account) -> R) -> R {
        let mut accounts = self.accounts.write().await;
        let account = accounts.entry(user.to_string()).or_default();
        f(account)
    }

    /// Applies a fresh quote to every account tracking the symbol.
    pub async fn apply_quote(&self, symbol: &str, price: f64, change: f64, change_percent: f64) {
        let mut accounts = self.accounts.write().await;
        for account in accounts.values_mut() {
            account
                .watchlist
                .apply_quote(symbol, price, change, change_percent);
            account.holdings.apply_quote(symbol, price);
        }
    }

    /// Union of symbols any account watches or holds, for the refresh worker.
    pub async fn tracked_symbols(&self) -> Vec<String> {
        let accounts = self.accounts.read().await;
        let mut symbols = HashSet::new();
        for account in accounts.values() {
            for entry in account.watchlist.entries() {
                symbols.insert(entry.symbol.clone());
            }
            for holding in account.holdings.holdings() {
                symbols.insert(holding.symbol.clone());
            }
        }
        let mut symbols: Vec<String> = symbols.into_iter().collect();
        symbols.sort();
        symbols
    }

    /// Seeds the demo user with the sample rows the site ships with.
    pub async fn seed_demo(&self) {
        let _ = self.register("demo", "demo1234").await;
        self.with_account("demo", |account| {
            let _ = account.watchlist.add(&WatchlistDraft {
                symbol: "AAPL".to_string(),
                name: "Apple Inc.".to_string(),
                current_price: "178.50".to_string(),
            });
            let _ = account.watchlist.add(&WatchlistDraft {
                symbol: "NVDA".to_string(),
                name: "NVIDIA Corp.".to_string(),
                current_price: "875.20".to_string(),
            });
            let _ = account.holdings.add(&HoldingDraft {
                symbol: "005930".to_string(),
                name: "삼성전자".to_string(),
                quantity: "50".to_string(),
                avg_price: "68000".to_string(),
                current_price: "72500".to_string(),
                broker: "키움증권".to_string(),
            });
            let _ = account.holdings.add(&HoldingDraft {
                symbol: "AAPL".to_string(),
                name: "Apple Inc.".to_string(),
                quantity: "10".to_string(),
                avg_price: "165.00".to_string(),
                current_price: "178.50".to_string(),
                broker: "토스증권".to_string(),
            });
            let _ = account.games.append(&GameDraft {
                stock_name: "삼성전자".to_string(),
                date: Some("2026-01-25".to_string()),
                start_balance: "1000000".to_string(),
                end_balance: "1234500".to_string(),
                total_trades: "8".to_string(),
                duration: "15분 32초".to_string(),
            });
            let _ = account.games.append(&GameDraft {
                stock_name: "NVIDIA".to_string(),
                date: Some("2026-01-24".to_string()),
                start_balance: "1000000".to_string(),
                end_balance: "876000".to_string(),
                total_trades: "12".to_string(),
                duration: "22분 15초".to_string(),
            });
        })
        .await;
        info!("Seeded demo account");
    }
}
