// src/models.rs
use crate::broker::Broker;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};

/// Opaque entry id, 8 alphanumeric chars.
pub fn new_entry_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

// User-facing numeric fields arrive as form strings; bad input coerces to
// zero so derived totals stay computable.
pub fn parse_amount(input: &str) -> f64 {
    input.trim().parse().unwrap_or(0.0)
}

pub fn parse_quantity(input: &str) -> i64 {
    input.trim().parse().unwrap_or(0)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WatchlistEntry {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WatchlistDraft {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub current_price: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Holding {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub quantity: i64,
    pub avg_price: f64,
    pub current_price: f64,
    pub broker: Broker,
}

impl Holding {
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.avg_price
    }

    pub fn pl(&self) -> f64 {
        (self.current_price - self.avg_price) * self.quantity as f64
    }

    pub fn pl_percent(&self) -> f64 {
        if self.avg_price == 0.0 {
            0.0
        } else {
            (self.current_price - self.avg_price) / self.avg_price * 100.0
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HoldingDraft {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub avg_price: String,
    #[serde(default)]
    pub current_price: String,
    #[serde(default)]
    pub broker: String,
}

/// Holding enriched with display fields; built per read, never stored.
#[derive(Clone, Debug, Serialize)]
pub struct HoldingView {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub quantity: i64,
    pub avg_price: f64,
    pub current_price: f64,
    pub broker: String,
    pub broker_color: String,
    pub pl: f64,
    pub pl_percent: f64,
}

impl From<&Holding> for HoldingView {
    fn from(h: &Holding) -> Self {
        HoldingView {
            id: h.id.clone(),
            symbol: h.symbol.clone(),
            name: h.name.clone(),
            quantity: h.quantity,
            avg_price: h.avg_price,
            current_price: h.current_price,
            broker: h.broker.display_name().to_string(),
            broker_color: h.broker.color().to_string(),
            pl: h.pl(),
            pl_percent: h.pl_percent(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BrokerGroup {
    pub broker: String,
    pub color: String,
    pub stocks: Vec<HoldingView>,
    pub total: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PortfolioTotals {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_pl: f64,
    pub total_pl_percent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameRecord {
    pub id: String,
    pub date: String,
    pub stock_name: String,
    pub start_balance: f64,
    pub end_balance: f64,
    pub total_trades: i64,
    pub profit: f64,
    pub profit_percent: f64,
    pub result: GameResult,
    pub duration: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GameDraft {
    #[serde(default)]
    pub stock_name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub start_balance: String,
    #[serde(default)]
    pub end_balance: String,
    #[serde(default)]
    pub total_trades: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GameStats {
    pub total_games: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub best_return: f64,
    pub avg_return: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserView {
    pub nickname: String,
    pub balance: f64,
}
