// src/api.rs
use crate::auth;
use crate::error::CustomError;
use crate::game::game_stats;
use crate::models::{GameDraft, GameResult, HoldingDraft, HoldingView, UserView, WatchlistDraft};
use crate::portfolio::{compute_totals, group_by_broker, StoreError};
use crate::provider::{self, PriceClient};
use crate::rank::{mock_rankings, top_rankers, RankPeriod};
use crate::state::{AuthError, SharedState};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{reply, Filter, Rejection, Reply};

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    result: Option<String>,
}

pub fn routes(
    state: SharedState,
    prices: PriceClient,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    health()
        .or(auth_routes(state.clone()))
        .or(portfolio_routes(state.clone()))
        .or(history_routes(state))
        .or(rank_routes(prices.clone()))
        .or(stock_routes(prices))
}

fn health() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .map(|| "Stock Game Backend Server is up and running!")
}

fn auth_routes(state: SharedState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let register = warp::path!("api" / "auth" / "register")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(register_handler);

    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(login_handler);

    let me = warp::path!("api" / "auth" / "me")
        .and(warp::get())
        .and(warp::header::<String>("authorization"))
        .and(with_state(state))
        .and_then(me_handler);

    register.or(login).or(me)
}

fn portfolio_routes(
    state: SharedState,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let overview = warp::path!("api" / "portfolio" / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(portfolio_handler);

    let add_watch = warp::path!("api" / "portfolio" / String / "watchlist")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(add_watchlist_handler);

    let remove_watch = warp::path!("api" / "portfolio" / String / "watchlist" / String)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(remove_watchlist_handler);

    let add_holding = warp::path!("api" / "portfolio" / String / "holdings")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(add_holding_handler);

    let edit_holding = warp::path!("api" / "portfolio" / String / "holdings" / String)
        .and(warp::put())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(edit_holding_handler);

    let remove_holding = warp::path!("api" / "portfolio" / String / "holdings" / String)
        .and(warp::delete())
        .and(with_state(state))
        .and_then(remove_holding_handler);

    overview
        .or(add_watch)
        .or(remove_watch)
        .or(add_holding)
        .or(edit_holding)
        .or(remove_holding)
}

fn history_routes(
    state: SharedState,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("api" / "history" / String)
        .and(warp::get())
        .and(warp::query::<HistoryQuery>())
        .and(with_state(state.clone()))
        .and_then(history_handler);

    let record = warp::path!("api" / "history" / String)
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(record_game_handler);

    let remove = warp::path!("api" / "history" / String / String)
        .and(warp::delete())
        .and(with_state(state))
        .and_then(remove_game_handler);

    list.or(record).or(remove)
}

fn rank_routes(prices: PriceClient) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    // "stocks" must be matched before the generic period segment
    let stocks = warp::path!("api" / "rank" / "stocks")
        .and(warp::get())
        .and(with_prices(prices))
        .and_then(stock_rank_handler);

    let traders = warp::path!("api" / "rank" / String)
        .and(warp::get())
        .and_then(rank_handler);

    stocks.or(traders)
}

fn stock_routes(prices: PriceClient) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let search = warp::path!("api" / "stocks" / "search")
        .and(warp::get())
        .and(warp::query::<SearchQuery>())
        .and(with_prices(prices.clone()))
        .and_then(search_handler);

    let price = warp::path!("api" / "stocks" / "price" / String)
        .and(warp::get())
        .and(with_prices(prices.clone()))
        .and_then(price_handler);

    let popular = warp::path!("api" / "stocks" / "popular")
        .and(warp::get())
        .and(with_prices(prices.clone()))
        .and_then(popular_handler);

    let latest = warp::path!("api" / "stock" / "latest")
        .and(warp::get())
        .and(with_prices(prices))
        .and_then(latest_handler);

    search.or(price).or(popular).or(latest)
}

fn with_state(
    state: SharedState,
) -> impl Filter<Extract = (SharedState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_prices(
    prices: PriceClient,
) -> impl Filter<Extract = (PriceClient,), Error = Infallible> + Clone {
    warp::any().map(move || prices.clone())
}

fn store_error_reply(err: StoreError) -> reply::WithStatus<reply::Json> {
    let code = match err {
        StoreError::MissingField => StatusCode::BAD_REQUEST,
        StoreError::DuplicateSymbol => StatusCode::CONFLICT,
        StoreError::NotFound => StatusCode::NOT_FOUND,
    };
    reply::with_status(reply::json(&json!({ "error": err.to_string() })), code)
}

fn auth_error_reply(err: AuthError) -> reply::WithStatus<reply::Json> {
    let code = match err {
        AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
        AuthError::NicknameTaken => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
    };
    reply::with_status(reply::json(&json!({ "error": err.to_string() })), code)
}

fn token_reply(
    user: UserView,
    code: StatusCode,
) -> Result<reply::WithStatus<reply::Json>, Rejection> {
    let token = auth::create_token(&user.nickname)
        .map_err(|e| CustomError::reject(format!("token creation failed: {}", e)))?;
    Ok(reply::with_status(
        reply::json(&json!({ "token": token, "user": user })),
        code,
    ))
}

async fn register_handler(
    state: SharedState,
    creds: Credentials,
) -> Result<impl Reply, Rejection> {
    match state.register(&creds.nickname, &creds.password).await {
        Ok(user) => token_reply(user, StatusCode::CREATED),
        Err(e) => {
            warn!("Registration rejected for {}: {}", creds.nickname, e);
            Ok(auth_error_reply(e))
        }
    }
}

async fn login_handler(state: SharedState, creds: Credentials) -> Result<impl Reply, Rejection> {
    match state.login(&creds.nickname, &creds.password).await {
        Ok(user) => {
            info!("User {} logged in", user.nickname);
            token_reply(user, StatusCode::OK)
        }
        Err(e) => {
            warn!("Login rejected for {}", creds.nickname);
            Ok(auth_error_reply(e))
        }
    }
}

async fn me_handler(authorization: String, state: SharedState) -> Result<impl Reply, Rejection> {
    let token = authorization
        .strip_prefix("Bearer ")
        .unwrap_or(&authorization);
    let nickname = match auth::verify_token(token) {
        Ok(nickname) => nickname,
        Err(_) => return Ok(auth_error_reply(AuthError::InvalidCredentials)),
    };
    match state.user_view(&nickname).await {
        Some(user) => Ok(reply::with_status(reply::json(&user), StatusCode::OK)),
        None => Ok(auth_error_reply(AuthError::InvalidCredentials)),
    }
}

async fn portfolio_handler(user: String, state: SharedState) -> Result<impl Reply, Rejection> {
    let body = state
        .with_account(&user, |account| {
            let holdings = account.holdings.holdings();
            json!({
                "watchlist": account.watchlist.entries(),
                "holdings": holdings.iter().map(HoldingView::from).collect::<Vec<_>>(),
                "totals": compute_totals(holdings),
                "brokers": group_by_broker(holdings),
                "game_stats": game_stats(account.games.records()),
            })
        })
        .await;
    Ok(reply::json(&body))
}

async fn add_watchlist_handler(
    user: String,
    state: SharedState,
    draft: WatchlistDraft,
) -> Result<impl Reply, Rejection> {
    let result = state
        .with_account(&user, move |account| account.watchlist.add(&draft))
        .await;
    match result {
        Ok(entry) => {
            info!("Watchlist add for {}: {}", user, entry.symbol);
            Ok(reply::with_status(
                reply::json(&entry),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Ok(store_error_reply(e)),
    }
}

async fn remove_watchlist_handler(
    user: String,
    id: String,
    state: SharedState,
) -> Result<impl Reply, Rejection> {
    let removed = state
        .with_account(&user, |account| account.watchlist.remove(&id))
        .await;
    if removed {
        Ok(reply::with_status(
            reply::json(&json!({ "message": "removed" })),
            StatusCode::OK,
        ))
    } else {
        Ok(store_error_reply(StoreError::NotFound))
    }
}

async fn add_holding_handler(
    user: String,
    state: SharedState,
    draft: HoldingDraft,
) -> Result<impl Reply, Rejection> {
    let result = state
        .with_account(&user, move |account| account.holdings.add(&draft))
        .await;
    match result {
        Ok(holding) => {
            info!("Holding add for {}: {}", user, holding.symbol);
            Ok(reply::with_status(
                reply::json(&HoldingView::from(&holding)),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Ok(store_error_reply(e)),
    }
}

async fn edit_holding_handler(
    user: String,
    id: String,
    state: SharedState,
    draft: HoldingDraft,
) -> Result<impl Reply, Rejection> {
    let result = state
        .with_account(&user, move |account| account.holdings.edit(&id, &draft))
        .await;
    match result {
        Ok(holding) => Ok(reply::with_status(
            reply::json(&HoldingView::from(&holding)),
            StatusCode::OK,
        )),
        Err(e) => Ok(store_error_reply(e)),
    }
}

async fn remove_holding_handler(
    user: String,
    id: String,
    state: SharedState,
) -> Result<impl Reply, Rejection> {
    let removed = state
        .with_account(&user, |account| account.holdings.remove(&id))
        .await;
    if removed {
        Ok(reply::with_status(
            reply::json(&json!({ "message": "removed" })),
            StatusCode::OK,
        ))
    } else {
        Ok(store_error_reply(StoreError::NotFound))
    }
}

async fn history_handler(
    user: String,
    query: HistoryQuery,
    state: SharedState,
) -> Result<impl Reply, Rejection> {
    let filter = match query.result.as_deref() {
        Some("win") => Some(GameResult::Win),
        Some("loss") => Some(GameResult::Loss),
        _ => None,
    };
    let body = state
        .with_account(&user, move |account| {
            json!({
                "records": account.games.filtered(filter),
                "stats": game_stats(account.games.records()),
            })
        })
        .await;
    Ok(reply::json(&body))
}

async fn record_game_handler(
    user: String,
    state: SharedState,
    draft: GameDraft,
) -> Result<impl Reply, Rejection> {
    let result = state
        .with_account(&user, move |account| account.games.append(&draft))
        .await;
    match result {
        Ok(record) => {
            info!("Game recorded for {}: {}", user, record.stock_name);
            Ok(reply::with_status(
                reply::json(&record),
                StatusCode::CREATED,
            ))
        }
        Err(e) => Ok(store_error_reply(e)),
    }
}

async fn remove_game_handler(
    user: String,
    id: String,
    state: SharedState,
) -> Result<impl Reply, Rejection> {
    let removed = state
        .with_account(&user, |account| account.games.remove(&id))
        .await;
    if removed {
        Ok(reply::with_status(
            reply::json(&json!({ "message": "removed" })),
            StatusCode::OK,
        ))
    } else {
        Ok(store_error_reply(StoreError::NotFound))
    }
}

async fn rank_handler(period: String) -> Result<impl Reply, Rejection> {
    match RankPeriod::parse(&period) {
        Some(parsed) => {
            let rankings = mock_rankings(parsed, 20);
            Ok(reply::with_status(
                reply::json(&json!({
                    "period": period,
                    "top_rankers": top_rankers(&rankings),
                    "rankings": rankings,
                })),
                StatusCode::OK,
            ))
        }
        None => Ok(reply::with_status(
            reply::json(&json!({ "error": "unknown ranking period" })),
            StatusCode::BAD_REQUEST,
        )),
    }
}

async fn stock_rank_handler(prices: PriceClient) -> Result<impl Reply, Rejection> {
    let quotes = match prices.popular().await {
        Ok(quotes) => quotes,
        Err(e) => {
            warn!("Popular quotes unavailable, serving fallback: {}", e);
            provider::fallback_popular()
        }
    };
    let top: Vec<_> = quotes.into_iter().take(5).collect();
    Ok(reply::json(&top))
}

async fn search_handler(query: SearchQuery, prices: PriceClient) -> Result<impl Reply, Rejection> {
    if query.q.is_empty() {
        return Ok(reply::with_status(
            reply::json(&json!({ "error": "query parameter \"q\" is required" })),
            StatusCode::BAD_REQUEST,
        ));
    }
    match prices.search(&query.q).await {
        Ok(hits) => Ok(reply::with_status(reply::json(&hits), StatusCode::OK)),
        Err(e) => {
            error!("Stock search failed: {}", e);
            Err(CustomError::reject(format!("stock search failed: {}", e)))
        }
    }
}

async fn price_handler(symbol: String, prices: PriceClient) -> Result<impl Reply, Rejection> {
    match prices.price_of(&symbol).await {
        Ok(quote) => Ok(reply::json(&quote)),
        Err(e) => {
            error!("Price lookup failed for {}: {}", symbol, e);
            Err(CustomError::reject(format!(
                "price lookup failed for {}",
                symbol
            )))
        }
    }
}

async fn popular_handler(prices: PriceClient) -> Result<impl Reply, Rejection> {
    match prices.popular().await {
        Ok(quotes) => Ok(reply::json(&quotes)),
        Err(e) => {
            error!("Popular stocks fetch failed: {}", e);
            Err(CustomError::reject("popular stocks fetch failed"))
        }
    }
}

async fn latest_handler(prices: PriceClient) -> Result<impl Reply, Rejection> {
    // 005930 stands in for "the market" the way the legacy endpoint did;
    // a dead provider degrades to a fabricated quote.
    let quote = match prices.price_of("005930").await {
        Ok(quote) => quote,
        Err(_) => provider::mock_latest(),
    };
    Ok(reply::json(&quote))
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(custom) = err.find::<CustomError>() {
        (StatusCode::INTERNAL_SERVER_ERROR, custom.message.clone())
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, "invalid request body".to_string())
    } else if err.find::<warp::reject::MissingHeader>().is_some() {
        (
            StatusCode::UNAUTHORIZED,
            "authorization header required".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed".to_string(),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
        )
    };
    Ok(reply::with_status(
        reply::json(&json!({ "error": message })),
        code,
    ))
}
