// src/main.rs
use env_logger::Builder;
use log::{info, LevelFilter};
use std::env;
use stock_game::api;
use stock_game::provider::PriceClient;
use stock_game::state::{AppState, SharedState};
use tokio::sync::mpsc;
use tokio::task;
use tokio::time::{self, Duration};
use warp::Filter;

async fn refresh_worker(state: SharedState, prices: PriceClient, mut rx: mpsc::Receiver<String>) {
    while let Some(symbol) = rx.recv().await {
        if let Some(quote) = prices.quote_or_none(&symbol).await {
            state
                .apply_quote(&symbol, quote.price, quote.change, quote.change_rate)
                .await;
            info!("Refreshed {} at {}", symbol, quote.price);
        }
    }
}

#[tokio::main]
async fn main() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    info!("Starting the stock game server...");
    let state = AppState::new();
    state.seed_demo().await;

    let prices = PriceClient::from_env();
    let (tx, rx) = mpsc::channel(100);

    let worker_state = state.clone();
    let worker_prices = prices.clone();
    task::spawn(async move {
        refresh_worker(worker_state, worker_prices, rx).await;
    });

    // Periodically re-enqueue every tracked symbol for a quote refresh.
    let ticker_state = state.clone();
    task::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            for symbol in ticker_state.tracked_symbols().await {
                if tx.send(symbol).await.is_err() {
                    return;
                }
            }
        }
    });

    let port: u16 = env::var("STOCK_GAME_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let routes = api::routes(state, prices).recover(api::handle_rejection);

    info!("Server running on http://127.0.0.1:{}", port);
    warp::serve(routes).run(([127, 0, 0, 1], port)).await;
}
