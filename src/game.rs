// src/game.rs
use crate::models::{
    new_entry_id, parse_amount, parse_quantity, GameDraft, GameRecord, GameResult, GameStats,
};
use crate::portfolio::StoreError;
use chrono::Utc;

/// Append-only log of finished game rounds for one user.
#[derive(Clone, Debug, Default)]
pub struct GameLog {
    records: Vec<GameRecord>,
}

impl GameLog {
    pub fn new() -> Self {
        GameLog::default()
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Profit, return percent and the win/loss outcome are derived from the
    /// submitted balances at record time.
    pub fn append(&mut self, draft: &GameDraft) -> Result<GameRecord, StoreError> {
        if draft.stock_name.is_empty() {
            return Err(StoreError::MissingField);
        }
        let start_balance = parse_amount(&draft.start_balance);
        let end_balance = parse_amount(&draft.end_balance);
        let profit = end_balance - start_balance;
        let profit_percent = if start_balance > 0.0 {
            profit / start_balance * 100.0
        } else {
            0.0
        };
        let record = GameRecord {
            id: new_entry_id(),
            date: draft
                .date
                .clone()
                .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
            stock_name: draft.stock_name.clone(),
            start_balance,
            end_balance,
            total_trades: parse_quantity(&draft.total_trades),
            profit,
            profit_percent,
            result: if profit >= 0.0 {
                GameResult::Win
            } else {
                GameResult::Loss
            },
            duration: draft.duration.clone(),
        };
        self.records.push(record.clone());
        Ok(record)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() < before
    }

    pub fn filtered(&self, result: Option<GameResult>) -> Vec<GameRecord> {
        self.records
            .iter()
            .filter(|r| result.map_or(true, |wanted| r.result == wanted))
            .cloned()
            .collect()
    }
}

/// Aggregate stats over a record snapshot; empty input yields all zeros.
pub fn game_stats(records: &[GameRecord]) -> GameStats {
    let total_games = records.len();
    if total_games == 0 {
        return GameStats::default();
    }
    let wins = records
        .iter()
        .filter(|r| r.result == GameResult::Win)
        .count();
    let losses = total_games - wins;
    let total_profit: f64 = records.iter().map(|r| r.profit).sum();
    let best_return = records
        .iter()
        .map(|r| r.profit_percent)
        .fold(f64::NEG_INFINITY, f64::max);
    let avg_return =
        records.iter().map(|r| r.profit_percent).sum::<f64>() / total_games as f64;
    GameStats {
        total_games,
        wins,
        losses,
        win_rate: wins as f64 / total_games as f64 * 100.0,
        total_profit,
        best_return,
        avg_return,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(stock: &str, start: &str, end: &str) -> GameDraft {
        GameDraft {
            stock_name: stock.to_string(),
            date: Some("2026-01-25".to_string()),
            start_balance: start.to_string(),
            end_balance: end.to_string(),
            total_trades: "8".to_string(),
            duration: "15분 32초".to_string(),
        }
    }

    #[test]
    fn append_derives_profit_and_outcome() {
        let mut log = GameLog::new();
        let win = log.append(&round("삼성전자", "1000000", "1234500")).unwrap();
        assert_eq!(win.profit, 234_500.0);
        assert!((win.profit_percent - 23.45).abs() < 1e-9);
        assert_eq!(win.result, GameResult::Win);

        let loss = log.append(&round("NVIDIA", "1000000", "876000")).unwrap();
        assert_eq!(loss.profit, -124_000.0);
        assert_eq!(loss.result, GameResult::Loss);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn missing_stock_name_rejects() {
        let mut log = GameLog::new();
        assert_eq!(
            log.append(&round("", "1000000", "1100000")),
            Err(StoreError::MissingField)
        );
        assert!(log.is_empty());
    }

    #[test]
    fn zero_start_balance_guards_percent() {
        let mut log = GameLog::new();
        let record = log.append(&round("카카오", "abc", "89000")).unwrap();
        assert_eq!(record.start_balance, 0.0);
        assert_eq!(record.profit_percent, 0.0);
    }

    #[test]
    fn stats_over_mixed_records() {
        let mut log = GameLog::new();
        log.append(&round("삼성전자", "1000000", "1234500")).unwrap();
        log.append(&round("NVIDIA", "1000000", "876000")).unwrap();
        log.append(&round("카카오", "1000000", "1089000")).unwrap();

        let stats = game_stats(log.records());
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert!((stats.win_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.total_profit, 234_500.0 - 124_000.0 + 89_000.0);
        assert!((stats.best_return - 23.45).abs() < 1e-9);
        assert!((stats.avg_return - (23.45 - 12.4 + 8.9) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn stats_of_empty_log_are_zero() {
        assert_eq!(game_stats(&[]), GameStats::default());
    }

    #[test]
    fn filter_by_outcome() {
        let mut log = GameLog::new();
        log.append(&round("삼성전자", "1000000", "1234500")).unwrap();
        log.append(&round("NVIDIA", "1000000", "876000")).unwrap();

        assert_eq!(log.filtered(None).len(), 2);
        let wins = log.filtered(Some(GameResult::Win));
        assert_eq!(wins.len(), 1);
        assert_eq!(wins[0].stock_name, "삼성전자");
    }

    #[test]
    fn record_removal_is_idempotent() {
        let mut log = GameLog::new();
        let record = log.append(&round("삼성전자", "1000000", "1234500")).unwrap();
        assert!(!log.remove("missing"));
        assert!(log.remove(&record.id));
        assert!(!log.remove(&record.id));
        assert!(log.is_empty());
    }
}
