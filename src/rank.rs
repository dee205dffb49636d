// src/rank.rs
use chrono::Utc;
use rand::{thread_rng, Rng};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RankPeriod {
    Live,
    Weekly,
    Monthly,
}

impl RankPeriod {
    pub fn parse(value: &str) -> Option<RankPeriod> {
        match value {
            "live" => Some(RankPeriod::Live),
            "weekly" => Some(RankPeriod::Weekly),
            "monthly" => Some(RankPeriod::Monthly),
            _ => None,
        }
    }

    // (floor, span) of the fabricated profit distribution per period.
    fn profit_range(&self) -> (f64, f64) {
        match self {
            RankPeriod::Live => (-2_000_000.0, 10_000_000.0),
            RankPeriod::Weekly => (-5_000_000.0, 20_000_000.0),
            RankPeriod::Monthly => (-10_000_000.0, 50_000_000.0),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TraderRank {
    pub rank: usize,
    pub name: String,
    pub profit: f64,
    pub change_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_trades: Option<u32>,
    pub last_updated: String,
}

/// Fabricated trader leaderboard, sorted by profit with ranks reassigned
/// from the sorted order. There is no real ranking backend yet.
pub fn mock_rankings(period: RankPeriod, count: usize) -> Vec<TraderRank> {
    let mut rng = thread_rng();
    let (floor, span) = period.profit_range();
    let now = Utc::now().to_rfc3339();
    let mut traders: Vec<TraderRank> = (1..=count)
        .map(|i| TraderRank {
            rank: i,
            name: format!("Trader{}", i),
            profit: (floor + rng.gen_range(0.0..span)).floor(),
            change_percent: (rng.gen_range::<f64, _>(-20.0..20.0) * 100.0).round() / 100.0,
            win_rate: match period {
                RankPeriod::Live => None,
                _ => Some(rng.gen_range(0..100)),
            },
            total_trades: match period {
                RankPeriod::Live => None,
                _ => Some(rng.gen_range(10..110)),
            },
            last_updated: now.clone(),
        })
        .collect();
    traders.sort_by(|a, b| b.profit.partial_cmp(&a.profit).unwrap_or(Ordering::Equal));
    for (index, trader) in traders.iter_mut().enumerate() {
        trader.rank = index + 1;
    }
    traders
}

/// Podium slice for the top-rankers view.
pub fn top_rankers(rankings: &[TraderRank]) -> Vec<TraderRank> {
    rankings.iter().take(3).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_periods() {
        assert_eq!(RankPeriod::parse("live"), Some(RankPeriod::Live));
        assert_eq!(RankPeriod::parse("weekly"), Some(RankPeriod::Weekly));
        assert_eq!(RankPeriod::parse("monthly"), Some(RankPeriod::Monthly));
        assert_eq!(RankPeriod::parse("yearly"), None);
    }

    #[test]
    fn rankings_are_sorted_and_contiguous() {
        let rankings = mock_rankings(RankPeriod::Live, 20);
        assert_eq!(rankings.len(), 20);
        for (index, trader) in rankings.iter().enumerate() {
            assert_eq!(trader.rank, index + 1);
            if index > 0 {
                assert!(rankings[index - 1].profit >= trader.profit);
            }
        }
    }

    #[test]
    fn live_rankings_omit_period_stats() {
        let live = mock_rankings(RankPeriod::Live, 5);
        assert!(live.iter().all(|t| t.win_rate.is_none()));
        let weekly = mock_rankings(RankPeriod::Weekly, 5);
        assert!(weekly.iter().all(|t| t.win_rate.is_some() && t.total_trades.is_some()));
    }

    #[test]
    fn podium_takes_top_three() {
        let rankings = mock_rankings(RankPeriod::Monthly, 20);
        let podium = top_rankers(&rankings);
        assert_eq!(podium.len(), 3);
        assert_eq!(podium[0].rank, 1);
        assert_eq!(podium[2].rank, 3);
    }
}
