// src/portfolio.rs
use crate::broker::Broker;
use crate::models::{
    new_entry_id, parse_amount, parse_quantity, BrokerGroup, Holding, HoldingDraft, HoldingView,
    PortfolioTotals, WatchlistDraft, WatchlistEntry,
};
use std::fmt;

/// Rejections a store mutation can report. Rejected mutations leave the
/// store untouched; nothing here ever panics or crosses the API as a panic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreError {
    MissingField,
    DuplicateSymbol,
    NotFound,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::MissingField => write!(f, "symbol and name are required"),
            StoreError::DuplicateSymbol => write!(f, "symbol is already on the watchlist"),
            StoreError::NotFound => write!(f, "no entry with that id"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Tracked-but-not-owned symbols, insertion order preserved for display.
#[derive(Clone, Debug, Default)]
pub struct WatchlistStore {
    entries: Vec<WatchlistEntry>,
}

impl WatchlistStore {
    pub fn new() -> Self {
        WatchlistStore::default()
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds a symbol. Symbols are normalized to upper case and must be
    /// unique case-insensitively; change fields start at zero.
    pub fn add(&mut self, draft: &WatchlistDraft) -> Result<WatchlistEntry, StoreError> {
        if draft.symbol.is_empty() || draft.name.is_empty() {
            return Err(StoreError::MissingField);
        }
        let symbol = draft.symbol.to_uppercase();
        if self
            .entries
            .iter()
            .any(|e| e.symbol.eq_ignore_ascii_case(&symbol))
        {
            return Err(StoreError::DuplicateSymbol);
        }
        let entry = WatchlistEntry {
            id: new_entry_id(),
            symbol,
            name: draft.name.clone(),
            current_price: parse_amount(&draft.current_price),
            change: 0.0,
            change_percent: 0.0,
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Removing an absent id is a no-op, not an error.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() < before
    }

    /// Replaces the price fields of the entry tracking `symbol`. Used by the
    /// quote refresh collaborator; there is no user-facing edit operation.
    pub fn apply_quote(&mut self, symbol: &str, price: f64, change: f64, change_percent: f64) {
        for entry in &mut self.entries {
            if entry.symbol.eq_ignore_ascii_case(symbol) {
                entry.current_price = price;
                entry.change = change;
                entry.change_percent = change_percent;
            }
        }
    }
}

/// Owned positions, insertion order preserved; edits keep id and position.
#[derive(Clone, Debug, Default)]
pub struct HoldingsStore {
    holdings: Vec<Holding>,
}

impl HoldingsStore {
    pub fn new() -> Self {
        HoldingsStore::default()
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.id == id)
    }

    pub fn add(&mut self, draft: &HoldingDraft) -> Result<Holding, StoreError> {
        if draft.symbol.is_empty() || draft.name.is_empty() {
            return Err(StoreError::MissingField);
        }
        let holding = Self::materialize(new_entry_id(), draft);
        self.holdings.push(holding.clone());
        Ok(holding)
    }

    /// Replaces every field of the matching holding in place; the id and the
    /// position in the collection are preserved.
    pub fn edit(&mut self, id: &str, draft: &HoldingDraft) -> Result<Holding, StoreError> {
        if draft.symbol.is_empty() || draft.name.is_empty() {
            return Err(StoreError::MissingField);
        }
        let slot = self
            .holdings
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(StoreError::NotFound)?;
        *slot = Self::materialize(id.to_string(), draft);
        Ok(slot.clone())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.holdings.len();
        self.holdings.retain(|h| h.id != id);
        self.holdings.len() < before
    }

    pub fn apply_quote(&mut self, symbol: &str, price: f64) {
        for holding in &mut self.holdings {
            if holding.symbol.eq_ignore_ascii_case(symbol) {
                holding.current_price = price;
            }
        }
    }

    fn materialize(id: String, draft: &HoldingDraft) -> Holding {
        Holding {
            id,
            symbol: draft.symbol.to_uppercase(),
            name: draft.name.clone(),
            quantity: parse_quantity(&draft.quantity),
            avg_price: parse_amount(&draft.avg_price),
            current_price: parse_amount(&draft.current_price),
            broker: Broker::resolve(&draft.broker),
        }
    }
}

/// Totals over the current holdings snapshot. Recomputed on every read;
/// an empty collection yields all zeros rather than dividing by zero.
pub fn compute_totals(holdings: &[Holding]) -> PortfolioTotals {
    let total_value: f64 = holdings.iter().map(Holding::market_value).sum();
    let total_cost: f64 = holdings.iter().map(Holding::cost_basis).sum();
    let total_pl = total_value - total_cost;
    let total_pl_percent = if total_cost > 0.0 {
        total_pl / total_cost * 100.0
    } else {
        0.0
    };
    PortfolioTotals {
        total_value,
        total_cost,
        total_pl,
        total_pl_percent,
    }
}

/// Groups holdings by broker in first-seen order. Per-holding P&L is
/// computed while building the view and never stored.
pub fn group_by_broker(holdings: &[Holding]) -> Vec<BrokerGroup> {
    let mut groups: Vec<BrokerGroup> = Vec::new();
    for holding in holdings {
        let name = holding.broker.display_name();
        let index = match groups.iter().position(|g| g.broker == name) {
            Some(index) => index,
            None => {
                groups.push(BrokerGroup {
                    broker: name.to_string(),
                    color: holding.broker.color().to_string(),
                    stocks: Vec::new(),
                    total: 0.0,
                });
                groups.len() - 1
            }
        };
        groups[index].total += holding.market_value();
        groups[index].stocks.push(HoldingView::from(holding));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch(symbol: &str, name: &str) -> WatchlistDraft {
        WatchlistDraft {
            symbol: symbol.to_string(),
            name: name.to_string(),
            current_price: String::new(),
        }
    }

    fn hold(symbol: &str, qty: &str, avg: &str, current: &str, broker: &str) -> HoldingDraft {
        HoldingDraft {
            symbol: symbol.to_string(),
            name: format!("{} Inc.", symbol),
            quantity: qty.to_string(),
            avg_price: avg.to_string(),
            current_price: current.to_string(),
            broker: broker.to_string(),
        }
    }

    #[test]
    fn add_normalizes_symbol_and_defaults_change() {
        let mut store = WatchlistStore::new();
        let entry = store
            .add(&WatchlistDraft {
                symbol: "aapl".to_string(),
                name: "Apple Inc.".to_string(),
                current_price: "178.50".to_string(),
            })
            .unwrap();
        assert_eq!(entry.symbol, "AAPL");
        assert_eq!(entry.current_price, 178.50);
        assert_eq!(entry.change, 0.0);
        assert_eq!(entry.change_percent, 0.0);
    }

    #[test]
    fn duplicate_symbol_is_rejected_any_case() {
        let mut store = WatchlistStore::new();
        store.add(&watch("AAPL", "Apple Inc.")).unwrap();
        let snapshot = store.entries().to_vec();

        assert_eq!(
            store.add(&watch("AAPL", "Apple Inc.")),
            Err(StoreError::DuplicateSymbol)
        );
        assert_eq!(
            store.add(&watch("aApL", "Apple again")),
            Err(StoreError::DuplicateSymbol)
        );
        assert_eq!(store.entries(), snapshot.as_slice());
    }

    #[test]
    fn missing_fields_reject_without_mutation() {
        let mut store = WatchlistStore::new();
        assert_eq!(store.add(&watch("", "Apple")), Err(StoreError::MissingField));
        assert_eq!(store.add(&watch("AAPL", "")), Err(StoreError::MissingField));
        assert!(store.is_empty());

        let mut holdings = HoldingsStore::new();
        let mut draft = hold("AAPL", "10", "165", "178.5", "토스증권");
        draft.name.clear();
        assert_eq!(holdings.add(&draft), Err(StoreError::MissingField));
        assert!(holdings.is_empty());
    }

    #[test]
    fn watchlist_removal_is_idempotent() {
        let mut store = WatchlistStore::new();
        let entry = store.add(&watch("NVDA", "NVIDIA Corp.")).unwrap();
        assert!(!store.remove("no-such-id"));
        assert_eq!(store.len(), 1);
        assert!(store.remove(&entry.id));
        assert!(store.is_empty());
        assert!(!store.remove(&entry.id));
    }

    #[test]
    fn edit_preserves_id_and_position() {
        let mut store = HoldingsStore::new();
        let first = store.add(&hold("005930", "50", "68000", "72500", "키움증권")).unwrap();
        let second = store.add(&hold("AAPL", "10", "165", "178.5", "토스증권")).unwrap();

        let edited = store
            .edit(&first.id, &hold("005930", "60", "69000", "71000", "미래에셋"))
            .unwrap();
        assert_eq!(edited.id, first.id);
        assert_eq!(edited.quantity, 60);
        assert_eq!(edited.avg_price, 69000.0);
        assert_eq!(edited.broker, Broker::MiraeAsset);

        assert_eq!(store.len(), 2);
        assert_eq!(store.holdings()[0].id, first.id);
        assert_eq!(store.holdings()[1], second);
        assert_eq!(store.get(&first.id).unwrap().quantity, 60);
    }

    #[test]
    fn edit_of_missing_id_leaves_store_unchanged() {
        let mut store = HoldingsStore::new();
        store.add(&hold("AAPL", "10", "165", "178.5", "토스증권")).unwrap();
        let snapshot = store.holdings().to_vec();

        let result = store.edit("missing", &hold("TSLA", "5", "200", "210", "키움증권"));
        assert_eq!(result, Err(StoreError::NotFound));
        assert_eq!(store.holdings(), snapshot.as_slice());
    }

    #[test]
    fn holdings_removal_is_idempotent() {
        let mut store = HoldingsStore::new();
        let holding = store.add(&hold("AAPL", "10", "165", "178.5", "토스증권")).unwrap();
        assert!(!store.remove("missing"));
        assert_eq!(store.len(), 1);
        assert!(store.remove(&holding.id));
        assert!(store.get(&holding.id).is_none());
        assert!(!store.remove(&holding.id));
    }

    #[test]
    fn totals_over_concrete_scenario() {
        let mut store = HoldingsStore::new();
        store.add(&hold("005930", "50", "68000", "72500", "키움증권")).unwrap();
        store.add(&hold("AAPL", "10", "165.00", "178.50", "토스증권")).unwrap();

        let totals = compute_totals(store.holdings());
        assert_eq!(totals.total_value, 3_626_785.0);
        assert_eq!(totals.total_cost, 3_401_650.0);
        assert_eq!(totals.total_pl, 225_135.0);
        let expected_percent = 225_135.0 / 3_401_650.0 * 100.0;
        assert!((totals.total_pl_percent - expected_percent).abs() < 1e-9);
    }

    #[test]
    fn empty_holdings_yield_zero_totals() {
        assert_eq!(compute_totals(&[]), PortfolioTotals::default());
    }

    #[test]
    fn broker_groups_keep_first_seen_order() {
        let mut store = HoldingsStore::new();
        store.add(&hold("005930", "50", "68000", "72500", "키움증권")).unwrap();
        store.add(&hold("AAPL", "10", "165", "178.5", "토스증권")).unwrap();
        store.add(&hold("000660", "5", "700000", "767000", "키움증권")).unwrap();

        let groups = group_by_broker(store.holdings());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].broker, "키움증권");
        assert_eq!(groups[1].broker, "토스증권");
        assert_eq!(groups[0].stocks.len(), 2);
        assert_eq!(groups[0].total, 50.0 * 72500.0 + 5.0 * 767000.0);
        assert_eq!(groups[0].color, "#FF6B00");
    }

    #[test]
    fn per_holding_pl_is_computed_in_grouping_pass() {
        let mut store = HoldingsStore::new();
        store.add(&hold("AAPL", "10", "165", "178.5", "토스증권")).unwrap();
        store.add(&hold("FREE", "10", "0", "5", "토스증권")).unwrap();

        let groups = group_by_broker(store.holdings());
        let stocks = &groups[0].stocks;
        assert!((stocks[0].pl - 135.0).abs() < 1e-9);
        assert!((stocks[0].pl_percent - (13.5 / 165.0 * 100.0)).abs() < 1e-9);
        // zero average cost must not divide by zero
        assert_eq!(stocks[1].pl_percent, 0.0);
        assert_eq!(stocks[1].pl, 50.0);
    }

    #[test]
    fn non_numeric_input_coerces_to_zero() {
        let mut store = HoldingsStore::new();
        let holding = store.add(&hold("AAPL", "abc", "", "178.5", "토스증권")).unwrap();
        assert_eq!(holding.quantity, 0);
        assert_eq!(holding.avg_price, 0.0);

        let totals = compute_totals(store.holdings());
        assert_eq!(totals.total_value, 0.0);
        assert_eq!(totals.total_pl_percent, 0.0);
    }

    #[test]
    fn unknown_broker_falls_back_to_default() {
        let mut store = HoldingsStore::new();
        let holding = store.add(&hold("AAPL", "1", "1", "1", "Robinhood")).unwrap();
        assert_eq!(holding.broker, Broker::DEFAULT);
    }
}
