//! Position Board
//!
//! Holds the latest inputs from the four collaborators (positions, quotes,
//! margins, exposures) and rebuilds the decorated row set plus portfolio
//! totals wholesale on every input change. Derived state is never patched in
//! place; superseded passes are simply overwritten (last-write-wins), which
//! keeps the merge commutative over fetch completion order.

use crate::config::RefreshConfig;
use crate::services::cache::TtlCache;
use crate::services::valuation::{fold_portfolio, margin_items, quote_keys, value_positions};
use crate::services::SessionState;
use crate::sources::{MarginClient, QuoteClient, TradeStoreClient};
use crate::types::{
    AmountMap, PortfolioTotals, Position, PositionRow, PositionStatus, QuoteMap,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// The last successfully computed row set and totals.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub rows: Vec<PositionRow>,
    pub totals: PortfolioTotals,
    pub total_positions: u64,
}

/// Live-valuation board over the open position set.
pub struct PositionBoard {
    store: TradeStoreClient,
    quotes_client: QuoteClient,
    margins_client: MarginClient,
    session: Arc<SessionState>,
    page_size: u32,
    refresh: RefreshConfig,

    positions: RwLock<Vec<Position>>,
    total_positions: RwLock<u64>,
    quotes: RwLock<QuoteMap>,
    exposures: RwLock<AmountMap>,
    margin_cache: TtlCache<f64>,
    snapshot: RwLock<BoardSnapshot>,
    market_open: AtomicBool,
}

impl PositionBoard {
    pub fn new(
        store: TradeStoreClient,
        quotes_client: QuoteClient,
        margins_client: MarginClient,
        session: Arc<SessionState>,
        page_size: u32,
        refresh: RefreshConfig,
    ) -> Arc<Self> {
        let margin_ttl = refresh.margin_ttl;
        Arc::new(Self {
            store,
            quotes_client,
            margins_client,
            session,
            page_size,
            refresh,
            positions: RwLock::new(Vec::new()),
            total_positions: RwLock::new(0),
            quotes: RwLock::new(QuoteMap::new()),
            exposures: RwLock::new(AmountMap::new()),
            margin_cache: TtlCache::new(margin_ttl),
            snapshot: RwLock::new(BoardSnapshot::default()),
            market_open: AtomicBool::new(false),
        })
    }

    /// The last good snapshot. Frozen (not zeroed) while the session is
    /// expired.
    pub fn snapshot(&self) -> BoardSnapshot {
        self.snapshot.read().unwrap().clone()
    }

    /// Replace the position set and recompute.
    pub fn install_positions(&self, positions: Vec<Position>, total: u64) {
        *self.positions.write().unwrap() = positions;
        *self.total_positions.write().unwrap() = total;
        self.recompute();
    }

    /// Replace the quote map and recompute. Last-write-wins.
    pub fn install_quotes(&self, quotes: QuoteMap) {
        *self.quotes.write().unwrap() = quotes;
        self.recompute();
    }

    /// Replace the exposure map and recompute. Last-write-wins.
    pub fn install_exposures(&self, exposures: AmountMap) {
        *self.exposures.write().unwrap() = exposures;
        self.recompute();
    }

    /// Merge freshly fetched margins into the TTL cache and recompute.
    pub fn install_margins(&self, margins: AmountMap) {
        for (id, amount) in margins {
            self.margin_cache.set(id, amount);
        }
        self.recompute();
    }

    /// Rebuild the decorated row set and totals from the current inputs.
    ///
    /// Wholesale recomputation by design; no incremental patching.
    pub fn recompute(&self) {
        let positions = self.positions.read().unwrap();
        let quotes = self.quotes.read().unwrap();
        let exposures = self.exposures.read().unwrap();

        let margins: AmountMap = positions
            .iter()
            .filter_map(|p| self.margin_cache.get(&p.id).map(|m| (p.id.clone(), m)))
            .collect();

        let rows = value_positions(&positions, &quotes, &margins, &exposures);
        let totals = fold_portfolio(&rows);
        let total_positions = *self.total_positions.read().unwrap();
        debug!(
            rows = rows.len(),
            pnl = totals.total_unrealized_pnl,
            risk = totals.total_open_risk,
            "recomputed position board"
        );

        *self.snapshot.write().unwrap() = BoardSnapshot {
            rows,
            totals,
            total_positions,
        };
    }

    /// Drop all derived caches. The next refresh pass rebuilds everything.
    pub fn invalidate(&self) {
        self.margin_cache.clear();
        self.quotes.write().unwrap().clear();
        self.exposures.write().unwrap().clear();
    }

    /// Whether the market-open signal was last seen open.
    pub fn market_open(&self) -> bool {
        self.market_open.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Refresh passes
    // =========================================================================

    /// Pull the open position set from the trade store.
    pub async fn refresh_positions(&self) -> crate::error::Result<()> {
        let listing = self
            .store
            .list_positions(PositionStatus::Open, 1, self.page_size)
            .await?;
        let total = listing.total;
        let positions: Vec<Position> = listing
            .data
            .into_iter()
            .map(|t| t.into_position())
            .collect();
        info!(count = positions.len(), total, "refreshed positions");
        self.install_positions(positions, total);
        Ok(())
    }

    /// Poll live quotes for the current position set.
    pub async fn refresh_quotes(&self) {
        let keys = {
            let positions = self.positions.read().unwrap();
            quote_keys(&positions)
        };
        match self.quotes_client.fetch_ltp(&keys).await {
            Ok(quotes) => self.install_quotes(quotes),
            Err(e) => warn!("quote refresh skipped: {}", e),
        }
    }

    /// Poll exposure figures for the current position set.
    pub async fn refresh_exposure(&self) {
        let items = {
            let positions = self.positions.read().unwrap();
            margin_items(&positions)
        };
        let exposures = self.margins_client.fetch_exposure(&items).await;
        self.install_exposures(exposures);
    }

    /// Fetch margins for positions whose cached figure has expired.
    pub async fn refresh_margins(&self) {
        let items = {
            let positions = self.positions.read().unwrap();
            let all = margin_items(&positions);
            all.into_iter()
                .filter(|item| self.margin_cache.get(&item.id).is_none())
                .collect::<Vec<_>>()
        };
        if items.is_empty() {
            return;
        }
        let margins = self.margins_client.fetch_margins(&items).await;
        self.install_margins(margins);
    }

    /// Re-check the market-open signal.
    pub async fn refresh_market_status(&self) {
        match self.store.market_status().await {
            Ok(status) => self.market_open.store(status.open, Ordering::Relaxed),
            Err(e) => warn!("market status check failed: {}", e),
        }
    }

    /// Broker re-pull: invalidates all derived caches and forces a full
    /// recomputation pass.
    pub async fn sync(&self) -> crate::error::Result<()> {
        self.store.sync().await?;
        // A successful sync proves the session is live again.
        self.session.clear();
        self.invalidate();
        self.refresh_positions().await?;
        self.refresh_quotes().await;
        self.refresh_margins().await;
        self.refresh_exposure().await;
        Ok(())
    }

    /// Spawn the background polling loops.
    ///
    /// Quotes and exposure poll on the short interval only while the market
    /// is open and the session is live; margins refill lazily as their cached
    /// figures expire. An expired session suspends polling entirely until
    /// cleared, leaving the last good snapshot in place.
    pub fn start(self: Arc<Self>) {
        let board = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(board.refresh.market_status_interval);
            loop {
                interval.tick().await;
                if board.session.is_expired() {
                    continue;
                }
                board.refresh_market_status().await;
            }
        });

        let board = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(board.refresh.quote_interval);
            loop {
                interval.tick().await;
                if board.session.is_expired() || !board.market_open() {
                    continue;
                }
                board.refresh_quotes().await;
                board.refresh_margins().await;
                board.refresh_exposure().await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Constituent, Direction, PositionKind};
    use std::collections::HashMap;

    fn test_board() -> Arc<PositionBoard> {
        let session = SessionState::new();
        PositionBoard::new(
            TradeStoreClient::new("http://store.invalid".to_string(), session.clone()),
            QuoteClient::new("http://quotes.invalid".to_string(), session.clone()),
            MarginClient::new("http://margins.invalid".to_string(), session.clone()),
            session,
            50,
            RefreshConfig::default(),
        )
    }

    fn long(id: &str, symbol: &str, qty: f64, entry_price: f64, stop_loss: Option<f64>) -> Position {
        Position {
            id: id.to_string(),
            trading_symbol: symbol.to_string(),
            exchange: "NSE".to_string(),
            segment: "EQ".to_string(),
            product: "NRML".to_string(),
            entry_date: None,
            status: "OPEN".to_string(),
            stored_pnl: 0.0,
            setup_used: None,
            mistakes_made: None,
            notes: None,
            kind: PositionKind::Simple {
                entry_price,
                qty,
                direction: Direction::Long,
                stop_loss,
            },
        }
    }

    #[test]
    fn test_empty_board_snapshot() {
        let board = test_board();
        let snapshot = board.snapshot();
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.totals, PortfolioTotals::default());
    }

    #[test]
    fn test_install_positions_recomputes() {
        let board = test_board();
        board.install_positions(vec![long("OPEN_1", "SBIN", 10.0, 100.0, Some(95.0))], 1);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.total_positions, 1);
        // No quote yet: stored PnL (0) and protective-stop risk.
        assert_eq!(snapshot.rows[0].pnl, 0.0);
        assert_eq!(snapshot.totals.total_open_risk, 50.0);
        assert!(snapshot.rows[0].ltp.is_none());
    }

    #[test]
    fn test_quote_arrival_updates_rows_wholesale() {
        let board = test_board();
        board.install_positions(vec![long("OPEN_1", "SBIN", 10.0, 100.0, None)], 1);

        let mut quotes = QuoteMap::new();
        quotes.insert("NSE:SBIN".to_string(), 110.0);
        board.install_quotes(quotes);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.rows[0].ltp, Some(110.0));
        assert_eq!(snapshot.rows[0].pnl, 100.0);
        assert_eq!(snapshot.totals.total_unrealized_pnl, 100.0);
    }

    #[test]
    fn test_fetch_order_is_commutative() {
        let quotes: QuoteMap = [("NSE:SBIN".to_string(), 110.0)].into_iter().collect();
        let margins: AmountMap = [("OPEN_1".to_string(), 2500.0)].into_iter().collect();
        let positions = || vec![long("OPEN_1", "SBIN", 10.0, 100.0, None)];

        let quotes_first = test_board();
        quotes_first.install_quotes(quotes.clone());
        quotes_first.install_margins(margins.clone());
        quotes_first.install_positions(positions(), 1);

        let margins_first = test_board();
        margins_first.install_positions(positions(), 1);
        margins_first.install_margins(margins);
        margins_first.install_quotes(quotes);

        let a = quotes_first.snapshot();
        let b = margins_first.snapshot();
        assert_eq!(a.rows[0].pnl, b.rows[0].pnl);
        assert_eq!(a.rows[0].margin_blocked, b.rows[0].margin_blocked);
        assert_eq!(a.totals, b.totals);
    }

    #[test]
    fn test_invalidate_clears_derived_state_but_recompute_keeps_positions() {
        let board = test_board();
        board.install_positions(vec![long("OPEN_1", "SBIN", 10.0, 100.0, None)], 1);
        board.install_quotes([("NSE:SBIN".to_string(), 110.0)].into_iter().collect());
        board.install_margins([("OPEN_1".to_string(), 2500.0)].into_iter().collect());

        board.invalidate();
        board.recompute();

        let snapshot = board.snapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert!(snapshot.rows[0].ltp.is_none());
        assert!(snapshot.rows[0].margin_blocked.is_none());
        assert_eq!(snapshot.rows[0].pnl, 0.0);
    }

    #[test]
    fn test_basket_rows_survive_partial_quote_maps() {
        let board = test_board();
        let basket = Position {
            id: "OPEN_9".to_string(),
            trading_symbol: "Pair".to_string(),
            exchange: "NSE".to_string(),
            segment: "EQ".to_string(),
            product: "BASKET".to_string(),
            entry_date: None,
            status: "OPEN".to_string(),
            stored_pnl: 0.0,
            setup_used: None,
            mistakes_made: None,
            notes: None,
            kind: PositionKind::Basket {
                constituents: vec![
                    Constituent {
                        symbol: "AAA".to_string(),
                        exchange: "NSE".to_string(),
                        direction: Direction::Long,
                        qty: 2.0,
                        avg_price: 50.0,
                        product: "NRML".to_string(),
                    },
                    Constituent {
                        symbol: "BBB".to_string(),
                        exchange: "NSE".to_string(),
                        direction: Direction::Short,
                        qty: 3.0,
                        avg_price: 20.0,
                        product: "NRML".to_string(),
                    },
                ],
            },
        };
        board.install_positions(vec![basket], 1);
        board.install_quotes([("NSE:AAA".to_string(), 55.0)].into_iter().collect());

        let snapshot = board.snapshot();
        assert_eq!(snapshot.rows[0].pnl, 10.0);
        assert_eq!(snapshot.rows[0].open_risk, 0.0);
        assert_eq!(snapshot.rows[0].constituents[1].pnl, 0.0);
    }

    #[test]
    fn test_margin_map_only_covers_known_positions() {
        let board = test_board();
        board.install_positions(vec![long("OPEN_1", "SBIN", 10.0, 100.0, None)], 1);

        let mut margins: AmountMap = HashMap::new();
        margins.insert("OPEN_1".to_string(), 2500.0);
        margins.insert("OPEN_99".to_string(), 9999.0); // stale id from an older pass
        board.install_margins(margins);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].margin_blocked, Some(2500.0));
    }
}
