//! Valuation Core
//!
//! Pure, synchronous merge of static position records with the latest quote,
//! margin, and exposure maps into render-ready rows, plus the portfolio fold.
//! Re-executed wholesale on every refresh pass; a lookup miss in any map
//! degrades that figure for that row and never blocks the rest of the merge.

use crate::types::{
    AmountMap, Constituent, ConstituentRow, Direction, MarginItem, MarginItemKind, OrderLeg,
    Position, PositionKind, PositionRow, PortfolioTotals, QuoteMap,
};

// =============================================================================
// Symbol Extraction & Request Shaping
// =============================================================================

/// Flat list of `"<EXCHANGE>:<SYMBOL>"` keys needed to price the position set.
///
/// Baskets contribute one key per constituent, simple positions exactly one.
/// No dedup: the quote map downstream is the deduplicated source of truth.
pub fn quote_keys(positions: &[Position]) -> Vec<String> {
    let mut keys = Vec::with_capacity(positions.len());
    for position in positions {
        match &position.kind {
            PositionKind::Simple { .. } => keys.push(position.quote_key()),
            PositionKind::Basket { constituents } => {
                keys.extend(
                    constituents
                        .iter()
                        .map(|c| format!("{}:{}", c.exchange, c.symbol)),
                );
            }
        }
    }
    keys
}

/// Shape the position set into the margin/exposure collaborator's request
/// format: one item per position keyed by the position's own id.
pub fn margin_items(positions: &[Position]) -> Vec<MarginItem> {
    positions
        .iter()
        .map(|position| match &position.kind {
            PositionKind::Simple {
                entry_price,
                qty,
                direction,
                ..
            } => MarginItem {
                kind: MarginItemKind::Trade,
                id: position.id.clone(),
                legs: vec![OrderLeg {
                    exchange: position.exchange.clone(),
                    tradingsymbol: position.trading_symbol.clone(),
                    transaction_type: direction.opening_transaction().to_string(),
                    quantity: *qty,
                    product: position.product.clone(),
                    price: *entry_price,
                }],
            },
            PositionKind::Basket { constituents } => MarginItem {
                kind: MarginItemKind::Basket,
                id: position.id.clone(),
                legs: constituents
                    .iter()
                    .map(|c| OrderLeg {
                        exchange: c.exchange.clone(),
                        tradingsymbol: c.symbol.clone(),
                        transaction_type: c.direction.opening_transaction().to_string(),
                        quantity: c.qty,
                        product: c.product.clone(),
                        price: c.avg_price,
                    })
                    .collect(),
            },
        })
        .collect()
}

// =============================================================================
// Valuation Merge
// =============================================================================

/// Directional PnL: long gains when price rises, short when it falls.
fn live_pnl(direction: Direction, entry_price: f64, qty: f64, ltp: f64) -> f64 {
    match direction {
        Direction::Long => (ltp - entry_price) * qty,
        Direction::Short => (entry_price - ltp) * qty,
    }
}

/// Open risk under the protective-stop model, never negative.
///
/// A stop on the wrong side of entry (not a true protective stop) contributes
/// zero risk. That is the documented policy, preserved as-is even though an
/// inverted or trailing stop could be intentional.
fn open_risk(direction: Direction, entry_price: f64, qty: f64, stop_loss: Option<f64>) -> f64 {
    let sl = stop_loss.unwrap_or(0.0);
    match direction {
        Direction::Long if sl < entry_price => (entry_price - sl) * qty,
        Direction::Short if sl > entry_price => (sl - entry_price) * qty,
        _ => 0.0,
    }
}

fn value_constituent(constituent: &Constituent, quotes: &QuoteMap) -> ConstituentRow {
    let key = format!("{}:{}", constituent.exchange, constituent.symbol);
    let ltp = quotes.get(&key).copied();
    // Baskets persist no per-leg PnL, so an unquoted leg is 0 for this refresh.
    let pnl = ltp
        .map(|p| live_pnl(constituent.direction, constituent.avg_price, constituent.qty, p))
        .unwrap_or(0.0);

    ConstituentRow {
        symbol: constituent.symbol.clone(),
        exchange: constituent.exchange.clone(),
        direction: constituent.direction,
        qty: constituent.qty,
        avg_price: constituent.avg_price,
        product: constituent.product.clone(),
        ltp,
        pnl,
    }
}

/// Attach live economics to a position, dispatching on its kind.
///
/// Simple positions fall back to their last persisted PnL when unquoted.
/// Basket rows sum their constituents' PnL and report zero open risk: no
/// unified basket stop-loss concept exists, so there is nothing to quantify.
pub fn value_position(
    position: &Position,
    quotes: &QuoteMap,
    margins: &AmountMap,
    exposures: &AmountMap,
) -> PositionRow {
    let margin_blocked = margins.get(&position.id).copied();
    let exposure = exposures.get(&position.id).copied();

    match &position.kind {
        PositionKind::Simple {
            entry_price,
            qty,
            direction,
            stop_loss,
        } => {
            let ltp = quotes.get(&position.quote_key()).copied();
            let pnl = ltp
                .map(|p| live_pnl(*direction, *entry_price, *qty, p))
                .unwrap_or(position.stored_pnl);
            let risk = open_risk(*direction, *entry_price, *qty, *stop_loss);
            // Prefer the collaborator's exposure figure; estimate from the
            // live quote only when one exists, else leave it unavailable.
            let gross_exposure = exposure.or_else(|| ltp.map(|p| p * qty));

            PositionRow {
                id: position.id.clone(),
                trading_symbol: position.trading_symbol.clone(),
                exchange: position.exchange.clone(),
                segment: position.segment.clone(),
                product: position.product.clone(),
                direction: Some(*direction),
                is_basket: false,
                qty: Some(*qty),
                entry_price: Some(*entry_price),
                stop_loss: *stop_loss,
                ltp,
                pnl,
                open_risk: risk,
                margin_blocked,
                gross_exposure,
                constituents: Vec::new(),
            }
        }
        PositionKind::Basket { constituents } => {
            let rows: Vec<ConstituentRow> = constituents
                .iter()
                .map(|c| value_constituent(c, quotes))
                .collect();
            let pnl = rows.iter().map(|r| r.pnl).sum();

            PositionRow {
                id: position.id.clone(),
                trading_symbol: position.trading_symbol.clone(),
                exchange: position.exchange.clone(),
                segment: position.segment.clone(),
                product: position.product.clone(),
                direction: None,
                is_basket: true,
                qty: None,
                entry_price: None,
                stop_loss: None,
                ltp: None,
                pnl,
                open_risk: 0.0,
                margin_blocked,
                // Basket exposure comes entirely from the collaborator, never
                // locally estimated.
                gross_exposure: exposure,
                constituents: rows,
            }
        }
    }
}

/// Decorate the whole position set for one refresh pass.
pub fn value_positions(
    positions: &[Position],
    quotes: &QuoteMap,
    margins: &AmountMap,
    exposures: &AmountMap,
) -> Vec<PositionRow> {
    positions
        .iter()
        .map(|p| value_position(p, quotes, margins, exposures))
        .collect()
}

// =============================================================================
// Portfolio Aggregation
// =============================================================================

/// Fold the decorated row set into the two portfolio scalars.
pub fn fold_portfolio(rows: &[PositionRow]) -> PortfolioTotals {
    rows.iter().fold(PortfolioTotals::default(), |acc, row| {
        PortfolioTotals {
            total_unrealized_pnl: acc.total_unrealized_pnl + row.pnl,
            total_open_risk: acc.total_open_risk + row.open_risk,
        }
    })
}
