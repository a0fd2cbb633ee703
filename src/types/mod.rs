pub mod margin;
pub mod position;
pub mod row;

pub use margin::*;
pub use position::*;
pub use row::*;

use std::collections::HashMap;

/// Live last-traded prices keyed by `"<EXCHANGE>:<SYMBOL>"`.
///
/// A missing key means "no live price available", never zero.
pub type QuoteMap = HashMap<String, f64>;

/// Margin or exposure amounts keyed by position id.
pub type AmountMap = HashMap<String, f64>;
