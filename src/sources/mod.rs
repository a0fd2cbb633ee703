pub mod margins;
pub mod quotes;
pub mod trade_store;

pub use margins::MarginClient;
pub use quotes::QuoteClient;
pub use trade_store::{BasketAdd, BasketCreate, TradeStoreClient};
