pub mod board;
pub mod cache;
pub mod session;
pub mod valuation;

pub use board::{BoardSnapshot, PositionBoard};
pub use cache::TtlCache;
pub use session::SessionState;
