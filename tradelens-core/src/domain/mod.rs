//! Domain types for the trade journal.

pub mod trade;

pub use trade::{NormalizedTrade, TradeDirection, TradeOutcome, TradeStatus};
