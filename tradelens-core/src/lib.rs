//! TradeLens Core — canonical trade records, tolerant normalization, time windows.
//!
//! This crate is the leaf of the workspace:
//! - Domain types (`NormalizedTrade` and its status/direction/outcome enums)
//! - The trade normalizer (ordered field fallbacks over raw journal JSON)
//! - Time-window filtering against an injected clock anchor
//!
//! Everything here is pure: no I/O, no ambient clock, no shared state. The
//! normalizer never fails a batch — malformed entries degrade to defaults or
//! are dropped individually.

pub mod domain;
pub mod normalize;
pub mod window;

pub use domain::{NormalizedTrade, TradeDirection, TradeOutcome, TradeStatus};
pub use normalize::{normalize_trade, normalize_trades, parse_timestamp};
pub use window::{ParseWindowError, TimeWindow};
