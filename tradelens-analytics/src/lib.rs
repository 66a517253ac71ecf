//! TradeLens Analytics — aggregate metrics, chart series, and the insight engine.
//!
//! This crate builds on `tradelens-core` to provide:
//! - Windowed aggregate metrics (win rate, profit factor, expectancy, streaks,
//!   drawdown, risk:reward, calendar buckets)
//! - Chart-ready series (P&L trend, exposure trend, pies, top symbols)
//! - The threshold-driven insight engine (strengths, weaknesses, ranked
//!   suggestions, extremes, equity curve)
//! - Threshold configuration with per-field defaults and TOML loading
//!
//! Everything here is a pure function over a normalized trade collection:
//! no I/O, no clock access, no mutation of input.

pub mod insight;
pub mod metrics;
pub mod series;
pub mod thresholds;

pub use insight::{
    analyze, ChargesSummary, DrawdownSeverity, HourPnl, InsightData, InsightReport, InsightStats,
    RecentTrade, SideStats, Suggestion, SymbolCount, SymbolPnl, TradeTypeStats,
};
pub use metrics::AggregateMetrics;
pub use series::{ChartData, PeriodPnl, PieSlice, SymbolStat};
pub use thresholds::{InsightThresholds, ThresholdsError};
