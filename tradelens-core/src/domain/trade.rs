//! NormalizedTrade — the canonical journal record every computation consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a journal entry.
///
/// Closed trades drive nearly every profitability statistic; open trades
/// contribute only to exposure and entry-keyed series. Canceled entries are
/// carried for completeness and join neither side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Open,
    Closed,
    Canceled,
}

impl TradeStatus {
    /// Parse a raw status tag, case-insensitively. Unrecognized tags return
    /// `None` so the caller can fall back to exit-date inference.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.eq_ignore_ascii_case("OPEN") {
            Some(Self::Open)
        } else if tag.eq_ignore_ascii_case("CLOSED") {
            Some(Self::Closed)
        } else if tag.eq_ignore_ascii_case("CANCELED") {
            Some(Self::Canceled)
        } else {
            None
        }
    }
}

/// Direction of a trade, derived from its raw `BUY`/`SELL` tag.
///
/// `Unspecified` trades count as neither long nor short in direction splits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
    #[default]
    Unspecified,
}

impl TradeDirection {
    /// Map a raw direction tag. The match is exact: lower-case tags stay
    /// `Unspecified` unless the normalizer already upper-cased them (it does
    /// so only for the `side` fallback, mirroring upstream behavior).
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "BUY" => Self::Long,
            "SELL" => Self::Short,
            _ => Self::Unspecified,
        }
    }
}

/// Win/loss classification of a closed trade's profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
}

impl TradeOutcome {
    pub fn of(profit: f64) -> Self {
        if profit > 0.0 {
            Self::Win
        } else if profit < 0.0 {
            Self::Loss
        } else {
            Self::Breakeven
        }
    }
}

impl std::fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Win => "Win",
            Self::Loss => "Loss",
            Self::Breakeven => "Breakeven",
        };
        f.write_str(label)
    }
}

/// A single journal entry after field normalization.
///
/// Every record is independently valid: numeric fields default to zero and
/// date fields to `None` when the raw entry was missing or unparsable, so a
/// batch never carries half-poisoned values. A zero price/stop/target/quantity
/// means "absent" to computations that require the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTrade {
    // ── Identification ──
    pub symbol: String,
    pub direction: TradeDirection,
    pub status: TradeStatus,

    // ── Timing ──
    pub entry_date: Option<DateTime<Utc>>,
    pub exit_date: Option<DateTime<Utc>>,

    // ── Size & levels ──
    pub quantity: f64,
    pub exit_quantity: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target: f64,

    // ── Money ──
    pub profit: f64,
    pub total_charges: f64,
    pub brokerage: f64,
}

impl NormalizedTrade {
    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Win/loss classification of this trade's profit.
    pub fn outcome(&self) -> TradeOutcome {
        TradeOutcome::of(self.profit)
    }

    /// Capital deployed by this entry: `entry_price × quantity`.
    pub fn exposure(&self) -> f64 {
        self.entry_price * self.quantity
    }

    /// Holding time in whole-and-fractional days, when both dates are known.
    pub fn hold_days(&self) -> Option<f64> {
        let entry = self.entry_date?;
        let exit = self.exit_date?;
        let millis = exit.signed_duration_since(entry).num_milliseconds();
        Some(millis as f64 / MILLIS_PER_DAY)
    }

    /// Holding time with the missing-date rule applied: a trade missing
    /// either date contributes a zero-length duration, not a skip.
    pub fn hold_days_or_zero(&self) -> f64 {
        self.hold_days().unwrap_or(0.0)
    }

    /// Sort key for exit-date ordering. Undated trades key as epoch zero so
    /// they sort ahead of any modern date, stably.
    pub fn exit_epoch_ms(&self) -> i64 {
        self.exit_date.map(|d| d.timestamp_millis()).unwrap_or(0)
    }
}

const MILLIS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> NormalizedTrade {
        NormalizedTrade {
            symbol: "RELIANCE".into(),
            direction: TradeDirection::Long,
            status: TradeStatus::Closed,
            entry_date: Some(Utc.with_ymd_and_hms(2024, 1, 5, 10, 30, 0).unwrap()),
            exit_date: Some(Utc.with_ymd_and_hms(2024, 1, 8, 10, 30, 0).unwrap()),
            quantity: 10.0,
            exit_quantity: 10.0,
            entry_price: 100.0,
            stop_loss: 95.0,
            target: 112.0,
            profit: 85.0,
            total_charges: 12.5,
            brokerage: 4.0,
        }
    }

    #[test]
    fn outcome_classification() {
        assert_eq!(TradeOutcome::of(85.0), TradeOutcome::Win);
        assert_eq!(TradeOutcome::of(-0.01), TradeOutcome::Loss);
        assert_eq!(TradeOutcome::of(0.0), TradeOutcome::Breakeven);
    }

    #[test]
    fn outcome_display_labels() {
        assert_eq!(TradeOutcome::Win.to_string(), "Win");
        assert_eq!(TradeOutcome::Loss.to_string(), "Loss");
        assert_eq!(TradeOutcome::Breakeven.to_string(), "Breakeven");
    }

    #[test]
    fn hold_days_spans_entry_to_exit() {
        let trade = sample_trade();
        assert!((trade.hold_days().unwrap() - 3.0).abs() < 1e-10);
    }

    #[test]
    fn hold_days_none_without_both_dates() {
        let mut trade = sample_trade();
        trade.exit_date = None;
        assert!(trade.hold_days().is_none());
        assert_eq!(trade.hold_days_or_zero(), 0.0);
    }

    #[test]
    fn exposure_is_price_times_quantity() {
        assert!((sample_trade().exposure() - 1000.0).abs() < 1e-10);
    }

    #[test]
    fn exit_epoch_defaults_to_zero() {
        let mut trade = sample_trade();
        trade.exit_date = None;
        assert_eq!(trade.exit_epoch_ms(), 0);
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(TradeStatus::parse("closed"), Some(TradeStatus::Closed));
        assert_eq!(TradeStatus::parse(" OPEN "), Some(TradeStatus::Open));
        assert_eq!(TradeStatus::parse("Canceled"), Some(TradeStatus::Canceled));
        assert_eq!(TradeStatus::parse("pending"), None);
    }

    #[test]
    fn direction_tag_is_exact() {
        assert_eq!(TradeDirection::from_tag("BUY"), TradeDirection::Long);
        assert_eq!(TradeDirection::from_tag("SELL"), TradeDirection::Short);
        assert_eq!(TradeDirection::from_tag("buy"), TradeDirection::Unspecified);
        assert_eq!(TradeDirection::from_tag(""), TradeDirection::Unspecified);
    }

    #[test]
    fn status_serializes_screaming() {
        let json = serde_json::to_string(&TradeStatus::Canceled).unwrap();
        assert_eq!(json, "\"CANCELED\"");
        let back: TradeStatus = serde_json::from_str("\"CLOSED\"").unwrap();
        assert_eq!(back, TradeStatus::Closed);
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: NormalizedTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade.symbol, deser.symbol);
        assert_eq!(trade.status, deser.status);
        assert_eq!(trade.profit, deser.profit);
        assert_eq!(trade.exit_date, deser.exit_date);
    }
}
