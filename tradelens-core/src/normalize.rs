//! Trade normalization — tolerant extraction of canonical records from raw
//! journal JSON.
//!
//! Upstream journal exports disagree on field names (`profitOrLoss` vs
//! `pnl`), on types (numbers arriving as strings), and on which fields are
//! present at all. Each canonical field reads through an ordered fallback
//! list: the first key that is present and non-null wins, and its value is
//! then coerced under a defaulting policy that never fails the batch —
//! unparsable numbers become 0, unparsable dates become `None`, and
//! non-object entries are dropped one by one.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::domain::{NormalizedTrade, TradeDirection, TradeStatus};

type JsonObject = Map<String, Value>;

// ─── Fallback key orders ─────────────────────────────────────────────

const PROFIT_KEYS: &[&str] = &["profitOrLoss", "profit_loss", "pnl", "pAndL"];
const STATUS_KEYS: &[&str] = &["status", "tradeStatus"];
const DIRECTION_KEYS: &[&str] = &["type", "tradeType"];
const ENTRY_PRICE_KEYS: &[&str] = &["entryPrice", "entry_price", "price"];
const STOP_LOSS_KEYS: &[&str] = &["stopLoss", "stop_loss", "sl"];
const TARGET_KEYS: &[&str] = &["target", "tp"];
const QUANTITY_KEYS: &[&str] = &["quantity", "qty"];
const EXIT_QUANTITY_KEYS: &[&str] = &["exitQuantity"];
const CHARGES_KEYS: &[&str] = &["totalCharges"];
const BROKERAGE_KEYS: &[&str] = &["brokerage"];

/// Fallback symbol for records that carry none.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

// ─── Batch API ───────────────────────────────────────────────────────

/// Normalize a raw batch, dropping entries that are not JSON objects.
///
/// Output order matches input order; no deduplication, no sorting. Never
/// fails: any sequence of values yields a well-formed (possibly shorter)
/// batch.
pub fn normalize_trades(raw: &[Value]) -> Vec<NormalizedTrade> {
    raw.iter().filter_map(normalize_trade).collect()
}

/// Normalize one raw entry, or `None` when it is not an object.
pub fn normalize_trade(raw: &Value) -> Option<NormalizedTrade> {
    let obj = raw.as_object()?;

    let entry_date = obj.get("entryDate").and_then(parse_timestamp);
    let exit_date = obj.get("exitDate").and_then(parse_timestamp);

    let status = first_text(obj, STATUS_KEYS)
        .and_then(TradeStatus::parse)
        .unwrap_or(if exit_date.is_some() {
            TradeStatus::Closed
        } else {
            TradeStatus::Open
        });

    // The bare `side` field is upper-cased before matching; explicit
    // `type`/`tradeType` tags are matched as-is.
    let direction = first_text(obj, DIRECTION_KEYS)
        .map(TradeDirection::from_tag)
        .or_else(|| {
            first_text(obj, &["side"]).map(|side| TradeDirection::from_tag(&side.to_uppercase()))
        })
        .unwrap_or_default();

    let symbol = first_text(obj, &["symbol"])
        .unwrap_or(UNKNOWN_SYMBOL)
        .to_string();

    Some(NormalizedTrade {
        symbol,
        direction,
        status,
        entry_date,
        exit_date,
        quantity: number_field(obj, QUANTITY_KEYS),
        exit_quantity: number_field(obj, EXIT_QUANTITY_KEYS),
        entry_price: number_field(obj, ENTRY_PRICE_KEYS),
        stop_loss: number_field(obj, STOP_LOSS_KEYS),
        target: number_field(obj, TARGET_KEYS),
        profit: number_field(obj, PROFIT_KEYS),
        total_charges: number_field(obj, CHARGES_KEYS),
        brokerage: number_field(obj, BROKERAGE_KEYS),
    })
}

// ─── Field extraction ────────────────────────────────────────────────

/// First value under the candidate keys that exists and is not JSON null.
/// A present-but-unparsable value wins the chain (and later coerces to the
/// default); only null/missing keys fall through to the next candidate.
fn first_present<'a>(obj: &'a JsonObject, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| obj.get(*k)).find(|v| !v.is_null())
}

/// First non-empty string under the candidate keys. Empty and non-string
/// values fall through, so a blank tag behaves like a missing one.
fn first_text<'a>(obj: &'a JsonObject, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn number_field(obj: &JsonObject, keys: &[&str]) -> f64 {
    first_present(obj, keys).map(coerce_number).unwrap_or(0.0)
}

/// Coerce a JSON value to a finite f64, defaulting to 0.0. Numeric strings
/// are parsed; booleans, objects, and arrays are unparsable by policy.
fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

// ─── Timestamp parsing ───────────────────────────────────────────────

/// Parse a timestamp from the shapes journals actually contain: RFC 3339,
/// naive `YYYY-MM-DD[T ]HH:MM[:SS]` strings (assumed UTC), bare dates
/// (midnight UTC), or integer epoch milliseconds. Anything else is absent.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        // A zero timestamp reads as absent, matching upstream truthiness.
        Value::Number(n) => {
            let ms = n.as_i64().filter(|ms| *ms != 0)?;
            Utc.timestamp_millis_opt(ms).single()
        }
        _ => None,
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
