//! Property tests for analytics invariants.
//!
//! Uses proptest to verify:
//! 1. Rate bounds — win rate stays in [0, 100], outcome counts partition closed trades
//! 2. Profit factor law — never NaN, infinite exactly when wins exist without losses
//! 3. Equity accounting — curve length, final value, and bounded drawdown
//! 4. Streak agreement — streak fields match a straightforward scan
//! 5. Purity — identical inputs produce identical reports

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tradelens_analytics::metrics::{self, AggregateMetrics};
use tradelens_analytics::{analyze, InsightThresholds};
use tradelens_core::{NormalizedTrade, TimeWindow, TradeDirection, TradeStatus};

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_profit() -> impl Strategy<Value = f64> {
    (-500.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_status() -> impl Strategy<Value = TradeStatus> {
    prop_oneof![
        3 => Just(TradeStatus::Closed),
        1 => Just(TradeStatus::Open),
        1 => Just(TradeStatus::Canceled),
    ]
}

fn arb_date() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop_oneof![
        4 => (0i64..120, 0u32..24).prop_map(|(day, hour)| {
            Some(Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap() + Duration::days(day))
        }),
        1 => Just(None),
    ]
}

fn arb_trade() -> impl Strategy<Value = NormalizedTrade> {
    (
        "[A-Z]{2,4}",
        arb_status(),
        arb_date(),
        arb_date(),
        (0.0..50.0_f64),
        (1.0..500.0_f64),
        arb_profit(),
    )
        .prop_map(
            |(symbol, status, entry_date, exit_date, quantity, entry_price, profit)| {
                NormalizedTrade {
                    symbol,
                    direction: TradeDirection::Long,
                    status,
                    entry_date,
                    exit_date,
                    quantity: quantity.round(),
                    exit_quantity: quantity.round(),
                    entry_price,
                    stop_loss: 0.0,
                    target: 0.0,
                    profit,
                    total_charges: 0.0,
                    brokerage: 0.0,
                }
            },
        )
}

fn arb_trades() -> impl Strategy<Value = Vec<NormalizedTrade>> {
    prop::collection::vec(arb_trade(), 0..40)
}

// ── 1. Rate Bounds ───────────────────────────────────────────────────

proptest! {
    /// Win rate stays within [0, 100] for any input.
    #[test]
    fn win_rate_bounded(trades in arb_trades()) {
        let wr = metrics::win_rate(&trades);
        prop_assert!((0.0..=100.0).contains(&wr), "win rate out of range: {wr}");
    }

    /// Outcome counts partition the closed set; open and canceled stay out.
    #[test]
    fn outcome_counts_partition_closed(trades in arb_trades()) {
        let m = AggregateMetrics::compute(&trades, TimeWindow::AllTime, anchor());
        prop_assert_eq!(
            m.win_count + m.loss_count + m.breakeven_count,
            m.closed_trades,
            "outcome counts must sum to closed trades"
        );
        prop_assert!(m.closed_trades + m.open_trades <= trades.len());
    }
}

// ── 2. Profit Factor Law ─────────────────────────────────────────────

proptest! {
    /// Profit factor is never NaN and never negative.
    #[test]
    fn profit_factor_never_nan(trades in arb_trades()) {
        let pf = metrics::profit_factor(&trades);
        prop_assert!(!pf.is_nan());
        prop_assert!(pf >= 0.0, "profit factor negative: {pf}");
    }

    /// Profit factor is infinite exactly when closed wins exist with no closed losses.
    #[test]
    fn profit_factor_sentinel_law(trades in arb_trades()) {
        let pf = metrics::profit_factor(&trades);
        let has_wins = trades.iter().any(|t| t.is_closed() && t.profit > 0.0);
        let has_losses = trades.iter().any(|t| t.is_closed() && t.profit < 0.0);
        if has_wins && !has_losses {
            prop_assert_eq!(pf, f64::INFINITY);
        } else {
            prop_assert!(pf.is_finite(), "profit factor should be finite, got {pf}");
        }
    }
}

// ── 3. Equity Accounting ─────────────────────────────────────────────

proptest! {
    /// The equity curve has one point per closed trade and ends at the total P&L.
    #[test]
    fn equity_curve_accounts_for_every_closed_trade(trades in arb_trades()) {
        let curve = metrics::equity_curve(&trades);
        let closed: Vec<f64> = trades
            .iter()
            .filter(|t| t.is_closed())
            .map(|t| t.profit)
            .collect();
        prop_assert_eq!(curve.len(), closed.len());
        let total: f64 = closed.iter().sum();
        if let Some(last) = curve.last() {
            prop_assert!((last - total).abs() < 1e-6, "curve end {last} != total {total}");
        }
    }

    /// Drawdown is non-negative and never exceeds the curve's full range.
    #[test]
    fn drawdown_bounded(trades in arb_trades()) {
        let curve = metrics::equity_curve(&trades);
        let dd = metrics::max_drawdown(&curve);
        prop_assert!(dd >= 0.0, "drawdown negative: {dd}");
        if !curve.is_empty() {
            let hi = curve.iter().copied().fold(f64::MIN, f64::max);
            let lo = curve.iter().copied().fold(f64::MAX, f64::min);
            prop_assert!(dd <= (hi - lo) + 1e-9, "drawdown {dd} exceeds range {}", hi - lo);
        }
    }
}

// ── 4. Streak Agreement ──────────────────────────────────────────────

fn naive_streaks(trades: &[NormalizedTrade]) -> (u32, u32) {
    let mut max_win = 0u32;
    let mut max_loss = 0u32;
    let mut cur_win = 0u32;
    let mut cur_loss = 0u32;
    for t in trades.iter().filter(|t| t.is_closed()) {
        if t.profit > 0.0 {
            cur_win += 1;
            cur_loss = 0;
        } else if t.profit < 0.0 {
            cur_loss += 1;
            cur_win = 0;
        } else {
            cur_win = 0;
            cur_loss = 0;
        }
        max_win = max_win.max(cur_win);
        max_loss = max_loss.max(cur_loss);
    }
    (max_win, max_loss)
}

proptest! {
    /// Streak fields agree with a straightforward scan over closed trades.
    #[test]
    fn streaks_match_naive_scan(trades in arb_trades()) {
        prop_assert_eq!(metrics::win_loss_streaks(&trades), naive_streaks(&trades));
    }
}

// ── 5. Purity ────────────────────────────────────────────────────────

proptest! {
    /// Computing twice over the same input yields identical metrics.
    #[test]
    fn compute_is_deterministic(trades in arb_trades()) {
        let a = AggregateMetrics::compute(&trades, TimeWindow::AllTime, anchor());
        let b = AggregateMetrics::compute(&trades, TimeWindow::AllTime, anchor());
        prop_assert_eq!(a, b);
    }

    /// Narrower windows never see more trades than all-time.
    #[test]
    fn windowed_subset_of_all_time(trades in arb_trades()) {
        let all = AggregateMetrics::compute(&trades, TimeWindow::AllTime, anchor());
        let recent = AggregateMetrics::compute(&trades, TimeWindow::Last30Days, anchor());
        prop_assert!(recent.closed_trades <= all.closed_trades);
        prop_assert!(recent.open_trades <= all.open_trades);
    }

    /// A report is Empty exactly when the input is empty; analyzing twice agrees.
    #[test]
    fn analyze_empty_law_and_determinism(trades in arb_trades()) {
        let thresholds = InsightThresholds::default();
        let a = analyze(&trades, &thresholds);
        prop_assert_eq!(a.is_empty(), trades.is_empty());
        let b = analyze(&trades, &thresholds);
        prop_assert_eq!(a, b);
    }
}
