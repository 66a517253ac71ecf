//! Aggregate metrics — pure functions that compute journal statistics.
//!
//! Every metric is a pure function: normalized trade list in, scalar out.
//! Windowing happens once in [`AggregateMetrics::compute`]; the individual
//! functions treat the slice they receive as the whole population.
//!
//! Ordering contract: streak metrics scan trades in slice order, so callers
//! that care about streaks must supply trades in chronological order. The
//! equity curve and drawdown sort internally by exit date and do not depend
//! on input order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradelens_core::{NormalizedTrade, TimeWindow, TradeDirection, TradeOutcome};

use crate::series;

/// Aggregate performance snapshot for one windowed trade collection.
///
/// Computed fresh on every call; all fields are finite except
/// `profit_factor`, which is `+∞` when wins exist and losses do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AggregateMetrics {
    // ── Counts ──
    pub open_trades: usize,
    pub closed_trades: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub breakeven_count: usize,

    // ── Sums (closed trades, except exposure) ──
    pub total_pnl: f64,
    pub total_exposure: f64,
    pub total_charges: f64,
    pub total_brokerage: f64,

    // ── Ratios ──
    pub win_rate: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub risk_reward: f64,
    pub avg_r: f64,

    // ── Averages ──
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_hold_days: f64,
    pub avg_winning_hold_days: f64,
    pub avg_losing_hold_days: f64,

    // ── Extremes ──
    pub best_trade: f64,
    pub worst_trade: f64,
    pub largest_profitable_day: f64,
    pub largest_losing_day: f64,
    pub avg_winning_day_pnl: f64,
    pub avg_losing_day_pnl: f64,

    // ── Streaks (slice order) ──
    pub max_win_streak: u32,
    pub max_loss_streak: u32,

    // ── Direction split ──
    pub long_pnl: f64,
    pub short_pnl: f64,

    // ── Drawdown ──
    pub max_drawdown: f64,

    // ── Calendar buckets ──
    pub pnl_by_symbol: BTreeMap<String, f64>,
    pub pnl_by_hour: BTreeMap<u32, f64>,
    pub pnl_by_day: BTreeMap<String, f64>,
    pub pnl_by_week: BTreeMap<String, f64>,
    pub pnl_by_month: BTreeMap<String, f64>,
}

impl AggregateMetrics {
    /// Compute all metrics for the trades inside `window`, anchored at `now`.
    ///
    /// An empty windowed collection returns the all-zero default.
    pub fn compute(trades: &[NormalizedTrade], window: TimeWindow, now: DateTime<Utc>) -> Self {
        let windowed: Vec<NormalizedTrade> =
            window.filter(trades, now).into_iter().cloned().collect();
        if windowed.is_empty() {
            return Self::default();
        }

        let pnl_by_day = series::pnl_by_exit_day(&windowed);
        let winning_days: Vec<f64> = pnl_by_day.values().copied().filter(|p| *p > 0.0).collect();
        let losing_days: Vec<f64> = pnl_by_day.values().copied().filter(|p| *p < 0.0).collect();
        let (max_win_streak, max_loss_streak) = win_loss_streaks(&windowed);
        let curve = equity_curve(&windowed);

        Self {
            open_trades: windowed.iter().filter(|t| t.is_open()).count(),
            closed_trades: windowed.iter().filter(|t| t.is_closed()).count(),
            win_count: outcome_count(&windowed, TradeOutcome::Win),
            loss_count: outcome_count(&windowed, TradeOutcome::Loss),
            breakeven_count: outcome_count(&windowed, TradeOutcome::Breakeven),
            total_pnl: closed_profits(&windowed).sum(),
            total_exposure: total_exposure(&windowed),
            total_charges: windowed
                .iter()
                .filter(|t| t.is_closed())
                .map(|t| t.total_charges)
                .sum(),
            total_brokerage: windowed
                .iter()
                .filter(|t| t.is_closed())
                .map(|t| t.brokerage)
                .sum(),
            win_rate: win_rate(&windowed),
            profit_factor: profit_factor(&windowed),
            expectancy: expectancy(&windowed),
            risk_reward: risk_reward(&windowed),
            avg_r: avg_r(&windowed),
            avg_win: avg_win(&windowed),
            avg_loss: avg_loss(&windowed),
            avg_hold_days: avg_hold_days(&windowed),
            avg_winning_hold_days: avg_hold_days_for(&windowed, TradeOutcome::Win),
            avg_losing_hold_days: avg_hold_days_for(&windowed, TradeOutcome::Loss),
            best_trade: best_trade(&windowed),
            worst_trade: worst_trade(&windowed),
            largest_profitable_day: winning_days.iter().copied().reduce(f64::max).unwrap_or(0.0),
            largest_losing_day: losing_days.iter().copied().reduce(f64::min).unwrap_or(0.0),
            avg_winning_day_pnl: mean_f64(&winning_days),
            avg_losing_day_pnl: mean_f64(&losing_days),
            max_win_streak,
            max_loss_streak,
            long_pnl: direction_pnl(&windowed, TradeDirection::Long),
            short_pnl: direction_pnl(&windowed, TradeDirection::Short),
            max_drawdown: max_drawdown(&curve),
            pnl_by_symbol: series::pnl_by_symbol(&windowed),
            pnl_by_hour: series::pnl_by_entry_hour(&windowed),
            pnl_by_day,
            pnl_by_week: series::pnl_by_exit_week(&windowed),
            pnl_by_month: series::pnl_by_exit_month(&windowed),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Win rate as a percentage of closed trades. 0.0 when none are closed.
pub fn win_rate(trades: &[NormalizedTrade]) -> f64 {
    let closed = trades.iter().filter(|t| t.is_closed()).count();
    if closed == 0 {
        return 0.0;
    }
    let wins = outcome_count(trades, TradeOutcome::Win);
    wins as f64 / closed as f64 * 100.0
}

/// Profit factor: gross wins / gross losses over closed trades.
///
/// `+∞` when wins exist and losses sum to zero; 0.0 when neither exists.
pub fn profit_factor(trades: &[NormalizedTrade]) -> f64 {
    let mut gross_profit = 0.0;
    let mut gross_loss = 0.0;
    for t in trades.iter().filter(|t| t.is_closed()) {
        if t.profit > 0.0 {
            gross_profit += t.profit;
        } else if t.profit < 0.0 {
            gross_loss += t.profit.abs();
        }
    }
    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Mean winning-trade profit. 0.0 when there are no winners.
pub fn avg_win(trades: &[NormalizedTrade]) -> f64 {
    let wins: Vec<f64> = closed_profits(trades).filter(|p| *p > 0.0).collect();
    mean_f64(&wins)
}

/// Mean losing-trade profit (≤ 0). 0.0 when there are no losers.
pub fn avg_loss(trades: &[NormalizedTrade]) -> f64 {
    let losses: Vec<f64> = closed_profits(trades).filter(|p| *p < 0.0).collect();
    mean_f64(&losses)
}

/// Expected value per trade: `wr × avg_win + (1 − wr) × avg_loss`
/// with `wr` as a fraction.
pub fn expectancy(trades: &[NormalizedTrade]) -> f64 {
    let wr = win_rate(trades) / 100.0;
    wr * avg_win(trades) + (1.0 - wr) * avg_loss(trades)
}

/// Longest win and loss runs over closed trades, in slice order.
///
/// A win resets the loss run and vice versa; a breakeven resets both.
pub fn win_loss_streaks(trades: &[NormalizedTrade]) -> (u32, u32) {
    let mut win_run = 0u32;
    let mut loss_run = 0u32;
    let mut max_win = 0u32;
    let mut max_loss = 0u32;
    for t in trades.iter().filter(|t| t.is_closed()) {
        match t.outcome() {
            TradeOutcome::Win => {
                win_run += 1;
                loss_run = 0;
                max_win = max_win.max(win_run);
            }
            TradeOutcome::Loss => {
                loss_run += 1;
                win_run = 0;
                max_loss = max_loss.max(loss_run);
            }
            TradeOutcome::Breakeven => {
                win_run = 0;
                loss_run = 0;
            }
        }
    }
    (max_win, max_loss)
}

/// Total capital deployed: `Σ entry_price × quantity` over all trades
/// (any status) where both fields are nonzero.
pub fn total_exposure(trades: &[NormalizedTrade]) -> f64 {
    trades
        .iter()
        .filter(|t| t.entry_price != 0.0 && t.quantity != 0.0)
        .map(|t| t.exposure())
        .sum()
}

/// Mean holding time in days over all closed trades.
///
/// A trade missing either date contributes a zero-length hold rather than
/// being dropped from the denominator.
pub fn avg_hold_days(trades: &[NormalizedTrade]) -> f64 {
    let holds: Vec<f64> = trades
        .iter()
        .filter(|t| t.is_closed())
        .map(|t| t.hold_days_or_zero())
        .collect();
    mean_f64(&holds)
}

/// Mean holding time in days over closed trades with the given outcome.
pub fn avg_hold_days_for(trades: &[NormalizedTrade], outcome: TradeOutcome) -> f64 {
    let holds: Vec<f64> = trades
        .iter()
        .filter(|t| t.is_closed() && t.outcome() == outcome)
        .map(|t| t.hold_days_or_zero())
        .collect();
    mean_f64(&holds)
}

/// Largest closed-trade profit. 0.0 when no trades are closed.
pub fn best_trade(trades: &[NormalizedTrade]) -> f64 {
    closed_profits(trades).reduce(f64::max).unwrap_or(0.0)
}

/// Smallest closed-trade profit. 0.0 when no trades are closed.
pub fn worst_trade(trades: &[NormalizedTrade]) -> f64 {
    closed_profits(trades).reduce(f64::min).unwrap_or(0.0)
}

/// Cumulative closed P&L in exit-date order.
///
/// Closed trades without an exit date sort first (epoch-zero key); the sort
/// is stable, so their relative order is preserved.
pub fn equity_curve(trades: &[NormalizedTrade]) -> Vec<f64> {
    let mut closed: Vec<&NormalizedTrade> = trades.iter().filter(|t| t.is_closed()).collect();
    closed.sort_by_key(|t| t.exit_epoch_ms());
    let mut equity = 0.0;
    closed
        .iter()
        .map(|t| {
            equity += t.profit;
            equity
        })
        .collect()
}

/// Largest peak-to-trough drop of an equity curve, as a non-negative number.
///
/// 0.0 for an empty or non-dipping curve.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    if curve.is_empty() {
        return 0.0;
    }
    let mut peak = curve[0];
    let mut max_dd = 0.0_f64;
    for &equity in curve {
        if equity > peak {
            peak = equity;
        }
        let dd = peak - equity;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Aggregate risk:reward over closed trades:
/// `Σ|target − entry| / Σ|entry − stop|`.
///
/// Each sum only includes trades where its two fields are nonzero.
/// 0.0 when the risk sum is zero.
pub fn risk_reward(trades: &[NormalizedTrade]) -> f64 {
    let mut total_risk = 0.0;
    let mut total_reward = 0.0;
    for t in trades.iter().filter(|t| t.is_closed()) {
        if t.stop_loss != 0.0 && t.entry_price != 0.0 {
            total_risk += (t.entry_price - t.stop_loss).abs();
        }
        if t.target != 0.0 && t.entry_price != 0.0 {
            total_reward += (t.target - t.entry_price).abs();
        }
    }
    if total_risk > 0.0 {
        total_reward / total_risk
    } else {
        0.0
    }
}

/// Realized R-multiples: `(profit / quantity) / |entry − stop|` per closed
/// trade with nonzero stop and entry prices. A zero quantity divides by 1.
pub fn r_multiples(trades: &[NormalizedTrade]) -> Vec<f64> {
    trades
        .iter()
        .filter(|t| t.is_closed() && t.stop_loss != 0.0 && t.entry_price != 0.0)
        .filter_map(|t| {
            let risk = (t.entry_price - t.stop_loss).abs();
            if risk == 0.0 {
                return None;
            }
            let quantity = if t.quantity != 0.0 { t.quantity } else { 1.0 };
            Some(t.profit / quantity / risk)
        })
        .filter(|r| r.is_finite())
        .collect()
}

/// Mean of the defined R-multiples. 0.0 when none are defined.
pub fn avg_r(trades: &[NormalizedTrade]) -> f64 {
    mean_f64(&r_multiples(trades))
}

/// Closed P&L summed over trades with the given direction.
pub fn direction_pnl(trades: &[NormalizedTrade], direction: TradeDirection) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_closed() && t.direction == direction)
        .map(|t| t.profit)
        .sum()
}

// ─── Helpers ────────────────────────────────────────────────────────

fn closed_profits(trades: &[NormalizedTrade]) -> impl Iterator<Item = f64> + '_ {
    trades.iter().filter(|t| t.is_closed()).map(|t| t.profit)
}

pub(crate) fn outcome_count(trades: &[NormalizedTrade], outcome: TradeOutcome) -> usize {
    trades
        .iter()
        .filter(|t| t.is_closed() && t.outcome() == outcome)
        .count()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
