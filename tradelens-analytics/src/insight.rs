//! Insight engine — threshold-driven strengths, weaknesses, and suggestions.
//!
//! `analyze()` reads the whole normalized collection (no windowing) and
//! produces one report: headline stats, rule findings in a fixed order,
//! suggestions ranked by priority, and the extremes a trader scans first.
//! The threshold set is supplied per call and echoed into the report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tradelens_core::{NormalizedTrade, TradeDirection, TradeOutcome};

use crate::metrics::{self, mean_f64};
use crate::series::{self, PeriodPnl, PieSlice};
use crate::thresholds::InsightThresholds;

// ─── Report types ───────────────────────────────────────────────────

/// Insight engine output.
///
/// `Empty` means the journal held no trades at all; callers branch on the
/// variant instead of probing zero-filled fields. The serialized form keeps
/// the same branch point via the `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightReport {
    Empty,
    Populated(Box<InsightData>),
}

impl InsightReport {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The populated payload, if any.
    pub fn data(&self) -> Option<&InsightData> {
        match self {
            Self::Populated(data) => Some(data),
            Self::Empty => None,
        }
    }
}

/// Everything the insight dashboard renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightData {
    pub stats: InsightStats,
    /// Rule texts in rule order.
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// Sorted ascending by priority; ties keep discovery order.
    pub suggestions: Vec<Suggestion>,
    pub best_symbol: Option<SymbolPnl>,
    pub worst_symbol: Option<SymbolPnl>,
    pub most_traded_symbol: Option<SymbolCount>,
    pub best_hour: Option<HourPnl>,
    pub worst_hour: Option<HourPnl>,
    /// Closed P&L per UTC entry hour.
    pub hour_pnl: BTreeMap<u32, f64>,
    /// Cumulative closed P&L in exit-date order.
    pub equity_curve: Vec<f64>,
    pub best_day: Option<PeriodPnl>,
    pub worst_day: Option<PeriodPnl>,
    pub best_week: Option<PeriodPnl>,
    pub worst_week: Option<PeriodPnl>,
    pub best_month: Option<PeriodPnl>,
    pub worst_month: Option<PeriodPnl>,
    pub win_streak: u32,
    pub loss_streak: u32,
    /// Last five closed trades, most recent first.
    pub recent_trades: Vec<RecentTrade>,
    pub trade_type_stats: TradeTypeStats,
    pub charges_summary: ChargesSummary,
    /// Trade count per entry day over all trades, any status.
    pub calendar_heatmap: BTreeMap<String, u32>,
    pub win_loss_pie: Vec<PieSlice>,
    /// Long/short slice counts over closed trades, mirroring
    /// `trade_type_stats`.
    pub trade_type_pie: Vec<PieSlice>,
    /// Closed-trade count per symbol, in symbol order.
    pub symbol_pie: Vec<SymbolCount>,
    /// Echo of the threshold set this report was evaluated against.
    pub thresholds: InsightThresholds,
}

/// Headline statistics the rules evaluate against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightStats {
    pub closed: u32,
    pub wins: u32,
    pub losses: u32,
    pub breakeven: u32,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub avg_hold_win_days: f64,
    pub avg_hold_loss_days: f64,
    pub avg_r: f64,
    pub max_drawdown: f64,
}

/// A ranked improvement suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub detail: String,
    /// 1 is most urgent; 10 is the default rank.
    pub priority: u8,
}

/// Per-symbol summed closed P&L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPnl {
    pub symbol: String,
    pub pnl: f64,
}

/// Per-symbol closed-trade count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCount {
    pub symbol: String,
    pub count: u32,
}

/// Summed closed P&L for one UTC entry hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourPnl {
    pub hour: u32,
    pub pnl: f64,
}

/// One row of the recent-trades table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTrade {
    /// `YYYY-MM-DD HH:MM` in UTC; empty when the exit date is unknown.
    pub date: String,
    pub symbol: String,
    pub result: TradeOutcome,
    pub pnl: f64,
}

/// Count and P&L for one trade direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SideStats {
    pub count: u32,
    pub pnl: f64,
}

/// Closed-trade split by direction. Unspecified directions join neither side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TradeTypeStats {
    pub long: SideStats,
    pub short: SideStats,
}

/// Cost totals over closed trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChargesSummary {
    pub total_charges: f64,
    pub avg_charges: f64,
    pub total_brokerage: f64,
    pub avg_brokerage: f64,
}

/// Severity of the observed drawdown relative to peak equity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawdownSeverity {
    Low,
    Med,
    High,
}

// ─── Analysis ───────────────────────────────────────────────────────

/// Analyze a normalized trade collection against a threshold set.
///
/// Returns [`InsightReport::Empty`] for an empty collection. Streak fields
/// scan trades in slice order; everything date-dependent sorts internally.
pub fn analyze(trades: &[NormalizedTrade], thresholds: &InsightThresholds) -> InsightReport {
    if trades.is_empty() {
        return InsightReport::Empty;
    }

    let closed_count = trades.iter().filter(|t| t.is_closed()).count();
    let curve = metrics::equity_curve(trades);
    let max_drawdown = metrics::max_drawdown(&curve);
    let r_list = metrics::r_multiples(trades);

    let stats = InsightStats {
        closed: closed_count as u32,
        wins: metrics::outcome_count(trades, TradeOutcome::Win) as u32,
        losses: metrics::outcome_count(trades, TradeOutcome::Loss) as u32,
        breakeven: metrics::outcome_count(trades, TradeOutcome::Breakeven) as u32,
        win_rate: metrics::win_rate(trades),
        avg_win: metrics::avg_win(trades),
        avg_loss: metrics::avg_loss(trades),
        profit_factor: metrics::profit_factor(trades),
        expectancy: metrics::expectancy(trades),
        avg_hold_win_days: metrics::avg_hold_days_for(trades, TradeOutcome::Win),
        avg_hold_loss_days: metrics::avg_hold_days_for(trades, TradeOutcome::Loss),
        avg_r: mean_f64(&r_list),
        max_drawdown,
    };

    // ── Buckets & extremes ──

    let symbol_pnl = series::pnl_by_symbol(trades);
    let best_symbol = max_entry(&symbol_pnl).map(|(symbol, pnl)| SymbolPnl { symbol, pnl });
    let worst_symbol = min_entry(&symbol_pnl).map(|(symbol, pnl)| SymbolPnl { symbol, pnl });

    let symbol_counts = series::count_by_symbol(trades);
    let most_traded_symbol =
        max_entry(&symbol_counts).map(|(symbol, count)| SymbolCount { symbol, count });
    let symbol_pie: Vec<SymbolCount> = symbol_counts
        .iter()
        .map(|(symbol, &count)| SymbolCount { symbol: symbol.clone(), count })
        .collect();

    let hour_pnl = series::pnl_by_entry_hour(trades);
    let best_hour = max_entry(&hour_pnl).map(|(hour, pnl)| HourPnl { hour, pnl });
    let worst_hour = min_entry(&hour_pnl).map(|(hour, pnl)| HourPnl { hour, pnl });

    let day_trend = to_trend(series::pnl_by_exit_day(trades));
    let week_trend = to_trend(series::pnl_by_exit_week(trades));
    let month_trend = to_trend(series::pnl_by_exit_month(trades));

    let calendar_heatmap = series::count_by_entry_day(trades);
    let (win_streak, loss_streak) = metrics::win_loss_streaks(trades);

    // ── Rule conditions ──

    let loss_bigger_than_win =
        stats.avg_win != 0.0 && stats.avg_loss != 0.0 && stats.avg_loss.abs() > stats.avg_win;
    let weak_win_and_pf = stats.win_rate < thresholds.win_rate_weak
        && stats.profit_factor < thresholds.profit_factor_weak;
    let holding_losers_longer =
        stats.avg_hold_loss_days > stats.avg_hold_win_days * thresholds.hold_loss_factor;
    let overtrading = calendar_heatmap
        .values()
        .any(|&count| count >= thresholds.overtrading_trades_per_day);
    let severity = drawdown_severity(&curve, max_drawdown, thresholds);
    let high_drawdown = max_drawdown > 0.0 && severity == DrawdownSeverity::High;
    let weak_hour = worst_hour.as_ref().filter(|h| h.pnl < 0.0);

    let mut weaknesses = Vec::new();
    if loss_bigger_than_win {
        weaknesses.push("Average losing trade larger than average winning trade.".to_string());
    }
    if weak_win_and_pf {
        weaknesses.push("Win rate and profit factor both below target.".to_string());
    }
    if holding_losers_longer {
        weaknesses.push("Holding losers significantly longer than winners.".to_string());
    }
    if overtrading {
        weaknesses.push("Potential overtrading detected (excess trades in a day).".to_string());
    }
    if r_list.len() > 5 && stats.avg_r < thresholds.avg_r_concern {
        weaknesses.push("Average R multiple below concern threshold.".to_string());
    }
    if high_drawdown {
        weaknesses.push("High drawdown relative to peak equity.".to_string());
    }
    if let Some(hour) = weak_hour {
        weaknesses.push(format!("Negative performance during hour {}:00.", hour.hour));
    }

    let mut strengths = Vec::new();
    if stats.win_rate >= thresholds.win_rate_good {
        strengths.push("Win rate above target.".to_string());
    }
    if stats.profit_factor >= thresholds.profit_factor_good && stats.profit_factor.is_finite() {
        strengths.push("Healthy profit factor.".to_string());
    }
    if stats.avg_win != 0.0 && stats.avg_loss != 0.0 && stats.avg_win > stats.avg_loss.abs() {
        strengths.push("Average win exceeds average loss.".to_string());
    }
    if stats.avg_hold_loss_days < stats.avg_hold_win_days {
        strengths.push("Cutting losers faster than winners.".to_string());
    }
    if stats.avg_r >= thresholds.avg_r_target {
        strengths.push("Average R multiple on target or higher.".to_string());
    }
    if let Some(symbol) = best_symbol.as_ref().filter(|s| s.pnl > 0.0) {
        strengths.push(format!("Strong symbol: {}.", symbol.symbol));
    }

    let mut suggestions = Vec::new();
    if loss_bigger_than_win {
        push_suggestion(
            &mut suggestions,
            "Balance Win/Loss Sizes",
            "Tighten stops or extend profit targets so average win ≥ average loss.".to_string(),
        );
    }
    if holding_losers_longer {
        push_suggestion(
            &mut suggestions,
            "Trim Loser Hold Time",
            "Add time-based or pain-based stop to exit lagging trades sooner.".to_string(),
        );
    }
    if stats.avg_r < thresholds.avg_r_target {
        push_suggestion(
            &mut suggestions,
            "Increase R Setup Quality",
            "Only take trades offering ≥1.2R initial potential.".to_string(),
        );
    }
    if overtrading {
        push_suggestion(
            &mut suggestions,
            "Mitigate Overtrading",
            "Set a max trades per day or a cooldown after consecutive losses.".to_string(),
        );
    }
    if let Some(hour) = weak_hour {
        push_suggestion(
            &mut suggestions,
            "Avoid Weak Hour",
            format!(
                "Limit entries around {}:00 or require extra confirmation.",
                hour.hour
            ),
        );
    }
    if stats.profit_factor < thresholds.profit_factor_weak
        && stats.win_rate < thresholds.win_rate_weak
    {
        push_suggestion(
            &mut suggestions,
            "Refine Entry Filters",
            "Stricter criteria / confluence to boost either win rate or RR.".to_string(),
        );
    }
    if high_drawdown {
        push_suggestion(
            &mut suggestions,
            "Drawdown Control",
            "Implement daily/weekly loss caps and reduce size after losing streaks.".to_string(),
        );
    }
    // Stable sort: ties keep discovery order
    suggestions.sort_by_key(|s| s.priority);

    // ── Tables ──

    let mut closed_by_exit: Vec<&NormalizedTrade> =
        trades.iter().filter(|t| t.is_closed()).collect();
    closed_by_exit.sort_by_key(|t| t.exit_epoch_ms());
    let recent_trades: Vec<RecentTrade> = closed_by_exit
        .iter()
        .rev()
        .take(5)
        .map(|t| RecentTrade {
            date: t
                .exit_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            symbol: t.symbol.clone(),
            result: t.outcome(),
            pnl: t.profit,
        })
        .collect();

    let mut trade_type_stats = TradeTypeStats::default();
    for t in trades.iter().filter(|t| t.is_closed()) {
        match t.direction {
            TradeDirection::Long => {
                trade_type_stats.long.count += 1;
                trade_type_stats.long.pnl += t.profit;
            }
            TradeDirection::Short => {
                trade_type_stats.short.count += 1;
                trade_type_stats.short.pnl += t.profit;
            }
            TradeDirection::Unspecified => {}
        }
    }

    // Pie mirrors the closed-only direction stats
    let trade_type_pie = vec![
        PieSlice { name: "Long".into(), value: trade_type_stats.long.count as usize },
        PieSlice { name: "Short".into(), value: trade_type_stats.short.count as usize },
    ];

    let total_charges: f64 = trades
        .iter()
        .filter(|t| t.is_closed())
        .map(|t| t.total_charges)
        .sum();
    let total_brokerage: f64 = trades
        .iter()
        .filter(|t| t.is_closed())
        .map(|t| t.brokerage)
        .sum();
    let charges_summary = ChargesSummary {
        total_charges,
        avg_charges: per_closed(total_charges, closed_count),
        total_brokerage,
        avg_brokerage: per_closed(total_brokerage, closed_count),
    };

    InsightReport::Populated(Box::new(InsightData {
        stats,
        strengths,
        weaknesses,
        suggestions,
        best_symbol,
        worst_symbol,
        most_traded_symbol,
        best_hour,
        worst_hour,
        hour_pnl,
        equity_curve: curve,
        best_day: series::best_period(&day_trend),
        worst_day: series::worst_period(&day_trend),
        best_week: series::best_period(&week_trend),
        worst_week: series::worst_period(&week_trend),
        best_month: series::best_period(&month_trend),
        worst_month: series::worst_period(&month_trend),
        win_streak,
        loss_streak,
        recent_trades,
        trade_type_stats,
        charges_summary,
        calendar_heatmap,
        win_loss_pie: series::win_loss_pie(trades),
        trade_type_pie,
        symbol_pie,
        thresholds: thresholds.clone(),
    }))
}

/// Rate a drawdown against the peak of its equity curve.
///
/// `Low` for an empty curve or a peak at or below zero; otherwise graded by
/// the drawdown as a fraction of the peak.
pub fn drawdown_severity(
    curve: &[f64],
    max_drawdown: f64,
    thresholds: &InsightThresholds,
) -> DrawdownSeverity {
    let Some(peak) = curve.iter().copied().reduce(f64::max) else {
        return DrawdownSeverity::Low;
    };
    if peak <= 0.0 {
        return DrawdownSeverity::Low;
    }
    let pct = max_drawdown / peak;
    if pct > thresholds.drawdown_high_pct {
        DrawdownSeverity::High
    } else if pct > thresholds.drawdown_med_pct {
        DrawdownSeverity::Med
    } else {
        DrawdownSeverity::Low
    }
}

/// Priority rank for a suggestion title: 1 is most urgent, 10 the default.
///
/// Checks run in order against the lower-cased title.
pub fn suggestion_priority(title: &str) -> u8 {
    let title = title.to_lowercase();
    if title.contains("risk") || title.contains("drawdown") {
        1
    } else if title.contains("risk/reward") || title.contains("r multiple") {
        2
    } else if title.contains("overtrading") {
        3
    } else if title.contains("holding time") {
        4
    } else if title.contains("entry criteria") {
        5
    } else {
        10
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn push_suggestion(suggestions: &mut Vec<Suggestion>, title: &str, detail: String) {
    suggestions.push(Suggestion {
        title: title.to_string(),
        detail,
        priority: suggestion_priority(title),
    });
}

fn per_closed(total: f64, closed_count: usize) -> f64 {
    if closed_count > 0 {
        total / closed_count as f64
    } else {
        0.0
    }
}

fn to_trend(map: BTreeMap<String, f64>) -> Vec<PeriodPnl> {
    map.into_iter()
        .map(|(period, pnl)| PeriodPnl { period, pnl })
        .collect()
}

/// First maximum entry in key order (strict comparison keeps the first).
fn max_entry<K: Clone + Ord, V: PartialOrd + Copy>(map: &BTreeMap<K, V>) -> Option<(K, V)> {
    let mut best: Option<(&K, V)> = None;
    for (key, &value) in map {
        match best {
            Some((_, b)) if value > b => best = Some((key, value)),
            None => best = Some((key, value)),
            _ => {}
        }
    }
    best.map(|(key, value)| (key.clone(), value))
}

/// First minimum entry in key order.
fn min_entry<K: Clone + Ord, V: PartialOrd + Copy>(map: &BTreeMap<K, V>) -> Option<(K, V)> {
    let mut worst: Option<(&K, V)> = None;
    for (key, &value) in map {
        match worst {
            Some((_, w)) if value < w => worst = Some((key, value)),
            None => worst = Some((key, value)),
            _ => {}
        }
    }
    worst.map(|(key, value)| (key.clone(), value))
}
