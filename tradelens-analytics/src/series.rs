//! Chart series and calendar bucketing — P&L trends, pies, top symbols.
//!
//! All keys derive from the UTC representation of the parsed timestamp, so
//! the same journal buckets identically on any machine. Exit-keyed maps
//! cover closed trades with an exit date; entry-keyed maps document their
//! own population.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use tradelens_core::{NormalizedTrade, TradeDirection, TradeOutcome};

// ─── Series records ─────────────────────────────────────────────────

/// One bucket of a time series: a calendar period key and its summed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPnl {
    pub period: String,
    pub pnl: f64,
}

/// One named slice of a pie chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: usize,
}

/// Per-symbol P&L and trade count, for the top-symbols board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolStat {
    pub symbol: String,
    pub pnl: f64,
    pub count: usize,
}

/// Chart-ready series for one windowed trade collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Closed P&L per exit day, ascending by day.
    pub pnl_trend: Vec<PeriodPnl>,
    /// `entry_price × quantity` per entry day over all trades, ascending.
    pub exposure_trend: Vec<PeriodPnl>,
    pub win_loss_pie: Vec<PieSlice>,
    pub trade_type_pie: Vec<PieSlice>,
    /// Up to 5 symbols by absolute summed P&L, descending.
    pub top_symbols: Vec<SymbolStat>,
    pub best_day: Option<PeriodPnl>,
    pub worst_day: Option<PeriodPnl>,
}

impl ChartData {
    /// Build every chart series from an already-windowed collection.
    pub fn compute(trades: &[NormalizedTrade]) -> Self {
        let pnl_trend: Vec<PeriodPnl> = pnl_by_exit_day(trades)
            .into_iter()
            .map(|(period, pnl)| PeriodPnl { period, pnl })
            .collect();

        let mut exposure_by_day: BTreeMap<String, f64> = BTreeMap::new();
        for t in trades {
            if let Some(entry) = t.entry_date {
                *exposure_by_day.entry(day_key(entry)).or_insert(0.0) += t.exposure();
            }
        }
        let exposure_trend = exposure_by_day
            .into_iter()
            .map(|(period, pnl)| PeriodPnl { period, pnl })
            .collect();

        let win_loss_pie = win_loss_pie(trades);
        let trade_type_pie = trade_type_pie(trades);

        // Symbol board covers all trades, any status
        let mut symbol_pnl: BTreeMap<String, f64> = BTreeMap::new();
        let mut symbol_count: BTreeMap<String, usize> = BTreeMap::new();
        for t in trades {
            *symbol_pnl.entry(t.symbol.clone()).or_insert(0.0) += t.profit;
            *symbol_count.entry(t.symbol.clone()).or_insert(0) += 1;
        }
        let mut top_symbols: Vec<SymbolStat> = symbol_pnl
            .into_iter()
            .map(|(symbol, pnl)| {
                let count = symbol_count.get(&symbol).copied().unwrap_or(0);
                SymbolStat { symbol, pnl, count }
            })
            .collect();
        // Stable sort: ties stay in symbol order
        top_symbols.sort_by(|a, b| b.pnl.abs().total_cmp(&a.pnl.abs()));
        top_symbols.truncate(5);

        let best_day = best_period(&pnl_trend);
        let worst_day = worst_period(&pnl_trend);

        Self {
            pnl_trend,
            exposure_trend,
            win_loss_pie,
            trade_type_pie,
            top_symbols,
            best_day,
            worst_day,
        }
    }
}

// ─── Calendar keys ──────────────────────────────────────────────────

/// `YYYY-MM-DD` in UTC.
pub fn day_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// `YYYY-Www` using the ISO week-numbering year (e.g. `2024-W07`).
pub fn week_key(ts: DateTime<Utc>) -> String {
    let week = ts.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// `YYYY-MM` in UTC.
pub fn month_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m").to_string()
}

// ─── Bucket builders ────────────────────────────────────────────────

/// Closed P&L per symbol.
pub fn pnl_by_symbol(trades: &[NormalizedTrade]) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    for t in trades.iter().filter(|t| t.is_closed()) {
        *map.entry(t.symbol.clone()).or_insert(0.0) += t.profit;
    }
    map
}

/// Closed P&L per UTC entry hour (0–23). Trades without an entry date are
/// skipped.
pub fn pnl_by_entry_hour(trades: &[NormalizedTrade]) -> BTreeMap<u32, f64> {
    let mut map = BTreeMap::new();
    for t in trades.iter().filter(|t| t.is_closed()) {
        if let Some(entry) = t.entry_date {
            *map.entry(entry.hour()).or_insert(0.0) += t.profit;
        }
    }
    map
}

/// Closed P&L per exit day.
pub fn pnl_by_exit_day(trades: &[NormalizedTrade]) -> BTreeMap<String, f64> {
    pnl_by_exit_key(trades, day_key)
}

/// Closed P&L per exit ISO week.
pub fn pnl_by_exit_week(trades: &[NormalizedTrade]) -> BTreeMap<String, f64> {
    pnl_by_exit_key(trades, week_key)
}

/// Closed P&L per exit month.
pub fn pnl_by_exit_month(trades: &[NormalizedTrade]) -> BTreeMap<String, f64> {
    pnl_by_exit_key(trades, month_key)
}

/// Trade count per entry day over all trades, any status. Feeds the
/// calendar heatmap and the overtrading check.
pub fn count_by_entry_day(trades: &[NormalizedTrade]) -> BTreeMap<String, u32> {
    let mut map = BTreeMap::new();
    for t in trades {
        if let Some(entry) = t.entry_date {
            *map.entry(day_key(entry)).or_insert(0) += 1;
        }
    }
    map
}

/// Closed-trade count per symbol.
pub fn count_by_symbol(trades: &[NormalizedTrade]) -> BTreeMap<String, u32> {
    let mut map = BTreeMap::new();
    for t in trades.iter().filter(|t| t.is_closed()) {
        *map.entry(t.symbol.clone()).or_insert(0) += 1;
    }
    map
}

/// Closed-trade outcome counts as the three fixed `Wins` / `Losses` /
/// `Breakeven` slices. The slices are always present, even at zero.
pub fn win_loss_pie(trades: &[NormalizedTrade]) -> Vec<PieSlice> {
    let mut wins = 0;
    let mut losses = 0;
    let mut breakeven = 0;
    for t in trades.iter().filter(|t| t.is_closed()) {
        match t.outcome() {
            TradeOutcome::Win => wins += 1,
            TradeOutcome::Loss => losses += 1,
            TradeOutcome::Breakeven => breakeven += 1,
        }
    }
    vec![
        PieSlice { name: "Wins".into(), value: wins },
        PieSlice { name: "Losses".into(), value: losses },
        PieSlice { name: "Breakeven".into(), value: breakeven },
    ]
}

/// Direction counts over all trades as fixed `Long` / `Short` slices.
/// Unspecified directions join neither.
pub fn trade_type_pie(trades: &[NormalizedTrade]) -> Vec<PieSlice> {
    let long_count = trades
        .iter()
        .filter(|t| t.direction == TradeDirection::Long)
        .count();
    let short_count = trades
        .iter()
        .filter(|t| t.direction == TradeDirection::Short)
        .count();
    vec![
        PieSlice { name: "Long".into(), value: long_count },
        PieSlice { name: "Short".into(), value: short_count },
    ]
}

fn pnl_by_exit_key(
    trades: &[NormalizedTrade],
    key: impl Fn(DateTime<Utc>) -> String,
) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    for t in trades.iter().filter(|t| t.is_closed()) {
        if let Some(exit) = t.exit_date {
            *map.entry(key(exit)).or_insert(0.0) += t.profit;
        }
    }
    map
}

// ─── Period extremes ────────────────────────────────────────────────

/// Highest-P&L bucket of a trend. Ties resolve to the later period.
pub fn best_period(trend: &[PeriodPnl]) -> Option<PeriodPnl> {
    let mut best: Option<&PeriodPnl> = None;
    for p in trend {
        match best {
            Some(b) if b.pnl > p.pnl => {}
            _ => best = Some(p),
        }
    }
    best.cloned()
}

/// Lowest-P&L bucket of a trend. Ties resolve to the later period.
pub fn worst_period(trend: &[PeriodPnl]) -> Option<PeriodPnl> {
    let mut worst: Option<&PeriodPnl> = None;
    for p in trend {
        match worst {
            Some(w) if w.pnl < p.pnl => {}
            _ => worst = Some(p),
        }
    }
    worst.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tradelens_core::TradeStatus;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn trade_on(symbol: &str, exit: DateTime<Utc>, profit: f64) -> NormalizedTrade {
        NormalizedTrade {
            symbol: symbol.into(),
            direction: TradeDirection::Long,
            status: TradeStatus::Closed,
            entry_date: Some(exit - chrono::Duration::days(1)),
            exit_date: Some(exit),
            quantity: 5.0,
            exit_quantity: 5.0,
            entry_price: 200.0,
            stop_loss: 0.0,
            target: 0.0,
            profit,
            total_charges: 0.0,
            brokerage: 0.0,
        }
    }

    // ── Calendar keys ──

    #[test]
    fn day_and_month_keys() {
        let ts = utc(2024, 2, 5, 9);
        assert_eq!(day_key(ts), "2024-02-05");
        assert_eq!(month_key(ts), "2024-02");
    }

    #[test]
    fn week_key_zero_padded() {
        assert_eq!(week_key(utc(2024, 2, 15, 9)), "2024-W07");
    }

    #[test]
    fn week_key_uses_iso_year_at_boundary() {
        // 2024-12-30 is the Monday of ISO week 1 of 2025
        assert_eq!(week_key(utc(2024, 12, 30, 9)), "2025-W01");
    }

    // ── Bucket builders ──

    #[test]
    fn pnl_buckets_sum_per_key() {
        let trades = vec![
            trade_on("A", utc(2024, 3, 4, 15), 10.0),
            trade_on("A", utc(2024, 3, 4, 16), 5.0),
            trade_on("B", utc(2024, 3, 6, 15), -3.0),
        ];
        let days = pnl_by_exit_day(&trades);
        assert_eq!(days.len(), 2);
        assert!((days["2024-03-04"] - 15.0).abs() < 1e-10);
        assert!((days["2024-03-06"] - (-3.0)).abs() < 1e-10);

        let weeks = pnl_by_exit_week(&trades);
        // Both days fall in ISO week 10 of 2024
        assert_eq!(weeks.len(), 1);
        assert!((weeks["2024-W10"] - 12.0).abs() < 1e-10);

        let months = pnl_by_exit_month(&trades);
        assert!((months["2024-03"] - 12.0).abs() < 1e-10);
    }

    #[test]
    fn pnl_buckets_skip_open_and_undated() {
        let mut open = trade_on("A", utc(2024, 3, 4, 15), 10.0);
        open.status = TradeStatus::Open;
        let mut undated = trade_on("A", utc(2024, 3, 4, 15), 10.0);
        undated.exit_date = None;
        assert!(pnl_by_exit_day(&[open, undated]).is_empty());
    }

    #[test]
    fn hour_bucket_uses_entry_hour() {
        let mut t = trade_on("A", utc(2024, 3, 4, 20), 10.0);
        t.entry_date = Some(utc(2024, 3, 3, 9));
        let hours = pnl_by_entry_hour(&[t]);
        assert_eq!(hours.len(), 1);
        assert!((hours[&9] - 10.0).abs() < 1e-10);
    }

    #[test]
    fn entry_day_counts_include_open_trades() {
        let mut open = trade_on("A", utc(2024, 3, 4, 15), 0.0);
        open.status = TradeStatus::Open;
        open.entry_date = Some(utc(2024, 3, 3, 9));
        let t = trade_on("B", utc(2024, 3, 4, 15), 5.0); // entry 2024-03-03
        let counts = count_by_entry_day(&[open, t]);
        assert_eq!(counts["2024-03-03"], 2);
    }

    #[test]
    fn symbol_counts_closed_only() {
        let mut open = trade_on("A", utc(2024, 3, 4, 15), 0.0);
        open.status = TradeStatus::Open;
        let trades = vec![open, trade_on("A", utc(2024, 3, 5, 15), 5.0)];
        let counts = count_by_symbol(&trades);
        assert_eq!(counts["A"], 1);
    }

    // ── Period extremes ──

    #[test]
    fn extremes_pick_max_and_min() {
        let trend = vec![
            PeriodPnl { period: "2024-03-04".into(), pnl: 10.0 },
            PeriodPnl { period: "2024-03-05".into(), pnl: -4.0 },
            PeriodPnl { period: "2024-03-06".into(), pnl: 7.0 },
        ];
        assert_eq!(best_period(&trend).map(|p| p.period).as_deref(), Some("2024-03-04"));
        assert_eq!(worst_period(&trend).map(|p| p.period).as_deref(), Some("2024-03-05"));
    }

    #[test]
    fn extremes_tie_keeps_later_period() {
        let trend = vec![
            PeriodPnl { period: "2024-03-04".into(), pnl: 10.0 },
            PeriodPnl { period: "2024-03-05".into(), pnl: 10.0 },
        ];
        assert_eq!(best_period(&trend).map(|p| p.period).as_deref(), Some("2024-03-05"));
        assert_eq!(worst_period(&trend).map(|p| p.period).as_deref(), Some("2024-03-05"));
    }

    #[test]
    fn extremes_empty_trend() {
        assert_eq!(best_period(&[]), None);
        assert_eq!(worst_period(&[]), None);
    }

    // ── ChartData ──

    #[test]
    fn chart_trend_is_date_ordered() {
        // Input deliberately out of date order
        let trades = vec![
            trade_on("A", utc(2024, 3, 6, 15), -3.0),
            trade_on("A", utc(2024, 3, 4, 15), 10.0),
        ];
        let chart = ChartData::compute(&trades);
        let days: Vec<&str> = chart.pnl_trend.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(days, vec!["2024-03-04", "2024-03-06"]);
    }

    #[test]
    fn chart_exposure_covers_all_statuses() {
        let mut open = trade_on("A", utc(2024, 3, 4, 15), 0.0);
        open.status = TradeStatus::Open;
        open.entry_date = Some(utc(2024, 3, 3, 9));
        open.entry_price = 100.0;
        open.quantity = 2.0;
        let mut closed = trade_on("B", utc(2024, 3, 4, 15), 5.0);
        closed.entry_date = Some(utc(2024, 3, 3, 11));
        closed.entry_price = 50.0;
        closed.quantity = 4.0;
        let chart = ChartData::compute(&[open, closed]);
        assert_eq!(chart.exposure_trend.len(), 1);
        // 100×2 + 50×4 = 400 on the shared entry day
        assert!((chart.exposure_trend[0].pnl - 400.0).abs() < 1e-10);
    }

    #[test]
    fn chart_pies_have_fixed_slices() {
        let mut short = trade_on("B", utc(2024, 3, 5, 15), -2.0);
        short.direction = TradeDirection::Short;
        let trades = vec![trade_on("A", utc(2024, 3, 4, 15), 10.0), short];
        let chart = ChartData::compute(&trades);
        assert_eq!(chart.win_loss_pie.len(), 3);
        assert_eq!(chart.win_loss_pie[0], PieSlice { name: "Wins".into(), value: 1 });
        assert_eq!(chart.win_loss_pie[1], PieSlice { name: "Losses".into(), value: 1 });
        assert_eq!(chart.win_loss_pie[2], PieSlice { name: "Breakeven".into(), value: 0 });
        assert_eq!(chart.trade_type_pie[0], PieSlice { name: "Long".into(), value: 1 });
        assert_eq!(chart.trade_type_pie[1], PieSlice { name: "Short".into(), value: 1 });
    }

    #[test]
    fn chart_pies_materialize_for_empty_input() {
        let chart = ChartData::compute(&[]);
        assert_eq!(chart.win_loss_pie.len(), 3);
        assert_eq!(chart.trade_type_pie.len(), 2);
        assert!(chart.pnl_trend.is_empty());
        assert_eq!(chart.best_day, None);
    }

    #[test]
    fn chart_top_symbols_by_absolute_pnl() {
        let trades = vec![
            trade_on("AAA", utc(2024, 3, 4, 15), 5.0),
            trade_on("BBB", utc(2024, 3, 4, 15), -50.0),
            trade_on("CCC", utc(2024, 3, 4, 15), 20.0),
        ];
        let chart = ChartData::compute(&trades);
        let order: Vec<&str> = chart.top_symbols.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(order, vec!["BBB", "CCC", "AAA"]);
        assert_eq!(chart.top_symbols[0].count, 1);
    }

    #[test]
    fn chart_top_symbols_truncates_to_five() {
        let mut trades = Vec::new();
        for (i, sym) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
            trades.push(trade_on(sym, utc(2024, 3, 4, 15), (i + 1) as f64));
        }
        let chart = ChartData::compute(&trades);
        assert_eq!(chart.top_symbols.len(), 5);
        assert_eq!(chart.top_symbols[0].symbol, "G");
    }

    #[test]
    fn chart_symbol_board_includes_open_trades() {
        let mut open = trade_on("A", utc(2024, 3, 4, 15), 0.0);
        open.status = TradeStatus::Open;
        let trades = vec![open, trade_on("A", utc(2024, 3, 5, 15), 5.0)];
        let chart = ChartData::compute(&trades);
        assert_eq!(chart.top_symbols[0].count, 2);
    }

    #[test]
    fn chart_best_worst_day() {
        let trades = vec![
            trade_on("A", utc(2024, 3, 4, 15), 10.0),
            trade_on("A", utc(2024, 3, 5, 15), -4.0),
        ];
        let chart = ChartData::compute(&trades);
        assert_eq!(chart.best_day.map(|p| p.period).as_deref(), Some("2024-03-04"));
        assert_eq!(chart.worst_day.map(|p| p.period).as_deref(), Some("2024-03-05"));
    }
}
