use serde::Serialize;

use super::types::MonthRecord;

/// One bar of the per-month stacked chart, in today's money.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub month: u32,
    pub label: String,
    pub liquidity: i64,
    pub investments: i64,
    pub total_invested: i64,
    pub total: i64,
}

pub fn chart_series(trajectory: &[MonthRecord]) -> Vec<ChartPoint> {
    trajectory
        .iter()
        .enumerate()
        .map(|(idx, record)| ChartPoint {
            month: idx as u32 + 1,
            label: record.date_month.format("%b %y").to_string(),
            liquidity: whole(record.inflation_adjusted_liquidity),
            investments: whole(record.inflation_adjusted_investments),
            total_invested: whole(record.total_invested),
            total: whole(record.inflation_adjusted_total),
        })
        .collect()
}

// Halves round up, towards positive infinity. Non-finite values render as zero.
fn whole(value: f64) -> i64 {
    if value.is_finite() {
        (value + 0.5).floor() as i64
    } else {
        0
    }
}
