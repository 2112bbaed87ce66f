//! 지표 스냅샷 조립.

use chrono::NaiveDate;
use screener_core::IndicatorSnapshot;

use crate::range_metrics::RangeMetrics;
use crate::relative_strength::momentum_profile;
use crate::DailyRecord;

/// 한 심볼의 저장용 지표 스냅샷을 계산합니다.
///
/// 모멘텀 네 구간이 모두 채워져야 스냅샷이 만들어집니다. 범위 지표는
/// 항목별로 비어 있을 수 있습니다. `rs_rating`은 여기서 채우지 않고
/// 유니버스 백분위 패스에서 갱신합니다.
pub fn compute_snapshot(
    symbol: &str,
    series: &[DailyRecord],
    calc_date: NaiveDate,
) -> Option<IndicatorSnapshot> {
    let momentum = momentum_profile(series, calc_date)?;
    let range = RangeMetrics::compute(series, calc_date)?;

    Some(IndicatorSnapshot {
        symbol: symbol.to_string(),
        calculation_date: calc_date,
        weighted_change: momentum.weighted_change,
        pct_change_3mo: momentum.pct_change_3mo,
        pct_change_6mo: momentum.pct_change_6mo,
        pct_change_9mo: momentum.pct_change_9mo,
        pct_change_12mo: momentum.pct_change_12mo,
        close_price: momentum.close.round_dp(4),
        pct_change_1d: range.pct_change_1d,
        daily_percent_range: range.daily_percent_range,
        adr20: range.adr20,
        low_52w: range.low_52w,
        current_volume: range.current_volume,
        avg_volume_30d: range.avg_volume_30d,
        rs_rating: None,
    })
}
