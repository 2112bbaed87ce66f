//! 범위/변동성 지표.
//!
//! 기준일의 일일 고저 범위와 전일 대비 변화율, 20일 평균 범위(ADR20),
//! 52주 최저가, 30일 평균 거래량을 계산합니다. 모멘텀과 달리 데이터가
//! 부족한 항목만 개별적으로 `None`이 됩니다.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::DailyRecord;

/// ADR 계산에 필요한 최소 거래일 수.
const ADR_PERIOD: usize = 20;
/// 평균 거래량 계산에 필요한 최소 거래일 수.
const AVG_VOLUME_PERIOD: usize = 30;
/// 52주 최저가 조회 기간 (주).
const LOW_LOOKBACK_WEEKS: i64 = 52;

/// 범위/변동성 지표 묶음.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeMetrics {
    /// 기준일 고저 범위 (%): (high - low) / close × 100.
    pub daily_percent_range: Option<Decimal>,
    /// 전일 대비 변화율 (%).
    pub pct_change_1d: Option<Decimal>,
    /// 최근 20거래일 평균 일일 범위 (%).
    pub adr20: Option<Decimal>,
    /// 최근 52주 최저가.
    pub low_52w: Option<Decimal>,
    /// 기준일 거래량.
    pub current_volume: i64,
    /// 최근 30거래일 평균 거래량.
    pub avg_volume_30d: Option<Decimal>,
}

/// 하루치 고저 범위 (%). 종가가 0 이하이면 `None`.
fn percent_range(record: &DailyRecord) -> Option<Decimal> {
    if record.close <= Decimal::ZERO {
        return None;
    }
    Some((record.high - record.low) / record.close * dec!(100))
}

impl RangeMetrics {
    /// 날짜 내림차순 시세 슬라이스에서 범위 지표를 계산합니다.
    ///
    /// 기준일 이전 시세가 하나도 없으면 `None`.
    pub fn compute(series: &[DailyRecord], calc_date: NaiveDate) -> Option<Self> {
        let from_calc = {
            let start = series.partition_point(|r| r.date > calc_date);
            &series[start..]
        };
        let current = from_calc.first()?;

        let daily_percent_range = percent_range(current).map(|r| r.round_dp(2));

        let pct_change_1d = from_calc
            .iter()
            .find(|r| r.date < current.date)
            .filter(|prev| prev.close > Decimal::ZERO)
            .map(|prev| ((current.close - prev.close) / prev.close * dec!(100)).round_dp(2));

        let adr20 = if from_calc.len() >= ADR_PERIOD {
            let ranges: Vec<Decimal> = from_calc[..ADR_PERIOD]
                .iter()
                .filter_map(percent_range)
                .collect();
            if ranges.is_empty() {
                None
            } else {
                let sum: Decimal = ranges.iter().sum();
                Some((sum / Decimal::from(ranges.len())).round_dp(2))
            }
        } else {
            None
        };

        let low_cutoff = calc_date - Duration::weeks(LOW_LOOKBACK_WEEKS);
        let low_52w = from_calc
            .iter()
            .filter(|r| r.date >= low_cutoff)
            .map(|r| r.low)
            .min()
            .map(|l| l.round_dp(4));

        let avg_volume_30d = if from_calc.len() >= AVG_VOLUME_PERIOD {
            let sum: i64 = from_calc[..AVG_VOLUME_PERIOD].iter().map(|r| r.volume).sum();
            Some((Decimal::from(sum) / Decimal::from(AVG_VOLUME_PERIOD)).round_dp(0))
        } else {
            None
        };

        Some(Self {
            daily_percent_range,
            pct_change_1d,
            adr20,
            low_52w,
            current_volume: current.volume,
            avg_volume_30d,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn flat_series(days: usize, close: Decimal, volume: i64) -> Vec<DailyRecord> {
        (0..days)
            .map(|i| DailyRecord {
                date: d(2024, 12, 31) - Duration::days(i as i64),
                close,
                high: close + dec!(2),
                low: close - dec!(2),
                volume,
            })
            .collect()
    }

    #[test]
    fn daily_range_and_one_day_change() {
        let series = vec![
            DailyRecord {
                date: d(2024, 12, 31),
                close: dec!(100),
                high: dec!(104),
                low: dec!(99),
                volume: 5_000,
            },
            DailyRecord {
                date: d(2024, 12, 30),
                close: dec!(80),
                high: dec!(81),
                low: dec!(79),
                volume: 4_000,
            },
        ];
        let m = RangeMetrics::compute(&series, d(2024, 12, 31)).unwrap();
        assert_eq!(m.daily_percent_range, Some(dec!(5.00)));
        assert_eq!(m.pct_change_1d, Some(dec!(25.00)));
        assert_eq!(m.current_volume, 5_000);
        // 20일 미만이므로 ADR 없음
        assert_eq!(m.adr20, None);
        assert_eq!(m.avg_volume_30d, None);
    }

    #[test]
    fn adr_and_volume_need_full_periods() {
        let series = flat_series(30, dec!(100), 2_000);
        let m = RangeMetrics::compute(&series, d(2024, 12, 31)).unwrap();
        // (102-98)/100*100 = 4% 매일 동일
        assert_eq!(m.adr20, Some(dec!(4.00)));
        assert_eq!(m.avg_volume_30d, Some(dec!(2000)));

        let short = flat_series(29, dec!(100), 2_000);
        let m = RangeMetrics::compute(&short, d(2024, 12, 31)).unwrap();
        assert_eq!(m.adr20, Some(dec!(4.00)));
        assert_eq!(m.avg_volume_30d, None);
    }

    #[test]
    fn low_52w_ignores_older_rows() {
        let mut series = flat_series(10, dec!(100), 1_000);
        // 52주보다 오래된 극단적 저가
        series.push(DailyRecord {
            date: d(2023, 1, 2),
            close: dec!(10),
            high: dec!(11),
            low: dec!(9),
            volume: 1_000,
        });
        let m = RangeMetrics::compute(&series, d(2024, 12, 31)).unwrap();
        assert_eq!(m.low_52w, Some(dec!(98.0000)));
    }

    #[test]
    fn future_rows_are_excluded() {
        let series = vec![
            DailyRecord {
                date: d(2025, 1, 2),
                close: dec!(999),
                high: dec!(999),
                low: dec!(999),
                volume: 1,
            },
            DailyRecord {
                date: d(2024, 12, 31),
                close: dec!(100),
                high: dec!(101),
                low: dec!(99),
                volume: 500,
            },
        ];
        let m = RangeMetrics::compute(&series, d(2024, 12, 31)).unwrap();
        assert_eq!(m.current_volume, 500);
    }

    #[test]
    fn empty_series_yields_none() {
        assert!(RangeMetrics::compute(&[], d(2024, 12, 31)).is_none());
    }
}
