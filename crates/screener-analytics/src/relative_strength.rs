//! 상대강도 (Relative Strength) 계산.
//!
//! 기준일 대비 3/6/9/12개월 전 가격을 찾아 분기별 변화율을 구하고,
//! 최근 분기에 가중치를 둔 가중 변화율을 만듭니다. 과거 가격은 목표일
//! 이전 7일 이내의 가장 최근 거래일에서 찾으며, 네 구간 중 하나라도
//! 비면 해당 심볼은 계산 대상에서 빠집니다.
//!
//! # 계산 공식
//!
//! - `pct_3mo  = (현재가 - P3) / P3 × 100`
//! - `pct_6mo  = (P3 - P6) / P6 × 100` (6~3개월 구간)
//! - `pct_9mo  = (P6 - P9) / P9 × 100`
//! - `pct_12mo = (P9 - P12) / P12 × 100`
//! - `weighted_change = 0.4×pct_3mo + 0.2×pct_6mo + 0.2×pct_9mo + 0.2×pct_12mo`

use chrono::{Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::DailyRecord;

/// 과거 가격 탐색 윈도우 (일).
pub const LOOKUP_WINDOW_DAYS: i64 = 7;

/// 한 심볼의 모멘텀 계산 결과.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumProfile {
    /// 기준일 이전 가장 최근 종가.
    pub close: Decimal,
    /// 그 종가의 실제 거래일.
    pub close_date: NaiveDate,
    /// 최근 3개월 변화율 (%).
    pub pct_change_3mo: Decimal,
    /// 3~6개월 구간 변화율 (%).
    pub pct_change_6mo: Decimal,
    /// 6~9개월 구간 변화율 (%).
    pub pct_change_9mo: Decimal,
    /// 9~12개월 구간 변화율 (%).
    pub pct_change_12mo: Decimal,
    /// 가중 변화율.
    pub weighted_change: Decimal,
}

/// 날짜 내림차순 슬라이스에서 `[target - 7일, target]` 구간의
/// 가장 최근 종가를 찾습니다.
fn close_in_window(series: &[DailyRecord], target: NaiveDate) -> Option<(NaiveDate, Decimal)> {
    let window_start = target - Duration::days(LOOKUP_WINDOW_DAYS);
    series
        .iter()
        .find(|r| r.date <= target && r.date >= window_start)
        .map(|r| (r.date, r.close))
}

/// 두 시점 사이 변화율 (%). 기준 가격이 0 이하이면 `None`.
fn pct_change(to: Decimal, from: Decimal) -> Option<Decimal> {
    if from <= Decimal::ZERO {
        return None;
    }
    Some(((to - from) / from * dec!(100)).round_dp(2))
}

/// 모멘텀 프로파일 계산.
///
/// `series`는 한 심볼의 일별 시세를 날짜 내림차순으로 정렬한 것이어야
/// 하며, 기준일로부터 최소 12개월 이전까지 덮어야 합니다. 네 구간 중
/// 하나라도 가격을 찾지 못하면 `None`.
pub fn momentum_profile(series: &[DailyRecord], calc_date: NaiveDate) -> Option<MomentumProfile> {
    let current = series.iter().find(|r| r.date <= calc_date)?;

    let target_3mo = calc_date.checked_sub_months(Months::new(3))?;
    let target_6mo = calc_date.checked_sub_months(Months::new(6))?;
    let target_9mo = calc_date.checked_sub_months(Months::new(9))?;
    let target_12mo = calc_date.checked_sub_months(Months::new(12))?;

    let (_, price_3mo) = close_in_window(series, target_3mo)?;
    let (_, price_6mo) = close_in_window(series, target_6mo)?;
    let (_, price_9mo) = close_in_window(series, target_9mo)?;
    let (_, price_12mo) = close_in_window(series, target_12mo)?;

    let pct_change_3mo = pct_change(current.close, price_3mo)?;
    let pct_change_6mo = pct_change(price_3mo, price_6mo)?;
    let pct_change_9mo = pct_change(price_6mo, price_9mo)?;
    let pct_change_12mo = pct_change(price_9mo, price_12mo)?;

    let weighted_change = (pct_change_3mo * dec!(0.4)
        + pct_change_6mo * dec!(0.2)
        + pct_change_9mo * dec!(0.2)
        + pct_change_12mo * dec!(0.2))
    .round_dp(2);

    Some(MomentumProfile {
        close: current.close,
        close_date: current.date,
        pct_change_3mo,
        pct_change_6mo,
        pct_change_9mo,
        pct_change_12mo,
        weighted_change,
    })
}

/// 가중 변화율의 유니버스 백분위 (1~99).
///
/// 최소 순위(min-rank) 방식의 백분위를 1~99 구간으로 펼칩니다.
/// 동률은 같은 등급을 받고, 유니버스 최하위는 1, 최상위는 99가 됩니다.
pub fn rs_ratings(weighted: &[(String, Decimal)]) -> Vec<(String, i32)> {
    if weighted.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<Decimal> = weighted.iter().map(|(_, w)| *w).collect();
    sorted.sort();

    let n = Decimal::from(weighted.len());
    weighted
        .iter()
        .map(|(symbol, w)| {
            // min-rank: 자기보다 작은 값의 수 + 1
            let rank = Decimal::from(sorted.partition_point(|v| v < w) + 1);
            let rating = (rank / n * dec!(98) + Decimal::ONE).round();
            let rating = rating.mantissa().clamp(1, 99) as i32;
            (symbol.clone(), rating)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, close: Decimal) -> DailyRecord {
        DailyRecord {
            date,
            close,
            high: close,
            low: close,
            volume: 1_000,
        }
    }

    #[test]
    fn window_lookup_prefers_most_recent() {
        let series = vec![
            bar(d(2024, 3, 15), dec!(110)),
            bar(d(2024, 3, 14), dec!(108)),
            bar(d(2024, 3, 10), dec!(105)),
        ];
        let found = close_in_window(&series, d(2024, 3, 15)).unwrap();
        assert_eq!(found, (d(2024, 3, 15), dec!(110)));

        // 목표일에 거래가 없으면 7일 이내 가장 최근 거래일
        let found = close_in_window(&series, d(2024, 3, 13)).unwrap();
        assert_eq!(found, (d(2024, 3, 10), dec!(105)));
    }

    #[test]
    fn window_lookup_rejects_stale_prices() {
        let series = vec![bar(d(2024, 1, 1), dec!(100))];
        assert!(close_in_window(&series, d(2024, 3, 15)).is_none());
    }

    #[test]
    fn momentum_profile_weights_recent_quarter() {
        // 100 → 110 → 121 → 133.1 → 146.41: 매 분기 +10%
        let series = vec![
            bar(d(2024, 12, 31), dec!(146.41)),
            bar(d(2024, 9, 30), dec!(133.1)),
            bar(d(2024, 6, 30), dec!(121)),
            bar(d(2024, 3, 31), dec!(110)),
            bar(d(2023, 12, 31), dec!(100)),
        ];
        let profile = momentum_profile(&series, d(2024, 12, 31)).unwrap();
        assert_eq!(profile.pct_change_3mo, dec!(10.00));
        assert_eq!(profile.pct_change_6mo, dec!(10.00));
        assert_eq!(profile.pct_change_9mo, dec!(10.00));
        assert_eq!(profile.pct_change_12mo, dec!(10.00));
        assert_eq!(profile.weighted_change, dec!(10.00));
        assert_eq!(profile.close, dec!(146.41));
    }

    #[test]
    fn momentum_profile_requires_all_quarters() {
        // 12개월 전 가격 없음
        let series = vec![
            bar(d(2024, 12, 31), dec!(146.41)),
            bar(d(2024, 9, 30), dec!(133.1)),
            bar(d(2024, 6, 30), dec!(121)),
            bar(d(2024, 3, 31), dec!(110)),
        ];
        assert!(momentum_profile(&series, d(2024, 12, 31)).is_none());
    }

    #[test]
    fn rs_ratings_span_one_to_ninety_nine() {
        let weighted: Vec<(String, Decimal)> = (0..100)
            .map(|i| (format!("S{i:03}"), Decimal::from(i)))
            .collect();
        let ratings = rs_ratings(&weighted);

        let lowest = ratings.iter().find(|(s, _)| s == "S000").unwrap().1;
        let highest = ratings.iter().find(|(s, _)| s == "S099").unwrap().1;
        assert_eq!(lowest, 2); // (1/100)*98 + 1 = 1.98 → 2
        assert_eq!(highest, 99);
        assert!(ratings.iter().all(|(_, r)| (1..=99).contains(r)));
    }

    #[test]
    fn rs_ratings_ties_share_rank() {
        let weighted = vec![
            ("A".to_string(), dec!(5)),
            ("B".to_string(), dec!(5)),
            ("C".to_string(), dec!(1)),
        ];
        let ratings = rs_ratings(&weighted);
        let a = ratings.iter().find(|(s, _)| s == "A").unwrap().1;
        let b = ratings.iter().find(|(s, _)| s == "B").unwrap().1;
        assert_eq!(a, b);
    }
}
