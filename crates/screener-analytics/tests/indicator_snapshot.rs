//! 13개월 일별 시세에서 스냅샷 전체를 계산하는 통합 테스트.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use screener_analytics::{compute_snapshot, rs_ratings, DailyRecord};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// 분기마다 +10% 계단식으로 오르는 13개월 일별 시세.
fn quarterly_step_series() -> Vec<DailyRecord> {
    let mut series = Vec::new();
    let mut date = d(2024, 12, 31);
    while date >= d(2023, 12, 20) {
        let close = if date >= d(2024, 12, 1) {
            dec!(146.41)
        } else if date >= d(2024, 9, 30) {
            dec!(133.1)
        } else if date >= d(2024, 6, 30) {
            dec!(121)
        } else if date >= d(2024, 3, 31) {
            dec!(110)
        } else {
            dec!(100)
        };
        series.push(DailyRecord {
            date,
            close,
            high: close * dec!(1.01),
            low: close * dec!(0.99),
            volume: 1_000_000,
        });
        date -= Duration::days(1);
    }
    series
}

#[test]
fn snapshot_from_full_history() {
    let series = quarterly_step_series();
    let snap = compute_snapshot("AAPL", &series, d(2024, 12, 31)).unwrap();

    assert_eq!(snap.symbol, "AAPL");
    assert_eq!(snap.calculation_date, d(2024, 12, 31));
    assert_eq!(snap.pct_change_3mo, dec!(10.00));
    assert_eq!(snap.pct_change_6mo, dec!(10.00));
    assert_eq!(snap.pct_change_9mo, dec!(10.00));
    assert_eq!(snap.pct_change_12mo, dec!(10.00));
    assert_eq!(snap.weighted_change, dec!(10.00));
    assert_eq!(snap.close_price, dec!(146.4100));

    // 고저폭이 종가의 ±1%이므로 일일 범위는 항상 2%
    assert_eq!(snap.daily_percent_range, Some(dec!(2.00)));
    assert_eq!(snap.adr20, Some(dec!(2.00)));
    assert_eq!(snap.current_volume, 1_000_000);
    assert_eq!(snap.avg_volume_30d, Some(dec!(1000000)));
    // 52주 최저가는 100 구간의 저가
    assert_eq!(snap.low_52w, Some(dec!(99.0000)));
    assert_eq!(snap.rs_rating, None);
}

#[test]
fn snapshot_requires_twelve_months() {
    let series: Vec<DailyRecord> = quarterly_step_series()
        .into_iter()
        .filter(|r| r.date >= d(2024, 6, 1))
        .collect();
    assert!(compute_snapshot("AAPL", &series, d(2024, 12, 31)).is_none());
}

#[test]
fn ratings_follow_weighted_change_ordering() {
    let weighted: Vec<(String, Decimal)> = vec![
        ("WEAK".to_string(), dec!(-25.0)),
        ("FLAT".to_string(), dec!(0.0)),
        ("STRONG".to_string(), dec!(40.0)),
    ];
    let ratings = rs_ratings(&weighted);
    let get = |s: &str| ratings.iter().find(|(sym, _)| sym == s).unwrap().1;
    assert!(get("WEAK") < get("FLAT"));
    assert!(get("FLAT") < get("STRONG"));
    assert_eq!(get("STRONG"), 99);
}
