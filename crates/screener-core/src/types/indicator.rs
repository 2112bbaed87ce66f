//! 기술 지표 스냅샷 타입.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 심볼의 특정 계산일 기준 지표 묶음.
///
/// 상대강도(RS) 구성 요소와 변동성/범위 지표를 함께 담습니다.
/// `rs_rating`은 유니버스 전체 백분위가 필요하므로 2차 패스에서 채워집니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// 심볼
    pub symbol: String,
    /// 계산 기준일
    pub calculation_date: NaiveDate,
    /// 가중 변화율 (0.4*3mo + 0.2*6mo + 0.2*9mo + 0.2*12mo)
    pub weighted_change: Decimal,
    /// 최근 3개월 변화율 (%)
    pub pct_change_3mo: Decimal,
    /// 3~6개월 구간 변화율 (%)
    pub pct_change_6mo: Decimal,
    /// 6~9개월 구간 변화율 (%)
    pub pct_change_9mo: Decimal,
    /// 9~12개월 구간 변화율 (%)
    pub pct_change_12mo: Decimal,
    /// 기준일 종가
    pub close_price: Decimal,
    /// 전일 대비 변화율 (%)
    pub pct_change_1d: Option<Decimal>,
    /// 기준일 고저 범위 (%)
    pub daily_percent_range: Option<Decimal>,
    /// 20일 평균 일일 범위 (%)
    pub adr20: Option<Decimal>,
    /// 52주 최저가
    pub low_52w: Option<Decimal>,
    /// 기준일 거래량
    pub current_volume: i64,
    /// 30일 평균 거래량
    pub avg_volume_30d: Option<Decimal>,
    /// 상대강도 백분위 (1~99, 2차 패스에서 계산)
    pub rs_rating: Option<i32>,
}
