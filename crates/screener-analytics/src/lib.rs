//! 상대강도 및 범위 지표 계산.
//!
//! 이 크레이트는 저장소나 네트워크에 의존하지 않는 순수 계산만 담습니다.
//! 입력은 심볼 하나의 일별 시세를 날짜 내림차순으로 정렬한 슬라이스이며,
//! 데이터가 부족하면 오류 대신 `None`을 돌려줘 호출 측이 해당 심볼을
//! 건너뛰도록 합니다.
//!
//! - [`relative_strength`]: 분기별 변화율과 가중 변화율, 유니버스 백분위
//! - [`range_metrics`]: 일일 범위, ADR20, 52주 최저가, 거래량 평균
//! - [`snapshot`]: 두 계산을 합쳐 저장용 스냅샷 생성

pub mod range_metrics;
pub mod relative_strength;
pub mod snapshot;

use chrono::NaiveDate;
use rust_decimal::Decimal;

pub use range_metrics::RangeMetrics;
pub use relative_strength::{rs_ratings, MomentumProfile};
pub use snapshot::compute_snapshot;

/// 지표 계산 입력 행 (심볼 하나의 하루치 시세).
///
/// 저장소의 조회 결과를 이 형태로 옮겨 전달합니다. 슬라이스는 반드시
/// 날짜 내림차순(최신이 앞)이어야 합니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: i64,
}
