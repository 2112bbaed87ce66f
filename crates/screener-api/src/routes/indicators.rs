//! 지표 스크리닝 endpoint.
//!
//! 특정 계산일의 지표 스냅샷을 상대강도 순으로 조회합니다.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{db_error, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 200;
const MAX_LIMIT: i64 = 20000;

/// 지표 스크리닝 파라미터.
#[derive(Debug, Deserialize)]
pub struct IndicatorScreenQuery {
    /// 계산 기준일 (기본: 가장 최근 계산일)
    pub date: Option<NaiveDate>,
    /// 상대강도 하한 필터 (1~99)
    pub min_rs_rating: Option<i32>,
    /// 최대 반환 개수 (기본 200)
    pub limit: Option<i64>,
}

/// 지표 스냅샷 행.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IndicatorRow {
    pub symbol: String,
    pub calculation_date: NaiveDate,
    pub rs_rating: Option<i32>,
    pub weighted_change: Decimal,
    pub pct_change_3mo: Decimal,
    pub pct_change_6mo: Decimal,
    pub pct_change_9mo: Decimal,
    pub pct_change_12mo: Decimal,
    pub close_price: Decimal,
    pub pct_change_1d: Option<Decimal>,
    pub daily_percent_range: Option<Decimal>,
    pub adr20: Option<Decimal>,
    pub low_52w: Option<Decimal>,
    pub current_volume: i64,
    pub avg_volume_30d: Option<Decimal>,
}

/// 지표 스크리닝 응답.
#[derive(Debug, Serialize)]
pub struct IndicatorScreenResponse {
    /// 조회된 계산일 (데이터가 전혀 없으면 None)
    pub date: Option<NaiveDate>,
    pub count: usize,
    /// 상대강도 내림차순 스냅샷 목록
    pub snapshots: Vec<IndicatorRow>,
}

/// 지표 스냅샷을 조회합니다 (상대강도 내림차순).
///
/// GET /api/indicators?date=2024-06-03&min_rs_rating=80&limit=50
pub async fn screen_indicators(
    State(state): State<AppState>,
    Query(params): Query<IndicatorScreenQuery>,
) -> ApiResult<Json<IndicatorScreenResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    // 기준일 미지정 시 가장 최근 계산일 사용
    let date = match params.date {
        Some(d) => Some(d),
        None => sqlx::query_scalar("SELECT MAX(calculation_date) FROM stock_indicators")
            .fetch_one(&state.pool)
            .await
            .map_err(db_error)?,
    };

    let Some(date) = date else {
        return Ok(Json(IndicatorScreenResponse {
            date: None,
            count: 0,
            snapshots: Vec::new(),
        }));
    };

    let snapshots: Vec<IndicatorRow> = sqlx::query_as(
        r#"
        SELECT symbol, calculation_date, rs_rating, weighted_change,
               pct_change_3mo, pct_change_6mo, pct_change_9mo, pct_change_12mo,
               close_price, pct_change_1d, daily_percent_range, adr20,
               low_52w, current_volume, avg_volume_30d
        FROM stock_indicators
        WHERE calculation_date = $1
          AND ($2::int IS NULL OR rs_rating >= $2)
        ORDER BY rs_rating DESC NULLS LAST, symbol
        LIMIT $3
        "#,
    )
    .bind(date)
    .bind(params.min_rs_rating)
    .bind(limit)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(IndicatorScreenResponse {
        date: Some(date),
        count: snapshots.len(),
        snapshots,
    }))
}

/// 지표 라우터 생성.
pub fn indicators_router() -> Router<AppState> {
    Router::new().route("/", get(screen_indicators))
}
