//! 티커 목록 조회 endpoint.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{db_error, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 1000;
const MAX_LIMIT: i64 = 20000;

/// 티커 목록 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct TickerListQuery {
    /// ISO 3166-1 alpha-3 국가 코드 필터 (예: "USA")
    pub country: Option<String>,
    /// 최대 반환 개수 (기본 1000)
    pub limit: Option<i64>,
}

/// 티커 메타데이터 행.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TickerRow {
    pub symbol: String,
    pub asset_type: String,
    pub country: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub record_count: i64,
    pub last_updated: DateTime<Utc>,
}

/// 티커 목록 응답.
#[derive(Debug, Serialize)]
pub struct TickerListResponse {
    pub count: usize,
    pub tickers: Vec<TickerRow>,
}

/// 추적 중인 티커 목록을 조회합니다.
///
/// GET /api/tickers?country=USA&limit=100
pub async fn list_tickers(
    State(state): State<AppState>,
    Query(params): Query<TickerListQuery>,
) -> ApiResult<Json<TickerListResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let country = params.country.map(|c| c.trim().to_uppercase());

    let tickers: Vec<TickerRow> = sqlx::query_as(
        r#"
        SELECT symbol, asset_type, country, first_date, last_date,
               record_count, last_updated
        FROM tickers
        WHERE ($1::text IS NULL OR country = $1)
        ORDER BY symbol
        LIMIT $2
        "#,
    )
    .bind(country)
    .bind(limit)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    Ok(Json(TickerListResponse {
        count: tickers.len(),
        tickers,
    }))
}

/// 티커 라우터 생성.
pub fn tickers_router() -> Router<AppState> {
    Router::new().route("/", get(list_tickers))
}
