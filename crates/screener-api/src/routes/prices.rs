//! 심볼별 가격 히스토리 조회 endpoint.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use screener_core::canonicalize_symbol;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{db_error, invalid_input, not_found, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 10000;

/// 가격 히스토리 조회 파라미터.
#[derive(Debug, Deserialize)]
pub struct PriceHistoryQuery {
    /// 조회 시작일 (포함)
    pub start: Option<NaiveDate>,
    /// 조회 종료일 (포함)
    pub end: Option<NaiveDate>,
    /// 최대 반환 개수 (기본 100, 최신순)
    pub limit: Option<i64>,
}

/// 일봉 행.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

/// 가격 히스토리 응답.
#[derive(Debug, Serialize)]
pub struct PriceHistoryResponse {
    pub symbol: String,
    pub count: usize,
    /// 최신순 일봉 목록
    pub bars: Vec<PriceRow>,
}

/// 특정 심볼의 일봉 히스토리를 조회합니다 (최신순).
///
/// GET /api/prices/{symbol}?start=2024-01-01&end=2024-12-31&limit=250
pub async fn price_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<PriceHistoryQuery>,
) -> ApiResult<Json<PriceHistoryResponse>> {
    let symbol = canonicalize_symbol(&symbol);
    if symbol.is_empty() {
        return Err(invalid_input("symbol must not be empty"));
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let bars: Vec<PriceRow> = sqlx::query_as(
        r#"
        SELECT ts AS date, open, high, low, close, volume
        FROM stock_prices
        WHERE symbol = $1
          AND ($2::date IS NULL OR ts >= $2)
          AND ($3::date IS NULL OR ts <= $3)
        ORDER BY ts DESC
        LIMIT $4
        "#,
    )
    .bind(&symbol)
    .bind(params.start)
    .bind(params.end)
    .bind(limit)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    if bars.is_empty() {
        return Err(not_found(format!("no price history for symbol: {}", symbol)));
    }

    Ok(Json(PriceHistoryResponse {
        count: bars.len(),
        symbol,
        bars,
    }))
}

/// 가격 라우터 생성.
pub fn prices_router() -> Router<AppState> {
    Router::new().route("/{symbol}", get(price_history))
}
