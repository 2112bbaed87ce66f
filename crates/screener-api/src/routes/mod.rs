//! API 라우트 모듈.

pub mod health;
pub mod indicators;
pub mod prices;
pub mod tickers;

use axum::Router;

use crate::state::AppState;

/// 전체 API 라우터를 생성합니다.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/health", health::health_router())
        .nest("/api/tickers", tickers::tickers_router())
        .nest("/api/prices", prices::prices_router())
        .nest("/api/indicators", indicators::indicators_router())
}
