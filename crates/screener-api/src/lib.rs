//! 스크리너 조회 API.
//!
//! 수집기가 적재한 가격/티커/지표 데이터를 읽기 전용으로 제공합니다.
//! 쓰기는 전부 수집기(screener-collector)의 책임이며 이 서버는 어떤
//! 테이블도 수정하지 않습니다.

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiErrorResponse, ApiResult};
pub use state::AppState;
