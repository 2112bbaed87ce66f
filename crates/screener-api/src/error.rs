//! 통합 API 에러 응답 타입.
//!
//! 모든 엔드포인트가 동일한 JSON 에러 형식을 반환합니다.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "no price history for symbol: ZZZZ",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "DB_ERROR", "INVALID_INPUT", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    pub timestamp: i64,
}

impl ApiErrorResponse {
    /// 기본 에러를 생성합니다.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// 상세 정보를 포함한 에러를 생성합니다.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 데이터베이스 에러를 500 응답으로 변환합니다.
pub fn db_error(err: sqlx::Error) -> (StatusCode, Json<ApiErrorResponse>) {
    tracing::error!(error = %err, "데이터베이스 조회 실패");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorResponse::new("DB_ERROR", err.to_string())),
    )
}

/// 404 응답을 생성합니다.
pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse::new("NOT_FOUND", message)),
    )
}

/// 400 응답을 생성합니다.
pub fn invalid_input(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new("INVALID_INPUT", message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "test message");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message, "test message");
        assert!(error.details.is_none());
        assert!(error.timestamp > 0);
    }

    #[test]
    fn test_details_skipped_when_absent() {
        let error = ApiErrorResponse::new("NOT_FOUND", "missing");
        let json = serde_json::to_string(&error).unwrap();
        assert!(!json.contains("details"));
        assert!(json.contains(r#""code":"NOT_FOUND""#));
    }

    #[test]
    fn test_with_details() {
        let details = serde_json::json!({"field": "symbol"});
        let error = ApiErrorResponse::with_details("INVALID_INPUT", "bad symbol", details);
        assert!(error.details.is_some());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""field":"symbol""#));
    }
}
