//! 애플리케이션 공유 상태.

use sqlx::PgPool;

/// 모든 핸들러에 주입되는 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 커넥션 풀
    pub pool: PgPool,
    /// API 버전 (CARGO_PKG_VERSION)
    pub version: String,
}

impl AppState {
    /// 새 상태를 생성합니다.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 데이터베이스 연결 상태를 확인합니다.
    pub async fn is_db_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
