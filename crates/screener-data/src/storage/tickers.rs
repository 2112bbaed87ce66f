//! 심볼 메타데이터 저장소.
//!
//! `tickers` 테이블은 가격 바 집합에서 유도된 정보만 담습니다.
//! 추적 중인 심볼 집합 조회가 전체 가격 테이블 스캔 없이 가능하도록
//! 심볼당 한 행을 유지합니다.

use crate::error::Result;
use chrono::NaiveDate;
use screener_core::TickerMetadata;
use sqlx::postgres::PgPool;
use std::collections::HashSet;
use tracing::debug;

/// 심볼 메타데이터 저장소.
#[derive(Clone)]
pub struct TickerStore {
    pool: PgPool,
}

impl TickerStore {
    /// 새 저장소 인스턴스 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 현재 추적 중인 심볼 집합.
    pub async fn tracked_symbols(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT symbol FROM tickers")
            .fetch_all(&self.pool)
            .await?;

        let symbols: HashSet<String> = rows.into_iter().map(|(s,)| s).collect();
        debug!(count = symbols.len(), "추적 심볼 집합 조회");
        Ok(symbols)
    }

    /// 신규 심볼 메타데이터 벌크 삽입 (이미 있으면 무시).
    pub async fn insert_new(&self, metadata: &[TickerMetadata]) -> Result<u64> {
        if metadata.is_empty() {
            return Ok(0);
        }

        let symbols: Vec<String> = metadata.iter().map(|m| m.symbol.clone()).collect();
        let asset_types: Vec<String> = metadata.iter().map(|m| m.asset_type.clone()).collect();
        let countries: Vec<String> = metadata.iter().map(|m| m.country.clone()).collect();
        let first_dates: Vec<NaiveDate> = metadata.iter().map(|m| m.first_date).collect();
        let last_dates: Vec<NaiveDate> = metadata.iter().map(|m| m.last_date).collect();
        let counts: Vec<i64> = metadata.iter().map(|m| m.record_count).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO tickers (symbol, asset_type, country, first_date, last_date, record_count, last_updated)
            SELECT *, NOW() FROM UNNEST(
                $1::text[], $2::text[], $3::text[], $4::date[], $5::date[], $6::bigint[]
            )
            ON CONFLICT (symbol) DO NOTHING
            "#,
        )
        .bind(&symbols)
        .bind(&asset_types)
        .bind(&countries)
        .bind(&first_dates)
        .bind(&last_dates)
        .bind(&counts)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// 증분 갱신 후 메타데이터 재계산.
    ///
    /// `record_count`는 배치 내용이 아니라 저장소 전체의 `COUNT(*)`로
    /// 다시 계산합니다 (배치는 기존 행과 겹칠 수 있음).
    pub async fn refresh_after_upsert(&self, symbol: &str, last_date: NaiveDate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tickers
            SET last_date = GREATEST(last_date, $2),
                record_count = (SELECT COUNT(*) FROM stock_prices WHERE symbol = $1),
                last_updated = NOW()
            WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .bind(last_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
