//! 가격 시계열 저장소.
//!
//! `stock_prices` 테이블에 대한 벌크 쓰기를 담당합니다. 처리 경로별로
//! 충돌 규칙이 다릅니다:
//! - 신규 적재: `ON CONFLICT DO NOTHING` (재실행 허용)
//! - 증분 갱신: `ON CONFLICT DO UPDATE` (최근 가격 덮어쓰기)
//! - 전체 재적재: 한 트랜잭션 안에서 DELETE + INSERT (원자성 보장)

use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use screener_core::{PriceBar, TickerMetadata};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use std::collections::HashMap;
use tracing::debug;

/// 지표 계산용 일별 시세 행.
#[derive(Debug, Clone, FromRow)]
pub struct DailyQuote {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: i64,
}

/// 가격 저장소.
#[derive(Clone)]
pub struct PriceStore {
    pool: PgPool,
}

/// UNNEST 바인딩용 컬럼 배열.
struct BarArrays {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    opens: Vec<Decimal>,
    highs: Vec<Decimal>,
    lows: Vec<Decimal>,
    closes: Vec<Decimal>,
    volumes: Vec<i64>,
}

fn to_arrays(bars: &[PriceBar]) -> BarArrays {
    BarArrays {
        symbols: bars.iter().map(|b| b.symbol.clone()).collect(),
        dates: bars.iter().map(|b| b.date).collect(),
        opens: bars.iter().map(|b| b.open).collect(),
        highs: bars.iter().map(|b| b.high).collect(),
        lows: bars.iter().map(|b| b.low).collect(),
        closes: bars.iter().map(|b| b.close).collect(),
        volumes: bars.iter().map(|b| b.volume).collect(),
    }
}

impl PriceStore {
    /// 새 저장소 인스턴스 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 특정 날짜의 전 심볼 종가를 한 번의 쿼리로 조회.
    ///
    /// 기업 행위 감지는 심볼별 쿼리가 아니라 이 단일 쿼리를 사용합니다.
    pub async fn closes_on(&self, date: NaiveDate) -> Result<HashMap<String, Decimal>> {
        let rows: Vec<(String, Decimal)> =
            sqlx::query_as("SELECT symbol, close FROM stock_prices WHERE ts = $1")
                .bind(date)
                .fetch_all(&self.pool)
                .await?;

        debug!(date = %date, count = rows.len(), "기준일 종가 조회");
        Ok(rows.into_iter().collect())
    }

    /// 가격 바 벌크 삽입 (중복 키는 무시).
    ///
    /// 반환값은 실제로 삽입된 행 수입니다.
    pub async fn insert_bars(&self, bars: &[PriceBar]) -> Result<u64> {
        if bars.is_empty() {
            return Ok(0);
        }
        let a = to_arrays(bars);

        let result = sqlx::query(
            r#"
            INSERT INTO stock_prices (symbol, ts, open, high, low, close, volume)
            SELECT * FROM UNNEST(
                $1::text[], $2::date[], $3::numeric[], $4::numeric[],
                $5::numeric[], $6::numeric[], $7::bigint[]
            )
            ON CONFLICT (symbol, ts) DO NOTHING
            "#,
        )
        .bind(&a.symbols)
        .bind(&a.dates)
        .bind(&a.opens)
        .bind(&a.highs)
        .bind(&a.lows)
        .bind(&a.closes)
        .bind(&a.volumes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// 가격 바 벌크 UPSERT (중복 키는 덮어쓰기).
    ///
    /// 최근 구간 갱신용: 같은 날짜의 가격이 장중 확정 전에 바뀔 수 있으므로
    /// 항상 새 값으로 교체합니다.
    pub async fn upsert_bars(&self, bars: &[PriceBar]) -> Result<u64> {
        if bars.is_empty() {
            return Ok(0);
        }
        let a = to_arrays(bars);

        let result = sqlx::query(
            r#"
            INSERT INTO stock_prices (symbol, ts, open, high, low, close, volume)
            SELECT * FROM UNNEST(
                $1::text[], $2::date[], $3::numeric[], $4::numeric[],
                $5::numeric[], $6::numeric[], $7::bigint[]
            )
            ON CONFLICT (symbol, ts) DO UPDATE SET
                open = EXCLUDED.open,
                high = EXCLUDED.high,
                low = EXCLUDED.low,
                close = EXCLUDED.close,
                volume = EXCLUDED.volume
            "#,
        )
        .bind(&a.symbols)
        .bind(&a.dates)
        .bind(&a.opens)
        .bind(&a.highs)
        .bind(&a.lows)
        .bind(&a.closes)
        .bind(&a.volumes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// 심볼 그룹의 전체 이력 교체 (DELETE + INSERT + 메타데이터 갱신).
    ///
    /// 전체가 한 트랜잭션으로 커밋되므로, 재적재 심볼의 부분 이력이
    /// 읽기 측에 노출되지 않습니다. 반환값은 (삭제 행 수, 삽입 행 수).
    pub async fn replace_history(
        &self,
        symbols: &[String],
        bars: &[PriceBar],
        metadata: &[TickerMetadata],
    ) -> Result<(u64, u64)> {
        if symbols.is_empty() {
            return Ok((0, 0));
        }

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM stock_prices WHERE symbol = ANY($1)")
            .bind(symbols)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let a = to_arrays(bars);
        let inserted = sqlx::query(
            r#"
            INSERT INTO stock_prices (symbol, ts, open, high, low, close, volume)
            SELECT * FROM UNNEST(
                $1::text[], $2::date[], $3::numeric[], $4::numeric[],
                $5::numeric[], $6::numeric[], $7::bigint[]
            )
            "#,
        )
        .bind(&a.symbols)
        .bind(&a.dates)
        .bind(&a.opens)
        .bind(&a.highs)
        .bind(&a.lows)
        .bind(&a.closes)
        .bind(&a.volumes)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        for meta in metadata {
            sqlx::query(
                r#"
                UPDATE tickers
                SET first_date = $2, last_date = $3, record_count = $4, last_updated = NOW()
                WHERE symbol = $1
                "#,
            )
            .bind(&meta.symbol)
            .bind(meta.first_date)
            .bind(meta.last_date)
            .bind(meta.record_count)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            symbols = symbols.len(),
            deleted, inserted, "이력 교체 트랜잭션 커밋"
        );
        Ok((deleted, inserted))
    }

    /// 특정 날짜에 종가가 있는 심볼 목록.
    pub async fn symbols_on(&self, date: NaiveDate) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT symbol FROM stock_prices WHERE ts = $1 ORDER BY symbol")
                .bind(date)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    /// 심볼 배치의 기간 시세 조회 (심볼별 날짜 내림차순).
    pub async fn history_window(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyQuote>> {
        let rows: Vec<DailyQuote> = sqlx::query_as(
            r#"
            SELECT symbol, ts AS date, close, high, low, volume
            FROM stock_prices
            WHERE symbol = ANY($1) AND ts >= $2 AND ts <= $3
            ORDER BY symbol, ts DESC
            "#,
        )
        .bind(symbols)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// 심볼의 저장된 가격 바 수.
    pub async fn count_bars(&self, symbol: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM stock_prices WHERE symbol = $1")
                .bind(symbol)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
