//! 기술 지표 저장소.
//!
//! `stock_indicators` 테이블은 `(symbol, calculation_date)` 고유 키로
//! UPSERT됩니다. `rs_rating`은 유니버스 전체 백분위가 필요하므로
//! 1차 패스에서는 비워 두고 2차 패스에서 일괄 갱신합니다.

use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use screener_core::IndicatorSnapshot;
use sqlx::postgres::PgPool;
use tracing::debug;

/// 지표 저장소.
#[derive(Clone)]
pub struct IndicatorStore {
    pool: PgPool,
}

impl IndicatorStore {
    /// 새 저장소 인스턴스 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 지표 스냅샷 벌크 UPSERT (`rs_rating` 제외).
    pub async fn upsert_snapshots(&self, snapshots: &[IndicatorSnapshot]) -> Result<u64> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        let symbols: Vec<String> = snapshots.iter().map(|s| s.symbol.clone()).collect();
        let dates: Vec<NaiveDate> = snapshots.iter().map(|s| s.calculation_date).collect();
        let weighted: Vec<Decimal> = snapshots.iter().map(|s| s.weighted_change).collect();
        let pct_3mo: Vec<Decimal> = snapshots.iter().map(|s| s.pct_change_3mo).collect();
        let pct_6mo: Vec<Decimal> = snapshots.iter().map(|s| s.pct_change_6mo).collect();
        let pct_9mo: Vec<Decimal> = snapshots.iter().map(|s| s.pct_change_9mo).collect();
        let pct_12mo: Vec<Decimal> = snapshots.iter().map(|s| s.pct_change_12mo).collect();
        let closes: Vec<Decimal> = snapshots.iter().map(|s| s.close_price).collect();
        let pct_1d: Vec<Option<Decimal>> = snapshots.iter().map(|s| s.pct_change_1d).collect();
        let ranges: Vec<Option<Decimal>> =
            snapshots.iter().map(|s| s.daily_percent_range).collect();
        let adr20: Vec<Option<Decimal>> = snapshots.iter().map(|s| s.adr20).collect();
        let lows_52w: Vec<Option<Decimal>> = snapshots.iter().map(|s| s.low_52w).collect();
        let volumes: Vec<i64> = snapshots.iter().map(|s| s.current_volume).collect();
        let avg_volumes: Vec<Option<Decimal>> =
            snapshots.iter().map(|s| s.avg_volume_30d).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO stock_indicators (
                symbol, calculation_date, weighted_change,
                pct_change_3mo, pct_change_6mo, pct_change_9mo, pct_change_12mo,
                close_price, pct_change_1d, daily_percent_range, adr20, low_52w,
                current_volume, avg_volume_30d
            )
            SELECT * FROM UNNEST(
                $1::text[], $2::date[], $3::numeric[],
                $4::numeric[], $5::numeric[], $6::numeric[], $7::numeric[],
                $8::numeric[], $9::numeric[], $10::numeric[], $11::numeric[], $12::numeric[],
                $13::bigint[], $14::numeric[]
            )
            ON CONFLICT (symbol, calculation_date) DO UPDATE SET
                weighted_change = EXCLUDED.weighted_change,
                pct_change_3mo = EXCLUDED.pct_change_3mo,
                pct_change_6mo = EXCLUDED.pct_change_6mo,
                pct_change_9mo = EXCLUDED.pct_change_9mo,
                pct_change_12mo = EXCLUDED.pct_change_12mo,
                close_price = EXCLUDED.close_price,
                pct_change_1d = EXCLUDED.pct_change_1d,
                daily_percent_range = EXCLUDED.daily_percent_range,
                adr20 = EXCLUDED.adr20,
                low_52w = EXCLUDED.low_52w,
                current_volume = EXCLUDED.current_volume,
                avg_volume_30d = EXCLUDED.avg_volume_30d
            "#,
        )
        .bind(&symbols)
        .bind(&dates)
        .bind(&weighted)
        .bind(&pct_3mo)
        .bind(&pct_6mo)
        .bind(&pct_9mo)
        .bind(&pct_12mo)
        .bind(&closes)
        .bind(&pct_1d)
        .bind(&ranges)
        .bind(&adr20)
        .bind(&lows_52w)
        .bind(&volumes)
        .bind(&avg_volumes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// 특정 계산일의 전 심볼 가중 변화율 조회 (백분위 계산용).
    pub async fn weighted_changes_on(&self, date: NaiveDate) -> Result<Vec<(String, Decimal)>> {
        let rows: Vec<(String, Decimal)> = sqlx::query_as(
            r#"
            SELECT symbol, weighted_change
            FROM stock_indicators
            WHERE calculation_date = $1 AND weighted_change IS NOT NULL
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// 백분위 계산 결과(`rs_rating`)를 일괄 기록.
    pub async fn set_rs_ratings(&self, date: NaiveDate, ratings: &[(String, i32)]) -> Result<u64> {
        if ratings.is_empty() {
            return Ok(0);
        }

        let symbols: Vec<String> = ratings.iter().map(|(s, _)| s.clone()).collect();
        let values: Vec<i32> = ratings.iter().map(|(_, r)| *r).collect();

        let result = sqlx::query(
            r#"
            UPDATE stock_indicators AS i
            SET rs_rating = v.rating
            FROM UNNEST($2::text[], $3::int[]) AS v(symbol, rating)
            WHERE i.symbol = v.symbol AND i.calculation_date = $1
            "#,
        )
        .bind(date)
        .bind(&symbols)
        .bind(&values)
        .execute(&self.pool)
        .await?;

        debug!(date = %date, updated = result.rows_affected(), "rs_rating 갱신");
        Ok(result.rows_affected())
    }
}
