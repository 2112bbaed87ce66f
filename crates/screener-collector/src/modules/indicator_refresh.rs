//! 기술 지표 갱신 모듈.
//!
//! 2단계로 진행됩니다:
//! 1. 기준일에 종가가 있는 전 심볼을 배치로 돌며 13개월 시세를 조회하고
//!    심볼별 지표 스냅샷을 UPSERT (`rs_rating` 제외)
//! 2. 기준일의 가중 변화율 전체를 다시 읽어 유니버스 백분위(1~99)를
//!    계산하고 `rs_rating`을 일괄 갱신

use crate::config::IndicatorConfig;
use crate::error::CollectorError;
use crate::Result;
use chrono::{Months, NaiveDate};
use screener_analytics::{compute_snapshot, rs_ratings, DailyRecord};
use screener_core::IndicatorSnapshot;
use screener_data::{Database, IndicatorStore, PriceStore};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 시세 조회 구간 (개월). 12개월 모멘텀 + 탐색 윈도우 여유분.
const HISTORY_MONTHS: u32 = 13;

/// 지표 갱신 실행 통계.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorRunStats {
    /// 기준일에 종가가 있던 심볼 수
    pub eligible: usize,
    /// 스냅샷이 저장된 심볼 수
    pub stored: usize,
    /// `rs_rating`이 갱신된 심볼 수
    pub rated: usize,
    /// 소요 시간
    pub elapsed: Duration,
}

impl IndicatorRunStats {
    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            eligible = self.eligible,
            stored = self.stored,
            rated = self.rated,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "지표 갱신 완료"
        );
    }
}

/// 기준일의 지표를 계산해 저장합니다.
pub async fn refresh_indicators(
    db: &Database,
    config: &IndicatorConfig,
    calc_date: NaiveDate,
) -> Result<IndicatorRunStats> {
    let start = Instant::now();
    let mut stats = IndicatorRunStats::default();

    let prices = PriceStore::new(db.pool().clone());
    let indicators = IndicatorStore::new(db.pool().clone());

    let symbols = prices.symbols_on(calc_date).await?;
    stats.eligible = symbols.len();
    if symbols.is_empty() {
        warn!(date = %calc_date, "기준일에 종가가 있는 심볼이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let window_start = calc_date
        .checked_sub_months(Months::new(HISTORY_MONTHS))
        .ok_or_else(|| CollectorError::Config(format!("invalid calculation date: {}", calc_date)))?;

    info!(
        date = %calc_date,
        symbols = symbols.len(),
        batch_size = config.batch_size,
        "지표 계산 시작"
    );

    // 1단계: 배치별 스냅샷 계산 및 저장
    let total_batches = symbols.len().div_ceil(config.batch_size);
    for (batch_idx, batch) in symbols.chunks(config.batch_size).enumerate() {
        let rows = prices.history_window(batch, window_start, calc_date).await?;

        // 심볼별로 묶는다 (조회 결과는 심볼, 날짜 내림차순 정렬)
        let mut by_symbol: HashMap<&str, Vec<DailyRecord>> = HashMap::new();
        for row in &rows {
            by_symbol.entry(row.symbol.as_str()).or_default().push(DailyRecord {
                date: row.date,
                close: row.close,
                high: row.high,
                low: row.low,
                volume: row.volume,
            });
        }

        let snapshots: Vec<IndicatorSnapshot> = batch
            .iter()
            .filter_map(|symbol| {
                by_symbol
                    .get(symbol.as_str())
                    .and_then(|series| compute_snapshot(symbol, series, calc_date))
            })
            .collect();

        if snapshots.is_empty() {
            info!(batch = batch_idx + 1, total_batches, "배치에 계산 가능한 심볼 없음");
            continue;
        }

        indicators.upsert_snapshots(&snapshots).await?;
        stats.stored += snapshots.len();
        info!(
            batch = batch_idx + 1,
            total_batches,
            stored = snapshots.len(),
            "지표 배치 저장 완료"
        );
    }

    // 2단계: 유니버스 백분위 계산
    let weighted = indicators.weighted_changes_on(calc_date).await?;
    if weighted.is_empty() {
        warn!(date = %calc_date, "백분위 계산 대상이 없습니다");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let ratings = rs_ratings(&weighted);
    stats.rated = indicators.set_rs_ratings(calc_date, &ratings).await? as usize;

    stats.elapsed = start.elapsed();
    Ok(stats)
}
