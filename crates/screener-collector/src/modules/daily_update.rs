//! 일일 가격 갱신 파이프라인.
//!
//! 실행 순서:
//! 1. 유니버스 다운로드 (NASDAQ Symbol Directory)
//! 2. 갱신 전략 분류 (신규 / 재적재 / 증분) + 기업 행위 감지
//! 3. 전체 이력 경로: 신규·재적재 심볼을 청크 단위로 내려받아 즉시 저장
//! 4. 증분 경로: 감지 단계에서 받아 둔 단기 데이터를 배치 UPSERT
//!
//! 분류가 끝나면 풀을 닫고, 저장 단계에서 새 풀을 엽니다. 전체 이력
//! 다운로드는 수십 분이 걸릴 수 있어 그동안 유휴 연결을 유지하지
//! 않습니다. 전체 이력은 청크 하나를 받을 때마다 바로 저장하므로
//! 메모리 사용량이 청크 크기에 비례합니다.

use crate::config::CollectorConfig;
use crate::modules::categorize::{categorize_symbols, CategorizedSymbols};
use crate::stats::UpdateReport;
use crate::{CollectorError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use screener_core::{PriceBar, TickerMetadata, TickerProfile, UpdateCategory};
use screener_data::{
    BulkDataset, Database, DatabaseConfig, FetchPeriod, MarketDataProvider, PriceStore,
    TickerStore, UniverseSource,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 가격 정상성 상한 (이 값 이상의 OHLC는 손상으로 간주).
fn price_magnitude_limit() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

/// 재시도 파일 경로.
const RETRY_FILE: &str = "logs/daily_update_failed.txt";

/// 손상 구간 이후의 깨끗한 이력만 남깁니다.
///
/// 최신 날짜부터 거슬러 내려가며 상한을 넘는 첫 행을 찾고, 그 날짜와
/// 그보다 오래된 모든 행을 버립니다 (손상은 과거 방향으로 이어지는
/// 경향이 있음). 반환은 날짜 오름차순입니다.
fn clean_history_suffix(bars: &[PriceBar], limit: Decimal) -> Vec<PriceBar> {
    let mut sorted: Vec<PriceBar> = bars.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let cutoff = sorted
        .iter()
        .find(|b| b.exceeds_magnitude(limit))
        .map(|b| b.date);

    let mut kept: Vec<PriceBar> = match cutoff {
        Some(cutoff) => sorted.into_iter().filter(|b| b.date > cutoff).collect(),
        None => sorted,
    };
    kept.sort_by_key(|b| b.date);
    kept
}

/// 일일 갱신 실행.
///
/// `shutdown`이 취소되면 진행 중인 청크/배치를 마친 뒤 풀을 닫고
/// [`CollectorError::Interrupted`]를 돌려줍니다.
pub async fn daily_update(
    provider: &dyn MarketDataProvider,
    config: &CollectorConfig,
    shutdown: &CancellationToken,
) -> Result<UpdateReport> {
    let start = Instant::now();
    let mut report = UpdateReport::new();
    let du = &config.daily_update;

    if shutdown.is_cancelled() {
        return Err(CollectorError::Interrupted);
    }

    // [1/4] 유니버스 다운로드
    info!("Step 1/4: 유니버스 다운로드");
    let universe = UniverseSource::new()
        .fetch_us_tickers(du.symbol_limit)
        .await?;
    report.universe_size = universe.len();

    if universe.is_empty() {
        warn!("유니버스가 비어 있어 갱신을 중단합니다");
        report.elapsed = start.elapsed();
        return Ok(report);
    }

    // [2/4] 분류 (단계 전용 풀)
    info!("Step 2/4: 갱신 전략 분류");
    let db = Database::connect(&DatabaseConfig::new(&config.database_url)).await?;
    let categorized = categorize_symbols(
        provider,
        &PriceStore::new(db.pool().clone()),
        &TickerStore::new(db.pool().clone()),
        &universe,
        du,
    )
    .await?;
    report.not_found = categorized.not_found;
    // 장시간 다운로드 전 풀 종료
    db.close().await;

    if shutdown.is_cancelled() {
        warn!("종료 신호 수신, 저장 단계 진입 전 중단합니다");
        return Err(CollectorError::Interrupted);
    }

    let CategorizedSymbols {
        new_symbols,
        reload_symbols,
        upsert_symbols,
        lookback_data,
        ..
    } = categorized;

    // [3/4] 전체 이력 경로 (신규 + 재적재)
    info!(
        new = new_symbols.len(),
        reload = reload_symbols.len(),
        "Step 3/4: 전체 이력 다운로드 및 저장"
    );
    let db = Database::connect(&DatabaseConfig::new(&config.database_url)).await?;
    full_history_lanes(
        provider,
        &db,
        &new_symbols,
        &reload_symbols,
        config,
        &mut report,
        shutdown,
    )
    .await;

    if shutdown.is_cancelled() {
        warn!("종료 신호 수신, 풀을 닫고 중단합니다");
        db.close().await;
        return Err(CollectorError::Interrupted);
    }

    // [4/4] 증분 경로 (캐시된 단기 데이터 재사용)
    info!(upsert = upsert_symbols.len(), "Step 4/4: 증분 갱신");
    upsert_lane(&db, &upsert_symbols, &lookback_data, config, &mut report, shutdown).await;
    db.close().await;

    if shutdown.is_cancelled() {
        warn!("종료 신호 수신, 풀을 닫고 중단합니다");
        return Err(CollectorError::Interrupted);
    }

    report.elapsed = start.elapsed();
    report.log_summary();
    report.write_retry_file(Path::new(RETRY_FILE))?;
    Ok(report)
}

/// 한 심볼의 전체 이력 준비 결과.
enum PreparedBars {
    /// 정상성 필터를 통과한 이력 (날짜 오름차순, 비어 있지 않음)
    Ready(Vec<PriceBar>),
    /// 건너뜀 (실패 아님): 모든 행이 정상성 상한을 넘음
    Skipped(&'static str),
    /// 실패: 업스트림 데이터 부재 또는 빈 프레임
    Failed(&'static str),
}

/// 청크 데이터셋에서 한 심볼의 이력을 꺼내 정상성 필터를 적용합니다.
///
/// 전 구간이 손상된 심볼은 건너뜀으로 분류됩니다. 재시도해도 같은
/// 데이터가 내려오므로 실패 목록에 넣지 않습니다.
fn prepare_bars(dataset: &BulkDataset, symbol: &str) -> PreparedBars {
    let Some(frame) = dataset.frame(symbol) else {
        return PreparedBars::Failed("no upstream data");
    };
    if frame.is_empty() {
        return PreparedBars::Failed("empty frame");
    }

    let bars = clean_history_suffix(frame, price_magnitude_limit());
    if bars.is_empty() {
        return PreparedBars::Skipped("all rows exceed price magnitude limit");
    }
    PreparedBars::Ready(bars)
}

/// 신규·재적재 심볼을 청크 단위로 내려받아 즉시 저장합니다.
///
/// 종료 토큰이 취소되면 다음 청크 경계에서 멈춥니다.
#[allow(clippy::too_many_arguments)]
async fn full_history_lanes(
    provider: &dyn MarketDataProvider,
    db: &Database,
    new_symbols: &[String],
    reload_symbols: &[String],
    config: &CollectorConfig,
    report: &mut UpdateReport,
    shutdown: &CancellationToken,
) {
    let du = &config.daily_update;
    if new_symbols.is_empty() && reload_symbols.is_empty() {
        return;
    }

    let new_set: HashSet<&String> = new_symbols.iter().collect();
    let mut combined: Vec<String> = Vec::with_capacity(new_symbols.len() + reload_symbols.len());
    combined.extend(new_symbols.iter().cloned());
    combined.extend(reload_symbols.iter().cloned());

    let prices = PriceStore::new(db.pool().clone());
    let tickers = TickerStore::new(db.pool().clone());

    let total_chunks = combined.len().div_ceil(du.chunk_size);
    for (chunk_idx, chunk) in combined.chunks(du.chunk_size).enumerate() {
        if shutdown.is_cancelled() {
            warn!(
                remaining_chunks = total_chunks - chunk_idx,
                "종료 신호 수신, 남은 전체 이력 청크를 중단합니다"
            );
            break;
        }
        info!(
            chunk = chunk_idx + 1,
            total_chunks,
            symbols = chunk.len(),
            "전체 이력 청크 다운로드"
        );

        let dataset = match provider.fetch(chunk, FetchPeriod::FullHistory).await {
            Ok(dataset) => dataset,
            Err(e) => {
                error!(chunk = chunk_idx + 1, error = %e, "청크 다운로드 실패");
                for symbol in chunk {
                    let category = if new_set.contains(symbol) {
                        UpdateCategory::New
                    } else {
                        UpdateCategory::Reload
                    };
                    report.record_failure(symbol, category, format!("chunk download failed: {}", e));
                }
                continue;
            }
        };

        let (chunk_new, chunk_reload): (Vec<&String>, Vec<&String>) =
            chunk.iter().partition(|s| new_set.contains(s));

        process_new_chunk(provider, &prices, &tickers, &dataset, &chunk_new, report).await;
        process_reload_chunk(&prices, &dataset, &chunk_reload, report).await;

        if chunk_idx + 1 < total_chunks {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(du.chunk_delay()) => {}
            }
        }
    }
}

/// 신규 심볼 청크 저장 (중복 허용 INSERT).
async fn process_new_chunk(
    provider: &dyn MarketDataProvider,
    prices: &PriceStore,
    tickers: &TickerStore,
    dataset: &BulkDataset,
    symbols: &[&String],
    report: &mut UpdateReport,
) {
    if symbols.is_empty() {
        return;
    }

    let mut all_bars: Vec<PriceBar> = Vec::new();
    let mut metadata: Vec<TickerMetadata> = Vec::new();

    for symbol in symbols {
        match prepare_bars(dataset, symbol) {
            PreparedBars::Ready(bars) => {
                // 분류 조회 실패는 기본값(EQUITY/USA)으로 대체, 실패로 치지 않음
                let profile = match provider.fetch_profile(symbol).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        debug!(symbol = %symbol, error = %e, "분류 조회 실패, 기본값 사용");
                        TickerProfile::default()
                    }
                };
                match TickerMetadata::from_bars(symbol, &bars, &profile) {
                    Some(meta) => {
                        all_bars.extend(bars);
                        metadata.push(meta);
                    }
                    None => report.record_failure(*symbol, UpdateCategory::New, "empty frame"),
                }
            }
            PreparedBars::Skipped(reason) => {
                warn!(symbol = %symbol, reason, "전체 이력이 정상성 필터로 제외되어 건너뜀");
                report.record_skip(UpdateCategory::New);
            }
            PreparedBars::Failed(reason) => {
                report.record_failure(*symbol, UpdateCategory::New, reason)
            }
        }
    }

    if metadata.is_empty() {
        return;
    }

    let bulk_result = async {
        prices.insert_bars(&all_bars).await?;
        tickers.insert_new(&metadata).await?;
        Ok::<_, screener_data::DataError>(())
    }
    .await;

    match bulk_result {
        Ok(()) => {
            report.new.success += metadata.len();
            report.new.records += all_bars.len();
            info!(
                tickers = metadata.len(),
                records = all_bars.len(),
                "신규 심볼 청크 저장 완료"
            );
        }
        Err(e) => {
            // 벌크 실패 시 심볼 단위로 재시도해 실패 범위를 좁힌다
            warn!(error = %e, "신규 벌크 저장 실패, 심볼 단위로 재시도");
            for meta in &metadata {
                let bars: Vec<PriceBar> = all_bars
                    .iter()
                    .filter(|b| b.symbol == meta.symbol)
                    .cloned()
                    .collect();
                let single = async {
                    prices.insert_bars(&bars).await?;
                    tickers.insert_new(std::slice::from_ref(meta)).await?;
                    Ok::<_, screener_data::DataError>(())
                }
                .await;
                match single {
                    Ok(()) => {
                        report.new.success += 1;
                        report.new.records += bars.len();
                    }
                    Err(e) => {
                        report.record_failure(&meta.symbol, UpdateCategory::New, e.to_string())
                    }
                }
            }
        }
    }
}

/// 재적재 심볼 청크 저장 (트랜잭션 DELETE + INSERT).
async fn process_reload_chunk(
    prices: &PriceStore,
    dataset: &BulkDataset,
    symbols: &[&String],
    report: &mut UpdateReport,
) {
    if symbols.is_empty() {
        return;
    }

    let mut all_bars: Vec<PriceBar> = Vec::new();
    let mut metadata: Vec<TickerMetadata> = Vec::new();

    for symbol in symbols {
        match prepare_bars(dataset, symbol) {
            PreparedBars::Ready(bars) => {
                // 재적재는 기존 분류(asset_type/country)를 건드리지 않으므로
                // 분류 조회를 생략한다
                let profile = TickerProfile::default();
                match TickerMetadata::from_bars(symbol, &bars, &profile) {
                    Some(meta) => {
                        all_bars.extend(bars);
                        metadata.push(meta);
                    }
                    None => report.record_failure(*symbol, UpdateCategory::Reload, "empty frame"),
                }
            }
            PreparedBars::Skipped(reason) => {
                warn!(symbol = %symbol, reason, "전체 이력이 정상성 필터로 제외되어 건너뜀");
                report.record_skip(UpdateCategory::Reload);
            }
            PreparedBars::Failed(reason) => {
                report.record_failure(*symbol, UpdateCategory::Reload, reason)
            }
        }
    }

    if metadata.is_empty() {
        return;
    }

    // 데이터가 준비된 심볼만 삭제 대상에 넣는다. 업스트림에서 사라진
    // 심볼의 기존 이력을 지워 버리면 안 된다.
    let with_data: Vec<String> = metadata.iter().map(|m| m.symbol.clone()).collect();

    match prices.replace_history(&with_data, &all_bars, &metadata).await {
        Ok((deleted, inserted)) => {
            report.reload.success += metadata.len();
            report.reload.records += all_bars.len();
            info!(
                tickers = metadata.len(),
                deleted,
                inserted,
                "재적재 청크 저장 완료"
            );
        }
        Err(e) => {
            warn!(error = %e, "재적재 벌크 저장 실패, 심볼 단위로 재시도");
            for meta in &metadata {
                let bars: Vec<PriceBar> = all_bars
                    .iter()
                    .filter(|b| b.symbol == meta.symbol)
                    .cloned()
                    .collect();
                match prices
                    .replace_history(
                        std::slice::from_ref(&meta.symbol),
                        &bars,
                        std::slice::from_ref(meta),
                    )
                    .await
                {
                    Ok(_) => {
                        report.reload.success += 1;
                        report.reload.records += bars.len();
                    }
                    Err(e) => {
                        report.record_failure(&meta.symbol, UpdateCategory::Reload, e.to_string())
                    }
                }
            }
        }
    }
}

/// 증분 심볼을 배치 단위로 UPSERT하고 메타데이터를 재계산합니다.
///
/// 종료 토큰이 취소되면 다음 배치 경계에서 멈춥니다.
async fn upsert_lane(
    db: &Database,
    symbols: &[String],
    lookback_data: &BulkDataset,
    config: &CollectorConfig,
    report: &mut UpdateReport,
    shutdown: &CancellationToken,
) {
    if symbols.is_empty() {
        return;
    }

    let du = &config.daily_update;
    let prices = PriceStore::new(db.pool().clone());
    let tickers = TickerStore::new(db.pool().clone());

    let total_batches = symbols.len().div_ceil(du.upsert_batch_size);
    for (batch_idx, batch) in symbols.chunks(du.upsert_batch_size).enumerate() {
        if shutdown.is_cancelled() {
            warn!(
                remaining_batches = total_batches - batch_idx,
                "종료 신호 수신, 남은 증분 배치를 중단합니다"
            );
            break;
        }
        let mut all_bars: Vec<PriceBar> = Vec::new();
        let mut last_dates: HashMap<String, NaiveDate> = HashMap::new();

        for symbol in batch {
            let Some(frame) = lookback_data.frame(symbol) else {
                // 감지 단계에서 이미 부재로 집계됨
                report.record_skip(UpdateCategory::Upsert);
                continue;
            };
            let Some(last_date) = frame.iter().map(|b| b.date).max() else {
                report.record_skip(UpdateCategory::Upsert);
                continue;
            };
            all_bars.extend_from_slice(frame);
            last_dates.insert(symbol.clone(), last_date);
        }

        if all_bars.is_empty() {
            debug!(batch = batch_idx + 1, "증분 배치에 저장할 데이터 없음");
            continue;
        }

        match prices.upsert_bars(&all_bars).await {
            Ok(affected) => {
                report.upsert.records += affected as usize;
            }
            Err(e) => {
                warn!(batch = batch_idx + 1, error = %e, "증분 벌크 저장 실패, 심볼 단위로 재시도");
                let mut recovered: HashMap<String, NaiveDate> = HashMap::new();
                for (symbol, last_date) in &last_dates {
                    let bars: Vec<PriceBar> = all_bars
                        .iter()
                        .filter(|b| &b.symbol == symbol)
                        .cloned()
                        .collect();
                    match prices.upsert_bars(&bars).await {
                        Ok(affected) => {
                            report.upsert.records += affected as usize;
                            recovered.insert(symbol.clone(), *last_date);
                        }
                        Err(e) => report.record_failure(
                            symbol,
                            UpdateCategory::Upsert,
                            e.to_string(),
                        ),
                    }
                }
                last_dates = recovered;
            }
        }

        // 배치 저장 후 메타데이터 재계산 (record_count는 저장소 기준)
        for (symbol, last_date) in &last_dates {
            match tickers.refresh_after_upsert(symbol, *last_date).await {
                Ok(()) => report.upsert.success += 1,
                Err(e) => report.record_failure(symbol, UpdateCategory::Upsert, e.to_string()),
            }
        }

        info!(
            batch = batch_idx + 1,
            total_batches,
            symbols = last_dates.len(),
            "증분 배치 저장 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn bar(d: u32, close: Decimal) -> PriceBar {
        PriceBar::new("TEST", date(d), close, close, close, close, 1_000)
    }

    #[test]
    fn test_clean_history_keeps_all_when_sane() {
        let bars = vec![bar(3, dec!(100)), bar(4, dec!(101)), bar(5, dec!(102))];
        let cleaned = clean_history_suffix(&bars, price_magnitude_limit());
        assert_eq!(cleaned.len(), 3);
        // 날짜 오름차순으로 반환
        assert_eq!(cleaned[0].date, date(3));
        assert_eq!(cleaned[2].date, date(5));
    }

    #[test]
    fn test_clean_history_drops_corrupt_date_and_older() {
        let bars = vec![
            bar(3, dec!(100)),
            bar(4, dec!(2_000_000_000_000)), // 손상 행
            bar(5, dec!(102)),
            bar(6, dec!(103)),
        ];
        let cleaned = clean_history_suffix(&bars, price_magnitude_limit());
        // 손상 날짜(4일)와 그 이전(3일)이 모두 제거됨
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].date, date(5));
        assert_eq!(cleaned[1].date, date(6));
    }

    #[test]
    fn test_clean_history_all_corrupt_yields_empty() {
        let bars = vec![bar(3, dec!(2_000_000_000_000)), bar(4, dec!(3_000_000_000_000))];
        assert!(clean_history_suffix(&bars, price_magnitude_limit()).is_empty());
    }

    #[test]
    fn test_clean_history_corrupt_on_newest_date_drops_everything() {
        let bars = vec![bar(3, dec!(100)), bar(4, dec!(2_000_000_000_000))];
        assert!(clean_history_suffix(&bars, price_magnitude_limit()).is_empty());
    }

    #[test]
    fn test_magnitude_limit_is_one_trillion() {
        assert_eq!(price_magnitude_limit(), dec!(1_000_000_000_000));
    }

    fn dataset_of(symbol: &str, bars: Vec<PriceBar>) -> BulkDataset {
        let mut frames = HashMap::new();
        frames.insert(symbol.to_string(), bars);
        BulkDataset::Multi(frames)
    }

    #[test]
    fn test_all_corrupt_history_is_skip_not_failure() {
        let dataset = dataset_of(
            "TEST",
            vec![bar(3, dec!(2_000_000_000_000)), bar(4, dec!(3_000_000_000_000))],
        );

        let mut report = UpdateReport::new();
        match prepare_bars(&dataset, "TEST") {
            PreparedBars::Skipped(_) => report.record_skip(UpdateCategory::New),
            PreparedBars::Ready(_) | PreparedBars::Failed(_) => {
                panic!("전 구간 손상 심볼은 건너뜀이어야 함")
            }
        }

        // 건너뜀만 집계되고 실패/재시도 목록에는 남지 않는다
        assert_eq!(report.new.skipped, 1);
        assert_eq!(report.new.failed, 0);
        assert!(report.retry_lines().is_empty());
    }

    #[test]
    fn test_prepare_bars_absent_and_empty_are_failures() {
        let dataset = dataset_of("EMPTY", Vec::new());

        assert!(matches!(
            prepare_bars(&dataset, "GONE"),
            PreparedBars::Failed("no upstream data")
        ));
        assert!(matches!(
            prepare_bars(&dataset, "EMPTY"),
            PreparedBars::Failed("empty frame")
        ));
    }

    #[test]
    fn test_prepare_bars_keeps_clean_suffix() {
        let dataset = dataset_of(
            "TEST",
            vec![bar(3, dec!(2_000_000_000_000)), bar(4, dec!(101)), bar(5, dec!(102))],
        );

        match prepare_bars(&dataset, "TEST") {
            PreparedBars::Ready(bars) => {
                assert_eq!(bars.len(), 2);
                assert_eq!(bars[0].date, date(4));
            }
            _ => panic!("부분 손상 이력은 깨끗한 구간을 돌려줘야 함"),
        }
    }

    struct UnreachableProvider;

    #[async_trait::async_trait]
    impl MarketDataProvider for UnreachableProvider {
        async fn fetch(
            &self,
            _symbols: &[String],
            _period: FetchPeriod,
        ) -> screener_data::Result<BulkDataset> {
            panic!("취소된 실행에서 호출되면 안 됨")
        }

        async fn fetch_profile(&self, _symbol: &str) -> screener_data::Result<TickerProfile> {
            panic!("취소된 실행에서 호출되면 안 됨")
        }
    }

    #[tokio::test]
    async fn test_daily_update_stops_on_pre_cancelled_token() {
        use crate::config::{DailyUpdateConfig, DetectorFailurePolicy, IndicatorConfig};

        let config = CollectorConfig {
            database_url: "postgres://unused".to_string(),
            daily_update: DailyUpdateConfig {
                chunk_size: 200,
                chunk_delay_ms: 0,
                lookback_days: 5,
                upsert_batch_size: 500,
                price_tolerance: Decimal::new(1, 3),
                detector_failure_policy: DetectorFailurePolicy::AssumeUnchanged,
                symbol_limit: None,
            },
            indicators: IndicatorConfig { batch_size: 500 },
        };
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        // 취소된 토큰이면 외부 조회나 풀 연결 없이 즉시 중단한다
        let result = daily_update(&UnreachableProvider, &config, &shutdown).await;
        assert!(matches!(result, Err(CollectorError::Interrupted)));
    }
}
