//! 기업 행위 감지 모듈.
//!
//! 액면분할이나 배당 등 기업 행위가 있으면 제공자의 수정 주가 이력
//! 전체가 과거까지 소급 변경됩니다. 이를 직접 조회하는 대신, 추적 중인
//! 전 심볼의 단기 구간을 한 번에 내려받아 구간 첫 거래일의 종가를
//! 저장소의 같은 날짜 종가와 비교합니다. 차이가 허용 오차를 넘으면
//! 전체 이력 재적재 대상으로 표시합니다.
//!
//! 내려받은 단기 데이터는 버리지 않고 반환하여 증분 갱신 경로가
//! 재사용합니다 (같은 데이터를 두 번 받지 않음).

use crate::config::{DailyUpdateConfig, DetectorFailurePolicy};
use crate::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use screener_data::{BulkDataset, FetchPeriod, MarketDataProvider, PriceStore};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// 감지 단계 결과.
#[derive(Debug)]
pub struct DetectionOutcome {
    /// 전체 재적재가 필요한 심볼
    pub flagged: HashSet<String>,
    /// 업스트림 응답에 없던 심볼 수 (관측용)
    pub not_found: usize,
    /// 내려받은 단기 데이터 (증분 갱신 경로에서 재사용)
    pub lookback_data: BulkDataset,
}

impl DetectionOutcome {
    fn empty() -> Self {
        Self {
            flagged: HashSet::new(),
            not_found: 0,
            lookback_data: BulkDataset::empty(),
        }
    }

    fn reload_all(tracked: &[String]) -> Self {
        Self {
            flagged: tracked.iter().cloned().collect(),
            not_found: 0,
            lookback_data: BulkDataset::empty(),
        }
    }
}

/// 저장소 종가와 제공자 종가의 차이가 허용 오차를 넘는지 판정.
fn price_mismatch(db_close: Decimal, provider_close: Decimal, tolerance: Decimal) -> bool {
    (provider_close - db_close).abs() > tolerance
}

/// 기준일 종가를 비교해 재적재 대상과 부재 심볼 수를 계산합니다.
fn compare_against_reference(
    tracked: &[String],
    dataset: &BulkDataset,
    reference: NaiveDate,
    db_closes: &HashMap<String, Decimal>,
    tolerance: Decimal,
) -> (HashSet<String>, usize) {
    let mut flagged = HashSet::new();
    let mut not_found = 0usize;

    for symbol in tracked {
        let Some(frame) = dataset.frame(symbol) else {
            not_found += 1;
            continue;
        };
        // 기준일 거래가 없는 심볼은 비교 불가, 증분 갱신으로 처리
        let Some(bar) = frame.iter().find(|b| b.date == reference) else {
            continue;
        };
        let Some(db_close) = db_closes.get(symbol) else {
            continue;
        };

        if price_mismatch(*db_close, bar.close, tolerance) {
            debug!(
                symbol = %symbol,
                db_close = %db_close,
                provider_close = %bar.close,
                "가격 불일치, 재적재 대상"
            );
            flagged.insert(symbol.clone());
        }
    }

    (flagged, not_found)
}

/// 기업 행위 감지 실행.
///
/// 단기 데이터 조회에 실패하면 설정된 방침에 따라 전부 증분 갱신으로
/// 처리하거나 전부 재적재합니다.
pub async fn detect_corporate_actions(
    provider: &dyn MarketDataProvider,
    prices: &PriceStore,
    tracked: &[String],
    config: &DailyUpdateConfig,
) -> Result<DetectionOutcome> {
    if tracked.is_empty() {
        info!("기존 심볼이 없어 기업 행위 감지를 건너뜁니다");
        return Ok(DetectionOutcome::empty());
    }

    info!(symbols = tracked.len(), lookback_days = config.lookback_days, "단기 구간 다운로드 시작");

    let dataset = match provider
        .fetch(tracked, FetchPeriod::Lookback(config.lookback_days))
        .await
    {
        Ok(dataset) if !dataset.is_empty() => dataset,
        Ok(_) => {
            warn!("단기 데이터가 비어 있음, 감지 불가");
            return Ok(apply_failure_policy(config.detector_failure_policy, tracked));
        }
        Err(e) => {
            warn!(error = %e, "단기 데이터 조회 실패, 감지 불가");
            return Ok(apply_failure_policy(config.detector_failure_policy, tracked));
        }
    };

    // 조회 구간의 첫 거래일을 기준일로 사용
    let Some(reference) = dataset.earliest_date() else {
        return Ok(apply_failure_policy(config.detector_failure_policy, tracked));
    };

    // 기준일의 전 심볼 종가를 단일 쿼리로 조회
    let db_closes = prices.closes_on(reference).await?;
    info!(reference = %reference, db_prices = db_closes.len(), "기준일 종가 조회 완료");

    let (flagged, not_found) = compare_against_reference(
        tracked,
        &dataset,
        reference,
        &db_closes,
        config.price_tolerance,
    );

    info!(flagged = flagged.len(), not_found, "기업 행위 감지 완료");
    Ok(DetectionOutcome {
        flagged,
        not_found,
        lookback_data: dataset,
    })
}

fn apply_failure_policy(policy: DetectorFailurePolicy, tracked: &[String]) -> DetectionOutcome {
    match policy {
        DetectorFailurePolicy::AssumeUnchanged => {
            info!("감지 실패 방침: 전체 증분 갱신으로 처리");
            DetectionOutcome::empty()
        }
        DetectorFailurePolicy::ReloadAll => {
            warn!(symbols = tracked.len(), "감지 실패 방침: 전체 재적재로 처리");
            DetectionOutcome::reload_all(tracked)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use screener_core::PriceBar;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn bar(symbol: &str, d: u32, close: Decimal) -> PriceBar {
        PriceBar::new(symbol, date(d), close, close, close, close, 1_000)
    }

    fn dataset(frames: Vec<(&str, Vec<PriceBar>)>) -> BulkDataset {
        BulkDataset::Multi(
            frames
                .into_iter()
                .map(|(s, bars)| (s.to_string(), bars))
                .collect(),
        )
    }

    #[test]
    fn test_price_mismatch_tolerance() {
        let tol = dec!(0.001);
        assert!(!price_mismatch(dec!(150), dec!(150), tol));
        // 허용 오차 경계값은 불일치가 아님
        assert!(!price_mismatch(dec!(150), dec!(150.001), tol));
        assert!(price_mismatch(dec!(150), dec!(150.002), tol));
        assert!(price_mismatch(dec!(150), dec!(75), tol));
    }

    #[test]
    fn test_unchanged_price_not_flagged() {
        let tracked = vec!["AAPL".to_string()];
        let ds = dataset(vec![("AAPL", vec![bar("AAPL", 3, dec!(150)), bar("AAPL", 4, dec!(151))])]);
        let db_closes = HashMap::from([("AAPL".to_string(), dec!(150))]);

        let (flagged, not_found) =
            compare_against_reference(&tracked, &ds, date(3), &db_closes, dec!(0.001));
        assert!(flagged.is_empty());
        assert_eq!(not_found, 0);
    }

    #[test]
    fn test_halved_price_flagged_for_reload() {
        // 2:1 액면분할: 저장소 150, 수정 주가 75
        let tracked = vec!["AAPL".to_string()];
        let ds = dataset(vec![("AAPL", vec![bar("AAPL", 3, dec!(75))])]);
        let db_closes = HashMap::from([("AAPL".to_string(), dec!(150))]);

        let (flagged, _) =
            compare_against_reference(&tracked, &ds, date(3), &db_closes, dec!(0.001));
        assert!(flagged.contains("AAPL"));
    }

    #[test]
    fn test_absent_symbol_counted_not_flagged() {
        let tracked = vec!["GONE".to_string(), "AAPL".to_string()];
        let ds = dataset(vec![("AAPL", vec![bar("AAPL", 3, dec!(150))])]);
        let db_closes = HashMap::from([("AAPL".to_string(), dec!(150))]);

        let (flagged, not_found) =
            compare_against_reference(&tracked, &ds, date(3), &db_closes, dec!(0.001));
        assert!(flagged.is_empty());
        assert_eq!(not_found, 1);
    }

    #[test]
    fn test_symbol_without_reference_date_skipped() {
        // 기준일 거래 없음 (신규 상장 직후 등)
        let tracked = vec!["AAPL".to_string()];
        let ds = dataset(vec![("AAPL", vec![bar("AAPL", 4, dec!(75))])]);
        let db_closes = HashMap::from([("AAPL".to_string(), dec!(150))]);

        let (flagged, not_found) =
            compare_against_reference(&tracked, &ds, date(3), &db_closes, dec!(0.001));
        assert!(flagged.is_empty());
        assert_eq!(not_found, 0);
    }
}
