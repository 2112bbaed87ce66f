//! 갱신 전략 분류 모듈.
//!
//! 유니버스의 모든 심볼을 세 경로 중 정확히 하나에 배정합니다:
//! - 신규(New): 저장소에 없는 심볼, 전체 이력 INSERT
//! - 재적재(Reload): 기업 행위가 감지된 심볼, 전체 이력 DELETE + INSERT
//! - 증분(Upsert): 변동 없는 기존 심볼, 단기 구간 UPSERT

use crate::config::DailyUpdateConfig;
use crate::modules::corporate_actions::detect_corporate_actions;
use crate::Result;
use screener_data::{BulkDataset, MarketDataProvider, PriceStore, TickerStore};
use std::collections::HashSet;
use tracing::info;

/// 분류 결과.
///
/// 세 목록은 서로 겹치지 않으며, 합집합이 유니버스 전체입니다.
/// 감지 단계에서 내려받은 단기 데이터를 함께 담아 증분 경로가
/// 재사용합니다.
#[derive(Debug)]
pub struct CategorizedSymbols {
    /// 신규 심볼 (유니버스 순서 유지)
    pub new_symbols: Vec<String>,
    /// 재적재 심볼
    pub reload_symbols: Vec<String>,
    /// 증분 갱신 심볼
    pub upsert_symbols: Vec<String>,
    /// 업스트림에서 찾지 못한 기존 심볼 수
    pub not_found: usize,
    /// 감지 단계에서 내려받은 단기 데이터
    pub lookback_data: BulkDataset,
}

/// 유니버스를 신규 / 기존으로 나눕니다 (순서 유지).
fn partition_new(universe: &[String], tracked: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    let mut new_symbols = Vec::new();
    let mut existing = Vec::new();
    for symbol in universe {
        if tracked.contains(symbol) {
            existing.push(symbol.clone());
        } else {
            new_symbols.push(symbol.clone());
        }
    }
    (new_symbols, existing)
}

/// 기존 심볼을 재적재 / 증분으로 나눕니다 (순서 유지).
fn split_by_flagged(existing: Vec<String>, flagged: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    let mut reload = Vec::new();
    let mut upsert = Vec::new();
    for symbol in existing {
        if flagged.contains(&symbol) {
            reload.push(symbol);
        } else {
            upsert.push(symbol);
        }
    }
    (reload, upsert)
}

/// 유니버스 전체를 갱신 전략별로 분류합니다.
pub async fn categorize_symbols(
    provider: &dyn MarketDataProvider,
    prices: &PriceStore,
    tickers: &TickerStore,
    universe: &[String],
    config: &DailyUpdateConfig,
) -> Result<CategorizedSymbols> {
    let tracked = tickers.tracked_symbols().await?;
    let (new_symbols, existing) = partition_new(universe, &tracked);

    info!(
        new = new_symbols.len(),
        existing = existing.len(),
        "신규 / 기존 심볼 분리 완료"
    );

    let detection = detect_corporate_actions(provider, prices, &existing, config).await?;
    let (reload_symbols, upsert_symbols) = split_by_flagged(existing, &detection.flagged);

    info!(
        new = new_symbols.len(),
        reload = reload_symbols.len(),
        upsert = upsert_symbols.len(),
        not_found = detection.not_found,
        "분류 완료"
    );

    Ok(CategorizedSymbols {
        new_symbols,
        reload_symbols,
        upsert_symbols,
        not_found: detection.not_found,
        lookback_data: detection.lookback_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partition_preserves_universe_order() {
        let universe = symbols(&["MSFT", "NEWCO", "AAPL"]);
        let tracked: HashSet<String> = symbols(&["AAPL", "MSFT"]).into_iter().collect();

        let (new_symbols, existing) = partition_new(&universe, &tracked);
        assert_eq!(new_symbols, symbols(&["NEWCO"]));
        assert_eq!(existing, symbols(&["MSFT", "AAPL"]));
    }

    #[test]
    fn test_categories_are_disjoint_and_exhaustive() {
        let universe = symbols(&["A", "B", "C", "D", "E"]);
        let tracked: HashSet<String> = symbols(&["A", "B", "C"]).into_iter().collect();
        let flagged: HashSet<String> = symbols(&["B"]).into_iter().collect();

        let (new_symbols, existing) = partition_new(&universe, &tracked);
        let (reload, upsert) = split_by_flagged(existing, &flagged);

        assert_eq!(new_symbols, symbols(&["D", "E"]));
        assert_eq!(reload, symbols(&["B"]));
        assert_eq!(upsert, symbols(&["A", "C"]));

        // 세 경로는 배타적이고 합집합이 유니버스 전체
        let mut all: Vec<String> = Vec::new();
        all.extend(new_symbols.clone());
        all.extend(reload.clone());
        all.extend(upsert.clone());
        assert_eq!(all.len(), universe.len());
        let unique: HashSet<&String> = all.iter().collect();
        assert_eq!(unique.len(), universe.len());
    }

    #[test]
    fn test_no_flagged_means_no_reload() {
        let existing = symbols(&["A", "B"]);
        let (reload, upsert) = split_by_flagged(existing, &HashSet::new());
        assert!(reload.is_empty());
        assert_eq!(upsert, symbols(&["A", "B"]));
    }
}
