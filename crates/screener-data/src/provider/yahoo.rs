//! Yahoo Finance 기반 시장 데이터 제공자.
//!
//! 심볼 목록을 고정 크기 청크로 나누어 순차 조회하고, 청크 사이에
//! 지연을 두어 속도 제한을 회피합니다. 개별 심볼 조회 실패는 경고
//! 로그 후 결과에서 제외될 뿐 전체 조회를 중단시키지 않습니다.

use crate::error::{DataError, Result};
use crate::provider::bulk::BulkDataset;
use crate::provider::{FetchPeriod, MarketDataProvider};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use screener_core::{canonicalize_symbol, PriceBar, TickerProfile};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// 청크당 기본 심볼 수.
const DEFAULT_CHUNK_SIZE: usize = 200;
/// 청크 간 기본 지연 (밀리초).
const DEFAULT_CHUNK_DELAY_MS: u64 = 2000;

/// Yahoo Finance 제공자.
pub struct YahooProvider {
    connector: yahoo_finance_api::YahooConnector,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl YahooProvider {
    /// 새 제공자를 생성합니다.
    pub fn new() -> Result<Self> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| DataError::ConnectionError(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self {
            connector,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: Duration::from_millis(DEFAULT_CHUNK_DELAY_MS),
        })
    }

    /// 청크 크기 설정.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// 청크 간 지연 설정.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// 단일 심볼의 일봉 조회.
    async fn fetch_symbol_bars(&self, symbol: &str, range: &str) -> Result<Vec<PriceBar>> {
        let response = self
            .connector
            .get_quote_range(symbol, "1d", range)
            .await
            .map_err(|e| {
                DataError::FetchError(format!("Yahoo Finance API 오류 ({}): {}", symbol, e))
            })?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::ParseError(format!("Quote 파싱 오류 ({}): {}", symbol, e)))?;

        let mut bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(|q| {
                let date = Utc
                    .timestamp_opt(q.timestamp as i64, 0)
                    .single()?
                    .date_naive();
                // 시가/종가가 유효하지 않은 행은 버린다
                let open = Decimal::from_f64(q.open)?;
                let close = Decimal::from_f64(q.close)?;
                let high = Decimal::from_f64(q.high).unwrap_or(close);
                let low = Decimal::from_f64(q.low).unwrap_or(close);

                Some(PriceBar::new(
                    symbol,
                    date,
                    open,
                    high,
                    low,
                    close,
                    q.volume as i64,
                ))
            })
            .collect();

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl FetchPeriod {
    /// Yahoo Finance range 문자열로 변환.
    fn to_range(self) -> String {
        match self {
            FetchPeriod::FullHistory => "max".to_string(),
            FetchPeriod::Lookback(days) => format!("{}d", days),
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch(&self, symbols: &[String], period: FetchPeriod) -> Result<BulkDataset> {
        if symbols.is_empty() {
            return Ok(BulkDataset::empty());
        }

        let range = period.to_range();
        let total_chunks = symbols.len().div_ceil(self.chunk_size);
        let mut frames: HashMap<String, Vec<PriceBar>> = HashMap::new();

        for (chunk_idx, chunk) in symbols.chunks(self.chunk_size).enumerate() {
            debug!(
                chunk = chunk_idx + 1,
                total_chunks,
                symbols = chunk.len(),
                range = %range,
                "청크 다운로드 시작"
            );

            for symbol in chunk {
                let symbol = canonicalize_symbol(symbol);
                match self.fetch_symbol_bars(&symbol, &range).await {
                    Ok(bars) => {
                        frames.insert(symbol, bars);
                    }
                    Err(e) => {
                        // 실패한 심볼은 결과에서 빠진다 (호출부가 부재로 인식)
                        warn!(symbol = %symbol, error = %e, "심볼 조회 실패, 건너뜀");
                    }
                }
            }

            if chunk_idx + 1 < total_chunks {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }

        Ok(BulkDataset::from_frames(frames, symbols.len()))
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<TickerProfile> {
        let result = self.connector.search_ticker(symbol).await.map_err(|e| {
            DataError::FetchError(format!("Yahoo Finance 검색 실패 ({}): {}", symbol, e))
        })?;

        let item = result
            .quotes
            .iter()
            .find(|q| q.symbol == symbol)
            .ok_or_else(|| DataError::NotFound(format!("검색 결과에 심볼 없음: {}", symbol)))?;

        Ok(TickerProfile {
            asset_type: item.quote_type.to_uppercase(),
            // 검색 응답에는 국가 정보가 없어 기본값을 유지한다
            country: TickerProfile::default().country,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_to_range() {
        assert_eq!(FetchPeriod::FullHistory.to_range(), "max");
        assert_eq!(FetchPeriod::Lookback(5).to_range(), "5d");
    }
}
