//! 심볼 유니버스 다운로드.
//!
//! NASDAQ Symbol Directory(파이프 구분 텍스트)에서 미국 상장 심볼 전체
//! 목록을 내려받아 정제합니다. 테스트 종목과 특수 문자(`$`, `.`)가 포함된
//! 심볼은 제외합니다.

use crate::error::{DataError, Result};
use screener_core::canonicalize_symbol;
use std::collections::BTreeSet;
use tracing::info;

const NASDAQ_LISTED_URL: &str = "https://www.nasdaqtrader.com/dynamic/symdir/nasdaqlisted.txt";
const OTHER_LISTED_URL: &str = "https://www.nasdaqtrader.com/dynamic/symdir/otherlisted.txt";

/// 심볼 디렉터리 텍스트를 파싱합니다.
///
/// 첫 줄은 헤더이며 심볼 컬럼 이름이 파일마다 다릅니다
/// (`Symbol` 또는 `ACT Symbol`). `Test Issue` 컬럼이 `N`인 행만 남깁니다.
pub fn parse_symbol_directory(text: &str) -> Vec<String> {
    let mut lines = text.lines();

    let header = match lines.next() {
        Some(h) => h,
        None => return Vec::new(),
    };
    let columns: Vec<&str> = header.split('|').collect();

    let symbol_idx = columns
        .iter()
        .position(|c| *c == "Symbol" || *c == "ACT Symbol");
    let test_idx = columns.iter().position(|c| *c == "Test Issue");

    let (symbol_idx, test_idx) = match (symbol_idx, test_idx) {
        (Some(s), Some(t)) => (s, t),
        _ => return Vec::new(),
    };

    lines
        .filter_map(|line| {
            // 마지막 줄은 "File Creation Time" 푸터
            if line.starts_with("File Creation Time") || line.trim().is_empty() {
                return None;
            }
            let fields: Vec<&str> = line.split('|').collect();
            let symbol = fields.get(symbol_idx)?.trim();
            let test_issue = fields.get(test_idx)?.trim();

            if test_issue != "N" || symbol.is_empty() {
                return None;
            }
            if symbol.contains('$') || symbol.contains('.') {
                return None;
            }
            Some(canonicalize_symbol(symbol))
        })
        .collect()
}

/// NASDAQ Symbol Directory 기반 유니버스 소스.
pub struct UniverseSource {
    client: reqwest::Client,
}

impl UniverseSource {
    /// 새 유니버스 소스를 생성합니다.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// 전체 미국 상장 심볼 목록을 조회합니다 (정렬, 중복 제거).
    ///
    /// `limit`은 테스트 실행용 심볼 수 제한입니다.
    pub async fn fetch_us_tickers(&self, limit: Option<usize>) -> Result<Vec<String>> {
        let nasdaq = self.download(NASDAQ_LISTED_URL).await?;
        let other = self.download(OTHER_LISTED_URL).await?;

        let mut symbols: BTreeSet<String> = parse_symbol_directory(&nasdaq).into_iter().collect();
        symbols.extend(parse_symbol_directory(&other));

        let mut symbols: Vec<String> = symbols.into_iter().collect();
        if let Some(limit) = limit {
            symbols.truncate(limit);
        }

        info!(count = symbols.len(), "유니버스 심볼 목록 조회 완료");
        Ok(symbols)
    }

    async fn download(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "심볼 디렉터리 다운로드 실패 ({}): HTTP {}",
                url,
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

impl Default for UniverseSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nasdaq_listed() {
        let text = "Symbol|Security Name|Market Category|Test Issue|Financial Status|Round Lot Size|ETF|NextShares\n\
                    AAPL|Apple Inc.|Q|N|N|100|N|N\n\
                    ZTEST|Test Issue|Q|Y|N|100|N|N\n\
                    BAD$X|Weird|Q|N|N|100|N|N\n\
                    File Creation Time: 0101202522:01|||||||\n";
        let symbols = parse_symbol_directory(text);
        assert_eq!(symbols, vec!["AAPL".to_string()]);
    }

    #[test]
    fn test_parse_other_listed_uses_act_symbol() {
        let text = "ACT Symbol|Security Name|Exchange|CQS Symbol|ETF|Round Lot Size|Test Issue|NASDAQ Symbol\n\
                    IBM|International Business Machines|N|IBM|N|100|N|IBM\n\
                    BRK.A|Berkshire Hathaway|N|BRK.A|N|100|N|BRK.A\n";
        let symbols = parse_symbol_directory(text);
        assert_eq!(symbols, vec!["IBM".to_string()]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_symbol_directory("").is_empty());
    }
}
