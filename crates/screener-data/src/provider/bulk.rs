//! 벌크 조회 결과 데이터셋.
//!
//! 외부 제공자의 응답 구조는 요청 심볼 수에 따라 달라집니다
//! (단일 심볼 응답과 다중 심볼 응답의 모양이 다름). 이 차이를
//! 변형(variant) 뒤로 숨기고, 호출부는 `frame` 하나로만 접근합니다.

use chrono::NaiveDate;
use screener_core::PriceBar;
use std::collections::HashMap;

/// 심볼별로 조회 가능한 벌크 데이터셋.
#[derive(Debug, Clone)]
pub enum BulkDataset {
    /// 단일 심볼 응답
    Single {
        /// 요청한 심볼
        symbol: String,
        /// 해당 심볼의 가격 바 (날짜 오름차순)
        bars: Vec<PriceBar>,
    },
    /// 다중 심볼 응답 (심볼 키)
    Multi(HashMap<String, Vec<PriceBar>>),
}

impl BulkDataset {
    /// 빈 다중 심볼 데이터셋 생성.
    pub fn empty() -> Self {
        Self::Multi(HashMap::new())
    }

    /// 심볼별 프레임 접근.
    ///
    /// * `None` - 업스트림 응답에 해당 심볼 없음
    /// * `Some(&[])` - 심볼은 있으나 데이터가 빈 경우
    pub fn frame(&self, symbol: &str) -> Option<&[PriceBar]> {
        match self {
            Self::Single { symbol: s, bars } => {
                if s == symbol {
                    Some(bars.as_slice())
                } else {
                    None
                }
            }
            Self::Multi(map) => map.get(symbol).map(|bars| bars.as_slice()),
        }
    }

    /// 응답에 포함된 심볼 수.
    pub fn symbol_count(&self) -> usize {
        match self {
            Self::Single { .. } => 1,
            Self::Multi(map) => map.len(),
        }
    }

    /// 응답에 가격 바가 하나도 없으면 true.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single { bars, .. } => bars.is_empty(),
            Self::Multi(map) => map.values().all(|bars| bars.is_empty()),
        }
    }

    /// 데이터셋 전체에서 가장 이른 날짜.
    ///
    /// 기업 행위 감지의 기준 날짜(조회 구간의 첫 거래일)로 사용합니다.
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Single { bars, .. } => bars.iter().map(|b| b.date).min(),
            Self::Multi(map) => map
                .values()
                .flat_map(|bars| bars.iter().map(|b| b.date))
                .min(),
        }
    }

    /// 심볼-프레임 맵으로부터 데이터셋 생성.
    ///
    /// 요청 심볼이 하나뿐이면 단일 심볼 변형으로 만들어 업스트림 응답
    /// 구조를 그대로 반영합니다.
    pub fn from_frames(mut frames: HashMap<String, Vec<PriceBar>>, requested: usize) -> Self {
        if requested == 1 && frames.len() == 1 {
            let (symbol, bars) = frames
                .drain()
                .next()
                .unwrap_or_else(|| (String::new(), Vec::new()));
            Self::Single { symbol, bars }
        } else {
            Self::Multi(frames)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(symbol: &str, y: i32, m: u32, d: u32) -> PriceBar {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        PriceBar::new(symbol, date, dec!(10), dec!(11), dec!(9), dec!(10.5), 100)
    }

    #[test]
    fn test_frame_absent_vs_empty() {
        let mut frames = HashMap::new();
        frames.insert("AAPL".to_string(), vec![bar("AAPL", 2024, 1, 2)]);
        frames.insert("HALT".to_string(), Vec::new());
        let ds = BulkDataset::Multi(frames);

        assert_eq!(ds.frame("AAPL").map(|f| f.len()), Some(1));
        // 응답에는 있으나 데이터가 비어 있음
        assert_eq!(ds.frame("HALT").map(|f| f.len()), Some(0));
        // 응답에 아예 없음
        assert!(ds.frame("MISSING").is_none());
    }

    #[test]
    fn test_single_variant_only_answers_its_symbol() {
        let ds = BulkDataset::Single {
            symbol: "AAPL".to_string(),
            bars: vec![bar("AAPL", 2024, 1, 2)],
        };
        assert!(ds.frame("AAPL").is_some());
        assert!(ds.frame("MSFT").is_none());
    }

    #[test]
    fn test_earliest_date_across_frames() {
        let mut frames = HashMap::new();
        frames.insert(
            "AAPL".to_string(),
            vec![bar("AAPL", 2024, 1, 3), bar("AAPL", 2024, 1, 4)],
        );
        frames.insert("MSFT".to_string(), vec![bar("MSFT", 2024, 1, 2)]);
        let ds = BulkDataset::Multi(frames);

        assert_eq!(ds.earliest_date(), NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn test_from_frames_builds_single_for_one_symbol() {
        let mut frames = HashMap::new();
        frames.insert("AAPL".to_string(), vec![bar("AAPL", 2024, 1, 2)]);
        let ds = BulkDataset::from_frames(frames, 1);
        assert!(matches!(ds, BulkDataset::Single { .. }));
    }
}
