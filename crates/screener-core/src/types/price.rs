//! 일봉 가격 데이터 타입.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 심볼의 하루치 OHLCV 관측값.
///
/// `(symbol, date)` 쌍이 자연 키이며, 저장소의 고유 제약과 일치합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// 심볼 (대문자)
    pub symbol: String,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가 (수정 종가)
    pub close: Decimal,
    /// 거래량
    pub volume: i64,
}

impl PriceBar {
    /// 새 가격 바를 생성합니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// OHLC 중 하나라도 절대값이 `limit` 이상이면 true.
    ///
    /// 업스트림 데이터 오염(10^12 이상의 가격)을 걸러내는 데 사용합니다.
    pub fn exceeds_magnitude(&self, limit: Decimal) -> bool {
        self.open.abs() >= limit
            || self.high.abs() >= limit
            || self.low.abs() >= limit
            || self.close.abs() >= limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(close: Decimal) -> PriceBar {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceBar::new("TEST", date, close, close, close, close, 1000)
    }

    #[test]
    fn test_exceeds_magnitude() {
        let limit = dec!(1_000_000_000_000);
        assert!(!bar(dec!(150.25)).exceeds_magnitude(limit));
        assert!(bar(dec!(1_000_000_000_000)).exceeds_magnitude(limit));
        assert!(bar(dec!(-1_000_000_000_001)).exceeds_magnitude(limit));
    }
}
