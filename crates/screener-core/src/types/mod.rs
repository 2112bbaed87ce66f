//! 도메인 타입 모듈.

pub mod category;
pub mod indicator;
pub mod price;
pub mod ticker;

pub use category::UpdateCategory;
pub use indicator::IndicatorSnapshot;
pub use price::PriceBar;
pub use ticker::{country_to_iso3, TickerMetadata, TickerProfile};

/// 심볼 문자열을 표준 형식으로 변환합니다 (공백 제거 + 대문자).
pub fn canonicalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_symbol() {
        assert_eq!(canonicalize_symbol(" aapl "), "AAPL");
        assert_eq!(canonicalize_symbol("BRK-B"), "BRK-B");
    }
}
