//! 심볼 메타데이터 타입.

use crate::types::price::PriceBar;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 심볼별 파생 메타데이터.
///
/// 항상 해당 심볼의 가격 바 집합에서 유도되며, 독자적인 진실 소스가 아닙니다.
/// 성공적인 갱신 이후에는 `first_date = min(date)`, `last_date = max(date)`,
/// `record_count = count(*)`가 유지됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMetadata {
    /// 심볼
    pub symbol: String,
    /// 자산 유형 (예: EQUITY, ETF)
    pub asset_type: String,
    /// 국가 코드 (ISO-3)
    pub country: String,
    /// 최초 거래일
    pub first_date: NaiveDate,
    /// 최종 거래일
    pub last_date: NaiveDate,
    /// 가격 바 수
    pub record_count: i64,
    /// 마지막 갱신 시각
    pub last_updated: DateTime<Utc>,
}

impl TickerMetadata {
    /// 가격 바 집합에서 메타데이터를 유도합니다.
    ///
    /// 빈 집합이면 `None`을 반환합니다.
    pub fn from_bars(symbol: &str, bars: &[PriceBar], profile: &TickerProfile) -> Option<Self> {
        let first_date = bars.iter().map(|b| b.date).min()?;
        let last_date = bars.iter().map(|b| b.date).max()?;

        Some(Self {
            symbol: symbol.to_string(),
            asset_type: profile.asset_type.clone(),
            country: profile.country.clone(),
            first_date,
            last_date,
            record_count: bars.len() as i64,
            last_updated: Utc::now(),
        })
    }
}

/// 자산 분류 정보 (외부 조회 결과).
///
/// 분류 조회가 실패하면 기본값(EQUITY/USA)으로 대체되며, 심볼 처리 자체는
/// 실패로 간주하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerProfile {
    /// 자산 유형
    pub asset_type: String,
    /// 국가 코드 (ISO-3)
    pub country: String,
}

impl Default for TickerProfile {
    fn default() -> Self {
        Self {
            asset_type: "EQUITY".to_string(),
            country: "USA".to_string(),
        }
    }
}

/// 국가 이름을 ISO-3 코드로 변환합니다.
///
/// 매핑에 없는 이름은 이미 3글자 코드면 그대로 사용하고, 아니면 USA로
/// 대체합니다.
pub fn country_to_iso3(name: &str) -> String {
    let code = match name {
        "United States" => "USA",
        "Canada" => "CAN",
        "United Kingdom" => "GBR",
        "Germany" => "DEU",
        "France" => "FRA",
        "Japan" => "JPN",
        "China" => "CHN",
        "India" => "IND",
        "Australia" => "AUS",
        "Brazil" => "BRA",
        "Mexico" => "MEX",
        "South Korea" => "KOR",
        "Spain" => "ESP",
        "Italy" => "ITA",
        "Netherlands" => "NLD",
        "Switzerland" => "CHE",
        "Sweden" => "SWE",
        "Belgium" => "BEL",
        "Ireland" => "IRL",
        "Israel" => "ISR",
        other if other.len() == 3 => other,
        _ => "USA",
    };
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_country_to_iso3() {
        assert_eq!(country_to_iso3("United States"), "USA");
        assert_eq!(country_to_iso3("South Korea"), "KOR");
        assert_eq!(country_to_iso3("DNK"), "DNK");
        assert_eq!(country_to_iso3("Atlantis"), "USA");
    }

    #[test]
    fn test_from_bars_derives_dates_and_count() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let bars = vec![
            PriceBar::new("AAPL", d2, dec!(1), dec!(1), dec!(1), dec!(1), 10),
            PriceBar::new("AAPL", d1, dec!(1), dec!(1), dec!(1), dec!(1), 10),
        ];

        let meta = TickerMetadata::from_bars("AAPL", &bars, &TickerProfile::default())
            .expect("non-empty bars");
        assert_eq!(meta.first_date, d1);
        assert_eq!(meta.last_date, d2);
        assert_eq!(meta.record_count, 2);
        assert_eq!(meta.asset_type, "EQUITY");
    }

    #[test]
    fn test_from_bars_empty() {
        assert!(TickerMetadata::from_bars("AAPL", &[], &TickerProfile::default()).is_none());
    }
}
