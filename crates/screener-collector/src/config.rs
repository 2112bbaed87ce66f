//! 환경변수 기반 설정 모듈.

use crate::Result;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 일일 갱신 설정
    pub daily_update: DailyUpdateConfig,
    /// 지표 계산 설정
    pub indicators: IndicatorConfig,
}

/// 일일 갱신 설정
#[derive(Debug, Clone)]
pub struct DailyUpdateConfig {
    /// 전체 이력 다운로드 청크당 심볼 수
    pub chunk_size: usize,
    /// 청크 간 딜레이 (밀리초)
    pub chunk_delay_ms: u64,
    /// 증분 갱신 조회 구간 (거래일)
    pub lookback_days: u32,
    /// 증분 갱신 배치당 심볼 수
    pub upsert_batch_size: usize,
    /// 기업 행위 판정 가격 허용 오차
    pub price_tolerance: Decimal,
    /// 감지 단계 실패 시 처리 방침
    pub detector_failure_policy: DetectorFailurePolicy,
    /// 처리할 심볼 수 상한 (테스트용)
    pub symbol_limit: Option<usize>,
}

/// 지표 계산 설정
#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    /// 배치당 심볼 수
    pub batch_size: usize,
}

/// 기업 행위 감지 단계가 실패했을 때의 처리 방침.
///
/// 감지 실패는 "변화 없음"과 구분이 불가능하므로 운영자가 선택합니다.
/// 기본값은 기존 이력을 보존하는 쪽입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorFailurePolicy {
    /// 기존 심볼 전부를 증분 갱신으로 처리 (기본)
    #[default]
    AssumeUnchanged,
    /// 기존 심볼 전부를 전체 재적재로 처리
    ReloadAll,
}

impl FromStr for DetectorFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "assume_unchanged" => Ok(Self::AssumeUnchanged),
            "reload_all" => Ok(Self::ReloadAll),
            other => Err(format!("unknown detector failure policy: {}", other)),
        }
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            crate::error::CollectorError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        Ok(Self {
            database_url,
            daily_update: DailyUpdateConfig {
                chunk_size: env_var_parse("DAILY_UPDATE_CHUNK_SIZE", 200),
                chunk_delay_ms: env_var_parse("DAILY_UPDATE_CHUNK_DELAY_MS", 2000),
                lookback_days: env_var_parse("DAILY_UPDATE_LOOKBACK_DAYS", 5),
                upsert_batch_size: env_var_parse("DAILY_UPDATE_UPSERT_BATCH_SIZE", 500),
                price_tolerance: env_var_parse("DAILY_UPDATE_PRICE_TOLERANCE", Decimal::new(1, 3)),
                detector_failure_policy: env_var_parse(
                    "DAILY_UPDATE_DETECTOR_FAILURE_POLICY",
                    DetectorFailurePolicy::AssumeUnchanged,
                ),
                symbol_limit: std::env::var("DAILY_UPDATE_SYMBOL_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
            indicators: IndicatorConfig {
                batch_size: env_var_parse("INDICATOR_BATCH_SIZE", 500),
            },
        })
    }
}

impl DailyUpdateConfig {
    /// 청크 간 딜레이를 Duration으로 반환
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!(
            "assume_unchanged".parse::<DetectorFailurePolicy>().unwrap(),
            DetectorFailurePolicy::AssumeUnchanged
        );
        assert_eq!(
            "reload_all".parse::<DetectorFailurePolicy>().unwrap(),
            DetectorFailurePolicy::ReloadAll
        );
        assert!("everything".parse::<DetectorFailurePolicy>().is_err());
    }
}
