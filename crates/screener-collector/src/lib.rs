//! Standalone daily update pipeline for the stock screener.
//!
//! 이 crate는 API 서버와 독립적으로 시세를 갱신하는 바이너리를 제공합니다:
//! - 심볼 유니버스 갱신 및 갱신 전략 분류 (신규 / 재적재 / 증분)
//! - 기업 행위 감지 (가격 비교 기반)
//! - 일봉 수집 및 저장 (전체 이력 / 최근 구간)
//! - 기술 지표 계산 (상대강도, 범위 지표)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{CollectorConfig, DetectorFailurePolicy};
pub use error::{CollectorError, Result};
pub use stats::{FailedTicker, LaneStats, UpdateReport};
