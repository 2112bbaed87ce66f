//! 시장 데이터 접근 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 외부 시장 데이터 제공자 추상화 (벌크 조회, 청크 분할, 속도 제한)
//! - PostgreSQL 기반 시계열 저장소 (가격 / 메타데이터 / 지표)
//! - 심볼 유니버스 다운로드 (NASDAQ Symbol Directory)

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

// 제공자 타입 재내보내기
pub use provider::bulk::BulkDataset;
pub use provider::universe::{parse_symbol_directory, UniverseSource};
pub use provider::yahoo::YahooProvider;
pub use provider::{FetchPeriod, MarketDataProvider};

// 저장소 타입 재내보내기
pub use storage::db::{Database, DatabaseConfig};
pub use storage::indicators::IndicatorStore;
pub use storage::prices::PriceStore;
pub use storage::tickers::TickerStore;
