//! 시장 데이터 제공자 추상화.
//!
//! 파이프라인 코어는 이 모듈의 trait만 의존합니다. 요청 청크 분할과
//! 속도 제한은 제공자 구현의 책임이며, 청크 하나가 실패하면 해당
//! 심볼들이 결과에서 빠질 뿐 전체 조회가 실패하지 않습니다.

pub mod bulk;
pub mod universe;
pub mod yahoo;

use crate::Result;
use async_trait::async_trait;
use bulk::BulkDataset;
use screener_core::TickerProfile;

/// 조회 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPeriod {
    /// 상장 이후 전체 이력
    FullHistory,
    /// 최근 N 거래일 구간
    Lookback(u32),
}

impl FetchPeriod {
    /// 기본 단기 구간 (5 거래일).
    pub const DEFAULT_LOOKBACK: u32 = 5;
}

/// 외부 시장 데이터 제공자 인터페이스.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 심볼 목록에 대한 일봉 데이터를 벌크로 조회합니다.
    ///
    /// 반환된 데이터셋에서 심볼이 빠져 있으면 "업스트림에 데이터 없음"을
    /// 의미하며, 빈 프레임과 구분됩니다.
    async fn fetch(&self, symbols: &[String], period: FetchPeriod) -> Result<BulkDataset>;

    /// 자산 분류 정보를 조회합니다.
    ///
    /// 실패는 호출자가 기본값(EQUITY/USA)으로 대체할 수 있도록 오류로
    /// 전달됩니다.
    async fn fetch_profile(&self, symbol: &str) -> Result<TickerProfile>;
}
