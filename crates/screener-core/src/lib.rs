//! # Screener Core
//!
//! 주식 스크리너의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 수집 파이프라인과 API 서버 전반에서 사용되는 기본 타입을 제공합니다:
//! - 일봉 가격 데이터 구조체
//! - 심볼 메타데이터
//! - 업데이트 분류 (신규 / 전체 재적재 / 증분 갱신)

pub mod types;

pub use types::*;
