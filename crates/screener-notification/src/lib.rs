//! 실행 보고 알림 서비스.
//!
//! 일일 갱신 작업의 결과를 Telegram Bot API로 전송합니다. 환경 변수가
//! 없으면 알림은 조용히 비활성화되며 파이프라인 실행에는 영향을 주지
//! 않습니다.

pub mod report;
pub mod telegram;

pub use report::{format_job_report, JobResult};
pub use telegram::{TelegramConfig, TelegramSender};

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Result 타입 별칭.
pub type NotificationResult<T> = Result<T, NotificationError>;
