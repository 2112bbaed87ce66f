//! 실행 보고 메시지 포맷.

use chrono::Local;

/// 개별 작업 실행 결과.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// 작업 이름
    pub name: String,
    /// 성공 여부
    pub success: bool,
    /// 소요 시간 (초)
    pub duration_seconds: f64,
    /// 실패 시 에러 메시지
    pub error: Option<String>,
}

impl JobResult {
    /// 성공한 작업 결과를 생성합니다.
    pub fn success(name: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            name: name.into(),
            success: true,
            duration_seconds,
            error: None,
        }
    }

    /// 실패한 작업 결과를 생성합니다.
    pub fn failure(
        name: impl Into<String>,
        duration_seconds: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            success: false,
            duration_seconds,
            error: Some(error.into()),
        }
    }
}

/// 작업 결과 목록을 텔레그램 메시지(HTML)로 포맷합니다.
pub fn format_job_report(results: &[JobResult], total_duration_seconds: f64) -> String {
    let overall_success = results.iter().all(|r| r.success);
    let (emoji, status) = if overall_success {
        ("✅", "SUCCESS")
    } else {
        ("❌", "FAILED")
    };

    let mut message = format!("{} <b>Screener Daily Job - {}</b>\n\n", emoji, status);

    for result in results {
        let job_emoji = if result.success { "✅" } else { "❌" };
        message.push_str(&format!("{} <b>{}</b>\n", job_emoji, result.name));
        message.push_str(&format!("   Duration: {:.1}s\n", result.duration_seconds));
        if let Some(error) = &result.error {
            message.push_str(&format!("   Error: {}\n", error));
        }
    }

    message.push_str(&format!(
        "\n<b>Total Duration:</b> {:.1}s\n",
        total_duration_seconds
    ));
    message.push_str(&format!(
        "<b>Time:</b> {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_all_success() {
        let results = vec![
            JobResult::success("daily-update", 120.0),
            JobResult::success("calc-indicators", 45.5),
        ];
        let message = format_job_report(&results, 165.5);

        assert!(message.contains("SUCCESS"));
        assert!(message.contains("daily-update"));
        assert!(message.contains("45.5s"));
        assert!(!message.contains("Error:"));
    }

    #[test]
    fn test_format_with_failure() {
        let results = vec![
            JobResult::success("daily-update", 120.0),
            JobResult::failure("calc-indicators", 3.0, "connection refused"),
        ];
        let message = format_job_report(&results, 123.0);

        assert!(message.contains("FAILED"));
        assert!(message.contains("Error: connection refused"));
    }
}
