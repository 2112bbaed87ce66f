//! 갱신 작업 통계 구조체.

use screener_core::UpdateCategory;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 처리 경로(lane)별 통계
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LaneStats {
    /// 성공한 심볼 수
    pub success: usize,
    /// 실패한 심볼 수
    pub failed: usize,
    /// 건너뛴 심볼 수 (캐시된 데이터에 없음 등)
    pub skipped: usize,
    /// 저장된 가격 바 수
    pub records: usize,
}

/// 실패한 심볼 기록 (재시도 파일에 그대로 기록됨)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTicker {
    /// 심볼
    pub symbol: String,
    /// 실패 당시의 처리 경로
    pub category: UpdateCategory,
    /// 실패 사유
    pub reason: String,
}

/// 일일 갱신 실행 보고서
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReport {
    /// 유니버스 전체 심볼 수
    pub universe_size: usize,
    /// 신규 적재 통계
    pub new: LaneStats,
    /// 전체 재적재 통계
    pub reload: LaneStats,
    /// 증분 갱신 통계
    pub upsert: LaneStats,
    /// 업스트림에서 찾지 못한 심볼 수 (실패 아님, 관측용)
    pub not_found: usize,
    /// 실패 심볼 목록 (발생 순서 유지)
    pub failed_tickers: Vec<FailedTicker>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl UpdateReport {
    /// 새 보고서 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 실패를 기록하고 해당 경로의 실패 수를 올립니다.
    pub fn record_failure(
        &mut self,
        symbol: impl Into<String>,
        category: UpdateCategory,
        reason: impl Into<String>,
    ) {
        match category {
            UpdateCategory::New => self.new.failed += 1,
            UpdateCategory::Reload => self.reload.failed += 1,
            UpdateCategory::Upsert => self.upsert.failed += 1,
        }
        self.failed_tickers.push(FailedTicker {
            symbol: symbol.into(),
            category,
            reason: reason.into(),
        });
    }

    /// 건너뜀을 기록합니다. 실패와 달리 재시도 목록에 남지 않습니다.
    pub fn record_skip(&mut self, category: UpdateCategory) {
        match category {
            UpdateCategory::New => self.new.skipped += 1,
            UpdateCategory::Reload => self.reload.skipped += 1,
            UpdateCategory::Upsert => self.upsert.skipped += 1,
        }
    }

    /// 전체 성공 심볼 수
    pub fn total_success(&self) -> usize {
        self.new.success + self.reload.success + self.upsert.success
    }

    /// 전체 실패 심볼 수
    pub fn total_failed(&self) -> usize {
        self.new.failed + self.reload.failed + self.upsert.failed
    }

    /// 저장된 전체 가격 바 수
    pub fn total_records(&self) -> usize {
        self.new.records + self.reload.records + self.upsert.records
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        let processed = self.total_success() + self.total_failed();
        if processed == 0 {
            0.0
        } else {
            (self.total_success() as f64 / processed as f64) * 100.0
        }
    }

    /// 보고서 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            universe = self.universe_size,
            new_success = self.new.success,
            new_failed = self.new.failed,
            new_skipped = self.new.skipped,
            reload_success = self.reload.success,
            reload_failed = self.reload.failed,
            reload_skipped = self.reload.skipped,
            upsert_success = self.upsert.success,
            upsert_failed = self.upsert.failed,
            upsert_skipped = self.upsert.skipped,
            not_found = self.not_found,
            total_records = self.total_records(),
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "일일 갱신 완료"
        );
    }

    /// 재시도 파일 내용 (한 줄에 `심볼,경로,사유`, 발생 순서 유지).
    pub fn retry_lines(&self) -> Vec<String> {
        self.failed_tickers
            .iter()
            .map(|f| format!("{},{},{}", f.symbol, f.category.as_str(), f.reason))
            .collect()
    }

    /// 실패 심볼 목록을 재시도 파일로 기록합니다.
    ///
    /// 실패가 없으면 파일을 만들지 않습니다.
    pub fn write_retry_file(&self, path: &Path) -> std::io::Result<()> {
        if self.failed_tickers.is_empty() {
            return Ok(());
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.retry_lines().join("\n") + "\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_failure_updates_lane_and_order() {
        let mut report = UpdateReport::new();
        report.record_failure("ZZZ", UpdateCategory::Reload, "chunk failed");
        report.record_failure("AAA", UpdateCategory::New, "no upstream data");

        assert_eq!(report.reload.failed, 1);
        assert_eq!(report.new.failed, 1);
        assert_eq!(report.total_failed(), 2);
        // 발생 순서가 유지된다 (알파벳순 아님)
        assert_eq!(
            report.retry_lines(),
            vec![
                "ZZZ,reload,chunk failed".to_string(),
                "AAA,new,no upstream data".to_string(),
            ]
        );
    }

    #[test]
    fn test_success_rate_empty_report() {
        let report = UpdateReport::new();
        assert_eq!(report.success_rate(), 0.0);
    }

    #[test]
    fn test_record_skip_stays_out_of_retry_list() {
        let mut report = UpdateReport::new();
        report.record_skip(UpdateCategory::New);
        report.record_skip(UpdateCategory::Reload);
        report.record_skip(UpdateCategory::Upsert);

        assert_eq!(report.new.skipped, 1);
        assert_eq!(report.reload.skipped, 1);
        assert_eq!(report.upsert.skipped, 1);
        assert_eq!(report.total_failed(), 0);
        assert!(report.retry_lines().is_empty());
    }
}
