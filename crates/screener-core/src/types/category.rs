//! 업데이트 분류 타입.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 일일 업데이트에서 심볼이 배정되는 처리 경로.
///
/// 실행마다 새로 계산되며 저장되지 않습니다. 세 경로는 서로 배타적입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCategory {
    /// 저장소에 없는 신규 심볼 (전체 이력 INSERT)
    New,
    /// 기업 행위가 감지된 심볼 (전체 이력 DELETE + INSERT)
    Reload,
    /// 변동 없는 기존 심볼 (단기 구간 UPSERT)
    Upsert,
}

impl UpdateCategory {
    /// 문자열로 변환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reload => "reload",
            Self::Upsert => "upsert",
        }
    }
}

impl fmt::Display for UpdateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
