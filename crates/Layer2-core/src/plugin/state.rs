//! Plugin State - 플러그인 라이프사이클 상태

use serde::{Deserialize, Serialize};

/// 플러그인 상태
///
/// ```text
/// Unloaded ──▶ Loading ──▶ Loaded ◀──▶ Active
///    ▲             │          │          │
///    │             ▼          ▼          ▼
///    │           Failed ◀─────┴──────────┘
///    │
///    └──shutdown── Loaded / Active
///
/// Failed ──shutdown──▶ Failed   (훅은 실행, 상태 유지)
/// ```
///
/// `Failed`는 인스턴스 기준 종착 상태입니다. `shutdown()`도 상태를 바꾸지 않으므로
/// 복구하려면 언로드 후 새 인스턴스로 다시 로드해야 합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PluginState {
    /// 로드되지 않음 (초기 상태)
    Unloaded,

    /// 초기화 진행 중
    Loading,

    /// 초기화 완료, 아직 활성화 안됨
    Loaded,

    /// 활성화됨 (메시지 처리 가능)
    Active,

    /// 훅 실패
    Failed {
        reason: String,
        cause: Option<String>,
    },
}

impl PluginState {
    pub fn failed(reason: impl Into<String>, cause: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            cause,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// 상태 이름 (페이로드 제외)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Active => "active",
            Self::Failed { .. } => "failed",
        }
    }
}

impl Default for PluginState {
    fn default() -> Self {
        Self::Unloaded
    }
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { reason, .. } => write!(f, "failed ({})", reason),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(PluginState::Active.to_string(), "active");
        assert_eq!(
            PluginState::failed("activate hook failed", None).to_string(),
            "failed (activate hook failed)"
        );
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_value(PluginState::failed("boom", Some("io".into()))).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "boom");
        assert_eq!(json["cause"], "io");
    }
}
