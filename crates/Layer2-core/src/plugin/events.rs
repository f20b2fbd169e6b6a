//! Plugin Events - 라이프사이클/매니저 이벤트 타입

use super::message::PluginMessage;
use super::state::PluginState;
use serde::{Deserialize, Serialize};

// ============================================================================
// PluginEvent - 플러그인 단위 이벤트
// ============================================================================

/// 라이프사이클 컨트롤러가 발행하는 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginEvent {
    /// 상태 전이
    StateChanged {
        plugin_id: String,
        old: PluginState,
        new: PluginState,
    },

    /// 메시지 처리 완료
    MessageReceived {
        plugin_id: String,
        message: PluginMessage,
    },

    /// 훅 실패
    ErrorOccurred { plugin_id: String, error: String },
}

impl PluginEvent {
    /// 이벤트를 발생시킨 플러그인 ID
    pub fn plugin_id(&self) -> &str {
        match self {
            Self::StateChanged { plugin_id, .. }
            | Self::MessageReceived { plugin_id, .. }
            | Self::ErrorOccurred { plugin_id, .. } => plugin_id,
        }
    }
}

// ============================================================================
// ManagerEvent - 매니저 단위 이벤트
// ============================================================================

/// 플러그인 매니저가 발행하는 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManagerEvent {
    /// 플러그인 로드 완료
    PluginLoaded { plugin_id: String, version: String },

    /// 플러그인 언로드 완료
    PluginUnloaded { plugin_id: String },

    /// 로드/활성화/메시지 처리 실패
    ///
    /// 번들 로드 실패처럼 ID를 알 수 없는 경우 `plugin_id`는 번들 경로입니다.
    PluginError { plugin_id: String, error: String },

    /// 선언된 의존성이 모두 확인됨
    DependencyResolved {
        plugin_id: String,
        dependencies: Vec<String>,
    },

    /// 플러그인 이벤트 전달 (`{"type": "plugin", "event": {...}}`)
    Plugin { event: PluginEvent },
}

impl ManagerEvent {
    pub fn plugin_id(&self) -> &str {
        match self {
            Self::PluginLoaded { plugin_id, .. }
            | Self::PluginUnloaded { plugin_id }
            | Self::PluginError { plugin_id, .. }
            | Self::DependencyResolved { plugin_id, .. } => plugin_id,
            Self::Plugin { event } => event.plugin_id(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::PluginError { .. }
                | Self::Plugin {
                    event: PluginEvent::ErrorOccurred { .. }
                }
        )
    }
}
