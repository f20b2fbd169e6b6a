//! Plugin traits - 핵심 플러그인 인터페이스

use super::context::IsolationContext;
use super::events::PluginEvent;
use super::message::PluginMessage;
use super::metadata::PluginMetadata;
use super::state::PluginState;
use crate::command::Command;
use async_trait::async_trait;
use kiln_foundation::{EventSubscription, Result};
use serde_json::Value;
use std::sync::Arc;

// ============================================================================
// Plugin Trait - 매니저가 다루는 플러그인 계약
// ============================================================================

/// 플러그인 트레이트
///
/// 직접 구현하기보다는 [`PluginHooks`]를 구현하고
/// [`LifecycleController`](super::LifecycleController)로 감싸는 것을 권장합니다.
/// 컨트롤러가 상태 전이 규칙과 이벤트 발행을 보장합니다.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// 플러그인 메타데이터
    fn metadata(&self) -> &PluginMetadata;

    /// 플러그인 ID
    fn id(&self) -> &str {
        &self.metadata().id
    }

    /// 현재 상태
    fn state(&self) -> PluginState;

    /// 이벤트 구독 (재생 버퍼 포함)
    fn subscribe(&self) -> EventSubscription<PluginEvent>;

    /// 메시지 타입 처리 가능 여부
    fn can_handle(&self, message_type: &str) -> bool;

    /// 활성화 시 레지스트리에 등록할 명령어
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    /// 매니저가 할당한 격리 컨텍스트 연결
    fn bind_context(&self, _context: Arc<IsolationContext>) {}

    /// 초기화 (Unloaded → Loaded)
    async fn initialize(&self) -> Result<()>;

    /// 활성화 (Loaded → Active)
    async fn activate(&self) -> Result<()>;

    /// 비활성화 (Active → Loaded)
    async fn deactivate(&self) -> Result<()>;

    /// 종료 (→ Unloaded)
    async fn shutdown(&self) -> Result<()>;

    /// 메시지 처리 - 처리하지 않으면 `Ok(None)`
    async fn handle_message(&self, message: &PluginMessage) -> Result<Option<Value>>;
}

// ============================================================================
// PluginHooks - 플러그인별 동작
// ============================================================================

/// 플러그인 고유 동작 훅
///
/// 훅은 에러를 반환하거나 패닉해도 됩니다. 컨트롤러가 잡아서
/// `Failed` 상태와 `ErrorOccurred` 이벤트로 변환합니다.
#[async_trait]
pub trait PluginHooks: Send + Sync + 'static {
    /// 메타데이터 (컨트롤러 생성 시 한 번 호출)
    fn metadata(&self) -> PluginMetadata;

    /// 메시지 타입 처리 가능 여부 (기본: 기능 태그에 포함되어 있는지)
    fn can_handle(&self, metadata: &PluginMetadata, message_type: &str) -> bool {
        metadata.has_capability(message_type)
    }

    /// 노출할 명령어
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    async fn on_initialize(&self, ctx: &IsolationContext) -> Result<()>;

    async fn on_activate(&self, _ctx: &IsolationContext) -> Result<()> {
        Ok(())
    }

    async fn on_deactivate(&self, _ctx: &IsolationContext) -> Result<()> {
        Ok(())
    }

    async fn on_shutdown(&self, _ctx: &IsolationContext) -> Result<()> {
        Ok(())
    }

    /// 메시지 처리 훅
    async fn on_message(&self, _message: &PluginMessage, _ctx: &IsolationContext) -> Result<Option<Value>> {
        Ok(None)
    }
}
