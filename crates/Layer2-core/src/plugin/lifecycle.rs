//! Lifecycle Controller - 플러그인 상태 전이 관리
//!
//! 전이 순서와 가드는 컨트롤러가 고정하고, 플러그인별 동작은
//! [`PluginHooks`]의 다섯 훅으로만 주입합니다.
//!
//! ```text
//! initialize:  Unloaded ─▶ Loading ─(on_initialize)─▶ Loaded | Failed
//! activate:    Loaded ─(on_activate)─▶ Active | Failed
//! deactivate:  Active ─(on_deactivate)─▶ Loaded | Failed
//! shutdown:    [Active ─▶ Loaded] ─(on_shutdown)─▶ Unloaded   (Failed 는 유지)
//! ```

use super::context::IsolationContext;
use super::events::PluginEvent;
use super::message::PluginMessage;
use super::metadata::PluginMetadata;
use super::state::PluginState;
use super::traits::{Plugin, PluginHooks};
use crate::command::Command;
use crate::fault;
use async_trait::async_trait;
use kiln_foundation::{Error, EventBus, EventBusConfig, EventSubscription, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// 훅 기반 플러그인 라이프사이클 컨트롤러
pub struct LifecycleController<H: PluginHooks> {
    hooks: H,

    /// 생성 시 캐시한 메타데이터
    metadata: PluginMetadata,

    /// 현재 상태
    state: RwLock<PluginState>,

    /// 초기화 완료 플래그 (shutdown 시 해제)
    initialized: AtomicBool,

    /// 전이 직렬화
    transition_lock: Mutex<()>,

    /// 플러그인 이벤트 버스
    events: EventBus<PluginEvent>,

    /// 격리 컨텍스트 (매니저가 교체 가능)
    context: RwLock<Arc<IsolationContext>>,
}

impl<H: PluginHooks> LifecycleController<H> {
    pub fn new(hooks: H) -> Self {
        Self::with_event_config(hooks, EventBusConfig::default())
    }

    pub fn with_event_config(hooks: H, config: EventBusConfig) -> Self {
        let metadata = hooks.metadata();
        let context = Arc::new(IsolationContext::new(metadata.id.clone()));

        Self {
            hooks,
            metadata,
            state: RwLock::new(PluginState::Unloaded),
            initialized: AtomicBool::new(false),
            transition_lock: Mutex::new(()),
            events: EventBus::with_config(config),
            context: RwLock::new(context),
        }
    }

    /// `Arc<dyn Plugin>`으로 생성
    pub fn into_plugin(self) -> Arc<dyn Plugin> {
        Arc::new(self)
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn events(&self) -> &EventBus<PluginEvent> {
        &self.events
    }

    pub fn context(&self) -> Arc<IsolationContext> {
        self.context.read().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn current_state(&self) -> PluginState {
        self.state.read().clone()
    }

    /// 상태 변경 + StateChanged 발행
    fn transition(&self, new: PluginState) {
        let old = std::mem::replace(&mut *self.state.write(), new.clone());
        debug!(plugin_id = %self.metadata.id, from = %old, to = %new, "Plugin state changed");

        self.events.publish(PluginEvent::StateChanged {
            plugin_id: self.metadata.id.clone(),
            old,
            new,
        });
    }

    /// Failed 전이 + ErrorOccurred 발행
    fn fail(&self, reason: &str, cause: &Error) {
        error!(plugin_id = %self.metadata.id, error = %cause, "{}", reason);
        self.transition(PluginState::failed(reason, Some(cause.to_string())));
        self.report(cause);
    }

    fn report(&self, cause: &Error) {
        self.events.publish(PluginEvent::ErrorOccurred {
            plugin_id: self.metadata.id.clone(),
            error: cause.to_string(),
        });
    }

    fn hook_failure(&self, hook: &str, cause: Error) -> Error {
        Error::execution(
            format!("Plugin {} {} hook failed: {}", self.metadata.id, hook, cause),
            Some(cause),
        )
    }

    /// 전이 잠금을 잡은 상태에서 호출
    async fn deactivate_locked(&self) -> Result<()> {
        if !self.current_state().is_active() {
            return Ok(());
        }

        let ctx = self.context();
        match fault::guarded("deactivate hook", self.hooks.on_deactivate(&ctx)).await {
            Ok(()) => {
                self.transition(PluginState::Loaded);
                info!(plugin_id = %self.metadata.id, "Plugin deactivated");
                Ok(())
            }
            Err(e) => {
                self.fail("deactivate hook failed", &e);
                Err(self.hook_failure("deactivate", e))
            }
        }
    }
}

#[async_trait]
impl<H: PluginHooks> Plugin for LifecycleController<H> {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn state(&self) -> PluginState {
        self.current_state()
    }

    fn subscribe(&self) -> EventSubscription<PluginEvent> {
        self.events.subscribe_with_replay()
    }

    fn can_handle(&self, message_type: &str) -> bool {
        self.hooks.can_handle(&self.metadata, message_type)
    }

    fn commands(&self) -> Vec<Command> {
        self.hooks.commands()
    }

    fn bind_context(&self, context: Arc<IsolationContext>) {
        *self.context.write() = context;
    }

    async fn initialize(&self) -> Result<()> {
        let _guard = self.transition_lock.lock().await;

        if self.is_initialized() {
            return Ok(());
        }

        let current = self.current_state();
        if current != PluginState::Unloaded {
            return Err(Error::invalid_state(&self.metadata.id, "unloaded", current));
        }

        self.transition(PluginState::Loading);

        let ctx = self.context();
        match fault::guarded("initialize hook", self.hooks.on_initialize(&ctx)).await {
            Ok(()) => {
                self.initialized.store(true, Ordering::SeqCst);
                self.transition(PluginState::Loaded);
                info!(plugin_id = %self.metadata.id, version = %self.metadata.version, "Plugin initialized");
                Ok(())
            }
            Err(e) => {
                self.fail("initialize hook failed", &e);
                Err(self.hook_failure("initialize", e))
            }
        }
    }

    async fn activate(&self) -> Result<()> {
        let _guard = self.transition_lock.lock().await;
        let current = self.current_state();

        if !self.is_initialized() {
            return Err(Error::invalid_state(&self.metadata.id, "initialized", current));
        }

        match current {
            PluginState::Active => return Ok(()),
            PluginState::Loaded => {}
            other => return Err(Error::invalid_state(&self.metadata.id, "loaded", other)),
        }

        let ctx = self.context();
        match fault::guarded("activate hook", self.hooks.on_activate(&ctx)).await {
            Ok(()) => {
                self.transition(PluginState::Active);
                info!(plugin_id = %self.metadata.id, "Plugin activated");
                Ok(())
            }
            Err(e) => {
                self.fail("activate hook failed", &e);
                Err(self.hook_failure("activate", e))
            }
        }
    }

    async fn deactivate(&self) -> Result<()> {
        let _guard = self.transition_lock.lock().await;
        self.deactivate_locked().await
    }

    async fn shutdown(&self) -> Result<()> {
        let _guard = self.transition_lock.lock().await;

        if self.current_state() == PluginState::Unloaded && !self.is_initialized() {
            return Ok(());
        }

        if let Err(e) = self.deactivate_locked().await {
            warn!(plugin_id = %self.metadata.id, error = %e, "Deactivation failed during shutdown, continuing");
        }

        let ctx = self.context();
        let outcome = fault::guarded("shutdown hook", self.hooks.on_shutdown(&ctx)).await;
        self.initialized.store(false, Ordering::SeqCst);

        match outcome {
            Ok(()) => {
                if !self.current_state().is_failed() {
                    self.transition(PluginState::Unloaded);
                }
                info!(plugin_id = %self.metadata.id, "Plugin shut down");
                Ok(())
            }
            Err(e) => {
                if self.current_state().is_failed() {
                    error!(plugin_id = %self.metadata.id, error = %e, "shutdown hook failed");
                    self.report(&e);
                } else {
                    self.fail("shutdown hook failed", &e);
                }
                Err(self.hook_failure("shutdown", e))
            }
        }
    }

    async fn handle_message(&self, message: &PluginMessage) -> Result<Option<Value>> {
        let current = self.current_state();
        if !current.is_active() {
            return Err(Error::invalid_state(&self.metadata.id, "active", current));
        }

        if !self.can_handle(&message.message_type) {
            return Ok(None);
        }

        let ctx = self.context();
        match fault::guarded("message hook", self.hooks.on_message(message, &ctx)).await {
            Ok(result) => {
                self.events.publish(PluginEvent::MessageReceived {
                    plugin_id: self.metadata.id.clone(),
                    message: message.clone(),
                });
                Ok(result)
            }
            Err(e) => {
                warn!(plugin_id = %self.metadata.id, message_type = %message.message_type, error = %e, "Message hook failed");
                self.report(&e);
                Err(self.hook_failure("message", e))
            }
        }
    }
}
