//! Plugin Manager - 플러그인 라이프사이클 관리
//!
//! ## 로드 파이프라인
//!
//! ```text
//! bundle ─▶ readable? ─▶ scanner.resolve ─▶ bind context ─▶ dependencies
//!        ─▶ initialize ─▶ register ─▶ PluginLoaded
//! ```
//!
//! 등록이 마지막 단계이므로 도중에 실패하거나 시간 초과된 로드는
//! 레지스트리에 흔적을 남기지 않습니다.

use super::bundle::{discover_bundles, BundleScanner, NullBundleScanner};
use super::context::IsolationContext;
use super::events::{ManagerEvent, PluginEvent};
use super::message::PluginMessage;
use super::metadata::PluginMetadata;
use super::registry::{Forwarder, PluginEntry, PluginRegistry};
use super::state::PluginState;
use super::traits::Plugin;
use crate::command::CommandRegistry;
use crate::fault;
use kiln_foundation::{
    Error, EventBus, EventBusConfig, EventSubscription, PluginManagerConfig, Result, RuntimeConfig,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 플러그인 통계 (조회 시점에 계산)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginStatistics {
    pub total: usize,
    pub active: usize,
    pub loaded: usize,
    pub failed: usize,
    pub loading: usize,
    pub unloaded: usize,
}

/// 번들별 로드 결과
pub struct BundleLoadOutcome {
    pub bundle_path: PathBuf,
    pub result: Result<Arc<dyn Plugin>>,
}

impl BundleLoadOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl std::fmt::Debug for BundleLoadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match &self.result {
            Ok(plugin) => format!("Ok({})", plugin.id()),
            Err(e) => format!("Err({})", e),
        };
        f.debug_struct("BundleLoadOutcome")
            .field("bundle_path", &self.bundle_path)
            .field("result", &result)
            .finish()
    }
}

/// 플러그인 매니저 - 전체 플러그인 시스템 관리
pub struct PluginManager {
    /// 설정 (생성 시 검증)
    config: PluginManagerConfig,

    /// 플러그인 레지스트리
    registry: PluginRegistry,

    /// 번들 스캐너
    scanner: Arc<dyn BundleScanner>,

    /// 활성화 시 명령어를 등록할 레지스트리
    commands: Option<Arc<CommandRegistry>>,

    /// 매니저 이벤트 버스
    events: Arc<EventBus<ManagerEvent>>,

    /// 동시 로드 제한
    load_permits: Arc<Semaphore>,

    /// isolation = false 일 때 공용 컨텍스트
    shared_context: Option<Arc<IsolationContext>>,

    /// 백그라운드 작업 루트 토큰
    root_token: CancellationToken,

    /// 백그라운드 작업 (hot reload 등)
    background: parking_lot::Mutex<Vec<JoinHandle<()>>>,

    /// 종료 여부
    shut_down: AtomicBool,
}

impl PluginManager {
    /// 새 매니저 생성 (설정 검증)
    pub fn new(config: PluginManagerConfig) -> Result<Self> {
        config.validate()?;

        let shared_context = if config.isolation {
            None
        } else {
            Some(Arc::new(IsolationContext::shared()))
        };

        Ok(Self {
            load_permits: Arc::new(Semaphore::new(config.max_concurrent_loads)),
            config,
            registry: PluginRegistry::new(),
            scanner: Arc::new(NullBundleScanner),
            commands: None,
            events: Arc::new(EventBus::new()),
            shared_context,
            root_token: CancellationToken::new(),
            background: parking_lot::Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// 런타임 설정으로 생성 (이벤트 버스 설정 포함)
    pub fn from_runtime_config(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.plugins)?.with_event_config(config.events))
    }

    /// 빌더 패턴: 번들 스캐너 설정
    pub fn with_scanner(mut self, scanner: impl BundleScanner + 'static) -> Self {
        self.scanner = Arc::new(scanner);
        self
    }

    /// 빌더 패턴: 명령어 레지스트리 연결
    pub fn with_command_registry(mut self, commands: Arc<CommandRegistry>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// 빌더 패턴: 이벤트 버스 설정
    pub fn with_event_config(mut self, config: EventBusConfig) -> Self {
        self.events = Arc::new(EventBus::with_config(config));
        self
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(Error::invalid_state("plugin manager", "running", "shut down"));
        }
        Ok(())
    }

    fn report_error(&self, plugin_id: impl Into<String>, error: &Error) {
        self.events.publish(ManagerEvent::PluginError {
            plugin_id: plugin_id.into(),
            error: error.to_string(),
        });
    }

    fn context_for(&self, plugin_id: &str, bundle_path: Option<&Path>) -> Arc<IsolationContext> {
        if let Some(shared) = &self.shared_context {
            return shared.clone();
        }

        let context = IsolationContext::new(plugin_id);
        Arc::new(match bundle_path {
            Some(path) => context.with_bundle_path(path),
            None => context,
        })
    }

    async fn release_context(&self, context: &IsolationContext) {
        if !context.is_shared() {
            context.release().await;
        }
    }

    // ========================================================================
    // 플러그인 로드
    // ========================================================================

    /// 번들에서 플러그인 로드
    pub async fn load_plugin(&self, bundle_path: impl AsRef<Path>) -> Result<Arc<dyn Plugin>> {
        let bundle_path = bundle_path.as_ref();
        self.ensure_running()?;

        let result = self
            .timed(&bundle_path.display().to_string(), self.load_bundle(bundle_path))
            .await;

        if let Err(e) = &result {
            error!(bundle = %bundle_path.display(), error = %e, "Failed to load plugin bundle");
            self.report_error(bundle_path.display().to_string(), e);
        }
        result
    }

    /// 이미 생성된 플러그인 등록 (번들 없이 정적 링크)
    pub async fn register_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<Arc<dyn Plugin>> {
        self.ensure_running()?;
        let id = plugin.id().to_string();

        let result = self.timed(&id, self.install(plugin, None)).await;

        if let Err(e) = &result {
            error!(plugin_id = %id, error = %e, "Failed to register plugin");
            self.report_error(id, e);
        }
        result
    }

    /// 로드 시간 제한 적용
    async fn timed<F>(&self, label: &str, load: F) -> Result<Arc<dyn Plugin>>
    where
        F: std::future::Future<Output = Result<Arc<dyn Plugin>>>,
    {
        match tokio::time::timeout(self.config.load_timeout(), load).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "Loading {} exceeded {}ms",
                label, self.config.load_timeout_ms
            ))),
        }
    }

    async fn load_bundle(&self, bundle_path: &Path) -> Result<Arc<dyn Plugin>> {
        tokio::fs::metadata(bundle_path)
            .await
            .map_err(|e| Error::Validation(format!("Bundle {} is not readable: {}", bundle_path.display(), e)))?;

        let plugin = self.scanner.resolve(bundle_path).await?.ok_or_else(|| {
            Error::NotFound(format!(
                "No plugin implementation found in bundle {}",
                bundle_path.display()
            ))
        })?;

        self.install(plugin, Some(bundle_path.to_path_buf())).await
    }

    /// 컨텍스트 연결 → 의존성 확인 → 초기화 → 등록
    async fn install(&self, plugin: Arc<dyn Plugin>, bundle_path: Option<PathBuf>) -> Result<Arc<dyn Plugin>> {
        let metadata = plugin.metadata().clone();
        let id = metadata.id.clone();

        if self.registry.contains(&id) {
            return Err(Error::Validation(format!("Plugin {} is already registered", id)));
        }

        info!(plugin_id = %id, version = %metadata.version, "Loading plugin");

        let context = self.context_for(&id, bundle_path.as_deref());
        plugin.bind_context(context.clone());

        let missing = self.registry.missing_dependencies(&metadata.dependencies);
        if !missing.is_empty() {
            self.release_context(&context).await;
            return Err(Error::dependency(&id, missing));
        }
        if !metadata.dependencies.is_empty() {
            debug!(plugin_id = %id, dependencies = ?metadata.dependencies, "Dependencies resolved");
            self.events.publish(ManagerEvent::DependencyResolved {
                plugin_id: id.clone(),
                dependencies: metadata.dependencies.clone(),
            });
        }

        if let Err(e) = plugin.initialize().await {
            self.discard(&plugin, &context).await;
            return Err(e);
        }

        let subscription = plugin.subscribe();
        let entry = match self
            .registry
            .register(PluginEntry::new(plugin.clone(), bundle_path, context.clone()))
            .await
        {
            Ok(entry) => entry,
            Err(e) => {
                self.discard(&plugin, &context).await;
                return Err(e);
            }
        };

        entry.attach_forwarder(self.spawn_forwarder(subscription));

        self.events.publish(ManagerEvent::PluginLoaded {
            plugin_id: id.clone(),
            version: metadata.version.to_string(),
        });
        info!(plugin_id = %id, "Plugin loaded");

        Ok(plugin)
    }

    /// 등록되지 않은 플러그인 정리
    async fn discard(&self, plugin: &Arc<dyn Plugin>, context: &IsolationContext) {
        if let Err(e) = plugin.shutdown().await {
            debug!(plugin_id = %plugin.id(), error = %e, "Shutdown after failed load also failed");
        }
        self.release_context(context).await;
    }

    /// 플러그인 이벤트를 매니저 버스로 전달
    fn spawn_forwarder(&self, mut subscription: EventSubscription<PluginEvent>) -> Forwarder {
        let events = self.events.clone();
        let token = self.root_token.child_token();
        let stop = token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => {
                        while let Some(event) = subscription.try_recv() {
                            events.publish(ManagerEvent::Plugin { event });
                        }
                        break;
                    }
                    event = subscription.recv() => match event {
                        Some(event) => events.publish(ManagerEvent::Plugin { event }),
                        None => break,
                    },
                }
            }
        });

        Forwarder { token, handle }
    }

    /// 디렉토리의 번들을 병렬로 로드 - 성공한 플러그인만 반환
    pub async fn load_plugins_from_directory(self: &Arc<Self>, dir: impl AsRef<Path>) -> Result<Vec<Arc<dyn Plugin>>> {
        let outcomes = self.load_plugins_detailed(dir).await?;
        let total = outcomes.len();

        let loaded: Vec<Arc<dyn Plugin>> = outcomes
            .into_iter()
            .filter_map(|outcome| outcome.result.ok())
            .collect();

        info!(loaded = loaded.len(), failed = total - loaded.len(), "Finished loading plugin directory");
        Ok(loaded)
    }

    /// 설정된 플러그인 디렉토리 로드
    pub async fn load_configured_plugins(self: &Arc<Self>) -> Result<Vec<Arc<dyn Plugin>>> {
        let dir = self.config.plugin_dir.clone();
        self.load_plugins_from_directory(dir).await
    }

    /// 디렉토리의 번들을 병렬로 로드 - 번들별 결과 반환
    ///
    /// 동시에 `max_concurrent_loads`개까지만 로드하고, 각 로드는 별도
    /// 태스크에서 시간 제한과 함께 실행됩니다. 한 번들의 실패나 패닉은
    /// 다른 번들에 영향을 주지 않습니다.
    pub async fn load_plugins_detailed(self: &Arc<Self>, dir: impl AsRef<Path>) -> Result<Vec<BundleLoadOutcome>> {
        let dir = dir.as_ref();
        self.ensure_running()?;

        let bundles = discover_bundles(self.scanner.as_ref(), dir).await?;
        info!(
            dir = %dir.display(),
            bundles = bundles.len(),
            max_concurrent = self.config.max_concurrent_loads,
            "Loading plugin bundles"
        );

        let tasks: Vec<(PathBuf, JoinHandle<Result<Arc<dyn Plugin>>>)> = bundles
            .into_iter()
            .map(|path| {
                let manager = Arc::clone(self);
                let permits = Arc::clone(&self.load_permits);
                let task_path = path.clone();

                let handle = tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|_| Error::Internal("load permits closed".into()))?;
                    manager.load_plugin(&task_path).await
                });
                (path, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (bundle_path, handle) in tasks {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let reason = if e.is_panic() { "panicked" } else { "was cancelled" };
                    let err = Error::execution(format!("Load task for {} {}", bundle_path.display(), reason), None);
                    error!(bundle = %bundle_path.display(), error = %err, "Load task aborted");
                    self.report_error(bundle_path.display().to_string(), &err);
                    Err(err)
                }
            };
            outcomes.push(BundleLoadOutcome { bundle_path, result });
        }

        Ok(outcomes)
    }

    // ========================================================================
    // 활성화 / 비활성화 / 언로드
    // ========================================================================

    fn entry(&self, id: &str) -> Result<Arc<PluginEntry>> {
        self.registry
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("Plugin {} not found", id)))
    }

    /// 플러그인 활성화 + 명령어 등록
    pub async fn activate_plugin(&self, id: &str) -> Result<()> {
        self.ensure_running()?;
        let entry = self.entry(id)?;

        if entry.plugin.state().is_active() {
            return Ok(());
        }

        if let Err(e) = entry.plugin.activate().await {
            self.report_error(id, &e);
            return Err(e);
        }

        if let Some(commands) = &self.commands {
            for command in entry.plugin.commands() {
                let name = command.name().to_string();
                match commands.register_command(command, Some(id)).await {
                    Ok(()) => debug!(plugin_id = %id, command = %name, "Registered plugin command"),
                    Err(e) => {
                        warn!(plugin_id = %id, command = %name, error = %e, "Failed to register plugin command");
                        self.report_error(id, &e);
                    }
                }
            }

            // 활성화 도중 언로드된 경우 방금 등록한 명령어 회수
            let still_registered = self
                .registry
                .get(id)
                .is_some_and(|current| Arc::ptr_eq(&current, &entry));
            if !still_registered {
                let removed = commands.unregister_plugin_commands(id).await;
                warn!(plugin_id = %id, commands = removed.len(), "Plugin was unloaded during activation");
                return Err(Error::NotFound(format!("Plugin {} was unloaded during activation", id)));
            }
        }

        Ok(())
    }

    /// 플러그인 비활성화 + 명령어 해제
    pub async fn deactivate_plugin(&self, id: &str) -> Result<()> {
        self.ensure_running()?;
        let entry = self.entry(id)?;

        if let Some(commands) = &self.commands {
            commands.unregister_plugin_commands(id).await;
        }

        if let Err(e) = entry.plugin.deactivate().await {
            self.report_error(id, &e);
            return Err(e);
        }
        Ok(())
    }

    /// 플러그인 언로드
    ///
    /// 훅 실패는 기록만 하고 계속 진행하며, 컨텍스트와 명령어는 항상 해제됩니다.
    pub async fn unload_plugin(&self, id: &str) -> Result<()> {
        self.ensure_running()?;

        let dependents = self.registry.dependents_of(id);
        if !dependents.is_empty() {
            warn!(plugin_id = %id, dependents = ?dependents, "Unloading plugin that others depend on");
        }

        self.unload_entry(id).await
    }

    async fn unload_entry(&self, id: &str) -> Result<()> {
        let entry = self
            .registry
            .unregister(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("Plugin {} not found", id)))?;

        info!(plugin_id = %id, "Unloading plugin");

        if let Err(e) = entry.plugin.shutdown().await {
            warn!(plugin_id = %id, error = %e, "Plugin shutdown failed, continuing unload");
            self.report_error(id, &e);
        }

        if let Some(commands) = &self.commands {
            commands.unregister_plugin_commands(id).await;
        }

        if let Some(forwarder) = entry.take_forwarder() {
            forwarder.token.cancel();
            if let Err(e) = forwarder.handle.await {
                debug!(plugin_id = %id, error = %e, "Event forwarder ended abnormally");
            }
        }

        self.release_context(&entry.context).await;

        self.events.publish(ManagerEvent::PluginUnloaded {
            plugin_id: id.to_string(),
        });
        info!(plugin_id = %id, "Plugin unloaded");
        Ok(())
    }

    /// 번들에서 다시 로드 (활성 상태였다면 다시 활성화)
    pub async fn reload_plugin(&self, id: &str) -> Result<Arc<dyn Plugin>> {
        self.ensure_running()?;
        let entry = self.entry(id)?;

        let bundle_path = entry
            .bundle_path
            .clone()
            .ok_or_else(|| Error::invalid_state(id, "loaded from a bundle", "registered directly"))?;
        let was_active = entry.plugin.state().is_active();
        drop(entry);

        info!(plugin_id = %id, bundle = %bundle_path.display(), "Reloading plugin");

        self.unload_plugin(id).await?;
        let plugin = self.load_plugin(&bundle_path).await?;

        if was_active {
            self.activate_plugin(plugin.id()).await?;
        }
        Ok(plugin)
    }

    // ========================================================================
    // Hot reload
    // ========================================================================

    /// 번들 변경 감시 시작
    ///
    /// `hot_reload_interval_ms`마다 매니페스트 수정 시각을 확인하고 바뀐
    /// 번들을 다시 로드합니다. 매니저가 종료되거나 해제되면 멈춥니다.
    pub fn spawn_hot_reload_watcher(self: &Arc<Self>) -> Result<()> {
        self.ensure_running()?;
        if !self.config.hot_reload {
            return Err(Error::Config("hot reload is disabled".into()));
        }

        let manager = Arc::downgrade(self);
        let token = self.root_token.child_token();
        let interval = self.config.hot_reload_interval();

        let handle = tokio::spawn(async move {
            let mut seen: HashMap<String, SystemTime> = HashMap::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(manager) = manager.upgrade() else { break };
                manager.reload_changed_bundles(&mut seen).await;
            }

            debug!("Hot reload watcher stopped");
        });

        self.background.lock().push(handle);
        info!(interval_ms = self.config.hot_reload_interval_ms, "Hot reload watcher started");
        Ok(())
    }

    async fn reload_changed_bundles(&self, seen: &mut HashMap<String, SystemTime>) {
        for entry in self.registry.ordered() {
            let Some(bundle_path) = entry.bundle_path.clone() else {
                continue;
            };

            let watch_path = self.scanner.watch_path(&bundle_path);
            let modified = match tokio::fs::metadata(&watch_path).await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    debug!(bundle = %bundle_path.display(), error = %e, "Cannot stat bundle");
                    continue;
                }
            };

            let id = entry.id().to_string();
            let baseline = seen
                .get(&id)
                .copied()
                .unwrap_or_else(|| SystemTime::from(entry.loaded_at));
            seen.insert(id.clone(), modified.max(baseline));
            drop(entry);

            if modified > baseline {
                info!(plugin_id = %id, "Bundle changed on disk");
                if let Err(e) = self.reload_plugin(&id).await {
                    warn!(plugin_id = %id, error = %e, "Hot reload failed");
                }
            }
        }

        seen.retain(|id, _| self.registry.contains(id));
    }

    // ========================================================================
    // 메시지 라우팅
    // ========================================================================

    /// 처리 가능한 첫 번째 활성 플러그인에게 메시지 전달
    ///
    /// 실패한 플러그인은 기록하고 건너뜁니다. 아무도 처리하지 않으면 `Ok(None)`.
    pub async fn process_message(&self, message: &PluginMessage) -> Result<Option<Value>> {
        self.ensure_running()?;

        let candidates: Vec<Arc<PluginEntry>> = self
            .registry
            .ordered()
            .into_iter()
            .filter(|entry| entry.plugin.state().is_active() && entry.plugin.can_handle(&message.message_type))
            .collect();

        for entry in candidates {
            let id = entry.id();
            let label = format!("Plugin {} message handler", id);

            match fault::guarded(&label, entry.plugin.handle_message(message)).await {
                Ok(Some(result)) => {
                    debug!(plugin_id = %id, message_type = %message.message_type, "Message handled");
                    return Ok(Some(result));
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(plugin_id = %id, message_type = %message.message_type, error = %e, "Plugin failed to handle message, trying next");
                    self.report_error(id, &e);
                }
            }
        }

        debug!(message_type = %message.message_type, "No plugin handled message");
        Ok(None)
    }

    // ========================================================================
    // 종료
    // ========================================================================

    /// 모든 플러그인 언로드 후 백그라운드 작업 취소
    pub async fn shutdown(&self) -> Result<()> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let ids = self.registry.ids();
        info!(plugins = ids.len(), "Shutting down plugin manager");

        let mut failures = 0usize;
        for id in ids.iter().rev() {
            if let Err(e) = self.unload_entry(id).await {
                failures += 1;
                warn!(plugin_id = %id, error = %e, "Failed to unload plugin during shutdown");
            }
        }

        self.root_token.cancel();

        let tasks = std::mem::take(&mut *self.background.lock());
        for task in tasks {
            if let Err(e) = task.await {
                debug!(error = %e, "Background task ended abnormally");
            }
        }

        if let Some(shared) = &self.shared_context {
            shared.release().await;
        }

        info!(failures, "Plugin manager shut down");
        Ok(())
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    // ========================================================================
    // 접근자
    // ========================================================================

    pub fn get_plugin(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.registry.get_plugin(id)
    }

    pub fn plugin_state(&self, id: &str) -> Option<PluginState> {
        self.registry.get_plugin(id).map(|plugin| plugin.state())
    }

    /// 로드 순서대로 메타데이터
    pub fn list_plugins(&self) -> Vec<PluginMetadata> {
        self.registry
            .ordered()
            .iter()
            .map(|entry| entry.plugin.metadata().clone())
            .collect()
    }

    pub fn plugin_count(&self) -> usize {
        self.registry.len()
    }

    /// 플러그인의 번들 경로
    pub fn bundle_path(&self, id: &str) -> Option<PathBuf> {
        self.registry.get(id).and_then(|entry| entry.bundle_path.clone())
    }

    /// 플러그인의 격리 컨텍스트
    pub fn plugin_context(&self, id: &str) -> Option<Arc<IsolationContext>> {
        self.registry.get(id).map(|entry| entry.context.clone())
    }

    pub fn events(&self) -> &EventBus<ManagerEvent> {
        &self.events
    }

    /// 매니저 이벤트 구독 (재생 버퍼 포함)
    pub fn subscribe(&self) -> EventSubscription<ManagerEvent> {
        self.events.subscribe_with_replay()
    }

    pub fn config(&self) -> &PluginManagerConfig {
        &self.config
    }

    pub fn command_registry(&self) -> Option<&Arc<CommandRegistry>> {
        self.commands.as_ref()
    }

    /// 상태별 플러그인 수
    pub fn statistics(&self) -> PluginStatistics {
        let mut stats = PluginStatistics::default();

        for entry in self.registry.snapshot().values() {
            stats.total += 1;
            match entry.plugin.state() {
                PluginState::Active => stats.active += 1,
                PluginState::Loaded => stats.loaded += 1,
                PluginState::Failed { .. } => stats.failed += 1,
                PluginState::Loading => stats.loading += 1,
                PluginState::Unloaded => stats.unloaded += 1,
            }
        }

        stats
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        self.root_token.cancel();
    }
}
