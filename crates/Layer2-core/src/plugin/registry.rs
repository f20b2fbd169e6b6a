//! Plugin Registry - 플러그인 저장소

use super::context::IsolationContext;
use super::traits::Plugin;
use chrono::{DateTime, Utc};
use kiln_foundation::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 플러그인 이벤트 전달 작업
pub(crate) struct Forwarder {
    pub(crate) token: CancellationToken,
    pub(crate) handle: JoinHandle<()>,
}

/// 등록된 플러그인 정보
pub struct PluginEntry {
    /// 플러그인 인스턴스
    pub plugin: Arc<dyn Plugin>,

    /// 번들 경로 (직접 등록한 플러그인은 None)
    pub bundle_path: Option<PathBuf>,

    /// 격리 컨텍스트
    pub context: Arc<IsolationContext>,

    /// 로드 순서 (등록 시 부여)
    pub load_order: u64,

    /// 등록 시각
    pub loaded_at: DateTime<Utc>,

    /// 이벤트 전달 작업
    forwarder: Mutex<Option<Forwarder>>,
}

impl PluginEntry {
    pub fn new(plugin: Arc<dyn Plugin>, bundle_path: Option<PathBuf>, context: Arc<IsolationContext>) -> Self {
        Self {
            plugin,
            bundle_path,
            context,
            load_order: 0,
            loaded_at: Utc::now(),
            forwarder: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        self.plugin.id()
    }

    pub fn bundle_path(&self) -> Option<&Path> {
        self.bundle_path.as_deref()
    }

    pub(crate) fn attach_forwarder(&self, forwarder: Forwarder) {
        *self.forwarder.lock() = Some(forwarder);
    }

    pub(crate) fn take_forwarder(&self) -> Option<Forwarder> {
        self.forwarder.lock().take()
    }
}

type PluginMap = HashMap<String, Arc<PluginEntry>>;

/// 플러그인 레지스트리
///
/// 읽기는 `Arc` 스냅샷, 변경은 `write_gate`로 직렬화 후 맵 교체.
pub struct PluginRegistry {
    /// 플러그인 저장소 (ID → PluginEntry)
    plugins: RwLock<Arc<PluginMap>>,

    /// 변경 직렬화
    write_gate: tokio::sync::Mutex<()>,

    /// 로드 카운터
    load_counter: AtomicU64,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(Arc::new(HashMap::new())),
            write_gate: tokio::sync::Mutex::new(()),
            load_counter: AtomicU64::new(0),
        }
    }

    /// 현재 스냅샷
    pub fn snapshot(&self) -> Arc<PluginMap> {
        self.plugins.read().clone()
    }

    /// 플러그인 등록 - 같은 ID가 있으면 Validation 에러
    pub async fn register(&self, mut entry: PluginEntry) -> Result<Arc<PluginEntry>> {
        let id = entry.id().to_string();

        let _gate = self.write_gate.lock().await;
        let current = self.snapshot();

        if current.contains_key(&id) {
            return Err(Error::Validation(format!("Plugin {} is already registered", id)));
        }

        entry.load_order = self.load_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = Arc::new(entry);

        let mut next = (*current).clone();
        next.insert(id.clone(), entry.clone());
        *self.plugins.write() = Arc::new(next);

        debug!(plugin_id = %id, load_order = entry.load_order, "Registered plugin");
        Ok(entry)
    }

    /// 플러그인 등록 해제
    pub async fn unregister(&self, id: &str) -> Option<Arc<PluginEntry>> {
        let _gate = self.write_gate.lock().await;
        let current = self.snapshot();

        if !current.contains_key(id) {
            return None;
        }

        let mut next = (*current).clone();
        let removed = next.remove(id);
        *self.plugins.write() = Arc::new(next);

        debug!(plugin_id = %id, "Unregistered plugin");
        removed
    }

    pub fn get(&self, id: &str) -> Option<Arc<PluginEntry>> {
        self.snapshot().get(id).cloned()
    }

    pub fn get_plugin(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.get(id).map(|entry| entry.plugin.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().contains_key(id)
    }

    /// 로드 순서대로 정렬된 항목
    pub fn ordered(&self) -> Vec<Arc<PluginEntry>> {
        let mut entries: Vec<Arc<PluginEntry>> = self.snapshot().values().cloned().collect();
        entries.sort_by_key(|entry| entry.load_order);
        entries
    }

    /// 로드 순서대로 정렬된 ID
    pub fn ids(&self) -> Vec<String> {
        self.ordered().iter().map(|entry| entry.id().to_string()).collect()
    }

    /// 아직 등록되지 않은 의존성 (선언 순서 유지)
    ///
    /// 존재 여부만 확인합니다. 버전, 전이 의존성, 순환은 검사하지 않습니다.
    pub fn missing_dependencies(&self, dependencies: &[String]) -> Vec<String> {
        let plugins = self.snapshot();
        dependencies
            .iter()
            .filter(|dep| !plugins.contains_key(dep.as_str()))
            .cloned()
            .collect()
    }

    /// 해당 플러그인에 의존하는 등록된 플러그인
    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        let mut dependents: Vec<String> = self
            .snapshot()
            .values()
            .filter(|entry| entry.plugin.metadata().dependencies.iter().any(|d| d == id))
            .map(|entry| entry.id().to_string())
            .collect();
        dependents.sort();
        dependents
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
