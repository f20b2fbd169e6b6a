//! Isolation Context - 플러그인별 실행 경계
//!
//! 플러그인은 정적으로 링크되므로 심볼 격리는 없습니다. 대신 각 플러그인은
//! 자신만의 컨텍스트를 받아 다음을 소유합니다:
//!
//! - 범위가 제한된 키/값 저장소
//! - 백그라운드 작업 스코프 (컨텍스트 해제 시 모두 취소)
//!
//! ```text
//! PluginManager
//!   ├── IsolationContext (kiln.echo)  ── tasks: [watcher, ticker]
//!   ├── IsolationContext (kiln.chat)  ── tasks: []
//!   └── IsolationContext (shared)     ── isolation = false 일 때 공용
//! ```

use kiln_foundation::{Error, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// 공용 컨텍스트의 소유자 이름
pub const SHARED_CONTEXT_OWNER: &str = "shared";

/// 플러그인별 격리 컨텍스트
pub struct IsolationContext {
    /// 컨텍스트 ID
    id: String,

    /// 소유 플러그인 ID (공용 컨텍스트는 "shared")
    owner: String,

    /// 플러그인을 읽어온 번들 경로
    bundle_path: Option<PathBuf>,

    /// 공용 컨텍스트 여부 (`shared()`로만 설정)
    shared: bool,

    /// 플러그인 데이터 저장소
    data: RwLock<HashMap<String, Value>>,

    /// 작업 스코프 취소 토큰
    cancel: CancellationToken,

    /// 추적 중인 백그라운드 작업
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl IsolationContext {
    /// 새 컨텍스트 생성
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.into(),
            bundle_path: None,
            shared: false,
            data: RwLock::new(HashMap::new()),
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// 모든 플러그인이 함께 쓰는 공용 컨텍스트
    pub fn shared() -> Self {
        let mut context = Self::new(SHARED_CONTEXT_OWNER);
        context.shared = true;
        context
    }

    /// 빌더 패턴: 번들 경로 설정
    pub fn with_bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundle_path = Some(path.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn bundle_path(&self) -> Option<&Path> {
        self.bundle_path.as_deref()
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    // ========================================================================
    // 데이터 저장소
    // ========================================================================

    pub async fn get(&self, key: &str) -> Option<Value> {
        let data = self.data.read().await;
        data.get(key).cloned()
    }

    pub async fn set(&self, key: impl Into<String>, value: Value) {
        let mut data = self.data.write().await;
        data.insert(key.into(), value);
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        let mut data = self.data.write().await;
        data.remove(key)
    }

    /// 전체 데이터 복사본
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        let data = self.data.read().await;
        data.clone()
    }

    // ========================================================================
    // 작업 스코프
    // ========================================================================

    /// 컨텍스트 스코프 안에서 백그라운드 작업 실행
    ///
    /// 컨텍스트가 해제되면 작업은 다음 await 지점에서 취소됩니다.
    pub fn spawn<F>(&self, future: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::invalid_state(&self.owner, "open context", "released"));
        }

        let token = self.cancel.clone();
        let owner = self.owner.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(owner = %owner, "Context task cancelled");
                }
                _ = future => {}
            }
        });

        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
        Ok(())
    }

    /// 컨텍스트 해제 시 취소되는 하위 토큰
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// 실행 중인 작업 수
    pub fn active_tasks(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.len()
    }

    pub fn is_released(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 컨텍스트 해제 - 모든 작업 취소 후 종료까지 대기
    pub async fn release(&self) {
        self.cancel.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        let count = tasks.len();

        for task in tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!(owner = %self.owner, "Context task panicked before release");
                }
            }
        }

        self.data.write().await.clear();
        debug!(owner = %self.owner, context_id = %self.id, tasks = count, "Isolation context released");
    }
}

impl Drop for IsolationContext {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for IsolationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolationContext")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("bundle_path", &self.bundle_path)
            .field("released", &self.is_released())
            .finish()
    }
}
