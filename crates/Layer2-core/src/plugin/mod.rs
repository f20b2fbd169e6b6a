//! # Plugin System
//!
//! Kiln 플러그인 런타임
//!
//! ## 개요
//!
//! 독립적으로 작성된 플러그인을 로드하고, 격리하고, 감독합니다:
//! - 번들 디렉토리에서 제한된 병렬도로 로드 (시간 제한 포함)
//! - 평면 의존성 확인 (등록된 ID 존재 여부만)
//! - 상태 기계 기반 라이프사이클 (`LifecycleController`)
//! - 처리 가능한 첫 활성 플러그인으로 메시지 라우팅
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       PluginManager                         │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                  PluginRegistry                       │  │
//! │  │  ┌─────────────────┬─────────────────┬─────────────┐  │  │
//! │  │  │ Plugin A        │ Plugin B        │ Plugin C    │  │  │
//! │  │  │ IsolationContext│ IsolationContext│ ...         │  │  │
//! │  │  └─────────────────┴─────────────────┴─────────────┘  │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │        │ BundleScanner          │ EventBus<ManagerEvent>    │
//! │        ▼                        ▼                           │
//! │   plugin.json → factory    PluginLoaded / PluginError / ... │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! struct EchoHooks;
//!
//! #[async_trait]
//! impl PluginHooks for EchoHooks {
//!     fn metadata(&self) -> PluginMetadata {
//!         PluginMetadata::new("kiln.echo", "Echo").with_capability("echo")
//!     }
//!
//!     async fn on_initialize(&self, _ctx: &IsolationContext) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let factories = PluginFactories::new()
//!     .with("echo", |_| Ok(LifecycleController::new(EchoHooks).into_plugin()));
//!
//! let manager = Arc::new(
//!     PluginManager::new(PluginManagerConfig::new("plugins"))?
//!         .with_scanner(ManifestBundleScanner::new(factories)),
//! );
//! manager.load_plugins_from_directory("plugins").await?;
//! manager.activate_plugin("kiln.echo").await?;
//! ```

mod bundle;
mod context;
mod events;
mod lifecycle;
mod manager;
mod message;
mod metadata;
mod registry;
mod state;
mod traits;

pub use bundle::{
    discover_bundles, BundleManifest, BundleScanner, ManifestBundleScanner, NullBundleScanner,
    PluginFactories, PluginFactory, MANIFEST_FILE,
};
pub use context::{IsolationContext, SHARED_CONTEXT_OWNER};
pub use events::{ManagerEvent, PluginEvent};
pub use lifecycle::LifecycleController;
pub use manager::{BundleLoadOutcome, PluginManager, PluginStatistics};
pub use message::PluginMessage;
pub use metadata::{PluginMetadata, PluginVersion};
pub use registry::{PluginEntry, PluginRegistry};
pub use state::PluginState;
pub use traits::{Plugin, PluginHooks};
