//! kiln-core: Core Runtime for Kiln
//!
//! Layer2 - 플러그인 런타임 레이어
//!
//! # 주요 모듈
//!
//! - `plugin`: 플러그인 계약, 라이프사이클 컨트롤러, 번들 로드, 매니저
//! - `command`: 명령어 정의, 명령어 레지스트리
//!
//! # 사용 예시
//!
//! ```ignore
//! use kiln_core::{CommandRegistry, PluginManager, PluginManagerConfig, PluginMessage};
//!
//! let commands = Arc::new(CommandRegistry::new());
//! let manager = Arc::new(
//!     PluginManager::new(PluginManagerConfig::new("plugins"))?
//!         .with_scanner(ManifestBundleScanner::new(factories))
//!         .with_command_registry(commands.clone()),
//! );
//!
//! // 번들 로드 + 활성화
//! for plugin in manager.load_plugins_from_directory("plugins").await? {
//!     manager.activate_plugin(plugin.id()).await?;
//! }
//!
//! // 메시지 라우팅
//! let reply = manager.process_message(&PluginMessage::new("chat", json!("hi"))).await?;
//!
//! // 명령어 실행
//! let result = commands.execute_line("echo hello world", ".").await?;
//!
//! manager.shutdown().await?;
//! ```

pub mod command;
mod fault;
pub mod plugin;

// Re-exports: Plugin
pub use plugin::{
    // Bundles
    BundleManifest,
    BundleScanner,
    // Events
    ManagerEvent,
    ManifestBundleScanner,
    // Context
    IsolationContext,
    // Lifecycle
    LifecycleController,
    // Traits
    Plugin,
    PluginEvent,
    PluginFactories,
    PluginHooks,
    // Manager
    PluginManager,
    PluginMessage,
    PluginMetadata,
    PluginState,
    PluginStatistics,
    PluginVersion,
};

// Re-exports: Command
pub use command::{
    Command, CommandArgument, CommandContext, CommandExecutor, CommandMetadata, CommandRegistry,
    CommandResult, CommandStatistics,
};

// Re-exports: Foundation
pub use kiln_foundation::{Error, ErrorKind, PluginManagerConfig, Result, RuntimeConfig};
