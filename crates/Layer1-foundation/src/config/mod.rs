//! Config - 런타임 설정 관리
//!
//! - `runtime.rs` - RuntimeConfig / PluginManagerConfig
//! - `loader.rs` - 다단계 설정 파일 로더

mod loader;
mod runtime;

pub use loader::{merge_json, strip_json_comments, ConfigLoader, CONFIG_DIR_NAME, LOCAL_CONFIG_FILE};
pub use runtime::{PluginManagerConfig, RuntimeConfig, RUNTIME_CONFIG_FILE};
