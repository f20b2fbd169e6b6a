//! # kiln-foundation
//!
//! Foundation layer for Kiln:
//! - Error: 런타임 공통 에러 분류 (Validation, NotFound, Dependency, State, Timeout, Execution)
//! - Event: 재생 버퍼를 가진 발행/구독 이벤트 버스
//! - Config: 플러그인 매니저/이벤트 버스 설정과 다단계 로더

pub mod config;
pub mod error;
pub mod event;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, ErrorKind, Result};

// ============================================================================
// Event (이벤트 시스템)
// ============================================================================
pub use event::{EventBus, EventBusConfig, EventSubscription};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ConfigLoader, PluginManagerConfig, RuntimeConfig, CONFIG_DIR_NAME, RUNTIME_CONFIG_FILE,
};
