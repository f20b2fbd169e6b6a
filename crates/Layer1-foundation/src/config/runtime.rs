//! Runtime Config - 플러그인 런타임 설정

use crate::event::EventBusConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 설정 파일명
pub const RUNTIME_CONFIG_FILE: &str = "runtime.json";

// ============================================================================
// PluginManagerConfig
// ============================================================================

/// 플러그인 매니저 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginManagerConfig {
    /// 플러그인 번들 디렉토리
    pub plugin_dir: PathBuf,

    /// 동시 로드 최대 개수 (> 0)
    pub max_concurrent_loads: usize,

    /// 번들 하나당 로드 제한 시간 (ms, > 0)
    pub load_timeout_ms: u64,

    /// 번들 변경 감지 후 자동 리로드
    pub hot_reload: bool,

    /// 변경 감지 주기 (ms)
    pub hot_reload_interval_ms: u64,

    /// 플러그인별 격리 컨텍스트 사용
    pub isolation: bool,
}

impl PluginManagerConfig {
    /// 디렉토리 지정하여 생성
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_max_concurrent_loads(mut self, max: usize) -> Self {
        self.max_concurrent_loads = max;
        self
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_hot_reload(mut self, enabled: bool) -> Self {
        self.hot_reload = enabled;
        self
    }

    pub fn with_hot_reload_interval(mut self, interval: Duration) -> Self {
        self.hot_reload_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_isolation(mut self, enabled: bool) -> Self {
        self.isolation = enabled;
        self
    }

    /// 로드 제한 시간
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// 변경 감지 주기
    pub fn hot_reload_interval(&self) -> Duration {
        Duration::from_millis(self.hot_reload_interval_ms)
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_loads == 0 {
            return Err(Error::Config(
                "maxConcurrentLoads must be greater than 0".into(),
            ));
        }

        if self.load_timeout_ms == 0 {
            return Err(Error::Config("loadTimeoutMs must be greater than 0".into()));
        }

        if self.hot_reload && self.hot_reload_interval_ms == 0 {
            return Err(Error::Config(
                "hotReloadIntervalMs must be greater than 0 when hot reload is enabled".into(),
            ));
        }

        Ok(())
    }
}

impl Default for PluginManagerConfig {
    fn default() -> Self {
        Self {
            plugin_dir: PathBuf::from("plugins"),
            max_concurrent_loads: 4,
            load_timeout_ms: 30_000,
            hot_reload: false,
            hot_reload_interval_ms: 2_000,
            isolation: true,
        }
    }
}

// ============================================================================
// RuntimeConfig (통합)
// ============================================================================

/// 런타임 통합 설정
///
/// ```json
/// {
///   "plugins": { "pluginDir": "plugins", "maxConcurrentLoads": 4 },
///   "events": { "replaySize": 100, "extraCapacity": 1024 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// 플러그인 매니저 설정
    pub plugins: PluginManagerConfig,

    /// 이벤트 버스 설정
    pub events: EventBusConfig,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 단일 파일에서 로드 (주석 허용)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let content = super::strip_json_comments(&content);

        let config: RuntimeConfig = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid {} at {}: {}", RUNTIME_CONFIG_FILE, path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// 전체 설정 검증
    pub fn validate(&self) -> Result<()> {
        self.plugins.validate()?;

        if self.events.replay_size == 0 {
            return Err(Error::Config("events.replaySize must be greater than 0".into()));
        }

        Ok(())
    }
}
