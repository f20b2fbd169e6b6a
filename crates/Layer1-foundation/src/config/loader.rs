//! Configuration Loader
//!
//! Kiln 런타임 설정 로더 (`.kiln` 폴더)
//!
//! ## 검색 우선순위
//!
//! 1. User-level: `~/.kiln/runtime.json`
//! 2. Project-level: `.kiln/runtime.json`
//! 3. Local (gitignored): `.kiln/runtime.local.json`
//!
//! 각 레벨의 설정이 이전 레벨을 오버라이드합니다 (JSON 객체 단위 병합).

use super::runtime::{RuntimeConfig, RUNTIME_CONFIG_FILE};
use crate::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 설정 폴더 이름
pub const CONFIG_DIR_NAME: &str = ".kiln";

/// 로컬 설정 파일명
pub const LOCAL_CONFIG_FILE: &str = "runtime.local.json";

// ============================================================================
// ConfigLoader - 설정 로더
// ============================================================================

/// 설정 로더
pub struct ConfigLoader {
    /// 검색 경로
    search_paths: Vec<ConfigPath>,
}

/// 설정 파일 경로 정보
#[derive(Debug, Clone)]
struct ConfigPath {
    /// 경로
    path: PathBuf,
    /// 우선순위 (높을수록 우선)
    priority: u8,
    /// 설명
    description: &'static str,
}

impl ConfigLoader {
    /// 새 로더 생성 (기본 검색 경로)
    pub fn new(working_dir: &Path) -> Self {
        let mut paths = Vec::new();

        // 1. User-level (가장 낮은 우선순위)
        if let Some(home) = dirs::home_dir() {
            paths.push(ConfigPath {
                path: home.join(CONFIG_DIR_NAME).join(RUNTIME_CONFIG_FILE),
                priority: 10,
                description: "User settings",
            });
        }

        // 2. Project-level
        paths.push(ConfigPath {
            path: working_dir.join(CONFIG_DIR_NAME).join(RUNTIME_CONFIG_FILE),
            priority: 20,
            description: "Project settings",
        });

        // 3. Local (gitignored, 가장 높은 우선순위)
        paths.push(ConfigPath {
            path: working_dir.join(CONFIG_DIR_NAME).join(LOCAL_CONFIG_FILE),
            priority: 30,
            description: "Local settings",
        });

        paths.sort_by_key(|p| p.priority);

        Self { search_paths: paths }
    }

    /// 커스텀 검색 경로로 생성 (앞쪽이 낮은 우선순위)
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        let search_paths = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| ConfigPath {
                path,
                priority: i as u8,
                description: "Custom",
            })
            .collect();

        Self { search_paths }
    }

    /// 모든 경로에서 설정 로드하여 병합
    ///
    /// 읽을 수 없거나 파싱에 실패한 파일은 경고 후 건너뜁니다.
    /// 병합 결과는 검증을 통과해야 합니다.
    pub fn load_all(&self) -> Result<RuntimeConfig> {
        let mut merged = Value::Object(serde_json::Map::new());

        for config_path in &self.search_paths {
            if !config_path.path.exists() {
                continue;
            }

            match read_json_file(&config_path.path) {
                Ok(value) => {
                    info!(
                        "Loaded {} from: {}",
                        config_path.description,
                        config_path.path.display()
                    );
                    merge_json(&mut merged, value);
                }
                Err(e) => {
                    warn!(
                        "Failed to load settings from {}: {}",
                        config_path.path.display(),
                        e
                    );
                }
            }
        }

        let config: RuntimeConfig = serde_json::from_value(merged)
            .map_err(|e| Error::Config(format!("Invalid merged runtime config: {}", e)))?;
        config.validate()?;

        debug!(
            plugin_dir = %config.plugins.plugin_dir.display(),
            max_concurrent_loads = config.plugins.max_concurrent_loads,
            "Runtime config resolved"
        );

        Ok(config)
    }

    /// 존재하는 설정 파일 목록
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .filter(|p| p.path.exists())
            .map(|p| p.path.clone())
            .collect()
    }
}

// ============================================================================
// 유틸리티 함수
// ============================================================================

fn read_json_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let content = strip_json_comments(&content);
    Ok(serde_json::from_str(&content)?)
}

/// 두 JSON 값 병합 (later가 earlier를 오버라이드, 객체는 재귀 병합)
pub fn merge_json(earlier: &mut Value, later: Value) {
    match (earlier, later) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// JSON 주석 제거 (`//` 라인 주석, `/* */` 블록 주석)
pub fn strip_json_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            output.push(c);
            escape_next = false;
            continue;
        }

        if in_string {
            if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            output.push(c);
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                output.push(c);
            }
            ('/', Some('/')) => {
                // 라인 주석 스킵 (개행은 유지)
                for c in chars.by_ref() {
                    if c == '\n' {
                        output.push(c);
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                // 블록 주석 스킵
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => output.push(c),
        }
    }

    output
}

// ============================================================================
// 테스트
// ============================================================================
