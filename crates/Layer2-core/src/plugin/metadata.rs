//! Plugin Metadata - 플러그인 메타데이터 정의

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 플러그인 버전
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PluginVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// 버전 문자열 파싱 (예: "1.2.3", "1.2")
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().trim_start_matches('v').split('.');

        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().map(str::parse).transpose().ok()?.unwrap_or(0);
        let patch = parts.next().map(str::parse).transpose().ok()?.unwrap_or(0);

        if parts.next().is_some() {
            return None;
        }

        Some(Self { major, minor, patch })
    }
}

impl std::fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for PluginVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl TryFrom<String> for PluginVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid plugin version: {}", value))
    }
}

impl From<PluginVersion> for String {
    fn from(version: PluginVersion) -> Self {
        version.to_string()
    }
}

/// 플러그인 메타데이터 - 생성 시 한 번 만들어지고 이후 변경되지 않음
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// 고유 플러그인 ID (예: "kiln.echo")
    pub id: String,

    /// 표시 이름
    pub name: String,

    /// 버전
    #[serde(default)]
    pub version: PluginVersion,

    /// 설명
    #[serde(default)]
    pub description: String,

    /// 작성자
    #[serde(default)]
    pub author: Option<String>,

    /// 의존하는 플러그인 ID 목록 (선언 순서 유지)
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// 처리 가능한 메시지 타입 등 기능 태그
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

impl PluginMetadata {
    /// 새 메타데이터 생성
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: PluginVersion::default(),
            description: String::new(),
            author: None,
            dependencies: Vec::new(),
            capabilities: BTreeSet::new(),
        }
    }

    /// 빌더 패턴: 버전 설정
    pub fn with_version(mut self, version: PluginVersion) -> Self {
        self.version = version;
        self
    }

    /// 빌더 패턴: 설명 설정
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// 빌더 패턴: 작성자 설정
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// 빌더 패턴: 의존성 추가
    pub fn with_dependency(mut self, plugin_id: impl Into<String>) -> Self {
        let plugin_id = plugin_id.into();
        if !self.dependencies.contains(&plugin_id) {
            self.dependencies.push(plugin_id);
        }
        self
    }

    /// 빌더 패턴: 기능 태그 추가
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// 기능 태그 보유 여부
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}
