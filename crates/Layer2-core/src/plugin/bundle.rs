//! Plugin Bundles - 번들 발견 및 플러그인 생성
//!
//! 플러그인은 바이너리에 정적으로 링크되고, 번들은 어떤 생성자를 쓸지
//! 알려주는 매니페스트만 담습니다.
//!
//! ```text
//! plugins/
//! ├── echo/
//! │   └── plugin.json      { "entry": "echo", "config": { ... } }
//! └── chat/
//!     └── plugin.json      { "entry": "chat" }
//! ```

use super::traits::Plugin;
use crate::fault::panic_message;
use async_trait::async_trait;
use kiln_foundation::config::strip_json_comments;
use kiln_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// 번들 매니페스트 파일 이름
pub const MANIFEST_FILE: &str = "plugin.json";

// ============================================================================
// BundleManifest
// ============================================================================

/// 번들 매니페스트 (`plugin.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    /// 생성자 이름 ([`PluginFactories`]에 등록된 이름)
    pub entry: String,

    /// 설명
    #[serde(default)]
    pub description: Option<String>,

    /// 생성자에 전달할 설정
    #[serde(default)]
    pub config: Value,
}

impl BundleManifest {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            description: None,
            config: Value::Null,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// 번들 디렉토리의 매니페스트 경로
    pub fn path_in(bundle_path: &Path) -> PathBuf {
        bundle_path.join(MANIFEST_FILE)
    }

    /// 매니페스트 읽기 (`//` 주석 허용)
    pub async fn load(bundle_path: &Path) -> Result<Self> {
        let path = Self::path_in(bundle_path);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Validation(format!("Unreadable bundle manifest {}: {}", path.display(), e)))?;

        Self::parse(&content)
            .map_err(|e| Error::Validation(format!("Invalid bundle manifest {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(&strip_json_comments(content))?;
        if manifest.entry.trim().is_empty() {
            return Err(Error::Validation("manifest entry must not be empty".into()));
        }
        Ok(manifest)
    }
}

// ============================================================================
// PluginFactories - 정적 링크된 생성자 목록
// ============================================================================

/// 플러그인 생성자
pub type PluginFactory = Arc<dyn Fn(&BundleManifest) -> Result<Arc<dyn Plugin>> + Send + Sync>;

/// 이름 → 생성자
#[derive(Clone, Default)]
pub struct PluginFactories {
    factories: HashMap<String, PluginFactory>,
}

impl PluginFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 패턴: 생성자 등록
    pub fn with<F>(mut self, entry: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&BundleManifest) -> Result<Arc<dyn Plugin>> + Send + Sync + 'static,
    {
        self.register(entry, factory);
        self
    }

    /// 생성자 등록 (같은 이름이면 교체)
    pub fn register<F>(&mut self, entry: impl Into<String>, factory: F)
    where
        F: Fn(&BundleManifest) -> Result<Arc<dyn Plugin>> + Send + Sync + 'static,
    {
        self.factories.insert(entry.into(), Arc::new(factory));
    }

    pub fn get(&self, entry: &str) -> Option<PluginFactory> {
        self.factories.get(entry).cloned()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.factories.contains_key(entry)
    }

    /// 등록된 생성자 이름 (정렬됨)
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

// ============================================================================
// BundleScanner Trait
// ============================================================================

/// 번들에서 플러그인 구현체를 찾는 스캐너
#[async_trait]
pub trait BundleScanner: Send + Sync {
    /// 번들 후보인지 확인 (기본: `plugin.json`을 가진 디렉토리)
    fn is_bundle(&self, path: &Path) -> bool {
        path.is_dir() && BundleManifest::path_in(path).is_file()
    }

    /// 변경 감지 대상 파일 (hot reload)
    fn watch_path(&self, bundle_path: &Path) -> PathBuf {
        BundleManifest::path_in(bundle_path)
    }

    /// 플러그인 생성 - 구현체가 없으면 `Ok(None)`
    async fn resolve(&self, bundle_path: &Path) -> Result<Option<Arc<dyn Plugin>>>;
}

/// 아무것도 찾지 못하는 스캐너 (매니저 기본값)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBundleScanner;

#[async_trait]
impl BundleScanner for NullBundleScanner {
    async fn resolve(&self, bundle_path: &Path) -> Result<Option<Arc<dyn Plugin>>> {
        debug!(bundle = %bundle_path.display(), "No scanner configured, bundle has no implementation");
        Ok(None)
    }
}

/// 매니페스트의 `entry`로 생성자를 찾는 스캐너
#[derive(Clone, Default)]
pub struct ManifestBundleScanner {
    factories: PluginFactories,
}

impl ManifestBundleScanner {
    pub fn new(factories: PluginFactories) -> Self {
        Self { factories }
    }

    pub fn factories(&self) -> &PluginFactories {
        &self.factories
    }
}

#[async_trait]
impl BundleScanner for ManifestBundleScanner {
    async fn resolve(&self, bundle_path: &Path) -> Result<Option<Arc<dyn Plugin>>> {
        let manifest = BundleManifest::load(bundle_path).await?;

        let Some(factory) = self.factories.get(&manifest.entry) else {
            debug!(bundle = %bundle_path.display(), entry = %manifest.entry, "No factory registered for entry");
            return Ok(None);
        };

        match std::panic::catch_unwind(AssertUnwindSafe(|| factory(&manifest))) {
            Ok(result) => result.map(Some),
            Err(payload) => Err(Error::execution(
                format!("Plugin factory '{}' panicked: {}", manifest.entry, panic_message(payload.as_ref())),
                None,
            )),
        }
    }
}

/// 디렉토리에서 번들 후보 나열 (경로순)
pub async fn discover_bundles(scanner: &dyn BundleScanner, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| Error::Validation(format!("Cannot read plugin directory {}: {}", dir.display(), e)))?;

    let mut bundles = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if scanner.is_bundle(&path) {
            bundles.push(path);
        }
    }

    bundles.sort();
    debug!(dir = %dir.display(), count = bundles.len(), "Discovered bundles");
    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{IsolationContext, LifecycleController, PluginHooks, PluginMetadata};

    struct Named(String);

    #[async_trait]
    impl PluginHooks for Named {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new(self.0.clone(), "Named")
        }

        async fn on_initialize(&self, _ctx: &IsolationContext) -> Result<()> {
            Ok(())
        }
    }

    fn factories() -> PluginFactories {
        PluginFactories::new()
            .with("named", |manifest: &BundleManifest| {
                let id = manifest
                    .config
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or("kiln.named")
                    .to_string();
                Ok(LifecycleController::new(Named(id)).into_plugin())
            })
            .with("broken", |_: &BundleManifest| panic!("constructor bug"))
    }

    fn write_bundle(root: &Path, name: &str, manifest: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
        dir
    }

    #[test]
    fn test_manifest_parse_with_comments() {
        let manifest = BundleManifest::parse(
            r#"{
                // constructor
                "entry": "named",
                "config": { "id": "kiln.custom" }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.entry, "named");
        assert_eq!(manifest.config["id"], "kiln.custom");
        assert!(BundleManifest::parse(r#"{ "entry": " " }"#).is_err());
    }

    #[tokio::test]
    async fn test_resolve_known_entry() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = write_bundle(temp.path(), "custom", r#"{ "entry": "named", "config": { "id": "kiln.custom" } }"#);

        let scanner = ManifestBundleScanner::new(factories());
        let plugin = scanner.resolve(&bundle).await.unwrap().unwrap();
        assert_eq!(plugin.id(), "kiln.custom");
    }

    #[tokio::test]
    async fn test_resolve_unknown_entry_and_broken_manifest() {
        let temp = tempfile::tempdir().unwrap();
        let unknown = write_bundle(temp.path(), "unknown", r#"{ "entry": "missing" }"#);
        let broken = write_bundle(temp.path(), "broken", "{ not json");

        let scanner = ManifestBundleScanner::new(factories());
        assert!(scanner.resolve(&unknown).await.unwrap().is_none());

        let err = scanner.resolve(&broken).await.err().unwrap();
        assert!(matches!(err, Error::Validation(_)));

        let err = scanner.resolve(&temp.path().join("nope")).await.err().unwrap();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_factory_panic_is_contained() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = write_bundle(temp.path(), "bad", r#"{ "entry": "broken" }"#);

        let scanner = ManifestBundleScanner::new(factories());
        let err = scanner.resolve(&bundle).await.err().unwrap();
        assert!(matches!(err, Error::Execution { ref message, .. } if message.contains("constructor bug")));
    }

    #[tokio::test]
    async fn test_discover_bundles_sorted() {
        let temp = tempfile::tempdir().unwrap();
        write_bundle(temp.path(), "b", r#"{ "entry": "named" }"#);
        write_bundle(temp.path(), "a", r#"{ "entry": "named" }"#);
        std::fs::create_dir_all(temp.path().join("not-a-bundle")).unwrap();
        std::fs::write(temp.path().join("README.md"), "docs").unwrap();

        let bundles = discover_bundles(&ManifestBundleScanner::default(), temp.path())
            .await
            .unwrap();
        let names: Vec<_> = bundles
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_null_scanner() {
        assert!(NullBundleScanner.resolve(Path::new("/tmp")).await.unwrap().is_none());
    }
}
