//! 통합 테스트 공용 플러그인과 번들 도우미

#![allow(dead_code)]

use async_trait::async_trait;
use kiln_core::plugin::{BundleManifest, IsolationContext, LifecycleController, PluginFactories};
use kiln_core::{
    Command, CommandArgument, CommandMetadata, CommandResult, Error, Plugin, PluginHooks, PluginMessage,
    PluginMetadata, Result,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 테스트 로그 출력 (`RUST_LOG=debug cargo test`)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `<root>/<name>/plugin.json` 작성
pub fn write_bundle(root: &Path, name: &str, manifest: Value) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("plugin.json"), serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
    dir
}

// ============================================================================
// EchoHooks - echo 명령어를 노출하는 플러그인
// ============================================================================

pub struct EchoHooks;

#[async_trait]
impl PluginHooks for EchoHooks {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("echo-plugin", "Echo")
            .with_description("Echoes its arguments")
            .with_capability("echo")
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::from_fn(
            CommandMetadata::new("echo", "Print the arguments")
                .with_usage("echo <msg>")
                .with_example("echo hello world"),
            |ctx| Ok(CommandResult::success(ctx.args.join(" "))),
        )
        .with_argument(CommandArgument::required("msg", "Message to print"))]
    }

    async fn on_initialize(&self, ctx: &IsolationContext) -> Result<()> {
        ctx.set("greeting", Value::String("hello".into())).await;
        Ok(())
    }

    async fn on_message(&self, message: &PluginMessage, _ctx: &IsolationContext) -> Result<Option<Value>> {
        Ok(Some(message.payload.clone()))
    }
}

// ============================================================================
// TrackedHooks - 동시 초기화 수를 기록하는 플러그인
// ============================================================================

/// 동시에 진행 중인 초기화 수와 최대값
#[derive(Clone, Default)]
pub struct LoadTracker {
    pub in_flight: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl LoadTracker {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct TrackedHooks {
    pub id: String,
    pub delay: Duration,
    pub tracker: LoadTracker,
}

#[async_trait]
impl PluginHooks for TrackedHooks {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new(self.id.clone(), self.id.clone())
    }

    async fn on_initialize(&self, _ctx: &IsolationContext) -> Result<()> {
        let now = self.tracker.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.tracker.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// StallingHooks - 초기화가 끝나지 않는 플러그인
// ============================================================================

/// 컨텍스트 토큰을 밖으로 꺼내기 위한 슬롯
pub type TokenSlot = Arc<parking_lot::Mutex<Option<CancellationToken>>>;

pub struct StallingHooks {
    pub id: String,
    pub token_slot: TokenSlot,
}

#[async_trait]
impl PluginHooks for StallingHooks {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new(self.id.clone(), "Stalling")
    }

    async fn on_initialize(&self, ctx: &IsolationContext) -> Result<()> {
        *self.token_slot.lock() = Some(ctx.cancellation_token());
        ctx.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        })?;

        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

// ============================================================================
// RoutingHooks - 라우팅 테스트용 플러그인
// ============================================================================

pub struct RoutingHooks {
    pub id: &'static str,
    pub capable: bool,
    pub fails: bool,
    pub panics: bool,
    pub reply: &'static str,
}

#[async_trait]
impl PluginHooks for RoutingHooks {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new(self.id, self.id).with_capability("chat")
    }

    fn can_handle(&self, _metadata: &PluginMetadata, _message_type: &str) -> bool {
        self.capable
    }

    async fn on_initialize(&self, _ctx: &IsolationContext) -> Result<()> {
        Ok(())
    }

    async fn on_message(&self, _message: &PluginMessage, _ctx: &IsolationContext) -> Result<Option<Value>> {
        if self.panics {
            panic!("{} handler crashed", self.id);
        }
        if self.fails {
            return Err(Error::Internal(format!("{} cannot process messages", self.id)));
        }
        Ok(Some(Value::String(self.reply.to_string())))
    }
}

// ============================================================================
// 생성자 목록
// ============================================================================

/// 테스트 번들이 사용하는 생성자
///
/// - `echo`: [`EchoHooks`]
/// - `tracked`: config `{ "id", "delayMs" }` → [`TrackedHooks`]
/// - `stalling`: config `{ "id" }` → [`StallingHooks`]
pub fn test_factories(
    tracker: LoadTracker,
    token_slot: TokenSlot,
) -> PluginFactories {
    PluginFactories::new()
        .with("echo", |_: &BundleManifest| Ok(LifecycleController::new(EchoHooks).into_plugin()))
        .with("tracked", move |manifest: &BundleManifest| {
            let id = config_str(manifest, "id")?;
            let delay = manifest.config.get("delayMs").and_then(Value::as_u64).unwrap_or(0);
            let plugin: Arc<dyn Plugin> = LifecycleController::new(TrackedHooks {
                id,
                delay: Duration::from_millis(delay),
                tracker: tracker.clone(),
            })
            .into_plugin();
            Ok(plugin)
        })
        .with("stalling", move |manifest: &BundleManifest| {
            let id = config_str(manifest, "id")?;
            Ok(LifecycleController::new(StallingHooks {
                id,
                token_slot: token_slot.clone(),
            })
            .into_plugin())
        })
}

fn config_str(manifest: &BundleManifest, key: &str) -> Result<String> {
    manifest
        .config
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Validation(format!("bundle config is missing '{}'", key)))
}
