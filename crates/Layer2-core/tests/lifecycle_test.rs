//! 라이프사이클 통합 테스트
//!
//! `cargo test -p kiln-core --test lifecycle_test`

mod common;

use common::{init_tracing, EchoHooks};
use kiln_core::plugin::{IsolationContext, LifecycleController};
use kiln_core::{Error, ErrorKind, Plugin, PluginEvent, PluginHooks, PluginMetadata, PluginState, Result};
use tokio_test::{assert_err, assert_ok};

fn state_changes(events: &[PluginEvent]) -> Vec<(PluginState, PluginState)> {
    events
        .iter()
        .filter_map(|event| match event {
            PluginEvent::StateChanged { old, new, .. } => Some((old.clone(), new.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_activate_twice_emits_one_state_change() {
    init_tracing();
    let plugin = LifecycleController::new(EchoHooks);

    assert_ok!(plugin.initialize().await);

    let mut subscription = plugin.events().subscribe();
    assert_ok!(plugin.activate().await);
    assert_ok!(plugin.activate().await);

    let first = subscription.try_recv().unwrap();
    assert_eq!(
        first,
        PluginEvent::StateChanged {
            plugin_id: "echo-plugin".into(),
            old: PluginState::Loaded,
            new: PluginState::Active,
        }
    );
    assert!(subscription.try_recv().is_err(), "second activate must not emit");
    assert_eq!(plugin.state(), PluginState::Active);
}

#[tokio::test]
async fn test_loading_never_outlives_initialize() {
    init_tracing();

    struct Refusing;

    #[async_trait::async_trait]
    impl PluginHooks for Refusing {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("refusing", "Refusing")
        }

        async fn on_initialize(&self, _ctx: &IsolationContext) -> Result<()> {
            Err(Error::Validation("missing api key".into()))
        }
    }

    let ok = LifecycleController::new(EchoHooks);
    assert_ok!(ok.initialize().await);
    assert_eq!(ok.state(), PluginState::Loaded);

    let refused = LifecycleController::new(Refusing);
    let err = assert_err!(refused.initialize().await);
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert!(refused.state().is_failed());

    // Loading 은 항상 같은 initialize 호출 안에서 끝난다
    for plugin_events in [ok.events().history(), refused.events().history()] {
        let changes = state_changes(&plugin_events);
        assert_eq!(changes[0], (PluginState::Unloaded, PluginState::Loading));
        assert_eq!(changes[1].0, PluginState::Loading);
        assert_ne!(changes[1].1, PluginState::Loading);
    }

    // 실패 이벤트는 Failed 전이 직후
    assert!(matches!(
        refused.events().history().last(),
        Some(PluginEvent::ErrorOccurred { plugin_id, error }) if plugin_id == "refusing" && error.contains("missing api key")
    ));
}

#[tokio::test]
async fn test_failed_plugin_has_no_way_back() {
    init_tracing();

    struct BrokenActivate;

    #[async_trait::async_trait]
    impl PluginHooks for BrokenActivate {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("broken", "Broken")
        }

        async fn on_initialize(&self, _ctx: &IsolationContext) -> Result<()> {
            Ok(())
        }

        async fn on_activate(&self, _ctx: &IsolationContext) -> Result<()> {
            Err(Error::Internal("port already in use".into()))
        }
    }

    let plugin = LifecycleController::new(BrokenActivate);
    assert_ok!(plugin.initialize().await);
    assert_err!(plugin.activate().await);

    match plugin.state() {
        PluginState::Failed { reason, cause } => {
            assert_eq!(reason, "activate hook failed");
            assert!(cause.unwrap_or_default().contains("port already in use"));
        }
        other => panic!("expected failed state, got {}", other),
    }

    assert_eq!(assert_err!(plugin.activate().await).kind(), ErrorKind::State);
    // 이미 초기화된 플러그인은 상태와 무관하게 no-op
    assert_ok!(plugin.initialize().await);
    assert!(plugin.state().is_failed());

    assert_ok!(plugin.shutdown().await);
    assert!(plugin.state().is_failed());
}
