//! 메시지 라우팅 통합 테스트
//!
//! `cargo test -p kiln-core --test routing_test`

mod common;

use common::{init_tracing, RoutingHooks};
use kiln_core::{LifecycleController, ManagerEvent, PluginEvent, PluginManager, PluginManagerConfig, PluginMessage};
use serde_json::{json, Value};
use tokio_test::assert_ok;

async fn manager_with(hooks: Vec<RoutingHooks>) -> PluginManager {
    let manager = PluginManager::new(PluginManagerConfig::default()).unwrap();
    for hooks in hooks {
        let id = hooks.id;
        assert_ok!(manager.register_plugin(LifecycleController::new(hooks).into_plugin()).await);
        assert_ok!(manager.activate_plugin(id).await);
    }
    manager
}

fn routing(id: &'static str, capable: bool, fails: bool) -> RoutingHooks {
    RoutingHooks {
        id,
        capable,
        fails,
        panics: false,
        reply: id,
    }
}

#[tokio::test]
async fn test_failing_plugin_is_skipped_and_reported() {
    init_tracing();
    let manager = manager_with(vec![
        routing("p1", false, false),
        routing("p2", true, true),
        routing("p3", true, false),
    ])
    .await;

    let message = PluginMessage::new("chat", json!({ "text": "hi" })).with_source("cli");
    let result = assert_ok!(manager.process_message(&message).await);
    assert_eq!(result, Some(Value::String("p3".into())));

    let history = manager.events().history();
    assert!(history.iter().any(|event| matches!(
        event,
        ManagerEvent::PluginError { plugin_id, error } if plugin_id == "p2" && error.contains("cannot process messages")
    )));
    assert!(!history
        .iter()
        .any(|event| matches!(event, ManagerEvent::PluginError { plugin_id, .. } if plugin_id == "p1" || plugin_id == "p3")));

    // 메시지 훅 실패는 상태를 바꾸지 않는다
    assert!(manager.plugin_state("p2").unwrap().is_active());

    assert_ok!(manager.shutdown().await);
}

#[tokio::test]
async fn test_panicking_plugin_is_skipped_and_reported() {
    init_tracing();
    let manager = manager_with(vec![
        routing("p1", false, false),
        RoutingHooks {
            panics: true,
            ..routing("p2", true, false)
        },
        RoutingHooks {
            reply: "ok",
            ..routing("p3", true, false)
        },
    ])
    .await;

    let result = assert_ok!(manager.process_message(&PluginMessage::new("chat", json!("hi"))).await);
    assert_eq!(result, Some(Value::String("ok".into())));

    assert!(manager.events().history().iter().any(|event| matches!(
        event,
        ManagerEvent::PluginError { plugin_id, error } if plugin_id == "p2" && error.contains("p2 handler crashed")
    )));
    assert!(manager.plugin_state("p2").unwrap().is_active());

    // 다음 메시지도 같은 경로로 처리됨
    let again = assert_ok!(manager.process_message(&PluginMessage::new("chat", Value::Null)).await);
    assert_eq!(again, Some(Value::String("ok".into())));

    assert_ok!(manager.shutdown().await);
}

#[tokio::test]
async fn test_first_capable_plugin_wins_in_load_order() {
    init_tracing();
    let manager = manager_with(vec![routing("first", true, false), routing("second", true, false)]).await;

    let result = assert_ok!(manager.process_message(&PluginMessage::new("chat", Value::Null)).await);
    assert_eq!(result, Some(Value::String("first".into())));

    // 메시지 수신 이벤트가 매니저 버스로 전달됨
    let forwarded = tokio::time::timeout(std::time::Duration::from_secs(1), async {
        loop {
            let seen = manager.events().history().iter().any(|event| {
                matches!(
                    event,
                    ManagerEvent::Plugin { event: PluginEvent::MessageReceived { plugin_id, .. } } if plugin_id == "first"
                )
            });
            if seen {
                break;
            }
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(forwarded.is_ok());

    assert_ok!(manager.deactivate_plugin("first").await);
    let result = assert_ok!(manager.process_message(&PluginMessage::new("chat", Value::Null)).await);
    assert_eq!(result, Some(Value::String("second".into())));

    assert_ok!(manager.deactivate_plugin("second").await);
    assert_eq!(assert_ok!(manager.process_message(&PluginMessage::new("chat", Value::Null)).await), None);

    assert_ok!(manager.shutdown().await);
}
