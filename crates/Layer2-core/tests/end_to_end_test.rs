//! 번들 로드부터 명령어 실행, 언로드까지 전체 흐름
//!
//! `cargo test -p kiln-core --test end_to_end_test`

mod common;

use common::{init_tracing, test_factories, write_bundle, LoadTracker, TokenSlot};
use kiln_core::{
    CommandContext, CommandRegistry, ManagerEvent, ManifestBundleScanner, PluginManager, PluginManagerConfig,
    PluginMessage, PluginState,
};
use serde_json::json;
use std::sync::Arc;
use tokio_test::assert_ok;

fn manager_in(dir: &std::path::Path, commands: Arc<CommandRegistry>) -> Arc<PluginManager> {
    let scanner = ManifestBundleScanner::new(test_factories(LoadTracker::default(), TokenSlot::default()));
    Arc::new(
        PluginManager::new(PluginManagerConfig::new(dir))
            .unwrap()
            .with_scanner(scanner)
            .with_command_registry(commands),
    )
}

#[tokio::test]
async fn test_bundle_to_command_round_trip() {
    init_tracing();
    let temp = tempfile::tempdir().unwrap();
    write_bundle(temp.path(), "echo", json!({ "entry": "echo", "description": "echo bundle" }));

    let commands = Arc::new(CommandRegistry::new());
    let manager = manager_in(temp.path(), commands.clone());

    let loaded = assert_ok!(manager.load_configured_plugins().await);
    assert_eq!(loaded.len(), 1);
    assert_eq!(manager.plugin_state("echo-plugin"), Some(PluginState::Loaded));

    // 활성화 전에는 명령어가 없음
    assert!(commands.find_command("echo").is_none());

    assert_ok!(manager.activate_plugin("echo-plugin").await);
    let echo = commands.find_command("echo").expect("echo command registered on activate");
    assert_eq!(echo.metadata.plugin_id.as_deref(), Some("echo-plugin"));

    let ctx = CommandContext::new(temp.path()).with_args(["hello", "world"]);
    let result = assert_ok!(commands.execute_command("echo", &ctx).await);
    assert!(result.success);
    assert!(result.output.contains("hello world"));

    let help = commands.generate_help_text(None);
    assert!(help.contains("### echo"));
    assert!(help.contains("echo <msg>"));

    // 플러그인 컨텍스트에 초기화 데이터가 있음
    let context = manager.plugin_context("echo-plugin").unwrap();
    assert_eq!(context.get("greeting").await, Some(json!("hello")));
    assert_eq!(context.bundle_path(), Some(temp.path().join("echo").as_path()));

    let reply = assert_ok!(manager.process_message(&PluginMessage::new("echo", json!("ping"))).await);
    assert_eq!(reply, Some(json!("ping")));

    assert_ok!(manager.unload_plugin("echo-plugin").await);
    assert!(commands.find_command("echo").is_none());
    assert!(manager.get_plugin("echo-plugin").is_none());
    assert!(context.is_released());

    let history = manager.events().history();
    assert!(history
        .iter()
        .any(|event| matches!(event, ManagerEvent::PluginLoaded { plugin_id, .. } if plugin_id == "echo-plugin")));
    assert!(matches!(history.last(), Some(ManagerEvent::PluginUnloaded { plugin_id }) if plugin_id == "echo-plugin"));

    assert_ok!(manager.shutdown().await);
}

#[tokio::test]
async fn test_shutdown_unloads_everything_and_refuses_new_work() {
    init_tracing();
    let temp = tempfile::tempdir().unwrap();
    write_bundle(temp.path(), "echo", json!({ "entry": "echo" }));
    write_bundle(
        temp.path(),
        "tracked",
        json!({ "entry": "tracked", "config": { "id": "tracked" } }),
    );
    write_bundle(temp.path(), "orphan", json!({ "entry": "nobody-knows-me" }));

    let commands = Arc::new(CommandRegistry::new());
    let manager = manager_in(temp.path(), commands.clone());

    let outcomes = assert_ok!(manager.load_plugins_detailed(temp.path()).await);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 2);

    for id in ["echo-plugin", "tracked"] {
        assert_ok!(manager.activate_plugin(id).await);
    }
    assert_eq!(manager.statistics().active, 2);

    assert_ok!(manager.shutdown().await);
    assert!(manager.is_shut_down());
    assert_eq!(manager.plugin_count(), 0);
    assert!(commands.is_empty());

    let err = manager.load_plugin(temp.path().join("echo")).await.err().unwrap();
    assert_eq!(err.kind(), kiln_core::ErrorKind::State);

    // 두 번째 종료는 no-op
    assert_ok!(manager.shutdown().await);
}
