use super::*;
use crate::commands;
use crate::i18n::Catalog;
use crate::lifecycle::LifecycleState;
use crate::service::Kernel;
use crate::testing::{invocation, test_dir, FakePlatform};
use polyglot_core::command::InvocationOption;
use polyglot_settings::GuildSettingsStore;
use std::collections::HashMap;
use tokio::sync::oneshot;

struct Harness {
    platform: Arc<FakePlatform>,
    lifecycle: Arc<CommandLifecycle>,
    store: Arc<GuildSettingsStore>,
    gateway: Arc<Gateway>,
}

async fn harness(platform: FakePlatform) -> Harness {
    let dir = test_dir("gateway");
    let catalog = Catalog::from_maps(
        "en",
        HashMap::from([
            (
                "en".to_string(),
                HashMap::from([
                    ("help_title".to_string(), "Help".to_string()),
                    ("help_description".to_string(), "Commands".to_string()),
                    ("settings_lang_changed".to_string(), "Language: {0}".to_string()),
                    ("unknown_command".to_string(), "Unknown command.".to_string()),
                    ("not_ready".to_string(), "Not ready.".to_string()),
                ]),
            ),
            (
                "ru".to_string(),
                HashMap::from([("settings_lang_changed".to_string(), "Язык: {0}".to_string())]),
            ),
        ]),
    )
    .unwrap();
    let store = Arc::new(
        GuildSettingsStore::load(dir.join("settings.json"))
            .await
            .unwrap(),
    );
    let platform = Arc::new(platform);
    let services: Arc<dyn Services> = Arc::new(Kernel::new(
        Arc::new(catalog),
        store.clone(),
        platform.clone(),
    ));
    let lifecycle = Arc::new(CommandLifecycle::new(commands::builtin(services.as_ref())));
    let gateway = Arc::new(Gateway::new(
        platform.clone(),
        services,
        lifecycle.clone(),
        Duration::from_secs(1),
    ));
    Harness {
        platform,
        lifecycle,
        store,
        gateway,
    }
}

/// Wait until the fake has recorded `n` replies.
async fn wait_for_replies(platform: &FakePlatform, n: usize) {
    for _ in 0..200 {
        if platform.replies().len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {n} replies, got {}", platform.replies().len());
}

async fn wait_for_registration(lifecycle: &CommandLifecycle) {
    for _ in 0..200 {
        if lifecycle.state().await == LifecycleState::Registered {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("commands never registered");
}

fn sender(platform: &FakePlatform) -> tokio::sync::mpsc::Sender<Invocation> {
    platform.events.lock().unwrap().clone().unwrap()
}

#[tokio::test]
async fn test_full_lifecycle_registers_routes_and_cleans_up() {
    let h = harness(FakePlatform::default()).await;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(h.gateway.clone().run(async {
        let _ = stop_rx.await;
    }));

    wait_for_registration(&h.lifecycle).await;
    assert_eq!(h.platform.registered_names(), vec!["help", "settings"]);

    let tx = sender(&h.platform);
    tx.send(invocation("help", "g1")).await.unwrap();
    wait_for_replies(&h.platform, 1).await;

    let _ = stop_tx.send(());
    run.await.unwrap().unwrap();

    let replies = h.platform.replies();
    assert_eq!(replies.len(), 1);
    let embed = replies[0].1.embed.clone().unwrap();
    assert_eq!(embed.title, "Help");
    assert_eq!(embed.description, "Commands");

    assert!(h.platform.registered_names().is_empty());
    assert!(*h.platform.stopped.lock().unwrap());
    assert_eq!(h.lifecycle.state().await, LifecycleState::Unregistered);
}

#[tokio::test]
async fn test_settings_invocation_persists_through_gateway() {
    let h = harness(FakePlatform::default()).await;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(h.gateway.clone().run(async {
        let _ = stop_rx.await;
    }));
    wait_for_registration(&h.lifecycle).await;

    let mut inv = invocation("settings", "g1");
    inv.options = vec![InvocationOption {
        name: "lang".to_string(),
        value: None,
        options: vec![InvocationOption {
            name: "lang".to_string(),
            value: Some("ru".to_string()),
            options: Vec::new(),
        }],
    }];
    sender(&h.platform).send(inv).await.unwrap();
    wait_for_replies(&h.platform, 1).await;

    let _ = stop_tx.send(());
    run.await.unwrap().unwrap();

    assert_eq!(h.store.get("g1").await.as_deref(), Some("ru"));
    let reply = &h.platform.replies()[0].1;
    assert_eq!(reply.content.as_deref(), Some("Язык: ru (ru)"));
}

#[tokio::test]
async fn test_unknown_command_gets_one_reply() {
    let h = harness(FakePlatform::default()).await;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(h.gateway.clone().run(async {
        let _ = stop_rx.await;
    }));
    wait_for_registration(&h.lifecycle).await;

    sender(&h.platform)
        .send(invocation("nope", "g1"))
        .await
        .unwrap();
    wait_for_replies(&h.platform, 1).await;
    let _ = stop_tx.send(());
    run.await.unwrap().unwrap();

    let replies = h.platform.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].1.content.as_deref(), Some("Unknown command."));
}

#[tokio::test]
async fn test_startup_fails_when_nothing_registers() {
    let platform = FakePlatform::default();
    platform
        .fail_register
        .lock()
        .unwrap()
        .extend(["help".to_string(), "settings".to_string()]);
    let h = harness(platform).await;

    let result = h.gateway.clone().run(std::future::pending::<()>()).await;
    assert!(result.is_err());
    assert!(*h.platform.stopped.lock().unwrap());
    assert_eq!(h.lifecycle.state().await, LifecycleState::Unregistered);
}

#[tokio::test]
async fn test_closed_event_stream_still_unregisters() {
    let h = harness(FakePlatform::default()).await;
    let run = tokio::spawn(h.gateway.clone().run(std::future::pending::<()>()));
    wait_for_registration(&h.lifecycle).await;

    // Dropping the only sender ends the event stream.
    h.platform.events.lock().unwrap().take();
    run.await.unwrap().unwrap();

    assert!(h.platform.registered_names().is_empty());
}

#[tokio::test]
async fn test_failed_reply_does_not_stop_the_loop() {
    let h = harness(FakePlatform {
        fail_respond: true,
        ..Default::default()
    })
    .await;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(h.gateway.clone().run(async {
        let _ = stop_rx.await;
    }));
    wait_for_registration(&h.lifecycle).await;

    let tx = sender(&h.platform);
    tx.send(invocation("help", "g1")).await.unwrap();
    tx.send(invocation("help", "g2")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.lifecycle.state().await, LifecycleState::Registered);

    let _ = stop_tx.send(());
    run.await.unwrap().unwrap();
    assert!(h.platform.replies().is_empty());
    assert!(h.platform.registered_names().is_empty());
}

#[tokio::test]
async fn test_invocations_queued_at_shutdown_get_not_ready() {
    let h = harness(FakePlatform {
        queued: vec![invocation("help", "g1"), invocation("settings", "g2")],
        ..Default::default()
    })
    .await;

    // Shutdown is already due when the loop starts, so nothing is routed.
    h.gateway.clone().run(std::future::ready(())).await.unwrap();

    let replies = h.platform.replies();
    assert_eq!(replies.len(), 2);
    for (invocation, reply) in &replies {
        assert_eq!(reply.content.as_deref(), Some("Not ready."), "{}", invocation.command);
        assert!(reply.ephemeral);
    }
    assert_eq!(replies[0].0.command, "help");
    assert_eq!(replies[1].0.command, "settings");
    assert!(h.platform.registered_names().is_empty());
    assert_eq!(h.store.get("g2").await, None);
}
