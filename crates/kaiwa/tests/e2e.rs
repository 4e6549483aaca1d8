// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the assembled session backend.
//!
//! Each test wires a full [`SessionService`] over temp directories with a
//! mock provider, the same way `kaiwa serve` wires the real one. Restart
//! behavior is exercised by tearing the service down and rebuilding it
//! over the same directories.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kaiwa_core::{GenerationProvider, KaiwaError, MAIN_ALIAS, Role, Turn};
use kaiwa_history::HistoryStore;
use kaiwa_session::SessionService;
use kaiwa_state::StateStores;
use kaiwa_test_utils::MockProvider;
use tempfile::tempdir;

const USER: u64 = 7;
const CHANNEL: u64 = 42;

async fn build_service(root: &Path) -> (SessionService, Arc<StateStores>, Arc<MockProvider>) {
    std::fs::create_dir_all(root.join("history")).unwrap();
    std::fs::create_dir_all(root.join("state")).unwrap();
    let provider = Arc::new(MockProvider::new());
    let state = Arc::new(StateStores::load(&root.join("state")).await.unwrap());
    let service = SessionService::new(
        HistoryStore::new(root.join("history")),
        Arc::clone(&state),
        Arc::clone(&provider) as Arc<dyn GenerationProvider>,
        Duration::from_secs(0),
        "gemini-2.0-flash",
    );
    (service, state, provider)
}

#[tokio::test]
async fn conversation_survives_restart() {
    let root = tempdir().unwrap();

    {
        let (service, state, provider) = build_service(root.path()).await;
        service.enable_channel(CHANNEL).await;
        provider.push_text("first reply").await;
        service
            .handle_message(USER, CHANNEL, Some("hello".into()), vec![])
            .await
            .unwrap();
        state.flush_all().await.unwrap();
    }

    // A fresh service over the same directories sees everything.
    let (service, _state, provider) = build_service(root.path()).await;
    provider.push_text("second reply").await;
    let reply = service
        .handle_message(USER, CHANNEL, Some("again".into()), vec![])
        .await
        .unwrap();
    assert_eq!(reply.as_deref(), Some("second reply"));

    let turns: Vec<Turn> =
        serde_json::from_slice(&service.export(USER, None).await.unwrap()).unwrap();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0].joined_text(), "hello");
    assert_eq!(turns[3].joined_text(), "second reply");

    // The provider request carried the persisted history.
    let calls = provider.calls().await;
    assert_eq!(calls[0].turns.len(), 3);
}

#[tokio::test]
async fn settings_survive_restart_after_flush() {
    let root = tempdir().unwrap();

    {
        let (service, state, _provider) = build_service(root.path()).await;
        service.enable_channel(CHANNEL).await;
        service.change(USER, Some("work")).await.unwrap();
        service.set_maxhistory(USER, Some(10)).await;
        service.set_model(USER, Some("gemini-2.0-pro".into())).await;
        state.flush_all().await.unwrap();
    }

    let (service, state, _provider) = build_service(root.path()).await;
    assert_eq!(service.current(USER).await, "work");
    assert_eq!(service.current_model(USER).await, "gemini-2.0-pro");
    assert_eq!(state.maxhistory.get(USER).await, Some(Some(10)));
    assert!(state.channel.contains(CHANNEL).await);
}

#[tokio::test]
async fn unflushed_settings_are_lost_but_history_is_not() {
    let root = tempdir().unwrap();

    {
        let (service, _state, _provider) = build_service(root.path()).await;
        service.enable_channel(CHANNEL).await;
        service
            .handle_message(USER, CHANNEL, Some("durable".into()), vec![])
            .await
            .unwrap();
        service.change(USER, Some("volatile")).await.unwrap();
        // No flush: simulates a crash before the periodic task fired.
    }

    let (service, _state, _provider) = build_service(root.path()).await;
    assert_eq!(service.current(USER).await, MAIN_ALIAS);

    // History writes are synchronous; the exchange is still there.
    let turns: Vec<Turn> =
        serde_json::from_slice(&service.export(USER, None).await.unwrap()).unwrap();
    assert_eq!(turns.len(), 2);
}

#[tokio::test]
async fn export_import_moves_a_conversation_between_names() {
    let root = tempdir().unwrap();
    let (service, _state, provider) = build_service(root.path()).await;
    service.enable_channel(CHANNEL).await;

    provider.push_text("moved reply").await;
    service
        .handle_message(USER, CHANNEL, Some("move me".into()), vec![])
        .await
        .unwrap();

    let exported = service.export(USER, None).await.unwrap();
    let document: serde_json::Value = serde_json::from_slice(&exported).unwrap();
    service.import(USER, Some("archive"), &document).await.unwrap();

    let archived: Vec<Turn> =
        serde_json::from_slice(&service.export(USER, Some("archive")).await.unwrap()).unwrap();
    assert_eq!(archived.len(), 2);
    assert_eq!(archived[0].role, Role::User);
    assert_eq!(archived[1].joined_text(), "moved reply");

    assert_eq!(
        service.list(USER).await.unwrap(),
        vec![MAIN_ALIAS.to_string(), "archive".to_string()]
    );
}

#[tokio::test]
async fn tampered_export_is_rejected_on_import() {
    let root = tempdir().unwrap();
    let (service, _state, _provider) = build_service(root.path()).await;
    service.enable_channel(CHANNEL).await;

    service
        .handle_message(USER, CHANNEL, Some("original".into()), vec![])
        .await
        .unwrap();

    let mut document: serde_json::Value =
        serde_json::from_slice(&service.export(USER, None).await.unwrap()).unwrap();
    document[0]["extra"] = serde_json::json!("smuggled");

    let err = service.import(USER, None, &document).await.unwrap_err();
    match err {
        KaiwaError::Validation { reasons } => {
            assert_eq!(reasons, vec!["invalid message format".to_string()]);
        }
        other => panic!("expected Validation, got {other}"),
    }

    let turns: Vec<Turn> =
        serde_json::from_slice(&service.export(USER, None).await.unwrap()).unwrap();
    assert_eq!(turns[0].joined_text(), "original");
}
