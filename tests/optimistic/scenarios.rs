//! End-to-end mutation flows: delete, create and update, each failing or
//! succeeding against the remote.

use std::sync::Arc;

use optimistic_cache::{
    Collection, CollectionOptions, EntityStore, InMemoryRemote, MutationError, MutationKind,
    MutationStatus, RemoteError, Todo,
};
use serde_json::json;

use crate::support::{init_tracing, todos, GatedRemote};

#[tokio::test]
async fn failed_delete_restores_the_entity() {
    init_tracing();
    let server = InMemoryRemote::with_entities(todos(&[(1, "a")]));
    let (remote, gate) = GatedRemote::new(server.clone());
    let collection = Collection::from_parts(
        EntityStore::from_entities(todos(&[(1, "a")])),
        Arc::new(remote),
        CollectionOptions::default(),
    );
    server.fail_next(RemoteError::rejected(500));

    let pending = collection
        .begin(MutationKind::Delete, json!({ "id": 1 }))
        .unwrap();
    assert!(collection.store().is_empty().unwrap());

    let settle = pending.settle();
    let (result, call) = tokio::join!(settle, async {
        let call = gate.started().await;
        gate.open(1);
        call
    });

    assert_eq!(call, "delete");
    let err = result.unwrap_err();
    assert_eq!(err.message(), "Failed to delete todo");
    assert_eq!(collection.store().get_all().unwrap(), vec![Todo::new(1, "a")]);
}

#[tokio::test]
async fn create_shows_provisional_then_server_entity() {
    init_tracing();
    // 41 existing server rows, so the next assigned id is 42.
    let seeded: Vec<Todo> = (1..=41).map(|id| Todo::new(id, format!("row {id}"))).collect();
    let server = InMemoryRemote::with_entities(seeded);
    let collection = Collection::new(server.clone());

    let pending = collection.begin_create(json!({ "title": "x" })).unwrap();
    let provisional = *pending.target_id();

    let visible = collection.store().get_all().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, provisional);
    assert_eq!(visible[0].title, "x");
    assert!(!visible[0].completed);

    let committed = pending.settle().await.unwrap();

    assert_eq!(committed.record.status, MutationStatus::Succeeded);
    assert_eq!(committed.entity, Some(Todo::new(42, "x")));
    assert_eq!(collection.store().get_all().unwrap(), vec![Todo::new(42, "x")]);
}

#[tokio::test]
async fn failed_update_flips_back() {
    init_tracing();
    let server = InMemoryRemote::with_entities(todos(&[(1, "a")]));
    let collection = Collection::new(server.clone());
    collection.refetch().await.unwrap();
    server.fail_next(RemoteError::Transport("connection reset".into()));

    let pending = collection
        .begin(MutationKind::Update, json!({ "id": 1, "completed": true }))
        .unwrap();
    assert_eq!(
        collection.store().get(&1).unwrap(),
        Some(Todo::new(1, "a").completed(true))
    );

    let err = pending.settle().await.unwrap_err();

    assert_eq!(err.message(), "Failed to update todo");
    assert_eq!(collection.store().get(&1).unwrap(), Some(Todo::new(1, "a")));
}

#[tokio::test]
async fn rejection_message_from_server_wins() {
    let server = InMemoryRemote::with_entities(todos(&[(1, "a")]));
    let collection = Collection::new(server.clone());
    collection.refetch().await.unwrap();
    server.fail_next(RemoteError::rejected_with(409, "Todo is locked"));

    let err = collection.delete(&1).await.unwrap_err();

    match err {
        MutationError::RolledBack {
            kind,
            id,
            message,
            cause,
        } => {
            assert_eq!(kind, MutationKind::Delete);
            assert_eq!(id, "1");
            assert_eq!(message, "Todo is locked");
            assert_eq!(cause.status(), Some(409));
        }
        other => panic!("expected rollback, got {other:?}"),
    }
    assert!(collection.store().contains(&1).unwrap());
}

#[tokio::test]
async fn deleting_unknown_id_rolls_back_to_same_state() {
    let server = InMemoryRemote::with_entities(todos(&[(1, "a")]));
    let collection = Collection::new(server.clone());
    collection.refetch().await.unwrap();
    let before = collection.store().get_all().unwrap();

    let err = collection.delete(&7).await.unwrap_err();

    assert_eq!(err.message(), "todo 7 not found");
    assert_eq!(collection.store().get_all().unwrap(), before);
}
