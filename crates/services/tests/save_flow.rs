use std::sync::Arc;

use recall_core::model::{Flashcard, UserId};
use recall_core::time::{fixed_clock, fixed_now};
use services::{SetSaveService, StaticIdentity};
use storage::repository::{InMemoryStore, SetStore, StorageError};

fn user() -> UserId {
    UserId::new("uid-1").unwrap()
}

fn service(store: &InMemoryStore) -> SetSaveService {
    SetSaveService::new(
        fixed_clock(),
        Arc::new(store.clone()),
        Arc::new(StaticIdentity::new(user())),
    )
}

fn cards(pairs: &[(&str, &str)]) -> Vec<Flashcard> {
    pairs.iter().map(|(f, b)| Flashcard::new(*f, *b)).collect()
}

#[tokio::test]
async fn first_save_creates_profile_and_set() {
    let store = InMemoryStore::new();
    let svc = service(&store);

    svc.save_set("Biology 101", &cards(&[("Q1", "A1"), ("Q2", "A2")]))
        .await
        .unwrap();

    let profile = store.get_profile(&user()).await.unwrap().unwrap();
    assert_eq!(profile.set_names, vec!["Biology 101"]);
    assert_eq!(profile.version, 1);

    let set = store.get_set(&user(), "Biology 101").await.unwrap().unwrap();
    assert_eq!(set.cards.len(), 2);
    assert_eq!(set.cards[0].front, "Q1");
    assert_eq!(set.cards[1].front, "Q2");
    assert_eq!(set.created_at, fixed_now());
}

#[tokio::test]
async fn second_save_appends_to_the_index() {
    let store = InMemoryStore::new();
    let svc = service(&store);

    svc.save_set("Set A", &cards(&[("Q", "A")])).await.unwrap();
    svc.save_set("Set B", &cards(&[("Q2", "A2")])).await.unwrap();

    let profile = store.get_profile(&user()).await.unwrap().unwrap();
    assert_eq!(profile.set_names, vec!["Set A", "Set B"]);
    assert_eq!(profile.version, 2);

    let index = svc.set_index().await.unwrap();
    assert_eq!(index.names().collect::<Vec<_>>(), vec!["Set A", "Set B"]);
}

#[tokio::test]
async fn resaving_a_name_replaces_cards_without_duplicating_the_entry() {
    let store = InMemoryStore::new();
    let svc = service(&store);

    svc.save_set("Set A", &cards(&[("old Q", "old A")]))
        .await
        .unwrap();
    svc.save_set("Set B", &cards(&[("Q", "A")])).await.unwrap();
    svc.save_set("Set A", &cards(&[("new Q", "new A"), ("Q2", "A2")]))
        .await
        .unwrap();

    // One index entry per name, original order kept.
    let profile = store.get_profile(&user()).await.unwrap().unwrap();
    assert_eq!(profile.set_names, vec!["Set A", "Set B"]);

    // The set record was fully replaced.
    let set = svc.get_set("Set A").await.unwrap().unwrap();
    assert_eq!(
        set.cards(),
        cards(&[("new Q", "new A"), ("Q2", "A2")]).as_slice()
    );
}

#[tokio::test]
async fn trimmed_set_name_is_used_for_both_records() {
    let store = InMemoryStore::new();
    let svc = service(&store);

    let saved = svc
        .save_set("  Biology 101  ", &cards(&[("Q", "A")]))
        .await
        .unwrap();
    assert_eq!(saved.as_str(), "Biology 101");

    let profile = store.get_profile(&user()).await.unwrap().unwrap();
    assert_eq!(profile.set_names, vec!["Biology 101"]);
    assert!(store
        .get_set(&user(), "Biology 101")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn failed_commit_leaves_no_observable_state() {
    let store = InMemoryStore::new();
    let svc = service(&store);

    store.fail_next_commit(StorageError::Connection("storage fault".into()));
    svc.save_set("Biology 101", &cards(&[("Q", "A")]))
        .await
        .unwrap_err();

    assert!(store.get_profile(&user()).await.unwrap().is_none());
    assert!(store.get_set(&user(), "Biology 101").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_resave_keeps_the_previous_set_intact() {
    let store = InMemoryStore::new();
    let svc = service(&store);

    svc.save_set("Set A", &cards(&[("Q", "A")])).await.unwrap();

    store.fail_next_commit(StorageError::Connection("storage fault".into()));
    svc.save_set("Set A", &cards(&[("changed", "changed")]))
        .await
        .unwrap_err();

    let set = svc.get_set("Set A").await.unwrap().unwrap();
    assert_eq!(set.cards(), cards(&[("Q", "A")]).as_slice());

    let profile = store.get_profile(&user()).await.unwrap().unwrap();
    assert_eq!(profile.version, 1);
}

#[tokio::test]
async fn concurrent_style_conflict_is_absorbed_by_retry() {
    let store = InMemoryStore::new();
    let svc = service(&store);

    // First writer's commit already landed between this save's read and
    // commit; the queued conflict simulates losing that race once.
    svc.save_set("Set A", &cards(&[("Q", "A")])).await.unwrap();
    store.fail_next_commit(StorageError::Conflict);

    svc.save_set("Set B", &cards(&[("Q2", "A2")])).await.unwrap();

    let profile = store.get_profile(&user()).await.unwrap().unwrap();
    assert_eq!(profile.set_names, vec!["Set A", "Set B"]);
    assert_eq!(profile.version, 2);
}

#[tokio::test]
async fn index_listing_for_a_fresh_user_is_empty() {
    let store = InMemoryStore::new();
    let svc = service(&store);

    let index = svc.set_index().await.unwrap();
    assert!(index.is_empty());
    assert!(svc.get_set("anything").await.unwrap().is_none());
}
