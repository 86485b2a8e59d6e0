use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use recall_core::model::{Flashcard, FlashcardSet, SetIndex, SetName, SetNameError, UserId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// The profile version check failed; a concurrent save won the commit.
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Persisted shape for one card of a set.
///
/// Order is the card's identity: records are stored and returned in set
/// order. No presentation state is ever written here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub front: String,
    pub back: String,
}

impl CardRecord {
    #[must_use]
    pub fn from_card(card: &Flashcard) -> Self {
        Self {
            front: card.front().to_owned(),
            back: card.back().to_owned(),
        }
    }

    #[must_use]
    pub fn into_card(self) -> Flashcard {
        Flashcard::new(self.front, self.back)
    }
}

/// Persisted shape for a user's profile: the set-name index plus the version
/// used for optimistic concurrency.
///
/// `version` is the version being written. The first commit for a user writes
/// version 1; every later commit writes the version it read plus one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: UserId,
    pub set_names: Vec<String>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Rebuilds the domain index from the stored names.
    #[must_use]
    pub fn index(&self) -> SetIndex {
        SetIndex::from_names(self.set_names.iter().cloned())
    }
}

/// Persisted shape for a flashcard set, keyed by `(user_id, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRecord {
    pub user_id: UserId,
    pub name: String,
    pub cards: Vec<CardRecord>,
    pub created_at: DateTime<Utc>,
}

impl SetRecord {
    #[must_use]
    pub fn from_set(user_id: UserId, set: &FlashcardSet) -> Self {
        Self {
            user_id,
            name: set.name().as_str().to_owned(),
            cards: set.cards().iter().map(CardRecord::from_card).collect(),
            created_at: set.created_at(),
        }
    }

    /// Convert the record back into a domain `FlashcardSet`.
    ///
    /// # Errors
    ///
    /// Returns `SetNameError` if the stored name no longer validates.
    pub fn into_set(self) -> Result<FlashcardSet, SetNameError> {
        let name = SetName::new(self.name)?;
        let cards = self.cards.into_iter().map(CardRecord::into_card).collect();
        Ok(FlashcardSet::new(name, cards, self.created_at))
    }
}

//
// ─── STORE CONTRACT ────────────────────────────────────────────────────────────
//

/// Store contract for the save protocol.
///
/// `commit_save` is the atomic unit: the profile index and the set record are
/// applied together or not at all. `expected_version` carries the optimistic
/// check — `None` asserts no profile row exists yet, `Some(v)` asserts the
/// stored version is exactly `v`. A mismatch fails the whole commit with
/// `StorageError::Conflict` and leaves both records untouched.
#[async_trait]
pub trait SetStore: Send + Sync {
    /// Fetch a user's profile record, or `None` for a first-time user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be read.
    async fn get_profile(&self, user: &UserId) -> Result<Option<ProfileRecord>, StorageError>;

    /// Fetch one set record by name, or `None` if the user has no such set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read.
    async fn get_set(&self, user: &UserId, name: &str) -> Result<Option<SetRecord>, StorageError>;

    /// Atomically write the profile index and the set record.
    ///
    /// The set record is a full replace of whatever was stored under
    /// `(user, name)` before.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` on a version mismatch, or another
    /// `StorageError` if the commit cannot be applied. On any error neither
    /// record is updated.
    async fn commit_save(
        &self,
        expected_version: Option<i64>,
        profile: ProfileRecord,
        set: SetRecord,
    ) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    profiles: HashMap<UserId, ProfileRecord>,
    sets: HashMap<(UserId, String), SetRecord>,
    commit_faults: VecDeque<StorageError>,
}

/// Simple in-memory store implementation for testing and prototyping.
///
/// Commits are atomic under a single lock and honor the same version-check
/// semantics as the SQLite backend. Tests can queue commit failures to
/// exercise the all-or-nothing guarantee.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an error to be returned by the next `commit_save` call instead
    /// of applying it. Queued errors are consumed in order.
    pub fn fail_next_commit(&self, error: StorageError) {
        if let Ok(mut state) = self.state.lock() {
            state.commit_faults.push_back(error);
        }
    }
}

#[async_trait]
impl SetStore for InMemoryStore {
    async fn get_profile(&self, user: &UserId) -> Result<Option<ProfileRecord>, StorageError> {
        let state = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(state.profiles.get(user).cloned())
    }

    async fn get_set(&self, user: &UserId, name: &str) -> Result<Option<SetRecord>, StorageError> {
        let state = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(state.sets.get(&(user.clone(), name.to_owned())).cloned())
    }

    async fn commit_save(
        &self,
        expected_version: Option<i64>,
        profile: ProfileRecord,
        set: SetRecord,
    ) -> Result<(), StorageError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if let Some(fault) = state.commit_faults.pop_front() {
            return Err(fault);
        }

        let stored = state.profiles.get(&profile.user_id).map(|p| p.version);
        if stored != expected_version {
            return Err(StorageError::Conflict);
        }

        state.profiles.insert(profile.user_id.clone(), profile);
        state
            .sets
            .insert((set.user_id.clone(), set.name.clone()), set);
        Ok(())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sets: Arc<dyn SetStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sets: Arc::new(InMemoryStore::new()),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::time::fixed_now;

    fn user() -> UserId {
        UserId::new("uid-1").unwrap()
    }

    fn profile(names: &[&str], version: i64) -> ProfileRecord {
        ProfileRecord {
            user_id: user(),
            set_names: names.iter().map(|n| (*n).to_owned()).collect(),
            version,
            updated_at: fixed_now(),
        }
    }

    fn record(name: &str, cards: &[(&str, &str)]) -> SetRecord {
        SetRecord {
            user_id: user(),
            name: name.to_owned(),
            cards: cards
                .iter()
                .map(|(f, b)| CardRecord {
                    front: (*f).to_owned(),
                    back: (*b).to_owned(),
                })
                .collect(),
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn commit_then_read_back() {
        let store = InMemoryStore::new();
        store
            .commit_save(None, profile(&["Set A"], 1), record("Set A", &[("Q", "A")]))
            .await
            .unwrap();

        let stored = store.get_profile(&user()).await.unwrap().unwrap();
        assert_eq!(stored.set_names, vec!["Set A"]);
        assert_eq!(stored.version, 1);

        let set = store.get_set(&user(), "Set A").await.unwrap().unwrap();
        assert_eq!(set.cards.len(), 1);
        assert_eq!(set.cards[0].front, "Q");
    }

    #[tokio::test]
    async fn commit_rejects_stale_version() {
        let store = InMemoryStore::new();
        store
            .commit_save(None, profile(&["Set A"], 1), record("Set A", &[]))
            .await
            .unwrap();

        // A second writer that also read "no profile" must lose.
        let err = store
            .commit_save(None, profile(&["Set B"], 1), record("Set B", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        // The losing commit left nothing behind.
        assert!(store.get_set(&user(), "Set B").await.unwrap().is_none());
        let stored = store.get_profile(&user()).await.unwrap().unwrap();
        assert_eq!(stored.set_names, vec!["Set A"]);
    }

    #[tokio::test]
    async fn queued_fault_fails_commit_without_side_effects() {
        let store = InMemoryStore::new();
        store.fail_next_commit(StorageError::Connection("socket closed".into()));

        let err = store
            .commit_save(None, profile(&["Set A"], 1), record("Set A", &[("Q", "A")]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));

        assert!(store.get_profile(&user()).await.unwrap().is_none());
        assert!(store.get_set(&user(), "Set A").await.unwrap().is_none());
    }

    #[test]
    fn record_round_trips_domain_set() {
        let set = FlashcardSet::new(
            SetName::new("Biology 101").unwrap(),
            vec![Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")],
            fixed_now(),
        );
        let rec = SetRecord::from_set(user(), &set);
        assert_eq!(rec.name, "Biology 101");
        assert_eq!(rec.cards.len(), 2);

        let back = rec.into_set().unwrap();
        assert_eq!(back, set);
    }
}
