use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use recall_core::Clock;
use recall_core::model::{Flashcard, FlashcardSet, SetIndex, SetName, UserId};
use storage::repository::{ProfileRecord, SetRecord, SetStore, StorageError};

use crate::error::SaveError;
use crate::identity::IdentityProvider;

/// Bound on commit attempts while the profile version check keeps losing to
/// concurrent saves.
const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 4;

/// Base delay between conflicting commit attempts, doubled per attempt with
/// jitter on top.
const RETRY_BASE_DELAY_MS: u64 = 10;

/// Coordinates the flashcard-set save protocol.
///
/// A save updates two records: the user's set-name index on the profile and
/// the set record itself. Both are written in one atomic commit guarded by an
/// optimistic version check on the profile; a conflicting concurrent save
/// triggers a re-read and a bounded retry instead of losing the update.
#[derive(Clone)]
pub struct SetSaveService {
    clock: Clock,
    store: Arc<dyn SetStore>,
    identity: Arc<dyn IdentityProvider>,
    max_commit_attempts: u32,
}

impl SetSaveService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn SetStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            clock,
            store,
            identity,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }

    /// Overrides the commit-attempt bound. Clamped to at least one attempt.
    #[must_use]
    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    /// Save a named set of cards for the current user.
    ///
    /// The index entry and the set record land together or not at all.
    /// Re-saving an existing name replaces that set's cards and leaves the
    /// index unchanged. Runs `Read → Compute → CommitAttempt`, retrying on
    /// version conflicts up to the configured bound.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Name` for a blank name and
    /// `SaveError::Unauthenticated` when no identity is resolved — both
    /// before any I/O. Returns `SaveError::Storage` if the commit cannot be
    /// applied (including exhausted conflict retries); in that case neither
    /// record was updated.
    pub async fn save_set(&self, name: &str, cards: &[Flashcard]) -> Result<SetName, SaveError> {
        let name = SetName::new(name)?;
        let user = self
            .identity
            .current_user()
            .ok_or(SaveError::Unauthenticated)?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let (expected_version, index) = self.read_index(&user).await?;
            let set = FlashcardSet::new(name.clone(), cards.to_vec(), self.clock.now());
            let profile = ProfileRecord {
                user_id: user.clone(),
                set_names: index
                    .appended(&name)
                    .names()
                    .map(str::to_owned)
                    .collect(),
                version: expected_version.map_or(1, |v| v + 1),
                updated_at: self.clock.now(),
            };
            let record = SetRecord::from_set(user.clone(), &set);

            match self
                .store
                .commit_save(expected_version, profile, record)
                .await
            {
                Ok(()) => {
                    tracing::debug!(set = %name, attempt, "flashcard set saved");
                    return Ok(name);
                }
                Err(StorageError::Conflict) if attempt < self.max_commit_attempts => {
                    tracing::warn!(set = %name, attempt, "save commit conflicted; retrying");
                    backoff(attempt).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// The current user's set-name index; empty for a first-time user.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Unauthenticated` without an identity, or
    /// `SaveError::Storage` if the profile cannot be read.
    pub async fn set_index(&self) -> Result<SetIndex, SaveError> {
        let user = self
            .identity
            .current_user()
            .ok_or(SaveError::Unauthenticated)?;
        let (_, index) = self.read_index(&user).await?;
        Ok(index)
    }

    /// Fetch one of the current user's sets by name.
    ///
    /// Returns `Ok(None)` when no such set exists.
    ///
    /// # Errors
    ///
    /// Returns `SaveError::Unauthenticated` without an identity, or
    /// `SaveError::Storage` if the set cannot be read.
    pub async fn get_set(&self, name: &str) -> Result<Option<FlashcardSet>, SaveError> {
        let user = self
            .identity
            .current_user()
            .ok_or(SaveError::Unauthenticated)?;
        match self.store.get_set(&user, name).await? {
            Some(record) => Ok(Some(record.into_set()?)),
            None => Ok(None),
        }
    }

    async fn read_index(&self, user: &UserId) -> Result<(Option<i64>, SetIndex), SaveError> {
        let profile = self.store.get_profile(user).await?;
        Ok(match profile {
            Some(profile) => (Some(profile.version), profile.index()),
            None => (None, SetIndex::new()),
        })
    }
}

async fn backoff(attempt: u32) {
    let base = RETRY_BASE_DELAY_MS << attempt.min(6);
    let jitter = rand::rng().random_range(0..base);
    sleep(Duration::from_millis(base + jitter)).await;
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    use recall_core::time::fixed_clock;
    use storage::repository::InMemoryStore;

    use crate::identity::{Anonymous, StaticIdentity};

    fn service(store: &InMemoryStore) -> SetSaveService {
        let identity = StaticIdentity::new(UserId::new("uid-1").unwrap());
        SetSaveService::new(fixed_clock(), Arc::new(store.clone()), Arc::new(identity))
    }

    #[tokio::test]
    async fn blank_name_fails_before_any_write() {
        let store = InMemoryStore::new();
        let err = service(&store)
            .save_set("   ", &[Flashcard::new("Q", "A")])
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Name(_)));

        let user = UserId::new("uid-1").unwrap();
        assert!(store.get_profile(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_identity_fails_before_any_write() {
        let store = InMemoryStore::new();
        let svc = SetSaveService::new(
            fixed_clock(),
            Arc::new(store.clone()),
            Arc::new(Anonymous),
        );
        let err = svc
            .save_set("Biology 101", &[Flashcard::new("Q", "A")])
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Unauthenticated));
    }

    #[tokio::test]
    async fn conflict_retries_until_commit_lands() {
        let store = InMemoryStore::new();
        store.fail_next_commit(StorageError::Conflict);

        let saved = service(&store)
            .save_set("Biology 101", &[Flashcard::new("Q", "A")])
            .await
            .unwrap();
        assert_eq!(saved.as_str(), "Biology 101");

        let user = UserId::new("uid-1").unwrap();
        let profile = store.get_profile(&user).await.unwrap().unwrap();
        assert_eq!(profile.set_names, vec!["Biology 101"]);
    }

    #[tokio::test]
    async fn conflict_retries_are_bounded() {
        let store = InMemoryStore::new();
        store.fail_next_commit(StorageError::Conflict);
        store.fail_next_commit(StorageError::Conflict);

        let svc = service(&store).with_max_commit_attempts(2);
        let err = svc
            .save_set("Biology 101", &[Flashcard::new("Q", "A")])
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Storage(StorageError::Conflict)));
    }

    #[tokio::test]
    async fn non_conflict_storage_errors_are_not_retried() {
        let store = InMemoryStore::new();
        store.fail_next_commit(StorageError::Connection("socket closed".into()));

        let err = service(&store)
            .save_set("Biology 101", &[Flashcard::new("Q", "A")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SaveError::Storage(StorageError::Connection(_))
        ));

        // The queued fault was the only commit attempt.
        let user = UserId::new("uid-1").unwrap();
        assert!(store.get_profile(&user).await.unwrap().is_none());
    }
}
