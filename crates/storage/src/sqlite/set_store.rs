use async_trait::async_trait;
use sqlx::Row;

use recall_core::model::UserId;

use super::SqliteStore;
use crate::repository::{CardRecord, ProfileRecord, SetRecord, SetStore, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl SetStore for SqliteStore {
    async fn get_profile(&self, user: &UserId) -> Result<Option<ProfileRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT version, updated_at FROM profiles WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let name_rows = sqlx::query(
            r"
            SELECT name FROM profile_sets WHERE user_id = ?1 ORDER BY position ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut set_names = Vec::with_capacity(name_rows.len());
        for name_row in name_rows {
            set_names.push(name_row.try_get::<String, _>("name").map_err(ser)?);
        }

        Ok(Some(ProfileRecord {
            user_id: user.clone(),
            set_names,
            version: row.try_get("version").map_err(ser)?,
            updated_at: row.try_get("updated_at").map_err(ser)?,
        }))
    }

    async fn get_set(&self, user: &UserId, name: &str) -> Result<Option<SetRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT created_at FROM sets WHERE user_id = ?1 AND name = ?2
            ",
        )
        .bind(user.as_str())
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let card_rows = sqlx::query(
            r"
            SELECT front, back FROM set_cards
            WHERE user_id = ?1 AND set_name = ?2
            ORDER BY position ASC
            ",
        )
        .bind(user.as_str())
        .bind(name)
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut cards = Vec::with_capacity(card_rows.len());
        for card_row in card_rows {
            cards.push(CardRecord {
                front: card_row.try_get("front").map_err(ser)?,
                back: card_row.try_get("back").map_err(ser)?,
            });
        }

        Ok(Some(SetRecord {
            user_id: user.clone(),
            name: name.to_owned(),
            cards,
            created_at: row.try_get("created_at").map_err(ser)?,
        }))
    }

    async fn commit_save(
        &self,
        expected_version: Option<i64>,
        profile: ProfileRecord,
        set: SetRecord,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool().begin().await.map_err(conn)?;

        // Version check inside the transaction; a mismatch rolls everything back.
        let stored: Option<i64> = sqlx::query(
            r"
            SELECT version FROM profiles WHERE user_id = ?1
            ",
        )
        .bind(profile.user_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(conn)?
        .map(|row| row.try_get("version"))
        .transpose()
        .map_err(ser)?;

        if stored != expected_version {
            return Err(StorageError::Conflict);
        }

        sqlx::query(
            r"
            INSERT INTO profiles (user_id, version, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                version = excluded.version,
                updated_at = excluded.updated_at
            ",
        )
        .bind(profile.user_id.as_str())
        .bind(profile.version)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query(
            r"
            DELETE FROM profile_sets WHERE user_id = ?1
            ",
        )
        .bind(profile.user_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        for (position, name) in profile.set_names.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO profile_sets (user_id, position, name)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(profile.user_id.as_str())
            .bind(i64::try_from(position).map_err(|_| ser("position overflow"))?)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        // Full replace of the set record; the delete cascades to its cards.
        sqlx::query(
            r"
            DELETE FROM sets WHERE user_id = ?1 AND name = ?2
            ",
        )
        .bind(set.user_id.as_str())
        .bind(&set.name)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO sets (user_id, name, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(set.user_id.as_str())
        .bind(&set.name)
        .bind(set.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        for (position, card) in set.cards.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO set_cards (user_id, set_name, position, front, back)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(set.user_id.as_str())
            .bind(&set.name)
            .bind(i64::try_from(position).map_err(|_| ser("position overflow"))?)
            .bind(&card.front)
            .bind(&card.back)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)
    }
}
