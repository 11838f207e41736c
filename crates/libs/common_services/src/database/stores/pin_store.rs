use crate::database::Pin;
use crate::database::StoreError;
use sqlx::{Executor, Sqlite};

pub struct PinStore;

impl PinStore {
    pub async fn insert(
        executor: impl Executor<'_, Database = Sqlite>,
        pin: &Pin,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO pin (id, latitude, longitude, last_photo_count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(&pin.id)
        .bind(pin.latitude)
        .bind(pin.longitude)
        .bind(pin.last_photo_count)
        .bind(pin.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(
        executor: impl Executor<'_, Database = Sqlite>,
        pin_id: &str,
    ) -> Result<Option<Pin>, StoreError> {
        Ok(sqlx::query_as::<_, Pin>(
            "SELECT id, latitude, longitude, last_photo_count, created_at FROM pin WHERE id = ?1",
        )
        .bind(pin_id)
        .fetch_optional(executor)
        .await?)
    }

    /// All pins, newest id first.
    pub async fn list_all(
        executor: impl Executor<'_, Database = Sqlite>,
    ) -> Result<Vec<Pin>, StoreError> {
        Ok(sqlx::query_as::<_, Pin>(
            "SELECT id, latitude, longitude, last_photo_count, created_at FROM pin ORDER BY id DESC",
        )
        .fetch_all(executor)
        .await?)
    }

    pub async fn exists(
        executor: impl Executor<'_, Database = Sqlite>,
        pin_id: &str,
    ) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM pin WHERE id = ?1")
            .bind(pin_id)
            .fetch_optional(executor)
            .await?;
        Ok(found.is_some())
    }

    /// Returns the number of rows touched, `0` when the pin is gone.
    pub async fn set_last_photo_count(
        executor: impl Executor<'_, Database = Sqlite>,
        pin_id: &str,
        count: i64,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE pin SET last_photo_count = ?1 WHERE id = ?2")
            .bind(count)
            .bind(pin_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Photos go with it through `ON DELETE CASCADE`.
    pub async fn delete(
        executor: impl Executor<'_, Database = Sqlite>,
        pin_id: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM pin WHERE id = ?1")
            .bind(pin_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
