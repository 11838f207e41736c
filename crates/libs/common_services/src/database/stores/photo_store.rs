use crate::database::StoreError;
use crate::database::{NewPhoto, Photo, PhotoFilter, PhotoSort};
use chrono::Utc;
use sqlx::{Executor, QueryBuilder, Sqlite};

const PHOTO_COLUMNS: &str = "id, pin_id, title, remote_url, cache_key, created_at";

pub struct PhotoStore;

impl PhotoStore {
    /// Inserts the photo unless its pin already has one with the same cache key.
    ///
    /// Returns `None` when the row was skipped.
    pub async fn insert(
        executor: impl Executor<'_, Database = Sqlite>,
        photo: &NewPhoto,
    ) -> Result<Option<Photo>, StoreError> {
        Ok(sqlx::query_as::<_, Photo>(
            r"
            INSERT INTO photo (pin_id, title, remote_url, cache_key, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (pin_id, cache_key) DO NOTHING
            RETURNING id, pin_id, title, remote_url, cache_key, created_at
            ",
        )
        .bind(&photo.pin_id)
        .bind(&photo.title)
        .bind(&photo.remote_url)
        .bind(&photo.cache_key)
        .bind(Utc::now())
        .fetch_optional(executor)
        .await?)
    }

    pub async fn list(
        executor: impl Executor<'_, Database = Sqlite>,
        filter: &PhotoFilter,
        sort: PhotoSort,
    ) -> Result<Vec<Photo>, StoreError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PHOTO_COLUMNS} FROM photo"));
        match filter {
            PhotoFilter::ForPin(pin_id) => {
                builder.push(" WHERE pin_id = ").push_bind(pin_id);
            }
            PhotoFilter::CacheKey(key) => {
                builder.push(" WHERE cache_key = ").push_bind(key);
            }
        }
        builder.push(" ORDER BY ").push(sort.as_sql());

        Ok(builder.build_query_as::<Photo>().fetch_all(executor).await?)
    }

    pub async fn exists(
        executor: impl Executor<'_, Database = Sqlite>,
        photo_id: i64,
    ) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM photo WHERE id = ?1")
            .bind(photo_id)
            .fetch_optional(executor)
            .await?;
        Ok(found.is_some())
    }

    pub async fn count_for_pin(
        executor: impl Executor<'_, Database = Sqlite>,
        pin_id: &str,
    ) -> Result<i64, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM photo WHERE pin_id = ?1")
                .bind(pin_id)
                .fetch_one(executor)
                .await?,
        )
    }

    /// Deletes one photo, returning it if it existed.
    pub async fn delete_returning(
        executor: impl Executor<'_, Database = Sqlite>,
        photo_id: i64,
    ) -> Result<Option<Photo>, StoreError> {
        Ok(sqlx::query_as::<_, Photo>(&format!(
            "DELETE FROM photo WHERE id = ?1 RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(photo_id)
        .fetch_optional(executor)
        .await?)
    }

    pub async fn delete_for_pin(
        executor: impl Executor<'_, Database = Sqlite>,
        pin_id: &str,
    ) -> Result<Vec<Photo>, StoreError> {
        Ok(sqlx::query_as::<_, Photo>(&format!(
            "DELETE FROM photo WHERE pin_id = ?1 RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(pin_id)
        .fetch_all(executor)
        .await?)
    }
}
