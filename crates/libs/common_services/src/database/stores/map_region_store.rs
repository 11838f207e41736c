use crate::database::MapRegion;
use crate::database::StoreError;
use chrono::Utc;
use sqlx::{Executor, Sqlite};

pub struct MapRegionStore;

impl MapRegionStore {
    /// There is only ever one region row.
    pub async fn upsert(
        executor: impl Executor<'_, Database = Sqlite>,
        region: &MapRegion,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO map_region (id, center_latitude, center_longitude, span_latitude, span_longitude, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                center_latitude = excluded.center_latitude,
                center_longitude = excluded.center_longitude,
                span_latitude = excluded.span_latitude,
                span_longitude = excluded.span_longitude,
                updated_at = excluded.updated_at
            ",
        )
        .bind(region.center_latitude)
        .bind(region.center_longitude)
        .bind(region.span_latitude)
        .bind(region.span_longitude)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn load(
        executor: impl Executor<'_, Database = Sqlite>,
    ) -> Result<Option<MapRegion>, StoreError> {
        Ok(sqlx::query_as::<_, MapRegion>(
            r"
            SELECT center_latitude, center_longitude, span_latitude, span_longitude
            FROM map_region WHERE id = 1
            ",
        )
        .fetch_optional(executor)
        .await?)
    }
}
