use crate::geo_box::BoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-placed point of interest that owns a photo album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Photos the remote reported for this pin's query on the last successful search.
    pub last_photo_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Pin {
    /// A fresh, not yet persisted pin with a generated id.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            latitude,
            longitude,
            last_photo_count: 0,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.latitude, self.longitude)
    }
}
