use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one photo in a pin's album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: i64,
    pub pin_id: String,
    pub title: String,
    pub remote_url: String,
    /// Remote photo id, doubles as the image cache file name.
    pub cache_key: String,
    pub created_at: DateTime<Utc>,
}

/// A photo waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub pin_id: String,
    pub title: String,
    pub remote_url: String,
    pub cache_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoFilter {
    ForPin(String),
    /// Every photo, of any pin, backed by this cached image.
    CacheKey(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhotoSort {
    /// Title ascending; ties broken by cache key then id so the order is reproducible.
    #[default]
    TitleAscending,
    /// Insertion order.
    Inserted,
}

impl PhotoSort {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::TitleAscending => "title ASC, cache_key ASC, id ASC",
            Self::Inserted => "id ASC",
        }
    }
}
