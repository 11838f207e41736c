use crate::{FlickrSettings, GeoSettings, LoggingSettings, RawSettings};
use serde::Deserialize;
use std::path::{PathBuf, absolute};

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub flickr: FlickrSettings,
    pub geo: GeoSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// Where pins, photo metadata and cached image bytes live.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub database_url: String,
    pub max_connections: u32,
    /// Absolute path of the image cache directory.
    pub image_cache_folder: PathBuf,
}

impl TryFrom<RawSettings> for AppSettings {
    type Error = std::io::Error;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let storage = StorageSettings {
            database_url: raw.storage.database_url,
            max_connections: raw.storage.max_connections.max(1),
            image_cache_folder: absolute(&raw.storage.image_cache_folder)?,
        };

        Ok(Self {
            flickr: raw.flickr,
            geo: raw.geo,
            storage,
            logging: raw.logging,
        })
    }
}

impl StorageSettings {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}
