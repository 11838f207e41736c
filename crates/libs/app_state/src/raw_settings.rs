use serde::Deserialize;
use std::path::PathBuf;

/// Settings as they appear in `settings.yaml`, before paths are resolved.
#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub flickr: FlickrSettings,
    pub geo: GeoSettings,
    pub storage: RawStorageSettings,
    pub logging: LoggingSettings,
}

/// Remote photo search endpoint configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct FlickrSettings {
    pub base_url: String,
    pub api_key: String,
    /// Method identifier sent as the `method` query parameter.
    pub search_method: String,
    /// Requested extras, must include a medium-size image url field (`url_m`).
    pub extras: String,
    /// Photos requested per page. Also the page size used for random page selection.
    pub per_page: u32,
    /// Timeout applied to every request, surfaced as a transport error.
    pub timeout_secs: u64,
}

/// Half extents of the bounding box searched around a pin, in degrees.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct GeoSettings {
    pub half_width: f64,
    pub half_height: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawStorageSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub image_cache_folder: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `common_services=debug`.
    pub level: String,
}
