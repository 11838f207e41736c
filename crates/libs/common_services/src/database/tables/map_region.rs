use serde::{Deserialize, Serialize};

/// The last visible map area, restored by the shell on launch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MapRegion {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub span_latitude: f64,
    pub span_longitude: f64,
}
