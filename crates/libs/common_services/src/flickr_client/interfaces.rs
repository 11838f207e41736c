use super::error::NetworkError;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// One page of a bounding-box photo search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub bbox: String,
    pub page: u32,
    pub per_page: u32,
}

/// A search hit with every field required to build a photo record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoEntry {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    /// Total number of photos the remote knows for this query. 0 when absent or not a number.
    pub total: u64,
    pub photos: Vec<PhotoEntry>,
}

// --- Wire format ---

#[derive(Deserialize)]
struct RawSearchResponse {
    stat: Option<String>,
    code: Option<i64>,
    message: Option<String>,
    photos: Option<RawPhotos>,
}

#[derive(Deserialize)]
struct RawPhotos {
    #[serde(default)]
    total: Value,
    #[serde(default)]
    photo: Vec<Value>,
}

/// The endpoint sends `total` as a stringified integer, but numbers show up too.
fn parse_total(total: &Value) -> u64 {
    match total {
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

fn string_field(entry: &Value, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_entry(entry: &Value) -> Option<PhotoEntry> {
    Some(PhotoEntry {
        id: string_field(entry, "id").filter(|id| !id.is_empty())?,
        title: string_field(entry, "title")?,
        url: string_field(entry, "url_m").filter(|url| !url.is_empty())?,
    })
}

/// Decode a search response body. Entries missing `id`, `title` or `url_m` are dropped.
pub fn parse_search_response(body: &[u8]) -> Result<SearchResponse, NetworkError> {
    let raw: RawSearchResponse = serde_json::from_slice(body)?;

    if raw.stat.as_deref() == Some("fail") {
        return Err(NetworkError::Api {
            code: raw.code.unwrap_or_default(),
            message: raw.message.unwrap_or_default(),
        });
    }
    let Some(photos) = raw.photos else {
        return Err(NetworkError::Decode(
            "response has no `photos` object".to_string(),
        ));
    };

    let total = parse_total(&photos.total);
    let received = photos.photo.len();
    let entries: Vec<PhotoEntry> = photos.photo.iter().filter_map(parse_entry).collect();
    if entries.len() < received {
        warn!(
            "Dropped {} of {} search results with missing fields.",
            received - entries.len(),
            received
        );
    }

    Ok(SearchResponse {
        total,
        photos: entries,
    })
}
