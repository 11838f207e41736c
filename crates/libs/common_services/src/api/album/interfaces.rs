use serde::Serialize;

/// Photos requested per search page.
pub const DEFAULT_PAGE_SIZE: u32 = 21;
/// Image downloads running at once while warming an album.
pub const DEFAULT_PREFETCH_CONCURRENCY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum RefreshOutcome {
    /// A page was fetched and its photos committed. `inserted` may be 0.
    Loaded { inserted: usize, page: u32, total: u64 },
    /// Another refresh for this pin is still running; nothing was requested.
    AlreadyLoading,
    /// The pin was deleted while the search was in flight; nothing was written.
    PinDeleted,
}

impl RefreshOutcome {
    #[must_use]
    pub const fn inserted(&self) -> usize {
        match self {
            Self::Loaded { inserted, .. } => *inserted,
            Self::AlreadyLoading | Self::PinDeleted => 0,
        }
    }
}
