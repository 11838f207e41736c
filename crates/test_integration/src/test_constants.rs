pub const API_KEY: &str = "integration-key";
pub const PAGE_SIZE: u32 = 21;
pub const SEED: u64 = 7;
/// Upper bound for anything a test waits on.
pub const WAIT_SECS: u64 = 10;
