mod map_region_store;
mod photo_store;
mod pin_store;

pub use map_region_store::*;
pub use photo_store::*;
pub use pin_store::*;
