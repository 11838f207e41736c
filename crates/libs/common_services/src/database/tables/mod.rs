mod map_region;
mod photo;
mod pin;

pub use map_region::*;
pub use photo::*;
pub use pin::*;
