mod changes;
mod error;
mod loading;
mod store;
mod stores;
mod tables;
mod utils;

pub use changes::*;
pub use error::*;
pub use loading::*;
pub use store::*;
pub use stores::*;
pub use tables::*;
pub use utils::*;
