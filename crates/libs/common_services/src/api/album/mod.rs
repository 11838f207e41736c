pub mod error;
pub mod interfaces;
pub mod service;

pub use error::*;
pub use interfaces::*;
pub use service::*;
