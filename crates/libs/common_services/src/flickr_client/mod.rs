mod client;
mod error;
mod interfaces;
mod source;

pub use client::*;
pub use error::*;
pub use interfaces::*;
pub use source::*;
