#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod load_settings;
mod logging;
mod raw_settings;
mod settings;

pub use load_settings::*;
pub use logging::*;
pub use raw_settings::*;
pub use settings::*;
