pub mod album;
pub mod pins;
