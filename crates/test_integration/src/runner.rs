pub mod context;
pub mod fake_flickr;
pub mod orchestration_utils;
