use crate::runner::context::TestContext;
use crate::test_constants::{API_KEY, PAGE_SIZE};
use color_eyre::eyre::Result;

pub async fn test_settings_loaded(context: &TestContext) -> Result<()> {
    // ARRANGE
    let settings = &context.settings;

    // ASSERT
    assert_eq!(settings.flickr.api_key, API_KEY);
    assert_eq!(settings.flickr.per_page, PAGE_SIZE);
    assert_eq!(settings.flickr.extras, "url_m");
    assert_eq!(settings.flickr.search_method, "flickr.photos.search");
    assert!((settings.geo.half_width - 1.0).abs() < f64::EPSILON);
    assert!(!settings.storage.is_in_memory());
    assert!(settings.storage.image_cache_folder.is_dir());
    assert_eq!(settings.storage.max_connections, 4);

    Ok(())
}
