use app_state::{init_tracing, load_app_settings};
use color_eyre::eyre::WrapErr;
use common_services::api::album::PinPhotoLoader;
use common_services::api::pins::create_pin;
use common_services::database::Store;
use common_services::flickr_client::{FlickrClient, PhotoSource};
use common_services::image_cache::ImageCache;
use std::sync::Arc;

/// Drops a pin at `<lat> <lon>`, loads a page of photos for it and downloads the images.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let settings = load_app_settings()?;
    init_tracing(&settings.logging);

    let mut args = std::env::args().skip(1);
    let latitude: f64 = args.next().unwrap_or_else(|| "52.37".to_owned()).parse()?;
    let longitude: f64 = args.next().unwrap_or_else(|| "4.89".to_owned()).parse()?;

    let cache = ImageCache::open(&settings.storage.image_cache_folder).await?;
    let store = Store::connect(&settings.storage, cache).await?;
    let source: Arc<dyn PhotoSource> = Arc::new(FlickrClient::from_settings(&settings.flickr)?);
    let loader = PinPhotoLoader::from_settings(store.clone(), source, &settings);

    let pin = create_pin(&store, latitude, longitude).await?;
    let outcome = loader
        .refresh(&pin.id)
        .await
        .wrap_err("Could not load photos, is flickr.api_key set?")?;
    let cached = loader.warm_album(&pin.id).await?;

    println!("refresh: {}", serde_json::to_string(&outcome)?);
    println!("cached {cached} images");
    println!(
        "{}",
        serde_json::to_string_pretty(&loader.photos_for_pin(&pin.id).await?)?
    );

    Ok(())
}
