use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trip_planner_service::clients::{HttpHotelProvider, HttpImageSearch, HttpPlannerBackend};
use trip_planner_service::create_app;

/// Initialize structured tracing based on environment variables.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "trip_planner_service=debug,trip_flow=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let backend_url = env_or("BACKEND_URL", "http://127.0.0.1:5000");
    let hotels_url = env_or("HOTELS_API_URL", "http://127.0.0.1:5000/get_hotels");
    let images_url = env_or("IMAGE_API_URL", "https://api.unsplash.com");

    // Image lookups are decorative; without a key they fail and the hero
    // image falls back to the static default.
    let image_key = std::env::var("UNSPLASH_ACCESS_KEY").unwrap_or_else(|_| {
        warn!("UNSPLASH_ACCESS_KEY not set, hero images will use the static default");
        String::new()
    });

    let backend = Arc::new(HttpPlannerBackend::new(backend_url)?);
    let hotels = Arc::new(HttpHotelProvider::new(hotels_url)?);
    let images = Arc::new(HttpImageSearch::new(images_url, image_key)?);

    let app = create_app(backend, hotels, images);

    let port = env_or("PORT", "3000").parse::<u16>().unwrap_or(3000);
    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    let addr = listener.local_addr()?;

    info!("Trip Planner Service running on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
