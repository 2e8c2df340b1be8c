use realworld_articles::config::Config;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("Failed to load configuration");
    let app = realworld_articles::rocket(config).expect("Failed to create database pool");
    info!("starting article service");
    if let Err(e) = app.launch().await {
        error!(error = %e, "server stopped with an error");
    }
}
