use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use storefront_service::config::Settings;
use storefront_service::payment::StripeGateway;
use storefront_service::{build_server, create_pool, run_migrations};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = create_pool(&settings.database_url)
        .map_err(|e| startup_error("Failed to create database pool", e))?;
    run_migrations(&pool).map_err(|e| startup_error("Failed to run database migrations", e))?;

    let gateway = StripeGateway::new(&settings.payment.api_base, &settings.payment.secret_key)
        .map_err(|e| startup_error("Failed to build payment client", e))?;

    log::info!(
        "Starting server at http://{}:{}",
        settings.host,
        settings.port
    );

    build_server(pool, Arc::new(gateway), &settings)?.await
}
