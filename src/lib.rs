pub mod application;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod payment;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::{CartService, CheckoutService, CheckoutSettings, OrderService, WebhookSettings};
use config::Settings;
use handlers::ApiDoc;
use infrastructure::{DieselCartRepository, DieselOrderRepository};
use payment::PaymentGateway;

pub use db::{create_pool, DbPool};

pub type AppCartService = CartService<DieselCartRepository>;
pub type AppCheckoutService = CheckoutService<DieselCartRepository, DieselOrderRepository>;
pub type AppOrderService = OrderService<DieselOrderRepository>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Build and return an actix-web `Server` bound to `settings.host:settings.port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    gateway: Arc<dyn PaymentGateway>,
    settings: &Settings,
) -> std::io::Result<actix_web::dev::Server> {
    let carts = Arc::new(DieselCartRepository::new(pool.clone()));
    let orders = Arc::new(DieselOrderRepository::new(pool));

    let cart_service = web::Data::new(CartService::new(carts.as_ref().clone()));
    let checkout_service = web::Data::new(CheckoutService::new(
        Arc::clone(&carts),
        Arc::clone(&orders),
        Arc::clone(&gateway),
        CheckoutSettings {
            frontend_url: settings.frontend_url.clone(),
            currency: settings.payment.currency.clone(),
        },
    ));
    let order_service = web::Data::new(OrderService::new(
        orders,
        gateway,
        WebhookSettings {
            secret: settings.payment.webhook_secret.clone(),
            tolerance_secs: settings.payment.webhook_tolerance_secs,
        },
    ));
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(cart_service.clone())
            .app_data(checkout_service.clone())
            .app_data(order_service.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/api/cart")
                    .route("", web::get().to(handlers::cart::list_cart))
                    .route("", web::post().to(handlers::cart::add_to_cart))
                    .route("/{id}", web::put().to(handlers::cart::update_quantity))
                    .route("/{id}", web::delete().to(handlers::cart::delete_cart_item))
                    .route("/{id}/adjust", web::post().to(handlers::cart::adjust_quantity)),
            )
            .service(
                web::scope("/api/order")
                    .route(
                        "/cash-on-delivery",
                        web::post().to(handlers::orders::cash_on_delivery),
                    )
                    .route("/checkout", web::post().to(handlers::orders::card_checkout))
                    .route("/order-list", web::get().to(handlers::orders::list_orders)),
            )
            .route(
                "/api/stripe/webhook",
                web::post().to(handlers::webhook::stripe_webhook),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((settings.host.clone(), settings.port))?
    .run())
}
