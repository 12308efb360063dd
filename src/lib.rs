//! Documentation of a food-delivery cart backend.
//!
//! Carts are kept consistent with the shop/product catalog lazily: every
//! mutation re-derives the totals, and the read paths that matter prune
//! line items whose product has gone missing or unavailable.
//!
//!
//!
//! # General Infrastructure
//! - One axum server fronting a shared Redis instance
//! - Users, shops, and products are owned by other services; this server only
//!   reads them by id out of their Redis hashes
//! - Carts live in their own hash, one field per (user, shop) pair
//! - All state is in Redis; the server itself can be restarted freely
//!
//!
//!
//! # Notes
//!
//! ## Why whole-document writes
//!
//! A cart is small (a handful of line items) and every mutation already has
//! to recompute the totals over all of them, so partial updates buy nothing.
//! Serializing the full document into one hash field keeps reads and writes
//! to a single Redis call and makes the (user, shop) field name the
//! uniqueness constraint.
//!
//! ## Staleness
//!
//! Cart documents copy the user/shop/product fields they were created from
//! and are not told when those change. The reconciling read is the only
//! repair path; the list endpoint reports problems without repairing.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! `````
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 RUST_LOG=info cargo run
//! ```
use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod cart;
pub mod config;
pub mod directory;
pub mod error;
pub mod gate;
pub mod models;
pub mod reconcile;
pub mod routes;
pub mod state;
pub mod store;

use routes::{
    add_handler, carts_handler, decrement_handler, delete_user_carts_handler, detail_handler,
    note_handler, payment_handler, restore_handler, softdelete_handler, update_handler,
    validate_handler,
};
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/carts/add", post(add_handler))
        .route("/carts/update", put(update_handler))
        .route("/carts/delete", put(decrement_handler))
        .route("/carts/validate/{user}/{shop}", post(validate_handler))
        .route("/carts/delete/{user}/{shop}", delete(payment_handler))
        .route("/carts/softdelete/{id}", delete(softdelete_handler))
        .route("/carts/restore/available/{id}", put(restore_handler))
        .route("/carts/update-note/{cart_id}/{product_id}", put(note_handler))
        .route(
            "/carts/{user}",
            get(carts_handler).delete(delete_user_carts_handler),
        )
        .route("/carts/{user}/{shop}", get(detail_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
