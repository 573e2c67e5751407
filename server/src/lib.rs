//! # Canteen Server
//!
//! Backend for the campus canteen pickup-ordering platform.
//!
//! Students browse the menu and place pickup orders; staff accept, reject
//! and progress them through preparation; both sides get live updates
//! pushed over a WebSocket. A background task purges finished orders past
//! the retention window.
//!
//!
//!
//! # General Infrastructure
//! - One axum process serves the JSON API and the `/ws` push endpoint
//! - Redis is the only store: catalogue, orders, identities, credentials
//! - Every command is one read-modify-write against a single hash field,
//!   so the store's per-key atomicity is the whole concurrency story
//! - No cross-instance pub/sub: the fan-out registry is in-process
//!
//!
//!
//! # Request Flow
//!
//! - Place: resolve cart against the catalogue (all-or-nothing), snapshot
//!   name/price per line, persist Pending, push `newOrder` to the admin room
//! - Accept/Reject: staff command, Pending only, push `orderUpdate` to the
//!   owner's room
//! - Ready/Completed: staff command, pushed to owner and admins
//! - Cancel: owner command, Pending only, pushed to admins
//!
//!
//!
//! # Setup
//!
//! Seed the catalogue and staff account, then run:
//! ```sh
//! cargo run -p seed -- menu
//! cargo run -p seed -- admin --name Staff --email staff@example.edu --password <secret>
//! cargo run -p server
//! ```
use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, patch, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod auth;
pub mod cleanup;
pub mod config;
pub mod database;
pub mod error;
pub mod menu;
pub mod notify;
pub mod orders;
pub mod state;

use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/", get(|| async { "API is running..." }))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/verify-otp", post(auth::verify_otp))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/login-admin", post(auth::login_admin))
        .route("/api/menu", get(menu::list).post(menu::create))
        .route("/api/menu/available", get(menu::list_available))
        .route(
            "/api/menu/:id",
            get(menu::get_one).put(menu::update).delete(menu::remove),
        )
        .route("/api/menu/:id/availability", patch(menu::toggle_availability))
        .route("/api/orders", post(orders::place).get(orders::list_all))
        .route("/api/orders/my-orders", get(orders::list_mine))
        .route("/api/orders/stats/daily", get(orders::stats_daily))
        .route("/api/orders/:id", get(orders::get_one))
        .route("/api/orders/:id/accept", patch(orders::accept))
        .route("/api/orders/:id/reject", patch(orders::reject))
        .route("/api/orders/:id/status", patch(orders::advance))
        .route("/api/orders/:id/cancel", post(orders::cancel))
        .route("/ws", get(notify::ws_handler))
        .layer(cors)
        .with_state(state.clone());

    tokio::spawn(cleanup::run(state.clone()));

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
