use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use td_events::database::schema;
use td_events::notify::LogNotifier;
use td_events::state::AppState;
use td_events::web::middleware::auth as auth_middleware;
use td_events::web::routes::events;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = SqlitePoolOptions::new()
        .connect(&db_url)
        .await
        .expect("cannot connect to database");
    schema::ensure_schema(&pool).await.expect("schema setup failed");

    let state = AppState::new(pool, Arc::new(LogNotifier));

    let app = Router::new()
        .route("/events", post(events::create_event_handler))
        .route("/events/:id", put(events::update_event_handler))
        .route("/events/:id/participants", get(events::participants_handler))
        .route(
            "/events/:id/participants/:member_id",
            delete(events::remove_participant_handler),
        )
        .route("/events/:id/joined", get(events::joined_handler))
        .route("/events/:id/join", post(events::join_handler))
        .route("/events/:id/leave", post(events::leave_handler))
        .route("/events/:id/options", put(events::options_handler))
        .route("/events/:id/confirm", post(events::confirm_handler))
        .route("/events/:id/reorder", put(events::reorder_handler))
        .route("/events/:id/attendance", post(events::attendance_handler))
        .layer(middleware::from_fn(auth_middleware::require_auth))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .expect("invalid BIND_ADDR");
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("cannot bind listener");
    axum::serve(listener, app).await.expect("server error");
}
