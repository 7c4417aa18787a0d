pub mod auth;
pub mod documents;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod schedule;
pub mod state;
pub mod voice;
pub mod watch_task;
pub mod ws_handler;

// Re-export the main WebSocket handler and middleware to make them easily
// accessible to the binary that builds the web server router.
pub use middleware::require_auth;
pub use ws_handler::ws_handler;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Builds the API router: public auth routes plus the auth-gated application
/// routes. The same assembly serves the binary and the integration tests.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(rest::root_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/dashboard", get(rest::dashboard_handler))
        .route(
            "/medicines",
            post(schedule::add_medicine_handler).get(schedule::list_medicines_handler),
        )
        .route(
            "/medicines/{id}",
            put(schedule::update_medicine_handler).delete(schedule::delete_medicine_handler),
        )
        .route(
            "/reminders",
            post(schedule::add_reminder_handler).get(schedule::list_reminders_handler),
        )
        .route(
            "/reminders/{id}",
            put(schedule::update_reminder_handler).delete(schedule::delete_reminder_handler),
        )
        .route("/prescriptions", post(documents::upload_prescription_handler))
        .route("/prescriptions/check", post(documents::check_medicines_handler))
        .route("/voice/command", post(voice::voice_command_handler))
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(app_state)
}
