//! Router configuration with middleware.
//!
//! - `/auth/*`: passwordless signup/login and session lifecycle
//! - `/api/*`: session-protected turn and conversation endpoints
//! - `/health`: unauthenticated liveness check
//!
//! Middleware: CORS and HTTP request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([handlers::turn::CONVERSATION_ID_HEADER]);

    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route(
            "/verify/{id}",
            get(handlers::auth::challenge_status).post(handlers::auth::verify),
        )
        .route("/logout", post(handlers::auth::logout))
        .route("/logout-all", post(handlers::auth::logout_all));

    let api_routes = Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/ask", post(handlers::turn::ask))
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations),
        )
        .route(
            "/conversations/newest",
            get(handlers::conversation::newest_conversation),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation)
                .delete(handlers::conversation::delete_conversation),
        );

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .route("/health", get(handlers::health::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
