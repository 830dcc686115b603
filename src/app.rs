use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::MessageRepository;
use crate::handlers;

/// Shared handler state, built once at startup and cloned per request
#[derive(Debug, Clone)]
pub struct AppState {
    pub messages: MessageRepository,
}

impl AppState {
    pub fn new(messages: MessageRepository) -> Self {
        Self { messages }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let body_limit = match config.api.max_request_size_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    let mut router = Router::new()
        .route("/", get(handlers::service::root))
        .route("/health", get(handlers::service::health))
        .merge(message_routes())
        .layer(body_limit)
        .with_state(state);

    let security = &config.security;
    if security.enable_cors {
        router = router.layer(cors_layer(&security.cors_origins));
    }

    router.layer(TraceLayer::new_for_http())
}

fn message_routes() -> Router<AppState> {
    use handlers::messages;

    Router::new()
        .route(
            "/messages",
            get(messages::messages_get).post(messages::messages_post),
        )
        .route(
            "/messages/:id",
            get(messages::message_get)
                .patch(messages::message_patch)
                .delete(messages::message_delete),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
