use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use cadastre_core::api::routes;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{create_calculation, get_result, health_handler, not_found_handler},
    infra::app_state::AppState,
};

/// Build the application router with CORS and request tracing applied.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(routes::CALC, post(create_calculation))
        .route(routes::RESULT, get(get_result))
        .route(routes::HEALTH, get(health_handler))
        .fallback(not_found_handler)
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Permissive in dev, allow-list otherwise.
fn cors_layer(state: &AppState) -> CorsLayer {
    if state.config.dev_mode {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = state
        .config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
