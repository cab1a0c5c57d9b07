pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};

use axum::{Router, middleware as axum_middleware, routing::get};

use middleware::{log_responses, set_request_context};

/// Full application router: the versioned API plus `/_health`.
pub fn build_router(state: ApiState) -> Router {
    let health = Router::new()
        .route("/_health", get(api::handlers::health))
        .with_state(state.clone());

    build_api_router(state)
        .merge(health)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
