pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    let reads = Router::new()
        .route("/api/v1/gallery", get(handlers::list_gallery))
        .route(
            "/api/v1/gallery/categories",
            get(handlers::category_counts),
        )
        .route("/api/v1/gallery/{id}", get(handlers::get_shared_artifact))
        .route(
            "/api/v1/users/{user_id}/artifacts",
            get(handlers::list_user_artifacts),
        )
        .route("/api/v1/classify", post(handlers::classify));

    let writes = Router::new()
        .route("/api/v1/artifacts", post(handlers::create_artifact))
        .route("/api/v1/artifacts/{id}", delete(handlers::delete_artifact))
        .route(
            "/api/v1/artifacts/{id}/share",
            post(handlers::share_artifact),
        )
        .route("/api/v1/artifacts/{id}/like", post(handlers::toggle_like))
        .route(
            "/api/v1/artifacts/{id}/comments",
            post(handlers::add_comment),
        )
        .route(
            "/api/v1/artifacts/{id}/comments/{comment_id}",
            delete(handlers::delete_comment),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_actor));

    reads.merge(writes).with_state(state)
}
