use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The user a mutation acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
}

/// Reject requests without an `x-user-id` header and expose the caller as
/// an [`Actor`] extension.
pub async fn require_actor(mut request: Request<Body>, next: Next) -> Response {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let Some(user_id) = user_id else {
        return ApiError::unauthorized().into_response();
    };

    request.extensions_mut().insert(Actor { user_id });
    next.run(request).await
}
