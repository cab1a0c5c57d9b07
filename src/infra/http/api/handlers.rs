//! Gallery API handlers.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::gallery::{GalleryListing, GalleryQuery};
use crate::domain::types::Category;

use super::error::{ApiError, codes};
use super::middleware::Actor;
use super::models::*;
use super::state::ApiState;

fn parse_category(value: Option<&str>) -> Result<Option<Category>, ApiError> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => raw.parse::<Category>().map(Some).map_err(|err| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::UNKNOWN_CATEGORY,
                "Unknown category",
                Some(err.to_string()),
            )
        }),
    }
}

fn listing_response(listing: GalleryListing) -> GalleryResponse {
    GalleryResponse {
        served_from: listing.served_from,
        count: listing.artifacts.len(),
        artifacts: listing.artifacts,
    }
}

pub async fn list_gallery(
    State(state): State<ApiState>,
    Query(params): Query<GalleryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GalleryQuery {
        force_refresh: refresh_requested(params.refresh.as_deref()),
        category: parse_category(params.category.as_deref())?,
    };

    let listing = state.gallery.list_public(&query).await;
    Ok(Json(listing_response(listing)))
}

pub async fn category_counts(
    State(state): State<ApiState>,
    Query(params): Query<RefreshParams>,
) -> impl IntoResponse {
    let categories = state
        .gallery
        .category_counts(refresh_requested(params.refresh.as_deref()))
        .await;
    Json(CategoryCountsResponse { categories })
}

pub async fn get_shared_artifact(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let artifact = state.gallery.find_shared(&id).await?;
    Ok(Json(artifact))
}

pub async fn list_user_artifacts(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(params): Query<RefreshParams>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state
        .gallery
        .list_owner(&user_id, refresh_requested(params.refresh.as_deref()))
        .await?;
    Ok(Json(listing_response(listing)))
}

pub async fn classify(
    State(state): State<ApiState>,
    Json(payload): Json<ClassifyRequest>,
) -> impl IntoResponse {
    let category = state.gallery.classify(&payload.description, &payload.style);
    Json(ClassifyResponse { category })
}

pub async fn create_artifact(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ArtifactCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let artifact = state
        .mutations
        .create_artifact(payload.into_request(actor.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(artifact)))
}

pub async fn share_artifact(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let artifact = state.mutations.share_artifact(&id, &actor.user_id).await?;
    Ok(Json(artifact))
}

pub async fn delete_artifact(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.mutations.delete_artifact(&id, &actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_like(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let like = state.mutations.toggle_like(&id, &actor.user_id).await?;
    Ok(Json(like))
}

pub async fn add_comment(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<CommentCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .mutations
        .add_comment(payload.into_request(id, actor.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .mutations
        .delete_comment(&id, &comment_id, &actor.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let reader = state.gallery.reader();
    let cache = state.gallery.cache();
    Json(HealthResponse {
        status: "ok",
        tiers: TierHealth {
            primary: reader.has_primary(),
            secondary: reader.has_secondary(),
            tertiary: true,
        },
        cache: CacheHealth {
            enabled: cache.config().enabled,
            entries: cache.len(),
        },
    })
}
