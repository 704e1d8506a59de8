use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::favorites::{AddFlavorRequest, FlavorList},
    error::{AppJson, AppResult},
    middleware::auth::AuthUser,
    models::FavoriteFlavor,
    response::ApiResponse,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/{id}", delete(remove_favorite))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    responses(
        (status = 200, description = "Favourite flavours of the current user", body = ApiResponse<FlavorList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<FlavorList>>> {
    let resp = favorite_service::list_flavors(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/favorites",
    request_body = AddFlavorRequest,
    responses(
        (status = 200, description = "Flavour added", body = ApiResponse<FavoriteFlavor>),
        (status = 400, description = "Missing or oversized flavour name")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AddFlavorRequest>,
) -> AppResult<Json<ApiResponse<FavoriteFlavor>>> {
    let resp = favorite_service::add_flavor(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{id}",
    params(
        ("id" = Uuid, Path, description = "Favourite flavour ID")
    ),
    responses(
        (status = 200, description = "Removed from favorites", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Favorite not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = favorite_service::remove_flavor(&state, &user, id).await?;
    Ok(Json(resp))
}
