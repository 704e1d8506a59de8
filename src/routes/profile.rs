use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::profile::UpdateProfileRequest,
    error::{AppJson, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_profile).put(update_profile).delete(delete_account),
    )
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses((status = 200, description = "Current user", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 400, description = "Invalid or taken email")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/profile",
    responses((status = 200, description = "Account deleted", body = ApiResponse<serde_json::Value>)),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = profile_service::delete_account(&state, &user).await?;
    Ok(Json(resp))
}
