use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::favorites::{AddFlavorRequest, FlavorList},
    entity::favorite_flavors::{ActiveModel, Column, Entity as FavoriteFlavors},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::FavoriteFlavor,
    response::{ApiResponse, Meta},
    services::profile_service::require_account,
    state::AppState,
};

pub async fn list_flavors(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<FlavorList>> {
    let items = FavoriteFlavors::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(FavoriteFlavor::from)
        .collect();
    Ok(ApiResponse::ok(FlavorList { items }))
}

pub async fn add_flavor(
    state: &AppState,
    user: &AuthUser,
    payload: AddFlavorRequest,
) -> AppResult<ApiResponse<FavoriteFlavor>> {
    let flavor_name = payload.validated_name()?;
    require_account(&state.orm, user).await?;
    let flavor = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        flavor_name: Set(flavor_name),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Added to favorites",
        flavor.into(),
        Some(Meta::empty()),
    ))
}

pub async fn remove_flavor(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = FavoriteFlavors::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Favorite not found"));
    }

    Ok(ApiResponse::success(
        "Removed from favorites",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
