use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QuerySelect, Set};

use crate::{
    dto::profile::UpdateProfileRequest,
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{email_taken, normalize_email, normalize_phone},
    state::AppState,
};

/// The caller's account row. A still-valid token for a deleted account is
/// unauthenticated. Inside a transaction the row stays share-locked, so the
/// account cannot be deleted before commit.
pub(crate) async fn require_account<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
) -> AppResult<UserModel> {
    Users::find_by_id(user.user_id)
        .lock_shared()
        .one(conn)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))
}

async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    require_account(&state.orm, user).await
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let account = current_user(state, user).await?;
    Ok(ApiResponse::ok(account.into()))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let account = current_user(state, user).await?;
    let mut active: UserActive = account.into();

    if let Some(email) = payload.email.as_deref() {
        let email = normalize_email(email)?;
        if email_taken(state, &email, Some(user.user_id)).await? {
            return Err(AppError::invalid("Email is already taken"));
        }
        active.email = Set(email);
    }
    if payload.phone.is_some() {
        active.phone = Set(normalize_phone(payload.phone.as_deref())?);
    }

    let updated = active.update(&state.orm).await?;
    Ok(ApiResponse::success("Profile updated", updated.into(), Some(Meta::empty())))
}

/// Removes the account and, by cascade, its cart, addresses, orders and flavours.
pub async fn delete_account(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Users::delete_by_id(user.user_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("User not found"));
    }
    tracing::info!(user_id = %user.user_id, "account deleted");

    Ok(ApiResponse::success(
        "Account deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
