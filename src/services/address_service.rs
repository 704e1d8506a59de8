use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::addresses::{AddressList, AddressRequest},
    entity::addresses::{ActiveModel, Column, Entity as Addresses, Model as AddressModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    services::profile_service::require_account,
    state::AppState,
};

async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<AddressModel> {
    Addresses::find()
        .filter(
            Condition::all()
                .add(Column::Id.eq(id))
                .add(Column::UserId.eq(user.user_id)),
        )
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Address not found"))
}

async fn clear_default<C: ConnectionTrait>(conn: &C, user: &AuthUser, keep: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(Column::IsDefault, Expr::value(false))
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::Id.ne(keep))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn list_addresses(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::IsDefault)
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();
    Ok(ApiResponse::ok(AddressList { items }))
}

pub async fn get_address(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Address>> {
    let address = find_owned(&state.orm, user, id).await?;
    Ok(ApiResponse::ok(address.into()))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let payload = payload.validate()?;
    let txn = state.orm.begin().await?;
    require_account(&txn, user).await?;

    let address = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(payload.name),
        phone: Set(payload.phone),
        pin_code: Set(payload.pin_code),
        state: Set(payload.state),
        district: Set(payload.district),
        address: Set(payload.address),
        is_default: Set(payload.is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    if address.is_default {
        clear_default(&txn, user, address.id).await?;
    }
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Address created",
        address.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let payload = payload.validate()?;
    let txn = state.orm.begin().await?;
    let existing = find_owned(&txn, user, id).await?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name);
    active.phone = Set(payload.phone);
    active.pin_code = Set(payload.pin_code);
    active.state = Set(payload.state);
    active.district = Set(payload.district);
    active.address = Set(payload.address);
    active.is_default = Set(payload.is_default);
    let address = active.update(&txn).await?;

    if address.is_default {
        clear_default(&txn, user, address.id).await?;
    }
    txn.commit().await?;

    Ok(ApiResponse::success("Updated", address.into(), Some(Meta::empty())))
}

/// Orders that referenced the address keep their snapshot; their link is nulled.
pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Addresses::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Address not found"));
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
