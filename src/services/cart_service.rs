//! Cart mutation and the read-only cart query surface.
//!
//! Every mutation runs in one transaction. Lines being changed are locked with
//! `SELECT ... FOR UPDATE`, and adding goes through a single upsert against
//! the `(user_id, product_id)` unique constraint, so two concurrent requests
//! on one line cannot lose an update.

use std::collections::BTreeMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartAction, CartCount, CartLine, CartMap, CartMutation, CartView},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::profile_service::require_account,
    state::AppState,
};

/// New quantity after applying `action`, or `None` when the line must go.
pub fn apply_step(current: i32, action: CartAction) -> Option<i32> {
    match action {
        CartAction::Increment => Some(current.saturating_add(1)),
        CartAction::Decrement if current > 1 => Some(current - 1),
        CartAction::Decrement => None,
    }
}

pub(crate) fn priced(product: &ProductModel, quantity: i32) -> AppResult<i64> {
    product.line_total(quantity).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "line total overflows for product {} x {}",
            product.id,
            quantity
        ))
    })
}

pub(crate) fn sum_totals(totals: impl IntoIterator<Item = i64>) -> AppResult<i64> {
    totals
        .into_iter()
        .try_fold(0i64, i64::checked_add)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart total overflows")))
}

/// Sum of all quantities in the user's cart; 0 when the cart is empty.
pub async fn cart_count<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<i64> {
    let total = CartItems::find()
        .select_only()
        .column_as(Expr::col(CartCol::Quantity).sum(), "total")
        .filter(CartCol::UserId.eq(user_id))
        .into_tuple::<Option<i64>>()
        .one(conn)
        .await?;
    Ok(total.flatten().unwrap_or(0))
}

pub(crate) async fn load_cart_lines<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Vec<CartLine>> {
    let rows = CartItems::find()
        .find_also_related(Products)
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(conn)
        .await?;

    rows.into_iter()
        .filter_map(|(line, product)| product.map(|product| (line, product)))
        .map(|(line, product)| {
            Ok(CartLine {
                id: line.id,
                quantity: line.quantity,
                line_total: priced(&product, line.quantity)?,
                product: product.into(),
            })
        })
        .collect()
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let items = load_cart_lines(&state.orm, user.user_id).await?;
    let total = sum_totals(items.iter().map(|line| line.line_total))?;
    let cart_count = items.iter().map(|line| i64::from(line.quantity)).sum();
    Ok(ApiResponse::ok(CartView {
        items,
        total,
        cart_count,
    }))
}

/// Insert the line with quantity 1, or bump an existing line by one.
async fn upsert_line<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<CartModel> {
    let line = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        product_id: Set(product_id),
        quantity: Set(1),
        created_at: NotSet,
    };

    let model = CartItems::insert(line)
        .on_conflict(
            OnConflict::columns([CartCol::UserId, CartCol::ProductId])
                .value(
                    CartCol::Quantity,
                    Expr::col((CartItems, CartCol::Quantity)).add(1),
                )
                .to_owned(),
        )
        .exec_with_returning(conn)
        .await?;
    Ok(model)
}

async fn item_total<C: ConnectionTrait>(conn: &C, product_id: Uuid, quantity: i32) -> AppResult<i64> {
    if quantity <= 0 {
        return Ok(0);
    }
    let product = Products::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    priced(&product, quantity)
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartMutation>> {
    let txn = state.orm.begin().await?;
    require_account(&txn, user).await?;

    let product = Products::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let line = upsert_line(&txn, user.user_id, product.id).await?;
    let cart_count = cart_count(&txn, user.user_id).await?;
    txn.commit().await?;

    tracing::debug!(
        user_id = %user.user_id,
        product_id = %product.id,
        quantity = line.quantity,
        "cart line added"
    );

    Ok(ApiResponse::success(
        "Added",
        CartMutation {
            cart_count,
            quantity: line.quantity,
            item_total: priced(&product, line.quantity)?,
            price: Some(product.price),
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    action: &str,
) -> AppResult<ApiResponse<CartMutation>> {
    let action: CartAction = action.parse()?;
    let txn = state.orm.begin().await?;

    let line = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Item not found in cart"))?;

    let quantity = match apply_step(line.quantity, action) {
        Some(next) => {
            let mut active: CartActive = line.into();
            active.quantity = Set(next);
            active.update(&txn).await?.quantity
        }
        None => {
            CartItems::delete_by_id(line.id).exec(&txn).await?;
            0
        }
    };

    let item_total = item_total(&txn, product_id, quantity).await?;
    let cart_count = cart_count(&txn, user.user_id).await?;
    txn.commit().await?;

    tracing::debug!(
        user_id = %user.user_id,
        product_id = %product_id,
        ?action,
        quantity,
        "cart line updated"
    );

    Ok(ApiResponse::success(
        "Updated",
        CartMutation {
            cart_count,
            quantity,
            item_total,
            price: None,
        },
        Some(Meta::empty()),
    ))
}

/// Set a line's quantity directly; zero or less removes it.
pub async fn set_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<CartMutation>> {
    let txn = state.orm.begin().await?;

    let line = CartItems::find()
        .filter(CartCol::Id.eq(item_id))
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Cart item not found"))?;
    let product_id = line.product_id;

    let quantity = if quantity > 0 {
        let mut active: CartActive = line.into();
        active.quantity = Set(quantity);
        active.update(&txn).await?.quantity
    } else {
        CartItems::delete_by_id(line.id).exec(&txn).await?;
        0
    };

    let item_total = item_total(&txn, product_id, quantity).await?;
    let cart_count = cart_count(&txn, user.user_id).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Updated",
        CartMutation {
            cart_count,
            quantity,
            item_total,
            price: None,
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_line(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartMutation>> {
    let txn = state.orm.begin().await?;

    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(item_id))
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Cart item not found"));
    }

    let cart_count = cart_count(&txn, user.user_id).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Removed from cart",
        CartMutation {
            cart_count,
            quantity: 0,
            item_total: 0,
            price: None,
        },
        Some(Meta::empty()),
    ))
}

/// Anonymous callers always see an empty cart.
pub async fn get_cart_count(
    state: &AppState,
    user: Option<&AuthUser>,
) -> AppResult<ApiResponse<CartCount>> {
    let count = match user {
        Some(user) => cart_count(&state.orm, user.user_id).await?,
        None => 0,
    };
    Ok(ApiResponse::ok(CartCount { count }))
}

pub async fn cart_map(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartMap>> {
    let cart: BTreeMap<String, i32> = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|line| (line.product_id.to_string(), line.quantity))
        .collect();
    Ok(ApiResponse::ok(CartMap { cart }))
}
