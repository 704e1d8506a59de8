//! Checkout and order placement.
//!
//! Placing an order converts the whole cart into an immutable order inside a
//! single transaction that holds `FOR UPDATE` locks on the user's cart lines.
//! The confirmation notification runs only after commit and can never undo
//! the order.

use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutSummary, OrderList, OrderWithItems, PlaceOrderRequest, PlacedOrder},
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, STATUS_PLACED},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, OrderItem},
    notify::{self, ConfirmationLine},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        cart_service::{load_cart_lines, priced, sum_totals},
        profile_service::require_account,
    },
    state::AppState,
};

pub const NO_ADDRESS_SELECTED: &str = "No address selected";
pub const ADDRESS_NOT_FOUND: &str = "Address not found";
pub const CART_EMPTY: &str = "Cart is empty";

/// One cart line frozen at placement time.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LineSnapshot {
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    total_price: i64,
}

pub async fn checkout_summary(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CheckoutSummary>> {
    let items = load_cart_lines(&state.orm, user.user_id).await?;
    if items.is_empty() {
        return Err(AppError::precondition(
            "Your cart is empty. Add items to proceed to checkout.",
        ));
    }

    let addresses = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_desc(AddressCol::IsDefault)
        .order_by_asc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    let total = sum_totals(items.iter().map(|line| line.line_total))?;
    Ok(ApiResponse::ok(CheckoutSummary {
        items,
        total,
        addresses,
    }))
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlacedOrder>> {
    let address_id = payload
        .selected_address
        .ok_or_else(|| AppError::precondition(NO_ADDRESS_SELECTED))?;

    tracing::debug!(user_id = %user.user_id, %address_id, "placing order");
    let txn = state.orm.begin().await?;
    require_account(&txn, user).await?;

    let address = Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(address_id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found(ADDRESS_NOT_FOUND))?;

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    // Checked after the lock: a concurrent placement may have emptied the cart.
    if lines.is_empty() {
        return Err(AppError::precondition(CART_EMPTY));
    }

    let product_ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut snapshots = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = products.get(&line.product_id).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "cart line {} references missing product {}",
                line.id,
                line.product_id
            ))
        })?;
        snapshots.push(LineSnapshot {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            total_price: priced(product, line.quantity)?,
        });
    }
    let total_amount = sum_totals(snapshots.iter().map(|s| s.total_price))?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        address_id: Set(Some(address.id)),
        status: Set(STATUS_PLACED.to_string()),
        total_amount: Set(total_amount),
        ordered_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let items: Vec<OrderItemActive> = snapshots
        .iter()
        .map(|s| OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(s.product_id)),
            product_name: Set(s.product_name.clone()),
            quantity: Set(s.quantity),
            total_price: Set(s.total_price),
            created_at: NotSet,
        })
        .collect();
    OrderItems::insert_many(items).exec(&txn).await?;

    let line_ids: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
    CartItems::delete_many()
        .filter(CartCol::Id.is_in(line_ids))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total_amount,
        items = snapshots.len(),
        "order placed"
    );

    let confirmation_sent =
        match send_confirmation(state, user, order.id, &snapshots, total_amount).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(order_id = %order.id, error = %err, "order confirmation not sent");
                false
            }
        };

    Ok(ApiResponse::success(
        "Order placed",
        PlacedOrder {
            order_id: order.id,
            total_amount,
            item_count: snapshots.len(),
            confirmation_sent,
        },
        Some(Meta::empty()),
    ))
}

async fn send_confirmation(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    snapshots: &[LineSnapshot],
    total: i64,
) -> anyhow::Result<()> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} vanished after placing an order", user.user_id))?;

    let lines: Vec<ConfirmationLine<'_>> = snapshots
        .iter()
        .map(|s| ConfirmationLine {
            product_name: &s.product_name,
            quantity: s.quantity,
            total_price: s.total_price,
        })
        .collect();

    let note = notify::order_confirmation(&account.email, &account.username, order_id, &lines, total);
    state.notifier.send(note).await?;
    Ok(())
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::OrderedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::OrderedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if !order_ids.is_empty() {
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(order_ids))
            .order_by_asc(OrderItemCol::CreatedAt)
            .all(&state.orm)
            .await?
        {
            items_by_order
                .entry(item.order_id)
                .or_default()
                .push(item.into());
        }
    }

    let items = orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            order: order.into(),
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::paged("Ok", OrderList { items }, meta))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(ApiResponse::ok(OrderWithItems {
        order: order.into(),
        items,
    }))
}
