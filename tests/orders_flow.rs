use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Set};
use storefront_api::{
    dto::orders::PlaceOrderRequest,
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::Entity as Products,
    },
    error::AppError,
    routes::params::OrderListQuery,
    services::{
        address_service, cart_service,
        order_service::{self, ADDRESS_NOT_FOUND, CART_EMPTY, NO_ADDRESS_SELECTED},
    },
};
use uuid::Uuid;

mod common;

fn place(address: Option<Uuid>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        selected_address: address,
    }
}

async fn order_count(state: &storefront_api::state::AppState, user_id: Uuid) -> anyhow::Result<u64> {
    Ok(Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .count(&state.orm)
        .await?)
}

// Cart of A x2 at 10 and B x1 at 25 discounted to 20 becomes one order of 40.
#[tokio::test]
async fn placing_an_order_snapshots_and_clears_the_cart() -> anyhow::Result<()> {
    let notifier = Arc::new(common::RecordingNotifier::default());
    let Some(state) = common::setup_state_with(notifier.clone()).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let address = common::create_address(&state, &user).await?;
    let a = common::create_product(&state, 10, None).await?;
    let b = common::create_product(&state, 25, Some(20)).await?;

    cart_service::add_to_cart(&state, &user, a.id).await?;
    cart_service::add_to_cart(&state, &user, a.id).await?;
    cart_service::add_to_cart(&state, &user, b.id).await?;

    let summary = order_service::checkout_summary(&state, &user).await?.data.unwrap();
    assert_eq!(summary.total, 40);
    assert_eq!(summary.addresses.len(), 1);

    let placed = order_service::place_order(&state, &user, place(Some(address.id))).await?;
    assert_eq!(placed.message, "Order placed");
    let placed = placed.data.unwrap();
    assert_eq!(placed.total_amount, 40);
    assert_eq!(placed.item_count, 2);
    assert!(placed.confirmation_sent);

    let order = order_service::get_order(&state, &user, placed.order_id).await?.data.unwrap();
    assert_eq!(order.order.status, "Placed");
    assert_eq!(order.order.address_id, Some(address.id));
    let mut totals: Vec<(i32, i64)> = order.items.iter().map(|i| (i.quantity, i.total_price)).collect();
    totals.sort();
    assert_eq!(totals, vec![(1, 20), (2, 20)]);

    let count = cart_service::get_cart_count(&state, Some(&user)).await?;
    assert_eq!(count.data.unwrap().count, 0);
    assert!(cart_service::list_cart(&state, &user).await?.data.unwrap().items.is_empty());

    let users_mail = storefront_api::entity::users::Entity::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .unwrap()
        .email;
    let note = notifier.last_to(&users_mail).expect("confirmation recorded");
    assert!(note.body.contains("0.40"));
    Ok(())
}

#[tokio::test]
async fn empty_cart_creates_no_order() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let address = common::create_address(&state, &user).await?;

    let err = order_service::place_order(&state, &user, place(Some(address.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(ref m) if m == CART_EMPTY));

    let err = order_service::checkout_summary(&state, &user).await.unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(_)));

    assert_eq!(order_count(&state, user.user_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn address_must_be_selected_and_owned() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let stranger = common::create_user(&state).await?;
    let foreign = common::create_address(&state, &stranger).await?;
    let product = common::create_product(&state, 500, None).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;

    let err = order_service::place_order(&state, &user, place(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::FailedPrecondition(ref m) if m == NO_ADDRESS_SELECTED));

    let err = order_service::place_order(&state, &user, place(Some(foreign.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m == ADDRESS_NOT_FOUND));

    // Nothing changed: no order, cart intact.
    assert_eq!(order_count(&state, user.user_id).await?, 0);
    let count = cart_service::get_cart_count(&state, Some(&user)).await?;
    assert_eq!(count.data.unwrap().count, 1);
    Ok(())
}

#[tokio::test]
async fn failed_confirmation_keeps_the_order() -> anyhow::Result<()> {
    let Some(state) = common::setup_state_with(Arc::new(common::FailingNotifier)).await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let address = common::create_address(&state, &user).await?;
    let product = common::create_product(&state, 700, None).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;

    let placed = order_service::place_order(&state, &user, place(Some(address.id)))
        .await?
        .data
        .unwrap();
    assert!(!placed.confirmation_sent);
    assert_eq!(order_count(&state, user.user_id).await?, 1);
    let count = cart_service::get_cart_count(&state, Some(&user)).await?;
    assert_eq!(count.data.unwrap().count, 0);
    Ok(())
}

#[tokio::test]
async fn order_survives_catalog_changes() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let address = common::create_address(&state, &user).await?;
    let repriced = common::create_product(&state, 100, None).await?;
    let retired = common::create_product(&state, 300, None).await?;
    cart_service::add_to_cart(&state, &user, repriced.id).await?;
    cart_service::add_to_cart(&state, &user, retired.id).await?;

    let placed = order_service::place_order(&state, &user, place(Some(address.id)))
        .await?
        .data
        .unwrap();
    assert_eq!(placed.total_amount, 400);

    let mut active = repriced.clone().into_active_model();
    active.price = Set(999);
    active.update(&state.orm).await?;
    Products::delete_by_id(retired.id).exec(&state.orm).await?;

    let order = order_service::get_order(&state, &user, placed.order_id).await?.data.unwrap();
    assert_eq!(order.order.total_amount, 400);
    let item_sum: i64 = order.items.iter().map(|i| i.total_price).sum();
    assert_eq!(item_sum, 400);

    let orphan = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(placed.order_id))
        .filter(OrderItemCol::ProductName.eq(retired.name.clone()))
        .one(&state.orm)
        .await?
        .expect("line for the deleted product");
    assert_eq!(orphan.product_id, None);
    assert_eq!(orphan.total_price, 300);
    Ok(())
}

#[tokio::test]
async fn concurrent_placement_creates_one_order() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let address = common::create_address(&state, &user).await?;
    let product = common::create_product(&state, 150, None).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;

    let (first, second) = tokio::join!(
        order_service::place_order(&state, &user, place(Some(address.id))),
        order_service::place_order(&state, &user, place(Some(address.id))),
    );

    let outcomes = [first, second];
    let placed: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].data.as_ref().unwrap().total_amount, 300);
    assert!(outcomes.iter().any(
        |r| matches!(r, Err(AppError::FailedPrecondition(m)) if m == CART_EMPTY)
    ));
    assert_eq!(order_count(&state, user.user_id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn orders_are_listed_newest_first_and_scoped_to_owner() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let stranger = common::create_user(&state).await?;
    let address = common::create_address(&state, &user).await?;
    let product = common::create_product(&state, 50, None).await?;

    let mut ids = Vec::new();
    for _ in 0..2 {
        cart_service::add_to_cart(&state, &user, product.id).await?;
        let placed = order_service::place_order(&state, &user, place(Some(address.id)))
            .await?
            .data
            .unwrap();
        ids.push(placed.order_id);
    }

    let listed = order_service::list_orders(&state, &user, OrderListQuery::default()).await?;
    assert_eq!(listed.meta.as_ref().unwrap().total, Some(2));
    let listed: Vec<Uuid> = listed.data.unwrap().items.iter().map(|o| o.order.id).collect();
    assert_eq!(listed, vec![ids[1], ids[0]]);

    let err = order_service::get_order(&state, &stranger, ids[0]).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn deleting_the_address_keeps_the_order() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let address = common::create_address(&state, &user).await?;
    let product = common::create_product(&state, 100, None).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;

    let placed = order_service::place_order(&state, &user, place(Some(address.id)))
        .await?
        .data
        .unwrap();
    address_service::delete_address(&state, &user, address.id).await?;

    let order = order_service::get_order(&state, &user, placed.order_id).await?.data.unwrap();
    assert_eq!(order.order.address_id, None);
    assert_eq!(order.order.total_amount, 100);
    assert_eq!(order.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn deleted_account_cannot_place_an_order() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let address = common::create_address(&state, &user).await?;
    common::delete_user(&state, &user).await?;

    let err = order_service::place_order(&state, &user, place(Some(address.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}
