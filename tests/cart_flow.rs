use storefront_api::{error::AppError, services::cart_service};
use uuid::Uuid;

mod common;

#[tokio::test]
async fn adding_twice_merges_into_one_line() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 300, Some(250)).await?;

    let first = cart_service::add_to_cart(&state, &user, product.id).await?;
    let first = first.data.unwrap();
    assert_eq!(first.quantity, 1);
    assert_eq!(first.price, Some(300));

    let second = cart_service::add_to_cart(&state, &user, product.id).await?;
    assert_eq!(second.message, "Added");
    let second = second.data.unwrap();
    assert_eq!(second.quantity, 2);
    assert_eq!(second.item_total, 500);
    assert_eq!(second.cart_count, 2);

    let cart = cart_service::list_cart(&state, &user).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.total, 500);
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_do_not_lose_updates() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 100, None).await?;

    let (a, b, c) = tokio::join!(
        cart_service::add_to_cart(&state, &user, product.id),
        cart_service::add_to_cart(&state, &user, product.id),
        cart_service::add_to_cart(&state, &user, product.id),
    );
    a?;
    b?;
    c?;

    let map = cart_service::cart_map(&state, &user).await?.data.unwrap();
    assert_eq!(map.cart.get(&product.id.to_string()), Some(&3));
    Ok(())
}

#[tokio::test]
async fn adding_unknown_product_is_not_found() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;

    let err = cart_service::add_to_cart(&state, &user, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let count = cart_service::get_cart_count(&state, Some(&user)).await?;
    assert_eq!(count.data.unwrap().count, 0);
    Ok(())
}

#[tokio::test]
async fn decrement_to_zero_removes_the_line() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 200, None).await?;

    cart_service::add_to_cart(&state, &user, product.id).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;

    let down = cart_service::update_quantity(&state, &user, product.id, "decrement")
        .await?
        .data
        .unwrap();
    assert_eq!(down.quantity, 1);
    assert_eq!(down.item_total, 200);
    assert_eq!(down.cart_count, 1);

    let gone = cart_service::update_quantity(&state, &user, product.id, "decrement")
        .await?
        .data
        .unwrap();
    assert_eq!(gone.quantity, 0);
    assert_eq!(gone.item_total, 0);
    assert_eq!(gone.cart_count, 0);

    let cart = cart_service::list_cart(&state, &user).await?.data.unwrap();
    assert!(cart.items.is_empty());

    let err = cart_service::update_quantity(&state, &user, product.id, "increment")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn unknown_action_is_rejected_without_change() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 200, None).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;

    let err = cart_service::update_quantity(&state, &user, product.id, "double")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(ref m) if m == "Invalid action"));

    let map = cart_service::cart_map(&state, &user).await?.data.unwrap();
    assert_eq!(map.cart.get(&product.id.to_string()), Some(&1));
    Ok(())
}

#[tokio::test]
async fn set_quantity_and_remove_line() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let other = common::create_user(&state).await?;
    let cheap = common::create_product(&state, 100, None).await?;
    let dear = common::create_product(&state, 1000, Some(800)).await?;

    cart_service::add_to_cart(&state, &user, cheap.id).await?;
    cart_service::add_to_cart(&state, &user, dear.id).await?;
    let cart = cart_service::list_cart(&state, &user).await?.data.unwrap();
    let cheap_line = cart.items.iter().find(|l| l.product.id == cheap.id).unwrap().id;
    let dear_line = cart.items.iter().find(|l| l.product.id == dear.id).unwrap().id;

    let set = cart_service::set_quantity(&state, &user, dear_line, 3)
        .await?
        .data
        .unwrap();
    assert_eq!(set.quantity, 3);
    assert_eq!(set.item_total, 2400);
    assert_eq!(set.cart_count, 4);

    // Another user's line is invisible.
    let err = cart_service::remove_line(&state, &other, cheap_line)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let zeroed = cart_service::set_quantity(&state, &user, cheap_line, 0)
        .await?
        .data
        .unwrap();
    assert_eq!(zeroed.quantity, 0);
    assert_eq!(zeroed.cart_count, 3);

    let removed = cart_service::remove_line(&state, &user, dear_line).await?;
    assert_eq!(removed.message, "Removed from cart");
    assert_eq!(removed.data.unwrap().cart_count, 0);

    let map = cart_service::cart_map(&state, &user).await?.data.unwrap();
    assert!(map.cart.is_empty());
    Ok(())
}

#[tokio::test]
async fn anonymous_count_is_zero() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let count = cart_service::get_cart_count(&state, None).await?;
    assert_eq!(count.data.unwrap().count, 0);
    Ok(())
}

#[tokio::test]
async fn deleted_account_cannot_add_to_cart() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 100, None).await?;
    common::delete_user(&state, &user).await?;

    let err = cart_service::add_to_cart(&state, &user, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn concurrent_decrements_do_not_lose_updates() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state).await?;
    let product = common::create_product(&state, 100, None).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;
    cart_service::add_to_cart(&state, &user, product.id).await?;

    let (a, b) = tokio::join!(
        cart_service::update_quantity(&state, &user, product.id, "decrement"),
        cart_service::update_quantity(&state, &user, product.id, "decrement"),
    );
    let mut quantities = vec![a?.data.unwrap().quantity, b?.data.unwrap().quantity];
    quantities.sort();
    assert_eq!(quantities, vec![0, 1]);

    let count = cart_service::get_cart_count(&state, Some(&user)).await?;
    assert_eq!(count.data.unwrap().count, 0);
    let map = cart_service::cart_map(&state, &user).await?.data.unwrap();
    assert!(map.cart.is_empty());
    Ok(())
}
