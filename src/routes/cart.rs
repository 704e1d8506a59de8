use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartCount, CartMap, CartMutation, CartView, SetQuantityRequest, UpdateQuantityRequest},
    error::{AppJson, AppResult},
    middleware::auth::{AuthUser, MaybeAuthUser},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list))
        .route("/count", get(cart_count))
        .route("/map", get(cart_map))
        .route("/products/{product_id}", post(add_to_cart))
        .route("/products/{product_id}/quantity", post(update_quantity))
        .route("/items/{item_id}", put(set_quantity).delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with totals for current user", body = ApiResponse<CartView>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::list_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cart/count",
    responses(
        (status = 200, description = "Sum of quantities; 0 for anonymous callers", body = ApiResponse<CartCount>)
    ),
    tag = "Cart"
)]
pub async fn cart_count(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> AppResult<Json<ApiResponse<CartCount>>> {
    let resp = cart_service::get_cart_count(&state, user.as_ref()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cart/map",
    responses(
        (status = 200, description = "Product id to quantity", body = ApiResponse<CartMap>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_map(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartMap>>> {
    let resp = cart_service::cart_map(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/products/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Line created or incremented", body = ApiResponse<CartMutation>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartMutation>>> {
    let resp = cart_service::add_to_cart(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/products/{product_id}/quantity",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity changed; quantity 0 means the line was removed", body = ApiResponse<CartMutation>),
        (status = 400, description = "Invalid action"),
        (status = 404, description = "Item not found in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartMutation>>> {
    let resp = cart_service::update_quantity(&state, &user, product_id, &payload.action).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity set, or line removed when quantity <= 0", body = ApiResponse<CartMutation>),
        (status = 400, description = "Quantity is not a number"),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
    AppJson(payload): AppJson<SetQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartMutation>>> {
    let resp = cart_service::set_quantity(&state, &user, item_id, payload.quantity).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Removed from cart", body = ApiResponse<CartMutation>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartMutation>>> {
    let resp = cart_service::remove_line(&state, &user, item_id).await?;
    Ok(Json(resp))
}
