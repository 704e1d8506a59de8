use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod profile;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/checkout", orders::checkout_route())
        .nest("/orders", orders::route())
        .nest("/addresses", addresses::router())
        .nest("/profile", profile::router())
        .nest("/favorites", favorites::router())
}
