use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    /// Quantity already in the caller's cart; absent for anonymous callers.
    pub cart_quantity: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct SearchHit {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
}
