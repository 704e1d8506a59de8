use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::cart::CartLine,
    models::{Address, Order, OrderItem},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub selected_address: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub total_amount: i64,
    pub item_count: usize,
    /// `false` when the order committed but the confirmation could not be sent.
    pub confirmation_sent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSummary {
    pub items: Vec<CartLine>,
    pub total: i64,
    pub addresses: Vec<Address>,
}
