use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{addresses, favorite_flavors, order_items, orders, products, users};

/// Public view of an account; the password hash never leaves the service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Sticks,
    Cones,
    Tubs,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Sticks => "sticks",
            ProductCategory::Cones => "cones",
            ProductCategory::Tubs => "tubs",
        }
    }
}

/// Prices are in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub discounted_price: Option<i64>,
    pub unit_price: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub pin_code: String,
    pub state: String,
    pub district: String,
    pub address: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Option<Uuid>,
    pub status: String,
    pub total_amount: i64,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    /// `None` once the product has been removed from the catalogue.
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub total_price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavoriteFlavor {
    pub id: Uuid,
    pub flavor_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            phone: model.phone,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            unit_price: model.unit_price(),
            name: model.name,
            price: model.price,
            discounted_price: model.discounted_price,
            category: model.category,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            pin_code: model.pin_code,
            state: model.state,
            district: model.district,
            address: model.address,
            is_default: model.is_default,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            address_id: model.address_id,
            status: model.status,
            total_amount: model.total_amount,
            ordered_at: model.ordered_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            total_price: model.total_price,
        }
    }
}

impl From<favorite_flavors::Model> for FavoriteFlavor {
    fn from(model: favorite_flavors::Model) -> Self {
        Self {
            id: model.id,
            flavor_name: model.flavor_name,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
