use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, models::Product};

/// Step applied to an existing cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Increment,
    Decrement,
}

impl FromStr for CartAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increment" => Ok(CartAction::Increment),
            "decrement" => Ok(CartAction::Decrement),
            _ => Err(AppError::invalid("Invalid action")),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// `increment` or `decrement`.
    pub action: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    /// Zero or less removes the line.
    pub quantity: i32,
}

/// Result of any cart mutation; `quantity` and `item_total` are 0 when the
/// line no longer exists.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartMutation {
    pub cart_count: i64,
    pub quantity: i32,
    pub item_total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: i64,
    pub cart_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartCount {
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartMap {
    /// Product id to quantity.
    pub cart: BTreeMap<String, i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        assert_eq!("increment".parse::<CartAction>().ok(), Some(CartAction::Increment));
        assert_eq!("decrement".parse::<CartAction>().ok(), Some(CartAction::Decrement));
    }

    #[test]
    fn rejects_unknown_action() {
        let err = "double".parse::<CartAction>().unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(ref m) if m == "Invalid action"));
        assert!("Increment".parse::<CartAction>().is_err());
    }
}
