use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, models::FavoriteFlavor};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddFlavorRequest {
    pub flavor_name: String,
}

impl AddFlavorRequest {
    pub fn validated_name(&self) -> Result<String, AppError> {
        let name = self.flavor_name.trim();
        if name.is_empty() {
            return Err(AppError::invalid("flavor_name is required"));
        }
        if name.chars().count() > 100 {
            return Err(AppError::invalid("flavor_name must be at most 100 characters"));
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FlavorList {
    pub items: Vec<FavoriteFlavor>,
}
