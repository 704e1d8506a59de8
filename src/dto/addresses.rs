use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, models::Address};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub name: String,
    pub phone: String,
    pub pin_code: String,
    pub state: String,
    pub district: String,
    pub address: String,
    #[serde(default)]
    pub is_default: bool,
}

fn required(field: &str, value: &str, max: Option<usize>) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::invalid(format!("{field} is required")));
    }
    if let Some(max) = max {
        if value.chars().count() > max {
            return Err(AppError::invalid(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    Ok(value.to_string())
}

impl AddressRequest {
    /// Trim every field and enforce presence and length limits.
    pub fn validate(self) -> Result<AddressRequest, AppError> {
        Ok(AddressRequest {
            name: required("name", &self.name, Some(100))?,
            phone: required("phone", &self.phone, Some(15))?,
            pin_code: required("pin_code", &self.pin_code, Some(10))?,
            state: required("state", &self.state, Some(100))?,
            district: required("district", &self.district, Some(100))?,
            address: required("address", &self.address, None)?,
            is_default: self.is_default,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}
