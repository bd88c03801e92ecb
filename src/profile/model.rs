use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Profile model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub shipping_address: Option<String>,
    pub is_staff: bool,
    pub create_date: DateTime<Utc>,
}

/// Profile columns the field-update operation may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    ShippingAddress,
}

impl ProfileField {
    pub fn from_name(field: &str) -> Option<Self> {
        match field {
            "name" => Some(ProfileField::Name),
            "shipping_address" => Some(ProfileField::ShippingAddress),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::ShippingAddress => "shipping_address",
        }
    }

    pub(crate) fn update_sql(self) -> &'static str {
        match self {
            ProfileField::Name => {
                "UPDATE user_profiles SET name = $1 WHERE id = $2 RETURNING *"
            }
            ProfileField::ShippingAddress => {
                "UPDATE user_profiles SET shipping_address = $1 WHERE id = $2 RETURNING *"
            }
        }
    }
}
