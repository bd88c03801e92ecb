use crate::error::UnknownVariant;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Auction model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub artwork_id: i64,
    #[sqlx(try_from = "String")]
    pub status: AuctionStatus,
    pub is_active: bool,
    pub duration: String,
    pub reserve_price: Decimal,
    pub end_date: DateTime<Utc>,
    pub create_date: DateTime<Utc>,
}

impl Auction {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Pending,
    Active,
    Closed,
    Cancelled,
}

impl AuctionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuctionStatus::Pending => "pending",
            AuctionStatus::Active => "active",
            AuctionStatus::Closed => "closed",
            AuctionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for AuctionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AuctionStatus::Pending),
            "active" => Ok(AuctionStatus::Active),
            "closed" => Ok(AuctionStatus::Closed),
            "cancelled" => Ok(AuctionStatus::Cancelled),
            other => Err(UnknownVariant::new("auction status", other)),
        }
    }
}

impl TryFrom<String> for AuctionStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
