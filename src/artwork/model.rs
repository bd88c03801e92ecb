use crate::error::UnknownVariant;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

// region:    --- Artwork
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Artwork {
    pub id: i64,
    pub artist_id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub reserve_price: Decimal,
    #[sqlx(try_from = "String")]
    pub approval_status: ApprovalStatus,
    pub auction_duration: String,
    pub create_date: DateTime<Utc>,
}

impl Artwork {
    pub fn duration(&self) -> AuctionDuration {
        AuctionDuration::lookup(&self.auction_duration)
    }
}
// endregion: --- Artwork

// region:    --- Category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Painting,
    Sculpture,
    Photography,
    Posters,
    Portraits,
    Contemporary,
    Abstract,
    Popart,
    Classical,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Painting,
        Category::Sculpture,
        Category::Photography,
        Category::Posters,
        Category::Portraits,
        Category::Contemporary,
        Category::Abstract,
        Category::Popart,
        Category::Classical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Painting => "painting",
            Category::Sculpture => "sculpture",
            Category::Photography => "photography",
            Category::Posters => "posters",
            Category::Portraits => "portraits",
            Category::Contemporary => "contemporary",
            Category::Abstract => "abstract",
            Category::Popart => "popart",
            Category::Classical => "classical",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| UnknownVariant::new("category", s))
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
// endregion: --- Category

// region:    --- Approval Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(UnknownVariant::new("approval status", other)),
        }
    }
}

impl TryFrom<String> for ApprovalStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
// endregion: --- Approval Status

// region:    --- Auction Duration
/// Length of the bidding window opened when an artwork is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuctionDuration {
    #[default]
    ThreeDays,
    FiveDays,
    SevenDays,
    ThirtyDays,
    SixtyDays,
}

impl AuctionDuration {
    pub const ALL: [AuctionDuration; 5] = [
        AuctionDuration::ThreeDays,
        AuctionDuration::FiveDays,
        AuctionDuration::SevenDays,
        AuctionDuration::ThirtyDays,
        AuctionDuration::SixtyDays,
    ];

    pub fn days(self) -> i64 {
        match self {
            AuctionDuration::ThreeDays => 3,
            AuctionDuration::FiveDays => 5,
            AuctionDuration::SevenDays => 7,
            AuctionDuration::ThirtyDays => 30,
            AuctionDuration::SixtyDays => 60,
        }
    }

    /// Canonical stored form, the day count as a string.
    pub fn as_stored(self) -> String {
        self.days().to_string()
    }

    /// Accepts `"3"`, `"3_days"` and `"3 days"` spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        let count = raw
            .strip_suffix("_days")
            .or_else(|| raw.strip_suffix(" days"))
            .unwrap_or(raw.as_str())
            .trim();
        let days: i64 = count.parse().ok()?;
        AuctionDuration::ALL
            .into_iter()
            .find(|duration| duration.days() == days)
    }

    /// Resolves a stored duration, falling back to three days for unknown values.
    pub fn lookup(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| {
            warn!(
                "{:<12} --> Unrecognized auction duration {:?}, using 3 days",
                "Artwork", raw
            );
            AuctionDuration::ThreeDays
        })
    }

    pub fn end_date(self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + Duration::days(self.days())
    }
}
// endregion: --- Auction Duration

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_lookup_accepts_every_spelling() {
        assert_eq!(AuctionDuration::parse("3"), Some(AuctionDuration::ThreeDays));
        assert_eq!(AuctionDuration::parse("5_days"), Some(AuctionDuration::FiveDays));
        assert_eq!(AuctionDuration::parse("7 days"), Some(AuctionDuration::SevenDays));
        assert_eq!(AuctionDuration::parse("30"), Some(AuctionDuration::ThirtyDays));
        assert_eq!(AuctionDuration::parse("60_days"), Some(AuctionDuration::SixtyDays));
        assert_eq!(AuctionDuration::parse("4"), None);
        assert_eq!(AuctionDuration::parse("week"), None);
    }

    #[test]
    fn unknown_duration_falls_back_to_three_days() {
        assert_eq!(AuctionDuration::lookup("forever"), AuctionDuration::ThreeDays);
        assert_eq!(AuctionDuration::lookup(""), AuctionDuration::ThreeDays);
    }

    #[test]
    fn end_date_adds_whole_days() {
        let start = Utc::now();
        for (raw, days) in [("3", 3), ("5", 5), ("7", 7)] {
            let end = AuctionDuration::lookup(raw).end_date(start);
            assert_eq!(end - start, Duration::days(days));
        }
    }

    #[test]
    fn category_parsing_is_case_insensitive() {
        assert_eq!("Painting".parse::<Category>().unwrap(), Category::Painting);
        assert_eq!("popart".parse::<Category>().unwrap(), Category::Popart);
        assert!("sketch".parse::<Category>().is_err());
    }

    #[test]
    fn approval_status_round_trips_through_its_stored_form() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ApprovalStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ApprovalStatus>().is_err());
    }
}
// endregion: --- Tests
