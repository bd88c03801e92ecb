use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle transitions recorded in the event store and published to the broker.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum GalleryEvent {
    // staff approved an artwork and its auction (re)started
    ArtworkApproved {
        artwork_id: i64,
        auction_id: i64,
        title: String,
        artist_id: i64,
        artist_email: String,
        end_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    // staff rejected an artwork; a live auction, if any, was cancelled
    ArtworkDenied {
        artwork_id: i64,
        title: String,
        artist_id: i64,
        artist_email: String,
        cancelled_auction_id: Option<i64>,
        timestamp: DateTime<Utc>,
    },
    BidPlaced {
        auction_id: i64,
        artwork_id: i64,
        title: String,
        bid_id: i64,
        bidder_id: i64,
        bidder_email: String,
        artist_email: String,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    },
    AuctionClosed {
        auction_id: i64,
        artwork_id: i64,
        title: String,
        artist_email: String,
        final_price: Decimal,
        bid_count: i64,
        timestamp: DateTime<Utc>,
    },
    ProfileUpdated {
        profile_id: i64,
        email: String,
        field: String,
        new_value: String,
        timestamp: DateTime<Utc>,
    },
}

impl GalleryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            GalleryEvent::ArtworkApproved { .. } => "ArtworkApproved",
            GalleryEvent::ArtworkDenied { .. } => "ArtworkDenied",
            GalleryEvent::BidPlaced { .. } => "BidPlaced",
            GalleryEvent::AuctionClosed { .. } => "AuctionClosed",
            GalleryEvent::ProfileUpdated { .. } => "ProfileUpdated",
        }
    }

    /// The aggregate whose version stream this event extends.
    pub fn aggregate(&self) -> (&'static str, i64) {
        match self {
            GalleryEvent::ArtworkApproved { artwork_id, .. }
            | GalleryEvent::ArtworkDenied { artwork_id, .. } => ("artwork", *artwork_id),
            GalleryEvent::BidPlaced { auction_id, .. }
            | GalleryEvent::AuctionClosed { auction_id, .. } => ("auction", *auction_id),
            GalleryEvent::ProfileUpdated { profile_id, .. } => ("profile", *profile_id),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            GalleryEvent::ArtworkApproved { timestamp, .. }
            | GalleryEvent::ArtworkDenied { timestamp, .. }
            | GalleryEvent::BidPlaced { timestamp, .. }
            | GalleryEvent::AuctionClosed { timestamp, .. }
            | GalleryEvent::ProfileUpdated { timestamp, .. } => *timestamp,
        }
    }
}
