//! Bid placement
//! The auction row stays locked from the highest-bid read to the insert,
//! so concurrent bids and the closure sweep are serialized per auction.
// region:    --- Imports
use super::model::Bid;
use super::validation::{validate_bid, BidContext};
use crate::auction::events::GalleryEvent;
use crate::auction::model::Auction;
use crate::database::DatabaseManager;
use crate::error::{GalleryError, GalleryResult};
use crate::event_store::{append_event, publish_committed, EventPublisher};
use crate::profile::commands::load_profile;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub amount: Decimal,
}

#[derive(Debug, FromRow)]
struct LockedAuction {
    #[sqlx(flatten)]
    auction: Auction,
    title: String,
    artist_id: i64,
    artist_email: String,
}

pub async fn handle_place_bid(
    bidder_id: i64,
    artwork_id: i64,
    auction_id: i64,
    cmd: PlaceBidCommand,
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
) -> GalleryResult<Bid> {
    info!(
        "{:<12} --> Bid on auction {} by {}: {}",
        "Command", auction_id, bidder_id, cmd.amount
    );
    let mut tx = db_manager.pool().begin().await?;
    let bidder = load_profile(&mut tx, bidder_id).await?;

    let locked = sqlx::query_as::<_, LockedAuction>(
        "SELECT a.id, a.artwork_id, a.status, a.is_active, a.duration, a.reserve_price,
                a.end_date, a.create_date, w.title, w.artist_id, p.email AS artist_email
         FROM auctions a
         JOIN artworks w ON w.id = a.artwork_id
         JOIN user_profiles p ON p.id = w.artist_id
         WHERE a.id = $1 AND a.artwork_id = $2
         FOR UPDATE OF a",
    )
    .bind(auction_id)
    .bind(artwork_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(GalleryError::NotFound {
        entity: "Auction",
        id: auction_id,
    })?;

    let highest_bid: Option<Decimal> =
        sqlx::query_scalar("SELECT MAX(amount) FROM bids WHERE auction_id = $1")
            .bind(auction_id)
            .fetch_one(&mut *tx)
            .await?;

    let now = Utc::now();
    let ctx = BidContext {
        auction: &locked.auction,
        artist_id: locked.artist_id,
        highest_bid,
    };
    if let Err(rejection) = validate_bid(&ctx, bidder_id, cmd.amount, now) {
        warn!(
            "{:<12} --> Bid on auction {} rejected: {}",
            "Command", auction_id, rejection
        );
        return Err(rejection.into());
    }

    let bid = sqlx::query_as::<_, Bid>(
        "INSERT INTO bids (auction_id, bidder_id, amount, bid_time)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(auction_id)
    .bind(bidder_id)
    .bind(cmd.amount)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let event = append_event(
        &mut tx,
        &GalleryEvent::BidPlaced {
            auction_id,
            artwork_id,
            title: locked.title,
            bid_id: bid.id,
            bidder_id,
            bidder_email: bidder.email,
            artist_email: locked.artist_email,
            amount: bid.amount,
            timestamp: now,
        },
    )
    .await?;

    tx.commit().await?;
    publish_committed(publisher, &[event]).await;

    info!(
        "{:<12} --> Bid {} accepted on auction {}",
        "Command", bid.id, auction_id
    );
    Ok(bid)
}
// endregion: --- Commands
