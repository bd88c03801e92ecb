//! Auction state transitions driven by artwork approval, rejection and the closure sweep
// region:    --- Imports
use super::events::GalleryEvent;
use super::model::{Auction, AuctionStatus};
use crate::artwork::model::Artwork;
use crate::bidding::validation::calculate_price;
use crate::database::DatabaseManager;
use crate::error::{GalleryError, GalleryResult};
use crate::event_store::{append_event, publish_committed, EventPublisher};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use tracing::{debug, info};

// endregion: --- Imports

/// Advisory lock key serializing closure sweeps across service instances
pub const CLOSURE_SWEEP_LOCK: i64 = 0x0047_414c_4c45_5259;

// region:    --- Approval / Rejection
/// Open the artwork's auction, or restart it if one already exists
pub async fn start_auction(
    conn: &mut PgConnection,
    artwork: &Artwork,
    now: DateTime<Utc>,
) -> GalleryResult<Auction> {
    let duration = artwork.duration();
    let end_date = duration.end_date(now);

    let auction = sqlx::query_as::<_, Auction>(
        "INSERT INTO auctions (artwork_id, status, is_active, duration, reserve_price, end_date, create_date)
         VALUES ($1, 'active', TRUE, $2, $3, $4, $5)
         ON CONFLICT (artwork_id) DO UPDATE
         SET status = 'active', is_active = TRUE, duration = EXCLUDED.duration,
             reserve_price = EXCLUDED.reserve_price, end_date = EXCLUDED.end_date,
             create_date = EXCLUDED.create_date
         RETURNING *",
    )
    .bind(artwork.id)
    .bind(duration.as_stored())
    .bind(artwork.reserve_price)
    .bind(end_date)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    info!(
        "{:<12} --> Auction {} active for artwork {} until {}",
        "Lifecycle", auction.id, artwork.id, auction.end_date
    );
    Ok(auction)
}

/// Cancel the artwork's auction if it is still pending or active; never creates one
pub async fn cancel_live_auction(
    conn: &mut PgConnection,
    artwork_id: i64,
) -> GalleryResult<Option<Auction>> {
    let cancelled = sqlx::query_as::<_, Auction>(
        "UPDATE auctions SET status = 'cancelled', is_active = FALSE
         WHERE artwork_id = $1 AND status IN ('pending', 'active')
         RETURNING *",
    )
    .bind(artwork_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(auction) = &cancelled {
        info!(
            "{:<12} --> Auction {} cancelled for artwork {}",
            "Lifecycle", auction.id, artwork_id
        );
    }
    Ok(cancelled)
}
// endregion: --- Approval / Rejection

// region:    --- Closure Sweep
#[derive(Debug, FromRow)]
struct ClosedAuctionRow {
    auction_id: i64,
    artwork_id: i64,
    title: String,
    artist_email: String,
    reserve_price: Decimal,
    highest_bid: Option<Decimal>,
    bid_count: i64,
}

/// Close every active auction whose end date has passed.
/// Returns the closed auction ids; an empty list when another sweep holds the lock.
pub async fn close_expired_auctions(
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
    now: DateTime<Utc>,
) -> GalleryResult<Vec<i64>> {
    let mut tx = db_manager.pool().begin().await?;

    let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
        .bind(CLOSURE_SWEEP_LOCK)
        .fetch_one(&mut *tx)
        .await?;
    if !acquired {
        debug!("{:<12} --> Another sweep is running, skipping", "Lifecycle");
        tx.rollback().await?;
        return Ok(Vec::new());
    }

    // Waits on rows locked by an in-flight bid and re-checks them before closing.
    let closed_ids: Vec<i64> = sqlx::query_scalar(
        "UPDATE auctions SET status = 'closed', is_active = FALSE
         WHERE status = 'active' AND end_date <= $1
         RETURNING id",
    )
    .bind(now)
    .fetch_all(&mut *tx)
    .await?;
    if closed_ids.is_empty() {
        tx.commit().await?;
        return Ok(Vec::new());
    }

    // Separate statement: its snapshot includes bids committed while the UPDATE waited.
    let closed = sqlx::query_as::<_, ClosedAuctionRow>(
        "SELECT a.id AS auction_id, a.artwork_id, w.title, p.email AS artist_email,
                a.reserve_price,
                (SELECT MAX(b.amount) FROM bids b WHERE b.auction_id = a.id) AS highest_bid,
                (SELECT COUNT(*) FROM bids b WHERE b.auction_id = a.id) AS bid_count
         FROM auctions a
         JOIN artworks w ON w.id = a.artwork_id
         JOIN user_profiles p ON p.id = w.artist_id
         WHERE a.id = ANY($1)
         ORDER BY a.id",
    )
    .bind(&closed_ids)
    .fetch_all(&mut *tx)
    .await?;

    let mut events = Vec::with_capacity(closed.len());
    for row in &closed {
        let event = GalleryEvent::AuctionClosed {
            auction_id: row.auction_id,
            artwork_id: row.artwork_id,
            title: row.title.clone(),
            artist_email: row.artist_email.clone(),
            final_price: calculate_price(row.reserve_price, row.highest_bid),
            bid_count: row.bid_count,
            timestamp: now,
        };
        events.push(append_event(&mut tx, &event).await?);
    }

    tx.commit().await?;
    publish_committed(publisher, &events).await;

    if !closed.is_empty() {
        info!("{:<12} --> Closed {} expired auction(s)", "Lifecycle", closed.len());
    }
    Ok(closed.iter().map(|row| row.auction_id).collect())
}
// endregion: --- Closure Sweep

// region:    --- Removal
/// Let an artist delete one of their own auctions once it is closed
pub async fn delete_closed_auction(
    db_manager: &DatabaseManager,
    artist_id: i64,
    artwork_id: i64,
    auction_id: i64,
) -> GalleryResult<()> {
    let mut tx = db_manager.pool().begin().await?;

    let auction = sqlx::query_as::<_, Auction>(
        "SELECT a.* FROM auctions a
         JOIN artworks w ON w.id = a.artwork_id
         WHERE a.id = $1 AND a.artwork_id = $2 AND w.artist_id = $3
         FOR UPDATE OF a",
    )
    .bind(auction_id)
    .bind(artwork_id)
    .bind(artist_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(GalleryError::NotFound {
        entity: "Auction",
        id: auction_id,
    })?;

    if auction.status != AuctionStatus::Closed {
        return Err(GalleryError::Conflict(
            "Only closed auctions can be deleted.".into(),
        ));
    }

    sqlx::query("DELETE FROM auctions WHERE id = $1")
        .bind(auction_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("{:<12} --> Auction {} deleted by artist {}", "Lifecycle", auction_id, artist_id);
    Ok(())
}
// endregion: --- Removal
