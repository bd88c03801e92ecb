//! Artwork commands
//! 1. submission
//! 2. pending artwork edit
//! 3. staff approval (opens the auction)
//! 4. staff rejection (cancels a live auction)
//! 5. staff bulk delete
// region:    --- Imports
use super::model::{ApprovalStatus, Artwork, AuctionDuration, Category};
use crate::auction::events::GalleryEvent;
use crate::auction::lifecycle;
use crate::auction::model::Auction;
use crate::bidding::validation::MAX_AMOUNT;
use crate::database::DatabaseManager;
use crate::error::{GalleryError, GalleryResult};
use crate::event_store::{append_event, publish_committed, Event, EventPublisher};
use crate::profile::commands::{load_profile, require_staff};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubmitArtworkCommand {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    pub category: String,
    pub reserve_price: Decimal,
    #[serde(default)]
    pub auction_duration: Option<String>,
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct NewArtwork {
    pub title: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub reserve_price: Decimal,
    pub auction_duration: AuctionDuration,
}

impl SubmitArtworkCommand {
    pub fn validate(&self) -> GalleryResult<NewArtwork> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(GalleryError::Validation("Title is required.".into()));
        }
        if title.chars().count() > 255 {
            return Err(GalleryError::Validation(
                "Title is limited to 255 characters.".into(),
            ));
        }
        let image = self.image.trim();
        if image.is_empty() {
            return Err(GalleryError::Validation("Image is required.".into()));
        }
        let category: Category = self
            .category
            .parse()
            .map_err(|_| GalleryError::Validation(format!("Unknown category: {}", self.category)))?;
        if self.reserve_price < Decimal::ZERO {
            return Err(GalleryError::Validation(
                "Reserve price cannot be negative.".into(),
            ));
        }
        if self.reserve_price > MAX_AMOUNT {
            return Err(GalleryError::Validation(
                "Reserve price cannot exceed 99999999.99.".into(),
            ));
        }
        if self.reserve_price.normalize().scale() > 2 {
            return Err(GalleryError::Validation(
                "Reserve price cannot have more than two decimal places.".into(),
            ));
        }
        let auction_duration = match self.auction_duration.as_deref() {
            None => AuctionDuration::default(),
            Some(raw) => AuctionDuration::parse(raw).ok_or_else(|| {
                GalleryError::Validation(format!(
                    "Auction duration must be one of 3, 5, 7, 30 or 60 days, got {raw}"
                ))
            })?,
        };

        Ok(NewArtwork {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            image: image.to_string(),
            category,
            reserve_price: self.reserve_price,
            auction_duration,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditArtworkCommand {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeleteArtworksCommand {
    pub artwork_ids: Vec<i64>,
}

/// Result of an approval: the approved artwork and its live auction
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApprovalOutcome {
    pub artwork: Artwork,
    pub auction: Auction,
}

/// Result of a rejection: the rejected artwork and the auction it cancelled, if any
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RejectionOutcome {
    pub artwork: Artwork,
    pub cancelled_auction: Option<Auction>,
}

/// 1. submission
pub async fn handle_submit_artwork(
    artist_id: i64,
    cmd: SubmitArtworkCommand,
    auto_approve: bool,
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
) -> GalleryResult<Artwork> {
    info!("{:<12} --> Artwork submission by {}", "Command", artist_id);
    let new_artwork = cmd.validate()?;

    let mut tx = db_manager.pool().begin().await?;
    load_profile(&mut tx, artist_id).await?;

    let artwork = sqlx::query_as::<_, Artwork>(
        "INSERT INTO artworks (artist_id, title, description, image, category, reserve_price,
                               approval_status, auction_duration, create_date)
         VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8)
         RETURNING *",
    )
    .bind(artist_id)
    .bind(&new_artwork.title)
    .bind(&new_artwork.description)
    .bind(&new_artwork.image)
    .bind(new_artwork.category.as_str())
    .bind(new_artwork.reserve_price)
    .bind(new_artwork.auction_duration.as_stored())
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    if !auto_approve {
        tx.commit().await?;
        return Ok(artwork);
    }

    let (outcome, event) = approve_locked(&mut tx, artwork).await?;
    tx.commit().await?;
    publish_committed(publisher, &[event]).await;
    Ok(outcome.artwork)
}

/// 2. pending artwork edit
pub async fn handle_edit_pending_artwork(
    artist_id: i64,
    artwork_id: i64,
    cmd: EditArtworkCommand,
    db_manager: &DatabaseManager,
) -> GalleryResult<Artwork> {
    info!(
        "{:<12} --> Artwork {} field update: {}",
        "Command", artwork_id, cmd.field
    );
    let sql = match cmd.field.as_str() {
        "title" => {
            let title = cmd.value.trim();
            if title.is_empty() || title.chars().count() > 255 {
                return Err(GalleryError::Validation(
                    "Title must be between 1 and 255 characters.".into(),
                ));
            }
            "UPDATE artworks SET title = $1 WHERE id = $2 RETURNING *"
        }
        "description" => "UPDATE artworks SET description = $1 WHERE id = $2 RETURNING *",
        other => return Err(GalleryError::InvalidField(other.to_string())),
    };

    let mut tx = db_manager.pool().begin().await?;
    let artwork = lock_artwork(&mut tx, artwork_id).await?;
    if artwork.artist_id != artist_id {
        return Err(GalleryError::Forbidden(
            "Only the artist can edit this artwork.".into(),
        ));
    }
    if artwork.approval_status != ApprovalStatus::Pending {
        return Err(GalleryError::Conflict(
            "Only pending artworks can be edited.".into(),
        ));
    }

    let updated = sqlx::query_as::<_, Artwork>(sql)
        .bind(cmd.value.trim())
        .bind(artwork_id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(updated)
}

/// 3. staff approval
pub async fn handle_approve_artwork(
    staff_id: i64,
    artwork_id: i64,
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
) -> GalleryResult<ApprovalOutcome> {
    info!("{:<12} --> Approving artwork {}", "Command", artwork_id);
    let mut tx = db_manager.pool().begin().await?;
    require_staff(&mut tx, staff_id).await?;

    let artwork = lock_artwork(&mut tx, artwork_id).await?;
    let (outcome, event) = approve_locked(&mut tx, artwork).await?;

    tx.commit().await?;
    publish_committed(publisher, &[event]).await;
    Ok(outcome)
}

/// 4. staff rejection
pub async fn handle_reject_artwork(
    staff_id: i64,
    artwork_id: i64,
    db_manager: &DatabaseManager,
    publisher: &dyn EventPublisher,
) -> GalleryResult<RejectionOutcome> {
    info!("{:<12} --> Rejecting artwork {}", "Command", artwork_id);
    let mut tx = db_manager.pool().begin().await?;
    require_staff(&mut tx, staff_id).await?;

    lock_artwork(&mut tx, artwork_id).await?;
    let artwork = set_approval_status(&mut tx, artwork_id, ApprovalStatus::Rejected).await?;
    let cancelled_auction = lifecycle::cancel_live_auction(&mut tx, artwork_id).await?;
    let artist = load_profile(&mut tx, artwork.artist_id).await?;

    let event = append_event(
        &mut tx,
        &GalleryEvent::ArtworkDenied {
            artwork_id,
            title: artwork.title.clone(),
            artist_id: artist.id,
            artist_email: artist.email,
            cancelled_auction_id: cancelled_auction.as_ref().map(|auction| auction.id),
            timestamp: Utc::now(),
        },
    )
    .await?;

    tx.commit().await?;
    publish_committed(publisher, &[event]).await;
    Ok(RejectionOutcome {
        artwork,
        cancelled_auction,
    })
}

/// 5. staff bulk delete; auctions and bids go with their artworks
pub async fn handle_delete_artworks(
    staff_id: i64,
    cmd: DeleteArtworksCommand,
    db_manager: &DatabaseManager,
) -> GalleryResult<Vec<i64>> {
    info!(
        "{:<12} --> Deleting {} artwork(s)",
        "Command",
        cmd.artwork_ids.len()
    );
    if cmd.artwork_ids.is_empty() {
        return Err(GalleryError::Validation("No artworks selected.".into()));
    }

    let mut tx = db_manager.pool().begin().await?;
    require_staff(&mut tx, staff_id).await?;

    let deleted: Vec<i64> =
        sqlx::query_scalar("DELETE FROM artworks WHERE id = ANY($1) RETURNING id")
            .bind(&cmd.artwork_ids)
            .fetch_all(&mut *tx)
            .await?;

    tx.commit().await?;
    Ok(deleted)
}
// endregion: --- Commands

// region:    --- Helpers
async fn lock_artwork(conn: &mut PgConnection, artwork_id: i64) -> GalleryResult<Artwork> {
    sqlx::query_as::<_, Artwork>("SELECT * FROM artworks WHERE id = $1 FOR UPDATE")
        .bind(artwork_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GalleryError::NotFound {
            entity: "Artwork",
            id: artwork_id,
        })
}

async fn set_approval_status(
    conn: &mut PgConnection,
    artwork_id: i64,
    status: ApprovalStatus,
) -> GalleryResult<Artwork> {
    Ok(
        sqlx::query_as::<_, Artwork>(
            "UPDATE artworks SET approval_status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status.as_str())
        .bind(artwork_id)
        .fetch_one(&mut *conn)
        .await?,
    )
}

/// Approve an artwork whose row the caller has locked and (re)start its auction
async fn approve_locked(
    conn: &mut PgConnection,
    artwork: Artwork,
) -> GalleryResult<(ApprovalOutcome, Event)> {
    let now = Utc::now();
    let artwork = set_approval_status(conn, artwork.id, ApprovalStatus::Approved).await?;
    let auction = lifecycle::start_auction(conn, &artwork, now).await?;
    let artist = load_profile(conn, artwork.artist_id).await?;

    let event = append_event(
        conn,
        &GalleryEvent::ArtworkApproved {
            artwork_id: artwork.id,
            auction_id: auction.id,
            title: artwork.title.clone(),
            artist_id: artist.id,
            artist_email: artist.email,
            end_date: auction.end_date,
            timestamp: now,
        },
    )
    .await?;

    Ok((ApprovalOutcome { artwork, auction }, event))
}
// endregion: --- Helpers

// endregion: --- Tests
