// region:    --- Imports
use super::{queries, Page, PageRequest};
use crate::artwork::model::{Artwork, AuctionDuration, Category};
use crate::auction::model::{Auction, AuctionStatus};
use crate::bidding::model::Bid;
use crate::bidding::validation::calculate_price;
use crate::database::DatabaseManager;
use crate::error::{GalleryError, GalleryResult};
use crate::profile::model::UserProfile;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgConnection, Row};
use tracing::info;

// endregion: --- Imports

// region:    --- Read Models
/// An artwork in the public listing together with its running auction
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ArtworkListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub artwork: Artwork,
    pub recent_auction_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuctionDetail {
    pub artwork: Artwork,
    pub auction: Auction,
    pub current_price: Decimal,
    pub bid_count: i64,
    pub duration_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileInfo {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub winning_bid_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BidActivity {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub bid: Bid,
    pub artwork_id: i64,
    pub title: String,
}

/// An auction owned by the caller; `price` is the current price while active
/// and the final price once closed
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuctionSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub auction: Auction,
    pub title: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityDashboard {
    pub bids: Vec<BidActivity>,
    pub artworks: Vec<Artwork>,
    pub active_auctions: Vec<AuctionSummary>,
    pub closed_auctions: Vec<AuctionSummary>,
}
// endregion: --- Read Models

// region:    --- Query Handlers

/// Landing page artworks
pub async fn get_recent_artworks(db_manager: &DatabaseManager) -> GalleryResult<Vec<Artwork>> {
    info!("{:<12} --> Recent artworks", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let artworks = sqlx::query_as::<_, Artwork>(queries::GET_RECENT_ARTWORKS)
                    .fetch_all(&mut **tx)
                    .await?;
                Ok(artworks)
            })
        })
        .await
}

/// Approved artworks with an active auction, optionally narrowed to a category
pub async fn list_active_artworks(
    db_manager: &DatabaseManager,
    category: Option<Category>,
    page: Option<String>,
) -> GalleryResult<Page<ArtworkListing>> {
    info!(
        "{:<12} --> Artwork list category: {:?} page: {:?}",
        "Query", category, page
    );
    let category = category.map(|c| c.as_str().to_string());
    fetch_active_page(db_manager, category, None, page).await
}

/// Case-insensitive title search over the active listing
pub async fn search_active_artworks(
    db_manager: &DatabaseManager,
    query: Option<String>,
    page: Option<String>,
) -> GalleryResult<Page<ArtworkListing>> {
    let term = query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| GalleryError::Validation("Please enter a search term.".into()))?;
    info!("{:<12} --> Artwork search: {}", "Query", term);
    fetch_active_page(db_manager, None, Some(escape_like(&term)), page).await
}

async fn fetch_active_page(
    db_manager: &DatabaseManager,
    category: Option<String>,
    term: Option<String>,
    page: Option<String>,
) -> GalleryResult<Page<ArtworkListing>> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let total: i64 = sqlx::query_scalar(queries::COUNT_ACTIVE_ARTWORKS)
                    .bind(category.as_deref())
                    .bind(term.as_deref())
                    .fetch_one(&mut **tx)
                    .await?;
                let request = PageRequest::resolve(page.as_deref(), total);

                let items = sqlx::query_as::<_, ArtworkListing>(queries::LIST_ACTIVE_ARTWORKS)
                    .bind(category.as_deref())
                    .bind(term.as_deref())
                    .bind(super::PAGE_SIZE)
                    .bind(request.offset())
                    .fetch_all(&mut **tx)
                    .await?;
                Ok(Page::new(items, request, total))
            })
        })
        .await
}

/// The caller's artworks still awaiting review
pub async fn get_pending_artworks(
    db_manager: &DatabaseManager,
    artist_id: i64,
    page: Option<String>,
) -> GalleryResult<Page<Artwork>> {
    info!("{:<12} --> Pending artworks of {}", "Query", artist_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let total: i64 = sqlx::query_scalar(queries::COUNT_PENDING_ARTWORKS)
                    .bind(artist_id)
                    .fetch_one(&mut **tx)
                    .await?;
                let request = PageRequest::resolve(page.as_deref(), total);

                let items = sqlx::query_as::<_, Artwork>(queries::GET_PENDING_ARTWORKS)
                    .bind(artist_id)
                    .bind(super::PAGE_SIZE)
                    .bind(request.offset())
                    .fetch_all(&mut **tx)
                    .await?;
                Ok(Page::new(items, request, total))
            })
        })
        .await
}

/// Artwork, auction, current price and bid count for the auction page
pub async fn get_auction_detail(
    db_manager: &DatabaseManager,
    artwork_id: i64,
    auction_id: i64,
) -> GalleryResult<AuctionDetail> {
    info!(
        "{:<12} --> Auction detail artwork: {} auction: {}",
        "Query", artwork_id, auction_id
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION_FOR_ARTWORK)
                    .bind(auction_id)
                    .bind(artwork_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(GalleryError::NotFound {
                        entity: "Auction",
                        id: auction_id,
                    })?;
                let artwork = fetch_artwork(&mut **tx, artwork_id).await?;

                let stats = sqlx::query(queries::GET_BID_STATS)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?;
                let highest_bid: Option<Decimal> = stats.try_get("highest_bid")?;
                let bid_count: i64 = stats.try_get("bid_count")?;

                Ok(AuctionDetail {
                    current_price: calculate_price(auction.reserve_price, highest_bid),
                    duration_days: AuctionDuration::lookup(&auction.duration).days(),
                    artwork,
                    auction,
                    bid_count,
                })
            })
        })
        .await
}

pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> GalleryResult<Option<Decimal>> {
    info!("{:<12} --> Highest bid auction: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let highest: Option<Decimal> = sqlx::query_scalar(queries::GET_HIGHEST_BID)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(highest)
            })
        })
        .await
}

/// Current price: the highest bid, or the reserve price while there are no bids
pub async fn get_current_price(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> GalleryResult<Decimal> {
    info!("{:<12} --> Current price auction: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let auction = fetch_auction(&mut **tx, auction_id).await?;
                let highest: Option<Decimal> = sqlx::query_scalar(queries::GET_HIGHEST_BID)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(calculate_price(auction.reserve_price, highest))
            })
        })
        .await
}

/// Bids on an auction, highest first
pub async fn get_bid_history(
    db_manager: &DatabaseManager,
    artwork_id: i64,
    auction_id: i64,
) -> GalleryResult<Vec<Bid>> {
    info!("{:<12} --> Bid history auction: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTION_FOR_ARTWORK)
                    .bind(auction_id)
                    .bind(artwork_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(GalleryError::NotFound {
                        entity: "Auction",
                        id: auction_id,
                    })?;
                let bids = sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
                    .bind(auction_id)
                    .fetch_all(&mut **tx)
                    .await?;
                Ok(bids)
            })
        })
        .await
}

pub async fn get_profile_info(
    db_manager: &DatabaseManager,
    profile_id: i64,
) -> GalleryResult<ProfileInfo> {
    info!("{:<12} --> Profile id: {}", "Query", profile_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let profile = sqlx::query_as::<_, UserProfile>(queries::GET_PROFILE)
                    .bind(profile_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(GalleryError::NotFound {
                        entity: "Profile",
                        id: profile_id,
                    })?;
                let winning_bid_amount: Option<Decimal> =
                    sqlx::query_scalar(queries::GET_WINNING_BID_AMOUNT)
                        .bind(profile_id)
                        .fetch_one(&mut **tx)
                        .await?;
                Ok(ProfileInfo {
                    profile,
                    winning_bid_amount,
                })
            })
        })
        .await
}

/// Everything the caller has bid on, submitted, and is selling
pub async fn get_activity(
    db_manager: &DatabaseManager,
    profile_id: i64,
) -> GalleryResult<ActivityDashboard> {
    info!("{:<12} --> Activity of {}", "Query", profile_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let bids = sqlx::query_as::<_, BidActivity>(queries::GET_BIDDING_ACTIVITY)
                    .bind(profile_id)
                    .fetch_all(&mut **tx)
                    .await?;
                let artworks = sqlx::query_as::<_, Artwork>(queries::GET_ARTIST_ARTWORKS)
                    .bind(profile_id)
                    .fetch_all(&mut **tx)
                    .await?;
                let active_auctions =
                    fetch_artist_auctions(&mut **tx, profile_id, AuctionStatus::Active).await?;
                let closed_auctions =
                    fetch_artist_auctions(&mut **tx, profile_id, AuctionStatus::Closed).await?;
                Ok(ActivityDashboard {
                    bids,
                    artworks,
                    active_auctions,
                    closed_auctions,
                })
            })
        })
        .await
}

// endregion: --- Query Handlers

// region:    --- Helpers
async fn fetch_artwork(conn: &mut PgConnection, artwork_id: i64) -> GalleryResult<Artwork> {
    sqlx::query_as::<_, Artwork>(queries::GET_ARTWORK)
        .bind(artwork_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GalleryError::NotFound {
            entity: "Artwork",
            id: artwork_id,
        })
}

async fn fetch_auction(conn: &mut PgConnection, auction_id: i64) -> GalleryResult<Auction> {
    sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
        .bind(auction_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(GalleryError::NotFound {
            entity: "Auction",
            id: auction_id,
        })
}

async fn fetch_artist_auctions(
    conn: &mut PgConnection,
    artist_id: i64,
    status: AuctionStatus,
) -> GalleryResult<Vec<AuctionSummary>> {
    let summaries = sqlx::query_as::<_, AuctionSummary>(queries::GET_ARTIST_AUCTIONS)
        .bind(artist_id)
        .bind(status.as_str())
        .fetch_all(&mut *conn)
        .await?;
    Ok(summaries)
}

/// Treat `%`, `_` and `\` in a search term literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
// endregion: --- Helpers

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50% off_now"), "50\\% off\\_now");
        assert_eq!(escape_like("sunset"), "sunset");
    }
}
