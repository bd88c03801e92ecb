/// Most recently submitted approved artworks for the landing page
pub const GET_RECENT_ARTWORKS: &str = r#"
    SELECT * FROM artworks
    WHERE approval_status = 'approved'
    ORDER BY create_date DESC, id DESC
    LIMIT 10
"#;

/// Approved artworks with an active auction; $1 category and $2 title search are optional
pub const LIST_ACTIVE_ARTWORKS: &str = r#"
    SELECT w.*, a.id AS recent_auction_id
    FROM artworks w
    JOIN auctions a ON a.artwork_id = w.id
    WHERE w.approval_status = 'approved'
      AND a.status = 'active'
      AND ($1::TEXT IS NULL OR w.category = $1)
      AND ($2::TEXT IS NULL OR w.title ILIKE '%' || $2 || '%')
    ORDER BY w.create_date DESC, w.id DESC
    LIMIT $3 OFFSET $4
"#;

pub const COUNT_ACTIVE_ARTWORKS: &str = r#"
    SELECT COUNT(*)
    FROM artworks w
    JOIN auctions a ON a.artwork_id = w.id
    WHERE w.approval_status = 'approved'
      AND a.status = 'active'
      AND ($1::TEXT IS NULL OR w.category = $1)
      AND ($2::TEXT IS NULL OR w.title ILIKE '%' || $2 || '%')
"#;

pub const GET_PENDING_ARTWORKS: &str = r#"
    SELECT * FROM artworks
    WHERE artist_id = $1 AND approval_status = 'pending'
    ORDER BY create_date DESC, id DESC
    LIMIT $2 OFFSET $3
"#;

pub const COUNT_PENDING_ARTWORKS: &str =
    "SELECT COUNT(*) FROM artworks WHERE artist_id = $1 AND approval_status = 'pending'";

pub const GET_ARTWORK: &str = "SELECT * FROM artworks WHERE id = $1";

pub const GET_AUCTION: &str = "SELECT * FROM auctions WHERE id = $1";

pub const GET_AUCTION_FOR_ARTWORK: &str =
    "SELECT * FROM auctions WHERE id = $1 AND artwork_id = $2";

/// Highest bid and number of bids on an auction
pub const GET_BID_STATS: &str =
    "SELECT MAX(amount) AS highest_bid, COUNT(*) AS bid_count FROM bids WHERE auction_id = $1";

pub const GET_HIGHEST_BID: &str = "SELECT MAX(amount) FROM bids WHERE auction_id = $1";

/// Bid history, highest bid first
pub const GET_BID_HISTORY: &str = r#"
    SELECT * FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, bid_time ASC
"#;

pub const GET_PROFILE: &str = "SELECT * FROM user_profiles WHERE id = $1";

/// The caller's highest bid on an approved artwork
pub const GET_WINNING_BID_AMOUNT: &str = r#"
    SELECT MAX(b.amount)
    FROM bids b
    JOIN auctions a ON a.id = b.auction_id
    JOIN artworks w ON w.id = a.artwork_id
    WHERE b.bidder_id = $1 AND w.approval_status = 'approved'
"#;

pub const GET_BIDDING_ACTIVITY: &str = r#"
    SELECT b.*, w.id AS artwork_id, w.title
    FROM bids b
    JOIN auctions a ON a.id = b.auction_id
    JOIN artworks w ON w.id = a.artwork_id
    WHERE b.bidder_id = $1
    ORDER BY b.bid_time DESC
"#;

pub const GET_ARTIST_ARTWORKS: &str =
    "SELECT * FROM artworks WHERE artist_id = $1 ORDER BY create_date DESC, id DESC";

/// The artist's auctions in status $2, priced at the highest bid or the reserve
pub const GET_ARTIST_AUCTIONS: &str = r#"
    SELECT a.*, w.title,
           COALESCE((SELECT MAX(b.amount) FROM bids b WHERE b.auction_id = a.id), a.reserve_price) AS price
    FROM auctions a
    JOIN artworks w ON w.id = a.artwork_id
    WHERE w.artist_id = $1 AND a.status = $2
    ORDER BY a.end_date DESC
"#;
