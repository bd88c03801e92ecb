//! Bid acceptance rules, free of any storage concern.
//! Every rule has its own rejection so callers can report exactly what failed.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// endregion: --- Imports

/// Largest amount a NUMERIC(10,2) column holds: 99 999 999.99
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2);

// region:    --- Rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BidRejection {
    #[error("Auction is not active.")]
    AuctionNotActive,
    #[error("Auction has already ended.")]
    AuctionEnded,
    #[error("Artists cannot bid on their own artwork.")]
    OwnArtwork,
    #[error("Bid amount must be a positive number.")]
    NotPositive,
    #[error("Bid amount cannot have more than two decimal places.")]
    TooManyDecimals,
    #[error("Bid amount cannot exceed 99999999.99.")]
    TooLarge,
    #[error("Bid amount must be higher than the reserve price.")]
    BelowReserve,
    #[error("Bid amount is not higher than the current highest bid.")]
    NotAboveHighest,
}

impl BidRejection {
    pub fn code(self) -> &'static str {
        match self {
            BidRejection::AuctionNotActive => "AUCTION_NOT_ACTIVE",
            BidRejection::AuctionEnded => "ALREADY_ENDED",
            BidRejection::OwnArtwork => "OWN_ARTWORK",
            BidRejection::NotPositive => "NOT_POSITIVE",
            BidRejection::TooManyDecimals => "TOO_MANY_DECIMALS",
            BidRejection::TooLarge => "TOO_LARGE",
            BidRejection::BelowReserve => "BELOW_RESERVE",
            BidRejection::NotAboveHighest => "LOW_BID",
        }
    }
}
// endregion: --- Rejections

// region:    --- Validation
/// What the bid is checked against, read under the auction row lock.
#[derive(Debug, Clone, Copy)]
pub struct BidContext<'a> {
    pub auction: &'a Auction,
    pub artist_id: i64,
    pub highest_bid: Option<Decimal>,
}

pub fn validate_bid(
    ctx: &BidContext<'_>,
    bidder_id: i64,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    if ctx.auction.status != AuctionStatus::Active {
        return Err(BidRejection::AuctionNotActive);
    }
    if ctx.auction.has_ended(now) {
        return Err(BidRejection::AuctionEnded);
    }
    if bidder_id == ctx.artist_id {
        return Err(BidRejection::OwnArtwork);
    }
    if amount <= Decimal::ZERO {
        return Err(BidRejection::NotPositive);
    }
    if amount.normalize().scale() > 2 {
        return Err(BidRejection::TooManyDecimals);
    }
    if amount > MAX_AMOUNT {
        return Err(BidRejection::TooLarge);
    }
    if amount < ctx.auction.reserve_price {
        return Err(BidRejection::BelowReserve);
    }
    match ctx.highest_bid {
        Some(highest) if amount <= highest => Err(BidRejection::NotAboveHighest),
        _ => Ok(()),
    }
}

/// Current price: the highest bid, or the reserve price while nobody has bid.
pub fn calculate_price(reserve_price: Decimal, highest_bid: Option<Decimal>) -> Decimal {
    highest_bid.unwrap_or(reserve_price)
}
// endregion: --- Validation

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    const ARTIST: i64 = 1;
    const BUYER: i64 = 2;

    fn auction(status: AuctionStatus, reserve: Decimal, end_in: Duration) -> Auction {
        let now = Utc::now();
        Auction {
            id: 10,
            artwork_id: 20,
            status,
            is_active: status == AuctionStatus::Active,
            duration: "3".into(),
            reserve_price: reserve,
            end_date: now + end_in,
            create_date: now,
        }
    }

    fn check(auction: &Auction, highest: Option<Decimal>, bidder: i64, amount: Decimal) -> Result<(), BidRejection> {
        let ctx = BidContext {
            auction,
            artist_id: ARTIST,
            highest_bid: highest,
        };
        validate_bid(&ctx, bidder, amount, Utc::now())
    }

    #[test]
    fn reserve_and_highest_bid_scenario() {
        let live = auction(AuctionStatus::Active, dec!(100.00), Duration::days(3));

        assert_eq!(check(&live, None, BUYER, dec!(90)), Err(BidRejection::BelowReserve));
        assert_eq!(check(&live, None, BUYER, dec!(150)), Ok(()));
        assert_eq!(
            check(&live, Some(dec!(150)), BUYER, dec!(120)),
            Err(BidRejection::NotAboveHighest)
        );
    }

    #[test]
    fn bid_equal_to_reserve_is_accepted_without_prior_bids() {
        let live = auction(AuctionStatus::Active, dec!(100.00), Duration::days(3));
        assert_eq!(check(&live, None, BUYER, dec!(100)), Ok(()));
    }

    #[test]
    fn bid_equal_to_highest_is_rejected() {
        let live = auction(AuctionStatus::Active, dec!(100.00), Duration::days(3));
        assert_eq!(
            check(&live, Some(dec!(150.00)), BUYER, dec!(150)),
            Err(BidRejection::NotAboveHighest)
        );
        assert_eq!(check(&live, Some(dec!(150.00)), BUYER, dec!(150.01)), Ok(()));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let live = auction(AuctionStatus::Active, dec!(0), Duration::days(3));
        assert_eq!(check(&live, None, BUYER, dec!(0)), Err(BidRejection::NotPositive));
        assert_eq!(check(&live, None, BUYER, dec!(-5)), Err(BidRejection::NotPositive));
    }

    #[test]
    fn sub_cent_amounts_are_rejected() {
        let live = auction(AuctionStatus::Active, dec!(1), Duration::days(3));
        assert_eq!(
            check(&live, None, BUYER, dec!(10.005)),
            Err(BidRejection::TooManyDecimals)
        );
        assert_eq!(check(&live, None, BUYER, dec!(10.500)), Ok(()));
    }

    #[test]
    fn amounts_beyond_the_column_range_are_rejected() {
        assert_eq!(MAX_AMOUNT, dec!(99999999.99));

        let live = auction(AuctionStatus::Active, dec!(1), Duration::days(3));
        assert_eq!(check(&live, None, BUYER, dec!(99999999.99)), Ok(()));
        assert_eq!(
            check(&live, None, BUYER, dec!(100000000.00)),
            Err(BidRejection::TooLarge)
        );
        assert_eq!(BidRejection::TooLarge.code(), "TOO_LARGE");
    }

    #[test]
    fn artist_cannot_bid_on_own_artwork() {
        let live = auction(AuctionStatus::Active, dec!(10), Duration::days(3));
        assert_eq!(check(&live, None, ARTIST, dec!(50)), Err(BidRejection::OwnArtwork));
    }

    #[test]
    fn only_active_unexpired_auctions_take_bids() {
        for status in [
            AuctionStatus::Pending,
            AuctionStatus::Closed,
            AuctionStatus::Cancelled,
        ] {
            let idle = auction(status, dec!(10), Duration::days(3));
            assert_eq!(check(&idle, None, BUYER, dec!(50)), Err(BidRejection::AuctionNotActive));
        }

        let expired = auction(AuctionStatus::Active, dec!(10), Duration::seconds(-1));
        assert_eq!(check(&expired, None, BUYER, dec!(50)), Err(BidRejection::AuctionEnded));
    }

    #[test]
    fn price_is_reserve_until_someone_bids() {
        assert_eq!(calculate_price(dec!(100.00), None), dec!(100.00));
        assert_eq!(calculate_price(dec!(100.00), Some(dec!(200))), dec!(200));
    }
}
// endregion: --- Tests
