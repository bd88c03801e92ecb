//! Periodic auction closure sweep.
//! Every tick closes the active auctions whose end date has passed; a tick that
//! fails is logged and the next one tries again.
// region:    --- Imports
use crate::auction::lifecycle::close_expired_auctions;
use crate::database::DatabaseManager;
use crate::event_store::EventPublisher;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Auction Scheduler
pub struct AuctionScheduler {
    db_manager: Arc<DatabaseManager>,
    publisher: Arc<dyn EventPublisher>,
    period: Duration,
}

impl AuctionScheduler {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        publisher: Arc<dyn EventPublisher>,
        period: Duration,
    ) -> Self {
        Self {
            db_manager,
            publisher,
            period,
        }
    }

    /// Spawn the sweep loop; the first sweep runs immediately
    pub fn start(&self) -> JoinHandle<()> {
        let db_manager = Arc::clone(&self.db_manager);
        let publisher = Arc::clone(&self.publisher);
        let period = self.period;
        info!("{:<12} --> Closure sweep every {:?}", "Scheduler", period);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match close_expired_auctions(&db_manager, publisher.as_ref(), Utc::now()).await {
                    Ok(closed) if closed.is_empty() => {
                        debug!("{:<12} --> No expired auctions", "Scheduler")
                    }
                    Ok(closed) => info!("{:<12} --> Closed auctions: {:?}", "Scheduler", closed),
                    Err(e) => error!("{:<12} --> Closure sweep failed: {}", "Scheduler", e),
                }
            }
        })
    }
}
// endregion: --- Auction Scheduler

// endregion: --- Tests
