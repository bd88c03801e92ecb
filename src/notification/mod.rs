//! Turns published lifecycle events into notifications for artists and bidders.
// region:    --- Imports
use crate::auction::events::GalleryEvent;
use crate::error::GalleryResult;
use crate::event_store::Event;
use crate::message_broker::KafkaConsumer;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub from: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    fn new(from: &str, recipient: &str, subject: &str, body: String) -> Self {
        Self {
            from: from.to_string(),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body,
        }
    }
}

/// Notifications owed for one event, in send order
pub fn notifications_for(event: &GalleryEvent, from: &str) -> Vec<Notification> {
    match event {
        GalleryEvent::ArtworkApproved {
            title,
            artist_email,
            ..
        } => vec![Notification::new(
            from,
            artist_email,
            "Your Artwork Has Been Approved!",
            format!("Your artwork \"{title}\" has been approved and your auction has started."),
        )],
        GalleryEvent::ArtworkDenied {
            title,
            artist_email,
            ..
        } => vec![Notification::new(
            from,
            artist_email,
            "Your Artwork Has Been Denied",
            format!("Unfortunately, your artwork \"{title}\" has been denied."),
        )],
        GalleryEvent::BidPlaced {
            title,
            bidder_email,
            artist_email,
            amount,
            ..
        } => vec![
            Notification::new(
                from,
                bidder_email,
                "Your Bid Has Been Placed",
                format!("Your bid of ${amount} on \"{title}\" has been placed."),
            ),
            Notification::new(
                from,
                artist_email,
                "New Bid On Your Artwork",
                format!("A bid of ${amount} has been placed on your artwork \"{title}\"."),
            ),
        ],
        GalleryEvent::AuctionClosed {
            title,
            artist_email,
            final_price,
            bid_count,
            ..
        } => {
            let body = if *bid_count == 0 {
                format!("The auction for \"{title}\" has closed without any bids.")
            } else {
                format!(
                    "The auction for \"{title}\" has closed with a final price of ${final_price}."
                )
            };
            vec![Notification::new(
                from,
                artist_email,
                "Your Auction Has Closed",
                body,
            )]
        }
        GalleryEvent::ProfileUpdated {
            email,
            field,
            new_value,
            ..
        } => vec![Notification::new(
            from,
            email,
            "Your Profile Has Been Updated",
            format!("Your {} has been changed to \"{new_value}\".", field.replace('_', " ")),
        )],
    }
}
// endregion: --- Notification

// region:    --- Notifier
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> GalleryResult<()>;
}

/// Writes notifications to the log instead of a mail server
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> GalleryResult<()> {
        info!(
            "{:<12} --> {} -> {}: {}",
            "Notifier", notification.from, notification.recipient, notification.subject
        );
        Ok(())
    }
}
// endregion: --- Notifier

// region:    --- Notification Consumer
pub struct NotificationConsumer {
    kafka_consumer: Arc<KafkaConsumer>,
    notifier: Arc<dyn Notifier>,
    topic: String,
    from: String,
}

impl NotificationConsumer {
    pub fn new(
        kafka_consumer: Arc<KafkaConsumer>,
        notifier: Arc<dyn Notifier>,
        topic: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            kafka_consumer,
            notifier,
            topic: topic.into(),
            from: from.into(),
        }
    }

    /// Consume the events topic until the consumer fails
    pub async fn start(&self) {
        let notifier = Arc::clone(&self.notifier);
        let from = self.from.clone();
        if let Err(e) = self
            .kafka_consumer
            .consume_events(&self.topic, move |event| {
                let notifier = Arc::clone(&notifier);
                let from = from.clone();
                async move { dispatch(notifier.as_ref(), &from, &event).await.map(|_| ()) }
            })
            .await
        {
            error!("{:<12} --> Notification consumer stopped: {}", "Notifier", e);
        }
    }
}

/// Decode one stored event and send its notifications.
/// A failed send is logged and does not stop the remaining ones.
pub async fn dispatch(notifier: &dyn Notifier, from: &str, event: &Event) -> GalleryResult<usize> {
    let decoded = event.decode()?;
    let mut sent = 0;
    for notification in notifications_for(&decoded, from) {
        match notifier.send(&notification).await {
            Ok(()) => sent += 1,
            Err(e) => error!(
                "{:<12} --> Failed to notify {} about event {}: {}",
                "Notifier", notification.recipient, event.id, e
            ),
        }
    }
    Ok(sent)
}
// endregion: --- Notification Consumer

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GalleryError;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tokio::sync::Mutex;

    const FROM: &str = "mailto@uptowngallery.com";

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> GalleryResult<()> {
            if notification.recipient.starts_with("bounce") {
                return Err(GalleryError::Broker("mailbox unavailable".into()));
            }
            self.sent.lock().await.push(notification.clone());
            Ok(())
        }
    }

    fn stored(event: &GalleryEvent) -> Event {
        let (aggregate_type, aggregate_id) = event.aggregate();
        Event {
            id: 1,
            aggregate_type: aggregate_type.into(),
            aggregate_id,
            event_type: event.event_type().into(),
            data: serde_json::to_value(event).unwrap(),
            timestamp: event.timestamp(),
            version: 1,
        }
    }

    #[test]
    fn approval_notifies_the_artist() {
        let event = GalleryEvent::ArtworkApproved {
            artwork_id: 1,
            auction_id: 2,
            title: "Blue Hour".into(),
            artist_id: 5,
            artist_email: "artist@example.com".into(),
            end_date: Utc::now(),
            timestamp: Utc::now(),
        };

        let notifications = notifications_for(&event, FROM);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].from, FROM);
        assert_eq!(notifications[0].recipient, "artist@example.com");
        assert_eq!(notifications[0].subject, "Your Artwork Has Been Approved!");
        assert_eq!(
            notifications[0].body,
            "Your artwork \"Blue Hour\" has been approved and your auction has started."
        );
    }

    #[test]
    fn denial_uses_the_denied_subject() {
        let event = GalleryEvent::ArtworkDenied {
            artwork_id: 1,
            title: "Blue Hour".into(),
            artist_id: 5,
            artist_email: "artist@example.com".into(),
            cancelled_auction_id: None,
            timestamp: Utc::now(),
        };

        let notifications = notifications_for(&event, FROM);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].subject, "Your Artwork Has Been Denied");
    }

    #[test]
    fn closing_without_bids_says_so() {
        let event = GalleryEvent::AuctionClosed {
            auction_id: 2,
            artwork_id: 1,
            title: "Blue Hour".into(),
            artist_email: "artist@example.com".into(),
            final_price: dec!(100.00),
            bid_count: 0,
            timestamp: Utc::now(),
        };

        let notifications = notifications_for(&event, FROM);
        assert!(notifications[0].body.contains("without any bids"));
    }

    #[tokio::test]
    async fn bid_placed_reaches_bidder_and_artist() {
        let notifier = RecordingNotifier::default();
        let event = GalleryEvent::BidPlaced {
            auction_id: 2,
            artwork_id: 1,
            title: "Blue Hour".into(),
            bid_id: 7,
            bidder_id: 9,
            bidder_email: "buyer@example.com".into(),
            artist_email: "artist@example.com".into(),
            amount: dec!(150.00),
            timestamp: Utc::now(),
        };

        let sent = dispatch(&notifier, FROM, &stored(&event)).await.unwrap();

        assert_eq!(sent, 2);
        let recipients: Vec<String> = notifier
            .sent
            .lock()
            .await
            .iter()
            .map(|n| n.recipient.clone())
            .collect();
        assert_eq!(recipients, vec!["buyer@example.com", "artist@example.com"]);
    }

    #[tokio::test]
    async fn failed_send_does_not_block_the_rest() {
        let notifier = RecordingNotifier::default();
        let event = GalleryEvent::BidPlaced {
            auction_id: 2,
            artwork_id: 1,
            title: "Blue Hour".into(),
            bid_id: 7,
            bidder_id: 9,
            bidder_email: "bounce@example.com".into(),
            artist_email: "artist@example.com".into(),
            amount: dec!(150.00),
            timestamp: Utc::now(),
        };

        let sent = dispatch(&notifier, FROM, &stored(&event)).await.unwrap();

        assert_eq!(sent, 1);
        assert_eq!(notifier.sent.lock().await[0].recipient, "artist@example.com");
    }

    #[tokio::test]
    async fn undecodable_event_is_an_error() {
        let notifier = RecordingNotifier::default();
        let mut event = stored(&GalleryEvent::ProfileUpdated {
            profile_id: 3,
            email: "buyer@example.com".into(),
            field: "shipping_address".into(),
            new_value: "1 Main St".into(),
            timestamp: Utc::now(),
        });
        event.data = serde_json::json!({"Unknown": {}});

        assert!(dispatch(&notifier, FROM, &event).await.is_err());
        assert!(notifier.sent.lock().await.is_empty());
    }
}
// endregion: --- Tests
