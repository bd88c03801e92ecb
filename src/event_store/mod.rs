// region:    --- Imports
use crate::auction::events::GalleryEvent;
use crate::error::{GalleryError, GalleryResult};
use crate::message_broker::KafkaProducer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Event Model
/// Event row as stored in the `events` table and carried on the broker
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: i64,
    pub aggregate_type: String,
    pub aggregate_id: i64,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: i64,
}

impl Event {
    pub fn decode(&self) -> GalleryResult<GalleryEvent> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}
// endregion: --- Event Model

// region:    --- Append
/// Append an event inside the caller's transaction.
/// The caller holds a row lock on the aggregate, so the next version is free;
/// a concurrent writer without that lock surfaces as a conflict.
pub async fn append_event(conn: &mut PgConnection, event: &GalleryEvent) -> GalleryResult<Event> {
    let (aggregate_type, aggregate_id) = event.aggregate();
    let data = serde_json::to_value(event)?;

    let stored = sqlx::query_as::<_, Event>(
        "INSERT INTO events (aggregate_type, aggregate_id, event_type, data, timestamp, version)
         SELECT $1, $2, $3, $4, $5, COALESCE(MAX(version), 0) + 1
         FROM events WHERE aggregate_type = $1 AND aggregate_id = $2
         ON CONFLICT (aggregate_type, aggregate_id, version) DO NOTHING
         RETURNING id, aggregate_type, aggregate_id, event_type, data, timestamp, version",
    )
    .bind(aggregate_type)
    .bind(aggregate_id)
    .bind(event.event_type())
    .bind(&data)
    .bind(event.timestamp())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| {
        GalleryError::Conflict(format!(
            "Concurrent update on {aggregate_type} {aggregate_id}"
        ))
    })?;

    info!(
        "{:<12} --> Event appended: {} {}#{} v{}",
        "EventStore", stored.event_type, stored.aggregate_type, stored.aggregate_id, stored.version
    );
    Ok(stored)
}
// endregion: --- Append

// region:    --- Event Publisher
/// Where committed events are announced
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &Event) -> GalleryResult<()>;
}

/// Publish events that are already committed.
/// The database is the source of truth, so a broker failure is logged and not returned.
pub async fn publish_committed(publisher: &dyn EventPublisher, events: &[Event]) {
    for event in events {
        if let Err(e) = publisher.publish(event).await {
            error!(
                "{:<12} --> Failed to publish event {} ({}): {}",
                "EventStore", event.id, event.event_type, e
            );
        }
    }
}

/// Publishes events to a Kafka topic keyed by aggregate
pub struct KafkaEventPublisher {
    kafka_producer: Arc<KafkaProducer>,
    topic: String,
}

impl KafkaEventPublisher {
    pub fn new(kafka_producer: Arc<KafkaProducer>, topic: impl Into<String>) -> Self {
        Self {
            kafka_producer,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, event: &Event) -> GalleryResult<()> {
        let key = format!("{}-{}", event.aggregate_type, event.aggregate_id);
        let payload = serde_json::to_string(event)?;
        self.kafka_producer
            .send_message(&self.topic, &key, &payload)
            .await
            .map_err(GalleryError::Broker)
    }
}
// endregion: --- Event Publisher

// endregion: --- Tests
