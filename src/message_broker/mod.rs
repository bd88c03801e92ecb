// region:    --- Imports
use crate::config::Config;
use crate::error::{GalleryError, GalleryResult};
use crate::event_store::Event;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

impl KafkaProducer {
    pub fn new(brokers: &str) -> GalleryResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| GalleryError::Broker(format!("Producer creation error: {e}")))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
        })
    }

    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), String> {
        info!(
            "{:<12} --> Sending message: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }

    /// Fetch cluster metadata to confirm the brokers are reachable
    pub async fn check_connection(&self, timeout: Duration) -> GalleryResult<usize> {
        let producer = Arc::clone(&self.producer);
        let brokers = tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, timeout)
                .map(|metadata| metadata.brokers().len())
        })
        .await
        .map_err(|e| GalleryError::Broker(e.to_string()))?
        .map_err(|e| GalleryError::Broker(format!("Broker metadata unavailable: {e}")))?;

        Ok(brokers)
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Consumer
pub struct KafkaConsumer {
    consumer: Arc<StreamConsumer>,
}

impl KafkaConsumer {
    pub fn new(brokers: &str, group_id: &str) -> GalleryResult<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("fetch.max.bytes", "5242880")
            .set("allow.auto.create.topics", "true")
            .create()
            .map_err(|e| GalleryError::Broker(format!("Consumer creation failed: {e}")))?;

        Ok(KafkaConsumer {
            consumer: Arc::new(consumer),
        })
    }

    /// Subscribe to `topic` and feed every decodable event to `handler`, forever
    pub async fn consume_events<F, Fut>(&self, topic: &str, handler: F) -> GalleryResult<()>
    where
        F: Fn(Event) -> Fut + Send + 'static,
        Fut: Future<Output = GalleryResult<()>> + Send + 'static,
    {
        info!("{:<12} --> Consuming events: topic={}", "Consumer", topic);
        self.consumer
            .subscribe(&[topic])
            .map_err(|e| GalleryError::Broker(e.to_string()))?;

        loop {
            match self.consumer.recv().await {
                Ok(message) => {
                    debug!(
                        "{:<12} --> Message received: topic={}, partition={}, offset={}",
                        "Consumer",
                        message.topic(),
                        message.partition(),
                        message.offset()
                    );

                    let Some(payload) = message.payload() else {
                        warn!("{:<12} --> Empty payload", "Consumer");
                        continue;
                    };

                    match serde_json::from_slice::<Event>(payload) {
                        Ok(event) => {
                            let event_id = event.id;
                            if let Err(e) = handler(event).await {
                                error!(
                                    "{:<12} --> Event {} handling failed: {}",
                                    "Consumer", event_id, e
                                );
                            }
                        }
                        Err(e) => error!("{:<12} --> Undecodable payload: {:?}", "Consumer", e),
                    }
                }
                Err(e) => error!("{:<12} --> Receive error: {:?}", "Consumer", e),
            }
        }
    }
}

// endregion: --- Kafka Consumer

// region:    --- Kafka Manager
pub struct KafkaManager {
    producer: Arc<KafkaProducer>,
    consumer: Arc<KafkaConsumer>,
    brokers: String,
}

impl KafkaManager {
    pub fn new(config: &Config) -> GalleryResult<Self> {
        let producer = Arc::new(KafkaProducer::new(&config.kafka_brokers)?);
        let consumer = Arc::new(KafkaConsumer::new(
            &config.kafka_brokers,
            &config.kafka_group_id,
        )?);

        Ok(KafkaManager {
            producer,
            consumer,
            brokers: config.kafka_brokers.clone(),
        })
    }

    pub fn get_producer(&self) -> Arc<KafkaProducer> {
        Arc::clone(&self.producer)
    }

    pub fn get_consumer(&self) -> Arc<KafkaConsumer> {
        Arc::clone(&self.consumer)
    }

    /// Wait until the brokers answer a metadata request
    pub async fn initialize(&self) -> GalleryResult<()> {
        info!("{:<12} --> Kafka initialization started", "Manager");

        let max_attempts = 10;
        for attempt in 1..=max_attempts {
            match self.producer.check_connection(Duration::from_secs(1)).await {
                Ok(brokers) => {
                    info!("{:<12} --> Kafka reachable: {} broker(s)", "Manager", brokers);
                    return Ok(());
                }
                Err(e) => warn!(
                    "{:<12} --> Waiting for Kafka... (attempt {}/{}): {}",
                    "Manager", attempt, max_attempts, e
                ),
            }
        }

        Err(GalleryError::Broker("Kafka did not become reachable".into()))
    }

    /// Create the topic unless it already exists
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> GalleryResult<()> {
        info!("{:<12} --> Creating topic: {}", "Manager", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| GalleryError::Broker(format!("AdminClient creation failed: {e}")))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| GalleryError::Broker(format!("Topic creation failed: {e}")))?;

        for result in results {
            match result {
                Ok(name) => info!("{:<12} --> Topic created: {}", "Manager", name),
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    info!("{:<12} --> Topic already exists: {}", "Manager", name)
                }
                Err((name, code)) => {
                    return Err(GalleryError::Broker(format!(
                        "Topic creation failed for {name}: {code:?}"
                    )))
                }
            }
        }
        Ok(())
    }
}

// endregion: --- Kafka Manager
