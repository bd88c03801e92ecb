// region:    --- Imports
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use uptown_gallery::config::Config;
use uptown_gallery::database::DatabaseManager;
use uptown_gallery::event_store::{EventPublisher, KafkaEventPublisher};
use uptown_gallery::handlers::{app_router, AppState};
use uptown_gallery::message_broker::KafkaManager;
use uptown_gallery::notification::{LogNotifier, NotificationConsumer};
use uptown_gallery::scheduler::AuctionScheduler;
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Arc::new(Config::from_env()?);

    let db_manager = Arc::new(DatabaseManager::connect(&config).await?);
    if let Err(e) = db_manager.initialize_database(config.reset_database).await {
        error!("{:<12} --> Database initialization failed: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> Database initialized", "Main");

    let kafka_manager = KafkaManager::new(&config)?;
    if let Err(e) = kafka_manager.initialize().await {
        error!("{:<12} --> Kafka initialization failed: {:?}", "Main", e);
        return Err(e.into());
    }
    kafka_manager
        .create_topic(&config.events_topic, 5, 1)
        .await?;
    info!("{:<12} --> Kafka initialized", "Main");

    let publisher: Arc<dyn EventPublisher> = Arc::new(KafkaEventPublisher::new(
        kafka_manager.get_producer(),
        config.events_topic.clone(),
    ));

    // notifications are sent from the published event stream
    let notification_consumer = NotificationConsumer::new(
        kafka_manager.get_consumer(),
        Arc::new(LogNotifier),
        config.events_topic.clone(),
        config.notify_from.clone(),
    );
    tokio::spawn(async move {
        notification_consumer.start().await;
    });

    let scheduler = AuctionScheduler::new(
        Arc::clone(&db_manager),
        Arc::clone(&publisher),
        config.sweep_interval,
    );
    let sweep_task = scheduler.start();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = app_router(AppState {
        db_manager,
        publisher,
        config: Arc::clone(&config),
    })
    .layer(cors);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // stop when either the server or the closure sweep exits
    tokio::select! {
        res = axum::serve(listener, routes_all.into_make_service()).into_future() => {
            if let Err(err) = res {
                error!("{:<12} --> Server error: {}", "Main", err);
            }
            Ok(())
        }
        res = sweep_task => {
            error!("{:<12} --> Closure sweep task stopped: {:?}", "Main", res);
            Err("closure sweep task stopped".into())
        }
    }
}
// endregion: --- Main
