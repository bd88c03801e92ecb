pub mod artwork;
pub mod auction;
pub mod bidding;
pub mod config;
pub mod database;
pub mod error;
pub mod event_store;
pub mod handlers;
pub mod message_broker;
pub mod notification;
pub mod profile;
pub mod query;
pub mod scheduler;
