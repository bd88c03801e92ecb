use crate::error::{GalleryError, GalleryResult};
use std::str::FromStr;
use std::time::Duration;

/// Service configuration loaded from environment variables.
///
/// | Env Var                    | Default                     |
/// |----------------------------|-----------------------------|
/// | `DATABASE_URL`             | required                    |
/// | `DATABASE_MAX_CONNECTIONS` | `5`                         |
/// | `BIND_ADDR`                | `0.0.0.0:3000`              |
/// | `KAFKA_BROKERS`            | `localhost:9092`            |
/// | `KAFKA_GROUP_ID`           | `gallery-notifications`     |
/// | `EVENTS_TOPIC`             | `gallery-events`            |
/// | `SWEEP_INTERVAL_SECS`      | `3600`                      |
/// | `NOTIFY_FROM`              | `mailto@uptowngallery.com`  |
/// | `AUTO_APPROVE_SUBMISSIONS` | `false`                     |
/// | `RESET_DATABASE`           | `false`                     |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub kafka_brokers: String,
    pub kafka_group_id: String,
    pub events_topic: String,
    pub sweep_interval: Duration,
    pub notify_from: String,
    /// Approve artworks as soon as they are submitted.
    pub auto_approve_submissions: bool,
    /// Drop and recreate every table at startup.
    pub reset_database: bool,
}

impl Config {
    pub fn from_env() -> GalleryResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> GalleryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| GalleryError::Config("DATABASE_URL must be set".into()))?;
        let sweep_secs: u64 = parse_or(&lookup, "SWEEP_INTERVAL_SECS", 3600)?;
        if sweep_secs == 0 {
            return Err(GalleryError::Config(
                "SWEEP_INTERVAL_SECS must be greater than zero".into(),
            ));
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            kafka_brokers: lookup("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".into()),
            kafka_group_id: lookup("KAFKA_GROUP_ID")
                .unwrap_or_else(|| "gallery-notifications".into()),
            events_topic: lookup("EVENTS_TOPIC").unwrap_or_else(|| "gallery-events".into()),
            sweep_interval: Duration::from_secs(sweep_secs),
            notify_from: lookup("NOTIFY_FROM")
                .unwrap_or_else(|| "mailto@uptowngallery.com".into()),
            auto_approve_submissions: parse_or(&lookup, "AUTO_APPROVE_SUBMISSIONS", false)?,
            reset_database: parse_or(&lookup, "RESET_DATABASE", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> GalleryResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| GalleryError::Config(format!("{key} has an invalid value: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config =
            Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/gallery")]))
                .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.sweep_interval, Duration::from_secs(3600));
        assert_eq!(config.events_topic, "gallery-events");
        assert_eq!(config.notify_from, "mailto@uptowngallery.com");
        assert!(!config.auto_approve_submissions);
        assert!(!config.reset_database);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, GalleryError::Config(_)));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/gallery"),
            ("SWEEP_INTERVAL_SECS", "hourly"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SWEEP_INTERVAL_SECS"));
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/gallery"),
            ("SWEEP_INTERVAL_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, GalleryError::Config(_)));
        assert!(err.to_string().contains("SWEEP_INTERVAL_SECS"));
    }

    #[test]
    fn overrides_are_honoured() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/gallery"),
            ("SWEEP_INTERVAL_SECS", "60"),
            ("AUTO_APPROVE_SUBMISSIONS", "true"),
        ]))
        .unwrap();
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert!(config.auto_approve_submissions);
    }
}
