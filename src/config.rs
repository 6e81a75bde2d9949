use std::time::Duration;

use rdkafka::config::RDKafkaLogLevel;
use rdkafka::ClientConfig;

/// Kafka client settings shared by every changelog backed store.
#[derive(Clone, Debug)]
pub struct Config(pub(crate) ClientConfig);

impl Config {
    pub fn new() -> Config {
        Config(ClientConfig::new())
    }

    pub fn set(mut self, key: &str, value: &str) -> Config {
        self.0.set(key, value);
        self
    }

    pub fn set_group(self, group: &str) -> Config {
        self.set("group.id", group)
    }

    pub fn set_log_level(mut self, log_level: RDKafkaLogLevel) -> Config {
        self.0.set_log_level(log_level);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

/// Location of a single store's changelog.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub topic: String,
    pub partition: i32,
    /// Upper bound for a produce or a watermark fetch.
    pub timeout: Duration,
    /// Replication factor used when the changelog topic has to be created.
    pub replication: i32,
}

impl StoreConfig {
    pub fn new(name: &str, partition: i32) -> Self {
        let mut topic = name.to_string();
        topic.push_str("-changelog");
        StoreConfig {
            topic,
            partition,
            timeout: Duration::from_secs(5),
            replication: 1,
        }
    }

    pub fn with_replication(mut self, replication: i32) -> Self {
        self.replication = replication;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_config_names_changelog_topic() {
        let cfg = StoreConfig::new("join_waitlist", 3);
        assert_eq!(cfg.topic, "join_waitlist-changelog");
        assert_eq!(cfg.partition, 3);
        assert_eq!(cfg.replication, 1);
        assert_eq!(cfg.with_replication(3).replication, 3);
    }

    #[test]
    fn config_setters_chain() {
        let cfg = Config::new()
            .set("bootstrap.servers", "localhost:29092")
            .set_group("joins");
        assert_eq!(cfg.get("bootstrap.servers"), Some("localhost:29092"));
        assert_eq!(cfg.get("group.id"), Some("joins"));
    }
}
