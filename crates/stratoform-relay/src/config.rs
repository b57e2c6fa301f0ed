use crate::publisher::PubSubPublisher;
use clap::Parser;

/// Relay settings, read from flags or the function's environment
#[derive(Parser, Debug, Clone)]
#[command(name = "strato-relay")]
#[command(about = "Relay game events to a Pub/Sub topic", long_about = None)]
#[command(version)]
pub struct RelayConfig {
    /// Project that owns the topic
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: String,

    /// Topic messages are published to
    #[arg(long, env = "TOPIC_ID")]
    pub topic_id: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Pub/Sub emulator (`host:port`); disables authentication
    #[arg(long, env = "PUBSUB_EMULATOR_HOST")]
    pub emulator_host: Option<String>,
}

impl RelayConfig {
    pub fn publisher(&self) -> PubSubPublisher {
        match self.emulator_host.as_deref().filter(|h| !h.is_empty()) {
            Some(host) => PubSubPublisher::emulator(host, &self.project_id, &self.topic_id),
            None => PubSubPublisher::new(&self.project_id, &self.topic_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_environment() {
        temp_env::with_vars(
            [
                ("PROJECT_ID", Some("demo-project")),
                ("TOPIC_ID", Some("events")),
                ("PORT", Some("9090")),
                ("PUBSUB_EMULATOR_HOST", Some("localhost:8085")),
            ],
            || {
                let config = RelayConfig::try_parse_from(["strato-relay"]).unwrap();
                assert_eq!(config.project_id, "demo-project");
                assert_eq!(config.topic_id, "events");
                assert_eq!(config.port, 9090);
                assert_eq!(
                    config.publisher().publish_url(),
                    "http://localhost:8085/v1/projects/demo-project/topics/events:publish"
                );
            },
        );
    }

    #[test]
    #[serial]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("PROJECT_ID", Some("demo-project")),
                ("TOPIC_ID", Some("events")),
                ("PORT", None),
                ("PUBSUB_EMULATOR_HOST", None),
            ],
            || {
                let config = RelayConfig::try_parse_from(["strato-relay"]).unwrap();
                assert_eq!(config.port, 8080);
                assert!(config.emulator_host.is_none());
                assert!(
                    config
                        .publisher()
                        .publish_url()
                        .starts_with("https://pubsub.googleapis.com/")
                );
            },
        );
    }

    #[test]
    #[serial]
    fn test_topic_is_required() {
        temp_env::with_vars(
            [("PROJECT_ID", Some("demo-project")), ("TOPIC_ID", None)],
            || {
                assert!(RelayConfig::try_parse_from(["strato-relay"]).is_err());
            },
        );
    }
}
