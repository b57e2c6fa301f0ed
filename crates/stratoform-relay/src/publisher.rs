//! Pub/Sub publishing
//!
//! Messages go through the Pub/Sub REST API. On Google Cloud the access token
//! comes from the metadata server; against the emulator no token is sent.

use crate::error::{RelayError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before they expire
const TOKEN_MARGIN_SECS: i64 = 60;

/// Destination of relayed messages
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one message and return its server-assigned ID
    async fn publish(&self, data: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct PublishRequest {
    messages: Vec<PubSubMessage>,
}

#[derive(Debug, Serialize)]
struct PubSubMessage {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// How requests are authorized
#[derive(Debug)]
enum Auth {
    /// Emulator: no credentials
    None,
    /// Metadata-server token, cached until shortly before expiry
    Metadata {
        url: String,
        cache: Mutex<Option<CachedToken>>,
    },
}

/// Publisher for one topic
#[derive(Debug)]
pub struct PubSubPublisher {
    client: Client,
    endpoint: String,
    project: String,
    topic: String,
    auth: Auth,
}

impl PubSubPublisher {
    /// Publisher against Google Cloud, authorized by the metadata server
    pub fn new(project: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: PUBSUB_ENDPOINT.to_string(),
            project: project.into(),
            topic: topic.into(),
            auth: Auth::Metadata {
                url: METADATA_TOKEN_URL.to_string(),
                cache: Mutex::new(None),
            },
        }
    }

    /// Publisher against the emulator at `host` (`host:port`)
    pub fn emulator(host: &str, project: impl Into<String>, topic: impl Into<String>) -> Self {
        let endpoint = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host.trim_end_matches('/'))
        };
        Self {
            client: Client::new(),
            endpoint,
            project: project.into(),
            topic: topic.into(),
            auth: Auth::None,
        }
    }

    /// Fetch tokens from `url` instead of the metadata server
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.auth = Auth::Metadata {
            url: url.into(),
            cache: Mutex::new(None),
        };
        self
    }

    /// Use `endpoint` instead of the public API
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn publish_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.endpoint, self.project, self.topic
        )
    }

    async fn access_token(&self) -> Result<Option<String>> {
        let Auth::Metadata { url, cache } = &self.auth else {
            return Ok(None);
        };

        let mut cached = cache.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(Some(token.value.clone()));
            }
        }

        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| RelayError::Token(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RelayError::Token(format!(
                "metadata server returned {}",
                response.status()
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Token(e.to_string()))?;

        let lifetime = (token.expires_in - TOKEN_MARGIN_SECS).max(0);
        tracing::debug!(expires_in = token.expires_in, "Access token refreshed");
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(lifetime),
        });
        Ok(Some(token.access_token))
    }
}

#[async_trait]
impl Publisher for PubSubPublisher {
    async fn publish(&self, data: Vec<u8>) -> Result<String> {
        let body = PublishRequest {
            messages: vec![PubSubMessage {
                data: STANDARD.encode(&data),
            }],
        };

        let mut request = self.client.post(self.publish_url()).json(&body);
        if let Some(token) = self.access_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RelayError::Publish(format!("{}: {}", status, text.trim())));
        }

        let published: PublishResponse = response.json().await?;
        let id = published
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| RelayError::Publish("no message ID returned".to_string()))?;
        tracing::debug!(topic = %self.topic, message_id = %id, "Message published");
        Ok(id)
    }
}
