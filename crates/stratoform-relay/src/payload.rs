//! Event payload
//!
//! `event_data` is carried as raw JSON and republished byte-for-byte; only
//! the envelope is decoded.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

#[derive(Debug, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub event_name: String,
    /// Missing data is republished as `null`
    #[serde(default)]
    pub event_data: Option<Box<RawValue>>,
}

impl Payload {
    pub fn decode(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Message body sent to the topic
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use serde_json::{Value, json};

    #[test]
    fn test_event_data_is_kept_raw() {
        let body = br#"{"game_name": "tetris", "event_name": "level_up", "event_data": {"level": 3,  "bonus": [1, 2]}}"#;
        let payload = Payload::decode(body).unwrap();
        assert_eq!(payload.game_name, "tetris");
        assert_eq!(
            payload.event_data.as_ref().map(|d| d.get()),
            Some(r#"{"level": 3,  "bonus": [1, 2]}"#)
        );

        let encoded: Value = serde_json::from_slice(&payload.encode().unwrap()).unwrap();
        assert_eq!(
            encoded,
            json!({
                "game_name": "tetris",
                "event_name": "level_up",
                "event_data": {"level": 3, "bonus": [1, 2]}
            })
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let payload = Payload::decode(br#"{"event_name": "start", "extra": true}"#).unwrap();
        assert_eq!(payload.game_name, "");
        let encoded: Value = serde_json::from_slice(&payload.encode().unwrap()).unwrap();
        assert_eq!(encoded["event_data"], Value::Null);
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(Payload::decode(b"{\"game_name\": "), Err(RelayError::Decode(_))));
        assert!(matches!(Payload::decode(b""), Err(RelayError::Decode(_))));
        assert!(matches!(
            Payload::decode(br#"{"game_name": 42}"#),
            Err(RelayError::Decode(_))
        ));
    }
}
