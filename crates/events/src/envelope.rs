//! Transport-agnostic event envelope.
//!
//! An envelope wraps a typed event payload as JSON together with the metadata
//! every transport needs: a fresh id (the deduplication key), the event type
//! name, and the publish timestamp. Envelopes are immutable once published.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

/// Failure to serialize a payload or envelope for the wire.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Failure to parse a frame or payload.
///
/// Callers must treat decode failure as a **poison message**: log and drop,
/// never retry indefinitely.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The raw frame did not parse as an envelope at all.
    #[error("failed to parse envelope frame: {0}")]
    Frame(String),

    /// The envelope parsed, but its payload did not match the declared type.
    #[error("failed to decode '{event_type}' payload: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Wire format: `{id, type, data, created_at}` with `created_at` as RFC3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    id: Uuid,
    #[serde(rename = "type")]
    event_type: String,
    data: JsonValue,
    created_at: DateTime<Utc>,
}

impl Envelope {
    /// Wrap a typed payload, generating a fresh id and timestamp.
    pub fn encode<E>(event_type: impl Into<String>, payload: &E) -> Result<Self, EncodeError>
    where
        E: Serialize,
    {
        Ok(Self {
            id: Uuid::now_v7(),
            event_type: event_type.into(),
            data: serde_json::to_value(payload)?,
            created_at: Utc::now(),
        })
    }

    /// Deserialize the payload against the caller's declared type.
    pub fn decode<E>(&self) -> Result<E, DecodeError>
    where
        E: DeserializeOwned,
    {
        serde_json::from_value(self.data.clone()).map_err(|source| DecodeError::Payload {
            event_type: self.event_type.clone(),
            source,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &JsonValue {
        &self.data
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Serialize the whole envelope for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse an envelope from a raw frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Frame(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ping {
        seq: u64,
        note: String,
    }

    #[test]
    fn encode_then_decode_returns_payload() {
        let payload = Ping {
            seq: 7,
            note: "hello".to_string(),
        };

        let envelope = Envelope::encode("ping", &payload).unwrap();
        assert_eq!(envelope.event_type(), "ping");

        let decoded: Ping = envelope.decode().unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn each_encode_gets_a_fresh_id() {
        let payload = Ping {
            seq: 1,
            note: String::new(),
        };
        let a = Envelope::encode("ping", &payload).unwrap();
        let b = Envelope::encode("ping", &payload).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn decode_against_wrong_type_is_poison() {
        #[derive(Debug, Deserialize)]
        struct Other {
            #[allow(dead_code)]
            completely_different: bool,
        }

        let envelope = Envelope::encode(
            "ping",
            &Ping {
                seq: 1,
                note: String::new(),
            },
        )
        .unwrap();

        let err = envelope.decode::<Other>().unwrap_err();
        assert!(matches!(err, DecodeError::Payload { .. }));
    }

    #[test]
    fn wire_round_trip_preserves_envelope() {
        let envelope = Envelope::encode(
            "ping",
            &Ping {
                seq: 42,
                note: "wire".to_string(),
            },
        )
        .unwrap();

        let bytes = envelope.to_bytes().unwrap();
        let parsed = Envelope::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn wire_field_names_match_the_contract() {
        let envelope = Envelope::encode(
            "ping",
            &Ping {
                seq: 1,
                note: String::new(),
            },
        )
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("type"));
        assert!(obj.contains_key("data"));
        assert!(obj.contains_key("created_at"));
    }

    #[test]
    fn garbage_frame_is_poison() {
        let err = Envelope::from_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Frame(_)));
    }
}
