//! Event envelope - the unit carried by both delivery channels
//!
//! Field declaration order is the wire order; do not reorder.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ContractError;

/// CloudEvents spec version written into every envelope
pub const SPEC_VERSION: &str = "1.0";

/// Envelope-level content type, describing the wrapper rather than the payload
pub const DATA_CONTENT_TYPE: &str = "application/json";

/// Typed payload of an envelope
///
/// `content` is `None` for unpublish events. Present content is always
/// base64 (standard alphabet, padded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    content: Option<String>,
    #[serde(rename = "type")]
    content_type: String,
}

impl Data {
    /// Encode raw payload bytes. Empty payloads are stored as `None`.
    pub fn new(content: Option<&[u8]>, content_type: impl Into<String>) -> Self {
        let content = content
            .filter(|raw| !raw.is_empty())
            .map(|raw| STANDARD.encode(raw));
        Self {
            content,
            content_type: content_type.into(),
        }
    }

    /// Payload for a delete/unpublish event
    pub fn removal(content_type: impl Into<String>) -> Self {
        Self::new(None, content_type)
    }

    /// Base64 form as carried on the wire
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Fully qualified payload type, e.g. `product/simple`
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Decode the base64 content back into raw bytes
    pub fn decoded_content(&self) -> Result<Option<Vec<u8>>, ContractError> {
        self.content
            .as_deref()
            .map(|encoded| {
                STANDARD
                    .decode(encoded)
                    .map_err(|e| ContractError::format("data.content", e.to_string()))
            })
            .transpose()
    }
}

/// Immutable event envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "specversion")]
    spec_version: String,
    id: Uuid,
    source: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(rename = "datacontenttype")]
    data_content_type: String,
    subject: String,
    #[serde(with = "rfc3339_utc")]
    time: DateTime<Utc>,
    data: Data,
}

impl Envelope {
    /// Assemble an envelope from explicit identity and time.
    ///
    /// Fresh envelopes are built through the codec, which assigns the id and
    /// timestamp; this constructor is the raw form used by that builder and
    /// by tests that need stable values.
    pub fn new(
        id: Uuid,
        time: DateTime<Utc>,
        source: impl Into<String>,
        event_type: impl Into<String>,
        subject: impl Into<String>,
        data: Data,
    ) -> Self {
        Self {
            spec_version: SPEC_VERSION.to_string(),
            id,
            source: source.into(),
            event_type: event_type.into(),
            data_content_type: DATA_CONTENT_TYPE.to_string(),
            subject: subject.into(),
            time,
            data,
        }
    }

    pub fn spec_version(&self) -> &str {
        &self.spec_version
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data_content_type(&self) -> &str {
        &self.data_content_type
    }

    /// Entity key, the downstream identity for upsert/delete
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// An envelope without content represents a delete
    pub fn is_removal(&self) -> bool {
        self.data.content.is_none()
    }
}

/// Subject keys of a batch, in order
pub fn subjects(envelopes: &[Envelope]) -> Vec<String> {
    envelopes.iter().map(|e| e.subject().to_string()).collect()
}

/// Distinct event types of a batch, first-seen order
pub fn event_types(envelopes: &[Envelope]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for envelope in envelopes {
        if !types.iter().any(|t| t == envelope.event_type()) {
            types.push(envelope.event_type().to_string());
        }
    }
    types
}

/// RFC 3339 in UTC with a `Z` suffix. Whole seconds are written without a
/// fraction; decoded sub-second precision is written back unchanged.
mod rfc3339_utc {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
