//! EnvelopeCodec - envelope construction and JSON wire form

use chrono::{SubsecRound, Utc};
use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use contracts::{ContractError, Data, Envelope, DATA_CONTENT_TYPE, SPEC_VERSION};

/// Builds envelopes and converts them to and from their JSON wire form.
///
/// Stateless: a single value can be copied into every component and shared
/// across threads without synchronization.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    pub fn new() -> Self {
        Self
    }

    /// Build a fresh envelope with a new v4 id and the current time (whole seconds)
    pub fn build(
        &self,
        subject: impl Into<String>,
        event_type: impl Into<String>,
        event_source: impl Into<String>,
        data: Data,
    ) -> Envelope {
        Envelope::new(
            Uuid::new_v4(),
            Utc::now().trunc_subsecs(0),
            event_source,
            event_type,
            subject,
            data,
        )
    }

    /// Exactly one envelope is written as a single object, anything else as an array
    ///
    /// # Errors
    /// `Serialization` if the JSON encoder fails
    pub fn serialize(&self, envelopes: &[Envelope]) -> Result<String, ContractError> {
        match envelopes {
            [single] => serde_json::to_string(single)
                .map_err(|e| ContractError::serialization("failed to encode envelope", e)),
            _ => self.serialize_batch(envelopes),
        }
    }

    /// Always the array form, regardless of count
    ///
    /// # Errors
    /// `Serialization` if the JSON encoder fails
    pub fn serialize_batch(&self, envelopes: &[Envelope]) -> Result<String, ContractError> {
        serde_json::to_string(envelopes)
            .map_err(|e| ContractError::serialization("failed to encode envelope batch", e))
    }

    /// Decode envelopes; the caller states whether the payload is a batch
    ///
    /// # Errors
    /// `Format` for malformed JSON, a shape that disagrees with `is_batch`, or
    /// an envelope that is not a valid CloudEvents 1.0 JSON envelope
    pub fn deserialize(&self, json: &str, is_batch: bool) -> Result<Vec<Envelope>, ContractError> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| ContractError::format("envelopes", format!("malformed JSON: {e}")))?;

        let envelopes = match (is_batch, document) {
            (true, Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| decode_envelope(item, &format!("envelopes[{index}]")))
                .collect::<Result<Vec<_>, _>>()?,
            (true, _) => {
                return Err(ContractError::format(
                    "envelopes",
                    "batch payload must be a JSON array",
                ))
            }
            (false, Value::Array(_)) => {
                return Err(ContractError::format(
                    "envelopes",
                    "single envelope payload must not be a JSON array",
                ))
            }
            (false, item) => vec![decode_envelope(item, "envelopes")?],
        };

        trace!(count = envelopes.len(), is_batch, "Envelopes decoded");
        Ok(envelopes)
    }
}

fn decode_envelope(item: Value, field: &str) -> Result<Envelope, ContractError> {
    if !item.is_object() {
        return Err(ContractError::format(field, "envelope must be a JSON object"));
    }

    let envelope: Envelope =
        serde_json::from_value(item).map_err(|e| ContractError::format(field, e.to_string()))?;

    if envelope.spec_version() != SPEC_VERSION {
        return Err(ContractError::format(
            format!("{field}.specversion"),
            format!(
                "unsupported spec version '{}', expected '{SPEC_VERSION}'",
                envelope.spec_version()
            ),
        ));
    }
    if envelope.data_content_type() != DATA_CONTENT_TYPE {
        return Err(ContractError::format(
            format!("{field}.datacontenttype"),
            format!(
                "unsupported content type '{}', expected '{DATA_CONTENT_TYPE}'",
                envelope.data_content_type()
            ),
        ));
    }

    match envelope.data().content() {
        Some("") => {
            return Err(ContractError::format(
                format!("{field}.data.content"),
                "content must be null or non-empty base64",
            ))
        }
        Some(_) => {
            envelope.data().decoded_content().map_err(|e| {
                ContractError::format(format!("{field}.data.content"), e.to_string())
            })?;
        }
        None => {}
    }

    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publish_event(codec: &EnvelopeCodec, key: &str, payload: &str) -> Envelope {
        codec.build(key, "publish", "source", Data::new(Some(payload.as_bytes()), "type"))
    }

    fn unpublish_event(codec: &EnvelopeCodec, key: &str) -> Envelope {
        codec.build(key, "unpublish", "source", Data::removal("type"))
    }

    #[test]
    fn test_build_assigns_unique_ids_and_whole_seconds() {
        let codec = EnvelopeCodec::new();
        let a = publish_event(&codec, "k", "x");
        let b = publish_event(&codec, "k", "x");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().get_version_num(), 4);
        assert_eq!(a.time().timestamp_subsec_nanos(), 0);
        assert_eq!(a.spec_version(), "1.0");
        assert_eq!(a.data_content_type(), "application/json");
    }

    #[test]
    fn test_single_envelope_is_object() {
        let codec = EnvelopeCodec::new();
        let json = codec.serialize(&[publish_event(&codec, "k", "x")]).unwrap();
        assert!(json.starts_with('{'));
        let batch = codec.serialize_batch(&[publish_event(&codec, "k", "x")]).unwrap();
        assert!(batch.starts_with('['));
    }

    #[test]
    fn test_zero_envelopes_is_empty_array() {
        let codec = EnvelopeCodec::new();
        assert_eq!(codec.serialize(&[]).unwrap(), "[]");
        assert!(codec.deserialize("[]", true).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_single() {
        let codec = EnvelopeCodec::new();
        let original = vec![publish_event(&codec, "publish-key", "Data to be published")];
        let json = codec.serialize(&original).unwrap();
        let decoded = codec.deserialize(&json, false).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_mixed_batch_keeps_order() {
        let codec = EnvelopeCodec::new();
        let original = vec![
            publish_event(&codec, "publish-key-1", "Data to be published 1"),
            publish_event(&codec, "publish-key-2", "Data to be published 2"),
            unpublish_event(&codec, "unpublish-key-1"),
            unpublish_event(&codec, "unpublish-key-2"),
        ];
        let json = codec.serialize(&original).unwrap();
        let array: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(array.as_array().map(Vec::len), Some(4));

        let decoded = codec.deserialize(&json, true).unwrap();
        assert_eq!(decoded, original);
        let subjects: Vec<_> = decoded.iter().map(|e| e.subject()).collect();
        assert_eq!(
            subjects,
            ["publish-key-1", "publish-key-2", "unpublish-key-1", "unpublish-key-2"]
        );
    }

    #[test]
    fn test_batch_flag_must_match_shape() {
        let codec = EnvelopeCodec::new();
        let single = codec.serialize(&[publish_event(&codec, "k", "x")]).unwrap();
        let batch = codec
            .serialize(&[publish_event(&codec, "a", "x"), unpublish_event(&codec, "b")])
            .unwrap();

        assert!(matches!(
            codec.deserialize(&single, true),
            Err(ContractError::Format { .. })
        ));
        assert!(matches!(
            codec.deserialize(&batch, false),
            Err(ContractError::Format { .. })
        ));
    }

    #[test]
    fn test_rejects_foreign_envelopes() {
        let codec = EnvelopeCodec::new();
        let json = codec.serialize(&[publish_event(&codec, "k", "x")]).unwrap();

        let wrong_version = json.replace(r#""specversion":"1.0""#, r#""specversion":"0.3""#);
        let err = codec.deserialize(&wrong_version, false).unwrap_err();
        assert!(matches!(
            err,
            ContractError::Format { ref field, .. } if field == "envelopes.specversion"
        ));

        let bad_id = r#"{"specversion":"1.0","id":"not-a-uuid","source":"s","type":"t",
            "datacontenttype":"application/json","subject":"k","time":"2025-10-30T16:52:04Z",
            "data":{"content":null,"type":"x"}}"#;
        assert!(codec.deserialize(bad_id, false).is_err());

        assert!(codec.deserialize("{not json", false).is_err());
        assert!(codec.deserialize("[1, 2]", true).is_err());
    }

    #[test]
    fn test_decodes_offset_times_to_utc() {
        let codec = EnvelopeCodec::new();
        let json = r#"{"specversion":"1.0","id":"53fcb162-2969-4911-8862-dfb948ccdb9c",
            "source":"s","type":"t","datacontenttype":"application/json","subject":"k",
            "time":"2025-10-30T18:52:04+02:00","data":{"content":null,"type":"x"}}"#;
        let decoded = codec.deserialize(json, false).unwrap();
        let reencoded = codec.serialize(&decoded).unwrap();
        assert!(reencoded.contains(r#""time":"2025-10-30T16:52:04Z""#));
    }

    #[test]
    fn test_rejects_empty_or_invalid_content() {
        let codec = EnvelopeCodec::new();
        let with_content = |content: &str| {
            format!(
                r#"{{"specversion":"1.0","id":"53fcb162-2969-4911-8862-dfb948ccdb9c",
                "source":"s","type":"t","datacontenttype":"application/json","subject":"k",
                "time":"2025-10-30T16:52:04Z","data":{{"content":{content},"type":"x"}}}}"#
            )
        };

        for content in [r#""""#, r#""not base64!""#] {
            match codec.deserialize(&with_content(content), false) {
                Err(ContractError::Format { field, .. }) => {
                    assert_eq!(field, "envelopes.data.content")
                }
                other => panic!("expected format error for {content}, got {other:?}"),
            }
        }

        let valid = codec.deserialize(&with_content(r#""eyJpZCI6IjEifQ==""#), false).unwrap();
        assert_eq!(valid[0].data().content(), Some("eyJpZCI6IjEifQ=="));
        assert!(codec.deserialize(&with_content("null"), false).unwrap()[0].is_removal());
    }
}
