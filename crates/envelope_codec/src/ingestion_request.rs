//! IngestionRequest - envelopes bound to a store, as carried through the broker

use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use contracts::{subjects, ContractError, Envelope};

use crate::EnvelopeCodec;

const FIELD_IS_BATCH: &str = "isBatch";
const FIELD_STORE_ID: &str = "storeId";
const FIELD_CLOUD_EVENTS: &str = "cloudEvents";

/// Envelopes plus the target store.
///
/// The batch flag is derived from the envelope count and cannot be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionRequest {
    envelopes: Vec<Envelope>,
    tenant_id: i64,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(rename = "isBatch")]
    is_batch: bool,
    #[serde(rename = "storeId")]
    store_id: i64,
    #[serde(rename = "cloudEvents")]
    cloud_events: &'a RawValue,
}

impl IngestionRequest {
    pub fn new(envelopes: Vec<Envelope>, tenant_id: i64) -> Self {
        Self {
            envelopes,
            tenant_id,
        }
    }

    pub fn envelopes(&self) -> &[Envelope] {
        &self.envelopes
    }

    pub fn into_envelopes(self) -> Vec<Envelope> {
        self.envelopes
    }

    pub fn tenant_id(&self) -> i64 {
        self.tenant_id
    }

    /// `true` unless exactly one envelope is carried
    pub fn is_batch(&self) -> bool {
        self.envelopes.len() != 1
    }

    /// Subject keys of the carried envelopes, in order
    pub fn subjects(&self) -> Vec<String> {
        subjects(&self.envelopes)
    }

    /// `{"isBatch":..,"storeId":..,"cloudEvents":..}` with the codec output
    /// embedded as JSON, not as a string
    ///
    /// # Errors
    /// `Serialization` if the envelopes cannot be encoded
    pub fn to_wire_form(&self, codec: &EnvelopeCodec) -> Result<String, ContractError> {
        let serialized = codec.serialize(&self.envelopes)?;
        let cloud_events = RawValue::from_string(serialized)
            .map_err(|e| ContractError::serialization("codec produced invalid JSON", e))?;

        serde_json::to_string(&WireRequest {
            is_batch: self.is_batch(),
            store_id: self.tenant_id,
            cloud_events: &cloud_events,
        })
        .map_err(|e| ContractError::serialization("failed to encode ingestion request", e))
    }

    /// Parse the wire form back into a request
    ///
    /// # Errors
    /// `Format` naming the missing or invalid field, when `cloudEvents` is
    /// empty, or when the `isBatch` flag disagrees with the envelope count
    pub fn from_wire_form(json: &str, codec: &EnvelopeCodec) -> Result<Self, ContractError> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| ContractError::format("request", format!("malformed JSON: {e}")))?;
        let Value::Object(mut fields) = document else {
            return Err(ContractError::format("request", "request must be a JSON object"));
        };

        let is_batch = read_is_batch(&fields)?;
        let tenant_id = read_store_id(&fields)?;
        let cloud_events = fields
            .remove(FIELD_CLOUD_EVENTS)
            .ok_or_else(|| ContractError::format(FIELD_CLOUD_EVENTS, "missing field"))?;

        let text = serde_json::to_string(&cloud_events)
            .map_err(|e| ContractError::format(FIELD_CLOUD_EVENTS, e.to_string()))?;
        let envelopes = codec.deserialize(&text, is_batch)?;
        if envelopes.is_empty() {
            return Err(ContractError::format(
                FIELD_CLOUD_EVENTS,
                "request must carry at least one envelope",
            ));
        }

        let request = Self::new(envelopes, tenant_id);
        if request.is_batch() != is_batch {
            return Err(ContractError::format(
                FIELD_IS_BATCH,
                format!(
                    "isBatch={is_batch} is inconsistent with {} envelope(s)",
                    request.envelopes.len()
                ),
            ));
        }
        Ok(request)
    }
}

fn read_is_batch(fields: &Map<String, Value>) -> Result<bool, ContractError> {
    match fields.get(FIELD_IS_BATCH) {
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(other) => Err(ContractError::format(
            FIELD_IS_BATCH,
            format!("expected a boolean, got {other}"),
        )),
        None => Err(ContractError::format(FIELD_IS_BATCH, "missing field")),
    }
}

fn read_store_id(fields: &Map<String, Value>) -> Result<i64, ContractError> {
    let invalid = |value: &Value| {
        ContractError::format(FIELD_STORE_ID, format!("expected an integer, got {value}"))
    };

    match fields.get(FIELD_STORE_ID) {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| invalid(&Value::Number(n.clone()))),
        // Numeric strings are accepted, as produced by loosely typed producers
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(&Value::String(s.clone()))),
        Some(other) => Err(invalid(other)),
        None => Err(ContractError::format(FIELD_STORE_ID, "missing field")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Data;
    use serde_json::json;

    const STORE_ID: i64 = 5;

    /// Replace the generated id/time so two wire forms can be compared
    fn standardize(json: &str) -> Value {
        let mut value: Value = serde_json::from_str(json).unwrap();
        let mut scrub = |event: &mut Value| {
            event["id"] = json!("123");
            event["time"] = json!("2025-10-30T16:52:04Z");
        };
        match &mut value["cloudEvents"] {
            Value::Array(events) => events.iter_mut().for_each(&mut scrub),
            event => scrub(event),
        }
        value
    }

    #[test]
    fn test_single_event_to_and_from_json() {
        let codec = EnvelopeCodec::new();
        let event = codec.build(
            "publish-key",
            "publish",
            "source",
            Data::new(Some(b"Data to be published".as_slice()), "type"),
        );
        let request = IngestionRequest::new(vec![event], STORE_ID);
        assert!(!request.is_batch());

        let wire = request.to_wire_form(&codec).unwrap();
        let expected = json!({
            "isBatch": false,
            "storeId": 5,
            "cloudEvents": {
                "specversion": "1.0",
                "id": "123",
                "source": "source",
                "type": "publish",
                "datacontenttype": "application/json",
                "subject": "publish-key",
                "time": "2025-10-30T16:52:04Z",
                "data": {
                    "content": "RGF0YSB0byBiZSBwdWJsaXNoZWQ=",
                    "type": "type"
                }
            }
        });
        assert_eq!(standardize(&wire), expected);

        let recreated = IngestionRequest::from_wire_form(&wire, &codec).unwrap();
        assert_eq!(recreated, request);
        assert_eq!(recreated.to_wire_form(&codec).unwrap(), wire);
    }

    #[test]
    fn test_multiple_events_to_and_from_json() {
        let codec = EnvelopeCodec::new();
        let events = vec![
            codec.build(
                "publish-key-1",
                "publish",
                "source-1",
                Data::new(Some(b"Data to be published 1".as_slice()), "type-1"),
            ),
            codec.build(
                "publish-key-2",
                "publish",
                "source-2",
                Data::new(Some(b"Data to be published 2".as_slice()), "type-2"),
            ),
            codec.build("unpublish-key-1", "unpublish", "source-3", Data::removal("type-3")),
            codec.build("unpublish-key-2", "unpublish", "source-4", Data::removal("type-4")),
        ];
        let request = IngestionRequest::new(events, STORE_ID);
        assert!(request.is_batch());

        let wire = request.to_wire_form(&codec).unwrap();
        let value = standardize(&wire);
        assert_eq!(value["isBatch"], json!(true));
        assert_eq!(value["cloudEvents"].as_array().map(Vec::len), Some(4));
        assert_eq!(
            value["cloudEvents"][0]["data"]["content"],
            json!("RGF0YSB0byBiZSBwdWJsaXNoZWQgMQ==")
        );
        assert_eq!(value["cloudEvents"][3]["data"]["content"], Value::Null);
        assert_eq!(value["cloudEvents"][3]["subject"], json!("unpublish-key-2"));

        let recreated = IngestionRequest::from_wire_form(&wire, &codec).unwrap();
        assert_eq!(recreated.tenant_id(), STORE_ID);
        assert_eq!(recreated.envelopes(), request.envelopes());
        assert_eq!(recreated.to_wire_form(&codec).unwrap(), wire);
    }

    #[test]
    fn test_cloud_events_are_not_double_encoded() {
        let codec = EnvelopeCodec::new();
        let request = IngestionRequest::new(
            vec![codec.build("k", "unpublish", "s", Data::removal("t"))],
            1,
        );
        let value: Value = serde_json::from_str(&request.to_wire_form(&codec).unwrap()).unwrap();
        assert!(value["cloudEvents"].is_object());
    }

    #[test]
    fn test_missing_and_invalid_fields_are_named() {
        let codec = EnvelopeCodec::new();
        let event = r#"{"specversion":"1.0","id":"53fcb162-2969-4911-8862-dfb948ccdb9c",
            "source":"s","type":"t","datacontenttype":"application/json","subject":"k",
            "time":"2025-10-30T16:52:04Z","data":{"content":null,"type":"x"}}"#;

        let cases = [
            (format!(r#"{{"storeId":5,"cloudEvents":{event}}}"#), "isBatch"),
            (format!(r#"{{"isBatch":false,"cloudEvents":{event}}}"#), "storeId"),
            (r#"{"isBatch":false,"storeId":5}"#.to_string(), "cloudEvents"),
            (format!(r#"{{"isBatch":false,"storeId":"five","cloudEvents":{event}}}"#), "storeId"),
            (format!(r#"{{"isBatch":"no","storeId":5,"cloudEvents":{event}}}"#), "isBatch"),
        ];

        for (json, expected_field) in cases {
            match IngestionRequest::from_wire_form(&json, &codec) {
                Err(ContractError::Format { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected format error for {expected_field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_numeric_string_store_id_is_accepted() {
        let codec = EnvelopeCodec::new();
        let request =
            IngestionRequest::new(vec![codec.build("k", "u", "s", Data::removal("t"))], 7);
        let wire = request
            .to_wire_form(&codec)
            .unwrap()
            .replace(r#""storeId":7"#, r#""storeId":"7""#);
        assert_eq!(IngestionRequest::from_wire_form(&wire, &codec).unwrap().tenant_id(), 7);
    }

    #[test]
    fn test_single_element_batch_is_rejected() {
        let codec = EnvelopeCodec::new();
        let event = codec.build("k", "u", "s", Data::removal("t"));
        let one_element_array = codec.serialize_batch(&[event]).unwrap();
        let json = format!(r#"{{"isBatch":true,"storeId":1,"cloudEvents":{one_element_array}}}"#);
        match IngestionRequest::from_wire_form(&json, &codec) {
            Err(ContractError::Format { field, .. }) => assert_eq!(field, "isBatch"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        let codec = EnvelopeCodec::new();
        assert!(matches!(
            IngestionRequest::from_wire_form("{\"isBatch\":", &codec),
            Err(ContractError::Format { .. })
        ));
        assert!(matches!(
            IngestionRequest::from_wire_form("[]", &codec),
            Err(ContractError::Format { .. })
        ));
    }

    #[test]
    fn test_empty_cloud_events_is_rejected() {
        let codec = EnvelopeCodec::new();
        match IngestionRequest::from_wire_form(
            r#"{"isBatch":true,"storeId":5,"cloudEvents":[]}"#,
            &codec,
        ) {
            Err(ContractError::Format { field, .. }) => assert_eq!(field, "cloudEvents"),
            other => panic!("expected format error, got {other:?}"),
        }
    }
}
