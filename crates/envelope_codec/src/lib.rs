//! # Envelope Codec
//!
//! Envelope construction and lossless JSON (de)serialization.
//!
//! Responsibilities:
//! - Build envelopes with fresh ids and timestamps
//! - Encode one envelope as an object, several as an array
//! - Wrap envelopes into the broker's `IngestionRequest` wire form
//!
//! # Example
//!
//! ```
//! use contracts::Data;
//! use envelope_codec::{EnvelopeCodec, IngestionRequest};
//!
//! let codec = EnvelopeCodec::new();
//! let envelope = codec.build("store_5_product:1", "publish", "catalog", Data::removal("product"));
//! let request = IngestionRequest::new(vec![envelope], 5);
//! let wire = request.to_wire_form(&codec).unwrap();
//! let decoded = IngestionRequest::from_wire_form(&wire, &codec).unwrap();
//! assert_eq!(decoded, request);
//! ```

mod codec;
mod ingestion_request;

pub use codec::EnvelopeCodec;
pub use ingestion_request::IngestionRequest;
