//! Layered error definitions
//!
//! Categorized by source: entity / wire format / transport / broker / config

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Caller Errors =====
    /// Malformed entity id, unresolvable entity type
    #[error("validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    // ===== Wire Format Errors =====
    /// Malformed wire JSON on deserialize
    #[error("format error at '{field}': {message}")]
    Format { field: String, message: String },

    /// Payload cannot be JSON-encoded
    #[error("serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Delivery Errors =====
    /// Network, timeout or TLS failure on the direct channel
    #[error("transport error for '{endpoint}': {message}")]
    Transport {
        endpoint: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Broker unavailable on the queued channel
    #[error("publish error for '{destination}': {message}")]
    Publish {
        destination: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Configuration Errors =====
    /// No settings exist for the tenant
    #[error("unknown tenant: {tenant_id}")]
    UnknownTenant { tenant_id: i64 },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create wire format error
    pub fn format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create serialization error wrapping the encoder failure
    pub fn serialization(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create transport error without an underlying cause
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create transport error wrapping the client failure
    pub fn transport_with_source(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create broker publish error without an underlying cause
    pub fn publish(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            destination: destination.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create broker publish error wrapping the client failure
    pub fn publish_with_source(
        destination: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Publish {
            destination: destination.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Transport and broker failures are channel-local and may succeed later.
    /// Everything else is a data or programming defect.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Publish { .. })
    }

    /// Render the error followed by every `source()` in its chain
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            current = cause.source();
        }
        rendered
    }
}
