use thiserror::Error;
use validator::ValidationErrors;

/// Transport-level failures. Every variant except [`ConnectionError::InvalidEndpoint`] is
/// resolved by the reconnect loop and only ever surfaces as a status change.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The configured endpoint cannot be turned into a WebSocket URI.
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        /// Offending endpoint as built from the configuration.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Opening the socket failed.
    #[error("connect failed: {0}")]
    Connect(String),
    /// Reading or writing on an open socket failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// The socket is not open.
    #[error("connection closed")]
    Closed,
}

/// A received frame that cannot be decoded. The frame is dropped and state is left untouched.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not a valid envelope.
    #[error("invalid frame: {0}")]
    InvalidJson(#[source] serde_json::Error),
    /// The payload does not match the shape expected for its tag.
    #[error("invalid {action} payload: {source}")]
    InvalidPayload {
        /// Tag of the rejected frame.
        action: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// A field required by the tag is absent.
    #[error("{action} payload is missing {field}")]
    MissingField {
        /// Tag of the rejected frame.
        action: String,
        /// Name of the missing field.
        field: &'static str,
    },
}

/// Errors returned to presentation code when building or queueing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// User input rejected before anything was sent.
    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationErrors),
    /// The command refers to a team or bumper missing from the snapshot.
    #[error("not found: {0}")]
    NotFound(String),
    /// The connection manager has shut down.
    #[error("connection manager stopped")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use validator::ValidationError;

    use super::*;

    #[test]
    fn validation_errors_keep_the_field_name() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("team_name_taken"));
        let err = CommandError::from(errors);
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn missing_field_names_the_action() {
        let err = ProtocolError::MissingField {
            action: "START".into(),
            field: "GAME",
        };
        assert_eq!(err.to_string(), "START payload is missing GAME");
    }
}
