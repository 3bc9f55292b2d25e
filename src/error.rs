use thiserror::Error;

/// Failure modes of a completion call, classified so callers can tell
/// transport problems from credential problems from service-side errors.
///
/// The controller treats every variant the same way (it enters the failed
/// state), but the kind is kept in the display output for diagnostics.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Transport or connectivity failure, including a bounded-wait timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Missing or rejected credential.
    #[error("auth error: {0}")]
    Auth(String),

    /// Service was reachable but returned an error payload.
    #[error("service error: {0}")]
    Remote(String),

    /// Service answered successfully but with no usable content.
    #[error("empty response: {0}")]
    EmptyResponse(String),
}

impl ServiceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::EmptyResponse(message.into())
    }
}
