//! Typed errors for admin service calls

use thiserror::Error;

/// Errors that can occur when talking to the external admin service.
///
/// `endpoint` names the logical call (lookup, profile, disconnect, logs,
/// invalidation) for log lines; the message is what the user sees inline.
#[derive(Error, Debug, Clone)]
pub enum AdminError {
    /// The service answered 2xx but reported a domain error in the payload
    #[error("{endpoint}: {message}")]
    Service {
        endpoint: &'static str,
        message: String,
    },

    /// The service answered with a non-success status
    #[error("{endpoint}: HTTP {status} - {message}")]
    Http {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    /// The call failed before any response arrived
    #[error("{endpoint}: network error - {message}")]
    Network {
        endpoint: &'static str,
        message: String,
    },

    /// A response arrived but could not be decoded
    #[error("{endpoint}: unreadable response - {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
}

impl AdminError {
    /// Create a service-reported domain error
    pub fn service(endpoint: &'static str, message: impl Into<String>) -> Self {
        AdminError::Service {
            endpoint,
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http(endpoint: &'static str, status: u16, message: impl Into<String>) -> Self {
        AdminError::Http {
            endpoint,
            status,
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(endpoint: &'static str, message: impl Into<String>) -> Self {
        AdminError::Network {
            endpoint,
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(endpoint: &'static str, message: impl Into<String>) -> Self {
        AdminError::Decode {
            endpoint,
            message: message.into(),
        }
    }

    /// Get the endpoint name for this error
    pub fn endpoint(&self) -> &'static str {
        match self {
            AdminError::Service { endpoint, .. }
            | AdminError::Http { endpoint, .. }
            | AdminError::Network { endpoint, .. }
            | AdminError::Decode { endpoint, .. } => endpoint,
        }
    }

    /// The message shown inline next to the failing form
    pub fn message(&self) -> &str {
        match self {
            AdminError::Service { message, .. }
            | AdminError::Http { message, .. }
            | AdminError::Network { message, .. }
            | AdminError::Decode { message, .. } => message,
        }
    }

    /// HTTP status, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            AdminError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is an authentication failure (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
