use thiserror::Error;

/// Failures from the market-data client, normalized to a uniform shape.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// No response at all: DNS, connect, TLS or body transfer failure.
    /// The only transient variant, and the only one worth retrying.
    #[error("network error: {0}")]
    Network(String),

    /// A 2xx response whose body failed to decode. Not transient, so
    /// never retried.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The request was superseded by a newer one. Callers treat this as a
    /// no-op, never as a user-visible error.
    #[error("request superseded")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

/// Malformed user input, rejected before it reaches the engines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = FetchError::Api {
            status: 429,
            message: "You've exceeded the Rate Limit".to_string(),
        };
        assert_eq!(err.to_string(), "You've exceeded the Rate Limit (HTTP 429)");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn cancelled_is_distinguished() {
        assert!(FetchError::Cancelled.is_cancelled());
        assert!(!FetchError::Network("connection refused".to_string()).is_cancelled());
    }
}
