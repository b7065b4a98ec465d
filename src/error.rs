use reqwest::StatusCode;
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failures of a single call against the order-book service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("service answered with code {code}")]
    Application { code: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("order response carried no orderId")]
    MissingOrderId,

    #[error("invalid credential header value: {0}")]
    InvalidCredential(String),
}

impl ClientError {
    /// True when the service itself turned the request down, as opposed to the
    /// request never getting an intelligible answer.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Status { .. } | ClientError::Application { .. })
    }
}

/// A depth level that cannot take part in aggregation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("level {index}: {field} {value:?} is not a decimal number")]
    Malformed {
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("level {index}: {field} must be positive, got {value}")]
    NonPositive {
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("level {index}: running total overflowed")]
    Overflow { index: usize },
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cancelling resting orders failed: {0}")]
    Cancel(#[source] ClientError),

    #[error("placing order {client_order_id} failed: {source}")]
    Place {
        client_order_id: String,
        #[source]
        source: ClientError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Credential(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        let status = ClientError::Status { status: StatusCode::BAD_REQUEST, body: "insufficient liquidity".into() };
        let app = ClientError::Application { code: "ERR".into() };
        assert!(status.is_rejection());
        assert!(app.is_rejection());
        assert!(!ClientError::Decode("not json".into()).is_rejection());
        assert!(!ClientError::MissingOrderId.is_rejection());
    }

    #[test]
    fn test_seed_error_names_the_order() {
        let err = SeedError::Place {
            client_order_id: "00000002-0000-0000-0000-000000000002".into(),
            source: ClientError::MissingOrderId,
        };
        assert!(err.to_string().contains("00000002-0000-0000-0000-000000000002"));
    }
}
