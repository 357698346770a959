use reqwest::StatusCode;
use thiserror::Error;

/// Result of a single relay turn: the upstream JSON payload, or a failure
/// that already knows which status and message the caller should see.
pub type Outcome = Result<serde_json::Value, RelayError>;

const UNAVAILABLE_MESSAGE: &str = "Weather service unavailable";
const UPSTREAM_FALLBACK_MESSAGE: &str = "Weather service error";
const API_KEY_MARKER: &str = "Invalid API key";

/// Every way a relay turn can fail.
///
/// `Display` renders the client-facing message only. Diagnostic detail
/// (transport errors, unparsable bodies) stays in the variant's fields and
/// is meant for server-side logs.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Either city name or coordinates (lat, lon) are required")]
    MissingLocation,

    #[error("Invalid value for '{name}': expected a number")]
    InvalidParameter { name: &'static str, value: String },

    #[error("Weather service unavailable")]
    Unavailable(#[source] reqwest::Error),

    #[error("Weather service timeout")]
    Timeout(#[source] reqwest::Error),

    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal server error")]
    Internal { detail: String },
}

impl RelayError {
    /// HTTP status the caller should receive.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingLocation | RelayError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a reqwest failure.
    ///
    /// The request URL carries the API key, so it is stripped before the
    /// error is stored or logged. Only timeouts and connection-level failures
    /// map to 504/503; anything else is an internal error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let err = err.without_url();

        if err.is_timeout() {
            RelayError::Timeout(err)
        } else if err.is_connect() || err.is_request() {
            RelayError::Unavailable(err)
        } else {
            RelayError::internal(format!("HTTP client error: {err}"))
        }
    }

    /// Build an upstream application error from the provider's status and the
    /// message it reported, if any.
    ///
    /// Rejections that reveal whether the configured credential is valid are
    /// reported as a plain 503 with the generic unavailability text.
    pub fn upstream(status: StatusCode, message: Option<String>) -> Self {
        match message {
            Some(m) if m.contains(API_KEY_MARKER) => RelayError::Upstream {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: UNAVAILABLE_MESSAGE.to_string(),
            },
            Some(message) => RelayError::Upstream { status, message },
            None => RelayError::Upstream { status, message: UPSTREAM_FALLBACK_MESSAGE.to_string() },
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        RelayError::Internal { detail: detail.into() }
    }

    /// True for failures caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RelayError::MissingLocation | RelayError::InvalidParameter { .. })
    }
}
