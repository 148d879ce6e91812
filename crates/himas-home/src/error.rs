use thiserror::Error;

/// Longest slice of a transport error or response body shown to users.
pub const MAX_ERROR_DETAIL: usize = 100;

/// Why a Home Assistant service call failed.
///
/// `Display` is the user-facing message; the executor passes it through as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Home Assistant answered with something other than 200.
    #[error("Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Cannot connect to Home Assistant")]
    Connect,

    #[error("Request timed out")]
    Timeout,

    #[error("Error: {0}")]
    Other(String),
}

impl ServiceError {
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: truncate(body, MAX_ERROR_DETAIL),
        }
    }

    pub fn other(detail: impl std::fmt::Display) -> Self {
        Self::Other(truncate(&detail.to_string(), MAX_ERROR_DETAIL))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect
        } else {
            Self::other(e)
        }
    }
}

/// First `max` characters of `s` (char-aligned).
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_body_is_truncated() {
        let long = "x".repeat(250);
        let err = ServiceError::status(500, &long);
        let msg = err.to_string();
        assert_eq!(msg, format!("Error 500: {}", "x".repeat(100)));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ServiceError::Connect.to_string(),
            "Cannot connect to Home Assistant"
        );
        assert_eq!(ServiceError::Timeout.to_string(), "Request timed out");
        assert_eq!(ServiceError::other("boom").to_string(), "Error: boom");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
