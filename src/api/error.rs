//! Failures talking to the Workers API, and the message shown for each.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused connection, reset).
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// 401 from the API; the caller must drop the session.
    #[error("session rejected by the API")]
    Unauthorized,

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode API response: {0}")]
    Decode(String),

    /// A 2xx response whose envelope carried `success: false`.
    #[error("API rejected the request: {0}")]
    Rejected(String),
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }
        ApiError::Status {
            status: status.as_u16(),
            message: body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Auth failures and rejected payloads cannot succeed on a repeat attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ApiError::Rejected(_))
            && !matches!(self.status(), Some(401) | Some(403) | Some(422))
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Network(_) => "Network error. Please check your connection and try again.",
            ApiError::Timeout(_) => "The request timed out. Please try again.",
            ApiError::Decode(_) | ApiError::Rejected(_) => "Something went wrong. Please try again.",
            ApiError::Unauthorized | ApiError::Status { .. } => match self.status() {
                Some(401) => "Your session has expired. Please sign in again.",
                Some(403) => "You do not have permission to access this resource.",
                Some(404) => "The requested data could not be found.",
                Some(422) => "The submitted data is invalid. Please review your input.",
                Some(code) if code >= 500 => {
                    "The server encountered an error. Please try again later."
                }
                _ => "Something went wrong. Please try again.",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::from_status(StatusCode::from_u16(code).unwrap(), String::new())
    }

    #[test]
    fn unauthorized_status_maps_to_dedicated_variant() {
        assert!(matches!(status(401), ApiError::Unauthorized));
        assert!(matches!(status(404), ApiError::Status { status: 404, .. }));
    }

    #[test]
    fn each_category_has_its_message() {
        assert_eq!(
            status(401).user_message(),
            "Your session has expired. Please sign in again."
        );
        assert_eq!(
            status(403).user_message(),
            "You do not have permission to access this resource."
        );
        assert_eq!(status(404).user_message(), "The requested data could not be found.");
        assert_eq!(
            status(422).user_message(),
            "The submitted data is invalid. Please review your input."
        );
        assert_eq!(
            status(503).user_message(),
            "The server encountered an error. Please try again later."
        );
        assert_eq!(status(418).user_message(), "Something went wrong. Please try again.");
        assert_eq!(
            ApiError::Timeout(100).user_message(),
            "The request timed out. Please try again."
        );
        assert_eq!(
            ApiError::Network("refused".into()).user_message(),
            "Network error. Please check your connection and try again."
        );
    }

    #[test]
    fn deterministic_failures_are_not_retried() {
        assert!(!status(401).is_retryable());
        assert!(!status(403).is_retryable());
        assert!(status(500).is_retryable());
        assert!(!status(422).is_retryable());
        assert!(!ApiError::Rejected("bad filter".into()).is_retryable());
        assert!(status(404).is_retryable());
        assert!(ApiError::Timeout(10).is_retryable());
    }
}
