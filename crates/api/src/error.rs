//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the backend API client.
///
/// Every variant maps to one user-visible behavior: re-login, a dismissible
/// notice over the previous view, a verbatim backend message, or a retry
/// offer. None of them should escape an initiating handler unconverted.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Session token missing, expired, or rejected. Resolved by sending the
    /// user back to login; never retried silently with the same token.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The pricing-stats read failed. Callers keep whatever entitlement view
    /// they already rendered and show a dismissible notice.
    #[error("Entitlement fetch failed with HTTP status {status}")]
    EntitlementFetchFailed { status: StatusCode },

    /// The backend declined a plan transition. `detail` is shown verbatim.
    #[error("{detail}")]
    TransitionRejected { detail: String },

    /// A hosted checkout or portal redirect could not be initiated
    #[error("Redirect failed: {0}")]
    RedirectFailure(String),

    /// Subscription management was requested without a billing subscription
    /// on file. The UI hides the control; this is the degrade path.
    #[error("No billing subscription on file. Upgrade first to manage your subscription.")]
    PortalUnavailable,

    /// Non-success response outside the entitlement and transition paths
    #[error("Request failed with HTTP status {status}: {detail}")]
    RequestFailed { status: StatusCode, detail: String },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the documented contract
    #[error("Malformed response: {0}")]
    Decode(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl ApiError {
    /// Message suitable for direct display, preferring the backend's own
    /// wording whenever it sent one.
    pub fn user_message(&self) -> String {
        match self {
            Self::TransitionRejected { detail } => detail.clone(),
            Self::RequestFailed { detail, .. } if !detail.is_empty() => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Whether a manual retry is worth offering
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::EntitlementFetchFailed { status } | Self::RequestFailed { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// Result type alias for client operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_rejected_message_is_verbatim() {
        let err = ApiError::TransitionRejected {
            detail: "No active subscription to cancel".to_string(),
        };
        assert_eq!(err.user_message(), "No active subscription to cancel");
        assert_eq!(err.to_string(), "No active subscription to cancel");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::EntitlementFetchFailed {
            status: StatusCode::BAD_GATEWAY
        }
        .is_transient());
        assert!(ApiError::RequestFailed {
            status: StatusCode::TOO_MANY_REQUESTS,
            detail: String::new(),
        }
        .is_transient());
        assert!(!ApiError::AuthenticationRequired.is_transient());
        assert!(!ApiError::PortalUnavailable.is_transient());
        assert!(!ApiError::EntitlementFetchFailed {
            status: StatusCode::NOT_FOUND
        }
        .is_transient());
    }
}
