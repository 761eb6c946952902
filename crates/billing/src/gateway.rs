//! Hosted billing flows
//!
//! Checkout and subscription management happen on the billing provider's own
//! pages. The client's only job is to obtain a redirect URL; once the browser
//! navigates away the flow is not cancellable, and the outcome is observed
//! on a later pricing-stats read.

use std::sync::Arc;

use analogous_api::{ApiClient, ApiError, SubscriptionApi, TokenProvider};
use analogous_shared::UserId;
use async_trait::async_trait;
use url::Url;

/// Source of hosted checkout and portal redirects
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Redirect URL for the hosted checkout flow. Success and cancel both
    /// return the user to the pricing page.
    async fn checkout_url(
        &self,
        user: &UserId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<Url, ApiError>;

    /// Redirect URL for the billing provider's subscription portal
    async fn portal_url(&self, user: &UserId) -> Result<Url, ApiError>;
}

/// Gateway backed by the backend's session-creation endpoints
pub struct HostedBillingGateway {
    api: Arc<ApiClient>,
    tokens: Arc<dyn TokenProvider>,
}

impl HostedBillingGateway {
    pub fn new(api: Arc<ApiClient>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { api, tokens }
    }
}

#[async_trait]
impl BillingGateway for HostedBillingGateway {
    async fn checkout_url(
        &self,
        user: &UserId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<Url, ApiError> {
        let bearer = self.tokens.bearer_token().await?;
        let session = self
            .api
            .create_checkout_session(user, &bearer, success_url, cancel_url)
            .await
            .map_err(into_redirect_failure)?;

        let raw = session.url.ok_or_else(|| {
            ApiError::RedirectFailure("checkout session has no redirect URL".to_string())
        })?;
        Url::parse(&raw).map_err(|e| ApiError::RedirectFailure(e.to_string()))
    }

    async fn portal_url(&self, user: &UserId) -> Result<Url, ApiError> {
        let bearer = self.tokens.bearer_token().await?;
        let session = self
            .api
            .create_portal_session(user, &bearer)
            .await
            .map_err(into_redirect_failure)?;

        Url::parse(&session.url).map_err(|e| ApiError::RedirectFailure(e.to_string()))
    }
}

/// Session-creation failures become redirect failures; an expired session
/// still routes to re-login rather than a retry banner.
fn into_redirect_failure(err: ApiError) -> ApiError {
    match err {
        ApiError::AuthenticationRequired => ApiError::AuthenticationRequired,
        other => ApiError::RedirectFailure(other.user_message()),
    }
}
