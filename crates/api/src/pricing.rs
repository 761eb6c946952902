//! Subscription and billing endpoints
//!
//! Reads come from the merged pricing-stats view; plan transitions are
//! requested here but the authoritative subscription record is mutated by the
//! billing provider's webhooks server-side. Callers therefore re-read
//! pricing-stats after every transition instead of trusting their own
//! optimistic view.

use analogous_shared::{PricingStats, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

/// Acknowledgement body of the transition endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Hosted checkout session created by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    /// Hosted payment page to redirect the browser to
    pub url: Option<String>,
}

/// Hosted billing portal session
#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

#[derive(Debug, Serialize)]
struct CreateCheckoutRequest<'a> {
    success_url: &'a str,
    cancel_url: &'a str,
}

/// Subscription operations consumed by the entitlement layer.
///
/// A trait so the resolver and transition controller can be driven by fakes
/// in tests without a live backend.
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// `GET /user/{id}/pricing-stats`. Idempotent and safe to repeat, e.g.
    /// on tab focus, to pick up webhook-driven changes.
    async fn pricing_stats(&self, user: &UserId, bearer: &str) -> ApiResult<PricingStats>;

    /// `POST /user/{id}/downgrade-plan`. Schedules the downgrade for the end
    /// of the billing period; benefits continue until the renewal date.
    async fn downgrade_plan(&self, user: &UserId, bearer: &str) -> ApiResult<MessageResponse>;

    /// `POST /user/{id}/resume-plan`. Clears a pending downgrade.
    async fn resume_plan(&self, user: &UserId, bearer: &str) -> ApiResult<MessageResponse>;

    /// `POST /user/{id}/create-checkout-session`. Returns the hosted checkout
    /// redirect; the upgrade itself lands later via webhook.
    async fn create_checkout_session(
        &self,
        user: &UserId,
        bearer: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> ApiResult<CheckoutSession>;

    /// `POST /user/{id}/create-portal-session`
    async fn create_portal_session(&self, user: &UserId, bearer: &str)
        -> ApiResult<PortalSession>;
}

#[async_trait]
impl SubscriptionApi for ApiClient {
    async fn pricing_stats(&self, user: &UserId, bearer: &str) -> ApiResult<PricingStats> {
        let response = self
            .get(&format!("/user/{}/pricing-stats", user), bearer)
            .await?;
        let response = Self::check_fetch(response).await?;
        let stats: PricingStats = Self::decode(response).await?;

        tracing::debug!(
            user_id = %user,
            plan = %stats.plan(),
            plan_cancelled = stats.plan_cancelled,
            "Fetched pricing stats"
        );
        Ok(stats)
    }

    async fn downgrade_plan(&self, user: &UserId, bearer: &str) -> ApiResult<MessageResponse> {
        let response = self
            .post::<()>(&format!("/user/{}/downgrade-plan", user), bearer, None)
            .await?;
        let response = Self::check_transition(response).await?;
        let ack: MessageResponse = Self::decode(response).await?;

        tracing::info!(user_id = %user, "Scheduled plan downgrade");
        Ok(ack)
    }

    async fn resume_plan(&self, user: &UserId, bearer: &str) -> ApiResult<MessageResponse> {
        let response = self
            .post::<()>(&format!("/user/{}/resume-plan", user), bearer, None)
            .await?;
        let response = Self::check_transition(response).await?;
        let ack: MessageResponse = Self::decode(response).await?;

        tracing::info!(user_id = %user, "Resumed plan");
        Ok(ack)
    }

    async fn create_checkout_session(
        &self,
        user: &UserId,
        bearer: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> ApiResult<CheckoutSession> {
        let body = CreateCheckoutRequest {
            success_url,
            cancel_url,
        };
        let response = self
            .post(
                &format!("/user/{}/create-checkout-session", user),
                bearer,
                Some(&body),
            )
            .await?;
        let response = Self::check_transition(response).await?;
        let session: CheckoutSession = Self::decode(response).await?;

        tracing::info!(
            user_id = %user,
            session_id = %session.session_id,
            "Created checkout session"
        );
        Ok(session)
    }

    async fn create_portal_session(
        &self,
        user: &UserId,
        bearer: &str,
    ) -> ApiResult<PortalSession> {
        let response = self
            .post::<()>(&format!("/user/{}/create-portal-session", user), bearer, None)
            .await?;
        let response = Self::check_transition(response).await?;
        let session: PortalSession = Self::decode(response).await?;

        tracing::info!(user_id = %user, "Created billing portal session");
        Ok(session)
    }
}
