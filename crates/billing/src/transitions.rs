//! Plan transitions
//!
//! Executes the four user-initiated plan changes and keeps the displayed
//! entitlement consistent with backend truth after each one. The state
//! machine over `{currentPlan, planCancelled}`:
//!
//! - `Free --upgrade--> Paid` via hosted checkout; the flip to Paid lands
//!   out-of-band through a webhook and is observed on the next fetch.
//! - `Paid --downgrade--> PaidCancelling`; benefits run until renewal.
//! - `PaidCancelling --resume--> Paid`.
//! - `PaidCancelling --period rollover--> Free`, purely server-driven.
//!
//! Each direct transition runs request, then re-fetch, then return, strictly
//! in that order. The in-flight request may still complete server-side even
//! if the user dismisses the surface that started it, so the re-fetch happens
//! on every success path rather than being skipped on optimistic grounds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use analogous_api::{ApiError, SubscriptionApi, TokenProvider};
use analogous_shared::UserId;
use url::Url;

use crate::entitlement::{Entitlement, EntitlementResolver};
use crate::gateway::BillingGateway;

/// Result of a redirect-based action (upgrade, manage subscription)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Navigate the browser here
    Redirect(Url),
    /// A previous invocation of the same action is still in flight; this
    /// trigger is a no-op.
    AlreadyPending,
}

/// Result of a direct backend transition (downgrade, resume)
#[derive(Debug)]
pub enum TransitionOutcome {
    /// The backend acknowledged the change and the entitlement shown here
    /// was re-read afterwards.
    Completed {
        message: String,
        entitlement: Entitlement,
    },
    /// A previous invocation of the same action is still in flight
    AlreadyPending,
}

/// Clears its flag on every exit path, error or not, so no failure can leave
/// a control stuck in its disabled state.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Executes plan transitions with per-action duplicate-click protection.
///
/// Downgrade is reversible but feels destructive; surfaces must ask for
/// explicit confirmation before calling [`downgrade`](Self::downgrade).
pub struct PlanTransitionController {
    api: Arc<dyn SubscriptionApi>,
    gateway: Arc<dyn BillingGateway>,
    tokens: Arc<dyn TokenProvider>,
    resolver: EntitlementResolver,
    upgrade_in_flight: AtomicBool,
    downgrade_in_flight: AtomicBool,
    resume_in_flight: AtomicBool,
    portal_in_flight: AtomicBool,
}

impl PlanTransitionController {
    pub fn new(
        api: Arc<dyn SubscriptionApi>,
        gateway: Arc<dyn BillingGateway>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let resolver = EntitlementResolver::new(api.clone(), tokens.clone());
        Self {
            api,
            gateway,
            tokens,
            resolver,
            upgrade_in_flight: AtomicBool::new(false),
            downgrade_in_flight: AtomicBool::new(false),
            resume_in_flight: AtomicBool::new(false),
            portal_in_flight: AtomicBool::new(false),
        }
    }

    /// Re-read entitlement, e.g. on page mount or when returning from a
    /// hosted checkout flow.
    pub fn resolver(&self) -> &EntitlementResolver {
        &self.resolver
    }

    /// Start the upgrade checkout flow.
    ///
    /// Returns the hosted checkout URL to navigate to. The plan change
    /// itself arrives via webhook and becomes visible on a later fetch; if
    /// the user cancels at checkout they simply come back still on the free
    /// tier, which is not an error.
    pub async fn upgrade(
        &self,
        user: &UserId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<RedirectOutcome, ApiError> {
        let Some(_guard) = InFlightGuard::acquire(&self.upgrade_in_flight) else {
            return Ok(RedirectOutcome::AlreadyPending);
        };

        let url = self.gateway.checkout_url(user, success_url, cancel_url).await?;
        tracing::info!(user_id = %user, "Upgrade checkout redirect ready");
        Ok(RedirectOutcome::Redirect(url))
    }

    /// Schedule a downgrade to the free tier at the end of the billing
    /// period. On success the acknowledged state has `planCancelled` set
    /// while the paid plan continues until the renewal date.
    pub async fn downgrade(&self, user: &UserId) -> Result<TransitionOutcome, ApiError> {
        let Some(_guard) = InFlightGuard::acquire(&self.downgrade_in_flight) else {
            return Ok(TransitionOutcome::AlreadyPending);
        };

        let bearer = self.tokens.bearer_token().await?;
        let ack = self.api.downgrade_plan(user, &bearer).await?;
        let entitlement = self.resolver.fetch(user).await?;

        tracing::info!(user_id = %user, "Downgrade scheduled and entitlement refreshed");
        Ok(TransitionOutcome::Completed {
            message: ack.message,
            entitlement,
        })
    }

    /// Cancel a pending downgrade.
    ///
    /// Only meaningful from the cancelling state; anywhere else the call is
    /// rejected locally without reaching the backend.
    pub async fn resume(
        &self,
        user: &UserId,
        current: &Entitlement,
    ) -> Result<TransitionOutcome, ApiError> {
        if !current.cancellation_pending() {
            return Err(ApiError::TransitionRejected {
                detail: "There is no pending cancellation to resume.".to_string(),
            });
        }

        let Some(_guard) = InFlightGuard::acquire(&self.resume_in_flight) else {
            return Ok(TransitionOutcome::AlreadyPending);
        };

        let bearer = self.tokens.bearer_token().await?;
        let ack = self.api.resume_plan(user, &bearer).await?;
        let entitlement = self.resolver.fetch(user).await?;

        tracing::info!(user_id = %user, "Plan resumed and entitlement refreshed");
        Ok(TransitionOutcome::Completed {
            message: ack.message,
            entitlement,
        })
    }

    /// Open the billing provider's subscription portal.
    ///
    /// Callers hide the control when no billing subscription exists; this is
    /// the backstop for surfaces that offered it anyway.
    pub async fn manage_subscription(
        &self,
        user: &UserId,
        current: &Entitlement,
    ) -> Result<RedirectOutcome, ApiError> {
        if !current.can_manage_subscription() {
            return Err(ApiError::PortalUnavailable);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.portal_in_flight) else {
            return Ok(RedirectOutcome::AlreadyPending);
        };

        let url = self.gateway.portal_url(user).await?;
        tracing::info!(user_id = %user, "Billing portal redirect ready");
        Ok(RedirectOutcome::Redirect(url))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use analogous_api::{CheckoutSession, MessageResponse, PortalSession, StaticTokenProvider};
    use analogous_shared::PricingStats;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use uuid::Uuid;

    fn scholar_stats(cancelled: bool) -> PricingStats {
        PricingStats {
            current_plan: "scholar".to_string(),
            renewal_date: None,
            analogies_generated_today: 1,
            analogies_stored_total: 10,
            upcoming_plan: cancelled.then(|| "curious".to_string()),
            plan_cancelled: cancelled,
            subscription_start_date: None,
            stripe_subscription_id: Some("sub_123".to_string()),
        }
    }

    fn curious_stats() -> PricingStats {
        PricingStats {
            current_plan: "curious".to_string(),
            renewal_date: None,
            analogies_generated_today: 0,
            analogies_stored_total: 0,
            upcoming_plan: None,
            plan_cancelled: false,
            subscription_start_date: None,
            stripe_subscription_id: None,
        }
    }

    /// Fake backend tracking call counts
    struct FakeApi {
        stats: PricingStats,
        reject_downgrade: Option<String>,
        stats_calls: AtomicUsize,
        downgrade_calls: AtomicUsize,
        resume_calls: AtomicUsize,
    }

    impl FakeApi {
        fn new(stats: PricingStats) -> Self {
            Self {
                stats,
                reject_downgrade: None,
                stats_calls: AtomicUsize::new(0),
                downgrade_calls: AtomicUsize::new(0),
                resume_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SubscriptionApi for FakeApi {
        async fn pricing_stats(&self, _: &UserId, _: &str) -> Result<PricingStats, ApiError> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.stats.clone())
        }

        async fn downgrade_plan(&self, _: &UserId, _: &str) -> Result<MessageResponse, ApiError> {
            self.downgrade_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(detail) = &self.reject_downgrade {
                return Err(ApiError::TransitionRejected {
                    detail: detail.clone(),
                });
            }
            Ok(MessageResponse {
                message: "Downgrade scheduled".to_string(),
            })
        }

        async fn resume_plan(&self, _: &UserId, _: &str) -> Result<MessageResponse, ApiError> {
            self.resume_calls.fetch_add(1, Ordering::SeqCst);
            Ok(MessageResponse {
                message: "Plan resumed".to_string(),
            })
        }

        async fn create_checkout_session(
            &self,
            _: &UserId,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<CheckoutSession, ApiError> {
            Ok(CheckoutSession {
                session_id: "cs_test".to_string(),
                url: Some("https://checkout.example.com/cs_test".to_string()),
            })
        }

        async fn create_portal_session(
            &self,
            _: &UserId,
            _: &str,
        ) -> Result<PortalSession, ApiError> {
            Ok(PortalSession {
                url: "https://billing.example.com/portal".to_string(),
            })
        }
    }

    /// Fake gateway that holds each call open long enough for a second
    /// trigger to land while the first is pending
    struct SlowGateway {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl BillingGateway for SlowGateway {
        async fn checkout_url(
            &self,
            _: &UserId,
            _: &str,
            _: &str,
        ) -> Result<Url, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(Url::parse("https://checkout.example.com/cs_test").unwrap())
        }

        async fn portal_url(&self, _: &UserId) -> Result<Url, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(Url::parse("https://billing.example.com/portal").unwrap())
        }
    }

    fn controller(
        api: Arc<FakeApi>,
        gateway: Arc<SlowGateway>,
    ) -> PlanTransitionController {
        PlanTransitionController::new(
            api,
            gateway,
            Arc::new(StaticTokenProvider::new("tok")),
        )
    }

    fn slow_gateway(delay_ms: u64) -> Arc<SlowGateway> {
        Arc::new(SlowGateway {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(delay_ms),
        })
    }

    #[tokio::test]
    async fn downgrade_refetches_entitlement_exactly_once() {
        let api = Arc::new(FakeApi::new(scholar_stats(true)));
        let ctrl = controller(api.clone(), slow_gateway(0));
        let user = UserId(Uuid::new_v4());

        let outcome = ctrl.downgrade(&user).await.unwrap();
        match outcome {
            TransitionOutcome::Completed {
                message,
                entitlement,
            } => {
                assert_eq!(message, "Downgrade scheduled");
                assert!(entitlement.cancellation_pending());
            }
            TransitionOutcome::AlreadyPending => panic!("unexpected pending state"),
        }

        assert_eq!(api.downgrade_calls.load(Ordering::SeqCst), 1);
        // Exactly one authoritative re-read before completion was reported
        assert_eq!(api.stats_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_downgrade_keeps_detail_and_skips_the_refetch() {
        let mut api = FakeApi::new(curious_stats());
        api.reject_downgrade = Some("No active subscription to cancel".to_string());
        let api = Arc::new(api);
        let ctrl = controller(api.clone(), slow_gateway(0));
        let user = UserId(Uuid::new_v4());

        let err = ctrl.downgrade(&user).await.unwrap_err();
        assert_eq!(err.user_message(), "No active subscription to cancel");
        assert_eq!(api.stats_calls.load(Ordering::SeqCst), 0);

        // The failure cleared the in-flight flag: a retry reaches the backend
        let _ = ctrl.downgrade(&user).await;
        assert_eq!(api.downgrade_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resume_requires_a_pending_cancellation() {
        let api = Arc::new(FakeApi::new(curious_stats()));
        let ctrl = controller(api.clone(), slow_gateway(0));
        let user = UserId(Uuid::new_v4());
        let current = Entitlement::from_stats(user, &curious_stats());

        let err = ctrl.resume(&user, &current).await.unwrap_err();
        assert!(matches!(err, ApiError::TransitionRejected { .. }));
        // Rejected locally, before any request went out
        assert_eq!(api.resume_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resume_from_cancelling_state_refetches() {
        let api = Arc::new(FakeApi::new(scholar_stats(true)));
        let ctrl = controller(api.clone(), slow_gateway(0));
        let user = UserId(Uuid::new_v4());
        let current = Entitlement::from_stats(user, &scholar_stats(true));

        let outcome = ctrl.resume(&user, &current).await.unwrap();
        assert!(matches!(outcome, TransitionOutcome::Completed { .. }));
        assert_eq!(api.resume_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.stats_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn double_click_upgrade_sends_one_request() {
        let api = Arc::new(FakeApi::new(curious_stats()));
        let gateway = slow_gateway(50);
        let ctrl = controller(api, gateway.clone());
        let user = UserId(Uuid::new_v4());

        let (first, second) = tokio::join!(
            ctrl.upgrade(&user, "https://app/pricing?checkout=success", "https://app/pricing?checkout=cancelled"),
            ctrl.upgrade(&user, "https://app/pricing?checkout=success", "https://app/pricing?checkout=cancelled"),
        );

        let outcomes = [first.unwrap(), second.unwrap()];
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, RedirectOutcome::Redirect(_))));
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, RedirectOutcome::AlreadyPending)));
    }

    #[tokio::test]
    async fn upgrade_can_be_retried_after_completion() {
        let api = Arc::new(FakeApi::new(curious_stats()));
        let gateway = slow_gateway(0);
        let ctrl = controller(api, gateway.clone());
        let user = UserId(Uuid::new_v4());

        for _ in 0..2 {
            let outcome = ctrl
                .upgrade(&user, "https://app/s", "https://app/c")
                .await
                .unwrap();
            assert!(matches!(outcome, RedirectOutcome::Redirect(_)));
        }
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn portal_is_suppressed_without_a_billing_subscription() {
        let api = Arc::new(FakeApi::new(curious_stats()));
        let gateway = slow_gateway(0);
        let ctrl = controller(api, gateway.clone());
        let user = UserId(Uuid::new_v4());
        let current = Entitlement::from_stats(user, &curious_stats());

        let err = ctrl.manage_subscription(&user, &current).await.unwrap_err();
        assert!(matches!(err, ApiError::PortalUnavailable));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn portal_opens_with_a_billing_subscription() {
        let api = Arc::new(FakeApi::new(scholar_stats(false)));
        let gateway = slow_gateway(0);
        let ctrl = controller(api, gateway);
        let user = UserId(Uuid::new_v4());
        let current = Entitlement::from_stats(user, &scholar_stats(false));

        let outcome = ctrl.manage_subscription(&user, &current).await.unwrap();
        match outcome {
            RedirectOutcome::Redirect(url) => {
                assert_eq!(url.as_str(), "https://billing.example.com/portal");
            }
            RedirectOutcome::AlreadyPending => panic!("unexpected pending state"),
        }
    }
}
