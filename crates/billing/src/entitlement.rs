//! Entitlement Resolution
//!
//! Provides a unified view of what a user can do based on their plan and
//! usage. This module answers the question: "What does this user's plan
//! grant right now?"
//!
//! The view is owned by whichever surface last fetched it. Re-fetching is
//! always safe and is how webhook-driven changes (checkout completion,
//! period rollover, forced downgrade after payment failure) become visible.

use std::sync::Arc;

use analogous_api::{ApiError, SubscriptionApi, TokenProvider};
use analogous_shared::{Plan, PlanLimits, PlanState, PricingStats, UsageSnapshot, UserId};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::display;

/// Nominal billing cycle length, used when the subscription start date is
/// unavailable. Matches the backend, which rolls renewal dates forward by
/// 30 days on each cycle.
pub const DEFAULT_BILLING_CYCLE_DAYS: u32 = 30;

/// A consistent plan + usage view for one user
#[derive(Debug, Clone, Serialize)]
pub struct Entitlement {
    pub user_id: UserId,
    pub plan: Plan,
    pub state: PlanState,
    pub usage: UsageSnapshot,
    pub limits: PlanLimits,
    /// Set when a paid subscription began
    pub subscription_started_on: Option<Date>,
    /// Present whenever an active or recently-active subscription exists at
    /// the billing provider. Gates the "Manage Subscription" affordance.
    pub billing_subscription_id: Option<String>,
    /// When this view was read from the backend
    pub fetched_at: OffsetDateTime,
}

impl Entitlement {
    pub fn from_stats(user_id: UserId, stats: &PricingStats) -> Self {
        let plan = stats.plan();
        Self {
            user_id,
            plan,
            state: stats.plan_state(),
            usage: stats.usage(),
            limits: plan.limits(),
            subscription_started_on: stats.subscription_start_date,
            billing_subscription_id: stats.stripe_subscription_id.clone(),
            fetched_at: OffsetDateTime::now_utc(),
        }
    }

    /// Calendar days until the current billing period ends; 0 on the free
    /// tier and on or after the renewal date.
    pub fn days_remaining(&self, today: Date) -> u32 {
        self.state.days_remaining(today)
    }

    /// Length of the current billing cycle in days.
    ///
    /// Derived from the subscription start and renewal dates when both are
    /// known; otherwise the nominal 30-day cycle. The derived value wins
    /// because annual or promo cycles would otherwise render a misleading
    /// progress bar.
    pub fn billing_cycle_days(&self) -> u32 {
        match (self.subscription_started_on, self.state.renews_on()) {
            (Some(start), Some(renewal)) => {
                let days = (renewal - start).whole_days();
                if days > 0 {
                    days as u32
                } else {
                    DEFAULT_BILLING_CYCLE_DAYS
                }
            }
            _ => DEFAULT_BILLING_CYCLE_DAYS,
        }
    }

    /// How far through the billing cycle we are, clamped to [0, 100]
    pub fn cycle_progress_percent(&self, today: Date) -> f64 {
        if !self.state.is_paid() {
            return 0.0;
        }
        let cycle = self.billing_cycle_days();
        let remaining = self.days_remaining(today).min(cycle);
        display::usage_percentage(cycle - remaining, cycle)
    }

    /// True while a scheduled downgrade has not yet taken effect
    pub fn cancellation_pending(&self) -> bool {
        self.state.cancellation_pending()
    }

    /// Whether the billing-provider portal may be offered at all
    pub fn can_manage_subscription(&self) -> bool {
        self.billing_subscription_id.is_some()
    }

    /// Today's generation usage against the daily cap, in [0, 100]
    pub fn generation_usage_percent(&self) -> f64 {
        display::usage_percentage(self.usage.generated_today, self.limits.daily_generations)
    }

    /// Library usage against the storage cap, in [0, 100]
    pub fn storage_usage_percent(&self) -> f64 {
        display::usage_percentage(self.usage.stored_total, self.limits.stored_analogies)
    }
}

/// Produces entitlement views, tolerating backend latency and failure.
///
/// Fetch failures are fail-soft for display: the resolver holds no cache and
/// never overwrites anything, so a caller that keeps its previous view keeps
/// rendering it while showing a dismissible notice.
pub struct EntitlementResolver {
    api: Arc<dyn SubscriptionApi>,
    tokens: Arc<dyn TokenProvider>,
}

impl EntitlementResolver {
    pub fn new(api: Arc<dyn SubscriptionApi>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self { api, tokens }
    }

    /// One read of the pricing-stats view.
    ///
    /// The bearer token is re-derived from the session on every call, never
    /// cached here, so rotation is picked up and an expired session surfaces
    /// as [`ApiError::AuthenticationRequired`] instead of a silent retry.
    pub async fn fetch(&self, user: &UserId) -> Result<Entitlement, ApiError> {
        let bearer = self.tokens.bearer_token().await?;
        let stats = self.api.pricing_stats(user, &bearer).await.map_err(|e| {
            tracing::warn!(user_id = %user, error = %e, "Entitlement fetch failed");
            e
        })?;
        Ok(Entitlement::from_stats(*user, &stats))
    }
}
