//! Common types used across the Analogous client

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

// =============================================================================
// ID Wrappers
// =============================================================================

/// User ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Analogy ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalogyId(pub Uuid);

impl AnalogyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnalogyId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AnalogyId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AnalogyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Plans and limits
// =============================================================================

/// Subscription plan
///
/// Plan values are business constants shared with the backend. The backend
/// enforces the limits; the client only displays them, so the two tables must
/// match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free tier
    Curious,
    /// Paid tier
    Scholar,
}

impl Default for Plan {
    fn default() -> Self {
        Self::Curious
    }
}

impl Plan {
    /// Analogies that may be generated per day
    pub fn daily_generation_cap(&self) -> u32 {
        match self {
            Self::Curious => 20,
            Self::Scholar => 100,
        }
    }

    /// Analogies that may be kept in the user's library
    pub fn storage_cap(&self) -> u32 {
        match self {
            Self::Curious => 100,
            Self::Scholar => 500,
        }
    }

    /// Generation requests allowed per minute
    pub fn generations_per_minute(&self) -> u32 {
        match self {
            Self::Curious => 1,
            Self::Scholar => 5,
        }
    }

    /// All limits for this plan as one value
    pub fn limits(&self) -> PlanLimits {
        PlanLimits {
            daily_generations: self.daily_generation_cap(),
            stored_analogies: self.storage_cap(),
            generations_per_minute: self.generations_per_minute(),
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Scholar)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Curious => write!(f, "curious"),
            Self::Scholar => write!(f, "scholar"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            // "free" is the legacy spelling still present in older accounts
            "curious" | "free" => Ok(Self::Curious),
            "scholar" => Ok(Self::Scholar),
            _ => Err(format!("Invalid plan: {}", s)),
        }
    }
}

/// Usage limits granted by a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub daily_generations: u32,
    pub stored_analogies: u32,
    pub generations_per_minute: u32,
}

// =============================================================================
// Pricing-stats wire shape
// =============================================================================

/// Response body of `GET /user/{id}/pricing-stats`, exactly as the backend
/// sends it. Nullable fields are only a serialization concern; convert to
/// [`PlanState`] immediately after deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingStats {
    pub current_plan: String,
    #[serde(default)]
    pub renewal_date: Option<Date>,
    #[serde(default)]
    pub analogies_generated_today: u32,
    #[serde(default)]
    pub analogies_stored_total: u32,
    #[serde(default)]
    pub upcoming_plan: Option<String>,
    #[serde(default)]
    pub plan_cancelled: bool,
    #[serde(default)]
    pub subscription_start_date: Option<Date>,
    // The backend keeps this one key in snake_case
    #[serde(rename = "stripe_subscription_id", default)]
    pub stripe_subscription_id: Option<String>,
}

impl PricingStats {
    /// Parse the plan, defaulting to the free tier for unknown values
    pub fn plan(&self) -> Plan {
        self.current_plan.parse().unwrap_or_default()
    }

    pub fn usage(&self) -> UsageSnapshot {
        UsageSnapshot {
            generated_today: self.analogies_generated_today,
            stored_total: self.analogies_stored_total,
        }
    }

    pub fn plan_state(&self) -> PlanState {
        PlanState::from_stats(self)
    }
}

/// Point-in-time usage counters, always fetched fresh and never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Generations today, reset daily by the backend
    pub generated_today: u32,
    /// All non-deleted analogies owned by the user
    pub stored_total: u32,
}

// =============================================================================
// Plan state
// =============================================================================

/// Subscription state as a tagged value.
///
/// The backend encodes this as a combination of nullable fields
/// (`upcomingPlan`, `planCancelled`, `renewalDate`); that shape exists only at
/// the wire boundary. A pending downgrade is always "active until period end",
/// never immediate, so `PaidCancelling` still grants Scholar benefits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlanState {
    /// Curious, nothing pending
    Free,
    /// Scholar in good standing
    Paid { renews_on: Option<Date> },
    /// Scholar with a downgrade scheduled for the end of the billing period
    PaidCancelling { renews_on: Option<Date> },
}

impl PlanState {
    /// Derive the tagged state from the wire shape.
    ///
    /// Conversion is lenient: a stray `planCancelled` or `upcomingPlan` on a
    /// free account is ignored, and a renewal date on a free account is
    /// meaningless and dropped.
    pub fn from_stats(stats: &PricingStats) -> Self {
        match stats.plan() {
            Plan::Curious => Self::Free,
            Plan::Scholar if stats.plan_cancelled => Self::PaidCancelling {
                renews_on: stats.renewal_date,
            },
            Plan::Scholar => Self::Paid {
                renews_on: stats.renewal_date,
            },
        }
    }

    pub fn plan(&self) -> Plan {
        match self {
            Self::Free => Plan::Curious,
            Self::Paid { .. } | Self::PaidCancelling { .. } => Plan::Scholar,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.plan().is_paid()
    }

    /// True while a scheduled downgrade has not yet taken effect
    pub fn cancellation_pending(&self) -> bool {
        matches!(self, Self::PaidCancelling { .. })
    }

    /// End of the current billing period, when one exists
    pub fn renews_on(&self) -> Option<Date> {
        match self {
            Self::Free => None,
            Self::Paid { renews_on } | Self::PaidCancelling { renews_on } => *renews_on,
        }
    }

    /// Whole calendar days until the renewal date, clamped at zero.
    ///
    /// Defined as 0 for the free tier regardless of any renewal date the
    /// backend may have sent. Computed with calendar-date arithmetic so the
    /// countdown never drifts across timezones or DST boundaries.
    pub fn days_remaining(&self, today: Date) -> u32 {
        match self.renews_on() {
            Some(renewal) => (renewal - today).whole_days().max(0) as u32,
            None => 0,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
