//! Analogous Entitlement Core
//!
//! Resolves what a user's plan currently grants, executes plan transitions,
//! and formats usage for display. Subscription truth lives with the billing
//! provider and arrives via webhooks server-side; this crate tolerates that
//! eventual consistency by treating every fresh pricing-stats read as
//! authoritative and never trusting its own optimistic view of a change.

pub mod display;
pub mod entitlement;
pub mod gateway;
pub mod transitions;

pub use display::{format_usage, usage_percentage, UsageLevel};
pub use entitlement::{Entitlement, EntitlementResolver, DEFAULT_BILLING_CYCLE_DAYS};
pub use gateway::{BillingGateway, HostedBillingGateway};
pub use transitions::{PlanTransitionController, RedirectOutcome, TransitionOutcome};
