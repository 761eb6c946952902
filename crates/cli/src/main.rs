//! Entitlement inspector for the Analogous backend
//!
//! Fetches the current plan, usage, and billing-cycle state for a user and
//! prints them the way the pricing page would render them. Useful for
//! debugging webhook-driven state without opening the app.
//!
//! Usage:
//!   ANALOGOUS_API_URL=... ANALOGOUS_ACCESS_TOKEN=... analogous [user-id]
//!
//! The user id defaults to the access token's subject claim.

use std::sync::Arc;

use analogous_api::{
    user_id_from_token, ApiClient, ApiConfig, ApiError, StaticTokenProvider,
};
use analogous_billing::{format_usage, Entitlement, EntitlementResolver, UsageLevel};
use analogous_shared::UserId;
use anyhow::Context;
use time::OffsetDateTime;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analogous=info".into()),
        )
        .init();

    let token = std::env::var("ANALOGOUS_ACCESS_TOKEN")
        .context("ANALOGOUS_ACCESS_TOKEN must be set to a current session token")?;

    let user_id = match std::env::args().nth(1) {
        Some(arg) => UserId::from(
            arg.parse::<Uuid>()
                .context("user id argument is not a UUID")?,
        ),
        None => user_id_from_token(&token)
            .context("could not derive the user id from the access token; pass it as an argument")?,
    };

    let config = ApiConfig::from_env()?;
    tracing::debug!(user_id = %user_id, api = %config.base_url, "Fetching entitlement");
    let api = Arc::new(ApiClient::new(config)?);
    let tokens = Arc::new(StaticTokenProvider::new(token));
    let resolver = EntitlementResolver::new(api, tokens);

    match resolver.fetch(&user_id).await {
        Ok(entitlement) => {
            print_summary(&entitlement);
            Ok(())
        }
        Err(ApiError::AuthenticationRequired) => {
            eprintln!("Your session has expired. Sign in again and retry.");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Could not fetch entitlement: {}", e.user_message());
            if e.is_transient() {
                eprintln!("This looks temporary; retrying may help.");
            }
            std::process::exit(1);
        }
    }
}

fn print_summary(entitlement: &Entitlement) {
    let today = OffsetDateTime::now_utc().date();

    println!("Plan: {}", entitlement.plan);

    if entitlement.cancellation_pending() {
        match entitlement.state.renews_on() {
            Some(date) => println!(
                "Cancellation pending: Scholar benefits continue until {} ({} days left)",
                date,
                entitlement.days_remaining(today)
            ),
            None => println!("Cancellation pending"),
        }
    } else if entitlement.plan.is_paid() {
        println!(
            "Renews in {} days ({:.0}% through the billing cycle)",
            entitlement.days_remaining(today),
            entitlement.cycle_progress_percent(today)
        );
    }

    print_meter(
        "Generations today",
        entitlement.usage.generated_today,
        entitlement.limits.daily_generations,
    );
    print_meter(
        "Stored analogies ",
        entitlement.usage.stored_total,
        entitlement.limits.stored_analogies,
    );

    println!(
        "Rate limit: {} generation(s) per minute",
        entitlement.limits.generations_per_minute
    );
    println!(
        "Manage subscription: {}",
        if entitlement.can_manage_subscription() {
            "available"
        } else {
            "unavailable (no billing subscription on file)"
        }
    );
}

fn print_meter(label: &str, current: u32, limit: u32) {
    let level = UsageLevel::for_usage(current, limit);
    println!("{}: {} [{}]", label, format_usage(current, limit), level);
}
