//! Analogous API Client
//!
//! Thin HTTP wrappers around the Analogous backend. Each call takes a bearer
//! token obtained immediately beforehand from a [`TokenProvider`]; tokens are
//! never cached across calls because the identity provider rotates them.

pub mod analogies;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod pricing;
pub mod streak;

pub use analogies::{
    AnalogyRecord, CountResponse, GenerateAnalogyRequest, GeneratedAnalogy, LifetimeCountResponse,
    StatusMessage, UserAnalogies,
};
pub use auth::{user_id_from_token, StaticTokenProvider, TokenProvider};
pub use client::{ApiClient, HealthReport, SignUpRequest};
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use pricing::{CheckoutSession, MessageResponse, PortalSession, SubscriptionApi};
pub use streak::{StreakInfo, StreakLogs};
