//! Daily streak endpoints
//!
//! Streak computation (validation, resets, longest-streak tracking) is
//! backend logic; the client reads the result and acknowledges resets.

use analogous_shared::UserId;
use serde::Deserialize;
use time::Date;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::StatusMessage;

/// Response of `GET /user/{id}/streak`
#[derive(Debug, Clone, Deserialize)]
pub struct StreakInfo {
    pub status: String,
    pub current_streak_count: u32,
    pub longest_streak_count: u32,
    #[serde(default)]
    pub last_streak_date: Option<Date>,
    #[serde(default)]
    pub last_analogy_time: Option<String>,
    pub is_streak_active: bool,
    #[serde(default)]
    pub days_since_last_analogy: Option<i64>,
    /// True until the user acknowledges a broken streak
    #[serde(default)]
    pub streak_was_reset: bool,
}

/// Response of `GET /user/{id}/streak-logs`
#[derive(Debug, Clone, Deserialize)]
pub struct StreakLogs {
    pub status: String,
    /// Days within the requested month on which an analogy was generated
    pub streak_logs: Vec<Date>,
    pub year: i32,
    pub month: u8,
}

impl ApiClient {
    /// Current streak. The backend validates and resets broken streaks as a
    /// side effect of this read.
    pub async fn user_streak(&self, user: &UserId, bearer: &str) -> ApiResult<StreakInfo> {
        let response = self.get(&format!("/user/{}/streak", user), bearer).await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }

    /// Streak log days for one calendar month
    pub async fn streak_logs(
        &self,
        user: &UserId,
        year: i32,
        month: u8,
        bearer: &str,
    ) -> ApiResult<StreakLogs> {
        let response = self
            .get(
                &format!("/user/{}/streak-logs?year={}&month={}", user, year, month),
                bearer,
            )
            .await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }

    /// Dismiss the streak-reset notification
    pub async fn acknowledge_streak_reset(
        &self,
        user: &UserId,
        bearer: &str,
    ) -> ApiResult<StatusMessage> {
        let response = self
            .post::<()>(
                &format!("/user/{}/acknowledge-streak-reset", user),
                bearer,
                None,
            )
            .await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }
}
