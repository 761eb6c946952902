//! Analogy endpoints
//!
//! Generation, prompt construction, and image synthesis all live server-side;
//! these wrappers only move the documented request/response shapes.

use analogous_shared::{AnalogyId, UserId};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

/// Request body for `POST /generate-analogy`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateAnalogyRequest {
    pub topic: String,
    pub audience: String,
    pub user_id: UserId,
}

/// A freshly generated (or regenerated) analogy
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedAnalogy {
    pub status: String,
    pub id: AnalogyId,
    /// Chaptered analogy content; the client renders it opaquely
    pub analogy: serde_json::Value,
    pub analogy_images: Vec<String>,
    pub topic: String,
    pub audience: String,
    pub created_at: String,
    pub streak_popup_shown: bool,
}

/// A stored analogy as returned by the history listing
#[derive(Debug, Clone, Deserialize)]
pub struct AnalogyRecord {
    pub id: AnalogyId,
    pub topic: String,
    pub audience: String,
    pub analogy_json: serde_json::Value,
    pub image_urls: Vec<String>,
    pub created_at: String,
}

/// Response of `GET /user/{id}/analogies`
#[derive(Debug, Clone, Deserialize)]
pub struct UserAnalogies {
    pub status: String,
    pub analogies: Vec<AnalogyRecord>,
    pub count: usize,
}

/// Generic `{status, message}` acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

/// Response of `GET /user/{id}/analogies-count`
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    pub status: String,
    pub count: u64,
}

/// Response of `GET /user/{id}/lifetime-analogies-count`
#[derive(Debug, Clone, Deserialize)]
pub struct LifetimeCountResponse {
    pub status: String,
    pub lifetime_count: u64,
}

impl ApiClient {
    /// Generate a new analogy. Slow by nature; the configured request timeout
    /// bounds the wait, and the backend's own `detail` (timeout, overload) is
    /// surfaced verbatim.
    pub async fn generate_analogy(
        &self,
        request: &GenerateAnalogyRequest,
        bearer: &str,
    ) -> ApiResult<GeneratedAnalogy> {
        let response = self.post("/generate-analogy", bearer, Some(request)).await?;
        let response = Self::check_request(response).await?;
        let analogy: GeneratedAnalogy = Self::decode(response).await?;

        tracing::info!(
            user_id = %request.user_id,
            analogy_id = %analogy.id,
            "Generated analogy"
        );
        Ok(analogy)
    }

    pub async fn get_analogy(&self, id: &AnalogyId, bearer: &str) -> ApiResult<GeneratedAnalogy> {
        let response = self.get(&format!("/analogy/{}", id), bearer).await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }

    /// Full history for a user, newest first
    pub async fn user_analogies(&self, user: &UserId, bearer: &str) -> ApiResult<UserAnalogies> {
        let response = self.get(&format!("/user/{}/analogies", user), bearer).await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }

    pub async fn delete_analogy(&self, id: &AnalogyId, bearer: &str) -> ApiResult<StatusMessage> {
        let response = self.delete(&format!("/analogy/{}", id), bearer).await?;
        let response = Self::check_request(response).await?;
        let ack: StatusMessage = Self::decode(response).await?;

        tracing::info!(analogy_id = %id, "Deleted analogy");
        Ok(ack)
    }

    /// Re-run generation for an existing analogy's topic and audience
    pub async fn regenerate_analogy(
        &self,
        id: &AnalogyId,
        bearer: &str,
    ) -> ApiResult<GeneratedAnalogy> {
        let response = self
            .post::<()>(&format!("/regenerate-analogy/{}", id), bearer, None)
            .await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }

    /// Count of currently stored analogies
    pub async fn analogies_count(&self, user: &UserId, bearer: &str) -> ApiResult<u64> {
        let response = self
            .get(&format!("/user/{}/analogies-count", user), bearer)
            .await?;
        let response = Self::check_request(response).await?;
        let body: CountResponse = Self::decode(response).await?;
        Ok(body.count)
    }

    /// Lifetime generation count, deletions included
    pub async fn lifetime_analogies_count(&self, user: &UserId, bearer: &str) -> ApiResult<u64> {
        let response = self
            .get(&format!("/user/{}/lifetime-analogies-count", user), bearer)
            .await?;
        let response = Self::check_request(response).await?;
        let body: LifetimeCountResponse = Self::decode(response).await?;
        Ok(body.lifetime_count)
    }

    /// Mark the post-generation streak popup as dismissed for an analogy
    pub async fn mark_streak_popup_shown(
        &self,
        id: &AnalogyId,
        user: &UserId,
        bearer: &str,
    ) -> ApiResult<StatusMessage> {
        let response = self
            .patch(
                &format!("/analogy/{}/streak-popup-shown?user_id={}", id, user),
                bearer,
            )
            .await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }
}
