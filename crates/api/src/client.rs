//! Backend HTTP client

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Error body convention used by every backend endpoint
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// Fallback when the backend sent no usable `detail`
const GENERIC_FAILURE: &str = "The request could not be completed. Please try again.";

/// HTTP client for the Analogous backend
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Build a client with the configured request timeout
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub(crate) async fn get(&self, path: &str, bearer: &str) -> ApiResult<Response> {
        Ok(self
            .http
            .get(self.endpoint(path))
            .bearer_auth(bearer)
            .send()
            .await?)
    }

    pub(crate) async fn post<B: Serialize>(
        &self,
        path: &str,
        bearer: &str,
        body: Option<&B>,
    ) -> ApiResult<Response> {
        let mut req = self.http.post(self.endpoint(path)).bearer_auth(bearer);
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req.send().await?)
    }

    pub(crate) async fn delete(&self, path: &str, bearer: &str) -> ApiResult<Response> {
        Ok(self
            .http
            .delete(self.endpoint(path))
            .bearer_auth(bearer)
            .send()
            .await?)
    }

    pub(crate) async fn patch(&self, path: &str, bearer: &str) -> ApiResult<Response> {
        Ok(self
            .http
            .patch(self.endpoint(path))
            .bearer_auth(bearer)
            .send()
            .await?)
    }

    /// Map a display-read response: expired sessions redirect to login,
    /// anything else non-2xx is a fail-soft fetch error that must leave the
    /// previously rendered view in place.
    pub(crate) async fn check_fetch(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthenticationRequired);
        }
        if !status.is_success() {
            return Err(ApiError::EntitlementFetchFailed { status });
        }
        Ok(response)
    }

    /// Map a transition response, preferring the backend's `detail` verbatim
    pub(crate) async fn check_transition(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthenticationRequired);
        }
        if !status.is_success() {
            return Err(ApiError::TransitionRejected {
                detail: Self::read_detail(response).await,
            });
        }
        Ok(response)
    }

    /// Map any other request's response
    pub(crate) async fn check_request(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::AuthenticationRequired);
        }
        if !status.is_success() {
            return Err(ApiError::RequestFailed {
                status,
                detail: Self::read_detail(response).await,
            });
        }
        Ok(response)
    }

    pub(crate) async fn read_detail(response: Response) -> String {
        match response.json::<ErrorBody>().await {
            Ok(ErrorBody {
                detail: Some(detail),
            }) if !detail.is_empty() => detail,
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    pub(crate) async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> ApiResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Backend liveness probe, unauthenticated
    pub async fn health(&self) -> ApiResult<HealthReport> {
        let response = self.http.get(self.endpoint("/health")).send().await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }

    /// Create a new account. Login itself is the identity provider's flow;
    /// signup goes through the backend so the profile row exists.
    pub async fn sign_up(&self, request: &SignUpRequest) -> ApiResult<crate::MessageResponse> {
        let response = self
            .http
            .post(self.endpoint("/signup"))
            .json(request)
            .send()
            .await?;
        let response = Self::check_request(response).await?;
        Self::decode(response).await
    }
}

/// Account creation request
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub opt_in_email_marketing: bool,
}

/// Backend health response
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
