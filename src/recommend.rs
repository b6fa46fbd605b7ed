//! Client for the external recommendation service.
//!
//! The service only returns ranked ids; rows are materialized through the
//! catalog so recommendations carry the same aggregates as browse results.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::kind::ResourceKind;

#[async_trait]
pub trait Recommender: Send + Sync {
    /// Collaborative-filtering ids for a user, best first.
    async fn for_user(&self, user_id: &str) -> Result<Vec<String>, ApiError>;

    /// Content-based ids similar to one listing, best first.
    async fn similar_to(&self, kind: ResourceKind, id: Uuid) -> Result<Vec<String>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UserRecommendations {
    #[serde(default)]
    recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SimilarRecommendations {
    #[serde(default)]
    recommendation: Vec<String>,
}

#[derive(Clone)]
pub struct HttpRecommender {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecommender {
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn for_user(&self, user_id: &str) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/recsys/cf/recommend", self.base_url);
        let body: Envelope<UserRecommendations> = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "user_id": user_id }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::debug!(user_id, count = body.data.recommendations.len(), "user recommendations received");
        Ok(body.data.recommendations)
    }

    async fn similar_to(&self, kind: ResourceKind, id: Uuid) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/cb-recsys/{}/{id}", self.base_url, kind.discriminator());
        let body: Envelope<SimilarRecommendations> = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::debug!(%kind, %id, count = body.data.recommendation.len(), "similar listings received");
        Ok(body.data.recommendation)
    }
}
