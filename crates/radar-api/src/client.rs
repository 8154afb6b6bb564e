//! CultureRadar REST client

use reqwest::{Client, Response};
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::models::{
    Credentials, EventDetail, JoinRequest, LoginResponse, MyRating, Participation, RatingAverage,
    RatingSubmission, SubscriptionStatus,
};

/// Typed client for the CultureRadar HTTP API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticate against the API
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        info!("Logging in {}", credentials.email);
        let url = format!("{}/login", self.base_url);
        let response = self.client.post(&url).json(credentials).send().await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    /// Fetch an event with its occurrences, sorted ascending by start
    pub async fn event(&self, event_id: i64) -> Result<EventDetail> {
        let url = format!("{}/evenements/{}", self.base_url, event_id);
        debug!("Fetching event from: {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check(response).await?;

        let mut event: EventDetail = response.json().await?;
        event.occurrences.sort_by_key(|o| o.debut);
        Ok(event)
    }

    /// List the current user's participations, future or past
    pub async fn my_participations(&self, token: &str, future: bool) -> Result<Vec<Participation>> {
        let url = format!("{}/me/participations", self.base_url);
        debug!("Fetching participations (future={})", future);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("future", future)])
            .send()
            .await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    /// Join an occurrence; returns the created participation, whose id is
    /// the only handle usable for a later cancellation
    pub async fn join_occurrence(&self, token: &str, occurrence_id: i64) -> Result<Participation> {
        let url = format!("{}/me/participations", self.base_url);
        debug!("Joining occurrence {}", occurrence_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&JoinRequest { occurrence_id })
            .send()
            .await?;
        let response = check(response).await?;

        let participation: Participation = response.json().await?;
        info!(
            "Joined occurrence {} (participation {})",
            occurrence_id, participation.id
        );
        Ok(participation)
    }

    /// Cancel a participation. An already-absent participation counts as
    /// cancelled.
    pub async fn cancel_participation(&self, token: &str, participation_id: i64) -> Result<()> {
        let url = format!("{}/me/participations/{}", self.base_url, participation_id);
        debug!("Cancelling participation {}", participation_id);

        let response = self.client.delete(&url).bearer_auth(token).send().await?;
        match check(response).await {
            Ok(_) => {
                info!("Cancelled participation {}", participation_id);
                Ok(())
            }
            Err(ApiError::NotFound) => {
                debug!("Participation {} already gone", participation_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Subscription state of the current user
    pub async fn subscription_status(&self, token: &str) -> Result<SubscriptionStatus> {
        let url = format!("{}/utilisateurs/me/subscription", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    /// Public rating aggregate of an event (no auth)
    pub async fn rating_average(&self, event_id: i64) -> Result<RatingAverage> {
        let url = format!("{}/evenements/{}/ratings/avg", self.base_url, event_id);
        let response = self.client.get(&url).send().await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    /// The current user's rating of an event; `None` when never rated
    pub async fn my_rating(&self, token: &str, event_id: i64) -> Result<Option<MyRating>> {
        let url = format!("{}/evenements/{}/ratings/me", self.base_url, event_id);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        match check(response).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Upsert the current user's rating; returns the refreshed aggregate
    pub async fn submit_rating(
        &self,
        token: &str,
        event_id: i64,
        submission: &RatingSubmission,
    ) -> Result<RatingAverage> {
        let url = format!("{}/evenements/{}/ratings", self.base_url, event_id);
        debug!("Submitting rating {} for event {}", submission.rating, event_id);

        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(submission)
            .send()
            .await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }
}

/// Map a non-2xx response into the error taxonomy
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify(status.as_u16(), &body))
}

/// FastAPI error bodies carry the human message in a `detail` field
fn classify(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail")?.as_str().map(String::from))
        .unwrap_or_else(|| body.to_string());

    match status {
        401 => ApiError::Unauthenticated,
        403 => ApiError::Forbidden(message),
        404 => ApiError::NotFound,
        _ => ApiError::Api { status, message },
    }
}
