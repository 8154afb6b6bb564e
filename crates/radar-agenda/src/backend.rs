//! Trait seam over the REST API
//!
//! The coordinator, gating policy and rating flow talk to the API through
//! this trait so tests can substitute a fake backend.

use async_trait::async_trait;
use radar_api::{
    ApiClient, EventDetail, MyRating, Participation, RatingAverage, RatingSubmission,
    SubscriptionStatus,
};

/// The slice of the CultureRadar API the agenda core consumes
#[async_trait]
pub trait AgendaBackend: Send + Sync {
    async fn event(&self, event_id: i64) -> radar_api::Result<EventDetail>;

    async fn my_participations(
        &self,
        token: &str,
        future: bool,
    ) -> radar_api::Result<Vec<Participation>>;

    async fn join_occurrence(
        &self,
        token: &str,
        occurrence_id: i64,
    ) -> radar_api::Result<Participation>;

    async fn cancel_participation(
        &self,
        token: &str,
        participation_id: i64,
    ) -> radar_api::Result<()>;

    async fn subscription_status(&self, token: &str) -> radar_api::Result<SubscriptionStatus>;

    async fn rating_average(&self, event_id: i64) -> radar_api::Result<RatingAverage>;

    async fn my_rating(&self, token: &str, event_id: i64) -> radar_api::Result<Option<MyRating>>;

    async fn submit_rating(
        &self,
        token: &str,
        event_id: i64,
        submission: &RatingSubmission,
    ) -> radar_api::Result<RatingAverage>;
}

#[async_trait]
impl AgendaBackend for ApiClient {
    async fn event(&self, event_id: i64) -> radar_api::Result<EventDetail> {
        ApiClient::event(self, event_id).await
    }

    async fn my_participations(
        &self,
        token: &str,
        future: bool,
    ) -> radar_api::Result<Vec<Participation>> {
        ApiClient::my_participations(self, token, future).await
    }

    async fn join_occurrence(
        &self,
        token: &str,
        occurrence_id: i64,
    ) -> radar_api::Result<Participation> {
        ApiClient::join_occurrence(self, token, occurrence_id).await
    }

    async fn cancel_participation(
        &self,
        token: &str,
        participation_id: i64,
    ) -> radar_api::Result<()> {
        ApiClient::cancel_participation(self, token, participation_id).await
    }

    async fn subscription_status(&self, token: &str) -> radar_api::Result<SubscriptionStatus> {
        ApiClient::subscription_status(self, token).await
    }

    async fn rating_average(&self, event_id: i64) -> radar_api::Result<RatingAverage> {
        ApiClient::rating_average(self, event_id).await
    }

    async fn my_rating(&self, token: &str, event_id: i64) -> radar_api::Result<Option<MyRating>> {
        ApiClient::my_rating(self, token, event_id).await
    }

    async fn submit_rating(
        &self,
        token: &str,
        event_id: i64,
        submission: &RatingSubmission,
    ) -> radar_api::Result<RatingAverage> {
        ApiClient::submit_rating(self, token, event_id, submission).await
    }
}
