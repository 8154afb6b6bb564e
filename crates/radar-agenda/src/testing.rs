//! Fake backend shared by the crate's tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Notify;

use radar_api::{
    ApiError, EventDetail, MyRating, Occurrence, Participation, ParticipationStatus,
    RatingAverage, RatingSubmission, SubscriptionStatus,
};
use radar_core::SessionUser;

use crate::backend::AgendaBackend;

pub(crate) fn test_user() -> SessionUser {
    SessionUser {
        id: 1,
        email: "test@example.org".to_string(),
        nom: None,
        role: "user".to_string(),
    }
}

pub(crate) fn occurrence(id: i64, debut: DateTime<Utc>) -> Occurrence {
    Occurrence {
        id,
        debut,
        fin: None,
        all_day: false,
    }
}

/// An occurrence starting `days` from now (negative for the past)
pub(crate) fn occurrence_in_days(id: i64, days: i64) -> Occurrence {
    occurrence(id, Utc::now() + Duration::days(days))
}

pub(crate) fn event_with_occurrences(id: i64, occurrences: Vec<Occurrence>) -> EventDetail {
    EventDetail {
        id,
        titre: format!("Événement {id}"),
        description: None,
        longdescription: None,
        image_url: None,
        lieu: None,
        commune: None,
        adresse: None,
        code_postal: None,
        pays: None,
        prix: None,
        conditions: None,
        latitude: None,
        longitude: None,
        age_min: None,
        age_max: None,
        keywords: None,
        occurrences,
    }
}

pub(crate) fn going_row(id: i64, occurrence_id: i64, evenement_id: i64) -> Participation {
    participation_row(id, occurrence_id, evenement_id, ParticipationStatus::Going)
}

pub(crate) fn participation_row(
    id: i64,
    occurrence_id: i64,
    evenement_id: i64,
    status: ParticipationStatus,
) -> Participation {
    Participation {
        id,
        status,
        occurrence_id,
        evenement_id,
        occurrence_debut: Some(Utc::now() + Duration::days(3)),
        occurrence_fin: None,
        occurrence_all_day: None,
        evenement_titre: None,
        evenement_lieu: None,
        evenement_commune: None,
        image_url: None,
        created_at: None,
        updated_at: None,
    }
}

fn err_from(status: u16) -> ApiError {
    match status {
        401 => ApiError::Unauthenticated,
        403 => ApiError::Forbidden("refusé".to_string()),
        404 => ApiError::NotFound,
        s => ApiError::Api {
            status: s,
            message: "server error".to_string(),
        },
    }
}

/// In-memory stand-in for the REST API with call counting, failure
/// injection (by HTTP status) and an optional gate blocking joins until
/// released.
#[derive(Default)]
pub(crate) struct FakeBackend {
    event: Mutex<Option<EventDetail>>,
    participations: Mutex<Vec<Participation>>,
    subscription_active: Mutex<bool>,
    average: Mutex<Option<RatingAverage>>,
    my_rating: Mutex<Option<MyRating>>,

    fail_participations: AtomicU16,
    fail_join: AtomicU16,
    fail_cancel: AtomicU16,
    fail_average: AtomicU16,
    fail_submit: AtomicU16,

    join_gate: Mutex<Option<Arc<Notify>>>,
    last_cancel_id: Mutex<Option<i64>>,

    event_count: AtomicUsize,
    participations_count: AtomicUsize,
    join_count: AtomicUsize,
    cancel_count: AtomicUsize,
    subscription_count: AtomicUsize,
    average_count: AtomicUsize,
    my_rating_count: AtomicUsize,
    submit_count: AtomicUsize,

    next_participation_id: AtomicI64,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_participation_id: AtomicI64::new(1000),
            ..Default::default()
        }
    }

    pub fn set_event(&self, event: EventDetail) {
        *self.event.lock().unwrap() = Some(event);
    }

    pub fn set_participations(&self, rows: Vec<Participation>) {
        *self.participations.lock().unwrap() = rows;
    }

    pub fn set_subscription_active(&self, active: bool) {
        *self.subscription_active.lock().unwrap() = active;
    }

    pub fn set_average(&self, average: RatingAverage) {
        *self.average.lock().unwrap() = Some(average);
    }

    pub fn set_my_rating(&self, rating: MyRating) {
        *self.my_rating.lock().unwrap() = Some(rating);
    }

    pub fn fail_participations_with(&self, status: u16) {
        self.fail_participations.store(status, Ordering::SeqCst);
    }

    pub fn fail_join_with(&self, status: u16) {
        self.fail_join.store(status, Ordering::SeqCst);
    }

    pub fn fail_cancel_with(&self, status: u16) {
        self.fail_cancel.store(status, Ordering::SeqCst);
    }

    pub fn fail_average_with(&self, status: u16) {
        self.fail_average.store(status, Ordering::SeqCst);
    }

    pub fn fail_submit_with(&self, status: u16) {
        self.fail_submit.store(status, Ordering::SeqCst);
    }

    /// Make joins block until the returned handle is notified
    pub fn block_joins(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.join_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn join_calls(&self) -> usize {
        self.join_count.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_count.load(Ordering::SeqCst)
    }

    /// The participation id of the most recent cancellation
    pub fn last_cancel_id(&self) -> Option<i64> {
        *self.last_cancel_id.lock().unwrap()
    }

    pub fn subscription_calls(&self) -> usize {
        self.subscription_count.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    fn injected(&self, slot: &AtomicU16) -> Option<ApiError> {
        match slot.load(Ordering::SeqCst) {
            0 => None,
            status => Some(err_from(status)),
        }
    }
}

#[async_trait]
impl AgendaBackend for FakeBackend {
    async fn event(&self, _event_id: i64) -> radar_api::Result<EventDetail> {
        self.event_count.fetch_add(1, Ordering::SeqCst);
        self.event
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::NotFound)
    }

    async fn my_participations(
        &self,
        _token: &str,
        _future: bool,
    ) -> radar_api::Result<Vec<Participation>> {
        self.participations_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected(&self.fail_participations) {
            return Err(err);
        }
        Ok(self.participations.lock().unwrap().clone())
    }

    async fn join_occurrence(
        &self,
        _token: &str,
        occurrence_id: i64,
    ) -> radar_api::Result<Participation> {
        self.join_count.fetch_add(1, Ordering::SeqCst);
        let gate = self.join_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.injected(&self.fail_join) {
            return Err(err);
        }
        let id = self.next_participation_id.fetch_add(1, Ordering::SeqCst);
        let event_id = self.event.lock().unwrap().as_ref().map(|e| e.id).unwrap_or(0);
        Ok(going_row(id, occurrence_id, event_id))
    }

    async fn cancel_participation(
        &self,
        _token: &str,
        participation_id: i64,
    ) -> radar_api::Result<()> {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
        *self.last_cancel_id.lock().unwrap() = Some(participation_id);
        if let Some(err) = self.injected(&self.fail_cancel) {
            return Err(err);
        }
        Ok(())
    }

    async fn subscription_status(&self, _token: &str) -> radar_api::Result<SubscriptionStatus> {
        self.subscription_count.fetch_add(1, Ordering::SeqCst);
        Ok(SubscriptionStatus {
            is_active: *self.subscription_active.lock().unwrap(),
            premium_since: None,
        })
    }

    async fn rating_average(&self, _event_id: i64) -> radar_api::Result<RatingAverage> {
        self.average_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected(&self.fail_average) {
            return Err(err);
        }
        Ok(self
            .average
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(RatingAverage {
                average: None,
                count: 0,
            }))
    }

    async fn my_rating(&self, _token: &str, _event_id: i64) -> radar_api::Result<Option<MyRating>> {
        self.my_rating_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.my_rating.lock().unwrap().clone())
    }

    async fn submit_rating(
        &self,
        _token: &str,
        _event_id: i64,
        submission: &RatingSubmission,
    ) -> radar_api::Result<RatingAverage> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected(&self.fail_submit) {
            return Err(err);
        }
        let refreshed = RatingAverage {
            average: Some(submission.rating as f64),
            count: 1,
        };
        *self.average.lock().unwrap() = Some(refreshed.clone());
        Ok(refreshed)
    }
}
