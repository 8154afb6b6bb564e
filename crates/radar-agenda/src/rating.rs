//! Rating submission flow
//!
//! A user sets a 1-5 score (and optional comment) for an event. The public
//! average and the user's own prior rating load independently; submission
//! is an upsert behind the auth gate. The "only past attended events may
//! be rated" rule lives on the server and is only relayed here.

use std::sync::Arc;

use tracing::warn;

use radar_api::{ApiError, MyRating, RatingAverage, RatingSubmission};
use radar_core::SessionManager;

use crate::backend::AgendaBackend;
use crate::error::{AgendaError, Redirect, Result};
use crate::gating::{GatePolicy, GatedAction};

/// Everything the rating panel displays
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    /// Current average, `None` while unrated
    pub average: Option<f64>,
    pub count: u64,
    /// The user's own prior rating, when logged in and set
    pub mine: Option<MyRating>,
}

/// Loads and submits event ratings
pub struct RatingFlow {
    backend: Arc<dyn AgendaBackend>,
    session: Arc<SessionManager>,
    gate: GatePolicy,
}

impl RatingFlow {
    pub fn new(
        backend: Arc<dyn AgendaBackend>,
        session: Arc<SessionManager>,
        gate: GatePolicy,
    ) -> Self {
        Self {
            backend,
            session,
            gate,
        }
    }

    /// Load the public average and, when logged in, the user's own rating.
    ///
    /// The average is public data; a failure there degrades to an empty
    /// aggregate instead of blocking the panel. An expired session while
    /// fetching the private rating surfaces as `Unauthenticated`.
    pub async fn load(&self, event_id: i64) -> Result<RatingSummary> {
        match self.session.token() {
            Some(token) => {
                let (average, mine) = tokio::join!(
                    self.backend.rating_average(event_id),
                    self.backend.my_rating(&token, event_id),
                );
                let (average, count) = flatten_average(average);
                let mine = match mine {
                    Ok(mine) => mine,
                    Err(e) if e.is_auth() => {
                        return Err(AgendaError::Unauthenticated(Redirect::Login {
                            return_to: format!("/event/{event_id}"),
                        }));
                    }
                    Err(e) => {
                        warn!("Own rating unavailable: {}", e);
                        None
                    }
                };
                Ok(RatingSummary {
                    average,
                    count,
                    mine,
                })
            }
            None => {
                let (average, count) = flatten_average(self.backend.rating_average(event_id).await);
                Ok(RatingSummary {
                    average,
                    count,
                    mine: None,
                })
            }
        }
    }

    /// Upsert the user's rating and return the refreshed average.
    ///
    /// Validates locally before any network call: a score must be chosen
    /// and lie in 1-5. A server refusal (past-attended rule) is relayed
    /// verbatim as `RatingRejected`.
    pub async fn submit(
        &self,
        event_id: i64,
        rating: Option<u8>,
        commentaire: Option<String>,
    ) -> Result<RatingAverage> {
        let Some(rating) = rating else {
            return Err(AgendaError::RatingMissing);
        };
        if !(1..=5).contains(&rating) {
            return Err(AgendaError::RatingOutOfRange(rating));
        }

        let return_to = format!("/event/{event_id}");
        let token = self
            .gate
            .authorize(
                &self.session,
                self.backend.as_ref(),
                GatedAction::SubmitRating,
                &return_to,
            )
            .await?;

        let submission = RatingSubmission {
            rating,
            commentaire,
        };
        match self
            .backend
            .submit_rating(&token, event_id, &submission)
            .await
        {
            Ok(average) => Ok(average),
            Err(ApiError::Forbidden(message)) => Err(AgendaError::RatingRejected(message)),
            Err(e) if e.is_auth() => Err(AgendaError::Unauthenticated(Redirect::Login {
                return_to,
            })),
            Err(e) => Err(AgendaError::Request(e)),
        }
    }
}

fn flatten_average(result: radar_api::Result<RatingAverage>) -> (Option<f64>, u64) {
    match result {
        Ok(avg) => (avg.average, avg.count),
        Err(e) => {
            warn!("Rating average unavailable: {}", e);
            (None, 0)
        }
    }
}
