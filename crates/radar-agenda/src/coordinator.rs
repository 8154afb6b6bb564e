//! Occurrence-participation coordinator
//!
//! One coordinator per event-detail view. It owns the set of occurrences
//! the current user has marked "going", mediates every toggle through the
//! API, and keeps the visible checked state consistent with confirmed
//! server state: the flip is applied optimistically for responsiveness and
//! reverted when the request fails. A `pending` set suppresses duplicate
//! in-flight requests for the same slot, preserving the at-most-one-active
//! -participation invariant; an epoch counter discards responses that
//! resolve after the view was re-initialized or the session reset.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::{debug, info, warn};

use radar_api::{EventDetail, Occurrence, ParticipationStatus};
use radar_core::SessionManager;

use crate::backend::AgendaBackend;
use crate::calendar::{self, MonthGroup};
use crate::error::{AgendaError, Redirect, Result};
use crate::gating::{GatePolicy, GatedAction};

/// What a toggle did. `SlotInPast` and `AlreadyPending` are deliberate
/// no-ops, not errors; `Stale` marks a response that arrived after the
/// view moved on and was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Joined { participation_id: i64 },
    Cancelled,
    SlotInPast,
    AlreadyPending,
    Stale,
}

#[derive(Default)]
struct State {
    event: Option<EventDetail>,
    /// Occurrence ids currently shown as checked
    selected: HashSet<i64>,
    /// occurrence id -> participation id needed to cancel it
    participation_by_occurrence: HashMap<i64, i64>,
    /// Occurrence ids with an in-flight create/delete
    pending: HashSet<i64>,
    /// Bumped on every (re-)initialization and session reset
    epoch: u64,
}

/// Per-event-detail-view participation state machine
pub struct ParticipationCoordinator {
    backend: Arc<dyn AgendaBackend>,
    session: Arc<SessionManager>,
    gate: GatePolicy,
    state: Mutex<State>,
}

impl ParticipationCoordinator {
    pub fn new(
        backend: Arc<dyn AgendaBackend>,
        session: Arc<SessionManager>,
        gate: GatePolicy,
    ) -> Self {
        Self {
            backend,
            session,
            gate,
            state: Mutex::new(State::default()),
        }
    }

    /// Load the event and, when logged in, pre-check the slots already in
    /// the user's agenda. A failing participations fetch is not fatal:
    /// the event stays viewable with nothing pre-checked.
    pub async fn initialize(&self, event_id: i64) -> Result<()> {
        let event = self.backend.event(event_id).await?;

        let rows = match self.session.token() {
            Some(token) => match self.backend.my_participations(&token, true).await {
                Ok(rows) => rows,
                Err(e) => {
                    debug!("Participations unavailable, viewing anonymously: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut state = self.state.lock().unwrap();
        state.epoch += 1;
        state.event = Some(event);
        state.selected.clear();
        state.participation_by_occurrence.clear();
        state.pending.clear();
        for row in rows {
            if row.evenement_id == event_id && row.status == ParticipationStatus::Going {
                state.selected.insert(row.occurrence_id);
                state
                    .participation_by_occurrence
                    .insert(row.occurrence_id, row.id);
            }
        }
        info!(
            "Initialized event {} with {} pre-checked slot(s)",
            event_id,
            state.selected.len()
        );
        Ok(())
    }

    /// Toggle attendance on one occurrence.
    ///
    /// Rules, in order: past slots are untoggleable (silent no-op), the
    /// gating policy must pass (auth, and subscription where configured),
    /// a slot with a request already in flight is left alone, then the
    /// checked state flips optimistically and the create/delete is issued.
    pub async fn toggle(&self, occurrence_id: i64) -> Result<ToggleOutcome> {
        let (event_id, debut) = {
            let state = self.state.lock().unwrap();
            let event = state
                .event
                .as_ref()
                .ok_or(AgendaError::UnknownOccurrence(occurrence_id))?;
            let occ = event
                .occurrence(occurrence_id)
                .ok_or(AgendaError::UnknownOccurrence(occurrence_id))?;
            (event.id, occ.debut)
        };

        // Slots before local midnight of today are never toggleable
        if debut.with_timezone(&Local).date_naive() < Local::now().date_naive() {
            return Ok(ToggleOutcome::SlotInPast);
        }

        let return_to = format!("/event/{event_id}");
        let token = self
            .gate
            .authorize(
                &self.session,
                self.backend.as_ref(),
                GatedAction::ToggleSlot,
                &return_to,
            )
            .await?;

        // Pending guard and optimistic flip, atomically
        let (was_selected, participation_id, epoch) = {
            let mut state = self.state.lock().unwrap();
            if state.pending.contains(&occurrence_id) {
                debug!("Occurrence {} already has a request in flight", occurrence_id);
                return Ok(ToggleOutcome::AlreadyPending);
            }
            let was_selected = state.selected.contains(&occurrence_id);
            if was_selected {
                state.selected.remove(&occurrence_id);
            } else {
                state.selected.insert(occurrence_id);
            }
            state.pending.insert(occurrence_id);
            (
                was_selected,
                state.participation_by_occurrence.get(&occurrence_id).copied(),
                state.epoch,
            )
        };

        if was_selected {
            self.cancel_slot(occurrence_id, participation_id, &token, epoch, &return_to)
                .await
        } else {
            self.join_slot(occurrence_id, &token, epoch, &return_to)
                .await
        }
    }

    async fn join_slot(
        &self,
        occurrence_id: i64,
        token: &str,
        epoch: u64,
        return_to: &str,
    ) -> Result<ToggleOutcome> {
        let result = self.backend.join_occurrence(token, occurrence_id).await;

        let mut state = self.state.lock().unwrap();
        if state.epoch != epoch {
            debug!("Discarding stale join response for occurrence {}", occurrence_id);
            return Ok(ToggleOutcome::Stale);
        }
        state.pending.remove(&occurrence_id);

        match result {
            Ok(participation) => {
                state
                    .participation_by_occurrence
                    .insert(occurrence_id, participation.id);
                Ok(ToggleOutcome::Joined {
                    participation_id: participation.id,
                })
            }
            Err(e) => {
                // revert the optimistic flip
                state.selected.remove(&occurrence_id);
                if e.is_auth() {
                    Err(AgendaError::Unauthenticated(Redirect::Login {
                        return_to: return_to.to_string(),
                    }))
                } else {
                    warn!("Could not join occurrence {}: {}", occurrence_id, e);
                    Err(AgendaError::Request(e))
                }
            }
        }
    }

    async fn cancel_slot(
        &self,
        occurrence_id: i64,
        participation_id: Option<i64>,
        token: &str,
        epoch: u64,
        return_to: &str,
    ) -> Result<ToggleOutcome> {
        let Some(participation_id) = participation_id else {
            // No cached handle means no server record to delete; the
            // unchecked state is already correct.
            warn!(
                "No participation id cached for occurrence {}, treating as cancelled",
                occurrence_id
            );
            let mut state = self.state.lock().unwrap();
            if state.epoch == epoch {
                state.pending.remove(&occurrence_id);
            }
            return Ok(ToggleOutcome::Cancelled);
        };

        let result = self
            .backend
            .cancel_participation(token, participation_id)
            .await;

        let mut state = self.state.lock().unwrap();
        if state.epoch != epoch {
            debug!(
                "Discarding stale cancel response for occurrence {}",
                occurrence_id
            );
            return Ok(ToggleOutcome::Stale);
        }
        state.pending.remove(&occurrence_id);

        match result {
            Ok(()) => {
                state.participation_by_occurrence.remove(&occurrence_id);
                Ok(ToggleOutcome::Cancelled)
            }
            Err(e) => {
                // revert the optimistic flip
                state.selected.insert(occurrence_id);
                if e.is_auth() {
                    Err(AgendaError::Unauthenticated(Redirect::Login {
                        return_to: return_to.to_string(),
                    }))
                } else {
                    warn!("Could not cancel occurrence {}: {}", occurrence_id, e);
                    Err(AgendaError::Request(e))
                }
            }
        }
    }

    /// React to a session change broadcast: clear the selection on logout,
    /// reload the user's participations on login.
    pub async fn sync_session(&self) -> Result<()> {
        if !self.session.is_logged_in() {
            let mut state = self.state.lock().unwrap();
            state.epoch += 1;
            state.selected.clear();
            state.participation_by_occurrence.clear();
            state.pending.clear();
            return Ok(());
        }

        let event_id = {
            let state = self.state.lock().unwrap();
            state.event.as_ref().map(|e| e.id)
        };
        if let Some(event_id) = event_id {
            self.initialize(event_id).await?;
        }
        Ok(())
    }

    pub fn is_selected(&self, occurrence_id: i64) -> bool {
        self.state.lock().unwrap().selected.contains(&occurrence_id)
    }

    pub fn is_pending(&self, occurrence_id: i64) -> bool {
        self.state.lock().unwrap().pending.contains(&occurrence_id)
    }

    /// The participation id cached for an occurrence, if it is joined
    pub fn participation_id(&self, occurrence_id: i64) -> Option<i64> {
        self.state
            .lock()
            .unwrap()
            .participation_by_occurrence
            .get(&occurrence_id)
            .copied()
    }

    pub fn selected_count(&self) -> usize {
        self.state.lock().unwrap().selected.len()
    }

    /// The loaded event, if initialized
    pub fn event(&self) -> Option<EventDetail> {
        self.state.lock().unwrap().event.clone()
    }

    /// The event's occurrences grouped by calendar month, for the
    /// detail-view month navigation
    pub fn month_groups(&self) -> Vec<MonthGroup<Occurrence>> {
        let occurrences = self
            .state
            .lock()
            .unwrap()
            .event
            .as_ref()
            .map(|e| e.occurrences.clone())
            .unwrap_or_default();
        calendar::group_by_month(&occurrences, |o| {
            Some(o.debut.with_timezone(&Local).date_naive())
        })
    }
}
