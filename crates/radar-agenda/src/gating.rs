//! Gating policy
//!
//! Pre-condition checks evaluated before a state-changing action. Rules in
//! order: a non-expired session token must be present (else redirect to
//! login with the original destination preserved); actions that require an
//! active paid subscription check it next (else redirect to the
//! subscription offer). A confirmed active subscription is cached for the
//! lifetime of the policy (one view) and invalidated whenever the session
//! broadcasts a state change.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::debug;

use radar_core::{GatingConfig, SessionManager};

use crate::backend::AgendaBackend;
use crate::error::{AgendaError, Redirect, Result};

/// The state-changing actions submitted to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    /// Toggling attendance on an occurrence
    ToggleSlot,
    /// Submitting an event rating
    SubmitRating,
}

impl GatedAction {
    /// Only slot toggles are subject to the subscription gate
    fn subject_to_subscription(self) -> bool {
        matches!(self, GatedAction::ToggleSlot)
    }
}

/// Decides whether a gated action may proceed, and where to redirect if not
pub struct GatePolicy {
    /// Deployment-dependent: some deployments gate slot toggles on an
    /// active subscription, others on authentication only
    require_subscription: bool,
    /// Subscription confirmed active earlier in this view's lifetime
    subscription_confirmed: AtomicBool,
    /// Login state changes invalidate the cached confirmation
    session_changes: Mutex<watch::Receiver<bool>>,
}

impl GatePolicy {
    pub fn new(config: &GatingConfig, session: &SessionManager) -> Self {
        Self {
            require_subscription: config.require_subscription,
            subscription_confirmed: AtomicBool::new(false),
            session_changes: Mutex::new(session.subscribe()),
        }
    }

    /// Evaluate the gate for `action`; returns the bearer token on success
    pub async fn authorize(
        &self,
        session: &SessionManager,
        backend: &dyn AgendaBackend,
        action: GatedAction,
        return_to: &str,
    ) -> Result<String> {
        self.invalidate_on_session_change();

        let Some(token) = session.token() else {
            return Err(AgendaError::Unauthenticated(Redirect::Login {
                return_to: return_to.to_string(),
            }));
        };

        // Concurrent cold-cache checks may each query the status once;
        // the cache only suppresses checks after a confirmation landed.
        if self.require_subscription
            && action.subject_to_subscription()
            && !self.subscription_confirmed.load(Ordering::Acquire)
        {
            match backend.subscription_status(&token).await {
                Ok(status) if status.is_active => {
                    debug!("Subscription confirmed active");
                    self.subscription_confirmed.store(true, Ordering::Release);
                }
                Ok(_) => {
                    return Err(AgendaError::SubscriptionRequired(Redirect::Subscribe {
                        return_to: return_to.to_string(),
                    }));
                }
                Err(e) if e.is_auth() => {
                    return Err(AgendaError::Unauthenticated(Redirect::Login {
                        return_to: return_to.to_string(),
                    }));
                }
                Err(e) => return Err(AgendaError::Request(e)),
            }
        }

        Ok(token)
    }

    fn invalidate_on_session_change(&self) {
        let mut rx = self.session_changes.lock().unwrap();
        if rx.has_changed().unwrap_or(false) {
            rx.borrow_and_update();
            self.subscription_confirmed.store(false, Ordering::Release);
        }
    }
}
