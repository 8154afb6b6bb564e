//! Error types for radar-agenda

use radar_api::ApiError;
use thiserror::Error;

/// Where the view should send the user when a gate refuses an action.
/// The original destination is preserved as a return target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Login { return_to: String },
    Subscribe { return_to: String },
}

impl Redirect {
    /// Route path including the return target, as the views consume it
    pub fn path(&self) -> String {
        match self {
            Redirect::Login { return_to } => format!("/login?redirect={return_to}"),
            Redirect::Subscribe { return_to } => format!("/subscribe?redirect={return_to}"),
        }
    }
}

/// radar-agenda error type
#[derive(Error, Debug)]
pub enum AgendaError {
    /// No valid session token; the caller must redirect to login
    #[error("Not signed in")]
    Unauthenticated(Redirect),

    /// The action requires an active subscription
    #[error("Active subscription required")]
    SubscriptionRequired(Redirect),

    /// The occurrence id does not belong to the loaded event
    #[error("Unknown occurrence: {0}")]
    UnknownOccurrence(i64),

    /// No rating score was chosen; surfaced locally, no network call made
    #[error("No rating selected")]
    RatingMissing,

    #[error("Rating out of range: {0} (expected 1-5)")]
    RatingOutOfRange(u8),

    /// The server refused the rating (business rule relayed verbatim)
    #[error("Rating rejected: {0}")]
    RatingRejected(String),

    /// Transient request failure; optimistic state has been reverted
    #[error("Request failed: {0}")]
    Request(#[from] ApiError),
}

impl AgendaError {
    /// The redirect carried by this error, when there is one
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            AgendaError::Unauthenticated(r) | AgendaError::SubscriptionRequired(r) => Some(r),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AgendaError>;
