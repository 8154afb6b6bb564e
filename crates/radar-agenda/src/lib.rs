//! radar-agenda: Participation and calendar core of the CultureRadar client
//!
//! This crate carries the stateful heart of the client: the per-event
//! participation coordinator (optimistic slot toggling reconciled against
//! the API), the pure month-grouping calendar builder, the gating policy
//! evaluated before state-changing actions, and the rating flow.

pub mod backend;
pub mod calendar;
pub mod coordinator;
pub mod error;
pub mod gating;
pub mod rating;
pub mod travel;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::AgendaBackend;
pub use calendar::{DayCell, MonthGrid, MonthGroup, MonthPager};
pub use coordinator::{ParticipationCoordinator, ToggleOutcome};
pub use error::{AgendaError, Redirect, Result};
pub use gating::{GatePolicy, GatedAction};
pub use rating::{RatingFlow, RatingSummary};
pub use travel::TravelMode;
