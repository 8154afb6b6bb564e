//! radar-api: Typed client for the CultureRadar REST API
//!
//! Every endpoint the client core consumes is exposed as a typed method;
//! response payloads are validated into explicit contracts at this
//! boundary so no loosely-typed data reaches the rest of the client.

pub mod client;
pub mod error;
pub mod models;

pub use client::ApiClient;
pub use error::{ApiError, Result};
pub use models::{
    ApiUser, Credentials, EventDetail, LoginResponse, MyRating, Occurrence, Participation,
    ParticipationStatus, RatingAverage, RatingSubmission, SubscriptionStatus,
};
