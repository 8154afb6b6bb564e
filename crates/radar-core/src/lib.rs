//! radar-core: CultureRadar Client Core Library
//!
//! Configuration, error types and the local auth session
//! (persistent store + observable manager) shared by the
//! CultureRadar client crates.

pub mod config;
pub mod error;
pub mod session;

pub use config::{ApiConfig, Config, GatingConfig, SessionConfig};
pub use error::{Error, Result};
pub use session::{Session, SessionManager, SessionStore, SessionUser};
