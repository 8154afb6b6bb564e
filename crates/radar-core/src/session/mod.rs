//! Auth session: types, persistent store and observable manager

mod manager;
mod store;
mod types;

pub use manager::SessionManager;
pub use store::SessionStore;
pub use types::{Session, SessionUser};
