//! The data passed between the model and the grant flows.
//!
//! Principals and credentials are plain owned structs, the model is free to enrich them. Token
//! and code generation lives in [`generator`], scope comparison in [`scope`]. [`memory`] holds an
//! in-memory model usable for tests and small deployments.
use chrono::DateTime;
use chrono::Utc;

pub mod generator;
pub mod grant;
pub mod memory;
pub mod scope;

/// Points in time, always in utc.
pub type Time = DateTime<Utc>;

/// Commonly used primitives for frontends and backends.
pub mod prelude {
    pub use super::generator::{RandomGenerator, TokenGenerator};
    pub use super::grant::{AuthorizationCode, Client, Token, User};
    pub use super::memory::MemoryStore;
    pub use super::scope::Scope;
}
