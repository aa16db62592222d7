//! Domain models owned by the API crate.
//!
//! Calculation records live in `abacus-core`; accounts are an API concern and
//! are defined here.

pub mod user;

pub use user::{StoredCredentials, User};
