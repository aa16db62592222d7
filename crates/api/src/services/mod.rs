//! Business logic services.
//!
//! Services are constructed per request from [`crate::state::AppState`] and
//! borrow its stores.
//!
//! # Services
//!
//! - `auth` - Registration, password login, bearer tokens, account deletion
//! - `calculations` - Owner-scoped CRUD over calculation records

pub mod auth;
pub mod calculations;

pub use auth::{AccessToken, AuthError, AuthService, TokenService};
pub use calculations::{CalculationService, CalculationServiceError};
