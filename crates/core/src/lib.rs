//! Abacus Core - Domain types and the calculation engine.
//!
//! This crate provides the types shared by all Abacus components:
//! - `api` - JSON API server for accounts and calculation records
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Persistence and authorization live in the `api` crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails
//! - [`operation`] - The closed set of arithmetic operations and their reducers
//! - [`calculation`] - The calculation record whose result is always derived

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod calculation;
pub mod error;
pub mod operation;
pub mod types;

pub use calculation::{Calculation, CalculationParts};
pub use error::CalculationError;
pub use operation::{MAX_INPUTS, Operation, compute};
pub use types::*;
