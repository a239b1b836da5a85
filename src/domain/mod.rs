//! Domain layer for convergence verification
//!
//! Deadline contexts, verification tasks, outcomes and the collaborator ports.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{PredicateError, VerifyError, VerifyResult};
