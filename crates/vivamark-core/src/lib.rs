//! vivamark-core — Session state machine, marking engine, and scoring.
//!
//! This crate defines the fundamental data model, the exam session state
//! machine, and the offline marking/difficulty analysis that the entire
//! vivamark system builds on.

pub mod bank;
pub mod difficulty;
pub mod error;
pub mod marking;
pub mod model;
pub mod sampler;
pub mod session;
pub mod traits;

pub use error::VivaError;
