//! Context Engine for Specflow
//!
//! Owns the mapping of context id to [`specflow_types::ProjectContext`]
//! and applies proposed updates atomically: build a copy, modify it,
//! validate it, commit it, or reject the whole batch and leave the
//! stored context untouched.
//!
//! All mutations serialize through a single engine-wide mutex. Reads go
//! straight to the current committed value without taking that mutex;
//! callers must tolerate reading a state that is about to be superseded.

#![deny(unsafe_code)]

mod engine;
mod error;
mod events;

pub use engine::{ContextEngine, PROJECT_REQUIREMENTS_KEY, REQUIREMENTS_REF_KEY};
pub use error::ContextError;
pub use events::ContextEvent;
