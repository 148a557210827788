//! Symbolic Engine for Specflow
//!
//! Creates symbolic (typed, introspectable) representations of arbitrary
//! structured data and resolves symbolic references to concrete values.
//!
//! - [`classify`] maps a JSON value onto the closed [`SymbolicKind`]
//!   union by structural heuristics; the rules are a plain function so
//!   they can be unit-tested in isolation.
//! - [`SymbolicEngine`] owns its registry and resolution cache as
//!   instance state. Engines are explicitly-owned objects, not
//!   process-wide singletons; independent instances share nothing.
//! - Reference resolution is pluggable behind [`ReferenceResolver`] and
//!   idempotent: repeated resolution of the same reference id is a pure
//!   cache hit.
//! - Cognitive tools are named transformations registered on the engine
//!   and applied singly or folded left-to-right over a chain.

#![deny(unsafe_code)]

mod classifier;
mod engine;
mod error;
mod representation;
mod resolver;
mod tools;

pub use classifier::{classify, symbolic_name_for};
pub use engine::SymbolicEngine;
pub use error::SymbolicError;
pub use representation::representation_for;
pub use resolver::{PlaceholderResolver, ReferenceResolver};
pub use tools::{CognitiveTool, FnTool};

pub use specflow_types::SymbolicKind;
