//! Parameter metadata and structural schema generation.
//!
//! Tools describe their inputs as a list of [`ParamSpec`] values; the
//! [`SchemaGenerator`] turns such a list into a recursive [`Schema`] suitable
//! for publication on the wire, and the describer renders the same metadata
//! as a human-readable fallback description.

#![warn(missing_docs, clippy::pedantic)]

mod describer;
mod generator;
mod model;
mod params;

pub use describer::describe_callable;
pub use generator::{SchemaError, SchemaGenerator, SchemaResult};
pub use model::{Constraints, PrimitiveKind, Schema};
pub use params::{ObjectShape, ParamSpec, ParamType};
