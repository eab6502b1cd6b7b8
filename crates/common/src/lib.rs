//! formgrade Common Library
//!
//! Rubric model, field snapshots and error types shared by the grading
//! engine and the CLI.

pub mod error;
pub mod rubric;
pub mod snapshot;

pub use error::{CheckError, Constraint, Error, FailureKind, Result};
pub use rubric::{ConstraintValue, FieldSpec, FieldType, FormSpec, SubmitButtonSpec, Validation};
pub use snapshot::{FieldSnapshot, FieldValue};

/// formgrade version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
