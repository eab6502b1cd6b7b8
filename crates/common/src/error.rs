//! Error types for formgrade

use serde::Serialize;
use thiserror::Error;

/// Result type alias using the formgrade Error
pub type Result<T> = std::result::Result<T, Error>;

/// Validation constraint named by a rubric `validation` block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Constraint {
    Min,
    Max,
    Pattern,
    MinLength,
    MaxLength,
}

impl Constraint {
    /// Markup attribute the constraint is compared against
    pub fn attribute(&self) -> &'static str {
        match self {
            Constraint::Min => "min",
            Constraint::Max => "max",
            Constraint::Pattern => "pattern",
            Constraint::MinLength => "minlength",
            Constraint::MaxLength => "maxlength",
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Min => write!(f, "min"),
            Constraint::Max => write!(f, "max"),
            Constraint::Pattern => write!(f, "pattern"),
            Constraint::MinLength => write!(f, "minLength"),
            Constraint::MaxLength => write!(f, "maxLength"),
        }
    }
}

/// Failure of a single rule checker.
///
/// A checker reports at most one of these per invocation. They are
/// recoverable at the grading-run level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("Field with id/name \"{id}\" not found")]
    FieldNotFound { id: String },

    #[error("Field \"{id}\" should be {expected}, but found {found}")]
    TypeMismatch {
        id: String,
        expected: String,
        found: String,
    },

    #[error("{}", required_message(.id, .expected))]
    RequiredAttributeMismatch { id: String, expected: bool },

    #[error("{}", validation_message(.id, .constraint, .expected, .found))]
    ValidationAttributeMismatch {
        id: String,
        constraint: Constraint,
        expected: String,
        found: Option<String>,
    },

    #[error("Label for field \"{id}\" should contain \"{expected}\", but found \"{found}\"")]
    LabelMismatch {
        id: String,
        expected: String,
        found: String,
    },

    #[error(
        "Field \"{id}\" should have placeholder=\"{expected}\", but found placeholder=\"{}\"",
        display_attr(.found)
    )]
    PlaceholderMismatch {
        id: String,
        expected: String,
        found: Option<String>,
    },

    #[error("Submit button \"{id}\": {reason}")]
    SubmitButtonMismatch { id: String, reason: String },
}

fn required_message(id: &str, expected: &bool) -> String {
    if *expected {
        format!("Field \"{id}\" should have required attribute, but it's missing")
    } else {
        format!("Field \"{id}\" should not have required attribute, but it has one")
    }
}

fn validation_message(
    id: &str,
    constraint: &Constraint,
    expected: &str,
    found: &Option<String>,
) -> String {
    let attr = constraint.attribute();
    format!(
        "Field \"{id}\" should have {attr}=\"{expected}\", but found {attr}=\"{}\"",
        display_attr(found)
    )
}

/// Absent attributes render as `null`, the way a DOM getter reports them
fn display_attr(found: &Option<String>) -> &str {
    found.as_deref().unwrap_or("null")
}

/// Stable, serializable name of a check failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    FieldNotFound,
    TypeMismatch,
    RequiredAttributeMismatch,
    ValidationAttributeMismatch,
    LabelMismatch,
    PlaceholderMismatch,
    SubmitButtonMismatch,
    FormNotFound,
    ControlCount,
}

impl CheckError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CheckError::FieldNotFound { .. } => FailureKind::FieldNotFound,
            CheckError::TypeMismatch { .. } => FailureKind::TypeMismatch,
            CheckError::RequiredAttributeMismatch { .. } => FailureKind::RequiredAttributeMismatch,
            CheckError::ValidationAttributeMismatch { .. } => {
                FailureKind::ValidationAttributeMismatch
            }
            CheckError::LabelMismatch { .. } => FailureKind::LabelMismatch,
            CheckError::PlaceholderMismatch { .. } => FailureKind::PlaceholderMismatch,
            CheckError::SubmitButtonMismatch { .. } => FailureKind::SubmitButtonMismatch,
        }
    }
}

/// formgrade error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Rubric parse error: {0}")]
    RubricParse(#[from] serde_json::Error),

    #[error("Invalid rubric: {0}")]
    InvalidRubric(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] toml::de::Error),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("Form not found")]
    FormNotFound,

    #[error("Element is not a form control: {0}")]
    NotAControl(String),

    #[error("Timeout waiting for condition after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Condition failed: {0}")]
    Condition(String),

    #[error("Failed to write report: {0}")]
    Report(String),
}

impl Error {
    /// Field id carried by a wrapped `FieldNotFound`, if any
    pub fn missing_field(&self) -> Option<&str> {
        match self {
            Error::Check(CheckError::FieldNotFound { id }) => Some(id),
            _ => None,
        }
    }
}
