//! formgrade engine
//!
//! Grades a static HTML form against a JSON rubric and simulates a user
//! filling it in.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Grader / Journey                                           │
//! │    ├── grade(rubric, document) -> GradeReport               │
//! │    └── run() -> JourneyReport                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  checks          presence, type, required, validation,      │
//! │                  label, placeholder, submit button          │
//! │  simulator       enter_text, set_checked, click_submit,     │
//! │                  observe, submit -> FieldSnapshot           │
//! │  validity        constraint validation on current values    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  resolver        id, then type-dependent name fallbacks     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  dom             arena document, listeners, flush()         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod checks;
pub mod config;
pub mod dom;
pub mod journey;
pub mod resolver;
pub mod runner;
pub mod simulator;
pub mod validity;

pub use checks::CheckKind;
pub use config::GraderConfig;
pub use dom::{Document, Dom, Event, EventKind, NodeId, Query};
pub use journey::{Journey, JourneyReport, StepResult};
pub use runner::{GradeReport, Grader, Outcome};
pub use simulator::{Simulator, SubmitOutcome};
pub use validity::{ValidityIssue, ValidityKind};
