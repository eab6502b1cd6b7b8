//! formgrade CLI
//!
//! Command-line interface for grading HTML forms against JSON rubrics and
//! running scripted journeys over them.

pub mod commands;
pub mod output;
