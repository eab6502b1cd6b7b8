//! CLI Commands

pub mod grade;
pub mod journey;
pub mod rubric;
