//! Constraint validation on current control values
//!
//! Mirrors the checks a browser runs before submitting a form: missing
//! required values, length limits, numeric ranges, patterns and the email
//! type. Disabled and read-only controls are skipped, as are buttons and
//! hidden inputs.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::dom::{Dom, NodeId};

/// Kind of constraint a control's current value violates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityKind {
    ValueMissing,
    TypeMismatch,
    PatternMismatch,
    TooLong,
    TooShort,
    RangeUnderflow,
    RangeOverflow,
}

/// One violated constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidityIssue {
    /// Control id, else name, else a tag description
    pub field: String,
    pub kind: ValidityKind,
    pub message: String,
}

const BARRED_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];
const LENGTH_TYPES: &[&str] = &["text", "search", "url", "tel", "email", "password", "textarea"];
const PATTERN_TYPES: &[&str] = &["text", "search", "url", "tel", "email", "password"];

/// Check every control of `form`
pub fn check_form(dom: &Dom, form: NodeId) -> Vec<ValidityIssue> {
    let mut issues = Vec::new();
    let mut seen_groups = HashSet::new();

    for control in dom.form_controls(form) {
        if dom.has_attr(control, "disabled") || dom.has_attr(control, "readonly") {
            continue;
        }
        let Some(control_type) = dom.control_type(control) else {
            continue;
        };
        if BARRED_TYPES.contains(&control_type.as_str()) {
            continue;
        }

        let field = field_key(dom, control);
        if control_type == "radio" {
            let name = dom.attr(control, "name").unwrap_or_default().to_string();
            if !seen_groups.insert(name.clone()) {
                continue;
            }
            if let Some(issue) = check_radio_group(dom, form, &name, field) {
                issues.push(issue);
            }
            continue;
        }

        issues.extend(check_control(dom, control, &control_type, field));
    }

    debug!("Constraint validation found {} issue(s)", issues.len());
    issues
}

fn field_key(dom: &Dom, control: NodeId) -> String {
    dom.element(control)
        .and_then(|e| e.id().or_else(|| e.name()))
        .map(str::to_string)
        .unwrap_or_else(|| dom.describe(control))
}

fn check_radio_group(dom: &Dom, form: NodeId, name: &str, field: String) -> Option<ValidityIssue> {
    let group: Vec<NodeId> = dom
        .form_controls(form)
        .into_iter()
        .filter(|peer| dom.control_type(*peer).as_deref() == Some("radio"))
        .filter(|peer| dom.attr(*peer, "name").unwrap_or_default() == name)
        .collect();

    let required = group.iter().any(|radio| dom.has_attr(*radio, "required"));
    let any_checked = group.iter().any(|radio| dom.checked(*radio) == Some(true));
    if required && !any_checked {
        let field = if name.is_empty() { field } else { name.to_string() };
        return Some(ValidityIssue {
            message: format!("Select one of the \"{}\" options", field),
            field,
            kind: ValidityKind::ValueMissing,
        });
    }
    None
}

fn check_control(dom: &Dom, control: NodeId, control_type: &str, field: String) -> Vec<ValidityIssue> {
    let value = dom.value(control).unwrap_or_default();
    let issue = |kind: ValidityKind, message: String| ValidityIssue {
        field: field.clone(),
        kind,
        message,
    };

    if dom.has_attr(control, "required") {
        let missing = match control_type {
            "checkbox" => dom.checked(control) != Some(true),
            _ => value.is_empty(),
        };
        if missing {
            return vec![issue(
                ValidityKind::ValueMissing,
                format!("\"{}\" is required", field),
            )];
        }
    }

    if value.is_empty() || control_type == "checkbox" {
        return Vec::new();
    }

    let mut issues = Vec::new();

    if LENGTH_TYPES.contains(&control_type) {
        let length = value.chars().count();
        if let Some(max) = length_attr(dom, control, "maxlength") {
            if length > max {
                issues.push(issue(
                    ValidityKind::TooLong,
                    format!("\"{}\" is {} characters, at most {} allowed", field, length, max),
                ));
            }
        }
        if let Some(min) = length_attr(dom, control, "minlength") {
            if length < min {
                issues.push(issue(
                    ValidityKind::TooShort,
                    format!("\"{}\" is {} characters, at least {} required", field, length, min),
                ));
            }
        }
    }

    if PATTERN_TYPES.contains(&control_type) {
        if let Some(pattern) = dom.attr(control, "pattern") {
            match Regex::new(&format!("^(?:{})$", pattern)) {
                Ok(re) if !re.is_match(value) => issues.push(issue(
                    ValidityKind::PatternMismatch,
                    format!("\"{}\" does not match pattern {}", field, pattern),
                )),
                Ok(_) => {}
                Err(e) => debug!("Ignoring invalid pattern on \"{}\": {}", field, e),
            }
        }
    }

    if control_type == "email" && !is_valid_email(value) {
        issues.push(issue(
            ValidityKind::TypeMismatch,
            format!("\"{}\" is not an email address", field),
        ));
    }

    if matches!(control_type, "number" | "range") {
        if let Ok(number) = value.trim().parse::<f64>() {
            if let Some(min) = number_attr(dom, control, "min") {
                if number < min {
                    issues.push(issue(
                        ValidityKind::RangeUnderflow,
                        format!("\"{}\" must be at least {}", field, min),
                    ));
                }
            }
            if let Some(max) = number_attr(dom, control, "max") {
                if number > max {
                    issues.push(issue(
                        ValidityKind::RangeOverflow,
                        format!("\"{}\" must be at most {}", field, max),
                    ));
                }
            }
        }
    }

    issues
}

fn length_attr(dom: &Dom, control: NodeId, name: &str) -> Option<usize> {
    dom.attr(control, name)?.trim().parse().ok()
}

fn number_attr(dom: &Dom, control: NodeId, name: &str) -> Option<f64> {
    dom.attr(control, name)?.trim().parse().ok()
}

/// `local@domain` with no whitespace and non-empty parts
fn is_valid_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
