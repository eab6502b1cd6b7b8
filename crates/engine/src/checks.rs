//! Rule checkers
//!
//! Each checker compares one aspect of a resolved field against its rubric
//! entry and reports at most one [`CheckError`]. All of them resolve the
//! field first, so a missing field always surfaces as `FieldNotFound`.

use serde::Serialize;
use tracing::debug;

use formgrade_common::{CheckError, FieldSpec, FieldType, SubmitButtonSpec};

use crate::dom::{Document, Dom, NodeId, Query};
use crate::resolver::{resolve, resolve_submit_button};

/// Per-field check categories, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Presence,
    Type,
    Required,
    Validation,
    Label,
    Placeholder,
}

impl CheckKind {
    pub const ALL: [CheckKind; 6] = [
        CheckKind::Presence,
        CheckKind::Type,
        CheckKind::Required,
        CheckKind::Validation,
        CheckKind::Label,
        CheckKind::Placeholder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Presence => "presence",
            CheckKind::Type => "type",
            CheckKind::Required => "required",
            CheckKind::Validation => "validation",
            CheckKind::Label => "label",
            CheckKind::Placeholder => "placeholder",
        }
    }

    /// Whether the rubric declares anything for this category to grade
    pub fn applies_to(&self, field: &FieldSpec) -> bool {
        match self {
            CheckKind::Presence | CheckKind::Type | CheckKind::Required => true,
            CheckKind::Validation => field.validation.is_some(),
            CheckKind::Label => field.expected_label().is_some(),
            CheckKind::Placeholder => field.expected_placeholder().is_some(),
        }
    }

    pub fn run(&self, document: &Document, field: &FieldSpec) -> Result<(), CheckError> {
        match self {
            CheckKind::Presence => check_presence(document, field),
            CheckKind::Type => check_type(document, field),
            CheckKind::Required => check_required(document, field),
            CheckKind::Validation => check_validation(document, field),
            CheckKind::Label => check_label(document, field),
            CheckKind::Placeholder => check_placeholder(document, field),
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The field resolves
pub fn check_presence(document: &Document, field: &FieldSpec) -> Result<(), CheckError> {
    resolve(document.dom(), field).map(|_| ())
}

/// The resolved element has the DOM shape the declared type implies
pub fn check_type(document: &Document, field: &FieldSpec) -> Result<(), CheckError> {
    let dom = document.dom();
    let node = resolve(dom, field)?;
    let tag = dom.tag_name(node).unwrap_or_default();
    let actual_type = dom.control_type(node);
    let found = || {
        actual_type
            .clone()
            .unwrap_or_else(|| tag.to_ascii_uppercase())
    };

    let mismatch = |expected: String, found: String| CheckError::TypeMismatch {
        id: field.id.clone(),
        expected,
        found,
    };

    match &field.field_type {
        FieldType::Textarea if tag != "textarea" => Err(mismatch(
            "a textarea".to_string(),
            tag.to_ascii_uppercase(),
        )),
        FieldType::Select if tag != "select" => {
            Err(mismatch("a select".to_string(), tag.to_ascii_uppercase()))
        }
        FieldType::Textarea | FieldType::Select => Ok(()),
        declared => {
            if actual_type.as_deref() == Some(declared.as_str()) {
                Ok(())
            } else {
                Err(mismatch(format!("of type {}", declared), found()))
            }
        }
    }
}

/// Presence of the `required` attribute equals the rubric's `required`
pub fn check_required(document: &Document, field: &FieldSpec) -> Result<(), CheckError> {
    let dom = document.dom();
    let node = resolve(dom, field)?;
    if dom.has_attr(node, "required") == field.required {
        Ok(())
    } else {
        Err(CheckError::RequiredAttributeMismatch {
            id: field.id.clone(),
            expected: field.required,
        })
    }
}

/// Each declared constraint matches its markup attribute as a string.
/// The first mismatch is reported.
pub fn check_validation(document: &Document, field: &FieldSpec) -> Result<(), CheckError> {
    let dom = document.dom();
    let node = resolve(dom, field)?;
    let Some(validation) = &field.validation else {
        return Ok(());
    };

    for (constraint, expected) in validation.expected_attributes() {
        let found = dom.attr(node, constraint.attribute());
        if found != Some(expected.as_str()) {
            return Err(CheckError::ValidationAttributeMismatch {
                id: field.id.clone(),
                constraint,
                expected,
                found: found.map(str::to_string),
            });
        }
    }
    Ok(())
}

/// The field's label contains the expected text.
///
/// Looks for `label[for=<id>]`, then a wrapping `label`. A field with no
/// label element at all passes.
pub fn check_label(document: &Document, field: &FieldSpec) -> Result<(), CheckError> {
    let dom = document.dom();
    let node = resolve(dom, field)?;
    let Some(expected) = field.expected_label() else {
        return Ok(());
    };

    let Some(label) = find_label(dom, &field.id, node) else {
        debug!("No label element for \"{}\"; accepted", field.id);
        return Ok(());
    };

    let text = dom.text_content(label).trim().to_string();
    if text.contains(expected) {
        Ok(())
    } else {
        Err(CheckError::LabelMismatch {
            id: field.id.clone(),
            expected: expected.to_string(),
            found: text,
        })
    }
}

fn find_label(dom: &Dom, id: &str, node: NodeId) -> Option<NodeId> {
    dom.query(&Query::tag("label").attr("for", id))
        .or_else(|| dom.closest(node, "label"))
}

/// The `placeholder` attribute equals the expected text exactly.
/// Checkbox, radio and select fields are not graded.
pub fn check_placeholder(document: &Document, field: &FieldSpec) -> Result<(), CheckError> {
    let dom = document.dom();
    let node = resolve(dom, field)?;
    let Some(expected) = field.expected_placeholder() else {
        return Ok(());
    };
    if !field.field_type.supports_placeholder() {
        return Ok(());
    }

    let found = dom.attr(node, "placeholder");
    if found == Some(expected) {
        Ok(())
    } else {
        Err(CheckError::PlaceholderMismatch {
            id: field.id.clone(),
            expected: expected.to_string(),
            found: found.map(str::to_string),
        })
    }
}

/// The submit button exists, is `type="submit"`, and its trimmed text
/// contains the expected text when one is configured.
pub fn check_submit_button(
    document: &Document,
    button: &SubmitButtonSpec,
) -> Result<(), CheckError> {
    let dom = document.dom();
    let node = resolve_submit_button(dom, button)?;

    let actual_type = dom.control_type(node);
    if actual_type.as_deref() != Some("submit") {
        return Err(CheckError::SubmitButtonMismatch {
            id: button.id.clone(),
            reason: format!(
                "should have type=\"submit\", but found type=\"{}\"",
                actual_type.as_deref().unwrap_or("none")
            ),
        });
    }

    if let Some(expected) = button.text.as_deref().filter(|t| !t.is_empty()) {
        let text = dom.text_content(node).trim().to_string();
        if !text.contains(expected) {
            return Err(CheckError::SubmitButtonMismatch {
                id: button.id.clone(),
                reason: format!("should contain text \"{}\", but found \"{}\"", expected, text),
            });
        }
    }
    Ok(())
}
