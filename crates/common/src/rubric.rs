//! Rubric model: the JSON description of an expected form

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{Constraint, Error, Result};

/// A complete rubric parsed from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSpec {
    /// Rubric identifier
    pub id: String,

    /// Fields in grading order
    pub fields: Vec<FieldSpec>,

    /// Expected submit button
    pub submit_button: SubmitButtonSpec,
}

/// Expected shape of one form field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

/// Expected submit button
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitButtonSpec {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Declared field type.
///
/// Types outside the named set are kept verbatim and compared as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Email,
    Tel,
    Number,
    Password,
    Checkbox,
    Radio,
    Select,
    Textarea,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Tel => "tel",
            FieldType::Number => "number",
            FieldType::Password => "password",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Select => "select",
            FieldType::Textarea => "textarea",
            FieldType::Other(other) => other,
        }
    }

    /// Checkbox, radio and select carry no placeholder semantics
    pub fn supports_placeholder(&self) -> bool {
        !matches!(self, FieldType::Checkbox | FieldType::Radio | FieldType::Select)
    }

    /// Types a user fills by typing
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Email | FieldType::Tel)
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => FieldType::Text,
            "email" => FieldType::Email,
            "tel" => FieldType::Tel,
            "number" => FieldType::Number,
            "password" => FieldType::Password,
            "checkbox" => FieldType::Checkbox,
            "radio" => FieldType::Radio,
            "select" => FieldType::Select,
            "textarea" => FieldType::Textarea,
            _ => FieldType::Other(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation constraints expected on the markup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<ConstraintValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<ConstraintValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<ConstraintValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<ConstraintValue>,
}

impl Validation {
    /// Declared constraints as expected markup attribute values, in
    /// checking order
    pub fn expected_attributes(&self) -> Vec<(Constraint, String)> {
        [
            (Constraint::Min, self.min.as_ref().map(ConstraintValue::to_attr_string)),
            (Constraint::Max, self.max.as_ref().map(ConstraintValue::to_attr_string)),
            (Constraint::Pattern, self.pattern.clone()),
            (
                Constraint::MinLength,
                self.min_length.as_ref().map(ConstraintValue::to_attr_string),
            ),
            (
                Constraint::MaxLength,
                self.max_length.as_ref().map(ConstraintValue::to_attr_string),
            ),
        ]
        .into_iter()
        .filter_map(|(constraint, value)| value.map(|value| (constraint, value)))
        .collect()
    }
}

/// A constraint written as a JSON number or string.
///
/// Numbers are never parsed back out of markup; they are rendered to the
/// string a JavaScript host would produce and compared as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    Number(serde_json::Number),
    Text(String),
}

impl ConstraintValue {
    pub fn to_attr_string(&self) -> String {
        match self {
            ConstraintValue::Text(text) => text.clone(),
            ConstraintValue::Number(number) => {
                if number.is_i64() || number.is_u64() {
                    return number.to_string();
                }
                match number.as_f64() {
                    Some(value) => format_js_number(value),
                    None => number.to_string(),
                }
            }
        }
    }
}

impl From<i64> for ConstraintValue {
    fn from(value: i64) -> Self {
        ConstraintValue::Number(value.into())
    }
}

impl From<&str> for ConstraintValue {
    fn from(value: &str) -> Self {
        ConstraintValue::Text(value.to_string())
    }
}

// Integral floats print without a fraction (18.0 -> "18") below 1e21, where
// JavaScript switches to exponent notation.
fn format_js_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e21 {
        format!("{}", value as i128)
    } else {
        format!("{}", value)
    }
}

impl FormSpec {
    /// Parse a rubric from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a rubric from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.display().to_string(),
            source,
        })?;
        let spec = Self::from_json(&content)?;
        debug!(
            "Loaded rubric '{}' with {} field(s) from {}",
            spec.id,
            spec.fields.len(),
            path.display()
        );
        Ok(spec)
    }

    /// Look up a field by id
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields marked required
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.id.is_empty() {
                return Err(Error::InvalidRubric("field with empty id".to_string()));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(Error::InvalidRubric(format!(
                    "duplicate field id \"{}\"",
                    field.id
                )));
            }
        }
        Ok(())
    }
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            field_type,
            required: false,
            label: None,
            placeholder: None,
            validation: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Expected label, treating an empty string as absent
    pub fn expected_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }

    /// Expected placeholder, treating an empty string as absent
    pub fn expected_placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REGISTRATION: &str = r#"{
        "id": "registration",
        "fields": [
            { "id": "fullName", "type": "text", "required": true, "label": "Full Name",
              "placeholder": "Enter your full name", "validation": { "minLength": 2, "maxLength": 50 } },
            { "id": "age", "type": "number", "required": false, "validation": { "min": 18, "max": 99 } },
            { "id": "birthday", "type": "date", "validation": { "min": "1900-01-01" } },
            { "id": "terms", "type": "checkbox", "required": true }
        ],
        "submitButton": { "id": "submitBtn", "text": "Register" }
    }"#;

    #[test]
    fn test_parse_registration_rubric() {
        let spec = FormSpec::from_json(REGISTRATION).unwrap();
        assert_eq!(spec.id, "registration");
        assert_eq!(spec.fields.len(), 4);
        assert_eq!(spec.submit_button.id, "submitBtn");
        assert_eq!(spec.submit_button.text.as_deref(), Some("Register"));

        let age = spec.field("age").unwrap();
        assert_eq!(age.field_type, FieldType::Number);
        let validation = age.validation.as_ref().unwrap();
        assert_eq!(validation.min.as_ref().unwrap().to_attr_string(), "18");
        assert_eq!(validation.max.as_ref().unwrap().to_attr_string(), "99");

        let birthday = spec.field("birthday").unwrap();
        assert_eq!(birthday.field_type, FieldType::Other("date".to_string()));
        assert!(!birthday.required);
    }

    #[test]
    fn test_required_fields_in_order() {
        let spec = FormSpec::from_json(REGISTRATION).unwrap();
        let ids: Vec<&str> = spec.required_fields().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["fullName", "terms"]);
    }

    #[test]
    fn test_numbers_stringify_like_a_browser() {
        let parse = |json: &str| serde_json::from_str::<ConstraintValue>(json).unwrap();
        assert_eq!(parse("5").to_attr_string(), "5");
        assert_eq!(parse("5.0").to_attr_string(), "5");
        assert_eq!(parse("0.5").to_attr_string(), "0.5");
        assert_eq!(parse("-3").to_attr_string(), "-3");
        assert_eq!(parse("\"5.0\"").to_attr_string(), "5.0");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{
            "id": "dup",
            "fields": [
                { "id": "email", "type": "email" },
                { "id": "email", "type": "text" }
            ],
            "submitButton": { "id": "go" }
        }"#;
        let err = FormSpec::from_json(json).unwrap_err();
        assert!(matches!(err, Error::InvalidRubric(msg) if msg.contains("email")));
    }

    #[test]
    fn test_missing_submit_button_is_parse_error() {
        let json = r#"{ "id": "x", "fields": [] }"#;
        assert!(matches!(FormSpec::from_json(json), Err(Error::RubricParse(_))));
    }

    #[test]
    fn test_from_file_surfaces_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(FormSpec::from_file(&missing), Err(Error::Read { .. })));

        let path = dir.path().join("registration.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(REGISTRATION.as_bytes()).unwrap();
        let spec = FormSpec::from_file(&path).unwrap();
        assert_eq!(spec.fields[0].expected_label(), Some("Full Name"));
    }

    #[test]
    fn test_empty_label_and_placeholder_are_absent() {
        let field = FieldSpec::new("notes", FieldType::Textarea)
            .with_label("")
            .with_placeholder("");
        assert_eq!(field.expected_label(), None);
        assert_eq!(field.expected_placeholder(), None);
    }

    #[test]
    fn test_field_type_round_trips_through_string() {
        let json = serde_json::to_string(&FieldType::Other("url".to_string())).unwrap();
        assert_eq!(json, "\"url\"");
        let parsed: FieldType = serde_json::from_str("\"select\"").unwrap();
        assert_eq!(parsed, FieldType::Select);
    }
}
