//! Form field model and JSON payload assembly.
//!
//! A form is an ordered set of named fields edited in an overlay. Required
//! fields are validated client-side before any request is made; the
//! resulting payload is plain JSON matching the backend's documented shapes.

use serde_json::{Map, Value};
use thiserror::Error;

/// Client-side validation failure; surfaced without a network round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    MissingField(String),
}

/// How a field's text becomes JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain string value
    Text,
    /// Comma-separated list, trimmed, empties dropped
    CommaList,
}

/// One named, labeled input.
#[derive(Debug, Clone)]
pub struct Field {
    /// JSON key in the payload
    pub name: &'static str,
    /// Label shown next to the input
    pub label: &'static str,
    pub value: String,
    pub required: bool,
    pub kind: FieldKind,
}

impl Field {
    pub fn text(name: &'static str, label: &'static str, required: bool) -> Self {
        Self {
            name,
            label,
            value: String::new(),
            required,
            kind: FieldKind::Text,
        }
    }

    pub fn comma_list(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            value: String::new(),
            required: false,
            kind: FieldKind::CommaList,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// An editable form with one focused field.
#[derive(Debug, Clone)]
pub struct Form {
    pub title: String,
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    pub fn new(title: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            title: title.into(),
            fields,
            focus: 0,
        }
    }

    /// Move focus to the next field, wrapping.
    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    /// Move focus to the previous field, wrapping.
    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Append a character to the focused field.
    pub fn push_char(&mut self, ch: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(ch);
        }
    }

    /// Remove the last character of the focused field.
    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    /// Look up a field's current value by name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Validate required fields and serialize to a JSON object.
    ///
    /// # Returns
    /// * `Result<Value, FormError>` - The payload, or the first missing
    ///   required field
    pub fn payload(&self) -> Result<Value, FormError> {
        let mut object = Map::new();
        for field in &self.fields {
            let trimmed = field.value.trim();
            if field.required && trimmed.is_empty() {
                return Err(FormError::MissingField(field.label.to_string()));
            }
            let value = match field.kind {
                FieldKind::Text => Value::String(trimmed.to_string()),
                FieldKind::CommaList => Value::Array(
                    trimmed
                        .split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                ),
            };
            object.insert(field.name.to_string(), value);
        }
        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_form() -> Form {
        Form::new(
            "Add student",
            vec![
                Field::text("student_name", "Name", true),
                Field::text("alias_name", "Alias", false),
                Field::comma_list("groups", "Groups"),
                Field::text("status", "Status", false).with_value("active"),
            ],
        )
    }

    #[test]
    fn test_payload_shapes_fields() {
        let mut form = student_form();
        form.fields[0].value = "Wren".to_string();
        form.fields[2].value = "piano, grade-2 , ".to_string();
        let payload = form.payload().unwrap();
        assert_eq!(payload["student_name"], "Wren");
        assert_eq!(payload["alias_name"], "");
        assert_eq!(
            payload["groups"],
            serde_json::json!(["piano", "grade-2"])
        );
        assert_eq!(payload["status"], "active");
    }

    #[test]
    fn test_missing_required_field_fails_before_any_request() {
        let form = student_form();
        assert_eq!(
            form.payload(),
            Err(FormError::MissingField("Name".to_string()))
        );
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let mut form = student_form();
        form.fields[0].value = "   ".to_string();
        assert!(form.payload().is_err());
    }

    #[test]
    fn test_focus_editing() {
        let mut form = student_form();
        form.push_char('W');
        form.focus_next();
        form.push_char('w');
        form.push_char('x');
        form.pop_char();
        assert_eq!(form.value("student_name"), Some("W"));
        assert_eq!(form.value("alias_name"), Some("w"));
        form.focus_prev();
        assert_eq!(form.focus, 0);
    }
}
