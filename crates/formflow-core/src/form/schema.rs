//! Per-step submission schema
//!
//! A `StepSchema` is derived from the fields of one step and turns the raw
//! name/value pairs of a form submission into flat `SessionData`, collecting
//! every field error instead of stopping at the first one.

use serde::Serialize;
use std::collections::BTreeMap;

use super::config::{FieldKind, Step};
use super::validation::ValidatorKey;
use crate::{FieldValue, SessionData};

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let messages = self.errors.entry(field.into()).or_default();
        let message = message.into();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Text,
    List,
    Bool,
}

#[derive(Debug, Clone)]
struct FieldRule {
    name: String,
    label: String,
    required: bool,
    validators: Vec<ValidatorKey>,
    shape: Shape,
}

impl FieldRule {
    fn required_message(&self) -> String {
        format!("{} is required", self.label)
    }

    fn check(&self, value: &str, errors: &mut FieldErrors) {
        for validator in &self.validators {
            if let Err(message) = validator.check(value) {
                errors.add(&self.name, message);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepSchema {
    rules: Vec<FieldRule>,
}

impl StepSchema {
    pub fn from_step(step: &Step) -> Self {
        let rules = step
            .fields()
            .map(|field| FieldRule {
                name: field.name.clone(),
                label: field.label.clone(),
                required: field.required,
                validators: field.validators.clone(),
                shape: match field.kind {
                    FieldKind::CheckboxGroup { .. } => Shape::List,
                    FieldKind::Switch => Shape::Bool,
                    _ => Shape::Text,
                },
            })
            .collect();

        Self { rules }
    }

    /// Field names covered by this schema, in layout order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name.as_str())
    }

    /// Parse submitted name/value pairs; keys without a matching field are ignored
    pub fn parse<K, V>(&self, pairs: &[(K, V)]) -> Result<SessionData, FieldErrors>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut data = SessionData::new();
        let mut errors = FieldErrors::new();

        for rule in &self.rules {
            let mut values = pairs
                .iter()
                .filter(|(key, _)| key.as_ref() == rule.name)
                .map(|(_, value)| value.as_ref());

            match rule.shape {
                Shape::Bool => {
                    let checked = matches!(values.next(), Some("on") | Some("true"));
                    data.insert(rule.name.clone(), FieldValue::Bool(checked));
                }
                Shape::List => {
                    let items: Vec<String> = values
                        .filter(|value| !value.is_empty())
                        .map(str::to_string)
                        .collect();

                    if items.is_empty() {
                        if rule.required {
                            errors.add(&rule.name, rule.required_message());
                            continue;
                        }
                        if pairs.iter().all(|(key, _)| key.as_ref() != rule.name) {
                            continue;
                        }
                    }
                    for item in &items {
                        rule.check(item, &mut errors);
                    }
                    data.insert(rule.name.clone(), FieldValue::List(items));
                }
                Shape::Text => match values.next().filter(|value| !value.is_empty()) {
                    Some(value) => {
                        rule.check(value, &mut errors);
                        data.insert(rule.name.clone(), FieldValue::Text(value.to_string()));
                    }
                    None if rule.required => errors.add(&rule.name, rule.required_message()),
                    None => {}
                },
            }
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormId;
    use crate::form::config::tests::test_catalog;

    fn step_schema(slug: &str) -> StepSchema {
        let catalog = test_catalog();
        let config = catalog.get(&FormId::new("test")).unwrap();
        StepSchema::from_step(config.find_step(slug).unwrap())
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_valid_step_one_submission() {
        let schema = step_schema("step-1");
        let data = schema
            .parse(&pairs(&[
                ("name", "John Doe"),
                ("apples", "apple-1"),
                ("apples", "apple-3"),
                ("notifications", "on"),
                ("ein", "12-3456789"),
            ]))
            .unwrap();

        assert_eq!(data["name"], FieldValue::from("John Doe"));
        assert_eq!(
            data["apples"],
            FieldValue::List(vec!["apple-1".to_string(), "apple-3".to_string()])
        );
        assert_eq!(data["notifications"], FieldValue::Bool(true));
        assert_eq!(data["ein"], FieldValue::from("12-3456789"));
    }

    #[test]
    fn test_required_fields_reported_by_label() {
        let schema = step_schema("step-1");
        let errors = schema.parse::<String, String>(&[]).unwrap_err();

        assert_eq!(errors.get("name"), Some(&["Name is required".to_string()][..]));
        assert_eq!(errors.get("apples"), Some(&["Apples is required".to_string()][..]));
        assert!(errors.get("notifications").is_none());
        assert!(errors.get("ein").is_none());
    }

    #[test]
    fn test_switch_defaults_to_false() {
        let schema = step_schema("step-1");
        let data = schema
            .parse(&pairs(&[("name", "Jane"), ("apples", "apple-2")]))
            .unwrap();
        assert_eq!(data["notifications"], FieldValue::Bool(false));

        let data = schema
            .parse(&pairs(&[
                ("name", "Jane"),
                ("apples", "apple-2"),
                ("notifications", "off"),
            ]))
            .unwrap();
        assert_eq!(data["notifications"], FieldValue::Bool(false));
    }

    #[test]
    fn test_optional_empty_text_is_omitted() {
        let schema = step_schema("step-1");
        let data = schema
            .parse(&pairs(&[("name", "Jane"), ("apples", "apple-2"), ("ein", "")]))
            .unwrap();
        assert!(!data.contains_key("ein"));
    }

    #[test]
    fn test_validator_errors_collected() {
        let schema = step_schema("step-1");
        let errors = schema
            .parse(&pairs(&[("name", "J"), ("apples", "apple-1"), ("ein", "123")]))
            .unwrap_err();

        assert_eq!(
            errors.get("name"),
            Some(&["Name must be at least 2 characters".to_string()][..])
        );
        assert_eq!(
            errors.get("ein"),
            Some(&["EIN must be in the format XX-XXXXXXX (e.g., 12-3456789)".to_string()][..])
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_empty_checkbox_values_dropped() {
        let schema = step_schema("step-1");
        let errors = schema
            .parse(&pairs(&[("name", "Jane"), ("apples", "")]))
            .unwrap_err();
        assert_eq!(errors.get("apples"), Some(&["Apples is required".to_string()][..]));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let schema = step_schema("step-2");
        let data = schema
            .parse(&pairs(&[
                ("phone", "(555) 123-4567"),
                ("comments", "Note"),
                ("intruder", "x"),
            ]))
            .unwrap();
        assert_eq!(data.len(), 2);
        assert!(!data.contains_key("intruder"));
    }

    #[test]
    fn test_field_names_in_layout_order() {
        let schema = step_schema("step-1");
        let names: Vec<_> = schema.field_names().collect();
        assert_eq!(names, vec!["name", "apples", "notifications", "ein"]);
    }
}
