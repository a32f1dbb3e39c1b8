//! Form configuration model and catalog lookup

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::meta::MetaDescriptor;
use super::validation::ValidatorKey;
use crate::{Error, FormId, Result};

/// Step slugs that collide with the fixed checkout/finished routes
pub const RESERVED_STEP_SLUGS: &[&str] = &["checkout", "finished"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskType {
    Ein,
    Zipcode,
    Phone,
}

/// Type-specific part of a field, tagged by the `type` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldKind {
    #[serde(rename = "text")]
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    #[serde(rename = "email")]
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    #[serde(rename = "password")]
    Password {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    #[serde(rename = "tel")]
    Tel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    #[serde(rename = "url")]
    Url {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    #[serde(rename = "number")]
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    MaskedInput {
        mask_type: MaskType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    CheckboxGroup {
        options: Vec<FieldOption>,
    },
    RadioGroup {
        options: Vec<FieldOption>,
    },
    Select {
        options: Vec<FieldOption>,
    },
    Combobox {
        options: Vec<FieldOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    Switch,
    Textarea {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rows: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

impl FieldKind {
    /// Options offered by choice fields
    pub fn options(&self) -> Option<&[FieldOption]> {
        match self {
            FieldKind::CheckboxGroup { options }
            | FieldKind::RadioGroup { options }
            | FieldKind::Select { options }
            | FieldKind::Combobox { options, .. } => Some(options),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub label: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_complete: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepButtons {
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continue_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub slug: String,
    #[serde(default)]
    pub meta: Vec<MetaDescriptor>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub buttons: StepButtons,
}

impl Step {
    /// All fields of the step in layout order (row, then column)
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.rows
            .iter()
            .flat_map(|row| row.columns.iter())
            .flat_map(|column| column.fields.iter())
    }
}

/// Meta for the checkout and finished pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub meta: Vec<MetaDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Hidden forms are reachable by URL but not listed
    #[serde(default)]
    pub hidden: bool,
    /// Disabled forms behave as if they did not exist
    #[serde(default)]
    pub disabled: bool,
    /// Include the form configuration in step views
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub meta: Vec<MetaDescriptor>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<PageMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<PageMeta>,
}

impl FormConfig {
    pub fn first_step(&self) -> Option<&Step> {
        self.steps.first()
    }

    pub fn find_step(&self, step_slug: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.slug == step_slug)
    }

    pub fn step_index(&self, step_slug: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.slug == step_slug)
    }

    pub fn is_valid_step_slug(&self, step_slug: &str) -> bool {
        self.find_step(step_slug).is_some()
    }

    /// The step after `current_step_slug`, or `None` when it is the last one
    pub fn next_step(&self, current_step_slug: &str) -> Option<&Step> {
        let index = self.step_index(current_step_slug)?;
        self.steps.get(index + 1)
    }

    /// Check structural invariants the step controller relies on
    pub fn validate(&self, form_id: &FormId) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::ConfigValidation(format!(
                "form '{}' has no steps",
                form_id
            )));
        }

        let mut slugs = HashSet::new();
        let mut field_names = HashSet::new();

        for step in &self.steps {
            if step.slug.trim().is_empty() {
                return Err(Error::ConfigValidation(format!(
                    "form '{}' has a step with an empty slug",
                    form_id
                )));
            }
            if RESERVED_STEP_SLUGS.contains(&step.slug.as_str()) {
                return Err(Error::ConfigValidation(format!(
                    "form '{}': step slug '{}' is reserved",
                    form_id, step.slug
                )));
            }
            if !slugs.insert(step.slug.as_str()) {
                return Err(Error::ConfigValidation(format!(
                    "form '{}': duplicate step slug '{}'",
                    form_id, step.slug
                )));
            }

            for field in step.fields() {
                if !field_names.insert(field.name.as_str()) {
                    return Err(Error::ConfigValidation(format!(
                        "form '{}': duplicate field name '{}'",
                        form_id, field.name
                    )));
                }
                if field.kind.options().is_some_and(|options| options.is_empty()) {
                    return Err(Error::ConfigValidation(format!(
                        "form '{}': field '{}' has no options",
                        form_id, field.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// All known forms, keyed by form id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormCatalog {
    #[serde(default)]
    forms: BTreeMap<FormId, FormConfig>,
}

impl FormCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(mut self, form_id: impl Into<FormId>, config: FormConfig) -> Self {
        self.forms.insert(form_id.into(), config);
        self
    }

    pub fn get(&self, form_id: &FormId) -> Option<&FormConfig> {
        self.forms.get(form_id)
    }

    pub fn is_valid_form_id(&self, form_id: &FormId) -> bool {
        self.forms.contains_key(form_id)
    }

    pub fn form_ids(&self) -> impl Iterator<Item = &FormId> {
        self.forms.keys()
    }

    /// Forms that may be listed publicly
    pub fn visible_forms(&self) -> impl Iterator<Item = (&FormId, &FormConfig)> {
        self.forms
            .iter()
            .filter(|(_, config)| !config.hidden && !config.disabled)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Look up an enabled form
    ///
    /// # Errors
    /// - `Error::FormNotFound` if the form is unknown or disabled
    pub fn validate_form(&self, form_id: &FormId) -> Result<&FormConfig> {
        match self.forms.get(form_id) {
            Some(config) if !config.disabled => Ok(config),
            _ => Err(Error::FormNotFound(form_id.to_string())),
        }
    }

    /// Look up an enabled form and one of its steps
    ///
    /// # Errors
    /// - `Error::FormNotFound` if the form is unknown or disabled
    /// - `Error::StepNotFound` if the form has no step with this slug
    pub fn validate_form_and_step(
        &self,
        form_id: &FormId,
        step_slug: &str,
    ) -> Result<(&FormConfig, &Step)> {
        let config = self.validate_form(form_id)?;
        let step = config
            .find_step(step_slug)
            .ok_or_else(|| Error::StepNotFound {
                form_id: form_id.to_string(),
                step_slug: step_slug.to_string(),
            })?;
        Ok((config, step))
    }

    /// Validate every form in the catalog
    pub fn validate(&self) -> Result<()> {
        for (form_id, config) in &self.forms {
            config.validate(form_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_CATALOG: &str = r#"
forms:
  test:
    hidden: true
    debug: true
    meta:
      - title: Test
      - name: description
        content: Test description
    steps:
      - slug: step-1
        meta:
          - title: Step 1
        buttons:
          continue: Continue to Step 2
          back: Go Back
        rows:
          - columns:
              - fields:
                  - label: Name
                    name: name
                    type: text
                    required: true
                    validators: [name]
                    autoComplete: name
              - fields:
                  - label: Apples
                    name: apples
                    type: CheckboxGroup
                    required: true
                    options:
                      - { label: Apple 1, value: apple-1 }
                      - { label: Apple 2, value: apple-2 }
                      - { label: Apple 3, value: apple-3 }
          - columns:
              - fields:
                  - label: Enable Notifications
                    name: notifications
                    type: Switch
                    required: false
              - fields:
                  - label: EIN
                    name: ein
                    type: MaskedInput
                    maskType: ein
                    required: false
                    validators: [ein]
                    placeholder: 12-3456789
      - slug: step-2
        meta:
          - title: Step 2
        rows:
          - columns:
              - fields:
                  - label: Phone Number
                    name: phone
                    type: MaskedInput
                    maskType: phone
                    required: true
                    validators: [phone]
              - fields:
                  - label: Additional Comments
                    name: comments
                    type: Textarea
                    rows: 3
                    required: false
      - slug: step-3
        rows:
          - columns:
              - fields:
                  - label: Tax Year
                    name: taxYear
                    type: number
                    required: true
    checkout:
      meta:
        - title: Complete Your Test
  contact:
    meta:
      - title: Contact
    steps:
      - slug: details
        rows:
          - columns:
              - fields:
                  - label: Email
                    name: email
                    type: email
                    required: true
                    validators: [email]
  retired:
    disabled: true
    meta:
      - title: Retired
    steps:
      - slug: only
"#;

    pub(crate) fn test_catalog() -> FormCatalog {
        serde_yaml::from_str(TEST_CATALOG).unwrap()
    }

    #[test]
    fn test_parse_catalog() {
        let catalog = test_catalog();
        assert_eq!(catalog.len(), 3);

        let config = catalog.get(&FormId::new("test")).unwrap();
        assert!(config.hidden);
        assert_eq!(config.steps.len(), 3);

        let fields: Vec<_> = config.steps[0].fields().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["name", "apples", "notifications", "ein"]);

        let ein = config.steps[0].fields().find(|f| f.name == "ein").unwrap();
        assert_eq!(
            ein.kind,
            FieldKind::MaskedInput {
                mask_type: MaskType::Ein,
                placeholder: Some("12-3456789".to_string())
            }
        );
        assert_eq!(ein.validators, vec![ValidatorKey::Ein]);
        assert_eq!(
            config.steps[0].buttons.continue_label.as_deref(),
            Some("Continue to Step 2")
        );
    }

    #[test]
    fn test_validate_form() {
        let catalog = test_catalog();
        assert!(catalog.validate_form(&FormId::new("test")).is_ok());
        assert!(matches!(
            catalog.validate_form(&FormId::new("missing")),
            Err(Error::FormNotFound(_))
        ));
        assert!(matches!(
            catalog.validate_form(&FormId::new("retired")),
            Err(Error::FormNotFound(_))
        ));
    }

    #[test]
    fn test_validate_form_and_step() {
        let catalog = test_catalog();
        let (_, step) = catalog
            .validate_form_and_step(&FormId::new("test"), "step-2")
            .unwrap();
        assert_eq!(step.slug, "step-2");

        assert!(matches!(
            catalog.validate_form_and_step(&FormId::new("test"), "step-9"),
            Err(Error::StepNotFound { .. })
        ));
        assert!(matches!(
            catalog.validate_form_and_step(&FormId::new("missing"), "step-1"),
            Err(Error::FormNotFound(_))
        ));
    }

    #[test]
    fn test_visible_forms_skip_hidden_and_disabled() {
        let catalog = test_catalog();
        let visible: Vec<_> = catalog.visible_forms().map(|(id, _)| id.as_str()).collect();
        assert_eq!(visible, vec!["contact"]);
    }

    #[test]
    fn test_step_order() {
        let catalog = test_catalog();
        let config = catalog.get(&FormId::new("test")).unwrap();
        assert_eq!(config.first_step().unwrap().slug, "step-1");
        assert_eq!(config.next_step("step-1").unwrap().slug, "step-2");
        assert!(config.next_step("step-3").is_none());
        assert!(config.next_step("nope").is_none());
    }

    #[test]
    fn test_catalog_validation_errors() {
        let mut catalog = test_catalog();
        assert!(catalog.validate().is_ok());

        let mut config = catalog.get(&FormId::new("contact")).unwrap().clone();
        config.steps.push(config.steps[0].clone());
        catalog = catalog.with_form("contact", config.clone());
        assert!(matches!(catalog.validate(), Err(Error::ConfigValidation(_))));

        config.steps.truncate(1);
        config.steps[0].slug = "checkout".to_string();
        catalog = catalog.with_form("contact", config.clone());
        assert!(matches!(catalog.validate(), Err(Error::ConfigValidation(_))));

        config.steps.clear();
        catalog = catalog.with_form("contact", config);
        assert!(matches!(catalog.validate(), Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let yaml = r#"
forms:
  dup:
    steps:
      - slug: a
        rows:
          - columns:
              - fields:
                  - { label: Name, name: name, type: text }
      - slug: b
        rows:
          - columns:
              - fields:
                  - { label: Name again, name: name, type: text }
"#;
        let catalog: FormCatalog = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(catalog.validate(), Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_field_round_trips_through_json() {
        let catalog = test_catalog();
        let config = catalog.get(&FormId::new("test")).unwrap();
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["steps"][0]["rows"][0]["columns"][1]["fields"][0]["type"], "CheckboxGroup");
        assert_eq!(json["steps"][0]["buttons"]["continue"], "Continue to Step 2");

        let back: FormConfig = serde_json::from_value(json).unwrap();
        assert_eq!(&back, config);
    }
}
