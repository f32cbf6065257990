//! Filter descriptors
//!
//! [`FilterConfig`] is what a configuration file contains; [`Filter`] is the
//! checked, immutable descriptor rules point to.

use crate::error::{CoreError, Result};
use crate::tree::Rule;
use crate::validation::{self, ValidationError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Declared data type of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    String,
    Integer,
    Double,
    Date,
    Time,
    Datetime,
    Boolean,
}

/// Coarse type family used by operators' `apply_to` and by the validators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    String,
    Number,
    Datetime,
    Boolean,
}

impl FilterType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(FilterType::String),
            "integer" => Some(FilterType::Integer),
            "double" => Some(FilterType::Double),
            "date" => Some(FilterType::Date),
            "time" => Some(FilterType::Time),
            "datetime" => Some(FilterType::Datetime),
            "boolean" => Some(FilterType::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::String => "string",
            FilterType::Integer => "integer",
            FilterType::Double => "double",
            FilterType::Date => "date",
            FilterType::Time => "time",
            FilterType::Datetime => "datetime",
            FilterType::Boolean => "boolean",
        }
    }

    pub fn class(&self) -> TypeClass {
        match self {
            FilterType::String => TypeClass::String,
            FilterType::Integer | FilterType::Double => TypeClass::Number,
            FilterType::Date | FilterType::Time | FilterType::Datetime => TypeClass::Datetime,
            FilterType::Boolean => TypeClass::Boolean,
        }
    }

    /// chrono format used when the filter does not configure one
    pub fn default_format(&self) -> Option<&'static str> {
        match self {
            FilterType::Date => Some("%Y-%m-%d"),
            FilterType::Time => Some("%H:%M:%S"),
            FilterType::Datetime => Some("%Y-%m-%d %H:%M:%S"),
            _ => None,
        }
    }
}

impl TypeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeClass::String => "string",
            TypeClass::Number => "number",
            TypeClass::Datetime => "datetime",
            TypeClass::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of input widget a filter is edited with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Number,
    Textarea,
    Radio,
    Checkbox,
    Select,
    /// Rendered by the view adapter's own widget; validated like free-form input
    Custom,
}

impl InputKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "text" => Some(InputKind::Text),
            "number" => Some(InputKind::Number),
            "textarea" => Some(InputKind::Textarea),
            "radio" => Some(InputKind::Radio),
            "checkbox" => Some(InputKind::Checkbox),
            "select" => Some(InputKind::Select),
            "custom" => Some(InputKind::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Number => "number",
            InputKind::Textarea => "textarea",
            InputKind::Radio => "radio",
            InputKind::Checkbox => "checkbox",
            InputKind::Select => "select",
            InputKind::Custom => "custom",
        }
    }

    /// Inputs picking from a fixed list of values
    pub fn is_choice(&self) -> bool {
        matches!(self, InputKind::Radio | InputKind::Checkbox | InputKind::Select)
    }
}

type ValidateFn = dyn Fn(&Value, &Rule) -> std::result::Result<(), ValidationError> + Send + Sync;

/// Custom validation hook. When present it replaces the built-in checks entirely.
#[derive(Clone)]
pub struct ValidationCallback(Arc<ValidateFn>);

impl ValidationCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Rule) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &Value, rule: &Rule) -> std::result::Result<(), ValidationError> {
        (self.0)(value, rule)
    }
}

impl fmt::Debug for ValidationCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidationCallback(..)")
    }
}

/// Validation policy of a filter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Validation {
    /// Minimum length (string), value (number) or instant (datetime)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,

    /// Numbers must be a multiple of `step`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    /// Regex for strings, chrono format for date/time types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default)]
    pub allow_empty_value: bool,

    #[serde(skip)]
    pub callback: Option<ValidationCallback>,
}

/// One selectable value of a radio/checkbox/select filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub value: Value,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceConfig {
    Labelled { value: Value, label: String },
    Plain(Value),
}

impl From<ChoiceConfig> for Choice {
    fn from(config: ChoiceConfig) -> Self {
        match config {
            ChoiceConfig::Labelled { value, label } => Choice { value, label },
            ChoiceConfig::Plain(value) => {
                let label = match &value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Choice { value, label }
            }
        }
    }
}

/// Filter descriptor as written in configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub filter_type: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub values: Vec<ChoiceConfig>,
    #[serde(default)]
    pub multiple: bool,
    /// Explicit ordered allow-list of operator types
    #[serde(default)]
    pub operators: Option<Vec<String>>,
    #[serde(default)]
    pub optgroup: Option<String>,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub default_operator: Option<String>,
    #[serde(default)]
    pub placeholder_value: Option<Value>,
}

impl FilterConfig {
    pub fn new(id: &str, filter_type: &str) -> Self {
        Self {
            id: id.to_string(),
            filter_type: Some(filter_type.to_string()),
            ..Default::default()
        }
    }

    pub fn with_input(mut self, input: &str) -> Self {
        self.input = Some(input.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values.into_iter().map(ChoiceConfig::Plain).collect();
        self
    }

    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn with_operators(mut self, operators: &[&str]) -> Self {
        self.operators = Some(operators.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_optgroup(mut self, optgroup: &str) -> Self {
        self.optgroup = Some(optgroup.to_string());
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_default_operator(mut self, operator: &str) -> Self {
        self.default_operator = Some(operator.to_string());
        self
    }
}

/// Checked filter descriptor
#[derive(Debug, Clone)]
pub struct Filter {
    pub id: String,
    pub field: String,
    pub label: String,
    pub filter_type: FilterType,
    pub input: InputKind,
    pub values: Vec<Choice>,
    pub multiple: bool,
    pub operators: Option<Vec<String>>,
    pub optgroup: Option<String>,
    pub validation: Validation,
    pub default_value: Option<Value>,
    pub default_operator: Option<String>,
    pub placeholder_value: Value,
    pattern: Option<Regex>,
}

impl Filter {
    /// Validate one configured filter and fill its defaults.
    pub fn check(config: FilterConfig) -> Result<Self> {
        if config.id.is_empty() {
            return Err(CoreError::ConfigError(
                "Missing filter \"id\"".to_string(),
            ));
        }
        let id = config.id;

        let filter_type = match config.filter_type.as_deref() {
            None => FilterType::String,
            Some(name) => FilterType::parse(name).ok_or_else(|| {
                CoreError::ConfigError(format!("Invalid type \"{}\" for filter \"{}\"", name, id))
            })?,
        };

        let input = match config.input.as_deref() {
            None if filter_type.class() == TypeClass::Number => InputKind::Number,
            None => InputKind::Text,
            Some(name) => InputKind::parse(name).ok_or_else(|| {
                CoreError::ConfigError(format!("Invalid input \"{}\" for filter \"{}\"", name, id))
            })?,
        };

        if input.is_choice() && config.values.is_empty() {
            return Err(CoreError::ConfigError(format!(
                "Missing filter \"{}\" values",
                id
            )));
        }

        let pattern = match (filter_type.class(), config.validation.format.as_deref()) {
            (TypeClass::String, Some(format)) => Some(Regex::new(format).map_err(|e| {
                CoreError::ConfigError(format!("Invalid format for filter \"{}\": {}", id, e))
            })?),
            _ => None,
        };

        if filter_type.class() == TypeClass::Datetime {
            let format = config
                .validation
                .format
                .as_deref()
                .or(filter_type.default_format())
                .unwrap_or_default();
            for bound in [&config.validation.min, &config.validation.max].into_iter().flatten() {
                let parsed = bound
                    .as_str()
                    .and_then(|s| validation::parse_temporal(filter_type, s, format));
                if parsed.is_none() {
                    return Err(CoreError::ConfigError(format!(
                        "Invalid bound {} for filter \"{}\" with format \"{}\"",
                        bound, id, format
                    )));
                }
            }
        }

        Ok(Filter {
            field: config.field.unwrap_or_else(|| id.clone()),
            label: config.label.unwrap_or_else(|| id.clone()),
            filter_type,
            input,
            values: config.values.into_iter().map(Choice::from).collect(),
            multiple: config.multiple,
            operators: config.operators,
            optgroup: config.optgroup,
            validation: config.validation,
            default_value: config.default_value,
            default_operator: config.default_operator,
            placeholder_value: config
                .placeholder_value
                .unwrap_or_else(|| Value::String("-1".to_string())),
            pattern,
            id,
        })
    }

    /// Compiled `validation.format` of a string filter
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }
}
