//! Operator descriptors and the operator catalog

use super::filter::FilterType;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A comparison kind usable by rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    #[serde(rename = "type")]
    pub op_type: String,

    /// Number of value slots (arity)
    pub nb_inputs: usize,

    /// Each slot accepts several selected values
    #[serde(default)]
    pub multiple: bool,

    /// Type classes (or exact filter types) this operator applies to
    pub apply_to: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optgroup: Option<String>,
}

impl Operator {
    pub fn new(op_type: &str, nb_inputs: usize, multiple: bool, apply_to: &[&str]) -> Self {
        Self {
            op_type: op_type.to_string(),
            nb_inputs,
            multiple,
            apply_to: apply_to.iter().map(|s| s.to_string()).collect(),
            optgroup: None,
        }
    }

    pub fn with_optgroup(mut self, optgroup: &str) -> Self {
        self.optgroup = Some(optgroup.to_string());
        self
    }

    /// Whether a filter of `filter_type` may use this operator
    pub fn applies_to(&self, filter_type: FilterType) -> bool {
        self.apply_to
            .iter()
            .any(|t| t == filter_type.class().as_str() || t == filter_type.as_str())
    }

    /// `between` and `not_between` carry an ordered pair
    pub fn is_range(&self) -> bool {
        self.op_type == "between" || self.op_type == "not_between"
    }
}

/// Operator entry in a builder configuration: a catalog key or an inline descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorEntry {
    Key(String),
    Inline(OperatorConfig),
}

impl From<&str> for OperatorEntry {
    fn from(key: &str) -> Self {
        OperatorEntry::Key(key.to_string())
    }
}

impl From<Operator> for OperatorEntry {
    fn from(operator: Operator) -> Self {
        OperatorEntry::Inline(OperatorConfig {
            op_type: operator.op_type,
            nb_inputs: Some(operator.nb_inputs),
            multiple: operator.multiple,
            apply_to: Some(operator.apply_to),
            optgroup: operator.optgroup,
        })
    }
}

/// Inline operator descriptor before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    #[serde(rename = "type", default)]
    pub op_type: String,
    #[serde(default)]
    pub nb_inputs: Option<usize>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub apply_to: Option<Vec<String>>,
    #[serde(default)]
    pub optgroup: Option<String>,
}

impl OperatorConfig {
    pub(crate) fn check(self) -> Result<Operator> {
        if self.op_type.is_empty() {
            return Err(CoreError::ConfigError(
                "Missing \"type\" for operator".to_string(),
            ));
        }
        let nb_inputs = self.nb_inputs.ok_or_else(|| {
            CoreError::ConfigError(format!(
                "Missing \"nb_inputs\" for operator \"{}\"",
                self.op_type
            ))
        })?;
        let apply_to = self.apply_to.ok_or_else(|| {
            CoreError::ConfigError(format!(
                "Missing \"apply_to\" for operator \"{}\"",
                self.op_type
            ))
        })?;
        Ok(Operator {
            op_type: self.op_type,
            nb_inputs,
            multiple: self.multiple,
            apply_to,
            optgroup: self.optgroup,
        })
    }
}

static GLOBAL_CATALOG: OnceLock<OperatorCatalog> = OnceLock::new();

/// Ordered catalog of known operators, looked up by type.
///
/// A process-wide instance is available through [`OperatorCatalog::global`];
/// it can be replaced once with [`OperatorCatalog::install`] before first
/// use and is frozen afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorCatalog {
    operators: Vec<Operator>,
}

impl OperatorCatalog {
    pub fn new(operators: Vec<Operator>) -> Result<Self> {
        for (i, operator) in operators.iter().enumerate() {
            if operators[..i].iter().any(|o| o.op_type == operator.op_type) {
                return Err(CoreError::ConfigError(format!(
                    "Operator \"{}\" already defined",
                    operator.op_type
                )));
            }
        }
        Ok(Self { operators })
    }

    /// The stock operator set
    pub fn builtin() -> Self {
        const ALL: &[&str] = &["string", "number", "datetime", "boolean"];
        const ORDERED: &[&str] = &["number", "datetime"];
        const LISTABLE: &[&str] = &["string", "number", "datetime"];
        const STRING: &[&str] = &["string"];

        Self {
            operators: vec![
                Operator::new("equal", 1, false, ALL),
                Operator::new("not_equal", 1, false, ALL),
                Operator::new("in", 1, true, LISTABLE),
                Operator::new("not_in", 1, true, LISTABLE),
                Operator::new("less", 1, false, ORDERED),
                Operator::new("less_or_equal", 1, false, ORDERED),
                Operator::new("greater", 1, false, ORDERED),
                Operator::new("greater_or_equal", 1, false, ORDERED),
                Operator::new("between", 2, false, ORDERED),
                Operator::new("not_between", 2, false, ORDERED),
                Operator::new("begins_with", 1, false, STRING),
                Operator::new("not_begins_with", 1, false, STRING),
                Operator::new("contains", 1, false, STRING),
                Operator::new("not_contains", 1, false, STRING),
                Operator::new("ends_with", 1, false, STRING),
                Operator::new("not_ends_with", 1, false, STRING),
                Operator::new("is_empty", 0, false, STRING),
                Operator::new("is_not_empty", 0, false, STRING),
                Operator::new("is_null", 0, false, ALL),
                Operator::new("is_not_null", 0, false, ALL),
            ],
        }
    }

    /// Process-wide catalog; the built-in set unless one was installed first
    pub fn global() -> &'static OperatorCatalog {
        GLOBAL_CATALOG.get_or_init(OperatorCatalog::builtin)
    }

    /// Install the process-wide catalog. Fails once the catalog is frozen.
    pub fn install(catalog: OperatorCatalog) -> Result<()> {
        GLOBAL_CATALOG.set(catalog).map_err(|_| {
            CoreError::ConfigError("Operator catalog is already initialized".to_string())
        })
    }

    pub fn get(&self, op_type: &str) -> Option<&Operator> {
        self.operators.iter().find(|o| o.op_type == op_type)
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl Default for OperatorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
