//! Value validation engine
//!
//! Decides whether a candidate value is acceptable for a rule and, if not,
//! produces a [`ValidationError`]: a stable code plus positional message
//! arguments. Validation never mutates the rule.

mod checkers;

pub(crate) use checkers::parse_temporal;

use crate::registry::{Filter, InputKind, Operator, TypeClass};
use crate::tree::Rule;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Rejection reason returned by the validators.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{code}")]
pub struct ValidationError {
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl ValidationError {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `[code, ...args]`
    pub fn to_tuple(&self) -> Vec<Value> {
        std::iter::once(Value::String(self.code.clone()))
            .chain(self.args.iter().cloned())
            .collect()
    }
}

pub type ValidationResult = Result<(), ValidationError>;

/// Validate `value` as a candidate value of `rule`.
///
/// A filter's custom callback, when set, is fully trusted and replaces every
/// built-in check.
pub fn validate_value(rule: &Rule, value: &Value) -> ValidationResult {
    let filter = rule.filter().ok_or_else(|| ValidationError::new("no_filter"))?;
    let operator = rule
        .operator()
        .ok_or_else(|| ValidationError::new("no_operator"))?;

    match &filter.validation.callback {
        Some(callback) => callback.call(value, rule),
        None => validate_builtin(filter, operator, value),
    }
}

/// Built-in checks, usable without a rule
pub fn validate_builtin(filter: &Filter, operator: &Operator, value: &Value) -> ValidationResult {
    let slots = normalize(value, operator.nb_inputs);

    for slot in &slots {
        if !operator.multiple {
            if let Value::Array(selected) = slot {
                if selected.len() > 1 {
                    return Err(ValidationError::new("operator_not_multiple")
                        .with_arg(operator.op_type.clone()));
                }
            }
        }

        if filter.input.is_choice() {
            check_choice(filter, slot)?;
        } else {
            let scalars: &[Value] = match slot {
                Value::Array(items) if !items.is_empty() => items,
                other => std::slice::from_ref(other),
            };
            for scalar in scalars {
                check_free_form(filter, scalar)?;
            }
        }
    }

    if operator.is_range() && slots.len() == 2 {
        checkers::check_range(filter, &slots[0], &slots[1])?;
    }

    Ok(())
}

/// One entry per input slot: a scalar value is a single slot, a multi-slot
/// value is padded with nulls up to the arity.
fn normalize(value: &Value, nb_inputs: usize) -> Vec<Value> {
    match nb_inputs {
        0 => Vec::new(),
        1 => vec![value.clone()],
        n => {
            let mut slots = match value {
                Value::Array(items) => items.iter().take(n).cloned().collect::<Vec<_>>(),
                other => vec![other.clone()],
            };
            slots.resize(n, Value::Null);
            slots
        }
    }
}

/// Null, an empty string or an empty selection
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty() || items.iter().all(is_empty_value),
        _ => false,
    }
}

fn empty_error(filter: &Filter) -> ValidationError {
    ValidationError::new(format!("{}_empty", filter.input.as_str()))
}

fn check_choice(filter: &Filter, slot: &Value) -> ValidationResult {
    let empty = match filter.input {
        InputKind::Select if !filter.multiple => {
            is_empty_value(slot) || *slot == filter.placeholder_value
        }
        _ => is_empty_value(slot),
    };
    if empty && !filter.validation.allow_empty_value {
        return Err(empty_error(filter));
    }
    Ok(())
}

fn check_free_form(filter: &Filter, value: &Value) -> ValidationResult {
    if is_empty_value(value) {
        if filter.validation.allow_empty_value {
            return Ok(());
        }
        return Err(empty_error(filter));
    }

    match filter.filter_type.class() {
        TypeClass::String => checkers::check_string(filter, value),
        TypeClass::Number => checkers::check_number(filter, value).map(|_| ()),
        TypeClass::Datetime => checkers::check_datetime(filter, value).map(|_| ()),
        TypeClass::Boolean => checkers::check_boolean(value),
    }
}
