//! Per-type checkers, keyed by the filter's type class

use super::{ValidationError, ValidationResult};
use crate::registry::{Filter, FilterType, TypeClass};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

const FALLBACK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(super) fn check_string(filter: &Filter, value: &Value) -> ValidationResult {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let length = text.chars().count() as f64;
    let validation = &filter.validation;

    if let Some(bound) = &validation.min {
        if as_number(bound).is_some_and(|min| length < min) {
            return Err(ValidationError::new("string_exceed_min_length").with_arg(bound.clone()));
        }
    }
    if let Some(bound) = &validation.max {
        if as_number(bound).is_some_and(|max| length > max) {
            return Err(ValidationError::new("string_exceed_max_length").with_arg(bound.clone()));
        }
    }
    if let Some(pattern) = filter.pattern() {
        if !pattern.is_match(&text) {
            return Err(ValidationError::new("string_invalid_format")
                .with_arg(pattern.as_str().to_string()));
        }
    }
    Ok(())
}

pub(super) fn check_number(filter: &Filter, value: &Value) -> Result<f64, ValidationError> {
    let number = as_number(value).ok_or_else(|| ValidationError::new("number_nan"))?;
    let validation = &filter.validation;

    if filter.filter_type == FilterType::Integer && number.fract() != 0.0 {
        return Err(ValidationError::new("number_not_double"));
    }
    if let Some(bound) = &validation.min {
        if as_number(bound).is_some_and(|min| number < min) {
            return Err(ValidationError::new("number_exceed_min").with_arg(bound.clone()));
        }
    }
    if let Some(bound) = &validation.max {
        if as_number(bound).is_some_and(|max| number > max) {
            return Err(ValidationError::new("number_exceed_max").with_arg(bound.clone()));
        }
    }
    if let Some(step) = validation.step.filter(|s| *s > 0.0) {
        let ratio = number / step;
        if (ratio - ratio.round()).abs() > 1e-9 {
            return Err(ValidationError::new("number_wrong_step").with_arg(step));
        }
    }
    Ok(number)
}

pub(super) fn check_datetime(
    filter: &Filter,
    value: &Value,
) -> Result<NaiveDateTime, ValidationError> {
    let format = temporal_format(filter);
    let instant = value
        .as_str()
        .and_then(|s| parse_temporal(filter.filter_type, s, format))
        .ok_or_else(|| ValidationError::new("datetime_invalid").with_arg(format))?;
    let validation = &filter.validation;

    if let Some(bound) = &validation.min {
        let min = bound.as_str().and_then(|s| parse_temporal(filter.filter_type, s, format));
        if min.is_some_and(|min| instant < min) {
            return Err(ValidationError::new("datetime_exceed_min").with_arg(bound.clone()));
        }
    }
    if let Some(bound) = &validation.max {
        let max = bound.as_str().and_then(|s| parse_temporal(filter.filter_type, s, format));
        if max.is_some_and(|max| instant > max) {
            return Err(ValidationError::new("datetime_exceed_max").with_arg(bound.clone()));
        }
    }
    Ok(instant)
}

pub(super) fn check_boolean(value: &Value) -> ValidationResult {
    let valid = match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_f64(), Some(v) if v == 0.0 || v == 1.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "false" | "1" | "0"
        ),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("boolean_not_valid"))
    }
}

/// `low <= high` for ordered types. Endpoints that do not parse were already
/// reported by the per-value checks.
pub(super) fn check_range(filter: &Filter, low: &Value, high: &Value) -> ValidationResult {
    let ordered = match filter.filter_type.class() {
        TypeClass::Number => match (as_number(low), as_number(high)) {
            (Some(a), Some(b)) => a <= b,
            _ => true,
        },
        TypeClass::Datetime => {
            let format = temporal_format(filter);
            let parse = |v: &Value| {
                v.as_str()
                    .and_then(|s| parse_temporal(filter.filter_type, s, format))
            };
            match (parse(low), parse(high)) {
                (Some(a), Some(b)) => a <= b,
                _ => true,
            }
        }
        TypeClass::String | TypeClass::Boolean => true,
    };

    if ordered {
        Ok(())
    } else {
        Err(
            ValidationError::new(format!("{}_between_invalid", filter.filter_type.as_str()))
                .with_arg(low.clone())
                .with_arg(high.clone()),
        )
    }
}

/// Parse a date/time/datetime string with a chrono format.
///
/// Dates land at midnight and times on 1970-01-01 so that every temporal
/// type compares in calendar order.
pub(crate) fn parse_temporal(
    filter_type: FilterType,
    input: &str,
    format: &str,
) -> Option<NaiveDateTime> {
    match filter_type {
        FilterType::Date => NaiveDate::parse_from_str(input, format)
            .ok()?
            .and_hms_opt(0, 0, 0),
        FilterType::Time => {
            let time = NaiveTime::parse_from_str(input, format).ok()?;
            Some(NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(time))
        }
        _ => NaiveDateTime::parse_from_str(input, format)
            .ok()
            .or_else(|| NaiveDate::parse_from_str(input, format).ok()?.and_hms_opt(0, 0, 0)),
    }
}

fn temporal_format(filter: &Filter) -> &str {
    filter
        .validation
        .format
        .as_deref()
        .or(filter.filter_type.default_format())
        .unwrap_or(FALLBACK_FORMAT)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
