//! Filter/Operator registry
//!
//! Built once from configuration and read-only afterwards. Construction
//! failures are fatal: a builder never starts with a partially checked
//! registry.

pub mod filter;
pub mod operator;

pub use filter::{
    Choice, ChoiceConfig, Filter, FilterConfig, FilterType, InputKind, TypeClass, Validation,
    ValidationCallback,
};
pub use operator::{Operator, OperatorCatalog, OperatorConfig, OperatorEntry};

use crate::error::{CoreError, Result};
use log::debug;
use std::sync::Arc;

/// Sentinel id meaning "nothing selected"
pub const NO_SELECTION: &str = "-1";

/// Validated catalog of the filters and operators one builder works with
#[derive(Debug, Clone)]
pub struct Registry {
    filters: Vec<Arc<Filter>>,
    operators: Vec<Arc<Operator>>,
    filter_optgroups: Vec<String>,
    operator_optgroups: Vec<String>,
}

impl Registry {
    /// Build against the process-wide operator catalog
    pub fn new(filters: Vec<FilterConfig>, operators: Option<Vec<OperatorEntry>>) -> Result<Self> {
        Self::with_catalog(filters, operators, OperatorCatalog::global(), false)
    }

    /// Build against an explicit catalog. `operators: None` takes the whole catalog.
    pub fn with_catalog(
        filters: Vec<FilterConfig>,
        operators: Option<Vec<OperatorEntry>>,
        catalog: &OperatorCatalog,
        sort_filters: bool,
    ) -> Result<Self> {
        let operators = match operators {
            Some(entries) => entries,
            None => catalog
                .operators()
                .iter()
                .map(|o| OperatorEntry::Key(o.op_type.clone()))
                .collect(),
        };
        let operators = Self::check_operators(operators, catalog)?;
        let filters = Self::check_filters(filters, sort_filters)?;

        for filter in &filters {
            if let Some(default_operator) = &filter.default_operator {
                if !operators.iter().any(|o| &o.op_type == default_operator) {
                    return Err(CoreError::ConfigError(format!(
                        "Undefined default operator \"{}\" for filter \"{}\"",
                        default_operator, filter.id
                    )));
                }
            }
        }

        let filter_optgroups = optgroups(&filters, |f| f.optgroup.as_deref());
        let operator_optgroups = optgroups(&operators, |o| o.optgroup.as_deref());

        debug!(
            "Registry ready: {} filters, {} operators",
            filters.len(),
            operators.len()
        );

        Ok(Self {
            filters,
            operators,
            filter_optgroups,
            operator_optgroups,
        })
    }

    /// Check every filter descriptor; the first problem aborts.
    pub fn check_filters(list: Vec<FilterConfig>, sort: bool) -> Result<Vec<Arc<Filter>>> {
        if list.is_empty() {
            return Err(CoreError::ConfigError("Missing filters list".to_string()));
        }

        let mut filters: Vec<Arc<Filter>> = Vec::with_capacity(list.len());
        for config in list {
            let filter = Filter::check(config)?;
            if filters.iter().any(|f| f.id == filter.id) {
                return Err(CoreError::ConfigError(format!(
                    "Filter \"{}\" already defined",
                    filter.id
                )));
            }
            filters.push(Arc::new(filter));
        }

        if sort {
            filters.sort_by(|a, b| a.label.cmp(&b.label));
        }

        Ok(group_by_optgroup(filters, |f| f.optgroup.as_deref()))
    }

    /// Resolve catalog keys (by clone) and check inline descriptors.
    pub fn check_operators(
        list: Vec<OperatorEntry>,
        catalog: &OperatorCatalog,
    ) -> Result<Vec<Arc<Operator>>> {
        let mut operators: Vec<Arc<Operator>> = Vec::with_capacity(list.len());
        for entry in list {
            let operator = match entry {
                OperatorEntry::Key(key) => catalog.get(&key).cloned().ok_or_else(|| {
                    CoreError::ConfigError(format!("Unknown operator \"{}\"", key))
                })?,
                OperatorEntry::Inline(config) => config.check()?,
            };
            if operators.iter().any(|o| o.op_type == operator.op_type) {
                return Err(CoreError::ConfigError(format!(
                    "Operator \"{}\" already defined",
                    operator.op_type
                )));
            }
            operators.push(Arc::new(operator));
        }

        Ok(group_by_optgroup(operators, |o| o.optgroup.as_deref()))
    }

    pub fn filters(&self) -> &[Arc<Filter>] {
        &self.filters
    }

    pub fn operators(&self) -> &[Arc<Operator>] {
        &self.operators
    }

    /// Filter optgroups in first-appearance order
    pub fn filter_optgroups(&self) -> &[String] {
        &self.filter_optgroups
    }

    pub fn operator_optgroups(&self) -> &[String] {
        &self.operator_optgroups
    }

    /// Operators usable with `filter`.
    ///
    /// An explicit allow-list selects exactly the listed operators, in the
    /// allow-list's order. Otherwise every operator applying to the filter's
    /// type, in catalog order.
    pub fn get_operators(&self, filter: &Filter) -> Vec<Arc<Operator>> {
        match &filter.operators {
            Some(allowed) => allowed
                .iter()
                .filter_map(|t| self.operators.iter().find(|o| &o.op_type == t))
                .cloned()
                .collect(),
            None => self
                .operators
                .iter()
                .filter(|o| o.applies_to(filter.filter_type))
                .cloned()
                .collect(),
        }
    }

    /// [`Registry::get_operators`] by filter id (strict lookup)
    pub fn get_operators_for(&self, filter_id: &str) -> Result<Vec<Arc<Operator>>> {
        Ok(self
            .get_filter_by_id(filter_id, true)?
            .map(|f| self.get_operators(&f))
            .unwrap_or_default())
    }

    /// `"-1"` is never an error. Unknown ids fail only when `strict`.
    pub fn get_filter_by_id(&self, id: &str, strict: bool) -> Result<Option<Arc<Filter>>> {
        if id == NO_SELECTION {
            return Ok(None);
        }
        match self.filters.iter().find(|f| f.id == id) {
            Some(filter) => Ok(Some(filter.clone())),
            None if strict => Err(CoreError::LookupError(format!("Undefined filter \"{}\"", id))),
            None => Ok(None),
        }
    }

    pub fn get_operator_by_type(
        &self,
        op_type: &str,
        strict: bool,
    ) -> Result<Option<Arc<Operator>>> {
        if op_type == NO_SELECTION {
            return Ok(None);
        }
        match self.operators.iter().find(|o| o.op_type == op_type) {
            Some(operator) => Ok(Some(operator.clone())),
            None if strict => Err(CoreError::LookupError(format!(
                "Undefined operator \"{}\"",
                op_type
            ))),
            None => Ok(None),
        }
    }

    /// Operator a rule gets when its filter is selected
    pub fn default_operator(&self, filter: &Filter) -> Option<Arc<Operator>> {
        let candidates = self.get_operators(filter);
        filter
            .default_operator
            .as_ref()
            .and_then(|t| candidates.iter().find(|o| &o.op_type == t).cloned())
            .or_else(|| candidates.into_iter().next())
    }
}

/// Stable grouping: items sharing an optgroup are pulled together at the
/// position of the group's first member.
fn group_by_optgroup<T>(items: Vec<T>, key: impl Fn(&T) -> Option<&str>) -> Vec<T> {
    if items.iter().all(|item| key(item).is_none()) {
        return items;
    }
    let mut buckets: Vec<(Option<String>, Vec<T>)> = Vec::new();
    for item in items {
        let group = key(&item).map(str::to_string);
        match buckets.iter_mut().find(|(k, _)| group.is_some() && *k == group) {
            Some((_, bucket)) => bucket.push(item),
            None => buckets.push((group, vec![item])),
        }
    }
    buckets.into_iter().flat_map(|(_, bucket)| bucket).collect()
}

fn optgroups<T>(items: &[Arc<T>], key: impl Fn(&T) -> Option<&str>) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for item in items {
        if let Some(group) = key(&**item) {
            if !groups.iter().any(|g| g == group) {
                groups.push(group.to_string());
            }
        }
    }
    groups
}
