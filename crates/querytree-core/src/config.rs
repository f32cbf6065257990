//! Builder configuration

use crate::error::{CoreError, Result};
use crate::flags::Flags;
use crate::registry::{FilterConfig, OperatorEntry};
use crate::tree::Condition;
use serde::{Deserialize, Serialize};

/// Whether groups may be added, optionally up to a nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowGroups {
    Enabled(bool),
    /// Number of group levels allowed below the root
    MaxDepth(u32),
}

impl AllowGroups {
    /// Whether a group may be added under a parent at `parent_level`
    pub fn permits(&self, parent_level: u32) -> bool {
        match self {
            AllowGroups::Enabled(enabled) => *enabled,
            AllowGroups::MaxDepth(depth) => parent_level <= *depth,
        }
    }
}

impl Default for AllowGroups {
    fn default() -> Self {
        AllowGroups::Enabled(true)
    }
}

/// Configuration of one query builder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Filter descriptors, required and non-empty
    pub filters: Vec<FilterConfig>,

    /// Operator catalog keys or inline descriptors; the whole catalog when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<OperatorEntry>>,

    /// Conditions a group may use
    pub conditions: Vec<Condition>,

    pub default_condition: Condition,

    /// Accept an empty root group as valid
    pub allow_empty: bool,

    pub allow_groups: AllowGroups,

    /// Export invalid trees and import unresolved references
    pub allow_invalid: bool,

    /// Filter preselected on new rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_filter: Option<String>,

    /// Leave new rules without a filter (otherwise the first filter is selected)
    pub display_empty_filter: bool,

    /// Sort filters by label
    pub sort_filters: bool,

    pub default_rule_flags: Flags,

    pub default_group_flags: Flags,
}

impl BuilderConfig {
    pub fn new(filters: Vec<FilterConfig>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CoreError::ConfigError(format!("Invalid YAML configuration: {}", e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| CoreError::ConfigError(format!("Invalid JSON configuration: {}", e)))
    }

    pub fn with_operators(mut self, operators: Vec<OperatorEntry>) -> Self {
        self.operators = Some(operators);
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_default_condition(mut self, condition: Condition) -> Self {
        self.default_condition = condition;
        self
    }

    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    pub fn with_allow_groups(mut self, allow_groups: AllowGroups) -> Self {
        self.allow_groups = allow_groups;
        self
    }

    pub fn allow_invalid(mut self, allow: bool) -> Self {
        self.allow_invalid = allow;
        self
    }

    pub fn with_default_filter(mut self, filter_id: &str) -> Self {
        self.default_filter = Some(filter_id.to_string());
        self
    }

    pub fn display_empty_filter(mut self, display: bool) -> Self {
        self.display_empty_filter = display;
        self
    }

    pub fn sort_filters(mut self, sort: bool) -> Self {
        self.sort_filters = sort;
        self
    }

    pub fn with_default_rule_flags(mut self, flags: Flags) -> Self {
        self.default_rule_flags = flags;
        self
    }

    pub fn with_default_group_flags(mut self, flags: Flags) -> Self {
        self.default_group_flags = flags;
        self
    }

    /// Checks that do not need the registry
    pub(crate) fn check(&self) -> Result<()> {
        if self.conditions.is_empty() {
            return Err(CoreError::ConfigError("Missing conditions list".to_string()));
        }
        if !self.conditions.contains(&self.default_condition) {
            return Err(CoreError::ConfigError(format!(
                "Default condition \"{}\" is not an allowed condition",
                self.default_condition
            )));
        }
        Ok(())
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            operators: None,
            conditions: vec![Condition::And, Condition::Or],
            default_condition: Condition::And,
            allow_empty: false,
            allow_groups: AllowGroups::default(),
            allow_invalid: false,
            default_filter: None,
            display_empty_filter: true,
            sort_filters: false,
            default_rule_flags: Flags::new(),
            default_group_flags: Flags::new(),
        }
    }
}
