//! Rules interchange format
//!
//! The plain nested representation produced by export and consumed by
//! import:
//!
//! ```json
//! {
//!   "condition": "AND",
//!   "rules": [
//!     { "id": "age", "field": "age", "type": "integer", "input": "number",
//!       "operator": "between", "value": [18, 30] },
//!     { "condition": "OR", "rules": [ ... ] }
//!   ],
//!   "valid": true
//! }
//! ```

use crate::flags::Flags;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a group's `rules` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleItem {
    Group(GroupData),
    Rule(RuleData),
}

impl RuleItem {
    pub fn as_group(&self) -> Option<&GroupData> {
        match self {
            RuleItem::Group(group) => Some(group),
            RuleItem::Rule(_) => None,
        }
    }

    pub fn as_rule(&self) -> Option<&RuleData> {
        match self {
            RuleItem::Rule(rule) => Some(rule),
            RuleItem::Group(_) => None,
        }
    }
}

impl From<GroupData> for RuleItem {
    fn from(group: GroupData) -> Self {
        RuleItem::Group(group)
    }
}

impl From<RuleData> for RuleItem {
    fn from(rule: RuleData) -> Self {
        RuleItem::Rule(rule)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupData {
    /// `AND` / `OR`; the configured default condition when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    pub rules: Vec<RuleItem>,

    /// Set on export only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Flags>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
}

impl GroupData {
    pub fn new(condition: &str) -> Self {
        Self {
            condition: Some(condition.to_string()),
            ..Default::default()
        }
    }

    pub fn with_rule(mut self, rule: impl Into<RuleItem>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleData {
    /// Filter id
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Operator type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    #[serde(default)]
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Flags>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
}

impl RuleData {
    pub fn new(filter_id: &str, operator: &str, value: Value) -> Self {
        Self {
            id: filter_id.to_string(),
            operator: Some(operator.to_string()),
            value,
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}
