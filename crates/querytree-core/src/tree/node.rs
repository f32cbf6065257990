//! Tree nodes: a tagged variant over groups and rules

use crate::error::{CoreError, Result};
use crate::flags::Flags;
use crate::registry::{Filter, Operator};
use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Identifier of a node, unique within its model and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new(raw: u64) -> Self {
        NodeId(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// How a group combines its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Condition {
    #[default]
    And,
    Or,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::And => "AND",
            Condition::Or => "OR",
        }
    }
}

impl FromStr for Condition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AND" => Ok(Condition::And),
            "OR" => Ok(Condition::Or),
            other => Err(CoreError::ConfigError(format!(
                "Invalid condition \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Rule,
}

/// Internal node: children combined under a condition
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub(crate) condition: Condition,
    pub(crate) children: Vec<NodeId>,
}

impl Group {
    pub(crate) fn new(condition: Condition) -> Self {
        Self {
            condition,
            children: Vec::new(),
        }
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// Children in serialization order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn position(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|c| *c == child)
    }

    /// The condition only matters with two or more children
    pub fn condition_is_effective(&self) -> bool {
        self.children.len() >= 2
    }
}

/// Leaf node: filter + operator + value
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) filter: Option<Arc<Filter>>,
    pub(crate) operator: Option<Arc<Operator>>,
    pub(crate) value: Value,
}

impl Rule {
    pub(crate) fn new() -> Self {
        Self {
            filter: None,
            operator: None,
            value: Value::Null,
        }
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_deref()
    }

    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn filter_id(&self) -> Option<&str> {
        self.filter.as_ref().map(|f| f.id.as_str())
    }

    pub fn operator_type(&self) -> Option<&str> {
        self.operator.as_ref().map(|o| o.op_type.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum NodeContent {
    Group(Group),
    Rule(Rule),
}

/// A tree element. Parents are referenced by id and never own-back.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) level: u32,
    pub(crate) flags: Flags,
    pub(crate) error: Option<ValidationError>,
    pub(crate) data: Option<Value>,
    pub(crate) content: NodeContent,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Depth, root = 1
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn kind(&self) -> NodeKind {
        match self.content {
            NodeContent::Group(_) => NodeKind::Group,
            NodeContent::Rule(_) => NodeKind::Rule,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.content {
            NodeContent::Group(group) => Some(group),
            NodeContent::Rule(_) => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match &self.content {
            NodeContent::Rule(rule) => Some(rule),
            NodeContent::Group(_) => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut Group> {
        match &mut self.content {
            NodeContent::Group(group) => Some(group),
            NodeContent::Rule(_) => None,
        }
    }

    pub(crate) fn as_rule_mut(&mut self) -> Option<&mut Rule> {
        match &mut self.content {
            NodeContent::Rule(rule) => Some(rule),
            NodeContent::Group(_) => None,
        }
    }
}
