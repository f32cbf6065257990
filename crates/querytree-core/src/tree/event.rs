//! Events published by the model and the builder

use super::node::{NodeId, NodeKind};
use crate::notifier::Event;
use crate::validation::ValidationError;

/// Node attribute touched by an `Update` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeField {
    Condition,
    Flags,
    Data,
    Error,
    Filter,
    Operator,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    // Structural events from the model
    Add {
        parent: NodeId,
        node: NodeId,
        index: usize,
    },
    Drop {
        node: NodeId,
        parent: Option<NodeId>,
        kind: NodeKind,
    },
    Move {
        node: NodeId,
        target: NodeId,
        index: usize,
    },
    Update {
        node: NodeId,
        field: NodeField,
    },

    // Builder operations; the `Before*` events are cancellable
    BeforeAddGroup {
        parent: NodeId,
        level: u32,
    },
    AfterAddGroup {
        group: NodeId,
    },
    BeforeDeleteGroup {
        group: NodeId,
    },
    AfterDeleteGroup {
        group: NodeId,
    },
    BeforeAddRule {
        parent: NodeId,
    },
    AfterAddRule {
        rule: NodeId,
    },
    BeforeDeleteRule {
        rule: NodeId,
    },
    AfterDeleteRule {
        rule: NodeId,
    },
    BeforeReset,
    AfterReset,
    BeforeClear,
    AfterClear,
    BeforeSetRules,
    AfterSetRules,

    ValidationFailed {
        node: NodeId,
        error: ValidationError,
    },
    RulesChanged,
}

impl QueryEvent {
    /// Whether a subscriber may prevent the operation
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            QueryEvent::BeforeAddGroup { .. }
                | QueryEvent::BeforeDeleteGroup { .. }
                | QueryEvent::BeforeAddRule { .. }
                | QueryEvent::BeforeDeleteRule { .. }
                | QueryEvent::BeforeReset
                | QueryEvent::BeforeClear
                | QueryEvent::BeforeSetRules
        )
    }
}

impl Event for QueryEvent {
    fn name(&self) -> &'static str {
        match self {
            QueryEvent::Add { .. } => "add",
            QueryEvent::Drop { .. } => "drop",
            QueryEvent::Move { .. } => "move",
            QueryEvent::Update { .. } => "update",
            QueryEvent::BeforeAddGroup { .. } => "before_add_group",
            QueryEvent::AfterAddGroup { .. } => "after_add_group",
            QueryEvent::BeforeDeleteGroup { .. } => "before_delete_group",
            QueryEvent::AfterDeleteGroup { .. } => "after_delete_group",
            QueryEvent::BeforeAddRule { .. } => "before_add_rule",
            QueryEvent::AfterAddRule { .. } => "after_add_rule",
            QueryEvent::BeforeDeleteRule { .. } => "before_delete_rule",
            QueryEvent::AfterDeleteRule { .. } => "after_delete_rule",
            QueryEvent::BeforeReset => "before_reset",
            QueryEvent::AfterReset => "after_reset",
            QueryEvent::BeforeClear => "before_clear",
            QueryEvent::AfterClear => "after_clear",
            QueryEvent::BeforeSetRules => "before_set_rules",
            QueryEvent::AfterSetRules => "after_set_rules",
            QueryEvent::ValidationFailed { .. } => "validation_error",
            QueryEvent::RulesChanged => "rules_changed",
        }
    }
}
