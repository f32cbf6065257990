//! Node arena and the tree mutation protocol
//!
//! The model exclusively owns every node. Nodes refer to their parent by id
//! only. All operations run to completion, events included, before they
//! return.

use super::event::{NodeField, QueryEvent};
use super::node::{Condition, Group, Node, NodeContent, NodeId, Rule};
use crate::error::{CoreError, Result};
use crate::flags::Flags;
use crate::notifier::{Notifier, Signal, SubscriptionId};
use crate::registry::{Filter, Operator};
use crate::validation::ValidationError;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Child iteration order for [`Model::walk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Forward,
    Reverse,
}

/// Per-kind callbacks for a depth-first walk.
///
/// `enter_group` runs before a group's children (pre-order), `leave_group`
/// after all of them (post-order).
pub trait Visitor {
    /// Return false to skip the group's children.
    fn enter_group(&mut self, _node: &Node, _group: &Group) -> bool {
        true
    }

    fn leave_group(&mut self, _node: &Node, _group: &Group) {}

    fn visit_rule(&mut self, _node: &Node, _rule: &Rule) {}
}

/// Collects a subtree in drop order: deepest first, last child first.
struct DropOrder {
    from: NodeId,
    ids: Vec<NodeId>,
}

impl Visitor for DropOrder {
    fn leave_group(&mut self, node: &Node, _group: &Group) {
        if node.id() != self.from {
            self.ids.push(node.id());
        }
    }

    fn visit_rule(&mut self, node: &Node, _rule: &Rule) {
        if node.id() != self.from {
            self.ids.push(node.id());
        }
    }
}

/// One builder's tree: a single root group plus every node below it
#[derive(Debug)]
pub struct Model {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    notifier: Notifier<QueryEvent>,
}

impl Model {
    pub fn new(condition: Condition, root_flags: Flags) -> Self {
        let mut model = Self {
            nodes: HashMap::new(),
            root: NodeId::new(0),
            next_id: 0,
            notifier: Notifier::new(),
        };
        model.root = model.create_group(condition, root_flags, None);
        model
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// Live nodes, detached ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(CoreError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(CoreError::NodeNotFound(id))
    }

    pub fn group(&self, id: NodeId) -> Result<&Group> {
        self.node(id)?
            .as_group()
            .ok_or_else(|| CoreError::InvalidOperation(format!("{} is not a group", id)))
    }

    pub fn rule(&self, id: NodeId) -> Result<&Rule> {
        self.node(id)?
            .as_rule()
            .ok_or_else(|| CoreError::InvalidOperation(format!("{} is not a rule", id)))
    }

    fn group_mut(&mut self, id: NodeId) -> Result<&mut Group> {
        self.node_mut(id)?
            .as_group_mut()
            .ok_or_else(|| CoreError::InvalidOperation(format!("{} is not a group", id)))
    }

    fn rule_mut(&mut self, id: NodeId) -> Result<&mut Rule> {
        self.node_mut(id)?
            .as_rule_mut()
            .ok_or_else(|| CoreError::InvalidOperation(format!("{} is not a rule", id)))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    // ========== Subscriptions ==========

    pub fn on<F>(&mut self, name: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut Signal<QueryEvent>) + 'static,
    {
        self.notifier.on(name, handler)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.notifier.off(id)
    }

    pub fn notifier(&self) -> &Notifier<QueryEvent> {
        &self.notifier
    }

    pub(crate) fn emit(&mut self, event: QueryEvent) -> Signal<QueryEvent> {
        self.notifier.emit(event)
    }

    // ========== Node creation ==========

    /// New detached group
    pub fn create_group(
        &mut self,
        condition: Condition,
        flags: Flags,
        data: Option<Value>,
    ) -> NodeId {
        self.allocate(NodeContent::Group(Group::new(condition)), flags, data)
    }

    /// New detached rule with no filter, operator or value
    pub fn create_rule(&mut self, flags: Flags, data: Option<Value>) -> NodeId {
        self.allocate(NodeContent::Rule(Rule::new()), flags, data)
    }

    fn allocate(&mut self, content: NodeContent, flags: Flags, data: Option<Value>) -> NodeId {
        self.next_id += 1;
        let id = NodeId::new(self.next_id);
        self.nodes.insert(
            id,
            Node {
                id,
                parent: None,
                level: 1,
                flags,
                error: None,
                data,
                content,
            },
        );
        id
    }

    /// Fill a rule without publishing updates (for rules not yet attached)
    pub(crate) fn init_rule(
        &mut self,
        id: NodeId,
        filter: Option<Arc<Filter>>,
        operator: Option<Arc<Operator>>,
        value: Value,
    ) -> Result<()> {
        let rule = self.rule_mut(id)?;
        rule.filter = filter;
        rule.operator = operator;
        rule.value = value;
        Ok(())
    }

    /// Replace the root with a fresh empty group, dropping the old tree and
    /// every detached node.
    pub(crate) fn replace_root(
        &mut self,
        condition: Condition,
        flags: Flags,
        data: Option<Value>,
    ) -> NodeId {
        let old = self.root;
        self.drop_subtree(old);
        for id in self.detached() {
            self.drop_subtree(id);
        }
        self.root = self.create_group(condition, flags, data);
        debug!("Replaced root {} with {}", old, self.root);
        self.root
    }

    /// Tops of the subtrees that are alive but not attached under the root,
    /// oldest first
    pub fn detached(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.parent.is_none() && n.id != self.root)
            .map(|n| n.id)
            .collect();
        ids.sort_by_key(|id| id.as_u64());
        ids
    }

    // ========== Mutation protocol ==========

    /// Attach a detached `node` under `group` at `index` (default: end).
    pub fn insert_node(
        &mut self,
        group: NodeId,
        node: NodeId,
        index: Option<usize>,
    ) -> Result<usize> {
        let len = self.group(group)?.len();
        if self.node(node)?.parent.is_some() || self.is_root(node) {
            return Err(CoreError::InvalidOperation(format!(
                "{} is already attached",
                node
            )));
        }
        if self.is_ancestor_or_self(node, group) {
            return Err(CoreError::InvalidOperation(format!(
                "cannot insert {} into its own subtree",
                node
            )));
        }
        let index = index.unwrap_or(len);
        if index > len {
            return Err(CoreError::BoundsError { index, len });
        }

        let level = self.node(group)?.level + 1;
        self.group_mut(group)?.children.insert(index, node);
        self.node_mut(node)?.parent = Some(group);
        self.set_levels(node, level);

        debug!("Inserted {} into {} at {}", node, group, index);
        self.emit(QueryEvent::Add {
            parent: group,
            node,
            index,
        });
        Ok(index)
    }

    /// Detach `node` from `group`. Returns false if it is not a child of `group`.
    ///
    /// The node stays alive (and counted) until it is inserted again, dropped
    /// with [`Model::drop_node`], or swept when the root is replaced.
    pub fn remove_node(&mut self, group: NodeId, node: NodeId) -> Result<bool> {
        let Some(index) = self.group(group)?.position(node) else {
            return Ok(false);
        };
        self.group_mut(group)?.children.remove(index);
        self.node_mut(node)?.parent = None;
        self.set_levels(node, 1);
        debug!("Removed {} from {}", node, group);
        Ok(true)
    }

    /// Move `node` under `target` at `index`, atomically.
    ///
    /// Returns `Ok(false)` without effect for the root and for moves into the
    /// node's own subtree. `index` is checked against `target` as it will be
    /// once `node` is removed.
    pub fn move_node(&mut self, node: NodeId, target: NodeId, index: usize) -> Result<bool> {
        if self.is_root(node) {
            return Ok(false);
        }
        let parent = self
            .node(node)?
            .parent
            .ok_or_else(|| CoreError::InvalidOperation(format!("{} is detached", node)))?;
        let target_len = self.group(target)?.len();
        if self.is_ancestor_or_self(node, target) {
            return Ok(false);
        }
        let len = if parent == target {
            target_len - 1
        } else {
            target_len
        };
        if index > len {
            return Err(CoreError::BoundsError { index, len });
        }
        let from = self.group(parent)?.position(node).ok_or_else(|| {
            CoreError::InvalidOperation(format!("{} is not a child of {}", node, parent))
        })?;

        self.group_mut(parent)?.children.remove(from);
        self.group_mut(target)?.children.insert(index, node);
        let level = self.node(target)?.level + 1;
        self.node_mut(node)?.parent = Some(target);
        self.set_levels(node, level);

        debug!("Moved {} to {} at {}", node, target, index);
        self.emit(QueryEvent::Move {
            node,
            target,
            index,
        });
        Ok(true)
    }

    /// Destroy `node` and its subtree, children before parents.
    /// The root cannot be dropped.
    pub fn drop_node(&mut self, node: NodeId) -> Result<bool> {
        if self.is_root(node) {
            return Ok(false);
        }
        self.node(node)?;
        self.drop_subtree(node);
        Ok(true)
    }

    /// Drop every child of `group`, last to first. Returns how many were dropped.
    pub fn empty(&mut self, group: NodeId) -> Result<usize> {
        let children = self.group(group)?.children.clone();
        for child in children.iter().rev() {
            self.drop_subtree(*child);
        }
        Ok(children.len())
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let children = self
            .nodes
            .get(&id)
            .and_then(Node::as_group)
            .map(|g| g.children.clone())
            .unwrap_or_default();
        for child in children.into_iter().rev() {
            self.drop_subtree(child);
        }

        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        if let Some(parent) = node.parent {
            if let Some(group) = self.nodes.get_mut(&parent).and_then(Node::as_group_mut) {
                group.children.retain(|c| *c != id);
            }
        }
        debug!("Dropped {}", id);
        self.emit(QueryEvent::Drop {
            node: id,
            parent: node.parent,
            kind: node.kind(),
        });
    }

    fn set_levels(&mut self, node: NodeId, level: u32) {
        let mut stack = vec![(node, level)];
        while let Some((id, level)) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.level = level;
                if let Some(group) = node.as_group() {
                    stack.extend(group.children.iter().map(|c| (*c, level + 1)));
                }
            }
        }
    }

    /// Whether `ancestor` is `node` or lies on its parent chain
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    // ========== Traversal ==========

    /// Depth-first walk from `from`
    pub fn walk<V: Visitor>(&self, from: NodeId, order: Order, visitor: &mut V) -> Result<()> {
        let node = self.node(from)?;
        match &node.content {
            NodeContent::Rule(rule) => visitor.visit_rule(node, rule),
            NodeContent::Group(group) => {
                if visitor.enter_group(node, group) {
                    let mut children = group.children.clone();
                    if order == Order::Reverse {
                        children.reverse();
                    }
                    for child in children {
                        self.walk(child, order, visitor)?;
                    }
                }
                visitor.leave_group(node, group);
            }
        }
        Ok(())
    }

    /// Every node below `node`, in the order [`Model::drop_node`] destroys them
    pub fn descendants(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let mut order = DropOrder {
            from: node,
            ids: Vec::new(),
        };
        self.walk(node, Order::Reverse, &mut order)?;
        Ok(order.ids)
    }

    // ========== Field updates ==========

    pub fn set_condition(&mut self, group: NodeId, condition: Condition) -> Result<()> {
        let target = self.group_mut(group)?;
        if target.condition != condition {
            target.condition = condition;
            self.updated(group, NodeField::Condition);
        }
        Ok(())
    }

    pub fn set_flags(&mut self, node: NodeId, flags: Flags) -> Result<()> {
        let target = self.node_mut(node)?;
        if target.flags != flags {
            target.flags = flags;
            self.updated(node, NodeField::Flags);
        }
        Ok(())
    }

    pub fn set_data(&mut self, node: NodeId, data: Option<Value>) -> Result<()> {
        let target = self.node_mut(node)?;
        if target.data != data {
            target.data = data;
            self.updated(node, NodeField::Data);
        }
        Ok(())
    }

    pub fn set_error(&mut self, node: NodeId, error: Option<ValidationError>) -> Result<()> {
        let target = self.node_mut(node)?;
        if target.error != error {
            target.error = error;
            self.updated(node, NodeField::Error);
        }
        Ok(())
    }

    pub fn set_filter(&mut self, rule: NodeId, filter: Option<Arc<Filter>>) -> Result<()> {
        let target = self.rule_mut(rule)?;
        if target.filter.as_ref().map(|f| &f.id) != filter.as_ref().map(|f| &f.id) {
            target.filter = filter;
            self.updated(rule, NodeField::Filter);
        }
        Ok(())
    }

    pub fn set_operator(&mut self, rule: NodeId, operator: Option<Arc<Operator>>) -> Result<()> {
        let target = self.rule_mut(rule)?;
        if target.operator.as_ref().map(|o| &o.op_type) != operator.as_ref().map(|o| &o.op_type) {
            target.operator = operator;
            self.updated(rule, NodeField::Operator);
        }
        Ok(())
    }

    pub fn set_value(&mut self, rule: NodeId, value: Value) -> Result<()> {
        let target = self.rule_mut(rule)?;
        if target.value != value {
            target.value = value;
            self.updated(rule, NodeField::Value);
        }
        Ok(())
    }

    fn updated(&mut self, node: NodeId, field: NodeField) {
        debug!("Updated {:?} of {}", field, node);
        self.emit(QueryEvent::Update { node, field });
    }
}
