//! Query builder
//!
//! Controller-facing operations over one [`Model`]: adding and deleting
//! nodes behind cancellable `Before*` events, rule field updates with their
//! cascades, tree validation, and export/import of the rules data format.

use crate::config::BuilderConfig;
use crate::error::{CoreError, Result};
use crate::flags::{FlagResolver, Flags};
use crate::notifier::{Signal, SubscriptionId};
use crate::registry::{Filter, Operator, OperatorCatalog, Registry, NO_SELECTION};
use crate::rules::{GroupData, RuleData, RuleItem};
use crate::tree::{
    Condition, Group, Model, Node, NodeContent, NodeId, NodeKind, Order, QueryEvent, Rule, Visitor,
};
use crate::validation::{self, is_empty_value, ValidationError, ValidationResult};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Ignore rules without a filter or value, and groups left empty by that
    pub skip_empty: bool,
}

/// Which flags go into exported data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlagsExport {
    #[default]
    None,
    /// Only flags differing from the defaults
    Diff,
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetRulesOptions {
    pub allow_invalid: bool,
    pub skip_empty: bool,
    pub flags: FlagsExport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetRulesOptions {
    pub allow_invalid: bool,
}

/// Import plan, fully resolved before the tree is touched
#[derive(Debug)]
struct PlannedGroup {
    condition: Condition,
    flags: Flags,
    data: Option<Value>,
    children: Vec<Planned>,
}

#[derive(Debug)]
struct PlannedRule {
    filter: Option<Arc<Filter>>,
    operator: Option<Arc<Operator>>,
    value: Value,
    flags: Flags,
    data: Option<Value>,
}

#[derive(Debug)]
enum Planned {
    Group(PlannedGroup),
    Rule(PlannedRule),
}

struct ErrorCollector(Vec<(NodeId, ValidationError)>);

impl Visitor for ErrorCollector {
    fn enter_group(&mut self, node: &Node, _group: &Group) -> bool {
        if let Some(error) = node.error() {
            self.0.push((node.id(), error.clone()));
        }
        true
    }

    fn visit_rule(&mut self, node: &Node, _rule: &Rule) {
        if let Some(error) = node.error() {
            self.0.push((node.id(), error.clone()));
        }
    }
}

/// One query builder instance: configuration, registry and tree
#[derive(Debug)]
pub struct QueryBuilder {
    config: BuilderConfig,
    registry: Arc<Registry>,
    flags: FlagResolver,
    model: Model,
}

impl QueryBuilder {
    /// Create a builder using the process-wide operator catalog
    pub fn new(config: BuilderConfig) -> Result<Self> {
        Self::with_catalog(config, OperatorCatalog::global())
    }

    pub fn with_catalog(config: BuilderConfig, catalog: &OperatorCatalog) -> Result<Self> {
        config.check()?;
        let registry = Registry::with_catalog(
            config.filters.clone(),
            config.operators.clone(),
            catalog,
            config.sort_filters,
        )?;

        if let Some(default_filter) = &config.default_filter {
            if registry.get_filter_by_id(default_filter, false)?.is_none() {
                return Err(CoreError::ConfigError(format!(
                    "Undefined default filter \"{}\"",
                    default_filter
                )));
            }
        }

        let flags = FlagResolver::new(&config.default_rule_flags, &config.default_group_flags);
        let model = Model::new(config.default_condition, flags.parse_group_flags(false, None));

        info!(
            "Query builder ready with {} filters and {} operators",
            registry.filters().len(),
            registry.operators().len()
        );

        Ok(Self {
            config,
            registry: Arc::new(registry),
            flags,
            model,
        })
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn flag_resolver(&self) -> &FlagResolver {
        &self.flags
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Direct access to the mutation protocol, bypassing builder events
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn root(&self) -> NodeId {
        self.model.root()
    }

    pub fn on<F>(&mut self, name: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut Signal<QueryEvent>) + 'static,
    {
        self.model.on(name, handler)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.model.off(id)
    }

    /// Emit a cancellable event; false if a subscriber prevented it
    fn allowed(&mut self, event: QueryEvent) -> bool {
        let signal = self.model.emit(event);
        if signal.is_default_prevented() {
            debug!("{:?} prevented by a subscriber", signal.event());
            return false;
        }
        true
    }

    fn changed(&mut self) {
        self.model.emit(QueryEvent::RulesChanged);
    }

    // ========== Structure ==========

    /// Add a group at the end of `parent`.
    ///
    /// Returns `Ok(None)` when groups are not allowed at that depth, when
    /// `parent` has `no_add_group`, or when `BeforeAddGroup` is prevented.
    pub fn add_group(
        &mut self,
        parent: NodeId,
        add_rule: bool,
        data: Option<Value>,
        flags: Option<&Flags>,
    ) -> Result<Option<NodeId>> {
        self.model.group(parent)?;
        let parent_node = self.model.node(parent)?;
        let level = parent_node.level() + 1;
        if parent_node.flags().no_add_group()
            || !self.config.allow_groups.permits(parent_node.level())
        {
            debug!("Group not allowed under {}", parent);
            return Ok(None);
        }
        if !self.allowed(QueryEvent::BeforeAddGroup { parent, level }) {
            return Ok(None);
        }

        let flags = self.flags.parse_group_flags(false, flags);
        let group = self.model.create_group(self.config.default_condition, flags, data);
        self.model.insert_node(parent, group, None)?;
        self.model.set_error(parent, None)?;
        self.model.emit(QueryEvent::AfterAddGroup { group });
        self.changed();

        if add_rule {
            self.add_rule(group, None, None)?;
        }
        Ok(Some(group))
    }

    /// Add a rule at the end of `parent`, preselecting the configured filter.
    pub fn add_rule(
        &mut self,
        parent: NodeId,
        data: Option<Value>,
        flags: Option<&Flags>,
    ) -> Result<Option<NodeId>> {
        self.model.group(parent)?;
        if self.model.node(parent)?.flags().no_add_rule() {
            debug!("Rules not allowed under {}", parent);
            return Ok(None);
        }
        if !self.allowed(QueryEvent::BeforeAddRule { parent }) {
            return Ok(None);
        }

        let flags = self.flags.parse_rule_flags(false, flags);
        let rule = self.model.create_rule(flags, data);
        self.model.insert_node(parent, rule, None)?;
        self.model.set_error(parent, None)?;
        self.model.emit(QueryEvent::AfterAddRule { rule });
        self.changed();

        let initial = match &self.config.default_filter {
            Some(id) => Some(id.clone()),
            None if !self.config.display_empty_filter => {
                self.registry.filters().first().map(|f| f.id.clone())
            }
            None => None,
        };
        if let Some(filter_id) = initial {
            self.set_rule_filter(rule, Some(&filter_id))?;
        }
        Ok(Some(rule))
    }

    /// Returns false if the rule has `no_delete` or the deletion was prevented.
    pub fn delete_rule(&mut self, rule: NodeId) -> Result<bool> {
        self.model.rule(rule)?;
        if self.model.node(rule)?.flags().no_delete() {
            return Ok(false);
        }
        if !self.allowed(QueryEvent::BeforeDeleteRule { rule }) {
            return Ok(false);
        }
        self.model.drop_node(rule)?;
        self.model.emit(QueryEvent::AfterDeleteRule { rule });
        self.changed();
        Ok(true)
    }

    /// Delete a group and its whole subtree, or nothing at all.
    ///
    /// Refused for the root, when any node of the subtree has `no_delete`,
    /// and when any of the subtree's `Before*` events is prevented.
    pub fn delete_group(&mut self, group: NodeId) -> Result<bool> {
        self.model.group(group)?;
        if self.model.is_root(group) {
            return Ok(false);
        }
        let descendants = self.model.descendants(group)?;
        let mut protected = self.model.node(group)?.flags().no_delete();
        for id in &descendants {
            protected |= self.model.node(*id)?.flags().no_delete();
        }
        if protected {
            debug!("{} holds undeletable nodes", group);
            return Ok(false);
        }

        if !self.allowed(QueryEvent::BeforeDeleteGroup { group }) {
            return Ok(false);
        }
        let mut kinds = Vec::with_capacity(descendants.len());
        for id in &descendants {
            let kind = self.model.node(*id)?.kind();
            let event = match kind {
                NodeKind::Group => QueryEvent::BeforeDeleteGroup { group: *id },
                NodeKind::Rule => QueryEvent::BeforeDeleteRule { rule: *id },
            };
            if !self.allowed(event) {
                return Ok(false);
            }
            kinds.push((*id, kind));
        }

        self.model.drop_node(group)?;
        for (id, kind) in kinds {
            let event = match kind {
                NodeKind::Group => QueryEvent::AfterDeleteGroup { group: id },
                NodeKind::Rule => QueryEvent::AfterDeleteRule { rule: id },
            };
            self.model.emit(event);
        }
        self.model.emit(QueryEvent::AfterDeleteGroup { group });
        self.changed();
        Ok(true)
    }

    /// Move a node, see [`Model::move_node`]
    pub fn move_node(&mut self, node: NodeId, target: NodeId, index: usize) -> Result<bool> {
        let moved = self.model.move_node(node, target, index)?;
        if moved {
            self.model.set_error(target, None)?;
            self.changed();
        }
        Ok(moved)
    }

    /// Empty the root, restore its defaults and add one fresh rule.
    pub fn reset(&mut self) -> Result<bool> {
        if !self.allowed(QueryEvent::BeforeReset) {
            return Ok(false);
        }
        let root = self.model.root();
        self.model.empty(root)?;
        self.model.set_condition(root, self.config.default_condition)?;
        self.model.set_flags(root, self.flags.parse_group_flags(false, None))?;
        self.model.set_data(root, None)?;
        self.model.set_error(root, None)?;
        self.add_rule(root, None, None)?;
        self.model.emit(QueryEvent::AfterReset);
        self.changed();
        Ok(true)
    }

    /// Replace the root with a fresh empty group.
    pub fn clear(&mut self) -> Result<bool> {
        if !self.allowed(QueryEvent::BeforeClear) {
            return Ok(false);
        }
        self.model.replace_root(
            self.config.default_condition,
            self.flags.parse_group_flags(false, None),
            None,
        );
        self.model.emit(QueryEvent::AfterClear);
        self.changed();
        Ok(true)
    }

    // ========== Field updates ==========

    /// Select a filter (`None` or `"-1"` unsets it).
    ///
    /// A new filter resets the operator to the filter's default, the value to
    /// the filter's default value and clears the error. Data is cleared when
    /// a filter was selected before.
    pub fn set_rule_filter(&mut self, rule: NodeId, filter_id: Option<&str>) -> Result<()> {
        let previous = self.model.rule(rule)?.filter.clone();
        let filter = match filter_id {
            Some(id) => self.registry.get_filter_by_id(id, true)?,
            None => None,
        };
        if previous.as_ref().map(|f| &f.id) == filter.as_ref().map(|f| &f.id) {
            return Ok(());
        }

        let operator = filter.as_ref().and_then(|f| self.registry.default_operator(f));
        let value = initial_value(filter.as_deref(), operator.as_deref());
        self.model.set_filter(rule, filter)?;
        self.model.set_operator(rule, operator)?;
        self.model.set_value(rule, value)?;
        if previous.is_some() {
            self.model.set_data(rule, None)?;
        }
        self.model.set_error(rule, None)?;
        self.changed();
        Ok(())
    }

    /// Select an operator available for the rule's filter.
    ///
    /// The value is reset when arity or `multiple` differ from the previous
    /// operator. Clears the rule's error.
    pub fn set_rule_operator(&mut self, rule: NodeId, op_type: Option<&str>) -> Result<()> {
        let current = self.model.rule(rule)?;
        let filter = current.filter.clone();
        let previous = current.operator.clone();
        let operator = match op_type {
            Some(t) => self.registry.get_operator_by_type(t, true)?,
            None => None,
        };

        if let Some(operator) = &operator {
            let filter = filter.as_ref().ok_or_else(|| {
                CoreError::InvalidOperation(format!("{} has no filter", rule))
            })?;
            let available = self.registry.get_operators(filter);
            if !available.iter().any(|o| o.op_type == operator.op_type) {
                return Err(CoreError::InvalidOperation(format!(
                    "Operator \"{}\" is not available for filter \"{}\"",
                    operator.op_type, filter.id
                )));
            }
        }
        if previous.as_ref().map(|o| &o.op_type) == operator.as_ref().map(|o| &o.op_type) {
            return Ok(());
        }

        let reshaped = match (&previous, &operator) {
            (Some(a), Some(b)) => a.nb_inputs != b.nb_inputs || a.multiple != b.multiple,
            _ => true,
        };
        let value = initial_value(filter.as_deref(), operator.as_deref());
        self.model.set_operator(rule, operator)?;
        if reshaped {
            self.model.set_value(rule, value)?;
        }
        self.model.set_error(rule, None)?;
        self.changed();
        Ok(())
    }

    /// Store a new value and clear the rule's error
    pub fn set_rule_value(&mut self, rule: NodeId, value: Value) -> Result<()> {
        if self.model.rule(rule)?.value() == &value {
            return Ok(());
        }
        self.model.set_value(rule, value)?;
        self.model.set_error(rule, None)?;
        self.changed();
        Ok(())
    }

    pub fn set_group_condition(&mut self, group: NodeId, condition: Condition) -> Result<()> {
        if !self.config.conditions.contains(&condition) {
            return Err(CoreError::InvalidOperation(format!(
                "Condition \"{}\" is not allowed",
                condition
            )));
        }
        if self.model.group(group)?.condition() == condition {
            return Ok(());
        }
        self.model.set_condition(group, condition)?;
        self.changed();
        Ok(())
    }

    /// Merge `flags` into the node's flags
    pub fn set_node_flags(&mut self, node: NodeId, flags: &Flags) -> Result<()> {
        let mut merged = self.model.node(node)?.flags().clone();
        merged.merge(flags);
        self.model.set_flags(node, merged)
    }

    pub fn set_data(&mut self, node: NodeId, data: Option<Value>) -> Result<()> {
        self.model.set_data(node, data)
    }

    /// Full flag set with `all`, otherwise only what differs from the defaults
    pub fn get_flags(&self, node: NodeId, all: bool) -> Result<Flags> {
        let node = self.model.node(node)?;
        if all {
            return Ok(node.flags().clone());
        }
        Ok(node.flags().diff(self.default_flags(node.kind())))
    }

    fn default_flags(&self, kind: NodeKind) -> &Flags {
        match kind {
            NodeKind::Group => self.flags.group_defaults(),
            NodeKind::Rule => self.flags.rule_defaults(),
        }
    }

    // ========== Validation ==========

    /// Check `value` as a candidate value of `rule` without changing anything
    pub fn validate_value(&self, rule: NodeId, value: &Value) -> Result<ValidationResult> {
        Ok(validation::validate_value(self.model.rule(rule)?, value))
    }

    /// Validate the whole tree, storing each node's error and emitting
    /// `ValidationFailed` per failure. Returns overall validity.
    pub fn validate(&mut self, options: ValidateOptions) -> Result<bool> {
        let root = self.model.root();
        let valid = self.validate_group(root, options.skip_empty)? != Some(false);
        debug!("Tree validation: {}", if valid { "valid" } else { "invalid" });
        Ok(valid)
    }

    /// `None` when the group was skipped as empty
    fn validate_group(&mut self, group: NodeId, skip_empty: bool) -> Result<Option<bool>> {
        let children = self.model.group(group)?.children().to_vec();
        let mut done = 0usize;
        let mut errors = 0usize;

        for child in children {
            let outcome = match self.model.node(child)?.kind() {
                NodeKind::Group => self.validate_group(child, skip_empty)?,
                NodeKind::Rule => self.validate_rule(child, skip_empty)?,
            };
            match outcome {
                Some(true) => done += 1,
                Some(false) => errors += 1,
                None => {}
            }
        }

        let is_root = self.model.is_root(group);
        if errors > 0 {
            self.model.set_error(group, None)?;
            Ok(Some(false))
        } else if done == 0 && !is_root && skip_empty {
            self.model.set_error(group, None)?;
            Ok(None)
        } else if done == 0 && (!is_root || !self.config.allow_empty) {
            self.fail(group, ValidationError::new("empty_group"))?;
            Ok(Some(false))
        } else {
            self.model.set_error(group, None)?;
            Ok(Some(true))
        }
    }

    fn validate_rule(&mut self, id: NodeId, skip_empty: bool) -> Result<Option<bool>> {
        let rule = self.model.rule(id)?;
        let verdict = match (rule.filter(), rule.operator()) {
            (None, _) if skip_empty => None,
            (None, _) => Some(Err(ValidationError::new("no_filter"))),
            (Some(_), None) => Some(Err(ValidationError::new("no_operator"))),
            (Some(_), Some(operator)) if operator.nb_inputs == 0 => Some(Ok(())),
            (Some(_), Some(_)) if skip_empty && is_empty_value(rule.value()) => None,
            (Some(_), Some(_)) => Some(validation::validate_value(rule, rule.value())),
        };

        match verdict {
            None => {
                self.model.set_error(id, None)?;
                Ok(None)
            }
            Some(Ok(())) => {
                self.model.set_error(id, None)?;
                Ok(Some(true))
            }
            Some(Err(error)) => {
                self.fail(id, error)?;
                Ok(Some(false))
            }
        }
    }

    fn fail(&mut self, node: NodeId, error: ValidationError) -> Result<()> {
        debug!("{} failed validation: {}", node, error);
        self.model.set_error(node, Some(error.clone()))?;
        self.model.emit(QueryEvent::ValidationFailed { node, error });
        Ok(())
    }

    /// Stored errors from the last validation, in tree order
    pub fn errors(&self) -> Result<Vec<(NodeId, ValidationError)>> {
        let mut collector = ErrorCollector(Vec::new());
        self.model.walk(self.model.root(), Order::Forward, &mut collector)?;
        Ok(collector.0)
    }

    // ========== Export / import ==========

    /// Validate then export the tree.
    ///
    /// Returns `Ok(None)` for an invalid tree unless invalid output is
    /// allowed by the options or the configuration.
    pub fn get_rules(&mut self, options: GetRulesOptions) -> Result<Option<GroupData>> {
        let allow_invalid = options.allow_invalid || self.config.allow_invalid;
        let valid = self.validate(ValidateOptions {
            skip_empty: options.skip_empty,
        })?;
        if !valid && !allow_invalid {
            debug!("Export refused: tree is invalid");
            return Ok(None);
        }

        let mut data = self.export_group(self.model.root(), &options)?;
        data.valid = Some(valid);
        Ok(Some(data))
    }

    fn export_group(&self, id: NodeId, options: &GetRulesOptions) -> Result<GroupData> {
        let node = self.model.node(id)?;
        let group = self.model.group(id)?;
        let mut data = GroupData {
            condition: Some(group.condition().as_str().to_string()),
            flags: self.export_flags(node, options.flags),
            data: node.data().cloned(),
            ..Default::default()
        };

        for child in group.children() {
            let child_node = self.model.node(*child)?;
            match child_node.content() {
                NodeContent::Group(_) => {
                    let sub = self.export_group(*child, options)?;
                    if options.skip_empty && sub.rules.is_empty() {
                        continue;
                    }
                    data.rules.push(RuleItem::Group(sub));
                }
                NodeContent::Rule(rule) => {
                    if options.skip_empty && is_skippable(rule) {
                        continue;
                    }
                    data.rules
                        .push(RuleItem::Rule(self.export_rule(child_node, rule, options.flags)));
                }
            }
        }
        Ok(data)
    }

    fn export_rule(&self, node: &Node, rule: &Rule, flags: FlagsExport) -> RuleData {
        let filter = rule.filter();
        RuleData {
            id: filter.map_or_else(|| NO_SELECTION.to_string(), |f| f.id.clone()),
            field: filter.map(|f| f.field.clone()),
            filter_type: filter.map(|f| f.filter_type.as_str().to_string()),
            input: filter.map(|f| f.input.as_str().to_string()),
            operator: rule.operator_type().map(str::to_string),
            value: rule.value().clone(),
            data: node.data().cloned(),
            flags: self.export_flags(node, flags),
            readonly: false,
        }
    }

    fn export_flags(&self, node: &Node, mode: FlagsExport) -> Option<Flags> {
        match mode {
            FlagsExport::None => None,
            FlagsExport::All => Some(node.flags().clone()),
            FlagsExport::Diff => {
                let diff = node.flags().diff(self.default_flags(node.kind()));
                (!diff.is_empty()).then_some(diff)
            }
        }
    }

    /// Rebuild the tree from exported data.
    ///
    /// Every reference is resolved first; on any error the current tree is
    /// left untouched. Returns `Ok(false)` if `BeforeSetRules` was prevented.
    pub fn set_rules(&mut self, data: &GroupData, options: SetRulesOptions) -> Result<bool> {
        let allow_invalid = options.allow_invalid || self.config.allow_invalid;
        if data.rules.is_empty() && !self.config.allow_empty && !allow_invalid {
            return Err(CoreError::ConfigError("Missing group rules".to_string()));
        }
        let plan = self.plan_group(data, 1, allow_invalid)?;

        if !self.allowed(QueryEvent::BeforeSetRules) {
            return Ok(false);
        }
        let root = self.model.replace_root(plan.condition, plan.flags, plan.data);
        self.build_children(root, plan.children)?;
        self.model.emit(QueryEvent::AfterSetRules);
        self.changed();
        info!("Rules imported: {} nodes", self.model.node_count());
        Ok(true)
    }

    fn plan_group(
        &self,
        data: &GroupData,
        level: u32,
        allow_invalid: bool,
    ) -> Result<PlannedGroup> {
        let condition = match data.condition.as_deref() {
            None => self.config.default_condition,
            Some(name) => match name.parse::<Condition>() {
                Ok(condition) if self.config.conditions.contains(&condition) => condition,
                _ if allow_invalid => {
                    warn!("Invalid condition \"{}\", using the default", name);
                    self.config.default_condition
                }
                _ => {
                    return Err(CoreError::ConfigError(format!(
                        "Invalid condition \"{}\"",
                        name
                    )))
                }
            },
        };

        let mut children = Vec::with_capacity(data.rules.len());
        for item in &data.rules {
            match item {
                RuleItem::Group(group) => {
                    if !self.config.allow_groups.permits(level) {
                        return Err(CoreError::ConfigError(format!(
                            "Groups are not allowed below level {}",
                            level
                        )));
                    }
                    let planned = self.plan_group(group, level + 1, allow_invalid)?;
                    children.push(Planned::Group(planned));
                }
                RuleItem::Rule(rule) => {
                    children.push(Planned::Rule(self.plan_rule(rule, allow_invalid)?));
                }
            }
        }

        Ok(PlannedGroup {
            condition,
            flags: self.flags.parse_group_flags(data.readonly, data.flags.as_ref()),
            data: data.data.clone(),
            children,
        })
    }

    fn plan_rule(&self, data: &RuleData, allow_invalid: bool) -> Result<PlannedRule> {
        let filter = self.registry.get_filter_by_id(&data.id, false)?;
        if filter.is_none() {
            if !allow_invalid {
                return Err(CoreError::ConfigError(format!("Undefined filter \"{}\"", data.id)));
            }
            if data.id != NO_SELECTION {
                warn!("Undefined filter \"{}\" imported as empty", data.id);
            }
        }

        let operator = match (&filter, data.operator.as_deref()) {
            (Some(filter), Some(op_type)) if op_type != NO_SELECTION => {
                let operator = self
                    .registry
                    .get_operators(filter)
                    .into_iter()
                    .find(|o| o.op_type == op_type);
                if operator.is_none() {
                    if !allow_invalid {
                        return Err(CoreError::ConfigError(format!(
                            "Undefined operator \"{}\" for filter \"{}\"",
                            op_type, filter.id
                        )));
                    }
                    warn!("Undefined operator \"{}\" imported as empty", op_type);
                }
                operator
            }
            (Some(filter), None) => self.registry.default_operator(filter),
            _ => None,
        };

        let value = match &operator {
            Some(operator) if operator.nb_inputs == 0 => Value::Null,
            _ => data.value.clone(),
        };

        Ok(PlannedRule {
            filter,
            operator,
            value,
            flags: self.flags.parse_rule_flags(data.readonly, data.flags.as_ref()),
            data: data.data.clone(),
        })
    }

    fn build_children(&mut self, parent: NodeId, children: Vec<Planned>) -> Result<()> {
        for child in children {
            match child {
                Planned::Group(group) => {
                    let id = self.model.create_group(group.condition, group.flags, group.data);
                    self.model.insert_node(parent, id, None)?;
                    self.build_children(id, group.children)?;
                }
                Planned::Rule(rule) => {
                    let id = self.model.create_rule(rule.flags, rule.data);
                    self.model.init_rule(id, rule.filter, rule.operator, rule.value)?;
                    self.model.insert_node(parent, id, None)?;
                }
            }
        }
        Ok(())
    }
}

/// Value a rule starts with for this filter/operator pair
fn initial_value(filter: Option<&Filter>, operator: Option<&Operator>) -> Value {
    let Some(operator) = operator else {
        return Value::Null;
    };
    let slot = filter
        .and_then(|f| f.default_value.clone())
        .unwrap_or(Value::Null);
    match operator.nb_inputs {
        0 => Value::Null,
        1 => slot,
        n => Value::Array(vec![slot; n]),
    }
}

fn is_skippable(rule: &Rule) -> bool {
    match (rule.filter(), rule.operator()) {
        (None, _) => true,
        (Some(_), Some(operator)) if operator.nb_inputs == 0 => false,
        _ => is_empty_value(rule.value()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FilterConfig;
    use serde_json::json;

    fn builder() -> QueryBuilder {
        let config = BuilderConfig::new(vec![
            FilterConfig::new("name", "string"),
            FilterConfig::new("age", "integer").with_default_value(json!(18)),
        ]);
        QueryBuilder::with_catalog(config, &OperatorCatalog::builtin()).unwrap()
    }

    #[test]
    fn test_initial_value_shapes() {
        let between = Operator::new("between", 2, false, &["number"]);
        let equal = Operator::new("equal", 1, false, &["number"]);
        let is_null = Operator::new("is_null", 0, false, &["number"]);
        let config = FilterConfig::new("age", "integer").with_default_value(json!(5));
        let filter = Filter::check(config).unwrap();

        assert_eq!(initial_value(Some(&filter), Some(&between)), json!([5, 5]));
        assert_eq!(initial_value(Some(&filter), Some(&equal)), json!(5));
        assert_eq!(initial_value(Some(&filter), Some(&is_null)), Value::Null);
        assert_eq!(initial_value(Some(&filter), None), Value::Null);
    }

    #[test]
    fn test_set_filter_cascades() {
        let mut qb = builder();
        let root = qb.root();
        let rule = qb.add_rule(root, Some(json!({"k": 1})), None).unwrap().unwrap();

        qb.set_rule_filter(rule, Some("age")).unwrap();
        let current = qb.model().rule(rule).unwrap();
        assert_eq!(current.operator_type(), Some("equal"));
        assert_eq!(current.value(), &json!(18));
        assert!(qb.model().node(rule).unwrap().data().is_some());

        qb.set_rule_filter(rule, Some("name")).unwrap();
        assert!(qb.model().node(rule).unwrap().data().is_none());
        assert_eq!(qb.model().rule(rule).unwrap().value(), &Value::Null);
    }

    #[test]
    fn test_set_operator_reshapes_value() {
        let mut qb = builder();
        let root = qb.root();
        let rule = qb.add_rule(root, None, None).unwrap().unwrap();
        qb.set_rule_filter(rule, Some("age")).unwrap();
        qb.set_rule_value(rule, json!(40)).unwrap();

        qb.set_rule_operator(rule, Some("not_equal")).unwrap();
        assert_eq!(qb.model().rule(rule).unwrap().value(), &json!(40));

        qb.set_rule_operator(rule, Some("between")).unwrap();
        assert_eq!(qb.model().rule(rule).unwrap().value(), &json!([18, 18]));

        assert!(matches!(
            qb.set_rule_operator(rule, Some("begins_with")),
            Err(CoreError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_get_flags_diff() {
        let mut qb = builder();
        let root = qb.root();
        let rule = qb
            .add_rule(root, None, Some(&Flags::from([("no_delete", true)])))
            .unwrap()
            .unwrap();
        let diff = qb.get_flags(rule, false).unwrap();
        assert_eq!(diff, Flags::from([("no_delete", true)]));
        assert_eq!(qb.get_flags(rule, true).unwrap().len(), Flags::rule_defaults().len());
    }

    #[test]
    fn test_empty_root_validation() {
        let mut qb = builder();
        assert!(!qb.validate(ValidateOptions::default()).unwrap());
        let errors = qb.errors().unwrap();
        assert_eq!(errors, vec![(qb.root(), ValidationError::new("empty_group"))]);
    }
}
