//! Node flags and their resolution
//!
//! Effective flags are computed once, when a node is created or imported:
//! registered defaults, then the readonly-derived overrides, then the
//! explicit per-node overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FILTER_READONLY: &str = "filter_readonly";
pub const OPERATOR_READONLY: &str = "operator_readonly";
pub const VALUE_READONLY: &str = "value_readonly";
pub const CONDITION_READONLY: &str = "condition_readonly";
pub const NO_ADD_RULE: &str = "no_add_rule";
pub const NO_ADD_GROUP: &str = "no_add_group";
pub const NO_DELETE: &str = "no_delete";

const RULE_FLAGS: [&str; 4] = [FILTER_READONLY, OPERATOR_READONLY, VALUE_READONLY, NO_DELETE];
const GROUP_FLAGS: [&str; 4] = [CONDITION_READONLY, NO_ADD_RULE, NO_ADD_GROUP, NO_DELETE];

/// Named booleans attached to a node. Missing names read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags(BTreeMap<String, bool>);

impl Flags {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Baseline flag set of a rule, every flag off
    pub fn rule_defaults() -> Self {
        RULE_FLAGS.iter().fold(Self::new(), |flags, name| flags.with(name, false))
    }

    /// Baseline flag set of a group, every flag off
    pub fn group_defaults() -> Self {
        GROUP_FLAGS.iter().fold(Self::new(), |flags, name| flags.with(name, false))
    }

    pub fn with(mut self, name: &str, value: bool) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: bool) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> bool {
        self.0.get(name).copied().unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Overwrite with every entry of `other`
    pub fn merge(&mut self, other: &Flags) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), *value);
        }
    }

    /// Entries whose value differs from `baseline`
    pub fn diff(&self, baseline: &Flags) -> Flags {
        Flags(
            self.0
                .iter()
                .filter(|(name, value)| baseline.get(name) != **value)
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn no_delete(&self) -> bool {
        self.get(NO_DELETE)
    }

    pub fn no_add_rule(&self) -> bool {
        self.get(NO_ADD_RULE)
    }

    pub fn no_add_group(&self) -> bool {
        self.get(NO_ADD_GROUP)
    }
}

impl<const N: usize> From<[(&str, bool); N]> for Flags {
    fn from(entries: [(&str, bool); N]) -> Self {
        entries
            .into_iter()
            .fold(Flags::new(), |flags, (name, value)| flags.with(name, value))
    }
}

/// Computes effective flag sets by precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagResolver {
    rule_defaults: Flags,
    group_defaults: Flags,
}

impl FlagResolver {
    /// `rule_defaults` / `group_defaults` are layered over the built-in baselines.
    pub fn new(rule_defaults: &Flags, group_defaults: &Flags) -> Self {
        let mut rules = Flags::rule_defaults();
        rules.merge(rule_defaults);
        let mut groups = Flags::group_defaults();
        groups.merge(group_defaults);
        Self {
            rule_defaults: rules,
            group_defaults: groups,
        }
    }

    pub fn rule_defaults(&self) -> &Flags {
        &self.rule_defaults
    }

    pub fn group_defaults(&self) -> &Flags {
        &self.group_defaults
    }

    pub fn parse_rule_flags(&self, readonly: bool, overrides: Option<&Flags>) -> Flags {
        Self::resolve(&self.rule_defaults, readonly, &RULE_FLAGS, overrides)
    }

    pub fn parse_group_flags(&self, readonly: bool, overrides: Option<&Flags>) -> Flags {
        Self::resolve(&self.group_defaults, readonly, &GROUP_FLAGS, overrides)
    }

    fn resolve(
        defaults: &Flags,
        readonly: bool,
        forced: &[&str],
        overrides: Option<&Flags>,
    ) -> Flags {
        let mut flags = defaults.clone();
        if readonly {
            for name in forced {
                flags.set(name, true);
            }
        }
        if let Some(overrides) = overrides {
            flags.merge(overrides);
        }
        flags
    }
}

impl Default for FlagResolver {
    fn default() -> Self {
        Self::new(&Flags::new(), &Flags::new())
    }
}
