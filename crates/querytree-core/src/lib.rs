//! querytree core - data model and engine behind visual query builders
//!
//! This crate provides:
//! - The rule/group tree and its mutation protocol
//! - Flag resolution
//! - The filter/operator registry and operator catalog
//! - Value validation
//! - Export and import of the plain rules data format

pub mod builder;
pub mod config;
pub mod error;
pub mod flags;
pub mod notifier;
pub mod registry;
pub mod rules;
pub mod tree;
pub mod validation;

// Re-export commonly used types
pub use builder::{FlagsExport, GetRulesOptions, QueryBuilder, SetRulesOptions, ValidateOptions};
pub use config::{AllowGroups, BuilderConfig};
pub use error::{CoreError, Result};
pub use flags::{FlagResolver, Flags};
pub use notifier::{Event, Notifier, Signal, SubscriptionId, ANY_EVENT};
pub use registry::{
    Filter, FilterConfig, FilterType, InputKind, Operator, OperatorCatalog, OperatorEntry, Registry,
    Validation,
};
pub use rules::{GroupData, RuleData, RuleItem};
pub use tree::{Condition, Model, Node, NodeId, NodeKind, QueryEvent};
pub use validation::{validate_value, ValidationError, ValidationResult};
