//! Rule/group tree
//!
//! Nodes live in an arena owned by [`Model`]; parents are referenced by id.

pub mod event;
pub mod model;
pub mod node;

pub use event::{NodeField, QueryEvent};
pub use model::{Model, Order, Visitor};
pub use node::{Condition, Group, Node, NodeContent, NodeId, NodeKind, Rule};
