//! Error types for querytree core

use crate::tree::NodeId;
use thiserror::Error;

/// Core error type
///
/// Value validation failures are not errors in this sense; they are returned
/// as [`crate::validation::ValidationError`] data. Structural refusals
/// (`no_delete`, root moves, cancelled operations) are plain `false`/`None`
/// returns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Malformed filter/operator configuration or unresolved reference on strict import
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Unknown filter id or operator type in a strict lookup
    #[error("Lookup error: {0}")]
    LookupError(String),

    /// Insert position outside `[0, len]`
    #[error("Index {index} out of bounds for group with {len} children")]
    BoundsError { index: usize, len: usize },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
