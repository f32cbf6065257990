//! Command implementations

use crate::config::OutputFormat;
use anyhow::{bail, Context, Result};
use querytree_core::{
    BuilderConfig, FlagsExport, GetRulesOptions, GroupData, Model, NodeId, QueryBuilder,
    SetRulesOptions, ValidateOptions,
};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Import/export switches taken from settings and arguments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub allow_invalid: bool,
    pub skip_empty: bool,
}

/// One failing node, addressed by child indices from the root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    pub path: Vec<usize>,
    /// `[code, ...args]`
    pub error: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<NodeReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub filter_type: String,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optgroup: Option<String>,
    pub operators: Vec<String>,
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {} {}", what, path.display()))
}

/// Build a query builder from a YAML or JSON configuration file
pub fn load_builder(path: &Path) -> Result<QueryBuilder> {
    let content = read(path, "builder configuration")?;
    let config = if is_yaml(path) {
        BuilderConfig::from_yaml_str(&content)
    } else {
        BuilderConfig::from_json_str(&content)
    }
    .with_context(|| format!("Invalid builder configuration {}", path.display()))?;

    let builder = QueryBuilder::new(config)
        .with_context(|| format!("Invalid builder configuration {}", path.display()))?;
    info!(
        "Loaded {} filters from {}",
        builder.registry().filters().len(),
        path.display()
    );
    Ok(builder)
}

/// Read a rules document (YAML or JSON)
pub fn read_rules(path: &Path) -> Result<GroupData> {
    let content = read(path, "rules")?;
    let rules = if is_yaml(path) {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid rules {}", path.display()))?
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid rules {}", path.display()))?
    };
    Ok(rules)
}

fn import(builder: &mut QueryBuilder, rules: &GroupData, options: &RunOptions) -> Result<()> {
    let imported = builder.set_rules(
        rules,
        SetRulesOptions {
            allow_invalid: options.allow_invalid,
        },
    )?;
    if !imported {
        bail!("Import was cancelled");
    }
    debug!("Imported {} nodes", builder.model().node_count());
    Ok(())
}

/// Import `rules` and validate the resulting tree
pub fn validate(
    builder: &mut QueryBuilder,
    rules: &GroupData,
    options: &RunOptions,
) -> Result<ValidationReport> {
    import(builder, rules, options)?;
    let valid = builder.validate(ValidateOptions {
        skip_empty: options.skip_empty,
    })?;

    let errors = builder
        .errors()?
        .into_iter()
        .map(|(id, error)| -> Result<NodeReport> {
            Ok(NodeReport {
                path: node_path(builder.model(), id)?,
                error: error.to_tuple(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Validation finished: valid={}, errors={}", valid, errors.len());
    Ok(ValidationReport { valid, errors })
}

/// Import `rules` and export them back in canonical form.
///
/// `None` when the tree is invalid and invalid output is not allowed.
pub fn normalize(
    builder: &mut QueryBuilder,
    rules: &GroupData,
    options: &RunOptions,
    flags: FlagsExport,
) -> Result<Option<GroupData>> {
    import(builder, rules, options)?;
    let exported = builder.get_rules(GetRulesOptions {
        allow_invalid: options.allow_invalid,
        skip_empty: options.skip_empty,
        flags,
    })?;
    Ok(exported)
}

pub fn list_filters(builder: &QueryBuilder) -> Vec<FilterSummary> {
    let registry = builder.registry();
    registry
        .filters()
        .iter()
        .map(|filter| FilterSummary {
            id: filter.id.clone(),
            label: filter.label.clone(),
            filter_type: filter.filter_type.as_str().to_string(),
            input: filter.input.as_str().to_string(),
            optgroup: filter.optgroup.clone(),
            operators: registry
                .get_operators(filter)
                .iter()
                .map(|o| o.op_type.clone())
                .collect(),
        })
        .collect()
}

pub fn list_operators(builder: &QueryBuilder, filter_id: &str) -> Result<Vec<String>> {
    let operators = builder.registry().get_operators_for(filter_id)?;
    Ok(operators.iter().map(|o| o.op_type.clone()).collect())
}

/// Child indices leading from the root to `id`
pub fn node_path(model: &Model, id: NodeId) -> Result<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = id;
    while let Some(parent) = model.node(current)?.parent() {
        let index = model
            .group(parent)?
            .position(current)
            .with_context(|| format!("{} is missing from its parent", current))?;
        path.push(index);
        current = parent;
    }
    path.reverse();
    Ok(path)
}

pub fn render<T: Serialize>(value: &T, format: OutputFormat, pretty: bool) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(rendered)
}
