//! Common test utilities for core integration tests

#![allow(dead_code)]

use querytree_core::{
    BuilderConfig, FilterConfig, Model, NodeId, OperatorCatalog, QueryBuilder, QueryEvent,
    Validation, ANY_EVENT,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

/// Filters covering every type class
pub fn sample_filters() -> Vec<FilterConfig> {
    vec![
        FilterConfig::new("name", "string"),
        FilterConfig::new("age", "integer").with_validation(Validation {
            min: Some(json!(0)),
            max: Some(json!(120)),
            ..Default::default()
        }),
        FilterConfig::new("price", "double"),
        FilterConfig::new("born", "date"),
        FilterConfig::new("active", "boolean"),
        FilterConfig::new("category", "string")
            .with_input("select")
            .with_values(vec![json!("books"), json!("music")]),
    ]
}

/// Builder over the sample filters and an isolated built-in catalog
pub fn builder() -> QueryBuilder {
    builder_with(BuilderConfig::new(sample_filters()))
}

pub fn builder_with(config: BuilderConfig) -> QueryBuilder {
    QueryBuilder::with_catalog(config, &OperatorCatalog::builtin()).unwrap()
}

/// Records every event the builder publishes
pub fn record(qb: &mut QueryBuilder) -> Rc<RefCell<Vec<QueryEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    qb.on(ANY_EVENT, move |signal| sink.borrow_mut().push(signal.event().clone()));
    events
}

/// Ids of the nodes reported by `Drop` events, in emission order
pub fn dropped(events: &[QueryEvent]) -> Vec<NodeId> {
    events
        .iter()
        .filter_map(|e| match e {
            QueryEvent::Drop { node, .. } => Some(*node),
            _ => None,
        })
        .collect()
}

/// Every live node's level matches its parent chain
pub fn assert_levels(model: &Model) {
    for node in model.nodes() {
        match node.parent() {
            Some(parent) => {
                let parent = model.node(parent).unwrap();
                assert_eq!(node.level(), parent.level() + 1, "level of {}", node.id());
                assert!(parent.as_group().unwrap().children().contains(&node.id()));
            }
            None => assert_eq!(node.level(), 1, "level of {}", node.id()),
        }
    }
}
