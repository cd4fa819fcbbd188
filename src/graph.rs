//! Dependency graph over co-located packages.
//!
//! Nodes are keyed by declared package name. [`post_order`] returns a linear
//! ordering in which every node appears after all of its dependencies, so
//! propagation can walk multi-level chains in a single pass.
use std::collections::{BTreeMap, HashSet};

use crate::error::{ReleaseGraphError, Result};

/// A named node and the names of the nodes it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode<T = ()> {
    pub name: String,
    pub deps: Vec<String>,
    /// Payload carried alongside the node (e.g. a parsed manifest)
    pub value: T,
}

impl GraphNode<()> {
    pub fn new(name: impl Into<String>, deps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            deps,
            value: (),
        }
    }
}

/// Graph of nodes keyed by name. A `BTreeMap` keeps visitation order
/// deterministic across runs.
pub type DependencyGraph<T = ()> = BTreeMap<String, GraphNode<T>>;

/// Builds a graph from an iterator of nodes.
pub fn build_graph<T>(
    nodes: impl IntoIterator<Item = GraphNode<T>>,
) -> DependencyGraph<T> {
    nodes
        .into_iter()
        .map(|node| (node.name.clone(), node))
        .collect()
}

/// Computes an order in which dependencies come before dependents.
///
/// Errors with [`ReleaseGraphError::DependencyNotFound`] when an edge targets
/// a name missing from the graph and [`ReleaseGraphError::Cycle`] (carrying
/// the full cycle path) when the graph is not acyclic.
pub fn post_order<T>(graph: &DependencyGraph<T>) -> Result<Vec<String>> {
    let mut finished: HashSet<&str> = HashSet::new();
    let mut order: Vec<String> = Vec::with_capacity(graph.len());

    for name in graph.keys() {
        let mut path: Vec<&str> = vec![];
        visit(graph, name, &mut path, &mut finished, &mut order)?;
    }

    Ok(order)
}

fn visit<'a, T>(
    graph: &'a DependencyGraph<T>,
    name: &'a str,
    path: &mut Vec<&'a str>,
    finished: &mut HashSet<&'a str>,
    order: &mut Vec<String>,
) -> Result<()> {
    if finished.contains(name) {
        return Ok(());
    }

    if let Some(start) = path.iter().position(|n| *n == name) {
        let mut cycle: Vec<String> =
            path[start..].iter().map(|n| n.to_string()).collect();
        cycle.push(name.to_string());
        return Err(ReleaseGraphError::Cycle { path: cycle });
    }

    // callers only pass names that exist; edges are checked below
    let Some(node) = graph.get(name) else {
        return Ok(());
    };

    path.push(name);

    for dep in node.deps.iter() {
        if !graph.contains_key(dep) {
            return Err(ReleaseGraphError::DependencyNotFound {
                node: name.to_string(),
                dependency: dep.clone(),
            });
        }
        visit(graph, dep.as_str(), path, finished, order)?;
    }

    path.pop();
    finished.insert(name);
    order.push(name.to_string());

    Ok(())
}
