//! # Dependency Ordering
//!
//! Migration units are ordered so every referenced table is created before
//! the tables pointing at it. Kahn's algorithm runs over the input order
//! with a FIFO queue, so independent tables keep their relative order.
//! A cycle is an error; nothing is silently appended.

use crate::migration::MigrationUnit;
use laragen_core::{EngineError, EngineResult};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Referrer -> referenced table edges between units of one batch.
///
/// Only non-ignored descriptors with live foreign key metadata contribute.
/// Self-references and targets outside the batch are dropped; duplicate
/// edges are collapsed.
pub fn dependency_edges(units: &[MigrationUnit]) -> Vec<(String, String)> {
    let tables: HashSet<&str> = units.iter().map(|u| u.table.as_str()).collect();
    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for unit in units {
        for target in unit.dependencies() {
            if !tables.contains(target.as_str()) {
                continue;
            }
            let edge = (unit.table.clone(), target);
            if seen.insert(edge.clone()) {
                edges.push(edge);
            }
        }
    }
    edges
}

/// Order units so referenced tables come first
pub fn sort_units(units: Vec<MigrationUnit>) -> EngineResult<Vec<MigrationUnit>> {
    let n = units.len();
    if n <= 1 {
        return Ok(units);
    }

    let index: HashMap<&str, usize> = units
        .iter()
        .enumerate()
        .map(|(i, u)| (u.table.as_str(), i))
        .collect();
    let edges = dependency_edges(&units);

    // referenced -> referrers
    let mut in_degree = vec![0usize; n];
    let mut adj: Vec<Vec<usize>> = vec![vec![]; n];
    for (referrer, referenced) in &edges {
        if let (Some(&from), Some(&to)) = (index.get(referenced.as_str()), index.get(referrer.as_str())) {
            adj[from].push(to);
            in_degree[to] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order: Vec<usize> = Vec::with_capacity(n);

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &adj[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < n {
        let placed: HashSet<usize> = order.iter().copied().collect();
        let stuck: BTreeSet<String> = (0..n)
            .filter(|i| !placed.contains(i))
            .map(|i| units[i].table.clone())
            .collect();
        tracing::error!(stuck = ?stuck, "Foreign key dependency cycle");
        return Err(EngineError::DependencyCycle {
            stuck: stuck.into_iter().collect(),
            edges,
        });
    }

    let mut slots: Vec<Option<MigrationUnit>> = units.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}
