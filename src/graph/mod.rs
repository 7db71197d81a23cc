//! Rule Graph: association rules as a directed graph of item-set labels.
//!
//! Uses `petgraph` for the graph structure; [`layout`] places the nodes.

pub mod layout;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;

use crate::data::schema::rules;
use crate::data::{DataProcessor, TransformError};

/// Which side of a rule a label appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeRole {
    Antecedent,
    Consequent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleNode {
    pub label: String,
    pub role: NodeRole,
}

/// One edge per (antecedent, consequent) pair, weighted by support.
pub struct RuleGraph {
    graph: DiGraph<RuleNode, f64>,
    index: HashMap<String, NodeIndex>,
}

impl RuleGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build from a rules table (`antecedents`, `consequents`, `support`).
    ///
    /// A label seen as a consequent anywhere takes the consequent role.
    /// A repeated pair keeps the support of its last row.
    pub fn from_rules(df: &polars::prelude::DataFrame) -> Result<Self, TransformError> {
        let antecedents = DataProcessor::text_values(df, rules::ANTECEDENTS)?;
        let consequents = DataProcessor::text_values(df, rules::CONSEQUENTS)?;
        let support = DataProcessor::numeric_values(df, rules::SUPPORT)?;

        let mut graph = Self::new();
        for label in antecedents.iter().flatten() {
            graph.ensure_node(label, NodeRole::Antecedent);
        }
        for label in consequents.iter().flatten() {
            let idx = graph.ensure_node(label, NodeRole::Consequent);
            graph.graph[idx].role = NodeRole::Consequent;
        }

        for ((a, c), s) in antecedents.iter().zip(&consequents).zip(&support) {
            if let (Some(a), Some(c)) = (a, c) {
                graph.add_rule(a, c, s.unwrap_or(0.0));
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "rule graph built"
        );
        Ok(graph)
    }

    fn ensure_node(&mut self, label: &str, role: NodeRole) -> NodeIndex {
        if let Some(idx) = self.index.get(label) {
            return *idx;
        }
        let idx = self.graph.add_node(RuleNode {
            label: label.to_string(),
            role,
        });
        self.index.insert(label.to_string(), idx);
        idx
    }

    /// Add or overwrite the edge `antecedent -> consequent`.
    pub fn add_rule(&mut self, antecedent: &str, consequent: &str, support: f64) {
        let a = self.ensure_node(antecedent, NodeRole::Antecedent);
        let c = self.ensure_node(consequent, NodeRole::Consequent);
        self.graph.update_edge(a, c, support);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> Vec<&RuleNode> {
        self.graph.node_indices().map(|i| &self.graph[i]).collect()
    }

    /// Edges as (source position, target position, support), positions as in [`nodes`](Self::nodes).
    pub fn edges(&self) -> Vec<(usize, usize, f64)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect()
    }

    /// Symmetric attraction matrix for the layout.
    fn weight_matrix(&self) -> Vec<Vec<f64>> {
        let n = self.node_count();
        let mut weights = vec![vec![0.0f64; n]; n];
        for (s, t, w) in self.edges() {
            if s != t {
                weights[s][t] = weights[s][t].max(w);
                weights[t][s] = weights[t][s].max(w);
            }
        }
        weights
    }

    /// Seeded spring layout, one position per node in [`nodes`](Self::nodes) order.
    pub fn layout(&self, seed: u64, iterations: usize) -> Vec<[f64; 2]> {
        layout::spring_layout(&self.weight_matrix(), seed, iterations)
    }
}

impl Default for RuleGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn rules_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("antecedents".into(), vec!["Chairs", "Tables", "Chairs", "Binders"]),
            Column::new("consequents".into(), vec!["Tables", "Phones", "Tables", "Chairs"]),
            Column::new("support".into(), vec![0.10, 0.05, 0.12, 0.08]),
        ])
        .unwrap()
    }

    fn role_of(graph: &RuleGraph, label: &str) -> Option<NodeRole> {
        graph.nodes().into_iter().find(|n| n.label == label).map(|n| n.role)
    }

    fn position(graph: &RuleGraph, label: &str) -> usize {
        graph.nodes().iter().position(|n| n.label == label).unwrap()
    }

    #[test]
    fn builds_nodes_and_edges() {
        let graph = RuleGraph::from_rules(&rules_frame()).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn repeated_pair_keeps_last_support() {
        let graph = RuleGraph::from_rules(&rules_frame()).unwrap();
        let chairs = position(&graph, "Chairs");
        let tables = position(&graph, "Tables");
        let edges = graph.edges();
        let forward: Vec<f64> = edges
            .iter()
            .filter(|(s, t, _)| (*s, *t) == (chairs, tables))
            .map(|e| e.2)
            .collect();
        assert_eq!(forward, vec![0.12]);
        assert!(!edges.iter().any(|(s, t, _)| (*s, *t) == (tables, chairs)));
    }

    #[test]
    fn consequent_role_wins() {
        let graph = RuleGraph::from_rules(&rules_frame()).unwrap();
        assert_eq!(role_of(&graph, "Binders"), Some(NodeRole::Antecedent));
        assert_eq!(role_of(&graph, "Chairs"), Some(NodeRole::Consequent));
        assert_eq!(role_of(&graph, "Phones"), Some(NodeRole::Consequent));
        assert_eq!(role_of(&graph, "Lamps"), None);
    }

    #[test]
    fn weight_matrix_is_symmetric() {
        let graph = RuleGraph::from_rules(&rules_frame()).unwrap();
        let weights = graph.weight_matrix();
        assert_eq!(weights.len(), 4);
        for i in 0..4 {
            assert_eq!(weights[i][i], 0.0);
            for j in 0..4 {
                assert_eq!(weights[i][j], weights[j][i]);
            }
        }
        let chairs = position(&graph, "Chairs");
        let tables = position(&graph, "Tables");
        assert_eq!(weights[chairs][tables], 0.12);
        assert_eq!(weights[tables][chairs], 0.12);
    }

    #[test]
    fn layout_matches_node_order() {
        let graph = RuleGraph::from_rules(&rules_frame()).unwrap();
        let pos = graph.layout(32, 50);
        assert_eq!(pos.len(), graph.nodes().len());
        assert_eq!(pos, graph.layout(32, 50));
    }
}
