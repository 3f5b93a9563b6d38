//! Link graph over registered templates.
//!
//! Nodes are templates, and every link contributes an edge from the embedded
//! (source) template to the embedding (target) template, so a topological
//! order lists every template after everything it embeds.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::TemplateId;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the DFS stack.
    Gray,
    /// Node and everything reachable from it has been visited.
    Black,
}

/// Snapshot of the registry's link structure.
pub(crate) struct TemplateGraph {
    graph: DiGraph<TemplateId, ()>,
    node_map: HashMap<TemplateId, NodeIndex>,
}

impl TemplateGraph {
    /// Builds a graph from template ids and `(source, target)` link edges.
    ///
    /// Nodes are inserted in ascending id order so traversals are
    /// deterministic.
    pub(crate) fn new(
        templates: impl IntoIterator<Item = TemplateId>,
        edges: impl IntoIterator<Item = (TemplateId, TemplateId)>,
    ) -> Self {
        let mut ids: Vec<_> = templates.into_iter().collect();
        ids.sort_unstable();

        let mut graph = Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        };
        for id in ids {
            graph.ensure_node(id);
        }

        let mut edges: Vec<_> = edges.into_iter().collect();
        edges.sort_unstable();
        for (source, target) in edges {
            let source_idx = graph.ensure_node(source);
            let target_idx = graph.ensure_node(target);
            if !graph.graph.contains_edge(source_idx, target_idx) {
                graph.graph.add_edge(source_idx, target_idx, ());
            }
        }
        graph
    }

    fn ensure_node(&mut self, id: TemplateId) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&id) {
            index
        } else {
            let index = self.graph.add_node(id);
            self.node_map.insert(id, index);
            index
        }
    }

    /// Whether `to` is reachable from `from` (a node reaches itself).
    pub(crate) fn has_path(&self, from: TemplateId, to: TemplateId) -> bool {
        if from == to {
            return true;
        }
        match (self.node_map.get(&from), self.node_map.get(&to)) {
            (Some(&from_idx), Some(&to_idx)) => {
                has_path_connecting(&self.graph, from_idx, to_idx, None)
            }
            _ => false,
        }
    }

    /// Finds a cycle, returned as a closed chain (first id repeated last).
    pub(crate) fn find_cycle(&self) -> Option<Vec<TemplateId>> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|node| (node, Color::White)).collect();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                return Some(cycle);
            }
        }
        None
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<TemplateId>,
    ) -> Option<Vec<TemplateId>> {
        colors.insert(node, Color::Gray);
        path.push(self.graph[node]);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|id| *id == self.graph[neighbor])?;
                    let mut cycle = path[start..].to_vec();
                    cycle.push(self.graph[neighbor]);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Every template after all templates it embeds.
    ///
    /// Returns the offending cycle when the graph is not acyclic.
    pub(crate) fn topological_order(&self) -> Result<Vec<TemplateId>, Vec<TemplateId>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(cycle);
        }
        toposort(&self.graph, None)
            .map(|indices| indices.into_iter().map(|idx| self.graph[idx]).collect())
            .map_err(|cycle| vec![self.graph[cycle.node_id()]])
    }
}
