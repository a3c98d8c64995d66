use std::collections::HashMap;

use tracing::debug;

use super::{EntityKind, EntitySummary, GraphData, LinkKind};

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEdge {
    pub source: usize,
    pub target: usize,
    pub kind: LinkKind,
    pub link_type: String,
}

/// Id-indexed view of a graph with every edge resolved to node indices.
///
/// Edges whose endpoints are missing from the node set are dropped here, so
/// nothing downstream ever sees a dangling reference. Self-loops are dropped
/// as well since they carry no layout force and have no drawable length.
#[derive(Clone, Debug)]
pub struct GraphIndex {
    nodes: Vec<EntitySummary>,
    index_by_id: HashMap<String, usize>,
    edges: Vec<ResolvedEdge>,
    neighbors: Vec<Vec<usize>>,
    dropped_edges: usize,
    max_mentions: u64,
}

impl GraphIndex {
    pub fn new(graph: &GraphData) -> Self {
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        let mut index_by_id = HashMap::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if index_by_id.contains_key(&node.id) {
                continue;
            }
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(node.clone());
        }

        let mut edges = Vec::with_capacity(graph.edges.len());
        let mut neighbors = vec![Vec::new(); nodes.len()];
        let mut dropped_edges = 0usize;
        for edge in &graph.edges {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&edge.source_id),
                index_by_id.get(&edge.target_id),
            ) else {
                dropped_edges += 1;
                continue;
            };
            if source == target {
                dropped_edges += 1;
                continue;
            }

            if !neighbors[source].contains(&target) {
                neighbors[source].push(target);
            }
            if !neighbors[target].contains(&source) {
                neighbors[target].push(source);
            }
            edges.push(ResolvedEdge {
                source,
                target,
                kind: edge.kind(),
                link_type: edge.link_type.clone(),
            });
        }

        if dropped_edges > 0 {
            debug!(dropped_edges, "skipped edges with unresolved or self-referencing endpoints");
        }

        let max_mentions = nodes.iter().map(|node| node.mention_count).max().unwrap_or(0);

        Self {
            nodes,
            index_by_id,
            edges,
            neighbors,
            dropped_edges,
            max_mentions,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[EntitySummary] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&EntitySummary> {
        self.nodes.get(index)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&EntitySummary> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn edges(&self) -> &[ResolvedEdge] {
        &self.edges
    }

    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    pub fn max_mentions(&self) -> u64 {
        self.max_mentions
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors(index).len()
    }

    pub fn is_connected(&self, index: usize) -> bool {
        self.degree(index) > 0
    }

    pub fn are_adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).contains(&b)
    }

    pub fn kind(&self, index: usize) -> EntityKind {
        self.nodes
            .get(index)
            .map(EntitySummary::kind)
            .unwrap_or(EntityKind::Unknown)
    }

    /// Node with the most distinct neighbors, first one wins on ties.
    pub fn most_connected(&self) -> Option<usize> {
        let mut best = None;
        let mut best_degree = 0usize;
        for index in 0..self.nodes.len() {
            let degree = self.degree(index);
            if degree > best_degree {
                best_degree = degree;
                best = Some(index);
            }
        }
        best
    }

    pub fn count_by_kind(&self) -> HashMap<EntityKind, usize> {
        let mut counts = HashMap::new();
        for node in &self.nodes {
            *counts.entry(node.kind()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphEdge;

    fn graph() -> GraphData {
        GraphData {
            nodes: vec![
                EntitySummary::new("a", "brand", 100),
                EntitySummary::new("b", "product", 10),
                EntitySummary::new("c", "person", 1),
            ],
            edges: vec![
                GraphEdge::new("a", "b", "produces"),
                GraphEdge::new("ghost", "b", "produces"),
                GraphEdge::new("c", "c", "discusses"),
                GraphEdge::new("b", "a", "produced_by"),
            ],
        }
    }

    #[test]
    fn drops_edges_with_unknown_endpoints_and_self_loops() {
        let index = GraphIndex::new(&graph());

        assert_eq!(index.edges().len(), 2);
        assert_eq!(index.dropped_edges(), 2);
        assert!(
            index
                .edges()
                .iter()
                .all(|edge| edge.source < index.len() && edge.target < index.len())
        );
    }

    #[test]
    fn neighbors_are_symmetric_and_deduplicated() {
        let index = GraphIndex::new(&graph());
        let a = index.index_of("a").unwrap();
        let b = index.index_of("b").unwrap();
        let c = index.index_of("c").unwrap();

        assert_eq!(index.neighbors(a), &[b]);
        assert_eq!(index.neighbors(b), &[a]);
        assert!(!index.is_connected(c));
        assert!(index.are_adjacent(a, b));
        assert_eq!(index.max_mentions(), 100);
        assert_eq!(index.most_connected(), Some(a));
    }

    #[test]
    fn duplicate_node_ids_keep_the_first_entry() {
        let mut data = graph();
        data.nodes.push(EntitySummary::new("a", "place", 5));
        let index = GraphIndex::new(&data);

        assert_eq!(index.len(), 3);
        assert_eq!(index.node_by_id("a").unwrap().kind(), EntityKind::Brand);
    }
}
