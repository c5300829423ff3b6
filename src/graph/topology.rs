//! All-pairs distances, eccentricity and graph center ("centroids").
//!
//! Centroids are the nodes of minimum eccentricity; they make good
//! exploration targets because every known location is close to them.

use std::collections::BTreeMap;

use super::pathfinding::dijkstra;
use super::{MapGraph, NodeId};

/// Hop distances between every pair of mutually reachable nodes.
#[derive(Debug, Clone, Default)]
pub struct DistanceMatrix {
    rows: BTreeMap<NodeId, BTreeMap<NodeId, u32>>,
}

impl DistanceMatrix {
    /// Hop count between two nodes, `None` when unreachable or unknown.
    pub fn distance(&self, from: &str, to: &str) -> Option<u32> {
        self.rows.get(from).and_then(|row| row.get(to)).copied()
    }

    /// Largest distance from `id` to any node it can reach.
    /// An isolated node has eccentricity 0.
    pub fn eccentricity(&self, id: &str) -> Option<u32> {
        self.rows
            .get(id)
            .map(|row| row.values().copied().max().unwrap_or(0))
    }

    /// Number of source nodes (every node of the analysed graph).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True for the matrix of an empty graph.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Distances from every node to every reachable node.
pub fn all_pairs_distances(graph: &MapGraph) -> DistanceMatrix {
    let mut rows = BTreeMap::new();
    for (id, _) in graph.nodes() {
        // Every id comes from the graph itself, so the search cannot miss.
        let Ok(tree) = dijkstra(graph, id) else {
            continue;
        };
        let row: BTreeMap<NodeId, u32> = tree
            .distances()
            .map(|(to, d)| (to.to_string(), d))
            .collect();
        rows.insert(id.to_string(), row);
    }
    DistanceMatrix { rows }
}

/// Eccentricity of every node.
pub fn eccentricities(graph: &MapGraph) -> BTreeMap<NodeId, u32> {
    let matrix = all_pairs_distances(graph);
    matrix
        .rows
        .keys()
        .filter_map(|id| matrix.eccentricity(id).map(|e| (id.clone(), e)))
        .collect()
}

/// Nodes of minimum eccentricity, in id order. Empty for an empty graph.
pub fn find_centroids(graph: &MapGraph) -> Vec<NodeId> {
    centroid_flags(&eccentricities(graph))
        .into_iter()
        .filter(|(_, is_centroid)| *is_centroid)
        .map(|(id, _)| id)
        .collect()
}

fn centroid_flags(eccentricity: &BTreeMap<NodeId, u32>) -> BTreeMap<NodeId, bool> {
    let Some(min) = eccentricity.values().copied().min() else {
        return BTreeMap::new();
    };
    eccentricity
        .iter()
        .map(|(id, e)| (id.clone(), *e == min))
        .collect()
}

/// Two-phase centroid analysis: compute, then read.
///
/// Results are a snapshot of the graph at the time of
/// [`compute_centroids`](Self::compute_centroids). Later mutation of the
/// graph does not invalidate them; callers re-run the computation when they
/// need fresh centroids.
#[derive(Debug, Clone, Default)]
pub struct TopologyAnalysis {
    eccentricity: BTreeMap<NodeId, u32>,
    flags: Option<BTreeMap<NodeId, bool>>,
}

impl TopologyAnalysis {
    /// Analysis in the uncomputed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute eccentricities over `graph` and flag the centroids.
    pub fn compute_centroids(&mut self, graph: &MapGraph) -> &BTreeMap<NodeId, bool> {
        self.eccentricity = eccentricities(graph);
        let flags = centroid_flags(&self.eccentricity);
        log::debug!(
            "centroid analysis over {} nodes: {} centroid(s)",
            flags.len(),
            flags.values().filter(|c| **c).count()
        );
        self.flags.insert(flags)
    }

    /// Centroids from the last computation; empty if never computed.
    pub fn centroids(&self) -> Vec<NodeId> {
        self.flags
            .iter()
            .flatten()
            .filter(|(_, is_centroid)| **is_centroid)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether `id` was flagged by the last computation; false if never computed.
    pub fn is_centroid(&self, id: &str) -> bool {
        self.flags
            .as_ref()
            .and_then(|flags| flags.get(id))
            .copied()
            .unwrap_or(false)
    }

    /// True once `compute_centroids` has run.
    pub fn is_computed(&self) -> bool {
        self.flags.is_some()
    }

    /// Eccentricity of `id` from the last computation.
    pub fn eccentricity(&self, id: &str) -> Option<u32> {
        self.eccentricity.get(id).copied()
    }
}
