//! Single-source shortest paths (Dijkstra) over the map.
//!
//! Recomputed from scratch on every call; nothing is cached between queries.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use super::{MapGraph, NodeId};
use crate::error::{AgentMapError, Result};

/// Cost of traversing one edge. Every link currently has the same weight.
const EDGE_WEIGHT: u32 = 1;

/// Distances and predecessors from one source node.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    source: NodeId,
    distances: HashMap<NodeId, u32>,
    predecessors: HashMap<NodeId, NodeId>,
}

impl ShortestPathTree {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Hop count to `to`, or `None` if unreachable.
    pub fn distance(&self, to: &str) -> Option<u32> {
        self.distances.get(to).copied()
    }

    /// Every reachable node with its distance, the source included.
    pub fn distances(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.distances.iter().map(|(id, d)| (id.as_str(), *d))
    }

    /// Full path from the source to `to`, both ends included.
    pub fn path_to(&self, to: &str) -> Option<Vec<NodeId>> {
        if !self.distances.contains_key(to) {
            return None;
        }

        let mut path = vec![to.to_string()];
        let mut current = to;
        while let Some(prev) = self.predecessors.get(current) {
            path.push(prev.clone());
            current = prev;
        }
        path.reverse();
        Some(path)
    }
}

/// Run Dijkstra from `from`.
pub fn single_source(graph: &MapGraph, from: &str) -> Result<ShortestPathTree> {
    if !graph.contains(from) {
        return Err(AgentMapError::NodeNotFound(from.to_string()));
    }
    dijkstra(graph, from)
}

/// Moves needed to go from `from` to `to`.
///
/// * `Ok(None)`: `to` cannot be reached.
/// * `Ok(Some(vec![]))`: already there.
/// * `Ok(Some(path))`: the nodes to walk through, `from` excluded, `to` included.
///
/// Unknown ids on either side are reported as [`AgentMapError::NodeNotFound`].
pub fn shortest_path(graph: &MapGraph, from: &str, to: &str) -> Result<Option<Vec<NodeId>>> {
    if !graph.contains(to) {
        return Err(AgentMapError::NodeNotFound(to.to_string()));
    }
    let tree = single_source(graph, from)?;

    let moves = tree.path_to(to).map(|mut path| {
        path.remove(0);
        path
    });
    log::debug!("shortest path from {} to {}: {:?}", from, to, moves);
    Ok(moves)
}

pub(crate) fn dijkstra(graph: &MapGraph, source: &str) -> Result<ShortestPathTree> {
    let mut distances: HashMap<NodeId, u32> = HashMap::new();
    let mut predecessors: HashMap<NodeId, NodeId> = HashMap::new();
    // Ties on distance are broken on node id, keeping results deterministic.
    let mut heap: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();

    distances.insert(source.to_string(), 0);
    heap.push(Reverse((0, source.to_string())));

    while let Some(Reverse((dist, node))) = heap.pop() {
        if distances.get(&node).is_some_and(|&best| dist > best) {
            continue;
        }
        for next in graph.adjacent(&node)? {
            let candidate = dist + EDGE_WEIGHT;
            let improves = distances.get(next).map_or(true, |&known| candidate < known);
            if improves {
                distances.insert(next.to_string(), candidate);
                predecessors.insert(next.to_string(), node.clone());
                heap.push(Reverse((candidate, next.to_string())));
            }
        }
    }

    Ok(ShortestPathTree {
        source: source.to_string(),
        distances,
        predecessors,
    })
}
