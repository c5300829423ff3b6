//! Migration snapshots: freeze a live map into a transfer-safe value and
//! rebuild a live map from it on the other side.
//!
//! The snapshot owns plain data only. Displays are torn down on freeze and
//! recreated on thaw; edge ids are regenerated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::display::DisplayFactory;
use crate::error::{AgentMapError, Result};
use crate::graph::{MapAttribute, MapGraph, NodeId};

/// Snapshot layout version written by this crate.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub attribute: MapAttribute,
}

/// Unordered pair of node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePair {
    pub a: NodeId,
    pub b: NodeId,
}

/// Transfer-safe form of a [`MapGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub format_version: u32,
    pub snapshot_id: Uuid,
    pub frozen_at: DateTime<Utc>,
    pub graph_name: String,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgePair>,
}

impl MapSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Freeze `graph` before migration.
///
/// The graph is consumed. Its display, if any, is torn down; a display that
/// is already gone is logged and otherwise ignored.
pub fn freeze(mut graph: MapGraph) -> MapSnapshot {
    graph.detach_display();

    let nodes: Vec<NodeRecord> = graph
        .nodes()
        .map(|(id, attribute)| NodeRecord {
            id: id.to_string(),
            attribute,
        })
        .collect();
    let edges: Vec<EdgePair> = graph
        .edges()
        .map(|(_, edge)| EdgePair {
            a: edge.a.clone(),
            b: edge.b.clone(),
        })
        .collect();

    let snapshot = MapSnapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        snapshot_id: Uuid::new_v4(),
        frozen_at: Utc::now(),
        graph_name: graph.name().to_string(),
        nodes,
        edges,
    };
    log::info!(
        "Froze map '{}' as snapshot {} ({} nodes, {} edges)",
        snapshot.graph_name,
        snapshot.snapshot_id,
        snapshot.node_count(),
        snapshot.edge_count()
    );
    snapshot
}

/// Rebuild a live map after migration, optionally with a new display.
///
/// Fails on an unknown snapshot version or on an edge naming a node the
/// snapshot does not contain. A display that cannot be created is logged and
/// the map is returned without one.
pub fn thaw(snapshot: MapSnapshot, display: Option<&dyn DisplayFactory>) -> Result<MapGraph> {
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(AgentMapError::Snapshot(format!(
            "unsupported snapshot format version {} (expected {})",
            snapshot.format_version, SNAPSHOT_FORMAT_VERSION
        )));
    }

    let mut graph = MapGraph::with_name(snapshot.graph_name);
    for node in &snapshot.nodes {
        graph.upsert_node(&node.id, Some(node.attribute));
    }
    for edge in &snapshot.edges {
        graph.add_edge(&edge.a, &edge.b)?;
    }

    if let Some(factory) = display {
        if let Err(e) = graph.attach_display(factory) {
            log::warn!("Could not open display for map '{}': {}", graph.name(), e);
        }
    }

    log::info!(
        "Loaded snapshot {} ({} nodes, {} edges)",
        snapshot.snapshot_id,
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{ChannelDisplayFactory, DisplayMirror, Stylesheet};
    use crate::graph::shortest_path;
    use std::collections::BTreeSet;
    use tokio::sync::mpsc;

    fn explored_graph() -> MapGraph {
        let mut g = MapGraph::with_name("cave");
        g.upsert_node("1", Some(MapAttribute::Agent));
        g.upsert_node("2", Some(MapAttribute::Open));
        g.upsert_node("3", None);
        g.upsert_node("4", Some(MapAttribute::Open));
        g.upsert_node("lonely", None);
        g.add_edge("1", "2").unwrap();
        g.add_edge("2", "3").unwrap();
        g.add_edge("3", "1").unwrap();
        g.add_edge("4", "3").unwrap();
        g
    }

    /// (node -> attribute, set of unordered adjacency pairs)
    fn shape(g: &MapGraph) -> (Vec<(String, MapAttribute)>, BTreeSet<(String, String)>) {
        let nodes = g.nodes().map(|(id, a)| (id.to_string(), a)).collect();
        let mut adjacency = BTreeSet::new();
        for id in g.node_ids() {
            for n in g.neighbours(&id).unwrap() {
                let pair = if id < n { (id.clone(), n) } else { (n, id.clone()) };
                adjacency.insert(pair);
            }
        }
        (nodes, adjacency)
    }

    #[test]
    fn test_round_trip_preserves_shape() {
        let g = explored_graph();
        let before = shape(&g);

        let snapshot = freeze(g);
        assert_eq!(snapshot.node_count(), 5);
        assert_eq!(snapshot.edge_count(), 4);

        let thawed = thaw(snapshot, None).unwrap();
        assert_eq!(shape(&thawed), before);
        assert_eq!(thawed.name(), "cave");
        assert_eq!(thawed.attribute("1").unwrap(), MapAttribute::Agent);
        assert_eq!(shortest_path(&thawed, "1", "4").unwrap(), Some(vec!["3".to_string(), "4".to_string()]));
    }

    #[test]
    fn test_round_trip_over_the_wire() {
        let g = explored_graph();
        let before = shape(&g);

        let bytes = freeze(g).to_bytes().unwrap();
        let snapshot = MapSnapshot::from_bytes(&bytes).unwrap();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"OPEN\""));

        let thawed = thaw(MapSnapshot::from_json(&json).unwrap(), None).unwrap();
        assert_eq!(shape(&thawed), before);
    }

    #[test]
    fn test_empty_graph_round_trip() {
        let thawed = thaw(freeze(MapGraph::new()), None).unwrap();
        assert!(thawed.is_empty());
        assert_eq!(thawed.edge_count(), 0);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut snapshot = freeze(explored_graph());
        snapshot.format_version = 99;
        assert!(matches!(thaw(snapshot, None), Err(AgentMapError::Snapshot(_))));
    }

    #[test]
    fn test_rejects_dangling_edge() {
        let mut snapshot = freeze(explored_graph());
        snapshot.edges.push(EdgePair {
            a: "1".to_string(),
            b: "nowhere".to_string(),
        });
        assert!(matches!(thaw(snapshot, None), Err(AgentMapError::NodeNotFound(id)) if id == "nowhere"));
    }

    #[test]
    fn test_display_torn_down_and_recreated() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let factory = ChannelDisplayFactory::new(tx, Stylesheet::default());

        let mut g = explored_graph();
        g.attach_display(&factory).unwrap();
        let snapshot = freeze(g);

        let mut mirror = DisplayMirror::new();
        while let Ok(message) = rx.try_recv() {
            mirror.apply(message);
        }
        assert!(!mirror.is_open());

        let thawed = thaw(snapshot, Some(&factory)).unwrap();
        assert!(thawed.has_display());
        while let Ok(message) = rx.try_recv() {
            mirror.apply(message);
        }
        assert!(mirror.is_open());
        assert_eq!(mirror.opened_count(), 2);
        assert_eq!(mirror.node_count(), 5);
        assert_eq!(mirror.edge_count(), 4);
    }

    #[test]
    fn test_freeze_tolerates_vanished_display() {
        let (tx, rx) = mpsc::unbounded_channel();
        let factory = ChannelDisplayFactory::new(tx, Stylesheet::default());
        let mut g = explored_graph();
        g.attach_display(&factory).unwrap();
        drop(rx);

        let snapshot = freeze(g);
        assert_eq!(snapshot.node_count(), 5);

        // No renderer left: thaw still succeeds, just without a display.
        let thawed = thaw(snapshot, Some(&factory)).unwrap();
        assert!(!thawed.has_display());
        assert_eq!(thawed.node_count(), 5);
    }
}
