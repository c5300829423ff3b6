//! Topology knowledge: the explored graph, shortest paths and centroids.
//!
//! Nodes are locations discovered by the agent, edges are undirected
//! unit-weight links between them. The model is owned by a single agent and
//! answers every query synchronously, without waiting on any display.

mod model;
pub mod pathfinding;
pub mod topology;

pub use model::{MapGraph, DEFAULT_GRAPH_NAME};
pub use pathfinding::{shortest_path, single_source, ShortestPathTree};
pub use topology::{
    all_pairs_distances, eccentricities, find_centroids, DistanceMatrix, TopologyAnalysis,
};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a location. Opaque, unique within a graph.
pub type NodeId = String;

/// Role tag of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MapAttribute {
    /// Known location with no particular role.
    #[default]
    None,
    /// The agent currently stands here.
    Agent,
    /// Known but not yet visited (frontier).
    Open,
}

impl MapAttribute {
    /// Display class used to style a node carrying this attribute.
    pub fn style_class(self) -> StyleClass {
        match self {
            MapAttribute::None => StyleClass::Default,
            MapAttribute::Agent => StyleClass::Agent,
            MapAttribute::Open => StyleClass::Open,
        }
    }
}

impl fmt::Display for MapAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MapAttribute::None => "none",
            MapAttribute::Agent => "agent",
            MapAttribute::Open => "open",
        };
        f.write_str(s)
    }
}

/// One of the three style classes the display knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleClass {
    Default,
    Agent,
    Open,
}

impl StyleClass {
    /// Stylesheet class name (`node.agent`, `node.open`); empty for the default.
    pub fn class_name(self) -> &'static str {
        match self {
            StyleClass::Default => "",
            StyleClass::Agent => "agent",
            StyleClass::Open => "open",
        }
    }
}

/// Display bookkeeping id of an edge. Not stable across a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Undirected link between two nodes. Endpoints are stored in the order given
/// at insertion; equality of links is decided on the unordered pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
}

impl Edge {
    /// The endpoint across from `id`, if `id` is an endpoint at all.
    pub fn opposite(&self, id: &str) -> Option<&str> {
        if self.a == id {
            Some(self.b.as_str())
        } else if self.b == id {
            Some(self.a.as_str())
        } else {
            None
        }
    }

    /// True when this edge joins `x` and `y` in either direction.
    pub fn connects(&self, x: &str, y: &str) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}
