//! The agent's live map: nodes, undirected edges and their attributes.

use std::collections::BTreeMap;
use std::fmt;

use super::{Edge, EdgeId, MapAttribute, NodeId};
use crate::display::{DisplayFactory, MapDisplay, MapEvent};
use crate::error::{AgentMapError, DisplayError, Result};

/// Default title of a freshly created map.
pub const DEFAULT_GRAPH_NAME: &str = "My world vision";

/// Graph of explored locations.
///
/// Owned by a single agent; all mutation goes through `&mut self`. Iteration
/// order over nodes, edges and neighbours is deterministic for a given state.
pub struct MapGraph {
    name: String,
    nodes: BTreeMap<NodeId, MapAttribute>,
    edges: BTreeMap<EdgeId, Edge>,
    /// node -> (neighbour -> id of the joining edge)
    adjacency: BTreeMap<NodeId, BTreeMap<NodeId, EdgeId>>,
    next_edge_id: u64,
    display: Option<Box<dyn MapDisplay>>,
}

impl MapGraph {
    /// Empty map with the default title.
    pub fn new() -> Self {
        Self::with_name(DEFAULT_GRAPH_NAME)
    }

    /// Empty map titled `name`.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            next_edge_id: 1,
            display: None,
        }
    }

    /// Title of the map, shown by displays and carried by snapshots.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or update a node.
    ///
    /// With `Some(attribute)` the node's attribute is overwritten whether or
    /// not the node existed. With `None` an unknown node is registered with
    /// [`MapAttribute::None`] and a known node is left as it is.
    ///
    /// Returns true when the node was newly created.
    pub fn upsert_node(&mut self, id: &str, attribute: Option<MapAttribute>) -> bool {
        let created = !self.nodes.contains_key(id);
        if !created && attribute.is_none() {
            return false;
        }

        let attribute = attribute.unwrap_or_default();
        self.nodes.insert(id.to_string(), attribute);
        if created {
            self.adjacency.insert(id.to_string(), BTreeMap::new());
        }

        self.notify(MapEvent::NodeUpserted {
            id: id.to_string(),
            class: attribute.style_class(),
        });
        created
    }

    /// True when `id` is a known node.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Link two known nodes.
    ///
    /// Returns `Ok(true)` when a new edge was created and `Ok(false)` when the
    /// nodes were already linked (or `a == b`; loops are not allowed).
    pub fn add_edge(&mut self, a: &str, b: &str) -> Result<bool> {
        self.require(a)?;
        self.require(b)?;

        if a == b {
            log::debug!("ignoring self-loop on {}", a);
            return Ok(false);
        }
        if self.adjacency.get(a).is_some_and(|n| n.contains_key(b)) {
            return Ok(false);
        }

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;

        self.edges.insert(
            id,
            Edge {
                a: a.to_string(),
                b: b.to_string(),
            },
        );
        if let Some(n) = self.adjacency.get_mut(a) {
            n.insert(b.to_string(), id);
        }
        if let Some(n) = self.adjacency.get_mut(b) {
            n.insert(a.to_string(), id);
        }

        self.notify(MapEvent::EdgeAdded {
            id,
            a: a.to_string(),
            b: b.to_string(),
        });
        Ok(true)
    }

    /// Every node one edge away from `id`.
    pub fn neighbours(&self, id: &str) -> Result<Vec<NodeId>> {
        Ok(self.adjacent(id)?.map(str::to_string).collect())
    }

    /// Number of edges incident to `id`.
    pub fn degree(&self, id: &str) -> Result<usize> {
        self.adjacency
            .get(id)
            .map(BTreeMap::len)
            .ok_or_else(|| AgentMapError::NodeNotFound(id.to_string()))
    }

    /// Current attribute of `id`.
    pub fn attribute(&self, id: &str) -> Result<MapAttribute> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| AgentMapError::NodeNotFound(id.to_string()))
    }

    /// Number of known nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True before the first node is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every node, in id order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    /// All nodes with their attribute.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, MapAttribute)> + '_ {
        self.nodes.iter().map(|(id, attr)| (id.as_str(), *attr))
    }

    /// Ids of the nodes currently tagged with `attribute`, e.g. the open frontier.
    pub fn nodes_with(&self, attribute: MapAttribute) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, attr)| **attr == attribute)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Every edge with its bookkeeping id, in creation order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges.iter().map(|(id, edge)| (*id, edge))
    }

    /// Borrowing neighbour iterator used by the path and topology queries.
    pub(crate) fn adjacent(&self, id: &str) -> Result<impl Iterator<Item = &str> + '_> {
        self.adjacency
            .get(id)
            .map(|n| n.keys().map(String::as_str))
            .ok_or_else(|| AgentMapError::NodeNotFound(id.to_string()))
    }

    /// Bind a display created by `factory` and replay the current state to it.
    /// A previously attached display is torn down first.
    pub fn attach_display(&mut self, factory: &dyn DisplayFactory) -> std::result::Result<(), DisplayError> {
        self.detach_display();

        let mut display = factory.create_display(self)?;
        for (id, attribute) in &self.nodes {
            display.notify(&MapEvent::NodeUpserted {
                id: id.clone(),
                class: attribute.style_class(),
            });
        }
        for (id, edge) in &self.edges {
            display.notify(&MapEvent::EdgeAdded {
                id: *id,
                a: edge.a.clone(),
                b: edge.b.clone(),
            });
        }
        self.display = Some(display);
        Ok(())
    }

    /// Tear down the attached display, if any. Failures are logged, never returned.
    pub fn detach_display(&mut self) {
        if let Some(mut display) = self.display.take() {
            if let Err(e) = display.teardown() {
                log::warn!("display teardown for '{}' failed: {}", self.name, e);
            }
        }
    }

    /// True while a display is attached.
    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    fn require(&self, id: &str) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(AgentMapError::NodeNotFound(id.to_string()))
        }
    }

    fn notify(&mut self, event: MapEvent) {
        if let Some(display) = self.display.as_mut() {
            display.notify(&event);
        }
    }
}

impl Default for MapGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MapGraph {
    fn drop(&mut self) {
        self.detach_display();
    }
}

impl fmt::Debug for MapGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapGraph")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("display", &self.display.is_some())
            .finish()
    }
}
