//! Display collaborator interface.
//!
//! The graph never depends on a display to answer a query. When one is
//! attached, every node upsert and edge insertion is pushed to it as a
//! [`MapEvent`]; the display consumes them on its own schedule. Displays are
//! not transferable, so they are torn down before a migration and recreated
//! afterwards.

mod channel;

pub use channel::{spawn_renderer, ChannelDisplay, ChannelDisplayFactory, DisplayMessage, DisplayMirror};

use serde::{Deserialize, Serialize};

use crate::error::DisplayError;
use crate::graph::{EdgeId, MapGraph, NodeId, StyleClass};

/// Model change pushed to an attached display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapEvent {
    NodeUpserted { id: NodeId, class: StyleClass },
    EdgeAdded { id: EdgeId, a: NodeId, b: NodeId },
}

/// A live, non-transferable view of a graph.
pub trait MapDisplay: Send {
    /// Reflect a model change. Must not block and must not fail the caller.
    fn notify(&mut self, event: &MapEvent);

    /// Release the display. Calling it on an already closed display is allowed
    /// and reports [`DisplayError::Closed`].
    fn teardown(&mut self) -> Result<(), DisplayError>;
}

/// Creates displays bound to a graph.
pub trait DisplayFactory {
    fn create_display(&self, graph: &MapGraph) -> Result<Box<dyn MapDisplay>, DisplayError>;
}

/// Static presentation configuration for the three style classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub default_style: String,
    pub agent_style: String,
    pub open_style: String,
}

impl Stylesheet {
    /// Full stylesheet text handed to the display on creation.
    pub fn to_css(&self) -> String {
        format!("{}{}{}", self.default_style, self.agent_style, self.open_style)
    }
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            default_style: "node {fill-color: black; size-mode:fit;text-alignment:under; text-size:14;text-color:white;text-background-mode:rounded-box;text-background-color:black;}".to_string(),
            agent_style: "node.agent {fill-color: forestgreen;}".to_string(),
            open_style: "node.open {fill-color: blue;}".to_string(),
        }
    }
}
