//! Display that forwards model changes over a channel to a renderer running
//! on another task or thread.

use std::collections::BTreeMap;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::{DisplayFactory, MapDisplay, MapEvent, Stylesheet};
use crate::error::DisplayError;
use crate::graph::{EdgeId, MapGraph, NodeId, StyleClass};

/// Message received by a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMessage {
    /// A display was created for a (new) graph. Previous state is stale.
    Opened { graph_name: String, stylesheet: String },
    Event(MapEvent),
    Closed,
}

/// Sending half of a channel display. Sends never block.
pub struct ChannelDisplay {
    tx: Option<UnboundedSender<DisplayMessage>>,
}

impl MapDisplay for ChannelDisplay {
    fn notify(&mut self, event: &MapEvent) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        if tx.send(DisplayMessage::Event(event.clone())).is_err() {
            // Renderer went away on its own; later events have nowhere to go.
            log::debug!("display renderer gone, dropping event {:?}", event);
            self.tx = None;
        }
    }

    fn teardown(&mut self) -> Result<(), DisplayError> {
        let tx = self.tx.take().ok_or(DisplayError::Closed)?;
        tx.send(DisplayMessage::Closed).map_err(|_| DisplayError::Closed)
    }
}

/// Creates [`ChannelDisplay`]s that all feed the same renderer.
#[derive(Clone)]
pub struct ChannelDisplayFactory {
    tx: UnboundedSender<DisplayMessage>,
    stylesheet: Stylesheet,
}

impl ChannelDisplayFactory {
    pub fn new(tx: UnboundedSender<DisplayMessage>, stylesheet: Stylesheet) -> Self {
        Self { tx, stylesheet }
    }
}

impl DisplayFactory for ChannelDisplayFactory {
    fn create_display(&self, graph: &MapGraph) -> Result<Box<dyn MapDisplay>, DisplayError> {
        self.tx
            .send(DisplayMessage::Opened {
                graph_name: graph.name().to_string(),
                stylesheet: self.stylesheet.to_css(),
            })
            .map_err(|_| DisplayError::Unavailable("renderer channel closed".to_string()))?;

        Ok(Box::new(ChannelDisplay {
            tx: Some(self.tx.clone()),
        }))
    }
}

/// Renderer-side view of the graph, rebuilt from display messages.
#[derive(Debug, Default, Clone)]
pub struct DisplayMirror {
    graph_name: Option<String>,
    stylesheet: Option<String>,
    classes: BTreeMap<NodeId, StyleClass>,
    edges: BTreeMap<EdgeId, (NodeId, NodeId)>,
    open: bool,
    opened_count: usize,
}

impl DisplayMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one message into the view.
    pub fn apply(&mut self, message: DisplayMessage) {
        match message {
            DisplayMessage::Opened { graph_name, stylesheet } => {
                self.graph_name = Some(graph_name);
                self.stylesheet = Some(stylesheet);
                self.classes.clear();
                self.edges.clear();
                self.open = true;
                self.opened_count += 1;
            }
            DisplayMessage::Event(MapEvent::NodeUpserted { id, class }) => {
                self.classes.insert(id, class);
            }
            DisplayMessage::Event(MapEvent::EdgeAdded { id, a, b }) => {
                self.edges.insert(id, (a, b));
            }
            DisplayMessage::Closed => {
                self.open = false;
            }
        }
    }

    pub fn graph_name(&self) -> Option<&str> {
        self.graph_name.as_deref()
    }

    pub fn stylesheet(&self) -> Option<&str> {
        self.stylesheet.as_deref()
    }

    pub fn class_of(&self, id: &str) -> Option<StyleClass> {
        self.classes.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.classes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// How many displays were opened on this renderer (one per graph lifetime).
    pub fn opened_count(&self) -> usize {
        self.opened_count
    }
}

/// Run a renderer task that mirrors every display fed by `rx`.
///
/// The task ends once every sender (factories and displays) is dropped and
/// returns the final mirror.
pub fn spawn_renderer(mut rx: UnboundedReceiver<DisplayMessage>) -> JoinHandle<DisplayMirror> {
    tokio::spawn(async move {
        let mut mirror = DisplayMirror::new();
        while let Some(message) = rx.recv().await {
            match &message {
                DisplayMessage::Opened { graph_name, .. } => {
                    log::info!("display opened for graph '{}'", graph_name);
                }
                DisplayMessage::Closed => {
                    log::info!(
                        "display closed ({} nodes, {} edges shown)",
                        mirror.node_count(),
                        mirror.edge_count()
                    );
                }
                DisplayMessage::Event(_) => {}
            }
            mirror.apply(message);
        }
        mirror
    })
}
