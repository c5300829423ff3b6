pub mod config;
pub mod error;
pub mod graph;
pub mod display;
pub mod migration;

pub use config::Config;
pub use error::{AgentMapError, DisplayError, Result};
pub use graph::{MapAttribute, MapGraph, NodeId, TopologyAnalysis, shortest_path};
pub use migration::{MapSnapshot, freeze, thaw};
