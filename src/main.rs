use agentmap::display::{spawn_renderer, ChannelDisplayFactory};
use agentmap::graph::{find_centroids, shortest_path, MapAttribute, MapGraph, TopologyAnalysis};
use agentmap::migration::{freeze, thaw, MapSnapshot};
use agentmap::Config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "agentmap")]
#[command(about = "Inspect the map snapshot an agent carries across a migration")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Node, edge and attribute counts
    Stats { snapshot: PathBuf },
    /// Moves needed to go from one node to another
    Path {
        snapshot: PathBuf,
        from: String,
        to: String,
    },
    /// Nodes of minimum eccentricity
    Centroids { snapshot: PathBuf },
    /// Open nodes and their distance from the agent
    Frontier { snapshot: PathBuf },
    /// Thaw with a display attached, freeze again and print the new snapshot
    Replay { snapshot: PathBuf },
    /// Print the snapshot of a new, empty map named from the config
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_or_default()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.logging.log_level.as_str())
    ).init();

    let args = Args::parse();

    match args.command {
        Command::Stats { snapshot } => run_stats(&load_map(&config, &snapshot)?),
        Command::Path { snapshot, from, to } => {
            run_path(&load_map(&config, &snapshot)?, &from, &to)?
        }
        Command::Centroids { snapshot } => run_centroids(&load_map(&config, &snapshot)?),
        Command::Frontier { snapshot } => run_frontier(&load_map(&config, &snapshot)?)?,
        Command::Replay { snapshot } => run_replay(&config, &snapshot).await?,
        Command::Init => println!("{}", freeze(config.new_map()).to_json()?),
    }

    Ok(())
}

fn read_snapshot(config: &Config, path: &Path) -> Result<MapSnapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let mut snapshot = MapSnapshot::from_json(&json)
        .with_context(|| format!("Failed to decode snapshot: {}", path.display()))?;
    config.name_snapshot(&mut snapshot);
    Ok(snapshot)
}

fn load_map(config: &Config, path: &Path) -> Result<MapGraph> {
    Ok(thaw(read_snapshot(config, path)?, None)?)
}

fn run_stats(map: &MapGraph) {
    println!("\n=== Map '{}' ===\n", map.name());
    println!("{:<12} {:>8}", "Nodes", map.node_count());
    println!("{:<12} {:>8}", "Edges", map.edge_count());
    for attribute in [MapAttribute::Agent, MapAttribute::Open, MapAttribute::None] {
        println!("{:<12} {:>8}", attribute.to_string(), map.nodes_with(attribute).len());
    }

    let busiest = map
        .node_ids()
        .into_iter()
        .filter_map(|id| map.degree(&id).ok().map(|d| (id, d)))
        .max_by_key(|(_, d)| *d);
    if let Some((id, degree)) = busiest {
        println!("{:<12} {:>8} ({})", "Max degree", degree, id);
    }
}

fn run_path(map: &MapGraph, from: &str, to: &str) -> Result<()> {
    match shortest_path(map, from, to)? {
        None => println!("No path from {} to {}", from, to),
        Some(moves) if moves.is_empty() => println!("Already at {}", to),
        Some(moves) => println!("{} move(s): {}", moves.len(), moves.join(" -> ")),
    }
    Ok(())
}

fn run_centroids(map: &MapGraph) {
    let mut analysis = TopologyAnalysis::new();
    analysis.compute_centroids(map);
    for id in analysis.centroids() {
        let eccentricity = analysis.eccentricity(&id).unwrap_or(0);
        println!("{} (eccentricity {})", id, eccentricity);
    }
}

fn run_frontier(map: &MapGraph) -> Result<()> {
    let agent = map.nodes_with(MapAttribute::Agent).into_iter().next();
    let open = map.nodes_with(MapAttribute::Open);
    if open.is_empty() {
        println!("No open nodes left; centroids: {}", find_centroids(map).join(", "));
        return Ok(());
    }

    for id in open {
        let moves = match &agent {
            Some(position) => shortest_path(map, position, &id)?
                .map(|p| p.len().to_string())
                .unwrap_or_else(|| "unreachable".to_string()),
            None => "-".to_string(),
        };
        println!("{:<20} {:>12}", id, moves);
    }
    Ok(())
}

async fn run_replay(config: &Config, path: &Path) -> Result<()> {
    let snapshot = read_snapshot(config, path)?;

    if !config.display.enabled {
        let map = thaw(snapshot, None)?;
        println!("{}", freeze(map).to_json()?);
        return Ok(());
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let renderer = spawn_renderer(rx);
    let factory = ChannelDisplayFactory::new(tx, config.stylesheet());

    let map = thaw(snapshot, Some(&factory))?;
    let refrozen = freeze(map);
    drop(factory);

    let mirror = renderer.await.context("display renderer task failed")?;
    log::info!(
        "Renderer saw {} nodes and {} edges",
        mirror.node_count(),
        mirror.edge_count()
    );

    println!("{}", refrozen.to_json()?);
    Ok(())
}
