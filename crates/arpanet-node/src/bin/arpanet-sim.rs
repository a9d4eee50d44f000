//! ARPANET routing simulator
//!
//! Builds the historical map, lets the tables converge, optionally silences
//! one node, and prints what the observer node ends up with.

use arpanet_node::{
    spawn_scheduler, DriveMode, EventCounts, LockstepNetwork, Network, NetworkConfig, Topology,
};
use arpanet_routing::TableSnapshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arpanet_sim=info,arpanet_node=info,arpanet_routing=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = NetworkConfig::from_env()?;
    let topology = Topology::arpanet();
    if !topology.contains(config.observer.as_str()) {
        return Err(format!("observer {} is not on the map", config.observer).into());
    }

    println!("ARPANET Routing Simulator");
    println!("=========================");
    println!();
    println!("  Nodes: {}", topology.len());
    println!("  Diameter: {}", topology.diameter());
    println!("  Stale threshold: {}", config.routing.stale_threshold);
    println!("  Mode: {:?}", config.mode);
    println!();

    let (snapshot, counts, rounds) = match config.mode {
        DriveMode::Lockstep => run_lockstep(topology, &config)?,
        DriveMode::Actors => run_actors(topology, &config).await?,
    };

    println!("Routing table of {} after {} rounds:", snapshot.node, rounds);
    print_table(&snapshot);
    println!();
    println!("Events:");
    println!("  Advertisements: {}", counts.advertisements);
    println!("  Route changes: {}", counts.route_changes);
    println!("  Stale neighbors: {}", counts.stale_neighbors);
    println!("  Table wipes: {}", counts.wipes);
    println!("  Dropped messages: {}", counts.dropped);

    Ok(())
}

fn run_lockstep(
    topology: Topology,
    config: &NetworkConfig,
) -> Result<(TableSnapshot, EventCounts, u64), Box<dyn std::error::Error>> {
    let mut net = LockstepNetwork::new(topology, config.routing)?;
    net.run(config.rounds);

    if let Some(node) = &config.silence {
        println!("Silencing {} after round {}", node, net.round());
        net.silence(node.as_str())?;
        net.run(config.rounds);
    }

    let snapshot = net.table(config.observer.as_str())?.snapshot();
    Ok((snapshot, EventCounts::tally(net.events()), net.round()))
}

async fn run_actors(
    topology: Topology,
    config: &NetworkConfig,
) -> Result<(TableSnapshot, EventCounts, u64), Box<dyn std::error::Error>> {
    let net = Network::spawn(topology, config.routing, config.inbox_capacity)?;
    let mut net = spawn_scheduler(net, config.round_interval, config.rounds).await??;

    if let Some(node) = &config.silence {
        println!("Silencing {} after round {}", node, net.round());
        net.silence(node.as_str()).await?;
        net = spawn_scheduler(net, config.round_interval, config.rounds).await??;
    }

    let snapshot = net.snapshot(config.observer.as_str()).await?;
    let counts = EventCounts::tally(&net.drain_events());
    let rounds = net.round();
    net.shutdown().await?;
    Ok((snapshot, counts, rounds))
}

fn print_table(snapshot: &TableSnapshot) {
    let mut routes = snapshot.routes.clone();
    routes.sort_by(|a, b| {
        (a.hop_count, &a.next_hop, &a.destination).cmp(&(b.hop_count, &b.next_hop, &b.destination))
    });

    println!("  {:<8} {:>5}  {}", "DEST", "HOPS", "VIA");
    for route in routes {
        let via = route.next_hop.as_ref().map_or("-", |n| n.as_str());
        println!("  {:<8} {:>5}  {}", route.destination, route.hop_count.to_string(), via);
    }
}
