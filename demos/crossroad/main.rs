//! Crossroad schematization demo: prints the schematic map of a crossroad as
//! JSON.
//!
//! Usage:
//! ```text
//! cargo run --example crossroad                                   # built-in T junction
//! cargo run --example crossroad -- graph.json table.json          # loaded inputs
//! cargo run --example crossroad -- graph.json table.json cfg.json # with configuration
//! ```

use std::error::Error;
use std::fs;

use crossroad_schematic::graph::{
    DescriptionEntry, DescriptionTable, EdgeTags, EntryKind, NodeData, NodeTags, RoadGraph,
};
use crossroad_schematic::{CrossroadSchematization, SchematizationConfig};

/// T junction: "Main Street" crosses from west to east, "Station Road"
/// leaves northwards through a zebra crossing.
fn sample_crossroad() -> Result<(RoadGraph, DescriptionTable), Box<dyn Error>> {
    let mut graph = RoadGraph::new();
    graph.add_node(NodeData::new(1, 0.0, 0.0));
    graph.add_node(NodeData::new(2, 25.0, 0.5));
    graph.add_node(NodeData::new(3, 70.0, 2.0));
    graph.add_node(NodeData::new(4, -25.0, -0.5));
    graph.add_node(NodeData::new(5, -70.0, -1.0));
    graph.add_node(
        NodeData::new(6, 0.5, 15.0).with_tags(NodeTags {
            crossing: Some("zebra".to_owned()),
            ..NodeTags::default()
        }),
    );
    graph.add_node(NodeData::new(7, 2.0, 60.0));

    let main = EdgeTags::highway("secondary").named("Main Street");
    let station = EdgeTags::highway("residential").named("Station Road");
    graph.add_edge(1, 2, main.clone())?;
    graph.add_edge(2, 3, main.clone())?;
    graph.add_edge(1, 4, main.clone())?;
    graph.add_edge(4, 5, main)?;
    graph.add_edge(1, 6, station.clone())?;
    graph.add_edge(6, 7, station)?;

    let table = DescriptionTable::from_entries([
        DescriptionEntry::edge(EntryKind::Branch, 1, 2)
            .named("east")
            .sidewalks(Some(1), Some(3)),
        DescriptionEntry::edge(EntryKind::Branch, 1, 6)
            .named("north")
            .sidewalks(Some(2), Some(1)),
        DescriptionEntry::edge(EntryKind::Branch, 1, 4)
            .named("west")
            .sidewalks(Some(3), Some(2)),
    ])?;
    Ok((graph, table))
}

fn main() -> Result<(), Box<dyn Error>> {
    // Default: WARN for everything, INFO for the crate.
    // Override with RUST_LOG env var (e.g. RUST_LOG=crossroad_schematic=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("crossroad_schematic=info".parse().unwrap_or_default());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (graph, table) = match args.as_slice() {
        [graph, table, ..] => (
            RoadGraph::from_json(&fs::read_to_string(graph)?)?,
            DescriptionTable::from_json(&fs::read_to_string(table)?)?,
        ),
        _ => sample_crossroad()?,
    };
    let config = match args.get(2) {
        Some(path) => SchematizationConfig::from_json(&fs::read_to_string(path)?)?,
        None => SchematizationConfig::default(),
    };

    let schematization = CrossroadSchematization::new(config).execute(graph, &table)?;
    println!("{}", schematization.to_json()?);
    Ok(())
}
