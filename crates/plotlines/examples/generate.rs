//! Grow a seeded story graph, lay it out and print the SVG.
//!
//! ```text
//! cargo run -p plotlines --example generate > story.svg
//! ```

use plotlines::{
    PlotBuilder,
    config::{AppConfig, GraphConfig, LayoutConfig, StyleConfig},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::new(
        GraphConfig::new(60, 4, 3, 10).with_seed(42),
        LayoutConfig::new(800.0, 600.0),
        StyleConfig::default(),
    );
    let builder = PlotBuilder::new(config);

    let mut board = builder.generate();
    let layout = builder.layout(&mut board)?;
    eprintln!(
        "{} nodes, {} edges in {} zones",
        board.graph().node_count(),
        board.graph().edge_count(),
        layout.zones().len()
    );

    println!("{}", builder.render_svg(&board)?);
    Ok(())
}
