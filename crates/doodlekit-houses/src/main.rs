//! Render the house-location puzzle.
//!
//! `houses [OUT.svg]` writes the static SVG document to OUT.svg or stdout.
//! `houses --json` writes the frame and batch stream a remote renderer would
//! receive, one JSON value per line.

use std::io::Write;

use anyhow::Context;
use doodlekit::protocol::{JsonSink, StaticSvgSink};
use doodlekit_houses::{Houses, new_surface};
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let houses = Houses::default();
    let arg = std::env::args().nth(1);

    if arg.as_deref() == Some("--json") {
        let mut surface = new_surface(JsonSink::new(std::io::stdout().lock()))?;
        houses.redraw(&mut surface)?;
        info!(batches = surface.batch_sequence(), "streamed");
        return Ok(());
    }

    let mut surface = new_surface(StaticSvgSink::new())?;
    houses.redraw(&mut surface)?;
    let svg = surface.sink().export();
    match arg {
        Some(path) => {
            std::fs::write(&path, &svg).with_context(|| format!("writing {path}"))?;
            info!(path = path.as_str(), elements = surface.sink().scene().len(), "wrote svg");
        }
        None => std::io::stdout()
            .write_all(svg.as_bytes())
            .context("writing svg to stdout")?,
    }
    Ok(())
}
