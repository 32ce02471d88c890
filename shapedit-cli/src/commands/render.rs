//! `shapedit render`: draws the map to a PNG, waiting for the basemap.

use std::path::PathBuf;

use clap::Args;
use shapedit::session::{Action, BasemapStatus, Notice};
use shapedit::style::Colormap;
use tracing::warn;

use crate::commands::common::log_target;
use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Shapefile to render
    pub file: PathBuf,

    /// PNG file to write
    #[arg(long, short)]
    pub output: PathBuf,

    /// Colormap: viridis, plasma, coolwarm, Reds, Blues, Greens or Set1
    #[arg(long)]
    pub colormap: Option<Colormap>,

    /// Column that drives the fill colour ("none" for a single colour)
    #[arg(long)]
    pub column: Option<String>,

    /// Fill opacity percent (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub opacity: Option<u8>,

    /// Zoom in percent of the fitted view (10-300)
    #[arg(long, value_parser = clap::value_parser!(u16).range(10..=300))]
    pub zoom: Option<u16>,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Skip downloading basemap imagery
    #[arg(long)]
    pub no_basemap: bool,
}

pub fn run(args: RenderArgs, verbose: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(log_target(verbose))?;
    runner.log_startup("render");

    let size = match (args.width, args.height) {
        (None, None) => None,
        (width, height) => Some((
            width.unwrap_or(runner.config().render.width),
            height.unwrap_or(runner.config().render.height),
        )),
    };
    let mut session = runner.session(size, !args.no_basemap)?;
    runner.open(&mut session, &args.file)?;

    if let Some(colormap) = args.colormap {
        session.dispatch(Action::SetColormap(colormap))?;
    }
    if let Some(column) = args.column {
        let column = (!column.eq_ignore_ascii_case("none")).then_some(column);
        session.dispatch(Action::SetColorColumn(column))?;
    }
    if let Some(opacity) = args.opacity {
        session.dispatch(Action::SetTransparency(opacity))?;
    }
    if let Some(zoom) = args.zoom {
        session.dispatch(Action::SetZoomPercent(zoom))?;
    }

    if *session.basemap_status() == BasemapStatus::Loading {
        println!("Fetching basemap tiles...");
        if let Some(Notice::Error { title, message }) =
            runner.runtime().block_on(session.wait_for_basemap())
        {
            warn!(%message, "Rendering without basemap");
            eprintln!("Warning: {}: {}", title, message);
            eprintln!("Rendering features without the basemap.");
        }
    }

    let outcome = session.dispatch(Action::ExportImage(args.output))?;
    println!("{}", outcome);
    Ok(())
}
