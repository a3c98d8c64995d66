mod app;
mod interaction;
mod layout;
mod model;
mod nav;
mod prefs;
mod render;
mod sim;
mod source;
mod util;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::layout::{BatchLayout, LayoutConfig};
use crate::model::GraphIndex;
use crate::nav::{Location, Route};
use crate::prefs::PreferenceStore;
use crate::render::{RadiusScale, Scene, render_svg, write_svg};
use crate::source::GraphSource;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Read the graph from a JSON file instead of the dashboard API.
    #[arg(long, value_name = "FILE")]
    graph: Option<PathBuf>,

    /// Dashboard base URL serving `/api/graph`.
    #[arg(long, default_value = "http://localhost:3000")]
    api: String,

    /// Initial route, e.g. `#graph`, `#scenarios`, `#live`, `#entities/<id>?period=4w`.
    #[arg(long, default_value = "#graph")]
    view: Location,

    /// Where the watchlist and reporting period are kept between runs.
    #[arg(long, value_name = "FILE")]
    prefs: Option<PathBuf>,

    /// Seed for the live map's initial scatter.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Lay the graph out and write it as SVG (`-` for stdout) instead of
    /// opening a window.
    #[arg(long, value_name = "FILE")]
    export_svg: Option<PathBuf>,
}

impl Args {
    fn source(&self) -> GraphSource {
        match &self.graph {
            Some(path) => GraphSource::File(path.clone()),
            None => GraphSource::Api(self.api.clone()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = args.source();

    if let Some(output) = &args.export_svg {
        return export_svg(&source, &args.view.route, output);
    }

    let prefs = match &args.prefs {
        Some(path) => PreferenceStore::open(path),
        None => PreferenceStore::in_memory(),
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let start = args.view.clone();
    let seed = args.seed;
    eframe::run_native(
        "entity-map",
        options,
        Box::new(move |cc| Ok(Box::new(app::EntityMapApp::new(cc, source, prefs, start, seed)))),
    )
    .map_err(|error| anyhow!("window closed with an error: {error}"))
}

fn export_svg(source: &GraphSource, route: &Route, output: &Path) -> Result<()> {
    let data = source.load().with_context(|| format!("loading graph from {source}"))?;

    let (graph, config, canvas, scale) = match route {
        Route::Graph | Route::Entity(_) => (
            GraphIndex::new(&data),
            LayoutConfig::knowledge_graph(),
            LayoutConfig::KNOWLEDGE_CANVAS,
            RadiusScale::KNOWLEDGE_GRAPH,
        ),
        Route::Scenarios => (
            GraphIndex::new(&data.scenario_subgraph()),
            LayoutConfig::scenario_map(),
            LayoutConfig::SCENARIO_CANVAS,
            RadiusScale::SCENARIO_MAP,
        ),
        Route::Live => bail!("the live map is animated and cannot be exported; use #graph or #scenarios"),
    };

    let positions = BatchLayout::new(config).run(&graph, canvas);
    let mut scene = Scene::build(&graph, &positions, scale, canvas);
    if let Route::Entity(id) = route {
        scene.set_selected(graph.index_of(id));
    }

    let svg = render_svg(&scene);
    let target = (output != Path::new("-")).then_some(output);
    write_svg(&svg, target)?;
    info!(nodes = graph.len(), edges = graph.edges().len(), "svg exported");
    Ok(())
}
