use docopt::Docopt;
use mazes::{
    cells::Cartesian2DCoordinate,
    events::MazeEvent,
    generators::{GeneratorConfig, GeneratorConfigBuilder, RecursiveBacktracker},
    grid::Grid,
    pathing,
    renderers::{EventStatsCollector, MazeEventSink, TextRenderer},
    units::{Height, Width},
};
use serde_derive::Deserialize;
use std::{
    fs::File,
    io,
    io::prelude::*,
};

const USAGE: &str = "Backtracking mazes

Usage:
    mazes_driver -h | --help
    mazes_driver [(--grid-size=<n>|[--grid-width=<w> --grid-height=<h>])] [--seed=<s>] [--force-exit] [--mark-start-end] [--events] [--text-out=<path>] [--save-edges=<path>]

Options:
    -h --help              Show this screen.
    --grid-size=<n>        The grid size is n * n.
    --grid-width=<w>       The grid width in a w*h grid [default: 20].
    --grid-height=<h>      The grid height in a w*h grid [default: 20].
    --seed=<s>             Seed the random number generator for a reproducible maze.
    --force-exit           Carve into the bottom right corner as soon as the walk passes beside it.
    --mark-start-end       Draw an 'S' at the top left start and an 'E' at the bottom right corner.
    --events               Print every generation event as a line of JSON instead of the maze.
    --text-out=<path>      Output file path for a textual rendering of a maze.
    --save-edges=<path>    Serialize the maze to a text file: each line is a pair of numbers. Line 1: n(#vertices) m(#edges). Line 2+ edge between vertices. Uses 1-based vertex indices.
";
#[derive(Debug, Deserialize)]
struct MazeArgs {
    flag_grid_size: Option<usize>,
    flag_grid_width: usize,
    flag_grid_height: usize,
    flag_seed: Option<u64>,
    flag_force_exit: bool,
    flag_mark_start_end: bool,
    flag_events: bool,
    flag_text_out: String,
    flag_save_edges: String,
}

mod errors {
    use error_chain::*;
    error_chain! {

        foreign_links {
            DocOptFailure(::docopt::Error);
            Io(::std::io::Error);
            Json(::serde_json::Error);
            Grid(::mazes::grid::GridError);
        }
    }
}
use crate::errors::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env()
                             .add_directive(tracing::Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    if let Err(ref e) = run() {
        tracing::error!("{}", e);
        for cause in e.iter().skip(1) {
            tracing::error!("caused by: {}", cause);
        }
        ::std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;
    let config = config_from_args(&args);

    tracing::info!(width = config.width,
                   height = config.height,
                   seed = ?config.random_seed,
                   force_exit = config.force_exit,
                   "generating maze");

    let mut generator = RecursiveBacktracker::from_config(&config)?;
    let (width, height) = (Width(config.width), Height(config.height));
    let (start, end) = if args.flag_mark_start_end {
        (Some(Cartesian2DCoordinate::new(0, 0)),
         Some(Cartesian2DCoordinate::new(config.width as u32 - 1, config.height as u32 - 1)))
    } else {
        (None, None)
    };
    let mut renderer = TextRenderer::new(width, height)?.mark_start_end(start, end);
    let mut stats = EventStatsCollector::new();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in generator.by_ref() {
        if args.flag_events {
            write_event(&mut out, &event)?;
        }
        renderer.consume(&event);
        stats.consume(&event);
    }

    let maze_grid = generator.into_grid();
    tracing::info!(stats = ?stats.stats(),
                   perfect = pathing::is_perfect_maze(&maze_grid),
                   "maze generated");
    log_solution(&maze_grid);

    if !args.flag_events {
        if args.flag_text_out.is_empty() {
            write!(out, "{}", renderer)?;
        } else {
            write_text_to_file(&renderer.to_string(), &args.flag_text_out)
                .chain_err(|| format!("Failed to write maze to text file {}", args.flag_text_out))?;
        }
    }

    if !args.flag_save_edges.is_empty() {
        save_maze_graph(&maze_grid, &args.flag_save_edges)?;
    }

    Ok(())
}

fn log_solution(maze_grid: &Grid) {
    let start = Cartesian2DCoordinate::new(0, 0);
    let exit = Cartesian2DCoordinate::new(maze_grid.width().0 as u32 - 1,
                                          maze_grid.height().0 as u32 - 1);
    if let Some(distances) = pathing::Distances::new(maze_grid, start) {
        let solution_steps = pathing::shortest_path(maze_grid, &distances, exit)
            .map(|path| path.len() - 1);
        tracing::info!(?solution_steps,
                       furthest = ?distances.furthest_points_on_grid(),
                       furthest_distance = distances.max(),
                       "start to exit");
    }
}

fn config_from_args(args: &MazeArgs) -> GeneratorConfig {
    let (width, height) = if let Some(square_grid_size) = args.flag_grid_size {
        (square_grid_size, square_grid_size)
    } else {
        (args.flag_grid_width, args.flag_grid_height)
    };

    GeneratorConfigBuilder::new()
        .width(width)
        .height(height)
        .random_seed(args.flag_seed)
        .force_exit(args.flag_force_exit)
        .build()
}

fn write_event<W: Write>(out: &mut W, event: &MazeEvent) -> Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn write_text_to_file(data: &str, file_name: &str) -> io::Result<()> {
    let mut f = File::create(file_name)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}

fn save_maze_graph(maze_grid: &Grid, file_path: &str) -> Result<()> {

    let mut graph_data = String::new();
    let vertices_count = maze_grid.size();
    let edges_count = maze_grid.links_count();
    graph_data.push_str(vertices_count.to_string().as_ref());
    graph_data.push(' ');
    graph_data.push_str(edges_count.to_string().as_ref());
    graph_data.push('\n');

    for (src, dst) in maze_grid.iter_links() {
        let index_a = maze_grid
            .grid_coordinate_to_index(src)
            .ok_or("Links iter gave an invalid coordinate")?;
        let index_b = maze_grid
            .grid_coordinate_to_index(dst)
            .ok_or("Links iter gave an invalid coordinate")?;
        let src_as_1_based_index = index_a + 1;
        let dst_as_1_based_index = index_b + 1;

        graph_data.push_str(src_as_1_based_index.to_string().as_ref());
        graph_data.push(' ');
        graph_data.push_str(dst_as_1_based_index.to_string().as_ref());
        graph_data.push('\n');
    }

    write_text_to_file(&graph_data, file_path)
        .chain_err(|| format!("Failed to write maze graph to text file {}", file_path))?;

    Ok(())
}
