use docopt::Docopt;
use error_chain::bail;
use log::{debug, info, trace, LevelFilter};
use serde_derive::Deserialize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use backtracker::{
    cells::{CoordinateSmallVec, GridCoordinate},
    grid::Grid,
    grid_displays::{GridDisplay, PathDisplay, StartEndPointsDisplay},
    pathing,
    run::{NoPause, RunController, RunObserver, RunOutcome, ThreadSleep},
    settings::RunParams,
    topology::Topology,
    units::{Height, Width},
};
use std::{
    cell::RefCell,
    fs::File,
    io,
    io::prelude::*,
    rc::Rc,
};

const USAGE: &str = "Backtracker

Usage:
    backtracker_driver -h | --help
    backtracker_driver [--grid-width=<w>] [--grid-height=<h>] [--hex] [--start-x=<x>] [--start-y=<y>] [--end-x=<x>] [--end-y=<y>] [--fix] [--seed=<n>] [--wait=<s>] [--animate] [--show-path] [--text-out=<path>] [--save-edges=<path>] [-v... | -q]

Options:
    -h --help              Show this screen.
    --grid-width=<w>       The grid width in a w*h grid, 3 to 250 [default: 20].
    --grid-height=<h>      The grid height in a w*h grid, 3 to 250 [default: 20].
    --hex                  Carve a hexagonal grid instead of a rectangular one.
    --start-x=<x>          x coordinate the walk starts from [default: 0].
    --start-y=<y>          y coordinate the walk starts from [default: 0].
    --end-x=<x>            x coordinate of the target. The far corner if not given.
    --end-y=<y>            y coordinate of the target. The far corner if not given.
    --fix                  Pull an out of range size, start or end point back into range instead of failing.
    --seed=<n>             Seed the random walk to get the same maze every time.
    --wait=<s>             Seconds to wait between steps when animating, 0.01 to 1 [default: 0.02].
    --animate              Redraw the maze after every changed cell.
    --show-path            Mark the walk from the start to the target.
    --text-out=<path>      Output file path for a textual rendering of the maze.
    --save-edges=<path>    Serialize the maze to a text file: each line is a pair of numbers. Line 1: n(#vertices) m(#edges). Line 2+ edge between vertices. Uses 1-based vertex indices.
    -v                     Log more, repeat for step by step tracing.
    -q                     Only log errors.
";
#[derive(Debug, Deserialize)]
struct MazeArgs {
    flag_grid_width: usize,
    flag_grid_height: usize,
    flag_hex: bool,
    flag_start_x: isize,
    flag_start_y: isize,
    flag_end_x: Option<isize>,
    flag_end_y: Option<isize>,
    flag_fix: bool,
    flag_seed: Option<u64>,
    flag_wait: f32,
    flag_animate: bool,
    flag_show_path: bool,
    flag_text_out: String,
    flag_save_edges: String,
    flag_v: usize,
    flag_q: bool,
}

mod errors {
    use error_chain::*;
    error_chain! {
        links {
            Backtracker(::backtracker::errors::Error, ::backtracker::errors::ErrorKind);
        }

        foreign_links {
            DocOptFailure(::docopt::Error);
            Logger(::log::SetLoggerError);
            Io(::std::io::Error);
        }
    }
}
use crate::errors::*;

/// Redraws the maze as it is carved and remembers the walk to the target.
struct TerminalObserver {
    animate: bool,
    changed_cells: usize,
    target_trail: Rc<RefCell<Option<Vec<GridCoordinate>>>>,
}

impl RunObserver for TerminalObserver {
    fn on_cell_changed(&mut self, grid: &Grid, coord: GridCoordinate) {
        self.changed_cells += 1;
        trace!("cell {} now open {}", coord, grid.cell(coord).map_or(String::new(), |c| c.openings_key()));
        if self.animate {
            // clear the screen and home the cursor
            print!("\x1B[2J\x1B[H{}", grid);
        }
    }

    fn on_target_first_reached(&mut self, _: &Grid, path: &[GridCoordinate]) {
        info!("Target reached, {} cells from the start", path.len());
        *self.target_trail.borrow_mut() = Some(path.to_vec());
    }

    fn on_run_complete(&mut self, grid: &Grid, outcome: RunOutcome) {
        info!("Run {:?}: {} passages, {} cell changes",
              outcome,
              grid.passages_count(),
              self.changed_cells);
    }
}

fn main() -> Result<()> {

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    TermLogger::init(log_level(&args),
                     Config::default(),
                     TerminalMode::Mixed,
                     ColorChoice::Auto)?;

    let mut params = run_params(&args);
    if args.flag_fix {
        let fixed = params.fixed();
        if fixed != params {
            info!("Fixed run parameters {:?} to {:?}", params, fixed);
        }
        params = fixed;
    }
    params.validate().chain_err(|| "Invalid run parameters, try --fix")?;

    let target_trail = Rc::new(RefCell::new(None));
    let observer = Box::new(TerminalObserver {
        animate: args.flag_animate,
        changed_cells: 0,
        target_trail: Rc::clone(&target_trail),
    });
    let mut controller = match args.flag_seed {
        Some(seed) => RunController::with_seed(observer, seed),
        None => RunController::new(observer),
    };
    controller.set_wait_time(args.flag_wait);

    let handle = controller.start_run(params.grid(), params.start, params.end, |outcome| {
        debug!("Completion callback: {:?}", outcome);
    });
    info!("Generating a {}x{} {:?} maze from {} to {}",
          params.width.0,
          params.height.0,
          params.topology,
          params.start,
          params.end);

    if args.flag_animate {
        controller.run(&mut ThreadSleep);
    } else {
        controller.run(&mut NoPause);
    }
    debug!("Run finished with {:?}", handle.outcome());

    let mut maze_grid = controller.last_grid().cloned().ok_or("Run finished without a grid")?;
    debug!("Perfect maze: {}", pathing::is_perfect_maze(&maze_grid));

    if !args.flag_save_edges.is_empty() {
        save_maze_graph(&maze_grid, &args.flag_save_edges)?;
    }

    let trail = target_trail.borrow_mut().take();
    set_maze_griddisplay(&mut maze_grid, &params, args.flag_show_path, trail)?;

    if args.flag_text_out.is_empty() {
        println!("{}", maze_grid);
    } else {
        write_text_to_file(&format!("{}", maze_grid), &args.flag_text_out)
            .chain_err(|| format!("Failed to write maze to text file {}", args.flag_text_out))?;
    }

    Ok(())
}

fn log_level(maze_args: &MazeArgs) -> LevelFilter {
    if maze_args.flag_q {
        LevelFilter::Error
    } else {
        match maze_args.flag_v {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn run_params(maze_args: &MazeArgs) -> RunParams {
    let far_x = maze_args.flag_grid_width as isize - 1;
    let far_y = maze_args.flag_grid_height as isize - 1;
    RunParams {
        width: Width(maze_args.flag_grid_width),
        height: Height(maze_args.flag_grid_height),
        start: GridCoordinate::new(maze_args.flag_start_x, maze_args.flag_start_y),
        end: GridCoordinate::new(maze_args.flag_end_x.unwrap_or(far_x),
                                 maze_args.flag_end_y.unwrap_or(far_y)),
        topology: if maze_args.flag_hex {
            Topology::Hexagonal
        } else {
            Topology::Rectangular
        },
    }
}

/// Either the walk to the target or just the start and end markers.
/// The trail reported during generation is preferred, the maze is searched if there was none.
fn set_maze_griddisplay(maze_grid: &mut Grid,
                        params: &RunParams,
                        show_path: bool,
                        trail: Option<Vec<GridCoordinate>>)
                        -> Result<()> {

    let distances = pathing::Distances::new(maze_grid, params.start)
        .ok_or("Provided invalid start coordinate from which to show path distances.")?;
    info!("The furthest cells are {} passages from the start", distances.max());

    let path = if show_path {
        trail.or_else(|| pathing::shortest_path(maze_grid, &distances, params.end))
    } else {
        None
    };

    let display: Rc<dyn GridDisplay> = match path {
        Some(path) => Rc::new(PathDisplay::new(&path)),
        None => {
            let start_points: CoordinateSmallVec = [params.start].iter().cloned().collect();
            let end_points: CoordinateSmallVec = [params.end].iter().cloned().collect();
            Rc::new(StartEndPointsDisplay::new(start_points, end_points))
        }
    };
    maze_grid.set_grid_display(Some(display));

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
    let edges_count = maze_grid.passages_count();
    graph_data.push_str(vertices_count.to_string().as_ref());
    graph_data.push(' ');
    graph_data.push_str(edges_count.to_string().as_ref());
    graph_data.push('\n');

    for (src, dst) in maze_grid.iter_links() {
        let (index_a, index_b) = match (maze_grid.grid_coordinate_to_index(src),
                                        maze_grid.grid_coordinate_to_index(dst)) {
            (Some(a), Some(b)) => (a, b),
            _ => bail!("Passage {} -> {} leaves the grid", src, dst),
        };

        graph_data.push_str((index_a + 1).to_string().as_ref());
        graph_data.push(' ');
        graph_data.push_str((index_b + 1).to_string().as_ref());
        graph_data.push('\n');
    }

    write_text_to_file(&graph_data, file_path)
        .chain_err(|| format!("Failed to write maze graph to text file {}", file_path))?;

    Ok(())
}
