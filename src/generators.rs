use bit_set::BitSet;
use log::{debug, trace};
use rand::Rng;
use rand_xorshift::XorShiftRng;
use smallvec::SmallVec;

use crate::cells::{Direction, DirectionSmallVec, GridCoordinate};
use crate::grid::Grid;
use crate::units::StepsCount;

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GeneratorState {
    Running,
    Completed,
    Cancelled,
}

/// What a single generation step did.
#[derive(Eq, PartialEq, Clone, Debug)]
pub enum StepEvent {
    /// A passage was carved from the frontier cell into a new cell, which is the new frontier.
    Carved {
        from: GridCoordinate,
        to: GridCoordinate,
        direction: Direction,
    },
    /// The frontier had nowhere left to go and was popped off the path.
    /// `resumed` is the cell the walk continues from.
    Backtracked {
        popped: GridCoordinate,
        resumed: GridCoordinate,
    },
    /// The walk backed up to the start cell with nothing left to carve.
    Completed,
    /// Stepping a generator that is no longer running does nothing.
    Halted,
}

impl StepEvent {
    /// The cells whose state this step touched, in the order they changed.
    pub fn changed_cells(&self) -> SmallVec<[GridCoordinate; 2]> {
        let mut changed = SmallVec::new();
        match *self {
            StepEvent::Carved { from, to, .. } => {
                changed.push(from);
                changed.push(to);
            }
            StepEvent::Backtracked { popped, .. } => changed.push(popped),
            StepEvent::Completed | StepEvent::Halted => {}
        }
        changed
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub struct StepOutcome {
    pub event: StepEvent,
    /// The start to target walk, present only on the step that first reached the target.
    pub target_path: Option<Vec<GridCoordinate>>,
}

impl StepOutcome {
    fn halted() -> StepOutcome {
        StepOutcome {
            event: StepEvent::Halted,
            target_path: None,
        }
    }
}

/// Randomised depth first maze generation, one carve or backtrack per `step`.
///
/// The walk keeps the current path from the start cell to the frontier. Each step picks a
/// random direction the frontier has not already carved out along that leads to a cell inside
/// the grid that has never been visited, carves a passage there and makes that cell the new
/// frontier. With no such direction the frontier is popped. Once the walk is back at the start
/// with no options left, every cell reachable from the start is joined into one spanning tree.
///
/// Reaching the target does not stop generation, it is only reported, once.
pub struct RecursiveBacktracker<R: Rng = XorShiftRng> {
    grid: Grid,
    path: Vec<GridCoordinate>,
    visited: BitSet,
    target: GridCoordinate,
    target_reached: bool,
    pending_target_path: Option<Vec<GridCoordinate>>,
    state: GeneratorState,
    steps: StepsCount,
    rng: R,
}

impl<R: Rng> RecursiveBacktracker<R> {
    /// Panics if `start` is not inside the grid, callers validate coordinates up front.
    pub fn new(grid: Grid,
               start: GridCoordinate,
               target: GridCoordinate,
               rng: R)
               -> RecursiveBacktracker<R> {
        let start_index = match grid.grid_coordinate_to_index(start) {
            Some(index) => index,
            None => panic!("start {} is outside the {:?}", start, grid),
        };

        let mut visited = BitSet::with_capacity(grid.size());
        visited.insert(start_index);

        // Starting on the target reaches it straight away.
        let pending_target_path = if start == target {
            Some(vec![start])
        } else {
            None
        };

        let mut path = Vec::with_capacity(grid.size());
        path.push(start);

        debug!("Backtracker created on {:?}, start {}, target {}", grid, start, target);

        RecursiveBacktracker {
            grid,
            path,
            visited,
            target,
            target_reached: pending_target_path.is_some(),
            pending_target_path,
            state: GeneratorState::Running,
            steps: StepsCount(0),
            rng,
        }
    }

    #[inline]
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// The walk from the start cell to the current frontier.
    #[inline]
    pub fn path(&self) -> &[GridCoordinate] {
        &self.path
    }

    #[inline]
    pub fn target(&self) -> GridCoordinate {
        self.target
    }

    #[inline]
    pub fn steps(&self) -> StepsCount {
        self.steps
    }

    #[inline]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, coord: GridCoordinate) -> bool {
        self.grid
            .grid_coordinate_to_index(coord)
            .map_or(false, |index| self.visited.contains(index))
    }

    /// Stop a running generator. Returns false if it had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.state == GeneratorState::Running {
            debug!("Backtracker cancelled after {} steps", self.steps.0);
            self.state = GeneratorState::Cancelled;
            true
        } else {
            false
        }
    }

    /// Carve one passage, backtrack one cell or finish.
    pub fn step(&mut self) -> StepOutcome {
        if self.state != GeneratorState::Running {
            return StepOutcome::halted();
        }

        let current = match self.path.last() {
            Some(coord) => *coord,
            None => {
                self.state = GeneratorState::Completed;
                return StepOutcome::halted();
            }
        };

        self.steps.0 += 1;
        let mut target_path = self.pending_target_path.take();

        let candidates = self.carve_candidates(current);

        if candidates.is_empty() {
            if self.path.len() == 1 {
                debug!("Backtracker completed in {} steps, {} cells visited",
                       self.steps.0,
                       self.visited.len());
                self.state = GeneratorState::Completed;
                return StepOutcome {
                    event: StepEvent::Completed,
                    target_path,
                };
            }

            let _ = self.path.pop();
            let resumed = self.path[self.path.len() - 1];
            trace!("backtrack {} -> {}", current, resumed);
            return StepOutcome {
                event: StepEvent::Backtracked {
                    popped: current,
                    resumed,
                },
                target_path,
            };
        }

        let direction = candidates[self.rng.gen_range(0..candidates.len())];
        let next = self.grid
            .link(current, direction)
            .expect("carve candidates always lead to a cell inside the grid");

        self.path.push(next);
        if let Some(index) = self.grid.grid_coordinate_to_index(next) {
            self.visited.insert(index);
        }
        trace!("carve {} {} -> {}", current, direction, next);

        if next == self.target && !self.target_reached {
            debug!("Target {} reached after {} steps", next, self.steps.0);
            self.target_reached = true;
            target_path = Some(self.path.clone());
        }

        StepOutcome {
            event: StepEvent::Carved {
                from: current,
                to: next,
                direction,
            },
            target_path,
        }
    }

    /// Directions from `current` not carved out before that lead to an unvisited cell in the grid.
    fn carve_candidates(&self, current: GridCoordinate) -> DirectionSmallVec {
        let untried = match self.grid.cell(current) {
            Some(cell) => cell.carved_out().complement(),
            None => DirectionSmallVec::new(),
        };

        untried.into_iter()
            .filter(|dir| {
                self.grid
                    .neighbour_at_direction(current, *dir)
                    .map_or(false, |neighbour| !self.is_visited(neighbour))
            })
            .collect()
    }
}

/// Run the backtracker over a whole grid in one go, no pacing, no target.
/// Returns the carved grid and the number of steps taken.
pub fn recursive_backtracker<R: Rng>(grid: Grid,
                                     start: GridCoordinate,
                                     rng: R)
                                     -> (Grid, StepsCount) {
    let mut generator = RecursiveBacktracker::new(grid, start, start, rng);
    while generator.state() == GeneratorState::Running {
        let _ = generator.step();
    }
    let steps = generator.steps();
    (generator.into_grid(), steps)
}

#[cfg(test)]
mod tests {
    use quickcheck::{quickcheck, TestResult};
    use rand::SeedableRng;

    use super::*;
    use crate::pathing::{self, Distances};
    use crate::topology::Topology;
    use crate::units::{Height, Width};

    fn gc(x: isize, y: isize) -> GridCoordinate {
        GridCoordinate::new(x, y)
    }

    fn seeded(seed: u64) -> XorShiftRng {
        XorShiftRng::seed_from_u64(seed)
    }

    fn generator(w: usize,
                 h: usize,
                 topology: Topology,
                 start: GridCoordinate,
                 target: GridCoordinate,
                 seed: u64)
                 -> RecursiveBacktracker {
        RecursiveBacktracker::new(Grid::new(Width(w), Height(h), topology),
                                  start,
                                  target,
                                  seeded(seed))
    }

    fn run_to_end(generator: &mut RecursiveBacktracker) -> Vec<StepOutcome> {
        let mut outcomes = vec![];
        while generator.state() == GeneratorState::Running {
            outcomes.push(generator.step());
        }
        outcomes
    }

    fn assert_openings_symmetric(grid: &Grid) {
        let topology = grid.topology();
        for cell in grid.cells() {
            assert!(cell.openings().len() <= topology.degree());
            for dir in cell.openings().iter() {
                let neighbour = grid.neighbour_at_direction(cell.coordinate(), dir)
                    .expect("opening leads out of the grid");
                assert!(grid.cell(neighbour).unwrap().has_opening(topology.opposite(dir)),
                        "{} open {} but {} is not open back",
                        cell.coordinate(),
                        dir,
                        neighbour);
            }
        }
    }

    #[test]
    fn five_by_five_rectangular_scenario() {
        let mut g = generator(5, 5, Topology::Rectangular, gc(0, 0), gc(4, 4), 42);
        let outcomes = run_to_end(&mut g);

        assert_eq!(g.state(), GeneratorState::Completed);
        assert_eq!(outcomes.last().map(|o| o.event.clone()), Some(StepEvent::Completed));

        let grid = g.grid();
        assert_eq!(grid.passages_count(), 24);
        assert!(grid.cells().iter().all(|cell| !cell.openings().is_empty()));
        assert!(pathing::is_perfect_maze(grid));

        let distances = Distances::new(grid, gc(0, 0)).unwrap();
        assert_eq!(distances.reachable_count(), 25);
        assert_openings_symmetric(grid);
    }

    #[test]
    fn three_by_three_hexagonal_scenario() {
        let mut g = generator(3, 3, Topology::Hexagonal, gc(1, 1), gc(2, 2), 7);
        let _ = run_to_end(&mut g);

        assert_eq!(g.state(), GeneratorState::Completed);
        assert_eq!(g.grid().passages_count(), 8);
        assert!(pathing::is_perfect_maze(g.grid()));
        assert_openings_symmetric(g.grid());
    }

    #[test]
    fn single_cell_grid_completes_at_once() {
        let mut g = generator(1, 1, Topology::Rectangular, gc(0, 0), gc(0, 0), 1);
        let outcome = g.step();

        assert_eq!(outcome.event, StepEvent::Completed);
        assert_eq!(outcome.target_path, Some(vec![gc(0, 0)]));
        assert_eq!(g.state(), GeneratorState::Completed);
        assert_eq!(g.grid().passages_count(), 0);
        assert_eq!(g.steps(), StepsCount(1));
    }

    #[test]
    fn finished_generator_does_nothing() {
        let mut g = generator(1, 1, Topology::Hexagonal, gc(0, 0), gc(0, 0), 1);
        let _ = g.step();
        assert_eq!(g.step(), StepOutcome::halted());
        assert_eq!(g.steps(), StepsCount(1));
        assert!(!g.cancel());
    }

    #[test]
    fn target_path_reported_once_and_walks_from_start_to_target() {
        let mut g = generator(6, 4, Topology::Rectangular, gc(0, 0), gc(5, 3), 3);
        let outcomes = run_to_end(&mut g);

        let reports: Vec<&Vec<GridCoordinate>> =
            outcomes.iter().filter_map(|o| o.target_path.as_ref()).collect();
        assert_eq!(reports.len(), 1);

        let path = reports[0];
        assert_eq!(path.first(), Some(&gc(0, 0)));
        assert_eq!(path.last(), Some(&gc(5, 3)));
        for pair in path.windows(2) {
            let linked = g.grid().links(pair[0]).unwrap();
            assert!(linked.contains(&pair[1]));
        }
    }

    #[test]
    fn carved_steps_change_two_cells_and_backtracks_one() {
        let mut g = generator(4, 4, Topology::Hexagonal, gc(0, 0), gc(3, 3), 9);
        for outcome in run_to_end(&mut g) {
            let changed = outcome.event.changed_cells();
            match outcome.event {
                StepEvent::Carved { from, to, .. } => assert_eq!(&*changed, &[from, to]),
                StepEvent::Backtracked { popped, .. } => assert_eq!(&*changed, &[popped]),
                StepEvent::Completed => assert!(changed.is_empty()),
                StepEvent::Halted => panic!("running generator halted"),
            }
        }
    }

    #[test]
    fn carved_out_is_a_subset_of_openings() {
        let mut g = generator(7, 5, Topology::Rectangular, gc(3, 2), gc(0, 0), 11);
        let _ = run_to_end(&mut g);
        let mut received_only = 0;
        for cell in g.grid().cells() {
            for dir in cell.carved_out().iter() {
                assert!(cell.has_opening(dir));
            }
            received_only += cell.openings().len() - cell.carved_out().len();
        }
        // every cell but the start was carved into exactly once
        assert_eq!(received_only, 7 * 5 - 1);
    }

    #[test]
    fn same_seed_same_maze() {
        let mut a = generator(8, 8, Topology::Hexagonal, gc(0, 0), gc(7, 7), 1234);
        let mut b = generator(8, 8, Topology::Hexagonal, gc(0, 0), gc(7, 7), 1234);
        assert_eq!(run_to_end(&mut a), run_to_end(&mut b));
        assert_eq!(a.grid().cells(), b.grid().cells());
    }

    #[test]
    fn cancelled_generator_stops_mutating() {
        let mut g = generator(10, 10, Topology::Rectangular, gc(0, 0), gc(9, 9), 5);
        for _ in 0..10 {
            let _ = g.step();
        }
        let passages = g.grid().passages_count();

        assert!(g.cancel());
        assert_eq!(g.state(), GeneratorState::Cancelled);
        assert_eq!(g.step(), StepOutcome::halted());
        assert_eq!(g.grid().passages_count(), passages);
        assert!(passages < 99);
    }

    #[test]
    fn visited_cells_never_shrink() {
        let mut g = generator(5, 6, Topology::Hexagonal, gc(2, 2), gc(0, 0), 77);
        let mut last_visited = g.visited_count();
        while g.state() == GeneratorState::Running {
            let _ = g.step();
            assert!(g.visited_count() >= last_visited);
            assert!(g.path().len() <= g.visited_count());
            last_visited = g.visited_count();
        }
        assert_eq!(last_visited, 30);
    }

    #[test]
    fn whole_grid_helper() {
        let grid = Grid::new(Width(12), Height(9), Topology::Rectangular);
        let (grid, StepsCount(steps)) = recursive_backtracker(grid, gc(6, 4), seeded(8));
        assert_eq!(grid.passages_count(), 12 * 9 - 1);
        assert!(steps < 2 * 12 * 9);
    }

    #[test]
    #[should_panic]
    fn start_outside_the_grid_is_rejected() {
        let _ = generator(3, 3, Topology::Rectangular, gc(3, 0), gc(0, 0), 1);
    }

    #[test]
    fn spanning_tree_property() {
        fn spanning_tree(w: u8, h: u8, hex: bool, seed: u64) -> TestResult {
            let (w, h) = (w as usize % 12 + 1, h as usize % 12 + 1);
            let topology = if hex { Topology::Hexagonal } else { Topology::Rectangular };
            let start = GridCoordinate::new((seed % w as u64) as isize, 0);
            let target = GridCoordinate::new(w as isize - 1, h as isize - 1);
            let mut g = RecursiveBacktracker::new(Grid::new(Width(w), Height(h), topology),
                                                  start,
                                                  target,
                                                  XorShiftRng::seed_from_u64(seed));
            let cells = w * h;
            while g.state() == GeneratorState::Running {
                let _ = g.step();
                if g.steps().0 > 2 * cells {
                    return TestResult::failed();
                }
            }

            let grid = g.grid();
            let symmetric = grid.cells().iter().all(|cell| {
                cell.openings().iter().all(|dir| {
                    grid.neighbour_at_direction(cell.coordinate(), dir)
                        .and_then(|n| grid.cell(n))
                        .map_or(false, |n| n.has_opening(topology.opposite(dir)))
                })
            });
            TestResult::from_bool(symmetric && grid.passages_count() == cells - 1 &&
                                  pathing::is_perfect_maze(grid))
        }
        quickcheck(spanning_tree as fn(u8, u8, bool, u64) -> TestResult);
    }
}
