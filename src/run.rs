//! Paced, cancelable generation runs.
//!
//! A `RunController` drives one backtracker at a time, pausing between steps and telling a
//! `RunObserver` about every changed cell. Callers keep a `RunHandle` to cancel the run or
//! change its speed while it is going.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use crate::cells::GridCoordinate;
use crate::generators::{RecursiveBacktracker, StepEvent};
use crate::grid::Grid;
use crate::settings::{DEFAULT_WAIT_SECONDS, MAX_WAIT_SECONDS, MIN_WAIT_SECONDS};

/// Clamp a requested pause between steps into the supported range. NaN maps to the minimum.
pub fn clamp_wait_time(seconds: f32) -> f32 {
    if seconds.is_nan() {
        MIN_WAIT_SECONDS
    } else {
        seconds.max(MIN_WAIT_SECONDS).min(MAX_WAIT_SECONDS)
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Receives the progress of a run, in the order the generator made it.
pub trait RunObserver {
    /// Called once for every cell a step touched.
    fn on_cell_changed(&mut self, grid: &Grid, coord: GridCoordinate);

    /// Called at most once per run, with the walk from the start to the target.
    fn on_target_first_reached(&mut self, _grid: &Grid, _path: &[GridCoordinate]) {}

    /// Called exactly once for every run that completes or is cancelled.
    fn on_run_complete(&mut self, _grid: &Grid, _outcome: RunOutcome) {}
}

/// How the controller waits between steps.
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Does not wait at all.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoPause;

impl Pause for NoPause {
    fn pause(&mut self, _: Duration) {}
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
enum RunState {
    Running,
    Completed,
    Cancelled,
    Superseded,
}

type CompletionCallback = Box<dyn FnOnce(RunOutcome)>;

struct RunShared {
    id: u64,
    state: Cell<RunState>,
    on_complete: RefCell<Option<CompletionCallback>>,
}

impl RunShared {
    /// Move a running run to its final state and fire the completion callback.
    /// Returns false if the run had already stopped.
    fn finish(&self, outcome: RunOutcome) -> bool {
        if self.state.get() != RunState::Running {
            return false;
        }
        self.state.set(match outcome {
            RunOutcome::Completed => RunState::Completed,
            RunOutcome::Cancelled => RunState::Cancelled,
        });

        // The borrow must end before the callback runs, it may call back into a handle.
        let callback = self.on_complete.borrow_mut().take();
        if let Some(callback) = callback {
            callback(outcome);
        }
        true
    }

    fn supersede(&self) {
        if self.state.get() == RunState::Running {
            self.state.set(RunState::Superseded);
        }
        let _ = self.on_complete.borrow_mut().take();
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.state.get() == RunState::Cancelled
    }
}

/// Caller side control over one run.
#[derive(Clone)]
pub struct RunHandle {
    shared: Rc<RunShared>,
    wait_time: Rc<Cell<f32>>,
}

impl fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "RunHandle :: run: {}, state: {:?}, wait_time: {}",
               self.shared.id,
               self.shared.state.get(),
               self.wait_time.get())
    }
}

impl RunHandle {
    /// Stop the run and fire its completion callback straight away.
    /// Returns false, doing nothing, if the run had already stopped or been superseded.
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.finish(RunOutcome::Cancelled);
        if cancelled {
            debug!("Run {} cancelled", self.shared.id);
        }
        cancelled
    }

    /// Takes effect from the next pause. The value is clamped, see `clamp_wait_time`.
    pub fn adjust_wait_time(&self, seconds: f32) {
        self.wait_time.set(clamp_wait_time(seconds));
    }

    #[inline]
    pub fn wait_time(&self) -> f32 {
        self.wait_time.get()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.shared.state.get() == RunState::Running
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        match self.shared.state.get() {
            RunState::Completed => Some(RunOutcome::Completed),
            RunState::Cancelled => Some(RunOutcome::Cancelled),
            RunState::Running | RunState::Superseded => None,
        }
    }
}

struct ActiveRun {
    generator: RecursiveBacktracker,
    shared: Rc<RunShared>,
}

/// Owns the active run, the observer it reports to and the randomness behind each maze.
///
/// The wait time belongs to the controller, so a speed chosen during one run carries over
/// to the next.
pub struct RunController {
    observer: Box<dyn RunObserver>,
    rng: XorShiftRng,
    wait_time: Rc<Cell<f32>>,
    active: Option<ActiveRun>,
    last_grid: Option<Grid>,
    runs_started: u64,
}

impl RunController {
    pub fn new(observer: Box<dyn RunObserver>) -> RunController {
        RunController::from_rng(observer, XorShiftRng::from_entropy())
    }

    /// Every maze this controller generates is reproducible from `seed`.
    pub fn with_seed(observer: Box<dyn RunObserver>, seed: u64) -> RunController {
        RunController::from_rng(observer, XorShiftRng::seed_from_u64(seed))
    }

    fn from_rng(observer: Box<dyn RunObserver>, rng: XorShiftRng) -> RunController {
        RunController {
            observer,
            rng,
            wait_time: Rc::new(Cell::new(DEFAULT_WAIT_SECONDS)),
            active: None,
            last_grid: None,
            runs_started: 0,
        }
    }

    #[inline]
    pub fn wait_time(&self) -> f32 {
        self.wait_time.get()
    }

    pub fn set_wait_time(&mut self, seconds: f32) {
        self.wait_time.set(clamp_wait_time(seconds));
    }

    /// False as soon as the active run is cancelled, even before the next `step`.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .map_or(false, |run| run.shared.state.get() == RunState::Running)
    }

    /// The grid of the most recently finished run.
    #[inline]
    pub fn last_grid(&self) -> Option<&Grid> {
        self.last_grid.as_ref()
    }

    /// The grid being carved by the active run.
    pub fn active_grid(&self) -> Option<&Grid> {
        self.active.as_ref().map(|run| run.generator.grid())
    }

    /// Begin generating a maze on `grid` from `start`, reporting the walk to `end` when found.
    ///
    /// A still running active run is dropped without any notification. One that was cancelled
    /// but not stepped since is reported to the observer first.
    /// Panics if `start` is outside the grid.
    pub fn start_run<F>(&mut self,
                        grid: Grid,
                        start: GridCoordinate,
                        end: GridCoordinate,
                        on_complete: F)
                        -> RunHandle
        where F: FnOnce(RunOutcome) + 'static
    {
        if let Some(previous) = self.active.take() {
            if previous.shared.is_cancelled() {
                // Cancelled but not yet stepped, it still owes the observer its completion.
                self.retire(previous);
            } else {
                debug!("Run {} superseded", previous.shared.id);
                previous.shared.supersede();
            }
        }

        self.runs_started += 1;
        let run_rng = XorShiftRng::seed_from_u64(self.rng.gen());
        let generator = RecursiveBacktracker::new(grid, start, end, run_rng);

        let on_complete: CompletionCallback = Box::new(on_complete);
        let shared = Rc::new(RunShared {
            id: self.runs_started,
            state: Cell::new(RunState::Running),
            on_complete: RefCell::new(Some(on_complete)),
        });
        debug!("Run {} started on {:?}", shared.id, generator.grid());

        self.active = Some(ActiveRun {
            generator,
            shared: Rc::clone(&shared),
        });

        RunHandle {
            shared,
            wait_time: Rc::clone(&self.wait_time),
        }
    }

    /// Advance the active run by one generation step and report what changed.
    ///
    /// Returns how long to wait before the next step, or None when there is nothing left to
    /// step, in which case the run has been reported complete or cancelled.
    pub fn step(&mut self) -> Option<Duration> {
        let mut run = self.active.take()?;
        if run.shared.is_cancelled() {
            self.retire(run);
            return None;
        }

        let outcome = run.generator.step();

        for coord in outcome.event.changed_cells() {
            if run.shared.is_cancelled() {
                self.retire(run);
                return None;
            }
            self.observer.on_cell_changed(run.generator.grid(), coord);
        }

        if let Some(ref path) = outcome.target_path {
            if run.shared.is_cancelled() {
                self.retire(run);
                return None;
            }
            self.observer.on_target_first_reached(run.generator.grid(), path);
        }

        match outcome.event {
            StepEvent::Completed => {
                self.retire(run);
                None
            }
            StepEvent::Halted => unreachable!("run {} stepped a finished generator", run.shared.id),
            StepEvent::Carved { .. } |
            StepEvent::Backtracked { .. } => {
                if run.shared.is_cancelled() {
                    let _ = run.generator.cancel();
                    self.retire(run);
                    return None;
                }
                self.active = Some(run);
                Some(Duration::from_secs_f32(self.wait_time.get()))
            }
        }
    }

    /// Step the active run until it finishes or is cancelled, pausing between steps.
    pub fn run(&mut self, pause: &mut dyn Pause) {
        while let Some(delay) = self.step() {
            pause.pause(delay);
        }
    }

    /// Close out a run that stopped, by cancellation or by running out of cells.
    fn retire(&mut self, run: ActiveRun) {
        let ActiveRun { generator, shared } = run;

        let outcome = if shared.is_cancelled() {
            RunOutcome::Cancelled
        } else {
            let _ = shared.finish(RunOutcome::Completed);
            RunOutcome::Completed
        };
        debug!("Run {} {:?} after {} steps", shared.id, outcome, generator.steps().0);

        let grid = generator.into_grid();
        self.observer.on_run_complete(&grid, outcome);
        self.last_grid = Some(grid);
    }
}
