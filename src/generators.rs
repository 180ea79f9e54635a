use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_derive::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cells::{Cartesian2DCoordinate, CompassPrimary};
use crate::events::MazeEvent;
use crate::grid::{CoordinateSmallVec, Grid, GridError};
use crate::units::{Height, Width};

/// Setup for one generation run.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub width: usize,
    pub height: usize,
    /// Fixed seed for a reproducible maze. Seeded from the OS when absent.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Steer the carve into the bottom right corner when passing next to it.
    #[serde(default)]
    pub force_exit: bool,
}

impl GeneratorConfig {
    pub fn new(width: usize, height: usize) -> GeneratorConfig {
        GeneratorConfig {
            width,
            height,
            random_seed: None,
            force_exit: false,
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    pub fn new() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder { config: GeneratorConfig::new(20, 20) }
    }
    pub fn width(mut self, width: usize) -> GeneratorConfigBuilder {
        self.config.width = width;
        self
    }
    pub fn height(mut self, height: usize) -> GeneratorConfigBuilder {
        self.config.height = height;
        self
    }
    pub fn random_seed(mut self, seed: Option<u64>) -> GeneratorConfigBuilder {
        self.config.random_seed = seed;
        self
    }
    pub fn force_exit(mut self, force_exit: bool) -> GeneratorConfigBuilder {
        self.config.force_exit = force_exit;
        self
    }
    pub fn build(self) -> GeneratorConfig {
        self.config
    }
}

impl Default for GeneratorConfigBuilder {
    fn default() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::new()
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GeneratorState {
    Ready,
    Running,
    Done,
}

/// Randomized depth first search maze generator ("recursive backtracker").
///
/// The walk starts at (0, 0) and keeps an explicit stack of cells instead of recursing. Each
/// pop either finds an unvisited neighbour to carve into, pushing both cells back, or leaves
/// the exhausted cell off the stack. The finished passages form a spanning tree of the grid.
///
/// Generation is lazy: every call to `next` does at most one pop and yields the events it
/// caused, in order.
#[derive(Debug)]
pub struct RecursiveBacktracker<R: Rng> {
    grid: Grid,
    rng: R,
    stack: Vec<Cartesian2DCoordinate>,
    pending: VecDeque<MazeEvent>,
    state: GeneratorState,
    force_exit: bool,
}

impl RecursiveBacktracker<StdRng> {
    pub fn from_config(config: &GeneratorConfig) -> Result<RecursiveBacktracker<StdRng>, GridError> {
        RecursiveBacktracker::new(Width(config.width),
                                  Height(config.height),
                                  config.rng(),
                                  config.force_exit)
    }
}

impl<R: Rng> RecursiveBacktracker<R> {
    pub fn new(width: Width,
               height: Height,
               rng: R,
               force_exit: bool)
               -> Result<RecursiveBacktracker<R>, GridError> {
        let grid = Grid::new(width, height)?;
        let stack = Vec::with_capacity(grid.size());

        Ok(RecursiveBacktracker {
            grid,
            rng,
            stack,
            pending: VecDeque::with_capacity(3),
            state: GeneratorState::Ready,
            force_exit,
        })
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
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Drive the generation to the end, dropping the remaining events.
    pub fn run_to_completion(mut self) -> Grid {
        while self.next().is_some() {}
        self.grid
    }

    /// Give up the grid in whatever state it has been carved to so far.
    pub fn into_grid(self) -> Grid {
        self.grid
    }

    fn start(&mut self) -> Result<(), GridError> {
        let start = Cartesian2DCoordinate::new(0, 0);
        self.grid.mark_visited(start)?;
        self.stack.push(start);
        self.pending.push_back(MazeEvent::Visited { at: start });
        self.state = GeneratorState::Running;

        debug!(width = self.grid.width().0,
               height = self.grid.height().0,
               force_exit = self.force_exit,
               "maze generation started");
        Ok(())
    }

    fn step(&mut self) -> Result<(), GridError> {
        let current = match self.stack.pop() {
            Some(coord) => coord,
            None => {
                self.state = GeneratorState::Done;
                debug!(cells = self.grid.size(),
                       links = self.grid.links_count(),
                       "maze generation finished");
                return Ok(());
            }
        };
        trace!(x = current.x, y = current.y, "backtrack");
        self.pending.push_back(MazeEvent::Backtrack { at: current });

        let chosen = match self.forced_exit_target(current)? {
            Some(corner) => corner,
            None => {
                let candidates = self.grid
                    .unvisited_neighbours(current)?
                    .iter()
                    .map(|cell| cell.coordinate())
                    .collect::<CoordinateSmallVec>();
                if candidates.is_empty() {
                    // Exhausted, it stays off the stack.
                    return Ok(());
                }
                candidates[self.rng.gen_range(0..candidates.len())]
            }
        };
        self.stack.push(current);

        let direction = self.grid.remove_wall_between(current, chosen)?;
        trace!(from_x = current.x,
               from_y = current.y,
               to_x = chosen.x,
               to_y = chosen.y,
               %direction,
               "carve");
        self.pending.push_back(MazeEvent::Carve {
            from: current,
            to: chosen,
            direction,
        });

        self.grid.mark_visited(chosen)?;
        self.pending.push_back(MazeEvent::Visited { at: chosen });
        self.stack.push(chosen);

        Ok(())
    }

    /// The bottom right corner, when exit forcing is on, `current` sits directly north or west of
    /// the corner and the corner has not been reached yet.
    fn forced_exit_target(&self,
                          current: Cartesian2DCoordinate)
                          -> Result<Option<Cartesian2DCoordinate>, GridError> {
        let (Width(w), Height(h)) = (self.grid.width(), self.grid.height());
        if !self.force_exit || w < 2 || h < 2 {
            return Ok(None);
        }

        let corner = Cartesian2DCoordinate::new(w as u32 - 1, h as u32 - 1);
        let beside_corner = CompassPrimary::between(current, corner)
            .map_or(false,
                    |dir| dir == CompassPrimary::South || dir == CompassPrimary::East);

        if beside_corner && !self.grid.is_visited(corner)? {
            trace!(x = current.x, y = current.y, "forcing carve into the exit corner");
            Ok(Some(corner))
        } else {
            Ok(None)
        }
    }
}

impl<R: Rng> Iterator for RecursiveBacktracker<R> {
    type Item = MazeEvent;

    fn next(&mut self) -> Option<MazeEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            let advanced = match self.state {
                GeneratorState::Ready => self.start(),
                GeneratorState::Running => self.step(),
                GeneratorState::Done => return None,
            };

            // Every coordinate used comes from the grid itself, so a failure here is a logic bug.
            if let Err(err) = advanced {
                panic!("maze generation reached an invalid grid state: {}", err);
            }
        }
    }
}

/// Generate a complete maze according to `config`.
pub fn recursive_backtracker(config: &GeneratorConfig) -> Result<Grid, GridError> {
    RecursiveBacktracker::from_config(config).map(RecursiveBacktracker::run_to_completion)
}

/// Generate a complete maze and keep every event of the run.
pub fn recursive_backtracker_events(config: &GeneratorConfig)
                                    -> Result<(Grid, Vec<MazeEvent>), GridError> {
    let mut generator = RecursiveBacktracker::from_config(config)?;
    let events = generator.by_ref().collect::<Vec<_>>();
    Ok((generator.into_grid(), events))
}

#[cfg(test)]
mod tests {
    use quickcheck::{quickcheck, TestResult};
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::pathing;

    fn gc(x: u32, y: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate::new(x, y)
    }

    // Always yields zero, so every random choice picks the first candidate.
    fn first_choice_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    fn first_choice_generator(w: usize,
                              h: usize,
                              force_exit: bool)
                              -> RecursiveBacktracker<StepRng> {
        RecursiveBacktracker::new(Width(w), Height(h), first_choice_rng(), force_exit)
            .expect("valid dimensions")
    }

    fn carves(events: &[MazeEvent]) -> Vec<(Cartesian2DCoordinate, Cartesian2DCoordinate)> {
        events.iter()
              .filter_map(|event| match *event {
                  MazeEvent::Carve { from, to, .. } => Some((from, to)),
                  _ => None,
              })
              .collect()
    }

    #[test]
    fn invalid_dimensions_fail_before_any_event() {
        let config = GeneratorConfig::new(0, 5);
        assert_eq!(RecursiveBacktracker::from_config(&config).err(),
                   Some(GridError::InvalidDimension {
                       width: 0,
                       height: 5,
                   }));
        assert!(recursive_backtracker(&GeneratorConfig::new(5, 0)).is_err());
    }

    #[test]
    fn states_move_from_ready_to_done() {
        let mut generator = first_choice_generator(2, 2, false);
        assert_eq!(generator.state(), GeneratorState::Ready);
        assert_eq!(generator.grid().visited_count(), 0);

        assert_eq!(generator.next(), Some(MazeEvent::Visited { at: gc(0, 0) }));
        assert_eq!(generator.state(), GeneratorState::Running);
        assert_eq!(generator.stack_depth(), 1);

        while generator.next().is_some() {}
        assert_eq!(generator.state(), GeneratorState::Done);
        assert_eq!(generator.stack_depth(), 0);
        assert_eq!(generator.next(), None);
    }

    #[test]
    fn two_by_two_first_choice_scenario() {
        let events = first_choice_generator(2, 2, false).collect::<Vec<_>>();

        let expected = vec![MazeEvent::Visited { at: gc(0, 0) },
                            MazeEvent::Backtrack { at: gc(0, 0) },
                            MazeEvent::Carve {
                                from: gc(0, 0),
                                to: gc(1, 0),
                                direction: CompassPrimary::East,
                            },
                            MazeEvent::Visited { at: gc(1, 0) },
                            MazeEvent::Backtrack { at: gc(1, 0) },
                            MazeEvent::Carve {
                                from: gc(1, 0),
                                to: gc(1, 1),
                                direction: CompassPrimary::South,
                            },
                            MazeEvent::Visited { at: gc(1, 1) },
                            MazeEvent::Backtrack { at: gc(1, 1) },
                            MazeEvent::Carve {
                                from: gc(1, 1),
                                to: gc(0, 1),
                                direction: CompassPrimary::West,
                            },
                            MazeEvent::Visited { at: gc(0, 1) },
                            MazeEvent::Backtrack { at: gc(0, 1) },
                            MazeEvent::Backtrack { at: gc(1, 1) },
                            MazeEvent::Backtrack { at: gc(1, 0) },
                            MazeEvent::Backtrack { at: gc(0, 0) }];
        assert_eq!(events, expected);
        assert_eq!(carves(&events).len(), 3);
    }

    #[test]
    fn two_by_two_grid_is_a_path() {
        let grid = first_choice_generator(2, 2, false).run_to_completion();
        assert!(grid.all_visited());
        assert_eq!(grid.links_count(), 3);
        // The 4th edge of the square is never carved
        assert!(!grid.is_linked(gc(0, 0), gc(0, 1)));
        assert!(pathing::is_perfect_maze(&grid));
    }

    #[test]
    fn single_row_is_a_straight_line() {
        let events = first_choice_generator(5, 1, false).collect::<Vec<_>>();
        let carve_events = events.iter().filter(|event| event.is_carve()).collect::<Vec<_>>();
        assert_eq!(carve_events.len(), 4);
        for event in carve_events {
            match *event {
                MazeEvent::Carve { direction, .. } => assert_eq!(direction, CompassPrimary::East),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn single_column_is_a_straight_line() {
        let config = GeneratorConfigBuilder::new().width(1).height(6).random_seed(Some(42)).build();
        let (grid, events) = recursive_backtracker_events(&config).unwrap();
        let expected = (0..5).map(|y| (gc(0, y), gc(0, y + 1))).collect::<Vec<_>>();
        assert_eq!(carves(&events), expected);
        assert_eq!(grid.links_count(), 5);
    }

    #[test]
    fn single_cell_maze() {
        let events = first_choice_generator(1, 1, true).collect::<Vec<_>>();
        assert_eq!(events,
                   vec![MazeEvent::Visited { at: gc(0, 0) }, MazeEvent::Backtrack { at: gc(0, 0) }]);
    }

    #[test]
    fn event_counts() {
        let config = GeneratorConfigBuilder::new().width(7).height(5).random_seed(Some(99)).build();
        let (_, events) = recursive_backtracker_events(&config).unwrap();
        let cells = 7 * 5;

        let count = |pred: fn(&MazeEvent) -> bool| events.iter().filter(|e| pred(e)).count();
        assert_eq!(count(|e| matches!(*e, MazeEvent::Visited { .. })), cells);
        assert_eq!(count(|e| matches!(*e, MazeEvent::Carve { .. })), cells - 1);
        assert_eq!(count(|e| matches!(*e, MazeEvent::Backtrack { .. })), 2 * cells - 1);
    }

    #[test]
    fn same_seed_same_events() {
        for &force_exit in &[false, true] {
            let config = GeneratorConfigBuilder::new()
                .width(12)
                .height(9)
                .random_seed(Some(2918957128))
                .force_exit(force_exit)
                .build();
            let (first_grid, first) = recursive_backtracker_events(&config).unwrap();
            let (second_grid, second) = recursive_backtracker_events(&config).unwrap();
            assert_eq!(first, second);
            assert_eq!(first_grid, second_grid);
        }
    }

    #[test]
    fn quickcheck_same_seed_same_maze() {
        fn p(w: u8, h: u8, seed: u64, force_exit: bool) -> TestResult {
            let (w, h) = (w as usize % 10, h as usize % 10);
            if w == 0 || h == 0 {
                return TestResult::discard();
            }
            let config = GeneratorConfigBuilder::new()
                .width(w)
                .height(h)
                .random_seed(Some(seed))
                .force_exit(force_exit)
                .build();
            let first = recursive_backtracker_events(&config).unwrap();
            let second = recursive_backtracker_events(&config).unwrap();
            TestResult::from_bool(first == second)
        }
        quickcheck(p as fn(u8, u8, u64, bool) -> TestResult)
    }

    #[test]
    fn different_seeds_differ() {
        let one = GeneratorConfigBuilder::new().width(10).height(10).random_seed(Some(11111)).build();
        let two = GeneratorConfigBuilder::new().width(10).height(10).random_seed(Some(22222)).build();
        // Different seeds should (almost certainly) produce different mazes
        assert_ne!(recursive_backtracker(&one).unwrap(), recursive_backtracker(&two).unwrap());
    }

    #[test]
    fn carve_events_match_wall_flags() {
        let config = GeneratorConfigBuilder::new().width(6).height(6).random_seed(Some(3)).build();
        let mut generator = RecursiveBacktracker::from_config(&config).unwrap();

        while let Some(event) = generator.next() {
            if let MazeEvent::Carve { from, to, direction } = event {
                let grid = generator.grid();
                assert_eq!(CompassPrimary::between(from, to), Some(direction));
                assert!(!grid.cell_at(from).unwrap().has_wall(direction));
                assert!(!grid.cell_at(to).unwrap().has_wall(direction.opposite()));
            }
        }
    }

    #[test]
    fn walls_only_change_in_pairs() {
        let config = GeneratorConfigBuilder::new().width(8).height(3).random_seed(Some(5)).build();
        let (grid, events) = recursive_backtracker_events(&config).unwrap();

        let removed_walls = grid.iter_cells().map(|cell| 4 - cell.walls().count()).sum::<usize>();
        assert_eq!(removed_walls, 2 * carves(&events).len());
        assert_eq!(grid.links_count(), carves(&events).len());
    }

    #[test]
    fn forcing_the_exit_changes_the_carve_beside_the_corner() {
        // With first choice picks the walk reaches (2, 1) from the north with (1, 1) and the
        // corner (2, 2) both unvisited.
        let free = first_choice_generator(3, 3, false).collect::<Vec<_>>();
        let forced = first_choice_generator(3, 3, true).collect::<Vec<_>>();

        assert_eq!(carves(&free)[..4].to_vec(),
                   vec![(gc(0, 0), gc(1, 0)),
                        (gc(1, 0), gc(2, 0)),
                        (gc(2, 0), gc(2, 1)),
                        (gc(2, 1), gc(1, 1))]);
        assert_eq!(carves(&forced)[..4].to_vec(),
                   vec![(gc(0, 0), gc(1, 0)),
                        (gc(1, 0), gc(2, 0)),
                        (gc(2, 0), gc(2, 1)),
                        (gc(2, 1), gc(2, 2))]);
        assert_eq!(carves(&forced).len(), 8);
    }

    #[test]
    fn forced_exit_corner_is_reachable() {
        for seed in 0..20 {
            let config = GeneratorConfigBuilder::new()
                .width(9)
                .height(7)
                .random_seed(Some(seed))
                .force_exit(true)
                .build();
            let (grid, events) = recursive_backtracker_events(&config).unwrap();
            let corner = gc(8, 6);

            // The first time the walk stands beside the corner it carves straight into it.
            let beside = events.iter()
                               .position(|event| match *event {
                                   MazeEvent::Backtrack { at } => at == gc(8, 5) || at == gc(7, 6),
                                   _ => false,
                               })
                               .expect("walk passes beside the corner");
            match events[beside + 1] {
                MazeEvent::Carve { to, .. } => assert_eq!(to, corner),
                other => panic!("expected a carve into the corner, got {}", other),
            }

            let distances = pathing::Distances::new(&grid, gc(0, 0)).unwrap();
            let path = pathing::shortest_path(&grid, &distances, corner)
                .expect("corner is connected to the start");
            assert_eq!(path.first(), Some(&gc(0, 0)));
            assert_eq!(path.last(), Some(&corner));
            assert_eq!(path.len() as u32, distances.distance_from_start_to(corner).unwrap() + 1);
            for step in path.windows(2) {
                assert!(grid.is_linked(step[0], step[1]));
            }
        }
    }

    #[test]
    fn quickcheck_perfect_mazes() {
        fn p(w: u8, h: u8, seed: u64, force_exit: bool) -> TestResult {
            let (w, h) = (w as usize % 12, h as usize % 12);
            if w == 0 || h == 0 {
                return TestResult::discard();
            }
            let config = GeneratorConfigBuilder::new()
                .width(w)
                .height(h)
                .random_seed(Some(seed))
                .force_exit(force_exit)
                .build();
            let (grid, events) = recursive_backtracker_events(&config).unwrap();

            TestResult::from_bool(grid.all_visited() && grid.links_count() == w * h - 1 &&
                                  carves(&events).len() == w * h - 1 &&
                                  pathing::is_perfect_maze(&grid))
        }
        quickcheck(p as fn(u8, u8, u64, bool) -> TestResult)
    }

    #[test]
    fn quickcheck_stack_never_exceeds_cell_count() {
        fn p(w: u8, h: u8, seed: u64) -> TestResult {
            let (w, h) = (w as usize % 10, h as usize % 10);
            if w == 0 || h == 0 {
                return TestResult::discard();
            }
            let mut generator = RecursiveBacktracker::new(Width(w),
                                                          Height(h),
                                                          StdRng::seed_from_u64(seed),
                                                          false)
                .unwrap();
            let mut deepest = 0;
            while generator.next().is_some() {
                deepest = deepest.max(generator.stack_depth());
            }
            TestResult::from_bool(deepest <= w * h)
        }
        quickcheck(p as fn(u8, u8, u64) -> TestResult)
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"width": 4, "height": 3}"#).unwrap();
        assert_eq!(config, GeneratorConfig::new(4, 3));

        let config: GeneratorConfig =
            serde_json::from_str(r#"{"width": 4, "height": 3, "random_seed": 8, "force_exit": true}"#)
                .unwrap();
        assert_eq!(config.random_seed, Some(8));
        assert!(config.force_exit);
    }
}
