//! **mazes** generates perfect mazes with the randomized depth first search
//! ("recursive backtracker") algorithm.
//!
//! The generator walks a rectangular `Grid` with an explicit stack and emits a lazy stream of
//! `MazeEvent`s. Renderers consume the events; the generator never knows how it is drawn.

pub mod cells;
pub mod events;
pub mod generators;
pub mod grid;
pub mod grid_iterators;
pub mod pathing;
pub mod renderers;
pub mod units;
