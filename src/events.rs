use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::cells::{Cartesian2DCoordinate, CompassPrimary};

/// Structural steps of a maze generation run, in the order they happened.
///
/// A consumer can rebuild the finished maze from the `Carve` events alone.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MazeEvent {
    /// A cell became the active cell and was marked visited. Once per cell.
    Visited { at: Cartesian2DCoordinate },
    /// The wall between two adjacent cells was removed.
    Carve {
        from: Cartesian2DCoordinate,
        to: Cartesian2DCoordinate,
        direction: CompassPrimary,
    },
    /// The traversal stack was popped and returned to this cell.
    Backtrack { at: Cartesian2DCoordinate },
}

impl MazeEvent {
    /// The cell that is active once this event has happened.
    pub fn active_cell(&self) -> Cartesian2DCoordinate {
        match *self {
            MazeEvent::Visited { at } | MazeEvent::Backtrack { at } => at,
            MazeEvent::Carve { to, .. } => to,
        }
    }

    pub fn is_carve(&self) -> bool {
        matches!(*self, MazeEvent::Carve { .. })
    }
}

impl fmt::Display for MazeEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MazeEvent::Visited { at } => write!(f, "visit {}", at),
            MazeEvent::Carve { from, to, direction } => {
                write!(f, "carve {} -> {} ({})", from, to, direction)
            }
            MazeEvent::Backtrack { at } => write!(f, "backtrack {}", at),
        }
    }
}
