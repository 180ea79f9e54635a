use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::units::Width;

#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Cartesian2DCoordinate {
    pub x: u32,
    pub y: u32,
}

impl Cartesian2DCoordinate {
    pub fn new(x: u32, y: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate { x, y }
    }

    #[inline]
    pub fn from_row_major_index(index: usize, row_width: Width) -> Cartesian2DCoordinate {
        let Width(width) = row_width;
        let x = index % width;
        let y = index / width;

        Cartesian2DCoordinate::new(x as u32, y as u32)
    }
}

impl fmt::Display for Cartesian2DCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four walls of a square cell. North is towards y = 0, West is towards x = 0.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum CompassPrimary {
    North,
    South,
    East,
    West,
}

impl CompassPrimary {
    /// Fixed order used whenever neighbours are listed, so a seeded run always sees the
    /// candidates in the same order.
    pub const CANONICAL_ORDER: [CompassPrimary; 4] = [CompassPrimary::West,
                                                      CompassPrimary::North,
                                                      CompassPrimary::East,
                                                      CompassPrimary::South];

    pub fn opposite(self) -> CompassPrimary {
        match self {
            CompassPrimary::North => CompassPrimary::South,
            CompassPrimary::South => CompassPrimary::North,
            CompassPrimary::East => CompassPrimary::West,
            CompassPrimary::West => CompassPrimary::East,
        }
    }

    /// The direction of travel from `from` to an orthogonally adjacent `to`.
    /// Returns None if the two coordinates are not adjacent.
    pub fn between(from: Cartesian2DCoordinate,
                   to: Cartesian2DCoordinate)
                   -> Option<CompassPrimary> {
        let (fx, fy) = (i64::from(from.x), i64::from(from.y));
        let (tx, ty) = (i64::from(to.x), i64::from(to.y));

        match (tx - fx, ty - fy) {
            (-1, 0) => Some(CompassPrimary::West),
            (0, -1) => Some(CompassPrimary::North),
            (1, 0) => Some(CompassPrimary::East),
            (0, 1) => Some(CompassPrimary::South),
            _ => None,
        }
    }

    #[inline]
    fn wall_bit(self) -> u8 {
        match self {
            CompassPrimary::North => 0b0001,
            CompassPrimary::South => 0b0010,
            CompassPrimary::East => 0b0100,
            CompassPrimary::West => 0b1000,
        }
    }
}

impl fmt::Display for CompassPrimary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            CompassPrimary::North => "north",
            CompassPrimary::South => "south",
            CompassPrimary::East => "east",
            CompassPrimary::West => "west",
        };
        f.write_str(name)
    }
}

/// Creates a new coordinate offset 1 cell away in the given direction.
/// Returns None if the coordinate is not representable, it may still be outside of a grid.
pub fn offset_coordinate(coord: Cartesian2DCoordinate,
                         dir: CompassPrimary)
                         -> Option<Cartesian2DCoordinate> {
    let (x, y) = (coord.x, coord.y);
    match dir {
        CompassPrimary::North => y.checked_sub(1).map(|y| Cartesian2DCoordinate::new(x, y)),
        CompassPrimary::South => y.checked_add(1).map(|y| Cartesian2DCoordinate::new(x, y)),
        CompassPrimary::East => x.checked_add(1).map(|x| Cartesian2DCoordinate::new(x, y)),
        CompassPrimary::West => x.checked_sub(1).map(|x| Cartesian2DCoordinate::new(x, y)),
    }
}

/// Wall flags of a cell packed into the low 4 bits. A set bit is a standing wall.
#[derive(Hash, Eq, PartialEq, Copy, Clone)]
pub struct Walls(u8);

impl Walls {
    pub fn all() -> Walls {
        Walls(0b1111)
    }

    #[inline]
    pub fn contains(&self, dir: CompassPrimary) -> bool {
        self.0 & dir.wall_bit() != 0
    }

    #[inline]
    pub fn remove(&mut self, dir: CompassPrimary) {
        self.0 &= !dir.wall_bit();
    }

    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = CompassPrimary> + '_ {
        CompassPrimary::CANONICAL_ORDER.iter().cloned().filter(move |dir| self.contains(*dir))
    }
}

impl Default for Walls {
    fn default() -> Walls {
        Walls::all()
    }
}

impl fmt::Debug for Walls {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// One room of the maze. Only the owning `Grid` changes its walls or visited flag.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Cell {
    coord: Cartesian2DCoordinate,
    walls: Walls,
    visited: bool,
}

impl Cell {
    pub fn new(coord: Cartesian2DCoordinate) -> Cell {
        Cell {
            coord,
            walls: Walls::all(),
            visited: false,
        }
    }

    #[inline]
    pub fn coordinate(&self) -> Cartesian2DCoordinate {
        self.coord
    }

    #[inline]
    pub fn walls(&self) -> Walls {
        self.walls
    }

    #[inline]
    pub fn has_wall(&self, dir: CompassPrimary) -> bool {
        self.walls.contains(dir)
    }

    #[inline]
    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub(crate) fn set_visited(&mut self) {
        self.visited = true;
    }

    pub(crate) fn remove_wall(&mut self, dir: CompassPrimary) {
        self.walls.remove(dir);
    }
}
