use std::error::Error;
use std::fmt;

use smallvec::SmallVec;

use crate::cells::{offset_coordinate, Cartesian2DCoordinate, Cell, CompassPrimary};
use crate::grid_iterators::RectGridCellIter;
use crate::units::{Height, Width};

pub type CoordinateSmallVec = SmallVec<[Cartesian2DCoordinate; 4]>;
pub type CellRefSmallVec<'a> = SmallVec<[&'a Cell; 4]>;

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GridError {
    InvalidDimension { width: usize, height: usize },
    OutOfBounds { x: u32, y: u32 },
    NotAdjacent {
        from: Cartesian2DCoordinate,
        to: Cartesian2DCoordinate,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GridError::InvalidDimension { width, height } => {
                write!(f, "invalid grid dimensions {}x{}, both must be at least 1", width, height)
            }
            GridError::OutOfBounds { x, y } => write!(f, "coordinate ({}, {}) is outside the grid", x, y),
            GridError::NotAdjacent { from, to } => {
                write!(f, "cells {} and {} are not orthogonal neighbours", from, to)
            }
        }
    }
}

impl Error for GridError {}

/// Rectangular lattice of cells stored densely in row major order.
///
/// The grid is the only owner of cell state. Wall removal always updates both sides of the
/// shared wall.
#[derive(Clone, Eq, PartialEq)]
pub struct Grid {
    width: Width,
    height: Height,
    cells: Vec<Cell>,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "Grid :: width: {:?}, height: {:?}, links: {:?}",
               self.width,
               self.height,
               self.links_count())
    }
}

impl Grid {
    pub fn new(width: Width, height: Height) -> Result<Grid, GridError> {
        check_dimensions(width, height)?;

        let cells = RectGridCellIter::new(width, height).map(Cell::new).collect();
        Ok(Grid {
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn width(&self) -> Width {
        self.width
    }

    #[inline]
    pub fn height(&self) -> Height {
        self.height
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Is the grid coordinate valid for this grid - within the grid's dimensions
    #[inline]
    pub fn is_valid_coordinate(&self, coord: Cartesian2DCoordinate) -> bool {
        (coord.x as usize) < self.width.0 && (coord.y as usize) < self.height.0
    }

    /// Convert a grid coordinate to a one dimensional index in the range 0...grid.size().
    /// Returns None if the grid coordinate is invalid.
    #[inline]
    pub fn grid_coordinate_to_index(&self, coord: Cartesian2DCoordinate) -> Option<usize> {
        if self.is_valid_coordinate(coord) {
            Some(coord.y as usize * self.width.0 + coord.x as usize)
        } else {
            None
        }
    }

    fn checked_index(&self, coord: Cartesian2DCoordinate) -> Result<usize, GridError> {
        self.grid_coordinate_to_index(coord)
            .ok_or(GridError::OutOfBounds {
                x: coord.x,
                y: coord.y,
            })
    }

    pub fn cell_at(&self, coord: Cartesian2DCoordinate) -> Result<&Cell, GridError> {
        let index = self.checked_index(coord)?;
        Ok(&self.cells[index])
    }

    fn cell_at_mut(&mut self, coord: Cartesian2DCoordinate) -> Result<&mut Cell, GridError> {
        let index = self.checked_index(coord)?;
        Ok(&mut self.cells[index])
    }

    #[inline]
    pub fn is_visited(&self, coord: Cartesian2DCoordinate) -> Result<bool, GridError> {
        self.cell_at(coord).map(Cell::is_visited)
    }

    pub fn mark_visited(&mut self, coord: Cartesian2DCoordinate) -> Result<(), GridError> {
        self.cell_at_mut(coord)?.set_visited();
        Ok(())
    }

    pub fn visited_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_visited()).count()
    }

    pub fn all_visited(&self) -> bool {
        self.cells.iter().all(Cell::is_visited)
    }

    pub fn neighbour_at_direction(&self,
                                  coord: Cartesian2DCoordinate,
                                  direction: CompassPrimary)
                                  -> Option<Cartesian2DCoordinate> {
        offset_coordinate(coord, direction).filter(|neighbour| self.is_valid_coordinate(*neighbour))
    }

    /// Cells to the West, North, East and South of `coord`, in that order, skipping any that
    /// fall outside of the grid. The cells are not necessarily linked by a passage.
    pub fn neighbour_coordinates(&self,
                                 coord: Cartesian2DCoordinate)
                                 -> Result<CoordinateSmallVec, GridError> {
        self.checked_index(coord)?;

        Ok(CompassPrimary::CANONICAL_ORDER
               .iter()
               .filter_map(|dir| self.neighbour_at_direction(coord, *dir))
               .collect())
    }

    /// The neighbours of `coord` that have not been visited yet, in neighbour order.
    pub fn unvisited_neighbours(&self,
                                coord: Cartesian2DCoordinate)
                                -> Result<CellRefSmallVec<'_>, GridError> {
        let neighbours = self.neighbour_coordinates(coord)?;
        let mut unvisited = CellRefSmallVec::new();
        for neighbour in &neighbours {
            let cell = self.cell_at(*neighbour)?;
            if !cell.is_visited() {
                unvisited.push(cell);
            }
        }
        Ok(unvisited)
    }

    /// Carve a passage between two adjacent cells.
    ///
    /// Clears the wall on `a` facing `b` and the opposite wall on `b` together, returning the
    /// direction from `a` to `b`. Nothing changes if either coordinate is invalid or the cells are
    /// not neighbours.
    pub fn remove_wall_between(&mut self,
                               a: Cartesian2DCoordinate,
                               b: Cartesian2DCoordinate)
                               -> Result<CompassPrimary, GridError> {
        let a_index = self.checked_index(a)?;
        let b_index = self.checked_index(b)?;
        let direction = CompassPrimary::between(a, b)
            .ok_or(GridError::NotAdjacent { from: a, to: b })?;

        self.cells[a_index].remove_wall(direction);
        self.cells[b_index].remove_wall(direction.opposite());
        Ok(direction)
    }

    /// Are two cells in the grid linked by a carved passage?
    pub fn is_linked(&self, a: Cartesian2DCoordinate, b: Cartesian2DCoordinate) -> bool {
        match (self.cell_at(a), self.cell_at(b), CompassPrimary::between(a, b)) {
            (Ok(a_cell), Ok(b_cell), Some(dir)) => {
                !a_cell.has_wall(dir) && !b_cell.has_wall(dir.opposite())
            }
            _ => false,
        }
    }

    pub fn is_neighbour_linked(&self,
                               coord: Cartesian2DCoordinate,
                               direction: CompassPrimary)
                               -> bool {
        self.neighbour_at_direction(coord, direction)
            .map_or(false, |neighbour_coord| self.is_linked(coord, neighbour_coord))
    }

    /// Cells that are linked to a particular cell by a passage.
    pub fn links(&self, coord: Cartesian2DCoordinate) -> Option<CoordinateSmallVec> {
        self.neighbour_coordinates(coord).ok().map(|neighbours| {
            neighbours.iter()
                      .cloned()
                      .filter(|neighbour| self.is_linked(coord, *neighbour))
                      .collect()
        })
    }

    /// Number of carved passages, each counted once.
    pub fn links_count(&self) -> usize {
        self.iter_links().count()
    }

    #[inline]
    pub fn iter(&self) -> RectGridCellIter {
        RectGridCellIter::new(self.width, self.height)
    }

    pub fn iter_cells(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    /// Every carved passage once, as a (west or north cell, east or south cell) pair.
    pub fn iter_links(&self) -> LinksIter<'_> {
        LinksIter {
            grid: self,
            cell_iter: self.iter(),
            pending_south: None,
        }
    }
}

/// Both sides at least 1, every coordinate fits a `u32` and the cell count fits a `usize`.
pub fn check_dimensions(width: Width, height: Height) -> Result<(), GridError> {
    let (Width(w), Height(h)) = (width, height);
    let too_large = w.checked_mul(h).is_none() || w > u32::MAX as usize ||
                    h > u32::MAX as usize;
    if w < 1 || h < 1 || too_large {
        return Err(GridError::InvalidDimension {
            width: w,
            height: h,
        });
    }
    Ok(())
}

#[derive(Debug)]
pub struct LinksIter<'a> {
    grid: &'a Grid,
    cell_iter: RectGridCellIter,
    pending_south: Option<(Cartesian2DCoordinate, Cartesian2DCoordinate)>,
}

impl<'a> Iterator for LinksIter<'a> {
    type Item = (Cartesian2DCoordinate, Cartesian2DCoordinate);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(link) = self.pending_south.take() {
            return Some(link);
        }

        while let Some(coord) = self.cell_iter.next() {
            let linked_at = |dir| {
                self.grid
                    .neighbour_at_direction(coord, dir)
                    .filter(|neighbour| self.grid.is_linked(coord, *neighbour))
                    .map(|neighbour| (coord, neighbour))
            };
            let east = linked_at(CompassPrimary::East);
            let south = linked_at(CompassPrimary::South);

            match (east, south) {
                (Some(e), s) => {
                    self.pending_south = s;
                    return Some(e);
                }
                (None, Some(s)) => return Some(s),
                (None, None) => continue,
            }
        }

        None
    }
}
