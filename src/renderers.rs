//! Consumers of the generator's event stream.
//!
//! Nothing here looks at a `Grid`: the maze is rebuilt from `Carve` events alone, the way any
//! out of process renderer would have to.

use std::fmt;

use fnv::FnvHashSet;

use crate::cells::Cartesian2DCoordinate;
use crate::events::MazeEvent;
use crate::grid::{self, GridError};
use crate::units::{Height, Width};

pub trait MazeEventSink {
    fn consume(&mut self, event: &MazeEvent);

    fn consume_all<I>(&mut self, events: I)
        where I: IntoIterator<Item = MazeEvent>,
              Self: Sized
    {
        for event in events {
            self.consume(&event);
        }
    }
}

/// Tallies of a run's events.
///
/// A backtrack onto the cell that was already active only confirms the position; `retreats`
/// counts the ones that actually step back along the tree.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default)]
pub struct EventStats {
    pub visits: usize,
    pub carves: usize,
    pub backtracks: usize,
    pub retreats: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EventStatsCollector {
    stats: EventStats,
    active: Option<Cartesian2DCoordinate>,
}

impl EventStatsCollector {
    pub fn new() -> EventStatsCollector {
        EventStatsCollector::default()
    }

    pub fn stats(&self) -> EventStats {
        self.stats
    }

    /// The cell the walk currently stands on.
    pub fn active_cell(&self) -> Option<Cartesian2DCoordinate> {
        self.active
    }
}

impl MazeEventSink for EventStatsCollector {
    fn consume(&mut self, event: &MazeEvent) {
        match *event {
            MazeEvent::Visited { .. } => self.stats.visits += 1,
            MazeEvent::Carve { .. } => self.stats.carves += 1,
            MazeEvent::Backtrack { at } => {
                self.stats.backtracks += 1;
                if self.active.map_or(false, |active| active != at) {
                    self.stats.retreats += 1;
                }
            }
        }
        self.active = Some(event.active_cell());
    }
}

/// Plain ASCII drawing of a rectangular maze.
///
/// ```text
/// +---+---+
/// | S     |
/// +---+   +
/// |     E |
/// +---+---+
/// ```
#[derive(Debug, Clone)]
pub struct TextRenderer {
    width: Width,
    height: Height,
    passages: FnvHashSet<(Cartesian2DCoordinate, Cartesian2DCoordinate)>,
    start: Option<Cartesian2DCoordinate>,
    end: Option<Cartesian2DCoordinate>,
}

impl TextRenderer {
    /// Fails for the same dimensions `Grid::new` rejects.
    pub fn new(width: Width, height: Height) -> Result<TextRenderer, GridError> {
        grid::check_dimensions(width, height)?;
        let max_passages = width.0 * height.0 - 1;

        Ok(TextRenderer {
            width,
            height,
            passages: FnvHashSet::with_capacity_and_hasher(max_passages, Default::default()),
            start: None,
            end: None,
        })
    }

    pub fn mark_start_end(mut self,
                          start: Option<Cartesian2DCoordinate>,
                          end: Option<Cartesian2DCoordinate>)
                          -> TextRenderer {
        self.start = start;
        self.end = end;
        self
    }

    pub fn passages_count(&self) -> usize {
        self.passages.len()
    }

    fn is_open(&self, a: Cartesian2DCoordinate, b: Cartesian2DCoordinate) -> bool {
        self.passages.contains(&ordered_pair(a, b))
    }

    fn cell_body(&self, coord: Cartesian2DCoordinate) -> &'static str {
        if Some(coord) == self.start {
            " S "
        } else if Some(coord) == self.end {
            " E "
        } else {
            "   "
        }
    }

    pub fn render(&self) -> String {
        let (Width(w), Height(h)) = (self.width, self.height);
        let mut output = String::with_capacity((2 * h + 1) * (4 * w + 2));

        for y in 0..h as u32 {
            // Each row draws its own northern boundary; the last row also closes the south.
            output.push('+');
            for x in 0..w as u32 {
                let coord = Cartesian2DCoordinate::new(x, y);
                let north_open = y > 0 && self.is_open(coord, Cartesian2DCoordinate::new(x, y - 1));
                output.push_str(if north_open { "   " } else { "---" });
                output.push('+');
            }
            output.push('\n');

            output.push('|');
            for x in 0..w as u32 {
                let coord = Cartesian2DCoordinate::new(x, y);
                let east_open = (x as usize) + 1 < w &&
                                self.is_open(coord, Cartesian2DCoordinate::new(x + 1, y));
                output.push_str(self.cell_body(coord));
                output.push(if east_open { ' ' } else { '|' });
            }
            output.push('\n');
        }

        output.push('+');
        for _ in 0..w {
            output.push_str("---+");
        }
        output.push('\n');

        output
    }
}

impl MazeEventSink for TextRenderer {
    fn consume(&mut self, event: &MazeEvent) {
        if let MazeEvent::Carve { from, to, .. } = *event {
            let _ = self.passages.insert(ordered_pair(from, to));
        }
    }
}

impl fmt::Display for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn ordered_pair(a: Cartesian2DCoordinate,
                b: Cartesian2DCoordinate)
                -> (Cartesian2DCoordinate, Cartesian2DCoordinate) {
    if a <= b { (a, b) } else { (b, a) }
}
