use fnv::FnvHashMap;
use petgraph::algo::{connected_components, is_cyclic_undirected};
use petgraph::graph::NodeIndex;
use petgraph::{Graph, Undirected};

use crate::cells::{Cartesian2DCoordinate, CompassPrimary};
use crate::grid::Grid;

pub type PassageGraph = Graph<Cartesian2DCoordinate, CompassPrimary, Undirected, u32>;

/// The carved passages of `grid` as an undirected graph. Node `i` is the cell with row major
/// index `i`; each edge is weighted with the direction from its source to its target.
pub fn passage_graph(grid: &Grid) -> PassageGraph {
    let nodes = grid.size();
    let mut graph = PassageGraph::with_capacity(nodes, nodes.saturating_sub(1));
    for coord in grid.iter() {
        let _ = graph.add_node(coord);
    }

    for (src, dst) in grid.iter_links() {
        let node = |coord| {
            let index = grid.grid_coordinate_to_index(coord)
                            .expect("Links iter should give valid coordinate");
            NodeIndex::new(index)
        };
        if let Some(dir) = CompassPrimary::between(src, dst) {
            let _ = graph.add_edge(node(src), node(dst), dir);
        }
    }

    graph
}

/// A perfect maze has exactly one route between any two cells: its passages form a spanning
/// tree of the grid.
pub fn is_perfect_maze(grid: &Grid) -> bool {
    let graph = passage_graph(grid);
    graph.edge_count() == graph.node_count() - 1 && connected_components(&graph) == 1 &&
    !is_cyclic_undirected(&graph)
}

/// Flood fill step counts from a start cell to every cell reachable through passages.
#[derive(Debug, Clone)]
pub struct Distances {
    start_coordinate: Cartesian2DCoordinate,
    distances: FnvHashMap<Cartesian2DCoordinate, u32>,
    max_distance: u32,
}

impl Distances {
    /// Returns None if `start_coordinate` is not on the grid.
    pub fn new(grid: &Grid, start_coordinate: Cartesian2DCoordinate) -> Option<Distances> {
        if !grid.is_valid_coordinate(start_coordinate) {
            return None;
        }

        let mut max = 0;
        let mut distances =
            FnvHashMap::with_capacity_and_hasher(grid.size(), Default::default());
        distances.insert(start_coordinate, 0);

        // Every passage is one step, so the first distance recorded for a cell is the shortest
        // and the map doubles as the visited set.
        let mut frontier = vec![start_coordinate];
        while !frontier.is_empty() {
            let mut new_frontier = vec![];
            for cell_coord in &frontier {
                let distance_to_cell = distances[cell_coord];
                max = max.max(distance_to_cell);

                let links = grid.links(*cell_coord)
                                .expect("Source cell has an invalid cell coordinate.");
                for link_coordinate in &links {
                    if !distances.contains_key(link_coordinate) {
                        distances.insert(*link_coordinate, distance_to_cell + 1);
                        new_frontier.push(*link_coordinate);
                    }
                }
            }
            frontier = new_frontier;
        }

        Some(Distances {
            start_coordinate,
            distances,
            max_distance: max,
        })
    }

    #[inline(always)]
    pub fn start(&self) -> Cartesian2DCoordinate {
        self.start_coordinate
    }

    #[inline(always)]
    pub fn max(&self) -> u32 {
        self.max_distance
    }

    #[inline(always)]
    pub fn distance_from_start_to(&self, coord: Cartesian2DCoordinate) -> Option<u32> {
        self.distances.get(&coord).cloned()
    }

    pub fn reachable_count(&self) -> usize {
        self.distances.len()
    }

    pub fn furthest_points_on_grid(&self) -> Vec<Cartesian2DCoordinate> {
        let mut furthest = self.distances
                               .iter()
                               .filter(|&(_, distance)| *distance == self.max_distance)
                               .map(|(coord, _)| *coord)
                               .collect::<Vec<_>>();
        furthest.sort();
        furthest
    }
}

/// Walk back from `end_point` to the start of `distances_from_start`, always stepping to a
/// linked neighbour that is one closer. Returns None if there is no route.
pub fn shortest_path(grid: &Grid,
                     distances_from_start: &Distances,
                     end_point: Cartesian2DCoordinate)
                     -> Option<Vec<Cartesian2DCoordinate>> {
    let mut current_distance = distances_from_start.distance_from_start_to(end_point)?;
    let mut path = vec![end_point];
    let mut current_coord = end_point;

    while current_distance > 0 {
        let closer = grid.links(current_coord)?
            .iter()
            .cloned()
            .find(|linked| {
                distances_from_start.distance_from_start_to(*linked) == Some(current_distance - 1)
            })?;

        current_coord = closer;
        current_distance -= 1;
        path.push(current_coord);
    }

    path.reverse();
    Some(path)
}
