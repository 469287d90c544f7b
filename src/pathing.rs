use itertools::Itertools;
use petgraph::algo::{connected_components, is_cyclic_undirected};
use smallvec::SmallVec;

use crate::cells::{CoordinateSmallVec, GridCoordinate};
use crate::grid::Grid;
use crate::grid_displays::GridDisplay;
use crate::utils::{self, FnvHashMap};

/// Passage distances from one start cell to every cell reachable from it.
#[derive(Debug, Clone)]
pub struct Distances {
    start_coordinate: GridCoordinate,
    distances: FnvHashMap<GridCoordinate, u32>,
    max_distance: u32,
}

impl Distances {
    /// Flood fill outwards from `start_coordinate` along the carved passages.
    /// Returns None if the start is not on the grid.
    pub fn new(grid: &Grid, start_coordinate: GridCoordinate) -> Option<Distances> {

        if !grid.is_valid_coordinate(start_coordinate) {
            return None;
        }

        let mut max = 0;
        let mut distances = utils::fnv_hashmap(grid.size());
        distances.insert(start_coordinate, 0);

        // Every passage is one step long, so the first time a cell is reached is the shortest.
        // The distances map doubles as the visited set.
        let mut frontier = vec![start_coordinate];
        while !frontier.is_empty() {

            let mut new_frontier = vec![];
            for cell_coord in &frontier {

                let distance_to_cell = distances[cell_coord];
                if distance_to_cell > max {
                    max = distance_to_cell;
                }

                let links: CoordinateSmallVec = grid.links(*cell_coord).unwrap_or_default();
                for link_coordinate in &*links {
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
    pub fn start(&self) -> GridCoordinate {
        self.start_coordinate
    }

    #[inline(always)]
    pub fn max(&self) -> u32 {
        self.max_distance
    }

    #[inline(always)]
    pub fn distance_from_start_to(&self, coord: GridCoordinate) -> Option<u32> {
        self.distances.get(&coord).cloned()
    }

    /// Number of cells reachable from the start, the start included.
    #[inline]
    pub fn reachable_count(&self) -> usize {
        self.distances.len()
    }

    pub fn furthest_points_on_grid(&self) -> SmallVec<[GridCoordinate; 8]> {
        self.distances
            .iter()
            .filter(|&(_, distance)| *distance == self.max_distance)
            .map(|(coord, _)| *coord)
            .sorted()
            .collect()
    }
}

impl GridDisplay for Distances {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {
        if let Some(d) = self.distances.get(&coord) {
            // centre align, padding 3, lowercase hexadecimal
            format!("{:^3x}", d)
        } else {
            String::from("   ")
        }
    }
}

/// The passage route from the distances' start to `end_point`, both ends included.
/// None if the end is unreachable.
pub fn shortest_path(grid: &Grid,
                     distances_from_start: &Distances,
                     end_point: GridCoordinate)
                     -> Option<Vec<GridCoordinate>> {

    let mut current_distance = distances_from_start.distance_from_start_to(end_point)?;
    let mut path = vec![end_point];
    let start = distances_from_start.start();
    let mut current_coord = end_point;

    while current_coord != start {

        let closest_to_start = grid.links(current_coord)?
            .iter()
            .filter_map(|coord| {
                distances_from_start.distance_from_start_to(*coord).map(|d| (*coord, d))
            })
            .min_by_key(|&(_, distance)| distance);

        match closest_to_start {
            Some((closer_coord, closer_distance)) if closer_distance < current_distance => {
                current_coord = closer_coord;
                current_distance = closer_distance;
                path.push(current_coord);
            }
            // We have not got any closer to the start, the distances belong to another grid.
            _ => return None,
        }
    }

    path.reverse();
    Some(path)
}

/// Is the carved passage graph one connected tree covering every cell?
pub fn is_perfect_maze(grid: &Grid) -> bool {
    let graph = grid.to_graph();
    graph.node_count() > 0 && connected_components(&graph) == 1 && !is_cyclic_undirected(&graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::Direction;
    use crate::topology::Topology;
    use crate::units::{Height, Width};

    fn gc(x: isize, y: isize) -> GridCoordinate {
        GridCoordinate::new(x, y)
    }

    /// A 3x1 corridor plus one cell north of the middle.
    fn t_shape() -> Grid {
        let mut g = Grid::new(Width(3), Height(2), Topology::Rectangular);
        g.link(gc(0, 0), Direction::East).expect("link failed");
        g.link(gc(1, 0), Direction::East).expect("link failed");
        g.link(gc(1, 0), Direction::North).expect("link failed");
        g
    }

    #[test]
    fn distances_construction_requires_valid_start_coordinate() {
        let g = t_shape();
        assert!(Distances::new(&g, gc(-1, 0)).is_none());
        assert!(Distances::new(&g, gc(3, 0)).is_none());
    }

    #[test]
    fn distances_follow_passages() {
        let g = t_shape();
        let distances = Distances::new(&g, gc(0, 0)).unwrap();

        assert_eq!(distances.start(), gc(0, 0));
        assert_eq!(distances.distance_from_start_to(gc(0, 0)), Some(0));
        assert_eq!(distances.distance_from_start_to(gc(2, 0)), Some(2));
        assert_eq!(distances.distance_from_start_to(gc(1, 1)), Some(2));
        assert_eq!(distances.distance_from_start_to(gc(0, 1)), None);
        assert_eq!(distances.max(), 2);
        assert_eq!(distances.reachable_count(), 4);
        assert_eq!(&*distances.furthest_points_on_grid(), &[gc(1, 1), gc(2, 0)]);
        assert_eq!(distances.render_cell_body(gc(2, 0)), " 2 ");
        assert_eq!(distances.render_cell_body(gc(0, 1)), "   ");
    }

    #[test]
    fn path_between_points() {
        let g = t_shape();
        let distances = Distances::new(&g, gc(2, 0)).unwrap();
        assert_eq!(shortest_path(&g, &distances, gc(1, 1)),
                   Some(vec![gc(2, 0), gc(1, 0), gc(1, 1)]));
        assert_eq!(shortest_path(&g, &distances, gc(2, 0)), Some(vec![gc(2, 0)]));
        assert_eq!(shortest_path(&g, &distances, gc(0, 1)), None);
    }

    #[test]
    fn perfect_maze_detection() {
        let mut g = t_shape();
        assert!(!is_perfect_maze(&g), "(0, 1) and (2, 1) are unreachable");

        g.link(gc(0, 1), Direction::South).expect("link failed");
        g.link(gc(2, 1), Direction::South).expect("link failed");
        assert!(is_perfect_maze(&g));

        g.link(gc(0, 1), Direction::East).expect("link failed");
        assert!(!is_perfect_maze(&g), "a cycle is not a perfect maze");
    }
}
