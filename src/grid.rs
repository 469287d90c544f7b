use petgraph::graph::{NodeIndex, UnGraph};
use std::fmt;
use std::rc::Rc;

use crate::cells::{Cell, CoordinateSmallVec, Direction, GridCoordinate};
use crate::grid_displays::GridDisplay;
use crate::topology::Topology;
use crate::units::{Height, RowIndex, Width};

/// A fixed size, row major array of cells sharing one topology.
#[derive(Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    width: Width,
    height: Height,
    topology: Topology,
    grid_display: Option<Rc<dyn GridDisplay>>,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CellLinkError {
    InvalidGridCoordinate,
    ForeignDirection,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "Grid :: topology: {:?}, width: {:?}, height: {:?}, passages: {}",
               self.topology,
               self.width,
               self.height,
               self.passages_count())
    }
}

impl Grid {
    /// Callers are expected to pass a non zero width and height.
    pub fn new(width: Width, height: Height, topology: Topology) -> Grid {
        let mut cells = Vec::with_capacity(width.0 * height.0);
        for y in 0..height.0 {
            for x in 0..width.0 {
                cells.push(Cell::new(GridCoordinate::new(x as isize, y as isize), topology));
            }
        }

        Grid {
            cells,
            width,
            height,
            topology,
            grid_display: None,
        }
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
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

    #[inline]
    pub fn set_grid_display(&mut self, grid_display: Option<Rc<dyn GridDisplay>>) {
        self.grid_display = grid_display;
    }

    #[inline]
    pub fn grid_display(&self) -> &Option<Rc<dyn GridDisplay>> {
        &self.grid_display
    }

    /// Is the grid coordinate valid for this grid - within the grid's dimensions
    #[inline]
    pub fn is_valid_coordinate(&self, coord: GridCoordinate) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as usize) < self.width.0 &&
        (coord.y as usize) < self.height.0
    }

    /// Convert a grid coordinate to a one dimensional index in the range 0...grid.size().
    /// Returns None if the grid coordinate is invalid.
    #[inline]
    pub fn grid_coordinate_to_index(&self, coord: GridCoordinate) -> Option<usize> {
        if self.is_valid_coordinate(coord) {
            Some(coord.y as usize * self.width.0 + coord.x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn index_to_grid_coordinate(&self, index: usize) -> Option<GridCoordinate> {
        self.cells.get(index).map(Cell::coordinate)
    }

    #[inline]
    pub fn cell(&self, coord: GridCoordinate) -> Option<&Cell> {
        self.grid_coordinate_to_index(coord).map(|index| &self.cells[index])
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Coordinates in row major order, starting from (0, 0).
    pub fn iter(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.cells.iter().map(Cell::coordinate)
    }

    /// The cells of one row, west to east.
    pub fn row(&self, row: RowIndex) -> &[Cell] {
        let RowIndex(y) = row;
        let start = (y * self.width.0).min(self.cells.len());
        let end = (start + self.width.0).min(self.cells.len());
        &self.cells[start..end]
    }

    /// The neighbour one step away in `direction`, if it lies inside the grid.
    pub fn neighbour_at_direction(&self,
                                  coord: GridCoordinate,
                                  direction: Direction)
                                  -> Option<GridCoordinate> {
        let neighbour_coord = self.topology.project(direction, coord);
        if self.is_valid_coordinate(neighbour_coord) {
            Some(neighbour_coord)
        } else {
            None
        }
    }

    /// Cells adjacent to `coord`, linked by a passage or not.
    pub fn neighbours(&self, coord: GridCoordinate) -> CoordinateSmallVec {
        self.topology
            .directions()
            .iter()
            .filter_map(|dir| self.neighbour_at_direction(coord, *dir))
            .collect()
    }

    /// Carve a passage from `coord` towards `direction`.
    ///
    /// The source cell records the direction as both carved out and open, the neighbour gets
    /// the opposite opening, so openings always stay symmetric.
    /// Returns the neighbour's coordinate.
    pub fn link(&mut self,
                coord: GridCoordinate,
                direction: Direction)
                -> Result<GridCoordinate, CellLinkError> {
        if !self.topology.contains(direction) {
            return Err(CellLinkError::ForeignDirection);
        }

        let neighbour_coord = self.topology.project(direction, coord);
        match (self.grid_coordinate_to_index(coord),
               self.grid_coordinate_to_index(neighbour_coord)) {
            (Some(from_index), Some(to_index)) => {
                let opposite = self.topology.opposite(direction);
                self.cells[from_index].carve_out(direction);
                self.cells[to_index].open(opposite);
                Ok(neighbour_coord)
            }
            _ => Err(CellLinkError::InvalidGridCoordinate),
        }
    }

    /// Is there a passage from `coord` to its neighbour in `direction`?
    pub fn is_neighbour_linked(&self, coord: GridCoordinate, direction: Direction) -> bool {
        self.neighbour_at_direction(coord, direction).is_some() &&
        self.cell(coord).map_or(false, |cell| cell.has_opening(direction))
    }

    /// Coordinates reachable from `coord` through one passage.
    pub fn links(&self, coord: GridCoordinate) -> Option<CoordinateSmallVec> {
        self.cell(coord).map(|cell| {
            cell.openings()
                .iter()
                .filter_map(|dir| self.neighbour_at_direction(coord, dir))
                .collect()
        })
    }

    /// Every passage exactly once, as (lower coordinate, higher coordinate).
    pub fn iter_links(&self) -> impl Iterator<Item = (GridCoordinate, GridCoordinate)> + '_ {
        self.cells.iter().flat_map(move |cell| {
            let from = cell.coordinate();
            cell.openings().iter().filter_map(move |dir| {
                self.neighbour_at_direction(from, dir)
                    .filter(|to| from < *to)
                    .map(|to| (from, to))
            })
        })
    }

    #[inline]
    pub fn passages_count(&self) -> usize {
        self.iter_links().count()
    }

    /// The carved passages as an undirected graph, one node per cell in row major order.
    pub fn to_graph(&self) -> UnGraph<GridCoordinate, ()> {
        let mut graph = UnGraph::with_capacity(self.size(), self.size());
        for coord in self.iter() {
            let _ = graph.add_node(coord);
        }
        for (from, to) in self.iter_links() {
            if let (Some(a), Some(b)) = (self.grid_coordinate_to_index(from),
                                         self.grid_coordinate_to_index(to)) {
                let _ = graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
            }
        }
        graph
    }
}
