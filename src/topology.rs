//! Neighbour schemes. Pure direction math, no bounds checking: a projected coordinate may lie
//! outside any grid and it is up to the grid to reject it.

use serde_derive::Deserialize;

use crate::cells::{Direction, GridCoordinate};

const RECTANGULAR_DIRECTIONS: [Direction; 4] =
    [Direction::North, Direction::East, Direction::South, Direction::West];

const HEXAGONAL_DIRECTIONS: [Direction; 6] = [Direction::NorthEast,
                                              Direction::SouthEast,
                                              Direction::South,
                                              Direction::SouthWest,
                                              Direction::NorthWest,
                                              Direction::North];

#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash, Deserialize)]
pub enum Topology {
    /// 4 neighbours: N, E, S, W.
    Rectangular,
    /// 6 neighbours on an offset ("shoved") grid where odd rows sit half a cell over:
    /// NE, SE, S, SW, NW, N.
    Hexagonal,
}

impl Default for Topology {
    fn default() -> Topology {
        Topology::Rectangular
    }
}

impl Topology {
    /// The fixed direction order of this topology. The position of a direction is its bit index.
    #[inline]
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Topology::Rectangular => &RECTANGULAR_DIRECTIONS,
            Topology::Hexagonal => &HEXAGONAL_DIRECTIONS,
        }
    }

    #[inline]
    pub fn degree(self) -> usize {
        self.directions().len()
    }

    #[inline]
    pub fn contains(self, direction: Direction) -> bool {
        self.directions().contains(&direction)
    }

    /// Panics if the direction is not one of this topology's directions.
    pub fn index_of(self, direction: Direction) -> usize {
        match self.directions().iter().position(|dir| *dir == direction) {
            Some(index) => index,
            None => panic!("{} is not a {:?} direction", direction, self),
        }
    }

    /// The reverse direction, half way round the direction order.
    pub fn opposite(self, direction: Direction) -> Direction {
        let degree = self.degree();
        let index = self.index_of(direction);
        self.directions()[(index + degree / 2) % degree]
    }

    /// The neighbouring coordinate one step away in `direction`.
    ///
    /// For hexagonal grids the offsets depend on whether the row (`y`) is even or odd.
    /// Panics if the direction is not one of this topology's directions.
    pub fn project(self, direction: Direction, coord: GridCoordinate) -> GridCoordinate {
        let (dx, dy) = match self {
            Topology::Rectangular => rectangular_offset(direction),
            Topology::Hexagonal => hexagonal_offset(direction, coord.y.rem_euclid(2) == 0),
        };
        coord.offset(dx, dy)
    }
}

fn rectangular_offset(direction: Direction) -> (isize, isize) {
    match direction {
        Direction::North => (0, 1),
        Direction::East => (1, 0),
        Direction::South => (0, -1),
        Direction::West => (-1, 0),
        other => panic!("no rectangular projection for {}", other),
    }
}

fn hexagonal_offset(direction: Direction, is_even_row: bool) -> (isize, isize) {
    match (direction, is_even_row) {
        (Direction::NorthEast, true) => (0, 1),
        (Direction::NorthEast, false) => (1, 1),
        (Direction::SouthEast, true) => (-1, 1),
        (Direction::SouthEast, false) => (0, 1),
        (Direction::South, _) => (-1, 0),
        (Direction::SouthWest, true) => (-1, -1),
        (Direction::SouthWest, false) => (0, -1),
        (Direction::NorthWest, true) => (0, -1),
        (Direction::NorthWest, false) => (1, -1),
        (Direction::North, _) => (1, 0),
        (other, _) => panic!("no hexagonal projection for {}", other),
    }
}
