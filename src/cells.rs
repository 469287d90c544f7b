use serde_derive::Deserialize;
use smallvec::SmallVec;
use std::fmt;

use crate::topology::Topology;

#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd, Deserialize)]
pub struct GridCoordinate {
    pub x: isize,
    pub y: isize,
}

impl GridCoordinate {
    pub fn new(x: isize, y: isize) -> GridCoordinate {
        GridCoordinate { x, y }
    }

    #[inline]
    pub fn offset(self, dx: isize, dy: isize) -> GridCoordinate {
        GridCoordinate::new(self.x + dx, self.y + dy)
    }
}

impl From<(isize, isize)> for GridCoordinate {
    fn from(x_y_pair: (isize, isize)) -> GridCoordinate {
        GridCoordinate::new(x_y_pair.0, x_y_pair.1)
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

pub type CoordinateSmallVec = SmallVec<[GridCoordinate; 6]>;
pub type DirectionSmallVec = SmallVec<[Direction; 6]>;

/// Every direction name used by any topology. A topology only ever hands out its own subset,
/// see `Topology::directions`.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub fn abbreviation(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::NorthEast => "NE",
            Direction::East => "E",
            Direction::SouthEast => "SE",
            Direction::South => "S",
            Direction::SouthWest => "SW",
            Direction::West => "W",
            Direction::NorthWest => "NW",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// A set of directions of one topology, one bit per direction in the topology's order.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct DirectionSet {
    topology: Topology,
    bits: u8,
}

impl DirectionSet {
    pub fn new(topology: Topology) -> DirectionSet {
        DirectionSet { topology, bits: 0 }
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Returns true if the direction was not already present.
    pub fn insert(&mut self, direction: Direction) -> bool {
        let mask = self.mask(direction);
        let is_new = self.bits & mask == 0;
        self.bits |= mask;
        is_new
    }

    #[inline]
    pub fn contains(&self, direction: Direction) -> bool {
        self.bits & self.mask(direction) != 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Members in topology order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.topology
            .directions()
            .iter()
            .cloned()
            .filter(move |dir| self.contains(*dir))
    }

    /// The topology's directions that are *not* in this set, in topology order.
    pub fn complement(&self) -> DirectionSmallVec {
        self.topology
            .directions()
            .iter()
            .cloned()
            .filter(|dir| !self.contains(*dir))
            .collect()
    }

    #[inline]
    fn mask(&self, direction: Direction) -> u8 {
        1 << self.topology.index_of(direction)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    coordinate: GridCoordinate,
    openings: DirectionSet,
    carved_out: DirectionSet,
}

impl Cell {
    pub fn new(coordinate: GridCoordinate, topology: Topology) -> Cell {
        Cell {
            coordinate,
            openings: DirectionSet::new(topology),
            carved_out: DirectionSet::new(topology),
        }
    }

    #[inline]
    pub fn coordinate(&self) -> GridCoordinate {
        self.coordinate
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.openings.topology()
    }

    /// Directions with a passage to the neighbouring cell.
    #[inline]
    pub fn openings(&self) -> &DirectionSet {
        &self.openings
    }

    /// Directions generation has already moved away from this cell along.
    /// Not the same as the openings: a cell that was carved *into* has an opening it never carved.
    #[inline]
    pub fn carved_out(&self) -> &DirectionSet {
        &self.carved_out
    }

    #[inline]
    pub fn has_opening(&self, direction: Direction) -> bool {
        self.openings.contains(direction)
    }

    /// Name of the tile that shows this cell: one glyph per topology direction, `-` for an
    /// opening and `X` for a wall. A rectangular cell open only to the north and south is `-X-X`.
    pub fn openings_key(&self) -> String {
        self.topology()
            .directions()
            .iter()
            .map(|dir| if self.has_opening(*dir) { '-' } else { 'X' })
            .collect()
    }

    pub(crate) fn open(&mut self, direction: Direction) {
        self.openings.insert(direction);
    }

    pub(crate) fn carve_out(&mut self, direction: Direction) {
        self.carved_out.insert(direction);
        self.openings.insert(direction);
    }
}
