use serde_derive::Deserialize;

use crate::cells::GridCoordinate;
use crate::errors::{ErrorKind, Result};
use crate::grid::Grid;
use crate::topology::Topology;
use crate::units::{Height, Width};

pub const MIN_GRID_SIDE: usize = 3;
pub const MAX_GRID_SIDE: usize = 250;

pub const DEFAULT_WAIT_SECONDS: f32 = 0.02;
pub const MIN_WAIT_SECONDS: f32 = 0.01;
pub const MAX_WAIT_SECONDS: f32 = 1.0;

/// Everything needed to start a generation run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct RunParams {
    pub width: Width,
    pub height: Height,
    pub start: GridCoordinate,
    pub end: GridCoordinate,
    #[serde(default)]
    pub topology: Topology,
}

impl Default for RunParams {
    fn default() -> RunParams {
        RunParams {
            width: Width(10),
            height: Height(10),
            start: GridCoordinate::new(0, 0),
            end: GridCoordinate::new(9, 9),
            topology: Topology::Rectangular,
        }
    }
}

impl RunParams {
    /// Checks the size, then the start, then the end point.
    pub fn validate(&self) -> Result<()> {
        let Width(w) = self.width;
        let Height(h) = self.height;
        if !side_in_range(w) || !side_in_range(h) {
            bail!(ErrorKind::InvalidGridSize(w, h));
        }

        for point in &[self.start, self.end] {
            if !self.contains(*point) {
                bail!(ErrorKind::CoordinateOutOfBounds(point.x, point.y, w, h));
            }
        }
        Ok(())
    }

    /// A copy pulled back into range.
    ///
    /// Sizes are clamped. A bad start axis snaps to the nearest edge, a bad end axis always
    /// snaps to the far edge.
    pub fn fixed(&self) -> RunParams {
        let w = self.width.0.max(MIN_GRID_SIDE).min(MAX_GRID_SIDE);
        let h = self.height.0.max(MIN_GRID_SIDE).min(MAX_GRID_SIDE);

        RunParams {
            width: Width(w),
            height: Height(h),
            start: GridCoordinate::new(fix_start_axis(self.start.x, w),
                                       fix_start_axis(self.start.y, h)),
            end: GridCoordinate::new(fix_end_axis(self.end.x, w), fix_end_axis(self.end.y, h)),
            topology: self.topology,
        }
    }

    /// A fresh, uncarved grid of the requested shape.
    pub fn grid(&self) -> Grid {
        Grid::new(self.width, self.height, self.topology)
    }

    fn contains(&self, point: GridCoordinate) -> bool {
        axis_in_range(point.x, self.width.0) && axis_in_range(point.y, self.height.0)
    }
}

#[inline]
fn side_in_range(side: usize) -> bool {
    side >= MIN_GRID_SIDE && side <= MAX_GRID_SIDE
}

#[inline]
fn axis_in_range(value: isize, limit: usize) -> bool {
    value >= 0 && (value as usize) < limit
}

fn fix_start_axis(value: isize, limit: usize) -> isize {
    if axis_in_range(value, limit) {
        value
    } else if value < limit as isize {
        0
    } else {
        limit as isize - 1
    }
}

fn fix_end_axis(value: isize, limit: usize) -> isize {
    if axis_in_range(value, limit) {
        value
    } else {
        limit as isize - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(w: usize, h: usize, start: (isize, isize), end: (isize, isize)) -> RunParams {
        RunParams {
            width: Width(w),
            height: Height(h),
            start: start.into(),
            end: end.into(),
            topology: Topology::Rectangular,
        }
    }

    #[test]
    fn default_params_are_valid() {
        assert!(RunParams::default().validate().is_ok());
    }

    #[test]
    fn size_is_checked_first() {
        let err = params(2, 300, (-1, 0), (0, 0)).validate().unwrap_err();
        match *err.kind() {
            ErrorKind::InvalidGridSize(2, 300) => {}
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn start_then_end_out_of_bounds() {
        let err = params(5, 5, (5, 0), (9, 9)).validate().unwrap_err();
        match *err.kind() {
            ErrorKind::CoordinateOutOfBounds(5, 0, 5, 5) => {}
            ref other => panic!("unexpected error {:?}", other),
        }

        let err = params(5, 5, (0, 0), (4, -1)).validate().unwrap_err();
        match *err.kind() {
            ErrorKind::CoordinateOutOfBounds(4, -1, 5, 5) => {}
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn fixing_clamps_sizes() {
        let fixed = params(1, 999, (0, 0), (0, 0)).fixed();
        assert_eq!(fixed.width, Width(3));
        assert_eq!(fixed.height, Height(250));
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn fixing_points() {
        let fixed = params(5, 4, (-3, 7), (-3, 7)).fixed();
        assert_eq!(fixed.start, GridCoordinate::new(0, 3));
        assert_eq!(fixed.end, GridCoordinate::new(4, 3));

        let untouched = params(5, 4, (2, 1), (3, 3));
        assert_eq!(untouched.fixed(), untouched);
    }

    #[test]
    fn grid_from_params() {
        let mut p = params(4, 3, (0, 0), (3, 2));
        p.topology = Topology::Hexagonal;
        let g = p.grid();
        assert_eq!(g.size(), 12);
        assert_eq!(g.topology(), Topology::Hexagonal);
    }
}
