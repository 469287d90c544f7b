use std::fmt;

use crate::cells::{CoordinateSmallVec, Direction, GridCoordinate};
use crate::grid::Grid;
use crate::topology::Topology;
use crate::units::RowIndex;
use crate::utils::{self, FnvHashSet};

pub trait GridDisplay {
    /// Render the contents of a grid cell as text.
    /// The String should be 3 glyphs long, padded if required.
    fn render_cell_body(&self, _: GridCoordinate) -> String {
        String::from("   ")
    }
}

#[derive(Debug)]
pub struct PathDisplay {
    on_path_coordinates: FnvHashSet<GridCoordinate>,
}
impl PathDisplay {
    pub fn new(path: &[GridCoordinate]) -> Self {
        let mut on_path_coordinates = utils::fnv_hashset(path.len());
        on_path_coordinates.extend(path.iter().cloned());
        PathDisplay { on_path_coordinates }
    }
}
impl GridDisplay for PathDisplay {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {
        if self.on_path_coordinates.contains(&coord) {
            String::from(" . ")
        } else {
            String::from("   ")
        }
    }
}

#[derive(Debug)]
pub struct StartEndPointsDisplay {
    start_coordinates: CoordinateSmallVec,
    end_coordinates: CoordinateSmallVec,
}
impl StartEndPointsDisplay {
    pub fn new(starts: CoordinateSmallVec, ends: CoordinateSmallVec) -> StartEndPointsDisplay {
        StartEndPointsDisplay {
            start_coordinates: starts,
            end_coordinates: ends,
        }
    }
}
impl GridDisplay for StartEndPointsDisplay {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {

        let contains_coordinate =
            |coordinates: &CoordinateSmallVec| coordinates.iter().any(|&c| c == coord);

        if contains_coordinate(&self.start_coordinates) {
            String::from(" S ")

        } else if contains_coordinate(&self.end_coordinates) {

            String::from(" E ")

        } else {
            String::from("   ")
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let output = match self.topology() {
            Topology::Rectangular => render_rectangular(self),
            Topology::Hexagonal => render_hexagonal(self),
        };
        write!(f, "{}", output)
    }
}

fn cell_body(grid: &Grid, coord: GridCoordinate) -> String {
    match *grid.grid_display() {
        Some(ref displayer) => displayer.render_cell_body(coord),
        None => String::from("   "),
    }
}

/// Box drawing rendering, north (highest `y`) at the top.
fn render_rectangular(grid: &Grid) -> String {
    const WALL_L: &str = "╴";
    const WALL_R: &str = "╶";
    const WALL_U: &str = "╵";
    const WALL_D: &str = "╷";
    const WALL_LR_3: &str = "───";
    const WALL_LR: &str = "─";
    const WALL_UD: &str = "│";
    const WALL_LD: &str = "┐";
    const WALL_RU: &str = "└";
    const WALL_LU: &str = "┘";
    const WALL_RD: &str = "┌";
    const WALL_LRU: &str = "┴";
    const WALL_LRD: &str = "┬";
    const WALL_LRUD: &str = "┼";
    const WALL_RUD: &str = "├";
    const WALL_LUD: &str = "┤";

    let columns_count = grid.width().0;
    let rows_count = grid.height().0;
    if columns_count == 0 || rows_count == 0 {
        return String::new();
    }

    // Start by special case rendering the text for the north most boundary
    let mut output = String::from(WALL_RD);
    for (index, cell) in grid.row(RowIndex(rows_count - 1)).iter().enumerate() {
        output.push_str(WALL_LR_3);
        if grid.is_neighbour_linked(cell.coordinate(), Direction::East) {
            output.push_str(WALL_LR);
        } else if index == columns_count - 1 {
            output.push_str(WALL_LD);
        } else {
            output.push_str(WALL_LRD);
        }
    }
    output.push('\n');

    for y in (0..rows_count).rev() {

        let is_last_row = y == 0;

        // The top section of each cell is drawn by the row above.
        let mut row_middle_section_render = String::from(WALL_UD);
        let mut row_bottom_section_render = String::new();

        for (index_column, cell) in grid.row(RowIndex(y)).iter().enumerate() {
            let cell_coord = cell.coordinate();
            let is_first_column = index_column == 0;
            let is_last_column = index_column == (columns_count - 1);
            let east_open = grid.is_neighbour_linked(cell_coord, Direction::East);
            let south_open = grid.is_neighbour_linked(cell_coord, Direction::South);

            row_middle_section_render.push_str(cell_body(grid, cell_coord).as_str());
            row_middle_section_render.push_str(if east_open { " " } else { WALL_UD });

            if is_first_column {
                row_bottom_section_render = if is_last_row {
                    String::from(WALL_RU)
                } else if south_open {
                    String::from(WALL_UD)
                } else {
                    String::from(WALL_RUD)
                };
            }
            row_bottom_section_render.push_str(if south_open { "   " } else { WALL_LR_3 });

            let corner = match (is_last_row, is_last_column) {
                (true, true) => WALL_LU,
                (true, false) => if east_open { WALL_LR } else { WALL_LRU },
                (false, true) => if south_open { WALL_UD } else { WALL_LUD },
                (false, false) => {
                    let access_se_from_east =
                        grid.neighbour_at_direction(cell_coord, Direction::East)
                            .map_or(false, |c| grid.is_neighbour_linked(c, Direction::South));
                    let access_se_from_south =
                        grid.neighbour_at_direction(cell_coord, Direction::South)
                            .map_or(false, |c| grid.is_neighbour_linked(c, Direction::East));
                    let show_right_section = !access_se_from_east;
                    let show_down_section = !access_se_from_south;
                    let show_up_section = !east_open;
                    let show_left_section = !south_open;

                    match (show_left_section,
                           show_right_section,
                           show_up_section,
                           show_down_section) {
                        (true, true, true, true) => WALL_LRUD,
                        (true, true, true, false) => WALL_LRU,
                        (true, true, false, true) => WALL_LRD,
                        (true, false, true, true) => WALL_LUD,
                        (false, true, true, true) => WALL_RUD,
                        (true, true, false, false) => WALL_LR,
                        (false, false, true, true) => WALL_UD,
                        (false, true, true, false) => WALL_RU,
                        (true, false, false, true) => WALL_LD,
                        (true, false, true, false) => WALL_LU,
                        (false, true, false, true) => WALL_RD,
                        (true, false, false, false) => WALL_L,
                        (false, true, false, false) => WALL_R,
                        (false, false, true, false) => WALL_U,
                        (false, false, false, true) => WALL_D,
                        _ => " ",
                    }
                }
            };

            row_bottom_section_render.push_str(corner);
        }

        output.push_str(row_middle_section_render.as_ref());
        output.push('\n');
        output.push_str(row_bottom_section_render.as_ref());
        output.push('\n');
    }

    output
}

/// One line per row, highest row first, each cell as its openings key plus its body.
/// Odd rows sit half a cell over, as they do on an offset hex map.
fn render_hexagonal(grid: &Grid) -> String {
    let mut output = String::new();
    for y in (0..grid.height().0).rev() {
        if y % 2 == 1 {
            output.push_str("     ");
        }
        let row = grid.row(RowIndex(y))
            .iter()
            .map(|cell| format!("{}{}", cell.openings_key(), cell_body(grid, cell.coordinate())))
            .collect::<Vec<_>>()
            .join(" ");
        output.push_str(row.trim_end());
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use std::rc::Rc;

    use super::*;
    use crate::units::{Height, Width};

    fn gc(x: isize, y: isize) -> GridCoordinate {
        GridCoordinate::new(x, y)
    }

    #[test]
    fn closed_rectangular_grid_text() {
        let g = Grid::new(Width(2), Height(1), Topology::Rectangular);
        assert_eq!(format!("{}", g), "┌───┬───┐\n│   │   │\n└───┴───┘\n");
    }

    #[test]
    fn open_passage_removes_the_wall() {
        let mut g = Grid::new(Width(2), Height(1), Topology::Rectangular);
        g.link(gc(0, 0), Direction::East).expect("link failed");
        assert_eq!(format!("{}", g), "┌───────┐\n│       │\n└───────┘\n");
    }

    #[test]
    fn north_is_drawn_at_the_top() {
        let mut g = Grid::new(Width(1), Height(2), Topology::Rectangular);
        g.set_grid_display(Some(Rc::new(StartEndPointsDisplay::new(smallvec![gc(0, 0)],
                                                                   smallvec![gc(0, 1)]))));
        let text = format!("{}", g);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "│ E │");
        assert_eq!(lines[3], "│ S │");
    }

    #[test]
    fn path_display_marks_only_the_path() {
        let display = PathDisplay::new(&[gc(0, 0), gc(1, 0)]);
        assert_eq!(display.render_cell_body(gc(1, 0)), " . ");
        assert_eq!(display.render_cell_body(gc(2, 0)), "   ");
    }

    #[test]
    fn hexagonal_rows_show_openings_keys() {
        let mut g = Grid::new(Width(2), Height(2), Topology::Hexagonal);
        g.link(gc(0, 0), Direction::NorthEast).expect("link failed");
        let text = format!("{}", g);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "     XXX-XX    XXXXXX");
        assert_eq!(lines[1], "-XXXXX    XXXXXX");
    }
}
