error_chain! {
    errors {
        InvalidGridSize(width: usize, height: usize) {
            description("grid size out of range")
            display("grid size {}x{} is out of range", width, height)
        }
        CoordinateOutOfBounds(x: isize, y: isize, width: usize, height: usize) {
            description("coordinate outside the grid")
            display("coordinate ({}, {}) lies outside the {}x{} grid", x, y, width, height)
        }
    }

    foreign_links {
        Io(::std::io::Error);
    }
}
