//! **backtracker** generates perfect mazes on rectangular and hexagonal grids with a
//! randomised depth first walk, one observable step at a time.

#![recursion_limit = "1024"]

#[macro_use]
extern crate error_chain;

pub mod cells;
pub mod errors;
pub mod generators;
pub mod grid;
pub mod grid_displays;
pub mod pathing;
pub mod run;
pub mod settings;
pub mod topology;
pub mod units;
mod utils;
