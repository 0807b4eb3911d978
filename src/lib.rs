//! **ndmazes** generates perfect mazes over sparse grids of any dimension count.
//!
//! A `MazeEngine` owns the grid, its axis lengths and a random source. Generation is a recursive
//! backtracker over every axis; the result can be enumerated in linear order, exported densely,
//! analysed as a graph, rendered one 2-D layer at a time and saved in a flat binary layout.

#![recursion_limit = "1024"]

pub mod cells;
pub mod codec;
pub mod coordinates;
pub mod engine;
pub mod errors;
pub mod generators;
pub mod renderers;
pub mod sparse_grid;
pub mod units;
mod utils;

pub use crate::cells::{Cell, Direction, WallMode};
pub use crate::coordinates::CoordIndex;
pub use crate::engine::{DenseMaze, MazeEngine};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::sparse_grid::SparseGrid;
