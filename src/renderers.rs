//! Text rendering of mazes, one 2-D layer at a time.
//!
//! A layer fixes every axis but the last two. Axis `D-2` runs down the page as rows and axis `D-1`
//! across as columns. Passages leaving the layer along a fixed axis show in the cell body: `^`
//! towards a lower coordinate, `v` towards a higher one and `x` for both.

use error_chain::bail;

use crate::cells::{Cell, Direction};
use crate::coordinates::CoordVec;
use crate::errors::{ErrorKind, Result};
use crate::sparse_grid::SparseGrid;

const CORNER: &str = "+";
const WALL_LR_3: &str = "---";
const WALL_UD: &str = "|";
const PASSAGE_LR_3: &str = "   ";
const PASSAGE_UD: &str = " ";

/// Render the layer selected by `layer`, which gives the coordinates of the leading axes.
/// Missing trailing components are 0, so an empty layer is the first one.
pub fn render_layer(grid: &SparseGrid<Cell>, layer: &[usize]) -> Result<String> {
    let dimensions = grid.dimensions();
    if dimensions < 2 {
        bail!(ErrorKind::ArgumentInvalid(format!("cannot draw layers of a {} dimensional grid", dimensions)));
    }
    let leading_axes = dimensions - 2;
    if layer.len() > leading_axes {
        bail!(ErrorKind::ArgumentInvalid(format!("a layer of a {} dimensional grid fixes at most {} axes, not {}",
                                                 dimensions, leading_axes, layer.len())));
    }
    if let Some(axis) = (0..layer.len()).find(|&axis| layer[axis] >= grid.sizes()[axis]) {
        bail!(ErrorKind::OutOfRange(format!("layer value {} of axis {} is outside length {}",
                                            layer[axis], axis, grid.sizes()[axis])));
    }

    let (row_axis, column_axis) = (dimensions - 2, dimensions - 1);
    let rows_count = grid.sizes()[row_axis];
    let columns_count = grid.sizes()[column_axis];

    let mut coords = CoordVec::from_slice(layer);
    coords.resize(dimensions, 0);

    let mut output = String::from(CORNER);
    for _ in 0..columns_count {
        output.push_str(WALL_LR_3);
        output.push_str(CORNER);
    }
    output.push('\n');

    for row in 0..rows_count {
        coords[row_axis] = row;
        let is_last_row = row == rows_count - 1;

        // The row above drew this row's northern wall, so each cell only adds its body, its
        // eastern boundary and its southern boundary.
        let mut middle_section = String::from(WALL_UD);
        let mut bottom_section = String::from(CORNER);

        for column in 0..columns_count {
            coords[column_axis] = column;
            let is_last_column = column == columns_count - 1;
            let cell = grid.get(&coords)?.cloned().unwrap_or_default();

            middle_section.push_str(cell_body(&cell, leading_axes));
            let east_open = !is_last_column && cell.is_connected(column_axis, Direction::Forward);
            middle_section.push_str(if east_open { PASSAGE_UD } else { WALL_UD });

            let south_open = !is_last_row && cell.is_connected(row_axis, Direction::Forward);
            bottom_section.push_str(if south_open { PASSAGE_LR_3 } else { WALL_LR_3 });
            bottom_section.push_str(CORNER);
        }

        output.push_str(&middle_section);
        output.push('\n');
        output.push_str(&bottom_section);
        output.push('\n');
    }

    Ok(output)
}

fn cell_body(cell: &Cell, leading_axes: usize) -> &'static str {
    let up = (0..leading_axes).any(|axis| cell.is_connected(axis, Direction::Backward));
    let down = (0..leading_axes).any(|axis| cell.is_connected(axis, Direction::Forward));
    match (up, down) {
        (true, true) => " x ",
        (true, false) => " ^ ",
        (false, true) => " v ",
        (false, false) => "   ",
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::errors::ErrorKind;

    fn link(grid: &mut SparseGrid<Cell>, from: &[usize], axis: usize) {
        let mut to = from.to_vec();
        to[axis] += 1;
        grid.entry_or_insert_with(from, Cell::walled).unwrap().connect(axis, Direction::Forward);
        grid.entry_or_insert_with(&to, Cell::walled).unwrap().connect(axis, Direction::Backward);
    }

    #[test]
    fn two_by_two() {
        let mut grid = SparseGrid::new(&[2, 2]).unwrap();
        link(&mut grid, &[0, 0], 1);
        link(&mut grid, &[0, 0], 0);
        link(&mut grid, &[1, 0], 1);

        let expected = "+---+---+\n\
                        |       |\n\
                        +   +---+\n\
                        |       |\n\
                        +---+---+\n";
        assert_eq!(render_layer(&grid, &[]).unwrap(), expected);
    }

    #[test]
    fn unvisited_cells_are_walled() {
        let grid = SparseGrid::new(&[1, 3]).unwrap();
        assert_eq!(render_layer(&grid, &[]).unwrap(), "+---+---+---+\n|   |   |   |\n+---+---+---+\n");
    }

    #[test]
    fn passages_between_layers_are_marked() {
        let mut grid = SparseGrid::new(&[3, 1, 2]).unwrap();
        link(&mut grid, &[0, 0, 0], 0);
        link(&mut grid, &[1, 0, 0], 0);

        assert_eq!(render_layer(&grid, &[0]).unwrap(), "+---+---+\n| v |   |\n+---+---+\n");
        assert_eq!(render_layer(&grid, &[1]).unwrap(), "+---+---+\n| x |   |\n+---+---+\n");
        assert_eq!(render_layer(&grid, &[2]).unwrap(), "+---+---+\n| ^ |   |\n+---+---+\n");
    }

    #[test]
    fn layer_must_select_leading_axes() {
        let grid: SparseGrid<Cell> = SparseGrid::new(&[2, 3, 3]).unwrap();
        match *render_layer(&grid, &[0, 0]).unwrap_err().kind() {
            ErrorKind::ArgumentInvalid(_) => {}
            ref other => panic!("unexpected error kind {:?}", other),
        }
        match *render_layer(&grid, &[2]).unwrap_err().kind() {
            ErrorKind::OutOfRange(_) => {}
            ref other => panic!("unexpected error kind {:?}", other),
        }
        let grid: SparseGrid<Cell> = SparseGrid::new(&[4]).unwrap();
        assert!(render_layer(&grid, &[]).is_err());
    }
}
