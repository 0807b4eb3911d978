use error_chain::bail;
use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::cells::{Cell, Direction, MAX_AXES};
use crate::coordinates::CoordIndex;
use crate::errors::{ErrorKind, Result};
use crate::sparse_grid::SparseGrid;
use crate::units::CellsCount;

/// Apply the recursive backtracker maze generation algorithm to a grid of any dimension count.
///
/// A randomized depth first walk: from the current cell pick, uniformly at random, a face that
/// still has a wall and leads to an unvisited in-bounds neighbour, open the wall on both sides and
/// move there, pushing the cell we left onto a stack. At a dead end pop the stack and try again
/// from there. The walk is done once every cell of the grid was visited, which leaves a perfect
/// maze: a spanning tree over the grid with `capacity - 1` passages.
///
/// The grid is cleared first. Cells materialize lazily as the walk reaches them. A stored cell
/// with no open face counts as unvisited.
///
/// Fails with `InternalConsistency` if the stack empties while cells are still unvisited. That
/// cannot happen on a freshly cleared grid and means some invariant was broken. The grid is left
/// as carved so far.
pub fn recursive_backtracker<R>(grid: &mut SparseGrid<Cell>,
                                rng: &mut R,
                                start: &CoordIndex)
                                -> Result<CellsCount>
    where R: Rng + ?Sized
{
    if grid.dimensions() > MAX_AXES {
        bail!(ErrorKind::ArgumentInvalid(format!("cells hold walls for at most {} axes, the grid has {}",
                                                 MAX_AXES, grid.dimensions())));
    }

    grid.clear();
    let CellsCount(max_cells) = grid.capacity();
    debug!(sizes = ?grid.sizes(), start = %start, max_cells, "carving maze");

    grid.entry_or_insert_with(start, Cell::walled)?;
    carve_from(grid, rng, start.clone(), 1)
}

/// The carving loop proper. `visited` counts the cells already carved into, `current` included.
fn carve_from<R>(grid: &mut SparseGrid<Cell>,
                 rng: &mut R,
                 start: CoordIndex,
                 mut visited: usize)
                 -> Result<CellsCount>
    where R: Rng + ?Sized
{
    let CellsCount(max_cells) = grid.capacity();
    let dimensions = grid.dimensions();
    let mut current = start;
    let mut backtrack: Vec<CoordIndex> = Vec::new();
    let mut candidates: SmallVec<[(usize, Direction, CoordIndex); 8]> = SmallVec::new();

    while visited < max_cells {

        let cell = grid.get(&current)?.cloned().unwrap_or_default();
        for axis in 0..dimensions {
            for &direction in &Direction::ALL {
                if !cell.has_wall(axis, direction) {
                    continue;
                }
                if let Some(next) = current.neighbour(axis, direction, grid.sizes()) {
                    if is_unvisited(grid, &next)? {
                        candidates.push((axis, direction, next));
                    }
                }
            }
        }

        if candidates.is_empty() {
            current = match backtrack.pop() {
                Some(previous) => previous,
                None => {
                    trace!(visited, max_cells, at = %current, "backtrack stack exhausted");
                    return Err(ErrorKind::InternalConsistency(visited, max_cells).into());
                }
            };
            continue;
        }

        let choice = rng.gen_range(0..candidates.len());
        let (axis, direction, next) = candidates.swap_remove(choice);
        candidates.clear();

        grid.entry_or_insert_with(&current, Cell::walled)?
            .connect(axis, direction);
        backtrack.push(current);

        // Move to the next cell and break its wall back towards the one we came from.
        current = next;
        grid.entry_or_insert_with(&current, Cell::walled)?
            .connect(axis, direction.opposite());
        visited += 1;
    }

    debug!(visited, "maze carved");
    Ok(CellsCount(visited))
}

/// Absent cells and cells without any open face have not been visited by the walk.
pub fn is_unvisited(grid: &SparseGrid<Cell>, coords: &[usize]) -> Result<bool> {
    Ok(grid.get(coords)?.map_or(true, Cell::is_unconnected))
}

#[cfg(test)]
mod tests {

    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::*;
    use crate::cells::WallMode;
    use crate::errors::ErrorKind;

    fn carved(sizes: &[usize], seed: u64) -> SparseGrid<Cell> {
        let mut grid = SparseGrid::new(sizes).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let start = CoordIndex::origin(sizes.len());
        let count = recursive_backtracker(&mut grid, &mut rng, &start).unwrap();
        assert_eq!(count, grid.capacity());
        grid
    }

    fn open_faces(grid: &SparseGrid<Cell>) -> usize {
        grid.stored().map(|(_, cell)| cell.passages(grid.dimensions())).sum()
    }

    #[test]
    fn every_cell_is_visited_once() {
        for &(ref sizes, seed) in &[(vec![2, 2], 1u64), (vec![5, 3], 2), (vec![3, 3, 3], 3), (vec![2, 3, 2, 2], 4)] {
            let grid = carved(sizes, seed);
            let CellsCount(cells) = grid.capacity();
            assert_eq!(grid.len(), cells);
            assert!(grid.iter().all(|cell| cell.map_or(false, |c| !c.is_unconnected())));
            // each passage opens one face on either side
            assert_eq!(open_faces(&grid), 2 * (cells - 1));
        }
    }

    #[test]
    fn passages_are_mirrored() {
        let grid = carved(&[4, 5, 2], 99);
        for (coord, cell) in grid.stored() {
            for axis in 0..grid.dimensions() {
                for &direction in &Direction::ALL {
                    if cell.is_connected(axis, direction) {
                        let next = coord.neighbour(axis, direction, grid.sizes())
                                        .expect("passage leads outside the grid");
                        let neighbour = grid.get(&next).unwrap().expect("passage leads to an unvisited cell");
                        assert!(neighbour.is_connected(axis, direction.opposite()));
                    }
                }
            }
        }
    }

    #[test]
    fn single_cell_grid_needs_no_carving() {
        let grid = carved(&[1, 1], 7);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(&[0, 0]).unwrap(), Some(&Cell::walled()));
    }

    #[test]
    fn same_seed_same_maze() {
        let flags = |grid: &SparseGrid<Cell>| grid.iter().map(|c| c.map(Cell::flag)).collect::<Vec<_>>();
        assert_eq!(flags(&carved(&[6, 7], 42)), flags(&carved(&[6, 7], 42)));
        assert_ne!(flags(&carved(&[6, 7], 42)), flags(&carved(&[6, 7], 43)));
    }

    #[test]
    fn carving_restarts_from_a_clean_grid() {
        let mut grid = SparseGrid::new(&[3, 3]).unwrap();
        grid.set(&[2, 2], Cell::open()).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(5);
        recursive_backtracker(&mut grid, &mut rng, &CoordIndex::origin(2)).unwrap();
        assert_eq!(open_faces(&grid), 2 * 8);
    }

    #[test]
    fn exhausted_backtrack_stack_is_an_internal_consistency_failure() {
        // A 1x3 corridor whose far end was pre-opened looks visited, so the walk from the
        // start can never reach it.
        let mut grid = SparseGrid::new(&[1, 3]).unwrap();
        grid.set(&[0, 0], Cell::walled()).unwrap();
        grid.set(&[0, 2], Cell::new(WallMode::Open)).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(1);

        let err = carve_from(&mut grid, &mut rng, CoordIndex::origin(2), 1).unwrap_err();
        match *err.kind() {
            ErrorKind::InternalConsistency(visited, target) => {
                assert_eq!(visited, 2);
                assert_eq!(target, 3);
            }
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn start_outside_the_grid_is_rejected() {
        let mut grid = SparseGrid::new(&[2, 2]).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(1);
        let err = recursive_backtracker(&mut grid, &mut rng, &CoordIndex::new(&[2, 0])).unwrap_err();
        match *err.kind() {
            ErrorKind::OutOfRange(_) => {}
            ref other => panic!("unexpected error {:?}", other),
        }
    }
}
