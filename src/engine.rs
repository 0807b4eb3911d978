//! The maze engine: an N-dimensional sparse grid of cells, its sizing, an injected random source
//! and the recursive backtracker driving them.
//!
//! Every method takes `&self`. One mutex guards the whole engine state, so concurrent callers
//! serialize: resizing, swapping the random source and a whole generation each run inside a
//! single critical section.

use std::convert::TryFrom;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use error_chain::bail;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::{RngCore, SeedableRng};
use rand_xorshift::XorShiftRng;
use smallvec::SmallVec;
use tracing::debug;

use crate::cells::{Cell, Direction, MAX_AXES};
use crate::coordinates::{CoordIndex, CoordVec};
use crate::errors::{ErrorKind, Result};
use crate::generators;
use crate::renderers;
use crate::sparse_grid::SparseGrid;
use crate::units::{CellsCount, LinearIndex, PassagesCount};

pub const MIN_DIMENSIONS: usize = 2;
pub const MAX_DIMENSIONS: usize = MAX_AXES;

/// Dense export of a maze: one cell per coordinate, addressable per axis.
#[cfg(feature = "dense")]
pub type DenseMaze = ndarray::ArrayD<Cell>;

/// Builds without the `dense` feature cannot hold a dense export, so the type has no values.
#[cfg(not(feature = "dense"))]
#[derive(Debug)]
pub enum DenseMaze {}

pub struct MazeEngine {
    dimensions: usize,
    state: Mutex<EngineState>,
}

struct EngineState {
    cells: SparseGrid<Cell>,
    rng: Box<dyn RngCore + Send>,
    endpoints: Option<(CoordIndex, CoordIndex)>,
}

impl fmt::Debug for MazeEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.lock();
        write!(f, "MazeEngine :: dimensions: {:?}, cells: {:?}, endpoints: {:?}",
               self.dimensions, state.cells, state.endpoints)
    }
}

/// Renders the layer at the origin of every axis but the last two.
impl fmt::Display for MazeEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.lock();
        let text = renderers::render_layer(&state.cells, &[]).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl MazeEngine {
    /// An engine with every axis of length 1, seeded from the operating system.
    pub fn new(dimensions: usize) -> Result<MazeEngine> {
        MazeEngine::with_rng(dimensions, Box::new(XorShiftRng::from_entropy()))
    }

    /// An engine whose generations are reproducible from `seed`.
    pub fn with_seed(dimensions: usize, seed: u64) -> Result<MazeEngine> {
        MazeEngine::with_rng(dimensions, Box::new(XorShiftRng::seed_from_u64(seed)))
    }

    pub fn with_rng(dimensions: usize, rng: Box<dyn RngCore + Send>) -> Result<MazeEngine> {
        if dimensions < MIN_DIMENSIONS || dimensions > MAX_DIMENSIONS {
            bail!(ErrorKind::ArgumentInvalid(format!("a maze has between {} and {} dimensions, not {}",
                                                     MIN_DIMENSIONS, MAX_DIMENSIONS, dimensions)));
        }
        let sizes: CoordVec = SmallVec::from_elem(1, dimensions);
        Ok(MazeEngine {
            dimensions,
            state: Mutex::new(EngineState {
                cells: SparseGrid::new(&sizes)?,
                rng,
                endpoints: None,
            }),
        })
    }

    /// Errors never leave the state half updated beyond what their contract allows, so a poisoned
    /// lock is still usable.
    fn lock(&self) -> MutexGuard<EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_rng(&self, rng: Box<dyn RngCore + Send>) {
        self.lock().rng = rng;
    }

    pub fn set_seed(&self, seed: u64) {
        self.set_rng(Box::new(XorShiftRng::seed_from_u64(seed)));
    }

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn size(&self, axis: usize) -> Result<usize> {
        self.lock().cells.size(axis)
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.lock().cells.sizes().to_vec()
    }

    pub fn capacity(&self) -> CellsCount {
        self.lock().cells.capacity()
    }

    /// Materialized cells, which after a generation is every cell.
    pub fn visited_count(&self) -> usize {
        self.lock().cells.len()
    }

    /// Replace the whole size vector and clear the maze.
    pub fn set_size(&self, sizes: &[usize]) -> Result<()> {
        if sizes.len() != self.dimensions {
            bail!(ErrorKind::ArgumentInvalid(format!("expected {} axis lengths, got {}",
                                                     self.dimensions, sizes.len())));
        }
        if let Some(axis) = sizes.iter().position(|&length| length < 1) {
            bail!(ErrorKind::ArgumentInvalid(format!("axis {} must have a positive length", axis)));
        }

        let mut state = self.lock();
        state.cells.resize(sizes)?;
        state.cells.clear();
        state.endpoints = None;
        debug!(?sizes, "maze resized");
        Ok(())
    }

    /// Change one axis length. The maze is only cleared if the length actually changes.
    pub fn set_size_axis(&self, axis: usize, length: usize) -> Result<()> {
        if axis >= self.dimensions {
            bail!(ErrorKind::OutOfRange(format!("axis {} of a {} dimensional maze", axis, self.dimensions)));
        }
        if length < 1 {
            bail!(ErrorKind::ArgumentInvalid(format!("axis {} must have a positive length", axis)));
        }

        let mut state = self.lock();
        if state.cells.resize_axis(axis, length)? {
            state.endpoints = None;
            debug!(axis, length, "maze axis resized, cells cleared");
        }
        Ok(())
    }

    /// Carve a new perfect maze over the current size, replacing whatever was there.
    ///
    /// `start` defaults to the origin and `end` to the far corner. Hints may be shorter than the
    /// dimension count (missing components take the default) and any component outside the grid
    /// is clamped onto it. The clamped pair is reported by `endpoints` afterwards.
    pub fn generate(&self, start: Option<&[i64]>, end: Option<&[i64]>) -> Result<()> {
        let mut state = self.lock();
        let sizes: CoordVec = CoordVec::from_slice(state.cells.sizes());
        let start = clamp_hint(start, &sizes, 0)?;
        let end = clamp_hint(end, &sizes, i64::MAX)?;

        let state = &mut *state;
        state.endpoints = None;
        generators::recursive_backtracker(&mut state.cells, state.rng.as_mut(), &start)?;
        state.endpoints = Some((start, end));
        Ok(())
    }

    /// The clamped start and end of the last successful generation.
    pub fn endpoints(&self) -> Option<(CoordIndex, CoordIndex)> {
        self.lock().endpoints.clone()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.cells.clear();
        state.endpoints = None;
    }

    pub fn cell(&self, coords: &[usize]) -> Result<Option<Cell>> {
        Ok(self.lock().cells.get(coords)?.cloned())
    }

    /// The stored cell, or a walled one if the coordinate was never visited.
    pub fn cell_or_walled(&self, coords: &[usize]) -> Result<Cell> {
        Ok(self.cell(coords)?.unwrap_or_else(Cell::walled))
    }

    /// Overwrite a cell's flag, creating the cell if needed.
    pub fn set_cell_flag(&self, coords: &[usize], flag: u32) -> Result<()> {
        self.lock()
            .cells
            .entry_or_insert_with(coords, Cell::walled)?
            .set_flag(flag);
        Ok(())
    }

    /// Every cell in linear order, `None` for coordinates never visited.
    pub fn cells(&self) -> Vec<Option<Cell>> {
        self.lock().cells.iter().map(|cell| cell.cloned()).collect()
    }

    /// Every cell flag in linear order, 0 for coordinates never visited.
    pub fn flags(&self) -> Vec<u32> {
        self.lock().cells.iter().map(|cell| cell.map_or(0, Cell::flag)).collect()
    }

    /// Run `f` against the grid while holding the engine lock.
    pub fn with_grid<F, R>(&self, f: F) -> R
        where F: FnOnce(&SparseGrid<Cell>) -> R
    {
        f(&self.lock().cells)
    }

    pub(crate) fn with_grid_mut<F, R>(&self, f: F) -> R
        where F: FnOnce(&mut SparseGrid<Cell>) -> R
    {
        f(&mut self.lock().cells)
    }

    /// A copy of the grid as it is now.
    pub fn snapshot(&self) -> SparseGrid<Cell> {
        self.lock().cells.clone()
    }

    /// Project the sparse grid onto a dense array with one axis per maze axis. Coordinates never
    /// visited hold a walled cell.
    #[cfg(feature = "dense")]
    pub fn to_dense(&self) -> Result<DenseMaze> {
        let state = self.lock();
        let mut dense = DenseMaze::from_elem(ndarray::IxDyn(state.cells.sizes()), Cell::walled());
        for (coord, cell) in state.cells.stored() {
            if let Some(slot) = dense.get_mut(coord.coordinates()) {
                *slot = *cell;
            }
        }
        Ok(dense)
    }

    #[cfg(not(feature = "dense"))]
    pub fn to_dense(&self) -> Result<DenseMaze> {
        bail!(ErrorKind::UnsupportedOperation("dense export needs the `dense` feature".to_string()))
    }

    /// Every open passage as the linear indices of the two cells it joins, lower index first,
    /// sorted. A passage is read from the forward face of its lower cell.
    pub fn passages(&self) -> Vec<(LinearIndex, LinearIndex)> {
        let state = self.lock();
        let sizes = state.cells.sizes();
        let mut passages = Vec::with_capacity(state.cells.len());
        for (coord, cell) in state.cells.stored() {
            for axis in 0..self.dimensions {
                if !cell.is_connected(axis, Direction::Forward) {
                    continue;
                }
                let next = match coord.neighbour(axis, Direction::Forward, sizes) {
                    Some(next) => next,
                    None => continue,
                };
                if let (Ok(from), Ok(to)) = (coord.to_linear(sizes), next.to_linear(sizes)) {
                    passages.push((from, to));
                }
            }
        }
        passages.sort();
        passages
    }

    pub fn passage_count(&self) -> PassagesCount {
        PassagesCount(self.passages().len())
    }

    /// The maze as an undirected graph: node `i` is the cell at linear index `i`, one edge per
    /// passage. Allocates a node for every cell of the grid.
    pub fn passage_graph(&self) -> Result<UnGraph<(), ()>> {
        let CellsCount(cells) = self.capacity();
        if u32::try_from(cells).is_err() {
            bail!(ErrorKind::OutOfRange(format!("{} cells do not fit a graph index", cells)));
        }

        let passages = self.passages();
        let mut graph: UnGraph<(), ()> = UnGraph::with_capacity(cells, passages.len());
        for _ in 0..cells {
            graph.add_node(());
        }
        for (LinearIndex(a), LinearIndex(b)) in passages {
            graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
        }
        Ok(graph)
    }
}

/// Resolve an optional coordinate hint against the grid bounds, clamping each component onto its
/// axis. Missing trailing components take `fill` before clamping.
fn clamp_hint(hint: Option<&[i64]>, sizes: &[usize], fill: i64) -> Result<CoordIndex> {
    let hint = hint.unwrap_or(&[]);
    if hint.len() > sizes.len() {
        bail!(ErrorKind::ArgumentInvalid(format!("a coordinate hint of {} components for a {} dimensional maze",
                                                 hint.len(), sizes.len())));
    }

    let coords = sizes.iter()
                      .enumerate()
                      .map(|(axis, &size)| {
                          let wanted = hint.get(axis).cloned().unwrap_or(fill);
                          let last = i64::try_from(size - 1).unwrap_or(i64::MAX);
                          wanted.max(0).min(last) as usize
                      })
                      .collect::<CoordVec>();
    Ok(CoordIndex::from_vec(coords))
}
