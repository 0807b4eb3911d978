//! Binary persistence of a maze.
//!
//! The layout is a flat run of little-endian 32-bit signed integers with no header:
//!
//! ```text
//! dimension count | size of axis 0 .. size of axis D-1 | flag of linear index 0 .. ∏size - 1
//! ```
//!
//! Flags are the raw wall bits of each cell, reinterpreted as signed. Coordinates never visited
//! are written as 0.

use std::convert::TryFrom;
use std::io::{self, Read, Write};

use error_chain::bail;
use tracing::debug;

use crate::cells::Cell;
use crate::engine::{MazeEngine, MAX_DIMENSIONS, MIN_DIMENSIONS};
use crate::errors::{ErrorKind, Result};
use crate::sparse_grid::SparseGrid;
use crate::units::{CellsCount, LinearIndex};

fn write_i32_le<W: Write>(w: &mut W, v: i32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_exact<const N: usize, R: Read>(r: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_i32_le<R: Read>(r: &mut R) -> io::Result<i32> {
    Ok(i32::from_le_bytes(read_exact::<4, _>(r)?))
}

/// Serialize the engine's dimension count, sizes and every cell flag in linear order.
pub fn write_maze<W: Write>(engine: &MazeEngine, mut writer: W) -> Result<()> {
    engine.with_grid(|grid| write_grid(grid, &mut writer))?;
    writer.flush()?;
    Ok(())
}

fn write_grid<W: Write>(grid: &SparseGrid<Cell>, writer: &mut W) -> Result<()> {
    write_i32_le(writer, to_i32(grid.dimensions(), "dimension count")?)?;
    for &size in grid.sizes() {
        write_i32_le(writer, to_i32(size, "axis length")?)?;
    }
    for cell in grid.iter() {
        let flag = cell.map_or(0, Cell::flag);
        write_i32_le(writer, flag as i32)?;
    }
    debug!(sizes = ?grid.sizes(), "maze written");
    Ok(())
}

/// Rebuild an engine from the layout `write_maze` produces.
///
/// Every flag read is stored, so all coordinates of the result are materialized. The engine's
/// random source is seeded from entropy.
pub fn read_maze<R: Read>(mut reader: R) -> Result<MazeEngine> {
    let dimensions = read_i32_le(&mut reader)?;
    let dimensions = usize::try_from(dimensions)
        .ok()
        .filter(|d| (MIN_DIMENSIONS..=MAX_DIMENSIONS).contains(d))
        .ok_or_else(|| ErrorKind::ArgumentInvalid(format!("dimension count {} is not between {} and {}",
                                                          dimensions, MIN_DIMENSIONS, MAX_DIMENSIONS)))?;

    let mut sizes = Vec::with_capacity(dimensions);
    for axis in 0..dimensions {
        let size = read_i32_le(&mut reader)?;
        if size < 1 {
            bail!(ErrorKind::ArgumentInvalid(format!("axis {} has length {}", axis, size)));
        }
        sizes.push(size as usize);
    }

    let engine = MazeEngine::new(dimensions)?;
    engine.set_size(&sizes)?;

    let CellsCount(cells) = engine.capacity();
    engine.with_grid_mut(|grid| -> Result<()> {
        for index in 0..cells {
            let flag = read_i32_le(&mut reader)? as u32;
            grid.set_linear(LinearIndex(index), Cell::from_flag(flag))?;
        }
        Ok(())
    })?;
    debug!(?sizes, cells, "maze read");
    Ok(engine)
}

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| ErrorKind::ArgumentInvalid(format!("{} {} does not fit the binary format", what, value)).into())
}

impl MazeEngine {
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        write_maze(self, writer)
    }

    pub fn read_from<R: Read>(reader: R) -> Result<MazeEngine> {
        read_maze(reader)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        write_maze(self, &mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<MazeEngine> {
        read_maze(bytes)
    }
}
