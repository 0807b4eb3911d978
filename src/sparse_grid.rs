//! A map-backed N-dimensional grid.
//!
//! The grid reports dense bounds (`size(axis)`, `capacity()`) while only storing the coordinates
//! that were written. Iteration walks every coordinate in linear order and yields `None` for the
//! ones that were never stored.

use std::fmt;

use error_chain::bail;
use tracing::warn;

use crate::coordinates::{CoordIndex, CoordVec};
use crate::errors::{ErrorKind, Result};
use crate::units::{CellsCount, LinearIndex};
use crate::utils::{self, FnvHashMap};

#[derive(Clone)]
pub struct SparseGrid<T> {
    sizes: CoordVec,
    capacity: usize,
    cells: FnvHashMap<CoordIndex, T>,
}

impl<T: fmt::Debug> fmt::Debug for SparseGrid<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SparseGrid :: sizes: {:?}, capacity: {:?}, stored: {:?}",
               self.sizes, self.capacity, self.cells.len())
    }
}

impl<T> SparseGrid<T> {
    pub fn new(sizes: &[usize]) -> Result<SparseGrid<T>> {
        if sizes.is_empty() {
            bail!(ErrorKind::ArgumentInvalid("a grid needs at least one axis".to_string()));
        }
        let capacity = checked_capacity(sizes)?;

        Ok(SparseGrid {
            sizes: CoordVec::from_slice(sizes),
            capacity,
            cells: utils::fnv_hashmap(0),
        })
    }

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn size(&self, axis: usize) -> Result<usize> {
        self.sizes
            .get(axis)
            .cloned()
            .ok_or_else(|| ErrorKind::OutOfRange(format!("axis {} of a {} dimensional grid", axis, self.dimensions())).into())
    }

    /// Cell count of the equivalent dense grid.
    #[inline]
    pub fn capacity(&self) -> CellsCount {
        CellsCount(self.capacity)
    }

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Build the map key for a coordinate, checking arity and every axis bound.
    fn key(&self, coords: &[usize]) -> Result<CoordIndex> {
        if coords.len() != self.dimensions() {
            bail!(ErrorKind::ArgumentInvalid(format!("expected {} coordinates, got {}",
                                                     self.dimensions(), coords.len())));
        }
        if let Some(axis) = (0..coords.len()).find(|&axis| coords[axis] >= self.sizes[axis]) {
            bail!(ErrorKind::OutOfRange(format!("value {} of axis {} is outside length {}",
                                                coords[axis], axis, self.sizes[axis])));
        }
        Ok(CoordIndex::new(coords))
    }

    fn linear_key(&self, index: LinearIndex) -> Result<CoordIndex> {
        CoordIndex::from_linear(index, &self.sizes)
    }

    pub fn get(&self, coords: &[usize]) -> Result<Option<&T>> {
        let key = self.key(coords)?;
        Ok(self.cells.get(&key))
    }

    pub fn get_mut(&mut self, coords: &[usize]) -> Result<Option<&mut T>> {
        let key = self.key(coords)?;
        Ok(self.cells.get_mut(&key))
    }

    pub fn contains(&self, coords: &[usize]) -> Result<bool> {
        let key = self.key(coords)?;
        Ok(self.cells.contains_key(&key))
    }

    /// Store a value, returning the one it replaced.
    pub fn set(&mut self, coords: &[usize], value: T) -> Result<Option<T>> {
        let key = self.key(coords)?;
        Ok(self.cells.insert(key, value))
    }

    /// Store a value at a coordinate that must not already hold one.
    pub fn add(&mut self, coords: &[usize], value: T) -> Result<()> {
        let key = self.key(coords)?;
        if self.cells.contains_key(&key) {
            bail!(ErrorKind::ArgumentInvalid(format!("an entry already exists at {}", key)));
        }
        self.cells.insert(key, value);
        Ok(())
    }

    /// Fetch the value at a coordinate, materializing it with `default` first if absent.
    pub fn entry_or_insert_with<F>(&mut self, coords: &[usize], default: F) -> Result<&mut T>
        where F: FnOnce() -> T
    {
        let key = self.key(coords)?;
        Ok(self.cells.entry(key).or_insert_with(default))
    }

    pub fn remove(&mut self, coords: &[usize]) -> Result<Option<T>> {
        let key = self.key(coords)?;
        Ok(self.cells.remove(&key))
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn get_linear(&self, index: LinearIndex) -> Result<Option<&T>> {
        let key = self.linear_key(index)?;
        Ok(self.cells.get(&key))
    }

    pub fn set_linear(&mut self, index: LinearIndex, value: T) -> Result<Option<T>> {
        let key = self.linear_key(index)?;
        Ok(self.cells.insert(key, value))
    }

    /// Every coordinate in linear order, `None` where nothing is stored.
    pub fn iter(&self) -> Iter<T> {
        Iter {
            grid: self,
            current_index: 0,
            cells_count: self.capacity,
        }
    }

    /// Like `iter` but paired with each coordinate.
    pub fn iter_indexed(&self) -> IndexedIter<T> {
        IndexedIter { inner: self.iter() }
    }

    /// Only the stored entries, in no particular order.
    pub fn stored(&self) -> impl Iterator<Item = (&CoordIndex, &T)> {
        self.cells.iter()
    }

    /// Change every axis length. Clears all entries if any length changed and returns whether it did.
    pub fn resize(&mut self, sizes: &[usize]) -> Result<bool> {
        self.check_sizes(sizes)?;
        let capacity = checked_capacity(sizes)?;
        if sizes == &self.sizes[..] {
            return Ok(false);
        }
        self.sizes = CoordVec::from_slice(sizes);
        self.capacity = capacity;
        self.cells.clear();
        Ok(true)
    }

    /// Change one axis length. Clears all entries if the length changed and returns whether it did.
    pub fn resize_axis(&mut self, axis: usize, length: usize) -> Result<bool> {
        if axis >= self.dimensions() {
            bail!(ErrorKind::OutOfRange(format!("axis {} of a {} dimensional grid", axis, self.dimensions())));
        }
        let mut sizes = self.sizes.clone();
        sizes[axis] = length;
        self.resize(&sizes)
    }

    /// Change the axis lengths but keep every entry. Entries left outside the new bounds are stale
    /// until `compact` runs: they are unreachable through the bounds checked accessors.
    pub fn reshape(&mut self, sizes: &[usize]) -> Result<()> {
        self.check_sizes(sizes)?;
        self.capacity = checked_capacity(sizes)?;
        self.sizes = CoordVec::from_slice(sizes);
        Ok(())
    }

    /// Drop every entry whose coordinate is outside the current bounds. Returns how many went.
    pub fn compact(&mut self) -> usize {
        let before = self.cells.len();
        let sizes = &self.sizes;
        self.cells.retain(|key, _| key.is_within(sizes));
        let dropped = before - self.cells.len();
        if dropped > 0 {
            warn!(dropped, "discarded stale grid entries outside {:?}", self.sizes);
        }
        dropped
    }

    fn check_sizes(&self, sizes: &[usize]) -> Result<()> {
        if sizes.len() != self.dimensions() {
            bail!(ErrorKind::ArgumentInvalid(format!("expected {} axis lengths, got {}",
                                                     self.dimensions(), sizes.len())));
        }
        Ok(())
    }
}

fn checked_capacity(sizes: &[usize]) -> Result<usize> {
    if let Some(axis) = sizes.iter().position(|&size| size < 1) {
        bail!(ErrorKind::ArgumentInvalid(format!("axis {} has length 0", axis)));
    }
    utils::cells_count(sizes)
        .ok_or_else(|| ErrorKind::ArgumentInvalid(format!("grid of sizes {:?} is too large", sizes)).into())
}

pub struct Iter<'a, T> {
    grid: &'a SparseGrid<T>,
    current_index: usize,
    cells_count: usize,
}

impl<'a, T> fmt::Debug for Iter<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "Iter :: current_index: {:?}, cells_count: {:?}",
               self.current_index,
               self.cells_count)
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {} // default impl using size_hint()
impl<'a, T> Iterator for Iter<'a, T> {
    type Item = Option<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_indexed().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let lower_bound = self.cells_count - self.current_index;
        let upper_bound = lower_bound;
        (lower_bound, Some(upper_bound))
    }
}

impl<'a, T> Iter<'a, T> {
    fn next_indexed(&mut self) -> Option<(CoordIndex, Option<&'a T>)> {
        if self.current_index < self.cells_count {
            let key = CoordIndex::from_linear(LinearIndex(self.current_index), &self.grid.sizes).ok()?;
            self.current_index += 1;
            let value = self.grid.cells.get(&key);
            Some((key, value))
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub struct IndexedIter<'a, T> {
    inner: Iter<'a, T>,
}

impl<'a, T> ExactSizeIterator for IndexedIter<'a, T> {}
impl<'a, T> Iterator for IndexedIter<'a, T> {
    type Item = (CoordIndex, Option<&'a T>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_indexed()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {

    use itertools::Itertools;

    use super::*;
    use crate::errors::ErrorKind;

    fn grid(sizes: &[usize]) -> SparseGrid<char> {
        SparseGrid::new(sizes).expect("valid grid sizes")
    }

    fn assert_out_of_range<V: fmt::Debug>(result: Result<V>) {
        match *result.unwrap_err().kind() {
            ErrorKind::OutOfRange(_) => {}
            ref other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    fn assert_argument_invalid<V: fmt::Debug>(result: Result<V>) {
        match *result.unwrap_err().kind() {
            ErrorKind::ArgumentInvalid(_) => {}
            ref other => panic!("expected ArgumentInvalid, got {:?}", other),
        }
    }

    #[test]
    fn dense_metadata_without_storage() {
        let g = grid(&[3, 4, 5]);
        assert_eq!(g.dimensions(), 3);
        assert_eq!(g.size(0).unwrap(), 3);
        assert_eq!(g.size(2).unwrap(), 5);
        assert_eq!(g.capacity(), CellsCount(60));
        assert_eq!(g.len(), 0);
        assert!(g.is_empty());
        assert_out_of_range(g.size(3));
    }

    #[test]
    fn construction_is_validated() {
        assert_argument_invalid(SparseGrid::<char>::new(&[]));
        assert_argument_invalid(SparseGrid::<char>::new(&[3, 0]));
        assert_argument_invalid(SparseGrid::<char>::new(&[usize::MAX, 3]));
    }

    #[test]
    fn get_and_set() {
        let mut g = grid(&[2, 3]);
        assert_eq!(g.get(&[1, 2]).unwrap(), None);
        assert_eq!(g.set(&[1, 2], 'a').unwrap(), None);
        assert_eq!(g.get(&[1, 2]).unwrap(), Some(&'a'));
        assert_eq!(g.set(&[1, 2], 'b').unwrap(), Some('a'));
        assert!(g.contains(&[1, 2]).unwrap());
        assert!(!g.contains(&[0, 2]).unwrap());
        *g.get_mut(&[1, 2]).unwrap().unwrap() = 'c';
        assert_eq!(g.get_linear(LinearIndex(5)).unwrap(), Some(&'c'));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn access_is_bounds_checked() {
        let mut g = grid(&[2, 3]);
        assert_out_of_range(g.get(&[2, 0]));
        assert_out_of_range(g.get(&[0, 3]));
        assert_out_of_range(g.set(&[5, 5], 'x'));
        assert_out_of_range(g.get_linear(LinearIndex(6)));
        assert_argument_invalid(g.get(&[0]));
        assert_argument_invalid(g.set(&[0, 0, 0], 'x'));
        assert!(g.is_empty());
    }

    #[test]
    fn add_refuses_existing_keys() {
        let mut g = grid(&[2, 2]);
        g.add(&[0, 1], 'a').unwrap();
        assert_argument_invalid(g.add(&[0, 1], 'b'));
        assert_eq!(g.get(&[0, 1]).unwrap(), Some(&'a'));
    }

    #[test]
    fn entry_materializes_lazily() {
        let mut g = grid(&[2, 2]);
        *g.entry_or_insert_with(&[1, 0], || 'a').unwrap() = 'b';
        assert_eq!(*g.entry_or_insert_with(&[1, 0], || 'z').unwrap(), 'b');
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let mut g = grid(&[2, 2]);
        g.set(&[0, 0], 'a').unwrap();
        g.set(&[1, 1], 'b').unwrap();
        assert_eq!(g.remove(&[0, 0]).unwrap(), Some('a'));
        assert_eq!(g.remove(&[0, 0]).unwrap(), None);
        assert_eq!(g.len(), 1);
        g.clear();
        assert!(g.is_empty());
    }

    #[test]
    fn iteration_is_in_linear_order_with_missing_markers() {
        let mut g = grid(&[2, 2]);
        g.set(&[1, 0], 'c').unwrap();
        g.set_linear(LinearIndex(1), 'b').unwrap();
        let values: Vec<Option<char>> = g.iter().map(|v| v.cloned()).collect();
        assert_eq!(values, vec![None, Some('b'), Some('c'), None]);
        assert_eq!(g.iter().len(), 4);

        let coords: Vec<Vec<usize>> = g.iter_indexed().map(|(key, _)| key.to_vec()).collect();
        assert_eq!(coords, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);

        let stored: Vec<char> = g.stored().map(|(_, &v)| v).sorted().collect();
        assert_eq!(stored, vec!['b', 'c']);
    }

    #[test]
    fn resize_clears_only_on_change() {
        let mut g = grid(&[3, 3]);
        g.set(&[2, 2], 'a').unwrap();

        assert!(!g.resize(&[3, 3]).unwrap());
        assert!(!g.resize_axis(1, 3).unwrap());
        assert_eq!(g.len(), 1);

        assert!(g.resize_axis(1, 4).unwrap());
        assert_eq!(g.sizes(), &[3, 4]);
        assert_eq!(g.capacity(), CellsCount(12));
        assert!(g.is_empty());

        g.set(&[0, 3], 'b').unwrap();
        assert!(g.resize(&[5, 5]).unwrap());
        assert!(g.is_empty());
    }

    #[test]
    fn resize_is_validated_before_mutation() {
        let mut g = grid(&[3, 3]);
        g.set(&[1, 1], 'a').unwrap();
        assert_argument_invalid(g.resize(&[3]));
        assert_argument_invalid(g.resize(&[3, 0]));
        assert_argument_invalid(g.resize_axis(0, 0));
        assert_out_of_range(g.resize_axis(2, 3));
        assert_eq!(g.sizes(), &[3, 3]);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn compaction_purges_stale_entries_after_reshape() {
        let mut g = grid(&[4, 4]);
        g.set(&[0, 0], 'a').unwrap();
        g.set(&[3, 1], 'b').unwrap();
        g.set(&[1, 3], 'c').unwrap();

        g.reshape(&[2, 2]).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.capacity(), CellsCount(4));
        assert_out_of_range(g.get(&[3, 1]));

        assert_eq!(g.compact(), 2);
        assert_eq!(g.len(), 1);
        assert_eq!(g.get(&[0, 0]).unwrap(), Some(&'a'));
        assert_eq!(g.compact(), 0);
    }
}
