use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

use error_chain::bail;
use itertools::Itertools;
use smallvec::{smallvec, SmallVec};

use crate::cells::Direction;
use crate::errors::{ErrorKind, Result};
use crate::units::LinearIndex;
use crate::utils;

/// Inline storage for the components of a coordinate; heap allocates only beyond 4 axes.
pub type CoordVec = SmallVec<[usize; 4]>;

/// An immutable N-dimensional grid coordinate.
///
/// The structural hash is computed once at construction. Equality compares the components and
/// ordering is lexicographic, which for coordinates of one size vector is the same as comparing
/// their row-major linear indices (last axis fastest).
#[derive(Clone)]
pub struct CoordIndex {
    coords: CoordVec,
    hash: u64,
}

impl CoordIndex {
    pub fn new(coords: &[usize]) -> CoordIndex {
        CoordIndex::from_vec(CoordVec::from_slice(coords))
    }

    pub fn from_vec(coords: CoordVec) -> CoordIndex {
        let hash = structural_hash(&coords);
        CoordIndex { coords, hash }
    }

    /// The all-zero coordinate.
    pub fn origin(dimensions: usize) -> CoordIndex {
        CoordIndex::from_vec(smallvec![0; dimensions])
    }

    /// Convert a row-major linear index back into a coordinate for the given axis lengths.
    pub fn from_linear(index: LinearIndex, sizes: &[usize]) -> Result<CoordIndex> {
        let capacity = utils::cells_count(sizes).ok_or_else(|| {
            ErrorKind::ArgumentInvalid(format!("grid of sizes {:?} is too large to index", sizes))
        })?;
        let LinearIndex(index) = index;
        if index >= capacity {
            bail!(ErrorKind::OutOfRange(format!("linear index {} is outside a grid of {} cells", index, capacity)));
        }

        let mut coords: CoordVec = smallvec![0; sizes.len()];
        let mut remainder = index;
        for axis in (0..sizes.len()).rev() {
            coords[axis] = remainder % sizes[axis];
            remainder /= sizes[axis];
        }
        Ok(CoordIndex::from_vec(coords))
    }

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn coordinates(&self) -> &[usize] {
        &self.coords
    }

    #[inline]
    pub fn memoized_hash(&self) -> u64 {
        self.hash
    }

    /// Is every component inside `0..sizes[axis]`? Coordinates of a different arity never are.
    pub fn is_within(&self, sizes: &[usize]) -> bool {
        self.coords.len() == sizes.len() &&
        self.coords.iter().zip(sizes).all(|(&c, &size)| c < size)
    }

    /// Row-major linear index of this coordinate: `index = index * sizes[axis] + coord[axis]`.
    pub fn to_linear(&self, sizes: &[usize]) -> Result<LinearIndex> {
        if self.coords.len() != sizes.len() {
            bail!(ErrorKind::ArgumentInvalid(format!("coordinate {} does not have {} axes", self, sizes.len())));
        }

        let mut index = 0usize;
        for (axis, (&c, &size)) in self.coords.iter().zip(sizes).enumerate() {
            if c >= size {
                bail!(ErrorKind::OutOfRange(format!("value {} of axis {} in {} is outside length {}",
                                                    c, axis, self, size)));
            }
            index = index.checked_mul(size)
                         .and_then(|i| i.checked_add(c))
                         .ok_or_else(|| ErrorKind::OutOfRange(format!("linear index of {} overflows", self)))?;
        }
        Ok(LinearIndex(index))
    }

    /// The adjacent coordinate one step along `axis`, if it is inside the grid.
    pub fn neighbour(&self, axis: usize, direction: Direction, sizes: &[usize]) -> Option<CoordIndex> {
        let current = *self.coords.get(axis)?;
        let size = *sizes.get(axis)?;
        let next = (current as isize).checked_add(direction.offset())?;
        if next < 0 || next as usize >= size {
            return None;
        }
        let mut coords = self.coords.clone();
        coords[axis] = next as usize;
        Some(CoordIndex::from_vec(coords))
    }
}

fn structural_hash(coords: &[usize]) -> u64 {
    coords.iter()
          .enumerate()
          .fold(0u64, |hash, (axis, &c)| {
              let c = c as u64;
              let mixed = (c << 1) ^ (c >> 63);
              hash.wrapping_add(utils::axis_prime(axis).wrapping_mul(mixed.wrapping_add(1)))
          })
}

impl PartialEq for CoordIndex {
    fn eq(&self, other: &CoordIndex) -> bool {
        self.hash == other.hash && self.coords == other.coords
    }
}
impl Eq for CoordIndex {}

impl Ord for CoordIndex {
    fn cmp(&self, other: &CoordIndex) -> Ordering {
        self.coords.cmp(&other.coords)
    }
}
impl PartialOrd for CoordIndex {
    fn partial_cmp(&self, other: &CoordIndex) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for CoordIndex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl Deref for CoordIndex {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.coords
    }
}

impl AsRef<[usize]> for CoordIndex {
    fn as_ref(&self) -> &[usize] {
        &self.coords
    }
}

impl<'a> From<&'a [usize]> for CoordIndex {
    fn from(coords: &'a [usize]) -> CoordIndex {
        CoordIndex::new(coords)
    }
}

impl From<Vec<usize>> for CoordIndex {
    fn from(coords: Vec<usize>) -> CoordIndex {
        CoordIndex::from_vec(CoordVec::from_vec(coords))
    }
}

impl fmt::Display for CoordIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.coords.iter().join(", "))
    }
}

impl fmt::Debug for CoordIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CoordIndex{}", self)
    }
}
