use itertools::iproduct;

/// The largest axis count whose wall bits fit in a cell flag: two bits per axis in 32 bits.
pub const MAX_AXES: usize = 16;

/// Which face of a cell along one axis.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub enum Direction {
    /// Towards the next coordinate on the axis (+1).
    Forward = 0,
    /// Towards the previous coordinate on the axis (-1).
    Backward = 1,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Forward, Direction::Backward];

    #[inline]
    pub fn from_backward(backward: bool) -> Direction {
        if backward {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    #[inline]
    pub fn is_backward(self) -> bool {
        self == Direction::Backward
    }

    /// Step along the axis: +1 forward, -1 backward.
    #[inline]
    pub fn offset(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// How a freshly constructed cell starts out.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum WallMode {
    /// Every face has a wall (flag 0). This is what carving materializes.
    Walled,
    /// Every face is open (flag all ones). Only useful for seeding a grid by hand.
    Open,
}

/// Wall state of one grid cell across all axes.
///
/// Each axis owns two bits of the flag at `axis * 2 + (backward ? 1 : 0)`.
/// A set bit is an open passage, a clear bit a wall.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Default, Hash)]
pub struct Cell {
    flag: u32,
}

impl Cell {
    pub fn new(mode: WallMode) -> Cell {
        match mode {
            WallMode::Walled => Cell { flag: 0 },
            WallMode::Open => Cell { flag: !0 },
        }
    }

    #[inline]
    pub fn walled() -> Cell {
        Cell::new(WallMode::Walled)
    }

    #[inline]
    pub fn open() -> Cell {
        Cell::new(WallMode::Open)
    }

    #[inline]
    pub fn from_flag(flag: u32) -> Cell {
        Cell { flag }
    }

    #[inline]
    pub fn flag(&self) -> u32 {
        self.flag
    }

    #[inline]
    pub fn set_flag(&mut self, flag: u32) {
        self.flag = flag;
    }

    #[inline]
    pub fn has_wall(&self, axis: usize, direction: Direction) -> bool {
        self.flag & wall_bit(axis, direction) == 0
    }

    #[inline]
    pub fn is_connected(&self, axis: usize, direction: Direction) -> bool {
        !self.has_wall(axis, direction)
    }

    /// Open the passage through the given face.
    #[inline]
    pub fn connect(&mut self, axis: usize, direction: Direction) {
        self.flag |= wall_bit(axis, direction);
    }

    /// Put a wall back on the given face.
    #[inline]
    pub fn disconnect(&mut self, axis: usize, direction: Direction) {
        self.flag &= !wall_bit(axis, direction);
    }

    /// No face is open. Carving treats such a cell as never visited.
    #[inline]
    pub fn is_unconnected(&self) -> bool {
        self.flag == 0
    }

    /// Count of open faces over the first `dimensions` axes.
    pub fn passages(&self, dimensions: usize) -> usize {
        iproduct!(0..dimensions.min(MAX_AXES), Direction::ALL.iter())
            .filter(|&(axis, &direction)| self.is_connected(axis, direction))
            .count()
    }
}

#[inline]
fn wall_bit(axis: usize, direction: Direction) -> u32 {
    debug_assert!(axis < MAX_AXES, "axis {} has no wall bits", axis);
    1 << (axis * 2 + direction as usize)
}
