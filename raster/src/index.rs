use std::fmt;

/// A `(row, col)` position in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridIndex {
    pub row: usize,
    pub col: usize,
}

impl GridIndex {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns the index displaced by `(d_row, d_col)`, or `None` if
    /// the result falls outside a `height × width` grid.
    #[must_use]
    pub fn offset(
        self,
        (d_row, d_col): (isize, isize),
        height: usize,
        width: usize,
    ) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        if row < height && col < width {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// Returns `true` if `other` is one of the 8 cells surrounding
    /// `self`.
    pub fn is_adjacent(self, other: Self) -> bool {
        let d_row = self.row.abs_diff(other.row);
        let d_col = self.col.abs_diff(other.col);
        d_row <= 1 && d_col <= 1 && self != other
    }

    /// Returns `true` if `other` is diagonally adjacent to `self`.
    pub fn is_diagonal(self, other: Self) -> bool {
        self.row.abs_diff(other.row) == 1 && self.col.abs_diff(other.col) == 1
    }
}

impl From<(usize, usize)> for GridIndex {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
