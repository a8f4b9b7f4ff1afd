/// `(d_row, d_col)` offsets of the 8 surrounding cells, clockwise
/// from north: N, NE, E, SE, S, SW, W, NW.
///
/// Rows grow southward. Search expansion always visits neighbors in
/// this order, which makes results reproducible.
pub const NEIGHBORS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Returns `true` for the four diagonal offsets.
#[inline]
pub(crate) fn is_diagonal((d_row, d_col): (isize, isize)) -> bool {
    d_row != 0 && d_col != 0
}
