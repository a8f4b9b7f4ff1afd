//! Dense, georeferenced grids.
//!
//! A [`Grid`] is a row-major array of `height × width` cells paired
//! with a [`GeoTransform`] mapping fractional `(col, row)` positions
//! to ground `(x, y)` coordinates. Grids taking part in one
//! computation are expected to be co-registered: identical shape and
//! identical transform.

mod error;
mod grid;
mod index;
mod transform;

pub use crate::{
    error::RasterError,
    grid::Grid,
    index::GridIndex,
    transform::GeoTransform,
};
pub use geo;
