//! Terrain analysis over elevation [`Grid`](raster::Grid)s.
//!
//! [`slope`] turns elevations into slope magnitude (degrees) and
//! [`CostSurface`] normalizes slope into a bounded traversal cost.

mod cost;
mod error;
mod slope;

pub use crate::{
    cost::{CostSurface, CostSurfaceBuilder, PENALTY_COST},
    error::TerrainError,
    slope::{slope, slope_from_transform},
};
pub use raster;
