//! # Least-cost paths
//!
//! `lcpath` finds the cheapest 8-connected route between two cells of
//! a cost grid, such as the friction surfaces produced by the
//! `terrain` crate.
//!
//! ```no_run
//! use lcpath::{raster::GridIndex, Path};
//! # fn run(cost: &lcpath::raster::Grid<f64>) -> Result<(), lcpath::LcpError> {
//! let path = Path::builder()
//!     .start(GridIndex::new(0, 0))
//!     .end(GridIndex::new(120, 340))
//!     .build(cost)?;
//! let mask = path.rasterize(cost)?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod interrupt;
mod neighbors;
mod path;
mod search;

pub use crate::{
    error::LcpError,
    interrupt::{Deadline, Interrupt, Never},
    neighbors::NEIGHBORS,
    path::Path,
    search::{PathBuilder, DEFAULT_CHECK_INTERVAL},
};
pub use {geo, raster};
