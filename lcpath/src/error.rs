use raster::{GridIndex, RasterError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LcpError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("{which} {index} is outside the {height}x{width} grid")]
    InvalidInput {
        which: &'static str,
        index: GridIndex,
        height: usize,
        width: usize,
    },

    #[error("cell {index} has cost {value}; costs must be finite and positive")]
    InvalidCostValue { index: GridIndex, value: f64 },

    #[error("no route from {start} to {end}")]
    Unreachable { start: GridIndex, end: GridIndex },

    #[error("search interrupted after finalizing {expanded} cells")]
    Interrupted { expanded: usize },

    #[error("{0}")]
    Raster(#[from] RasterError),
}
