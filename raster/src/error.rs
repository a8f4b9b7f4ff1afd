use crate::GridIndex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("coordinate ({x}, {y}) is outside the {height}x{width} grid")]
    OutOfBounds {
        x: f64,
        y: f64,
        height: usize,
        width: usize,
    },

    #[error("index {index} is outside the {height}x{width} grid")]
    IndexOutOfBounds {
        index: GridIndex,
        height: usize,
        width: usize,
    },
}
