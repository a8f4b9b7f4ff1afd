use raster::RasterError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("invalid cell spacing ({res_x}, {res_y}), both must be finite and positive")]
    InvalidSpacing { res_x: f64, res_y: f64 },

    #[error("invalid parameter '{0}'")]
    InvalidParameter(&'static str),

    #[error("{0}")]
    Raster(#[from] RasterError),
}
