use crate::TerrainError;
use log::debug;
use num_traits::{Float, FromPrimitive};
use raster::Grid;
use rayon::prelude::*;

/// Returns the slope magnitude, in degrees, of every cell of
/// `elevation`.
///
/// `res_x` and `res_y` are the ground distances between adjacent
/// columns and adjacent rows, in the same unit as the elevations.
///
/// Interior cells use a central difference along each axis, edge
/// cells a one-sided difference. An axis only one cell long has no
/// gradient along it. Invalid elevations (no-data or non-finite) make
/// every slope whose stencil touches them NaN.
pub fn slope<T>(elevation: &Grid<T>, res_x: f64, res_y: f64) -> Result<Grid<T>, TerrainError>
where
    T: Float + FromPrimitive + Send + Sync,
{
    let invalid_spacing = || TerrainError::InvalidSpacing { res_x, res_y };
    if !(res_x.is_finite() && res_x > 0.0 && res_y.is_finite() && res_y > 0.0) {
        return Err(invalid_spacing());
    }
    let dx = T::from_f64(res_x)
        .filter(|dx| dx.is_normal())
        .ok_or_else(invalid_spacing)?;
    let dy = T::from_f64(res_y)
        .filter(|dy| dy.is_normal())
        .ok_or_else(invalid_spacing)?;

    let now = std::time::Instant::now();
    let z = elevation.nodata_to_nan();
    let (height, width) = z.shape();
    let cells = z.as_slice();

    let mut degrees = vec![T::zero(); cells.len()];
    degrees
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out)| {
            for (col, slope) in out.iter_mut().enumerate() {
                let center = cells[row * width + col];
                *slope = if center.is_nan() {
                    T::nan()
                } else {
                    let dz_dx = derivative(width, col, dx, |c| cells[row * width + c]);
                    let dz_dy = derivative(height, row, dy, |r| cells[r * width + col]);
                    (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan().to_degrees()
                };
            }
        });

    debug!(
        "slope; shape: {height}x{width}, res: ({res_x}, {res_y}), exec: {:?}",
        now.elapsed()
    );

    Ok(z.with_data(degrees)?)
}

/// Like [`slope`], taking cell spacing from `elevation`'s transform.
///
/// Only meaningful when the transform is in the same linear unit as
/// the elevations (a projected CRS in meters, for example).
pub fn slope_from_transform<T>(elevation: &Grid<T>) -> Result<Grid<T>, TerrainError>
where
    T: Float + FromPrimitive + Send + Sync,
{
    let (res_x, res_y) = elevation.transform().resolution();
    slope(elevation, res_x, res_y)
}

/// First derivative at `pos` of a `len` long sequence sampled every
/// `h`.
fn derivative<T, F>(len: usize, pos: usize, h: T, at: F) -> T
where
    T: Float,
    F: Fn(usize) -> T,
{
    let two = T::one() + T::one();
    match (len, pos) {
        (1, _) => T::zero(),
        (_, 0) => (at(1) - at(0)) / h,
        (len, pos) if pos == len - 1 => (at(pos) - at(pos - 1)) / h,
        (_, pos) => (at(pos + 1) - at(pos - 1)) / (two * h),
    }
}
