use crate::TerrainError;
use log::{debug, warn};
use num_traits::{Float, FromPrimitive};
use raster::Grid;
use rayon::prelude::*;

/// Cost assigned to cells whose slope is unknown.
///
/// Large enough that any route avoids such cells when an alternative
/// exists, while keeping them traversable.
pub const PENALTY_COST: f64 = 9999.0;

/// A friction surface: slope linearly rescaled into
/// `[min_cost, max_cost]`, with invalid cells replaced by a penalty.
///
/// Every cell is finite and positive.
#[derive(Debug, Clone, PartialEq)]
pub struct CostSurface<T = f64> {
    grid: Grid<T>,

    /// Smallest and largest valid slope, if any cell was valid.
    slope_range: Option<(T, T)>,

    /// Number of cells with a normalized cost.
    valid_cells: usize,

    /// Number of cells carrying the penalty cost.
    penalty_cells: usize,
}

impl CostSurface {
    pub fn builder() -> CostSurfaceBuilder {
        CostSurfaceBuilder::default()
    }
}

impl<T> CostSurface<T> {
    pub fn grid(&self) -> &Grid<T> {
        &self.grid
    }

    pub fn into_grid(self) -> Grid<T> {
        self.grid
    }

    pub fn slope_range(&self) -> Option<(T, T)>
    where
        T: Copy,
    {
        self.slope_range
    }

    pub fn valid_cells(&self) -> usize {
        self.valid_cells
    }

    pub fn penalty_cells(&self) -> usize {
        self.penalty_cells
    }
}

impl<T> AsRef<Grid<T>> for CostSurface<T> {
    fn as_ref(&self) -> &Grid<T> {
        &self.grid
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSurfaceBuilder {
    /// Cost of the flattest valid cell (defaults to 1).
    min_cost: f64,

    /// Cost of the steepest valid cell (defaults to 10).
    max_cost: f64,

    /// Cost of invalid cells (defaults to [`PENALTY_COST`]).
    penalty: f64,
}

impl Default for CostSurfaceBuilder {
    fn default() -> Self {
        Self {
            min_cost: 1.0,
            max_cost: 10.0,
            penalty: PENALTY_COST,
        }
    }
}

impl CostSurfaceBuilder {
    /// Cost of the flattest valid cell (defaults to 1).
    #[must_use]
    pub fn min_cost(mut self, cost: f64) -> Self {
        self.min_cost = cost;
        self
    }

    /// Cost of the steepest valid cell (defaults to 10).
    #[must_use]
    pub fn max_cost(mut self, cost: f64) -> Self {
        self.max_cost = cost;
        self
    }

    /// Cost of cells with unknown slope (defaults to
    /// [`PENALTY_COST`]).
    #[must_use]
    pub fn penalty(mut self, cost: f64) -> Self {
        self.penalty = cost;
        self
    }

    /// Builds the cost surface for `slope`.
    ///
    /// A valid slope cell is finite and not `slope`'s no-data value.
    /// If all valid cells share one slope value (or there are none),
    /// every valid cell gets `min_cost`.
    pub fn build<T>(&self, slope: &Grid<T>) -> Result<CostSurface<T>, TerrainError>
    where
        T: Float + FromPrimitive + Send + Sync,
    {
        let Self {
            min_cost,
            max_cost,
            penalty,
        } = *self;
        if !(min_cost.is_finite() && min_cost > 0.0) {
            return Err(TerrainError::InvalidParameter("min_cost"));
        }
        if !(max_cost.is_finite() && max_cost >= min_cost) {
            return Err(TerrainError::InvalidParameter("max_cost"));
        }
        if !(penalty.is_finite() && penalty > 0.0) {
            return Err(TerrainError::InvalidParameter("penalty"));
        }
        let lo = T::from_f64(min_cost)
            .filter(|v| v.is_finite())
            .ok_or(TerrainError::InvalidParameter("min_cost"))?;
        let span = T::from_f64(max_cost - min_cost)
            .filter(|v| v.is_finite())
            .ok_or(TerrainError::InvalidParameter("max_cost"))?;
        let fill = T::from_f64(penalty)
            .filter(|v| v.is_finite())
            .ok_or(TerrainError::InvalidParameter("penalty"))?;

        let now = std::time::Instant::now();
        let cells = slope.as_slice();

        let slope_range = cells
            .par_iter()
            .filter(|v| slope.is_valid_value(**v))
            .fold(
                || None,
                |acc: Option<(T, T)>, &v| match acc {
                    None => Some((v, v)),
                    Some((min, max)) => Some((min.min(v), max.max(v))),
                },
            )
            .reduce(
                || None,
                |a, b| match (a, b) {
                    (Some((a_min, a_max)), Some((b_min, b_max))) => {
                        Some((a_min.min(b_min), a_max.max(b_max)))
                    }
                    (a, None) => a,
                    (None, b) => b,
                },
            );

        // Half of `min` and half of `max - min` over the valid slopes,
        // or `None` when every valid cell maps to `min_cost`. Halving
        // keeps the range finite for slopes near the float limits.
        let two = T::one() + T::one();
        let scale = match slope_range {
            Some((min, max)) if max / two - min / two > T::zero() => {
                Some((min / two, max / two - min / two))
            }
            Some(_) => {
                debug!("cost surface; uniform slope, every valid cell costs {min_cost}");
                None
            }
            None => {
                warn!("cost surface; no valid slope cells, every cell costs {penalty}");
                None
            }
        };

        let costs: Vec<T> = cells
            .par_iter()
            .map(|&v| match scale {
                _ if !slope.is_valid_value(v) => fill,
                Some((half_min, half_range)) => lo + (v / two - half_min) / half_range * span,
                None => lo,
            })
            .collect();

        let penalty_cells = cells
            .par_iter()
            .filter(|v| !slope.is_valid_value(**v))
            .count();
        let valid_cells = cells.len() - penalty_cells;

        debug!(
            "cost surface; valid: {valid_cells}, penalty: {penalty_cells}, exec: {:?}",
            now.elapsed()
        );

        Ok(CostSurface {
            grid: slope.with_data(costs)?,
            slope_range,
            valid_cells,
            penalty_cells,
        })
    }
}
