use crate::{search::PathBuilder, LcpError};
use geo::{algorithm::EuclideanLength, geometry::LineString, Coord};
use itertools::Itertools;
use num_traits::{AsPrimitive, Float};
use raster::{GeoTransform, Grid, GridIndex, RasterError};

/// A least-cost route through a cost grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Cells from start to end, inclusive. Consecutive cells are
    /// 8-connected neighbors.
    cells: Vec<GridIndex>,

    /// Sum of edge weights along `cells`.
    cost: f64,

    /// `(height, width)` of the grid the path was computed on.
    shape: (usize, usize),

    /// Transform of the grid the path was computed on.
    transform: GeoTransform,
}

impl Path {
    pub fn builder() -> PathBuilder {
        PathBuilder::default()
    }

    pub(crate) fn new(
        cells: Vec<GridIndex>,
        cost: f64,
        shape: (usize, usize),
        transform: GeoTransform,
    ) -> Self {
        debug_assert!(!cells.is_empty());
        Self {
            cells,
            cost,
            shape,
            transform,
        }
    }

    /// Weight of the move between adjacent cells costing `cost_a` and
    /// `cost_b`: their mean, scaled by the move's length (1 for a
    /// cardinal move, √2 for a diagonal one).
    #[inline]
    pub fn edge_weight(cost_a: f64, cost_b: f64, diagonal: bool) -> f64 {
        let step = if diagonal {
            std::f64::consts::SQRT_2
        } else {
            1.0
        };
        (cost_a + cost_b) / 2.0 * step
    }

    pub fn cells(&self) -> &[GridIndex] {
        &self.cells
    }

    /// Total accumulated cost.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn start(&self) -> GridIndex {
        self.cells[0]
    }

    pub fn end(&self) -> GridIndex {
        self.cells[self.cells.len() - 1]
    }

    /// Number of cells visited, including both endpoints.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `(height, width)` of the grid this path was computed on.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Transform of the grid this path was computed on.
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Returns the same route walked from end to start.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut cells = self.cells.clone();
        cells.reverse();
        Self {
            cells,
            cost: self.cost,
            shape: self.shape,
            transform: self.transform,
        }
    }

    /// Accumulated cost at each cell along the path, starting at 0.
    ///
    /// The last value is the path's total cost re-derived from
    /// `cost`, independently of the search that produced it.
    pub fn cumulative_costs<T>(&self, cost: &Grid<T>) -> Result<Vec<f64>, LcpError>
    where
        T: Float + AsPrimitive<f64>,
    {
        self.check_grid(cost)?;
        let mut total = 0.0;
        let mut out = Vec::with_capacity(self.cells.len());
        out.push(total);
        for (a, b) in self.cells.iter().tuple_windows() {
            total += Self::edge_weight(cost[*a].as_(), cost[*b].as_(), a.is_diagonal(*b));
            out.push(total);
        }
        Ok(out)
    }

    /// Re-sums the edge weights along this path over `cost`.
    pub fn recompute_cost<T>(&self, cost: &Grid<T>) -> Result<f64, LcpError>
    where
        T: Float + AsPrimitive<f64>,
    {
        self.check_grid(cost)?;
        Ok(self
            .cells
            .iter()
            .tuple_windows()
            .map(|(a, b)| Self::edge_weight(cost[*a].as_(), cost[*b].as_(), a.is_diagonal(*b)))
            .sum())
    }

    /// Burns this path into a mask co-registered with `template`: 1 on
    /// visited cells, 0 elsewhere.
    pub fn rasterize<T>(&self, template: &Grid<T>) -> Result<Grid<u8>, LcpError> {
        self.check_grid(template)?;
        let mut mask = template.map(|_| 0_u8);
        for cell in &self.cells {
            mask.set(*cell, 1)?;
        }
        Ok(mask)
    }

    /// Returns the path as a line through the ground coordinates of
    /// each visited cell's center.
    pub fn to_line_string(&self, transform: &GeoTransform) -> LineString<f64> {
        #[allow(clippy::cast_precision_loss)]
        let centers: Vec<Coord<f64>> = self
            .cells
            .iter()
            .map(|GridIndex { row, col }| transform.apply(*col as f64 + 0.5, *row as f64 + 0.5))
            .collect();
        LineString::from(centers)
    }

    /// Planar length of the path in ground units.
    pub fn ground_length(&self, transform: &GeoTransform) -> f64 {
        self.to_line_string(transform).euclidean_length()
    }
}

/// Private API.
impl Path {
    /// Fails unless `grid` is co-registered with the grid this path
    /// was computed on.
    fn check_grid<T>(&self, grid: &Grid<T>) -> Result<(), LcpError> {
        if grid.shape() != self.shape {
            return Err(RasterError::InvalidGeometry(format!(
                "path computed on a {:?} grid, got {:?}",
                self.shape,
                grid.shape()
            ))
            .into());
        }
        if grid.transform() != &self.transform {
            return Err(RasterError::InvalidGeometry(format!(
                "path computed with transform {:?}, got {:?}",
                self.transform,
                grid.transform()
            ))
            .into());
        }
        Ok(())
    }
}
