use crate::{GeoTransform, GridIndex, RasterError};
use geo::geometry::Coord;
use num_traits::Float;
use std::ops::{Index, IndexMut};

/// A dense, row-major, georeferenced 2D array.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    /// Number of columns.
    width: usize,

    /// Number of rows.
    height: usize,

    /// Cell values; `(row, col)` lives at `row * width + col`.
    data: Vec<T>,

    /// Maps `(col, row)` to ground coordinates.
    transform: GeoTransform,

    /// Sentinel marking cells whose value is unknown.
    nodata: Option<T>,
}

impl<T> Grid<T> {
    /// Returns a new grid over `data`.
    ///
    /// Fails if either dimension is zero, if `data` does not hold
    /// exactly `width * height` values, or if `transform` cannot be
    /// inverted.
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<T>,
        transform: GeoTransform,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidGeometry(format!(
                "degenerate {height}x{width} grid"
            )));
        }
        let expected = width.checked_mul(height).ok_or_else(|| {
            RasterError::InvalidGeometry(format!("{height}x{width} grid overflows usize"))
        })?;
        if data.len() != expected {
            return Err(RasterError::InvalidGeometry(format!(
                "{height}x{width} grid needs {expected} cells, got {}",
                data.len()
            )));
        }
        if !transform.is_invertible() {
            return Err(RasterError::InvalidGeometry(format!(
                "transform {transform:?} is not invertible"
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            transform,
            nodata: None,
        })
    }

    /// Returns a grid with every cell set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        value: T,
        transform: GeoTransform,
    ) -> Result<Self, RasterError>
    where
        T: Clone,
    {
        let len = width.saturating_mul(height);
        Self::new(width, height, vec![value; len], transform)
    }

    /// Returns a grid whose cells are produced by `f(index)`, in
    /// row-major order.
    pub fn from_fn<F>(
        width: usize,
        height: usize,
        transform: GeoTransform,
        mut f: F,
    ) -> Result<Self, RasterError>
    where
        F: FnMut(GridIndex) -> T,
    {
        let mut data = Vec::with_capacity(width.saturating_mul(height));
        for row in 0..height {
            for col in 0..width {
                data.push(f(GridIndex { row, col }));
            }
        }
        Self::new(width, height, data, transform)
    }

    /// Sets the no-data sentinel.
    #[must_use]
    pub fn with_nodata(mut self, nodata: Option<T>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Returns a grid sharing this grid's shape and transform, holding
    /// `data` instead.
    pub fn with_data<U>(&self, data: Vec<U>) -> Result<Grid<U>, RasterError> {
        if data.len() != self.data.len() {
            return Err(RasterError::InvalidGeometry(format!(
                "{}x{} grid needs {} cells, got {}",
                self.height,
                self.width,
                self.data.len(),
                data.len()
            )));
        }
        Ok(Grid {
            width: self.width,
            height: self.height,
            data,
            transform: self.transform,
            nodata: None,
        })
    }

    /// Applies `f` to every cell, keeping shape and transform. The
    /// result carries no sentinel.
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
            transform: self.transform,
            nodata: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(height, width)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Returns the number of cells in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn nodata(&self) -> Option<&T> {
        self.nodata.as_ref()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns the cells of row `row`.
    pub fn row(&self, row: usize) -> Option<&[T]> {
        (row < self.height).then(|| &self.data[row * self.width..(row + 1) * self.width])
    }

    pub fn contains(&self, index: GridIndex) -> bool {
        index.row < self.height && index.col < self.width
    }

    /// Returns the position of `index` in the row-major cell array.
    pub fn linear_index(&self, index: GridIndex) -> Option<usize> {
        self.contains(index)
            .then(|| index.row * self.width + index.col)
    }

    /// Inverse of [`Grid::linear_index`].
    pub fn grid_index(&self, linear: usize) -> Option<GridIndex> {
        (linear < self.data.len()).then_some(GridIndex {
            row: linear / self.width,
            col: linear % self.width,
        })
    }

    pub fn get(&self, index: GridIndex) -> Option<&T> {
        self.linear_index(index).map(|i| &self.data[i])
    }

    pub fn set(&mut self, index: GridIndex, value: T) -> Result<(), RasterError> {
        let i = self.checked(index)?;
        self.data[i] = value;
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterates over `(index, value)` in row-major order.
    pub fn indexed_iter(&self) -> impl Iterator<Item = (GridIndex, &T)> + '_ {
        let width = self.width;
        self.data.iter().enumerate().map(move |(i, v)| {
            (
                GridIndex {
                    row: i / width,
                    col: i % width,
                },
                v,
            )
        })
    }

    /// Fails unless `other` has the same shape and transform.
    pub fn ensure_coregistered<U>(&self, other: &Grid<U>) -> Result<(), RasterError> {
        if self.shape() != other.shape() {
            return Err(RasterError::InvalidGeometry(format!(
                "shape mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        if self.transform != other.transform {
            return Err(RasterError::InvalidGeometry(format!(
                "transform mismatch: {:?} vs {:?}",
                self.transform, other.transform
            )));
        }
        Ok(())
    }

    /// Returns the cell containing ground coordinate `coord`.
    ///
    /// The coordinate is mapped through the inverse transform and both
    /// axes are floored, so a point on a cell's leading edge belongs
    /// to that cell.
    pub fn to_index(&self, coord: Coord<f64>) -> Result<GridIndex, RasterError> {
        let (col, row) = self.transform.fractional(coord);
        let col = col.floor();
        let row = row.floor();
        #[allow(clippy::cast_precision_loss)]
        let in_bounds = (0.0..self.width as f64).contains(&col)
            && (0.0..self.height as f64).contains(&row);
        if in_bounds {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let index = GridIndex {
                row: row as usize,
                col: col as usize,
            };
            Ok(index)
        } else {
            Err(RasterError::OutOfBounds {
                x: coord.x,
                y: coord.y,
                height: self.height,
                width: self.width,
            })
        }
    }

    /// Returns the ground coordinate of the center of cell `index`.
    pub fn to_coords(&self, index: GridIndex) -> Result<Coord<f64>, RasterError> {
        self.checked(index)?;
        #[allow(clippy::cast_precision_loss)]
        let center = self
            .transform
            .apply(index.col as f64 + 0.5, index.row as f64 + 0.5);
        Ok(center)
    }

    /// Returns the ground coordinate of the outer corner of cell
    /// `index`.
    pub fn corner_coords(&self, index: GridIndex) -> Result<Coord<f64>, RasterError> {
        self.checked(index)?;
        #[allow(clippy::cast_precision_loss)]
        let corner = self.transform.apply(index.col as f64, index.row as f64);
        Ok(corner)
    }
}

/// Private API.
impl<T> Grid<T> {
    fn checked(&self, index: GridIndex) -> Result<usize, RasterError> {
        self.linear_index(index)
            .ok_or(RasterError::IndexOutOfBounds {
                index,
                height: self.height,
                width: self.width,
            })
    }
}

impl<T: Float> Grid<T> {
    /// Returns `true` if `value` is finite and not the no-data
    /// sentinel.
    pub fn is_valid_value(&self, value: T) -> bool {
        value.is_finite() && self.nodata.map_or(true, |nodata| value != nodata)
    }

    /// Returns `true` if the cell at `index` exists and holds a valid
    /// value.
    pub fn is_valid(&self, index: GridIndex) -> bool {
        self.get(index).map_or(false, |v| self.is_valid_value(*v))
    }

    /// Number of valid cells.
    pub fn valid_count(&self) -> usize {
        self.data
            .iter()
            .filter(|v| self.is_valid_value(**v))
            .count()
    }

    /// Returns a copy where every invalid cell is NaN and no sentinel
    /// is set.
    pub fn nodata_to_nan(&self) -> Self {
        self.map(|v| if self.is_valid_value(*v) { *v } else { T::nan() })
    }
}

impl<T> Index<GridIndex> for Grid<T> {
    type Output = T;

    fn index(&self, index: GridIndex) -> &T {
        assert!(
            self.contains(index),
            "index {index} out of bounds for {}x{} grid",
            self.height,
            self.width
        );
        &self.data[index.row * self.width + index.col]
    }
}

impl<T> IndexMut<GridIndex> for Grid<T> {
    fn index_mut(&mut self, index: GridIndex) -> &mut T {
        assert!(
            self.contains(index),
            "index {index} out of bounds for {}x{} grid",
            self.height,
            self.width
        );
        &mut self.data[index.row * self.width + index.col]
    }
}
