use crate::RasterError;
use geo::geometry::Coord;

/// Affine mapping from fractional `(col, row)` grid positions to
/// ground coordinates.
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// Position `(0.0, 0.0)` is the outer (top-left for north-up grids)
/// corner of cell `(0, 0)`; `(0.5, 0.5)` is its center.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 1.0,
        f: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Returns a rotation-free transform whose top-left corner is at
    /// `(origin_x, origin_y)`, with columns advancing east by `res_x`
    /// and rows advancing south by `res_y`.
    pub fn north_up(origin_x: f64, origin_y: f64, res_x: f64, res_y: f64) -> Self {
        Self::new(res_x, 0.0, origin_x, 0.0, -res_y, origin_y)
    }

    /// Builds a transform from GDAL coefficient order
    /// `[c, a, b, f, d, e]`.
    pub fn from_gdal([c, a, b, f, d, e]: [f64; 6]) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Returns coefficients in GDAL order.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Returns `true` if every coefficient is finite and the linear
    /// part is non-singular.
    pub fn is_invertible(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .iter()
            .all(|v| v.is_finite())
            && self.determinant() != 0.0
            && self.determinant().is_finite()
    }

    /// Maps fractional `(col, row)` to ground coordinates.
    pub fn apply(&self, col: f64, row: f64) -> Coord<f64> {
        Coord {
            x: self.a * col + self.b * row + self.c,
            y: self.d * col + self.e * row + self.f,
        }
    }

    /// Returns the algebraic inverse, mapping ground `(x, y)` back to
    /// fractional `(col, row)` (returned in a `Coord` as `x = col`,
    /// `y = row`).
    pub fn inverse(&self) -> Result<Self, RasterError> {
        if !self.is_invertible() {
            return Err(RasterError::InvalidGeometry(format!(
                "transform {self:?} is not invertible"
            )));
        }
        let det = self.determinant();
        let a = self.e / det;
        let b = -self.b / det;
        let d = -self.d / det;
        let e = self.a / det;
        let c = -(a * self.c + b * self.f);
        let f = -(d * self.c + e * self.f);
        Ok(Self { a, b, c, d, e, f })
    }

    /// Maps a ground coordinate back to fractional `(col, row)`.
    ///
    /// Rotation-free transforms are solved per axis, which keeps
    /// coordinates that fall exactly on cell edges exact.
    pub fn fractional(&self, Coord { x, y }: Coord<f64>) -> (f64, f64) {
        let dx = x - self.c;
        let dy = y - self.f;
        if self.b == 0.0 && self.d == 0.0 {
            (dx / self.a, dy / self.e)
        } else {
            let det = self.determinant();
            (
                (self.e * dx - self.b * dy) / det,
                (self.a * dy - self.d * dx) / det,
            )
        }
    }

    /// Ground length of one column step and of one row step.
    pub fn resolution(&self) -> (f64, f64) {
        (self.a.hypot(self.d), self.b.hypot(self.e))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
