//! Affine maps of the plane

use log::warn;

use crate::error::Error;
use crate::transform::{Point, Stage, Transformer};

const UNIT_TOLERANCE: f64 = 1e-10;

/// `out = (x0, y0) + A.(x, y)` with `A = [[a00, a01], [a10, a11]]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scaler {
    x0: f64,
    y0: f64,
    a00: f64,
    a01: f64,
    a10: f64,
    a11: f64,
}

impl Default for Scaler {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 0.0, 0.0, 1.0)
    }
}

impl Scaler {
    pub fn new(x0: f64, y0: f64, a00: f64, a01: f64, a10: f64, a11: f64) -> Self {
        Self {
            x0,
            y0,
            a00,
            a01,
            a10,
            a11,
        }
    }

    /// A pure translation
    pub fn shift(dx: f64, dy: f64) -> Self {
        Self::new(dx, dy, 1.0, 0.0, 0.0, 1.0)
    }

    /// `[x0, y0, a00, a01, a10, a11]`
    pub fn params(&self) -> [f64; 6] {
        [self.x0, self.y0, self.a00, self.a01, self.a10, self.a11]
    }

    pub fn determinant(&self) -> f64 {
        self.a00 * self.a11 - self.a01 * self.a10
    }

    pub fn apply(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        [
            self.x0 + self.a00 * x + self.a01 * y,
            self.y0 + self.a10 * x + self.a11 * y,
        ]
    }

    /// Composition of `self` followed by `t`
    pub fn add(&self, t: &Scaler) -> Scaler {
        Scaler::new(
            t.x0 + t.a00 * self.x0 + t.a01 * self.y0,
            t.y0 + t.a10 * self.x0 + t.a11 * self.y0,
            t.a00 * self.a00 + t.a01 * self.a10,
            t.a00 * self.a01 + t.a01 * self.a11,
            t.a10 * self.a00 + t.a11 * self.a10,
            t.a10 * self.a01 + t.a11 * self.a11,
        )
    }

    pub fn inverted(&self) -> Result<Scaler, Error> {
        let sum = self.a00.abs() + self.a01.abs() + self.a10.abs() + self.a11.abs();
        let det = self.determinant();
        if sum == 0.0 || det == 0.0 {
            return Err(Error::NotInvertible("Scaler".to_string()));
        }
        if det.abs() / sum < 1e-10 {
            warn!("Scaler matrix is nearly singular (det = {})", det);
        }

        Ok(Scaler::new(
            (-self.x0 * self.a11 + self.y0 * self.a01) / det,
            (self.x0 * self.a10 - self.y0 * self.a00) / det,
            self.a11 / det,
            -self.a01 / det,
            -self.a10 / det,
            self.a00 / det,
        ))
    }

    /// Swap the roles of the two output axes
    pub fn interchange_axes(&self) -> Scaler {
        Scaler::new(self.y0, self.x0, self.a10, self.a11, self.a00, self.a01)
    }

    /// Mean magnification of the matrix
    pub fn scale(&self) -> f64 {
        let a = self.a00 + self.a01;
        let b = self.a10 + self.a11;
        ((a * a + b * b) / 2.0).sqrt()
    }

    pub fn is_unit(&self) -> bool {
        self.params()
            .iter()
            .zip([0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
            .all(|(a, b)| (a - b).abs() < UNIT_TOLERANCE)
    }
}

impl Transformer for Scaler {
    fn name(&self) -> &'static str {
        "Scaler"
    }

    fn description(&self) -> String {
        format!(
            "Affine map: x' = {} + {}x + {}y, y' = {} + {}x + {}y",
            self.x0, self.a00, self.a01, self.y0, self.a10, self.a11
        )
    }

    fn input_dimension(&self) -> usize {
        2
    }

    fn output_dimension(&self) -> usize {
        2
    }

    fn transform(&self, p: Point) -> Result<Point, Error> {
        Ok(Point::Plane(self.apply(p.plane(self.name())?)))
    }

    fn inverse(&self) -> Result<Stage, Error> {
        Ok(Stage::Scaler(self.inverted()?))
    }

    fn is_inverse(&self, other: &Stage) -> bool {
        match other {
            Stage::Scaler(s) => self.add(s).is_unit(),
            _ => false,
        }
    }
}
