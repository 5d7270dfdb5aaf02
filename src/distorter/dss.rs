use std::sync::Arc;

use crate::error::Error;

/// Arcseconds per radian
const CONS2R: f64 = 206264.80624709636;
const TOLERANCE: f64 = 5e-7;
const MAX_ITERATIONS: usize = 50;

/// Plate solution of a Digitized Sky Survey plate
#[derive(Debug, Clone, PartialEq)]
pub struct PlateModel {
    /// Right ascension of the plate center in radians
    pub plate_ra: f64,
    /// Declination of the plate center in radians
    pub plate_dec: f64,
    /// Plate scale in arcsec/mm
    pub plate_scale: f64,
    /// Pixel sizes in microns
    pub x_pixel_size: f64,
    pub y_pixel_size: f64,
    /// Pixel to plate coefficients
    pub ppo: [f64; 6],
    /// Polynomial coefficients of the model, only the first 13 terms are used
    pub amdx: [f64; 13],
    pub amdy: [f64; 13],
}

/// Powers of a plate position (in mm) shared by the model and its derivatives
struct Position {
    x: f64,
    y: f64,
    xy: f64,
    x2: f64,
    y2: f64,
    x2y: f64,
    y2x: f64,
    x2y2: f64,
    x4y4: f64,
    x3: f64,
    y3: f64,
    x4: f64,
    y4: f64,
}

impl Position {
    fn new(x: f64, y: f64) -> Self {
        let x2 = x * x;
        let y2 = y * y;
        let x2y2 = x2 + y2;
        Self {
            x,
            y,
            xy: x * y,
            x2,
            y2,
            x2y: x2 * y,
            y2x: y2 * x,
            x2y2,
            x4y4: x2y2 * x2y2,
            x3: x2 * x,
            y3: y2 * y,
            x4: x2 * x2,
            y4: y2 * y2,
        }
    }
}

impl PlateModel {
    /// Corrected X coordinate (arcsec)
    fn f(&self, p: &Position) -> f64 {
        let c = &self.amdx;
        c[0] * p.x
            + c[1] * p.y
            + c[2]
            + c[3] * p.x2
            + c[4] * p.xy
            + c[5] * p.y2
            + c[6] * p.x2y2
            + c[7] * p.x3
            + c[8] * p.x2y
            + c[9] * p.y2x
            + c[10] * p.y3
            + c[11] * p.x * p.x2y2
            + c[12] * p.x * p.x4y4
    }

    fn dfdx(&self, p: &Position) -> f64 {
        let c = &self.amdx;
        c[0] + c[3] * 2.0 * p.x
            + c[4] * p.y
            + c[6] * 2.0 * p.x
            + c[7] * 3.0 * p.x2
            + c[8] * 2.0 * p.xy
            + c[9] * p.y2
            + c[11] * (3.0 * p.x2 + p.y2)
            + c[12] * (5.0 * p.x4 + 6.0 * p.x2 * p.y2 + p.y4)
    }

    fn dfdy(&self, p: &Position) -> f64 {
        let c = &self.amdx;
        c[1] + c[4] * p.x
            + c[5] * 2.0 * p.y
            + c[6] * 2.0 * p.y
            + c[8] * p.x2
            + c[9] * 2.0 * p.xy
            + c[10] * 3.0 * p.y2
            + c[11] * 2.0 * p.xy
            + c[12] * 4.0 * p.xy * p.x2y2
    }

    /// Corrected Y coordinate (arcsec)
    fn g(&self, p: &Position) -> f64 {
        let c = &self.amdy;
        c[0] * p.y
            + c[1] * p.x
            + c[2]
            + c[3] * p.y2
            + c[4] * p.xy
            + c[5] * p.x2
            + c[6] * p.x2y2
            + c[7] * p.y3
            + c[8] * p.y2x
            + c[9] * p.x2y
            + c[10] * p.x3
            + c[11] * p.y * p.x2y2
            + c[12] * p.y * p.x4y4
    }

    fn dgdx(&self, p: &Position) -> f64 {
        let c = &self.amdy;
        c[1] + c[4] * p.y
            + c[5] * 2.0 * p.x
            + c[6] * 2.0 * p.x
            + c[8] * p.y2
            + c[9] * 2.0 * p.xy
            + c[10] * 3.0 * p.x2
            + c[11] * 2.0 * p.xy
            + c[12] * 4.0 * p.xy * p.x2y2
    }

    fn dgdy(&self, p: &Position) -> f64 {
        let c = &self.amdy;
        c[0] + c[3] * 2.0 * p.y
            + c[4] * p.x
            + c[6] * 2.0 * p.y
            + c[7] * 3.0 * p.y2
            + c[8] * 2.0 * p.xy
            + c[9] * p.x2
            + c[11] * (p.x2 + 3.0 * p.y2)
            + c[12] * (5.0 * p.y4 + 6.0 * p.x2 * p.y2 + p.x4)
    }
}

/// Fiducial plane to plate position, inverting the plate polynomial
/// with a 2-d Newton's method
#[derive(Debug, Clone)]
pub struct Dss {
    plate: Arc<PlateModel>,
}

impl Dss {
    pub fn new(plate: PlateModel) -> Self {
        Self {
            plate: Arc::new(plate),
        }
    }

    pub fn plate(&self) -> &PlateModel {
        &self.plate
    }

    pub(super) fn same_plate(&self, other: &Arc<PlateModel>) -> bool {
        Arc::ptr_eq(&self.plate, other)
    }

    pub fn inverted(&self) -> DssInverse {
        DssInverse {
            plate: Arc::clone(&self.plate),
        }
    }

    pub fn apply(&self, p: [f64; 2]) -> Result<[f64; 2], Error> {
        self.solve(p).map(|(out, _)| out)
    }

    /// Position in radians on the distorted plane and the number of
    /// Newton iterations used to get it
    pub fn solve(&self, [x, y]: [f64; 2]) -> Result<([f64; 2], usize), Error> {
        let plate = &*self.plate;
        let xi = x * CONS2R;
        let eta = y * CONS2R;

        let mut xmm = xi / plate.plate_scale;
        let mut ymm = eta / plate.plate_scale;

        for iteration in 1..=MAX_ITERATIONS {
            let pos = Position::new(xmm, ymm);
            let df = plate.f(&pos) - xi;
            let dg = plate.g(&pos) - eta;
            let fx = plate.dfdx(&pos);
            let fy = plate.dfdy(&pos);
            let gx = plate.dgdx(&pos);
            let gy = plate.dgdy(&pos);

            let det = fx * gy - fy * gx;
            let dx = (-df * gy + dg * fy) / det;
            let dy = (-dg * fx + df * gx) / det;
            if !dx.is_finite() || !dy.is_finite() {
                return Err(Error::NotConverged("DSS Distorter", iteration));
            }

            xmm += dx;
            ymm += dy;
            if dx.abs() < TOLERANCE && dy.abs() < TOLERANCE {
                let out = [
                    xmm * plate.plate_scale / CONS2R,
                    ymm * plate.plate_scale / CONS2R,
                ];
                return Ok((out, iteration));
            }
        }

        Err(Error::NotConverged("DSS Distorter", MAX_ITERATIONS))
    }
}

/// Plate position to the fiducial plane, evaluating the plate polynomial
#[derive(Debug, Clone)]
pub struct DssInverse {
    plate: Arc<PlateModel>,
}

impl DssInverse {
    pub fn plate(&self) -> &Arc<PlateModel> {
        &self.plate
    }

    pub fn inverted(&self) -> Dss {
        Dss {
            plate: Arc::clone(&self.plate),
        }
    }

    pub fn apply(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        let plate = &*self.plate;
        let pos = Position::new(
            x * CONS2R / plate.plate_scale,
            y * CONS2R / plate.plate_scale,
        );

        [plate.f(&pos) / CONS2R, plate.g(&pos) / CONS2R]
    }
}
