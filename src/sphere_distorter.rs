//! Non-rigid deformations of the unit sphere

use crate::error::Error;
use crate::transform::{dot, mat_vec, normalize, Point, Stage, Transformer};

/// E-terms of aberration
const E_TERMS: [f64; 3] = [-1.62557E-6, -0.31919E-6, -0.13843E-6];

/// FK5 (J2000) to FK4 (B1950) position matrix
const EMI: [[f64; 3]; 3] = [
    [0.9999256795, 0.0111814828, 0.0048590039],
    [-0.0111814828, 0.9999374849, -0.0000271771],
    [-0.0048590040, -0.0000271557, 0.9999881946],
];

/// FK4 (B1950) to FK5 (J2000) position matrix
const EM1: [[f64; 3]; 3] = [
    [0.9999256782, -0.0111820611, -0.0048579477],
    [0.0111820610, 0.9999374784, -0.0000271765],
    [0.0048579479, -0.0000271474, 0.9999881997],
];

/// FK4 (B1950) to FK5 (J2000) velocity part, per century
const EM2: [[f64; 3]; 3] = [
    [-0.000551, -0.238565, 0.435739],
    [0.238514, -0.002667, -0.008541],
    [-0.435623, 0.012254, 0.002117],
];

/// Milli-arcseconds per radian per century
const PMF: f64 = 100.0 * 60.0 * 60.0 * 360.0 / std::f64::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SphereDistorter {
    /// J2000 to B1950, adds the E-terms
    Besselian,
    /// B1950 to J2000, removes the E-terms
    BesselianInverse,
}

impl SphereDistorter {
    pub fn apply(&self, x: &[f64; 3]) -> [f64; 3] {
        match self {
            SphereDistorter::Besselian => add_e_terms(x),
            SphereDistorter::BesselianInverse => remove_e_terms(x),
        }
    }

    fn inverted(&self) -> Self {
        match self {
            SphereDistorter::Besselian => SphereDistorter::BesselianInverse,
            SphereDistorter::BesselianInverse => SphereDistorter::Besselian,
        }
    }
}

fn add_e_terms(x: &[f64; 3]) -> [f64; 3] {
    let y = mat_vec(&EMI, x);
    let rxyz = dot(&y, &y).sqrt();

    let mut w = dot(&E_TERMS, &y);
    let t1: [f64; 3] = std::array::from_fn(|i| (1.0 - w) * y[i] + E_TERMS[i] * rxyz);
    let rxyz = dot(&t1, &t1).sqrt();

    // The correction is accumulated twice, as in the FK4 reference algorithm
    w += dot(&E_TERMS, &y);
    normalize(std::array::from_fn(|i| (1.0 - w) * y[i] + E_TERMS[i] * rxyz))
}

fn remove_e_terms(x: &[f64; 3]) -> [f64; 3] {
    let w = dot(&E_TERMS, x);
    let t1: [f64; 3] = std::array::from_fn(|i| x[i] - E_TERMS[i] - w * x[i]);

    let y = mat_vec(&EM1, &t1);
    let v = mat_vec(&EM2, &t1);

    // 1950 to 2000
    let tdelta = -50.0 / PMF;
    normalize(std::array::from_fn(|i| y[i] + tdelta * v[i]))
}

impl Transformer for SphereDistorter {
    fn name(&self) -> &'static str {
        match self {
            SphereDistorter::Besselian => "Besselian distorter",
            SphereDistorter::BesselianInverse => "Inv. Besselian distorter",
        }
    }

    fn description(&self) -> String {
        let desc = "A Besselian (FK4 based) distortion. Dynamic terms are not included.";
        match self {
            SphereDistorter::Besselian => desc.to_string(),
            SphereDistorter::BesselianInverse => format!("{} (inverse)", desc),
        }
    }

    fn input_dimension(&self) -> usize {
        3
    }

    fn output_dimension(&self) -> usize {
        3
    }

    fn transform(&self, p: Point) -> Result<Point, Error> {
        let v = p.sphere(self.name())?;
        Ok(Point::Sphere(self.apply(&v)))
    }

    fn inverse(&self) -> Result<Stage, Error> {
        Ok(Stage::SphereDistorter(self.inverted()))
    }

    fn is_inverse(&self, other: &Stage) -> bool {
        matches!(other, Stage::SphereDistorter(d) if *d == self.inverted())
    }
}
