//! Fixed rotations of the unit sphere

use crate::error::Error;
use crate::transform::{mat_vec, Point, Stage, Transformer};

/// Tolerance used when deciding whether a rotation is the identity
const UNIT_TOLERANCE: f64 = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn parse(c: char) -> Result<Self, Error> {
        match c.to_ascii_uppercase() {
            'X' => Ok(Axis::X),
            'Y' => Ok(Axis::Y),
            'Z' => Ok(Axis::Z),
            _ => Err(Error::UnknownComponent("rotation axis", c.to_string())),
        }
    }

    /// Matrix rotating the frame by `angle` about this axis.
    ///
    /// A rotation about Z subtracts `angle` from the longitude, a rotation
    /// about Y adds it to the latitude of a point on the prime meridian.
    fn matrix(&self, angle: f64) -> [[f64; 3]; 3] {
        let (s, c) = angle.sin_cos();
        match self {
            Axis::X => [[1.0, 0.0, 0.0], [0.0, c, s], [0.0, -s, c]],
            Axis::Y => [[c, 0.0, -s], [0.0, 1.0, 0.0], [s, 0.0, c]],
            Axis::Z => [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }
}

fn mat_mul(b: &[[f64; 3]; 3], a: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut m = [[0.0; 3]; 3];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = (0..3).map(|k| b[i][k] * a[k][j]).sum();
        }
    }
    m
}

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// A rotation kept both as its sequence of elemental rotations
/// and as the resulting matrix
#[derive(Clone, Debug, PartialEq)]
pub struct Rotater {
    steps: Vec<(Axis, f64)>,
    matrix: [[f64; 3]; 3],
}

impl Default for Rotater {
    fn default() -> Self {
        Self {
            steps: vec![],
            matrix: IDENTITY,
        }
    }
}

impl Rotater {
    /// Build a rotation from Euler angles.
    ///
    /// `axes` gives up to three axis letters (e.g. "ZYZ"), the i-th one
    /// rotating by the i-th angle. Rotations are applied in the order given.
    pub fn from_euler(axes: &str, phi: f64, theta: f64, psi: f64) -> Result<Self, Error> {
        let angles = [phi, theta, psi];
        if axes.chars().count() > angles.len() {
            return Err(Error::UnknownComponent("rotation axes", axes.to_string()));
        }

        let steps = axes
            .chars()
            .zip(angles)
            .map(|(c, angle)| Axis::parse(c).map(|axis| (axis, angle)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_steps(steps))
    }

    fn from_steps(steps: Vec<(Axis, f64)>) -> Self {
        let matrix = steps
            .iter()
            .fold(IDENTITY, |m, (axis, angle)| mat_mul(&axis.matrix(*angle), &m));

        Self { steps, matrix }
    }

    /// Rotation moving the point (lon, lat) to the origin (0, 0)
    /// with the local north direction kept along +z
    pub fn to_origin(lon: f64, lat: f64) -> Self {
        Self::from_steps(vec![(Axis::Z, lon), (Axis::Y, -lat)])
    }

    /// Composition of `self` followed by `other`
    pub fn add(&self, other: &Rotater) -> Rotater {
        let steps = self.steps.iter().chain(other.steps.iter()).copied().collect();
        Rotater {
            steps,
            matrix: mat_mul(&other.matrix, &self.matrix),
        }
    }

    pub fn matrix(&self) -> &[[f64; 3]; 3] {
        &self.matrix
    }

    pub fn steps(&self) -> &[(Axis, f64)] {
        &self.steps
    }

    /// The inverse rotation, i.e. the transposed matrix
    pub fn inverted(&self) -> Rotater {
        let steps = self.steps.iter().rev().map(|(a, angle)| (*a, -angle)).collect();
        let m = &self.matrix;
        let matrix = [
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ];

        Rotater { steps, matrix }
    }

    pub fn is_unit(&self) -> bool {
        self.matrix
            .iter()
            .zip(IDENTITY.iter())
            .flat_map(|(r, u)| r.iter().zip(u.iter()))
            .all(|(a, b)| (a - b).abs() < UNIT_TOLERANCE)
    }

    pub fn apply(&self, v: &[f64; 3]) -> [f64; 3] {
        mat_vec(&self.matrix, v)
    }
}

impl Transformer for Rotater {
    fn name(&self) -> &'static str {
        "Rotater"
    }

    fn description(&self) -> String {
        let steps = self
            .steps
            .iter()
            .map(|(axis, angle)| format!("{:?}({:.6} deg)", axis, angle.to_degrees()))
            .collect::<Vec<_>>()
            .join(" ");
        format!("Rotation: {}", steps)
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
        Ok(Stage::Rotater(self.inverted()))
    }

    fn is_inverse(&self, other: &Stage) -> bool {
        match other {
            Stage::Rotater(r) => self.add(r).is_unit(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn z_rotation_subtracts_longitude() {
        let r = Rotater::from_euler("Z", 0.3, 0.0, 0.0).unwrap();
        let p = r.transform(Point::from_lonlat(1.0, 0.2)).unwrap();
        let (lon, lat) = p.to_lonlat().unwrap();

        assert_abs_diff_eq!(lon, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(lat, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn to_origin_centers_the_reference() {
        let r = Rotater::to_origin(2.0, -0.7);
        let v = r.apply(&[
            (-0.7_f64).cos() * 2.0_f64.cos(),
            (-0.7_f64).cos() * 2.0_f64.sin(),
            (-0.7_f64).sin(),
        ]);

        assert_abs_diff_eq!(v[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn inverse_round_trip() {
        let r = Rotater::from_euler("ZYZ", 0.4, -1.1, 2.5).unwrap();
        let inv = r.inverse().unwrap();
        assert!(r.is_inverse(&inv));
        assert!(!r.is_inverse(&Stage::Rotater(r.clone())));

        for &(lon, lat) in &[(0.0, 0.0), (1.0, 0.5), (4.0, -1.2), (3.0, 1.5)] {
            let p = Point::from_lonlat(lon, lat);
            let back = inv.transform(r.transform(p).unwrap()).unwrap();
            let (Point::Sphere(a), Point::Sphere(b)) = (p, back) else {
                panic!("expected sphere points");
            };
            for i in 0..3 {
                assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn composition_keeps_order() {
        let a = Rotater::from_euler("Z", 0.5, 0.0, 0.0).unwrap();
        let b = Rotater::from_euler("Y", 0.2, 0.0, 0.0).unwrap();
        let ab = a.add(&b);
        let v = [0.3, -0.4, (1.0f64 - 0.25).sqrt()];

        let expected = b.apply(&a.apply(&v));
        let got = ab.apply(&v);
        for i in 0..3 {
            assert_abs_diff_eq!(got[i], expected[i], epsilon = 1e-14);
        }
        assert_eq!(ab.steps().len(), 2);
    }

    #[test]
    fn bad_axis() {
        assert!(Rotater::from_euler("ZQ", 0.1, 0.2, 0.0).is_err());
        assert!(Rotater::from_euler("ZYZX", 0.1, 0.2, 0.0).is_err());
    }
}
