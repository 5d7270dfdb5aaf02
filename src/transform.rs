//! The transformer capability shared by every stage of a pipeline
//!
//! A stage maps a point of dimension `input_dimension` to a point of
//! dimension `output_dimension`. Plane points hold either (lon, lat) in
//! radians or projection plane/pixel coordinates, sphere points hold
//! unit cartesian vectors.

use crate::distorter::Distorter;
use crate::error::Error;
use crate::projection::{Deprojecter, Projecter};
use crate::rotater::Rotater;
use crate::scaler::Scaler;
use crate::sphere_distorter::SphereDistorter;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Point {
    Plane([f64; 2]),
    Sphere([f64; 3]),
}

impl Point {
    /// Unit vector pointing toward (lon, lat), both in radians
    pub fn from_lonlat(lon: f64, lat: f64) -> Self {
        let (sin_lon, cos_lon) = lon.sin_cos();
        let (sin_lat, cos_lat) = lat.sin_cos();

        Point::Sphere([cos_lat * cos_lon, cos_lat * sin_lon, sin_lat])
    }

    pub fn dimension(&self) -> usize {
        match self {
            Point::Plane(_) => 2,
            Point::Sphere(_) => 3,
        }
    }

    pub fn plane(self, stage: &'static str) -> Result<[f64; 2], Error> {
        match self {
            Point::Plane(p) => Ok(p),
            Point::Sphere(_) => Err(Error::DimensionMismatch(stage, 2, 3)),
        }
    }

    pub fn sphere(self, stage: &'static str) -> Result<[f64; 3], Error> {
        match self {
            Point::Sphere(v) => Ok(v),
            Point::Plane(_) => Err(Error::DimensionMismatch(stage, 3, 2)),
        }
    }

    /// (lon, lat) in radians of a sphere point, lon in [0, 2pi)
    pub fn to_lonlat(&self) -> Option<(f64, f64)> {
        match self {
            Point::Sphere([x, y, z]) => {
                let mut lon = y.atan2(*x);
                if lon < 0.0 {
                    lon += std::f64::consts::TAU;
                }
                let lat = z.atan2((x * x + y * y).sqrt());

                Some((lon, lat))
            }
            Point::Plane(_) => None,
        }
    }
}

pub(crate) fn normalize(v: [f64; 3]) -> [f64; 3] {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / norm, v[1] / norm, v[2] / norm]
}

pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn mat_vec(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [dot(&m[0], v), dot(&m[1], v), dot(&m[2], v)]
}

/// Common interface of every stage of a transform pipeline
pub trait Transformer {
    fn name(&self) -> &'static str;

    fn description(&self) -> String;

    fn input_dimension(&self) -> usize;

    fn output_dimension(&self) -> usize;

    /// Apply the mapping to one point.
    ///
    /// Fails when the point is of the wrong dimension, when the point has
    /// no image (e.g. off a projection) or when an iterative inversion
    /// does not converge for this point
    fn transform(&self, p: Point) -> Result<Point, Error>;

    /// The inverse stage. Failing here is reported at composition time
    fn inverse(&self) -> Result<Stage, Error>;

    /// Whether `other` is the inverse of this stage, without transforming anything
    fn is_inverse(&self, other: &Stage) -> bool;
}

/// One stage of a [`crate::Converter`]
#[derive(Clone, Debug)]
pub enum Stage {
    Rotater(Rotater),
    SphereDistorter(SphereDistorter),
    Projecter(Projecter),
    Deprojecter(Deprojecter),
    Distorter(Distorter),
    Scaler(Scaler),
}

macro_rules! dispatch {
    ( $stage:expr, $t:ident => $e:expr ) => {
        match $stage {
            Stage::Rotater($t) => $e,
            Stage::SphereDistorter($t) => $e,
            Stage::Projecter($t) => $e,
            Stage::Deprojecter($t) => $e,
            Stage::Distorter($t) => $e,
            Stage::Scaler($t) => $e,
        }
    };
}

impl Transformer for Stage {
    fn name(&self) -> &'static str {
        dispatch!(self, t => t.name())
    }

    fn description(&self) -> String {
        dispatch!(self, t => t.description())
    }

    fn input_dimension(&self) -> usize {
        dispatch!(self, t => t.input_dimension())
    }

    fn output_dimension(&self) -> usize {
        dispatch!(self, t => t.output_dimension())
    }

    fn transform(&self, p: Point) -> Result<Point, Error> {
        dispatch!(self, t => t.transform(p))
    }

    fn inverse(&self) -> Result<Stage, Error> {
        dispatch!(self, t => t.inverse())
    }

    fn is_inverse(&self, other: &Stage) -> bool {
        dispatch!(self, t => t.is_inverse(other))
    }
}

macro_rules! impl_from_stage {
    ( $( $variant:ident ),* ) => {
        $(
            impl From<$variant> for Stage {
                fn from(t: $variant) -> Self {
                    Stage::$variant(t)
                }
            }
        )*
    };
}

impl_from_stage!(
    Rotater,
    SphereDistorter,
    Projecter,
    Deprojecter,
    Distorter,
    Scaler
);
