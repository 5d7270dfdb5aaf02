//! Projections between the unit sphere and a plane
//!
//! The projection families are the canonical projections of mapproj,
//! all centered on the native point (lon, lat) = (0, 0). A [`Projection`]
//! adds the rotation bringing its reference point there and an optional
//! distortion of the projection plane.

use log::debug;
use mapproj::{
    cylindrical::{car::Car, mer::Mer},
    hybrid::hpx::Hpx,
    pseudocyl::{ait::Ait, sfl::Sfl},
    quadcube::csc::Csc,
    zenithal::{arc::Arc, sin::Sin, stg::Stg, tan::Tan, zea::Zea},
    CanonicalProjection, ProjXY, XYZ,
};
use paste::paste;

use crate::distorter::Distorter;
use crate::error::Error;
use crate::rotater::Rotater;
use crate::transform::{normalize, Point, Stage, Transformer};

macro_rules! projection_kinds {
    ( $( $kind:ident ),* ) => {
        /// Supported projection families
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum ProjectionKind {
            $( $kind ),*
        }

        impl ProjectionKind {
            pub const ALL: &'static [ProjectionKind] = &[ $( ProjectionKind::$kind ),* ];

            /// FITS abbreviation, e.g. "TAN"
            pub fn abbreviation(&self) -> &'static str {
                match self {
                    $( ProjectionKind::$kind => <$kind as CanonicalProjection>::WCS_NAME ),*
                }
            }

            fn proj(&self, xyz: &XYZ) -> Option<ProjXY> {
                match self {
                    $( ProjectionKind::$kind => $kind::new().proj(xyz) ),*
                }
            }

            fn unproj(&self, pos: &ProjXY) -> Option<XYZ> {
                match self {
                    $( ProjectionKind::$kind => $kind::new().unproj(pos) ),*
                }
            }
        }

        impl Projection {
            paste! {
                $(
                    #[doc = "A " $kind " projection about (lon, lat) in radians"]
                    pub fn [<$kind:lower>](lon: f64, lat: f64) -> Self {
                        Self::new(ProjectionKind::$kind, lon, lat)
                    }
                )*
            }
        }
    };
}

projection_kinds!(Tan, Sin, Stg, Arc, Zea, Car, Mer, Ait, Sfl, Csc, Hpx);

impl ProjectionKind {
    /// Look a family up by its abbreviation (case insensitive)
    pub fn try_parse(abbrev: &str) -> Option<Self> {
        let abbrev = abbrev.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.abbreviation().eq_ignore_ascii_case(abbrev))
    }

    /// Same as [`Self::try_parse`] but an unknown abbreviation gives a
    /// tangent projection
    pub fn parse(abbrev: &str) -> Self {
        Self::try_parse(abbrev).unwrap_or_else(|| {
            debug!("Unknown projection {}, using TAN", abbrev);
            ProjectionKind::Tan
        })
    }
}

/// Sphere to projection plane
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Projecter(pub ProjectionKind);

/// Projection plane to sphere
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deprojecter(pub ProjectionKind);

impl Projecter {
    pub fn apply(&self, v: &[f64; 3]) -> Result<[f64; 2], Error> {
        self.0
            .proj(&XYZ::new(v[0], v[1], v[2]))
            .map(|xy| [xy.x(), xy.y()])
            .ok_or(Error::OffProjection(self.0.abbreviation()))
    }
}

impl Deprojecter {
    pub fn apply(&self, [x, y]: [f64; 2]) -> Result<[f64; 3], Error> {
        self.0
            .unproj(&ProjXY::new(x, y))
            .map(|xyz| normalize([xyz.x(), xyz.y(), xyz.z()]))
            .ok_or(Error::OffProjection(self.0.abbreviation()))
    }
}

impl Transformer for Projecter {
    fn name(&self) -> &'static str {
        "Projecter"
    }

    fn description(&self) -> String {
        format!("Project the unit sphere onto a {} plane", self.0.abbreviation())
    }

    fn input_dimension(&self) -> usize {
        3
    }

    fn output_dimension(&self) -> usize {
        2
    }

    fn transform(&self, p: Point) -> Result<Point, Error> {
        Ok(Point::Plane(self.apply(&p.sphere(self.name())?)?))
    }

    fn inverse(&self) -> Result<Stage, Error> {
        Ok(Stage::Deprojecter(Deprojecter(self.0)))
    }

    fn is_inverse(&self, other: &Stage) -> bool {
        matches!(other, Stage::Deprojecter(Deprojecter(kind)) if *kind == self.0)
    }
}

impl Transformer for Deprojecter {
    fn name(&self) -> &'static str {
        "Deprojecter"
    }

    fn description(&self) -> String {
        format!("Deproject a {} plane onto the unit sphere", self.0.abbreviation())
    }

    fn input_dimension(&self) -> usize {
        2
    }

    fn output_dimension(&self) -> usize {
        3
    }

    fn transform(&self, p: Point) -> Result<Point, Error> {
        Ok(Point::Sphere(self.apply(p.plane(self.name())?)?))
    }

    fn inverse(&self) -> Result<Stage, Error> {
        Ok(Stage::Projecter(Projecter(self.0)))
    }

    fn is_inverse(&self, other: &Stage) -> bool {
        matches!(other, Stage::Projecter(Projecter(kind)) if *kind == self.0)
    }
}

/// A projecter bundled with the rotation to its reference point
/// and the distortion of its plane
#[derive(Clone, Debug)]
pub struct Projection {
    kind: ProjectionKind,
    /// (lon, lat) of the reference point in radians
    reference: Option<(f64, f64)>,
    rotater: Option<Rotater>,
    distorter: Option<Distorter>,
}

impl Projection {
    /// Projection centered on (lon, lat), both in radians
    pub fn new(kind: ProjectionKind, lon: f64, lat: f64) -> Self {
        Self {
            kind,
            reference: Some((lon, lat)),
            rotater: Some(Rotater::to_origin(lon, lat)),
            distorter: None,
        }
    }

    /// Projection kept at its native center, e.g. an all-sky Car or Ait map
    pub fn fixed(kind: ProjectionKind) -> Self {
        Self {
            kind,
            reference: None,
            rotater: None,
            distorter: None,
        }
    }

    pub fn with_distorter(mut self, distorter: Distorter) -> Self {
        self.distorter = Some(distorter);
        self
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    pub fn reference(&self) -> Option<(f64, f64)> {
        self.reference
    }

    pub fn rotater(&self) -> Option<&Rotater> {
        self.rotater.as_ref()
    }

    pub fn projecter(&self) -> Projecter {
        Projecter(self.kind)
    }

    pub fn distorter(&self) -> Option<&Distorter> {
        self.distorter.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn abbreviations() {
        assert_eq!(ProjectionKind::parse("tan"), ProjectionKind::Tan);
        assert_eq!(ProjectionKind::parse(" AIT "), ProjectionKind::Ait);
        assert_eq!(ProjectionKind::try_parse("XYZ"), None);
        // documented fallback
        assert_eq!(ProjectionKind::parse("XYZ"), ProjectionKind::Tan);
    }

    #[test]
    fn tangent_plane_at_center() {
        let p = Projecter(ProjectionKind::Tan)
            .apply(&[1.0, 0.0, 0.0])
            .unwrap();
        assert_abs_diff_eq!(p[0], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(p[1], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn behind_the_tangent_plane() {
        assert_eq!(
            Projecter(ProjectionKind::Tan).apply(&[-1.0, 0.0, 0.0]),
            Err(Error::OffProjection("TAN"))
        );
    }

    #[test]
    fn round_trip_for_every_family() {
        let points = [(0.0_f64, 0.0_f64), (0.1, 0.2), (-0.2, -0.15), (0.3, -0.05)];
        for kind in ProjectionKind::ALL {
            let proj = Projecter(*kind);
            // the quad cube inverse is an approximation
            let tolerance = if *kind == ProjectionKind::Csc { 1e-5 } else { 1e-9 };
            let deproj = proj.inverse().unwrap();
            assert!(proj.is_inverse(&deproj));

            for (lon, lat) in points {
                let p = Point::from_lonlat(lon, lat);
                let back = deproj.transform(proj.transform(p).unwrap()).unwrap();
                let (l, b) = back.to_lonlat().unwrap();
                let l = if l > std::f64::consts::PI {
                    l - std::f64::consts::TAU
                } else {
                    l
                };
                assert_abs_diff_eq!(l, lon, epsilon = tolerance);
                assert_abs_diff_eq!(b, lat, epsilon = tolerance);
            }
        }
    }

    #[test]
    fn generated_constructors() {
        let p = Projection::sin(1.0, 0.5);
        assert_eq!(p.kind(), ProjectionKind::Sin);
        assert_eq!(p.reference(), Some((1.0, 0.5)));
        assert!(Projection::fixed(ProjectionKind::Car).rotater().is_none());
    }
}
