//! Distortions of the projection plane
//!
//! Each model comes as a pair of stages, one of which has a closed form
//! while the other one is solved iteratively for every point.

mod dss;
mod neat;

pub use dss::{Dss, DssInverse, PlateModel};
pub use neat::{Neat, NeatInverse};

use crate::error::Error;
use crate::transform::{Point, Stage, Transformer};

#[derive(Clone, Debug)]
pub enum Distorter {
    /// Fiducial plane to the DSS plate, Newton's method
    Dss(Dss),
    /// DSS plate to the fiducial plane, closed form
    DssInverse(DssInverse),
    /// Radial cubic distortion, closed form
    Neat(Neat),
    /// Inverse radial cubic distortion, Newton's method
    NeatInverse(NeatInverse),
}

impl Distorter {
    pub fn apply(&self, p: [f64; 2]) -> Result<[f64; 2], Error> {
        match self {
            Distorter::Dss(d) => d.apply(p),
            Distorter::DssInverse(d) => Ok(d.apply(p)),
            Distorter::Neat(d) => Ok(d.apply(p)),
            Distorter::NeatInverse(d) => d.apply(p),
        }
    }

    fn inverted(&self) -> Distorter {
        match self {
            Distorter::Dss(d) => Distorter::DssInverse(d.inverted()),
            Distorter::DssInverse(d) => Distorter::Dss(d.inverted()),
            Distorter::Neat(d) => Distorter::NeatInverse(d.inverted()),
            Distorter::NeatInverse(d) => Distorter::Neat(d.inverted()),
        }
    }
}

impl Transformer for Distorter {
    fn name(&self) -> &'static str {
        match self {
            Distorter::Dss(_) => "DSS Distorter",
            Distorter::DssInverse(_) => "DSSInv",
            Distorter::Neat(_) => "NeatDistorter",
            Distorter::NeatInverse(_) => "NeatInv",
        }
    }

    fn description(&self) -> String {
        match self {
            Distorter::Dss(_) => {
                "Transform from a fiducial projection plane to the DSS distorted projection plane"
            }
            Distorter::DssInverse(_) => {
                "Transform from DSS distorted coordinates to the fiducial projection plane"
            }
            Distorter::Neat(_) => "Perform radial distortion y = x + d x^3",
            Distorter::NeatInverse(_) => {
                "Invert a radial cubic distortion (find x from y where y = x + d x^3)"
            }
        }
        .to_string()
    }

    fn input_dimension(&self) -> usize {
        2
    }

    fn output_dimension(&self) -> usize {
        2
    }

    fn transform(&self, p: Point) -> Result<Point, Error> {
        Ok(Point::Plane(self.apply(p.plane(self.name())?)?))
    }

    fn inverse(&self) -> Result<Stage, Error> {
        Ok(Stage::Distorter(self.inverted()))
    }

    fn is_inverse(&self, other: &Stage) -> bool {
        let Stage::Distorter(other) = other else {
            return false;
        };
        match (self, other) {
            (Distorter::Dss(a), Distorter::DssInverse(b)) => a.same_plate(b.plate()),
            (Distorter::DssInverse(a), Distorter::Dss(b)) => b.same_plate(a.plate()),
            (Distorter::Neat(a), Distorter::NeatInverse(b)) => *a == b.inverted(),
            (Distorter::NeatInverse(a), Distorter::Neat(b)) => a.inverted() == *b,
            _ => false,
        }
    }
}
