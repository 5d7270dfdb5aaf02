//! Ordered chains of transform stages

use log::debug;

use crate::error::Error;
use crate::transform::{Point, Stage, Transformer};

/// A sequence of stages applied one after the other.
///
/// An empty converter is the identity.
#[derive(Clone, Debug, Default)]
pub struct Converter {
    stages: Vec<Stage>,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Fails when its input dimension does not match the
    /// output dimension of the current last stage
    pub fn add<T: Into<Stage>>(&mut self, stage: T) -> Result<&mut Self, Error> {
        let stage = stage.into();
        if let Some(last) = self.stages.last() {
            if last.output_dimension() != stage.input_dimension() {
                return Err(Error::IncompatibleStages(
                    last.name().to_string(),
                    stage.name().to_string(),
                ));
            }
        }
        self.stages.push(stage);
        Ok(self)
    }

    /// Append a stage if there is one
    pub fn add_opt<T: Into<Stage>>(&mut self, stage: Option<T>) -> Result<&mut Self, Error> {
        match stage {
            Some(stage) => self.add(stage),
            None => Ok(self),
        }
    }

    /// Append every stage of another converter
    pub fn append(&mut self, other: &Converter) -> Result<&mut Self, Error> {
        for stage in &other.stages {
            self.add(stage.clone())?;
        }
        Ok(self)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn transform(&self, p: Point) -> Result<Point, Error> {
        self.stages.iter().try_fold(p, |p, stage| stage.transform(p))
    }

    /// Transform a batch of points in place, stopping at the first failure
    pub fn transform_many(&self, points: &mut [Point]) -> Result<(), Error> {
        for p in points.iter_mut() {
            *p = self.transform(*p)?;
        }
        Ok(())
    }

    /// The stages in reverse order, each one inverted
    pub fn inverse(&self) -> Result<Converter, Error> {
        let stages = self
            .stages
            .iter()
            .rev()
            .map(|stage| stage.inverse())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Converter { stages })
    }

    /// Whether applying `other` after this converter gives the identity
    pub fn is_inverse(&self, other: &Converter) -> bool {
        let mut a = self.clone();
        a.simplify();
        let mut b = other.clone();
        b.simplify();

        a.stages.len() == b.stages.len()
            && a.stages
                .iter()
                .rev()
                .zip(b.stages.iter())
                .all(|(s, t)| s.is_inverse(t))
    }

    /// Remove adjacent inverse pairs and merge adjacent rotations and
    /// affine maps, until nothing changes
    pub fn simplify(&mut self) {
        while self.simplify_once() {}
    }

    fn simplify_once(&mut self) -> bool {
        for i in 1..self.stages.len() {
            let (prev, curr) = (&self.stages[i - 1], &self.stages[i]);

            if prev.is_inverse(curr) {
                debug!("Removing inverse pair {} / {}", prev.name(), curr.name());
                self.stages.remove(i);
                self.stages.remove(i - 1);
                return true;
            }

            let merged = match (prev, curr) {
                (Stage::Rotater(a), Stage::Rotater(b)) => Some(Stage::Rotater(a.add(b))),
                (Stage::Scaler(a), Stage::Scaler(b)) => Some(Stage::Scaler(a.add(b))),
                _ => None,
            };
            if let Some(merged) = merged {
                debug!("Merging adjacent {} stages", merged.name());
                self.stages[i - 1] = merged;
                self.stages.remove(i);
                return true;
            }
        }
        false
    }
}
