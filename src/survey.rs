//! Access to the candidate images of a survey

use crate::error::Error;
use crate::image::Image;

pub trait Survey {
    fn name(&self) -> &str;

    /// Candidate images within `size` degrees of the J2000 position
    /// (lon, lat), in degrees
    fn images(&self, lon: f64, lat: f64, size: f64) -> Result<Vec<Image>, Error>;
}

pub trait SurveyFinder {
    /// Survey from its name, failing with [`Error::Survey`] when unknown
    fn find(&self, name: &str) -> Result<Box<dyn Survey>, Error>;
}
