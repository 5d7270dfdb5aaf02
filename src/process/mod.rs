//! Mosaicking strategies
//!
//! A processor fills an output image from candidate images, given the
//! [`SourceMap`] an image finder built for them.

mod adding;
mod backup;
pub mod exposure;
mod id_mosaic;
mod mosaicker;

pub use adding::AddingMosaicker;
pub use backup::{BackupMosaicker, BLANK};
pub use id_mosaic::IDMosaic;
pub use mosaicker::Mosaicker;

use crate::depth_sampler::DepthSampler;
use crate::error::Error;
use crate::header::HeaderSink;
use crate::image::Image;
use crate::image_finder::SourceMap;
use crate::sampler::Sampler;
use crate::settings::Settings;
use crate::survey::SurveyFinder;
use exposure::ExposureLoader;

pub trait Processor {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Fill `output` from `inputs`. Candidates that cannot be read are
    /// skipped, failures to build a transform are returned
    fn process(
        &mut self,
        inputs: &mut [Image],
        output: &mut Image,
        source: &SourceMap,
        sampler: &mut dyn Sampler,
        depth: Option<&DepthSampler>,
    ) -> Result<MosaicSummary, Error>;

    fn update_header(&self, header: &mut dyn HeaderSink);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every candidate was used and every pixel sampled
    Complete,
    /// Some candidates were skipped or some pixels failed
    Partial,
    /// No candidate was used
    Empty,
}

/// What a processor did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MosaicSummary {
    /// Name and number of written pixels of each used candidate
    pub used: Vec<(String, usize)>,
    /// Names of the candidates that could not be read
    pub skipped: Vec<String>,
    /// Pixels whose transform failed
    pub failed_pixels: usize,
}

impl MosaicSummary {
    pub fn outcome(&self) -> Outcome {
        if self.used.is_empty() {
            Outcome::Empty
        } else if self.skipped.is_empty() && self.failed_pixels == 0 {
            Outcome::Complete
        } else {
            Outcome::Partial
        }
    }

    /// The summary, or [`Error::NoValidPixels`] when nothing was used
    pub fn into_result(self) -> Result<Self, Error> {
        match self.outcome() {
            Outcome::Empty => Err(Error::NoValidPixels),
            _ => Ok(self),
        }
    }

    pub fn merge(&mut self, other: MosaicSummary) {
        self.used.extend(other.used);
        self.skipped.extend(other.skipped);
        self.failed_pixels += other.failed_pixels;
    }
}

/// External collaborators some processors need
#[derive(Default)]
pub struct Collaborators {
    pub surveys: Option<Box<dyn SurveyFinder>>,
    pub exposure_loader: Option<Box<dyn ExposureLoader>>,
}

/// Processor from its name
pub fn factory(
    name: &str,
    settings: &Settings,
    collaborators: Collaborators,
) -> Result<Box<dyn Processor>, Error> {
    let name = name.trim();
    match name.to_ascii_lowercase().as_str() {
        "" | "default" | "mosaicker" => Ok(Box::new(Mosaicker::new())),
        "addingmosaicker" => Ok(Box::new(AddingMosaicker::from_settings(
            settings,
            collaborators.exposure_loader,
        )?)),
        "backupmosaicker" => {
            let surveys = collaborators.surveys.ok_or_else(|| {
                Error::InvalidSetting(name.to_string(), "no survey finder".to_string())
            })?;
            Ok(Box::new(BackupMosaicker::new(settings.clone(), surveys)))
        }
        "idmosaic" => Ok(Box::new(IDMosaic::new())),
        _ => Err(Error::UnknownComponent("processor", name.to_string())),
    }
}

/// English ordinal suffix of a number, e.g. "nd" for 22
pub(crate) fn ordinal_suffix(n: usize) -> &'static str {
    let unit = n % 10;
    let tens = n % 100 / 10;
    match (unit, tens) {
        (_, 1) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Provenance common to the mosaickers
pub(crate) fn no_valid_pixels(header: &mut dyn HeaderSink) {
    header.insert_comment("");
    header.insert_comment("************************************");
    header.insert_comment("** No valid pixels for mosaicking **");
    header.insert_comment("************************************");
    header.insert_comment("");
    header.add_value("SV_ERROR", &Error::NoValidPixels.to_string(), "");
}
