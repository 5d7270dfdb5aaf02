use log::{info, warn};

use super::{MosaicSummary, Mosaicker, Processor};
use crate::depth_sampler::DepthSampler;
use crate::error::Error;
use crate::header::HeaderSink;
use crate::image::Image;
use crate::image_finder::{self, Coverage, SourceMap};
use crate::sampler::Sampler;
use crate::settings::{Key, Settings};
use crate::survey::SurveyFinder;

/// Value of the output pixels nothing was sampled into
pub const BLANK: f64 = -1e20;

fn is_unfilled(value: f64) -> bool {
    value.is_nan() || value == BLANK
}

/// A [`Mosaicker`] whose holes are filled from the `BackupSurvey` surveys,
/// tried in order while any pixel is left blank
pub struct BackupMosaicker {
    settings: Settings,
    surveys: Box<dyn SurveyFinder>,
    primary: Mosaicker,
    /// Survey name and the mosaicker that used it
    backups: Vec<(String, Mosaicker)>,
}

impl BackupMosaicker {
    pub fn new(settings: Settings, surveys: Box<dyn SurveyFinder>) -> Self {
        Self {
            settings,
            surveys,
            primary: Mosaicker::new(),
            backups: Vec::new(),
        }
    }

    /// Surveys that contributed a backup mosaic
    pub fn backup_surveys(&self) -> impl Iterator<Item = &str> {
        self.backups.iter().map(|(name, _)| name.as_str())
    }

    fn has_holes(output: &Image) -> bool {
        output
            .data()
            .iter()
            .take(output.plane_size())
            .any(|v| is_unfilled(*v))
    }

    /// Fill the holes of `output` from one survey
    fn reprocess(
        &mut self,
        survey: &str,
        output: &mut Image,
        sampler: &mut dyn Sampler,
        depth: Option<&DepthSampler>,
    ) -> Result<MosaicSummary, Error> {
        info!("Backup survey: {}", survey);
        let survey = self.surveys.find(survey)?;

        let (lon, lat) = output
            .wcs()
            .pixel_to_sky(output.width() as f64 / 2.0, output.height() as f64 / 2.0)?;
        let size = output.width().max(output.height()) as f64 * output.wcs().scale();
        let mut candidates =
            survey.images(lon.to_degrees(), lat.to_degrees(), size.to_degrees())?;

        let finder = image_finder::factory(self.settings.get(Key::ImageFinder), &self.settings)?;
        let mut source = finder.find_images(&candidates, output)?;
        if source.is_empty() {
            return Ok(MosaicSummary::default());
        }
        for pix in 0..source.len() {
            if !is_unfilled(output.get(pix)) {
                source.set(pix, Coverage::Consumed);
            }
        }

        let mut mosaicker = Mosaicker::new();
        let summary = mosaicker.process(&mut candidates, output, &source, sampler, depth)?;
        self.backups.push((survey.name().to_string(), mosaicker));
        Ok(summary)
    }
}

impl Processor for BackupMosaicker {
    fn name(&self) -> &'static str {
        "BackupMosaicker"
    }

    fn description(&self) -> &'static str {
        "Create a new image by putting together resampled pixels from multiple surveys"
    }

    fn process(
        &mut self,
        inputs: &mut [Image],
        output: &mut Image,
        source: &SourceMap,
        sampler: &mut dyn Sampler,
        depth: Option<&DepthSampler>,
    ) -> Result<MosaicSummary, Error> {
        output.fill(BLANK);
        let mut summary = self.primary.process(inputs, output, source, sampler, depth)?;

        let backups = self.settings.get_array(Key::BackupSurvey).to_vec();
        for survey in &backups {
            if !Self::has_holes(output) {
                break;
            }
            match self.reprocess(survey, output, sampler, depth) {
                Ok(backup) => summary.merge(backup),
                Err(e) => warn!("Backup survey error: {}", e),
            }
        }
        Ok(summary)
    }

    fn update_header(&self, header: &mut dyn HeaderSink) {
        header.insert_history("");
        header.insert_history("Image mosaicking using BackupMosaicker");
        header.insert_history("");
        self.primary.update_header(header);
        for (survey, mosaicker) in &self.backups {
            header.insert_history(&format!("  Backup survey:{}", survey));
            mosaicker.update_header(header);
        }
    }
}
