use log::{debug, info, warn};

use super::exposure::{self, ExposureFinder, ExposureLoader, Null};
use super::{no_valid_pixels, MosaicSummary, Processor};
use crate::depth_sampler::DepthSampler;
use crate::error::Error;
use crate::header::HeaderSink;
use crate::image::Image;
use crate::image_finder::{Border, ImageFinder, SourceMap};
use crate::sampler::Sampler;
use crate::settings::{Key, Settings};

/// Adds every candidate overlapping an output pixel, weighted by its
/// exposure, then divides by the total exposure.
///
/// Overlaps are found one candidate at a time with a [`Border`] finder, the
/// shared source map is not used. Pixels without exposure are flagged in
/// the output mask and set to the blank value.
pub struct AddingMosaicker {
    exposure_finder: Box<dyn ExposureFinder>,
    normalize: bool,
    blank_value: f64,
    /// Name and number of pixels of each used candidate
    used: Vec<(String, usize)>,
}

impl Default for AddingMosaicker {
    fn default() -> Self {
        Self::new(Box::new(Null))
    }
}

impl AddingMosaicker {
    pub fn new(exposure_finder: Box<dyn ExposureFinder>) -> Self {
        Self {
            exposure_finder,
            normalize: true,
            blank_value: -1.0,
            used: Vec::new(),
        }
    }

    /// Reads `ExposureFinder`, `NoNormalize` and `BlankValue`
    pub fn from_settings(
        settings: &Settings,
        loader: Option<Box<dyn ExposureLoader>>,
    ) -> Result<Self, Error> {
        let mut mosaicker = Self::new(exposure::factory(settings, loader)?);
        mosaicker.normalize = !settings.has(Key::NoNormalize);
        if let Some(blank) = settings.get_f64(Key::BlankValue)? {
            mosaicker.blank_value = blank;
        }
        Ok(mosaicker)
    }

    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_blank_value(mut self, blank_value: f64) -> Self {
        self.blank_value = blank_value;
        self
    }

    pub fn used(&self) -> &[(String, usize)] {
        &self.used
    }

    /// Add one candidate to the output, returning the number of pixels it
    /// contributed to
    fn add_image(
        &mut self,
        input: &mut Image,
        output: &mut Image,
        exposure: &mut [f64],
        sampler: &dyn Sampler,
        depth: Option<&DepthSampler>,
        summary: &mut MosaicSummary,
    ) -> Result<usize, Error> {
        let overlap = match Border::default().find_images(std::slice::from_ref(&*input), output) {
            Ok(overlap) if overlap.has_overlap() => overlap,
            Ok(_) => return Ok(0),
            Err(e) => {
                warn!("No overlap for {}: {}", input.name(), e);
                return Ok(0);
            }
        };

        let mut converter = output.wcs().inverse().clone();
        converter.append(input.wcs())?;

        if let Err(e) = input.validate() {
            warn!("Error processing candidate image {}: {}", input.name(), e);
            summary.skipped.push(input.name().to_string());
            return Ok(0);
        }

        let resampled;
        let input: &Image = match depth {
            Some(d) if input.depth() > 1 && !d.is_identity(input.depth()) => {
                resampled = d.sample(input)?;
                &resampled
            }
            _ => &*input,
        };

        if let Err(e) = self.exposure_finder.set_image(input, output) {
            warn!("No exposure for {}: {}", input.name(), e);
            summary.skipped.push(input.name().to_string());
            return Ok(0);
        }

        let mut count = 0;
        for (pix, coverage) in overlap.entries().iter().enumerate() {
            if coverage.image().is_none() {
                continue;
            }
            // a missing exposure gives no weight
            let weight = self.exposure_finder.exposure(pix).max(0.0);
            match sampler.sample(input, &converter, output, pix, weight) {
                Ok(true) => {
                    exposure[pix] += weight;
                    count += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    debug!("Pixel {} not sampled: {}", pix, e);
                    summary.failed_pixels += 1;
                }
            }
        }
        Ok(count)
    }

    /// Divide by the exposure, blanking pixels without any
    fn normalize(&self, output: &mut Image, exposure: &[f64]) {
        let plane = output.plane_size();
        let depth = output.depth();
        for (pix, &e) in exposure.iter().enumerate() {
            if e > 0.0 {
                for k in 0..depth {
                    let v = output.get(pix + k * plane);
                    output.put(pix + k * plane, v / e);
                }
            } else {
                output.mark_invalid(pix);
                for k in 0..depth {
                    output.put(pix + k * plane, self.blank_value);
                }
            }
        }
    }
}

impl Processor for AddingMosaicker {
    fn name(&self) -> &'static str {
        "AddingMosaicker"
    }

    fn description(&self) -> &'static str {
        "Create a new image by adding all overlapping images."
    }

    fn process(
        &mut self,
        inputs: &mut [Image],
        output: &mut Image,
        _source: &SourceMap,
        sampler: &mut dyn Sampler,
        depth: Option<&DepthSampler>,
    ) -> Result<MosaicSummary, Error> {
        let mut exposure = vec![0.0; output.plane_size()];
        let mut summary = MosaicSummary::default();
        sampler.set_bounds(None);

        output.set_accumulate(true);
        for (i, input) in inputs.iter_mut().enumerate() {
            let added = self.add_image(input, output, &mut exposure, sampler, depth, &mut summary);
            input.clear_data();

            let count = match added {
                Ok(count) => count,
                Err(e) => {
                    output.set_accumulate(false);
                    return Err(e);
                }
            };
            if count > 0 {
                info!("Image {} has overlap on {} pixels", i + 1, count);
                self.used.push((input.name().to_string(), count));
                summary.used.push((input.name().to_string(), count));
            }
        }
        output.set_accumulate(false);

        if self.normalize {
            self.normalize(output, &exposure);
        }
        Ok(summary)
    }

    fn update_header(&self, header: &mut dyn HeaderSink) {
        header.insert_history("");
        header.insert_history("Image mosaicking using AddingMosaicker");
        header.insert_history("");
        if self.used.is_empty() {
            no_valid_pixels(header);
        }
        for (name, count) in &self.used {
            header.insert_history(&format!("  Used {} pixels from {}", count, name));
        }
        header.insert_history("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::process::exposure::FitsKeyword;
    use crate::process::Outcome;
    use crate::sampler::NearestNeighbor;
    use crate::WCS;

    macro_rules! assert_delta {
        ($x:expr, $y:expr, $d:expr) => {
            if ($x - $y).abs() > $d {
                panic!("{} != {} (+/- {})", $x, $y, $d);
            }
        };
    }

    /// Tangent plane at (RA, Dec) = (10, 20) deg with 1"/pixel
    fn wcs() -> WCS {
        WCS::tangent(
            10_f64.to_radians(),
            20_f64.to_radians(),
            (1.0_f64 / 3600.0).to_radians(),
            4,
            4,
        )
        .unwrap()
    }

    fn constant(name: &str, value: f64) -> Image {
        Image::new(name, wcs(), 4, 4, 1, vec![value; 16]).unwrap()
    }

    fn run(mosaicker: &mut AddingMosaicker, inputs: &mut [Image]) -> (Image, MosaicSummary) {
        let mut output = Image::blank("out", wcs(), 4, 4, 1);
        let summary = mosaicker
            .process(
                inputs,
                &mut output,
                &SourceMap::empty(),
                &mut NearestNeighbor::default(),
                None,
            )
            .unwrap();
        (output, summary)
    }

    #[test]
    fn exposure_weighted_mean() {
        let mut inputs = [
            constant("ten", 10.0).with_keyword("EXPOSURE", 2.0),
            constant("twenty", 20.0).with_keyword("EXPOSURE", 3.0),
        ];
        let mut mosaicker = AddingMosaicker::new(Box::new(FitsKeyword::default()));
        let (output, summary) = run(&mut mosaicker, &mut inputs);

        // (10 * 2 + 20 * 3) / (2 + 3)
        for pix in 0..16 {
            assert_delta!(output.get(pix), 16.0, 1e-12);
            assert!(output.is_valid(pix));
        }
        assert_eq!(summary.outcome(), Outcome::Complete);
        assert_eq!(mosaicker.used(), [("ten".to_string(), 16), ("twenty".to_string(), 16)]);
        assert!(!output.is_accumulating());
    }

    #[test]
    fn unit_exposures_average() {
        let mut inputs = [constant("a", 3.0), constant("b", 8.0)];
        let (output, _) = run(&mut AddingMosaicker::default(), &mut inputs);
        assert!(output.data().iter().all(|v| (v - 5.5).abs() < 1e-12));

        // exposure maps are summed, not averaged
        let mut inputs = [constant("a", 3.0), constant("b", 8.0)];
        let mut summing = AddingMosaicker::default().with_normalization(false);
        let (output, _) = run(&mut summing, &mut inputs);
        assert!(output.data().iter().all(|v| (v - 11.0).abs() < 1e-12));
    }

    #[test]
    fn zero_exposure_is_blanked() {
        // no EXPOSURE keyword
        let mut inputs = [constant("unknown", 10.0)];
        let mut mosaicker = AddingMosaicker::new(Box::new(FitsKeyword::default()));
        let (output, _) = run(&mut mosaicker, &mut inputs);

        for pix in 0..16 {
            assert_eq!(output.get(pix), -1.0);
            assert!(!output.is_valid(pix));
        }
    }

    #[test]
    fn candidates_without_overlap() {
        // about eleven degrees away
        let far = WCS::tangent(0.3, 0.5, 1e-6, 4, 4).unwrap();
        let mut inputs = [Image::new("far", far, 4, 4, 1, vec![1.0; 16]).unwrap()];
        let mut mosaicker = AddingMosaicker::default().with_blank_value(f64::NAN);
        let (output, summary) = run(&mut mosaicker, &mut inputs);

        assert_eq!(summary.outcome(), Outcome::Empty);
        assert!(output.data().iter().all(|v| v.is_nan()));

        let mut header = Header::new();
        mosaicker.update_header(&mut header);
        assert!(header.value("SV_ERROR").is_some());
    }

    #[test]
    fn settings() {
        let settings = Settings::from_iter([
            ("ExposureFinder", "FitsKeyword"),
            ("NoNormalize", ""),
            ("BlankValue", "-5"),
        ]);
        let mosaicker = AddingMosaicker::from_settings(&settings, None).unwrap();
        assert_eq!(mosaicker.exposure_finder.name(), "FitsKeyword");
        assert!(!mosaicker.normalize);
        assert_eq!(mosaicker.blank_value, -5.0);

        let settings = Settings::from_iter([("BlankValue", "none")]);
        assert!(AddingMosaicker::from_settings(&settings, None).is_err());
    }
}
