use log::{debug, info, warn};

use super::{no_valid_pixels, ordinal_suffix, MosaicSummary, Processor};
use crate::depth_sampler::DepthSampler;
use crate::error::Error;
use crate::header::HeaderSink;
use crate::image::{Image, PixelBounds};
use crate::image_finder::{Coverage, SourceMap};
use crate::sampler::Sampler;

/// Samples each output pixel from the candidate owning it.
///
/// Candidates are handled one at a time, in the order they first appear in
/// the source map: a candidate is read, every pixel it owns is sampled,
/// then its data is released.
#[derive(Clone, Debug, Default)]
pub struct Mosaicker {
    used_images: Vec<String>,
}

impl Mosaicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used_images(&self) -> &[String] {
        &self.used_images
    }
}

/// First pixel still owned by a candidate and that candidate
fn next_candidate(source: &[Coverage]) -> Option<(usize, usize)> {
    source
        .iter()
        .enumerate()
        .find_map(|(pix, c)| c.image().map(|img| (pix, img)))
}

impl Processor for Mosaicker {
    fn name(&self) -> &'static str {
        "Mosaicker"
    }

    fn description(&self) -> &'static str {
        "Create a new image by putting together resampled pixels from set of old images"
    }

    fn process(
        &mut self,
        inputs: &mut [Image],
        output: &mut Image,
        source: &SourceMap,
        sampler: &mut dyn Sampler,
        depth: Option<&DepthSampler>,
    ) -> Result<MosaicSummary, Error> {
        let mut source = source.entries().to_vec();
        let mut summary = MosaicSummary::default();
        let mut processed = 0;

        while let Some((first, img)) = next_candidate(&source) {
            let pixels: Vec<usize> = (first..source.len())
                .filter(|&pix| source[pix] == Coverage::Image(img))
                .collect();
            for &pix in &pixels {
                source[pix] = Coverage::Consumed;
            }

            let Some(candidate) = inputs.get_mut(img) else {
                warn!("Source map refers to missing candidate image #{}", img);
                continue;
            };
            if let Err(e) = candidate.validate() {
                warn!("Error processing candidate image #{}: {}", img, e);
                summary.skipped.push(candidate.name().to_string());
                continue;
            }
            self.used_images.push(candidate.name().to_string());

            let mut converter = output.wcs().inverse().clone();
            converter.append(candidate.wcs())?;

            processed += 1;
            info!(
                "Processing {}{} candidate image #{}",
                processed,
                ordinal_suffix(processed),
                img
            );

            let resampled;
            let input: &Image = match depth {
                Some(d) if candidate.depth() > 1 && !d.is_identity(candidate.depth()) => {
                    resampled = d.sample(candidate)?;
                    &resampled
                }
                _ => &*candidate,
            };

            let bounds = if input.is_tiled() {
                PixelBounds::enclosing(pixels.iter().copied(), output.width())
            } else {
                None
            };
            sampler.set_bounds(bounds);

            let mut written = 0;
            for &pix in &pixels {
                match sampler.sample(input, &converter, output, pix, 1.0) {
                    Ok(true) => written += 1,
                    Ok(false) => {}
                    Err(e) => {
                        debug!("Pixel {} not sampled: {}", pix, e);
                        summary.failed_pixels += 1;
                    }
                }
            }
            summary
                .used
                .push((candidate.name().to_string(), written));

            candidate.clear_data();
        }

        sampler.set_bounds(None);
        Ok(summary)
    }

    fn update_header(&self, header: &mut dyn HeaderSink) {
        header.insert_history("");
        header.insert_history("Image mosaicking using Mosaicker");
        header.insert_history("");
        if self.used_images.is_empty() {
            no_valid_pixels(header);
        }
        for name in &self.used_images {
            header.insert_history(&format!("  Used image:{}", name));
        }
        header.insert_history("");
    }
}
