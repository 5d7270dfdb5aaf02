use super::{MosaicSummary, Processor};
use crate::depth_sampler::DepthSampler;
use crate::error::Error;
use crate::header::HeaderSink;
use crate::image::Image;
use crate::image_finder::{Coverage, SourceMap};
use crate::sampler::Sampler;

/// Length of a header card, and of its `HISTORY ` prefix
const CARD_LEN: usize = 80;
const HISTORY_LEN: usize = 8;

/// Writes in each output pixel the code of the candidate it would be
/// sampled from, without reading any candidate
#[derive(Clone, Debug, Default)]
pub struct IDMosaic {
    counts: Vec<usize>,
    names: Vec<String>,
    no_coverage: usize,
    non_physical: usize,
    consumed: usize,
}

impl IDMosaic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output pixels assigned to each candidate
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn no_coverage(&self) -> usize {
        self.no_coverage
    }

    pub fn non_physical(&self) -> usize {
        self.non_physical
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

/// `prefix` followed by `name`, keeping the end of the name when the card
/// would be too long
fn history_line(prefix: &str, name: &str) -> String {
    let used = prefix.len() + HISTORY_LEN;
    if used + name.len() <= CARD_LEN {
        return format!("{}{}", prefix, name);
    }
    let keep = CARD_LEN.saturating_sub(used + 3);
    let start = name.len() - keep.min(name.len());
    let start = (start..=name.len())
        .find(|&i| name.is_char_boundary(i))
        .unwrap_or(name.len());
    format!("{}...{}", prefix, &name[start..])
}

impl Processor for IDMosaic {
    fn name(&self) -> &'static str {
        "IDMosaic"
    }

    fn description(&self) -> &'static str {
        "Say which tile each pixel would be sampled from."
    }

    fn process(
        &mut self,
        inputs: &mut [Image],
        output: &mut Image,
        source: &SourceMap,
        _sampler: &mut dyn Sampler,
        _depth: Option<&DepthSampler>,
    ) -> Result<MosaicSummary, Error> {
        *self = Self {
            counts: vec![0; inputs.len()],
            names: inputs.iter().map(|i| i.name().to_string()).collect(),
            ..Self::default()
        };

        let plane = output.plane_size();
        for (pix, coverage) in source.entries().iter().enumerate().take(plane) {
            match *coverage {
                Coverage::Image(img) => match self.counts.get_mut(img) {
                    Some(count) => *count += 1,
                    None => {
                        return Err(Error::InvalidImage(
                            "source map".to_string(),
                            format!("no candidate #{}", img),
                        ))
                    }
                },
                Coverage::NoCoverage => self.no_coverage += 1,
                Coverage::NonPhysical => self.non_physical += 1,
                Coverage::Consumed => {
                    self.consumed += 1;
                    continue;
                }
            }
            for k in 0..output.depth() {
                output.put(pix + k * plane, coverage.code() as f64);
            }
        }

        let used = self
            .names
            .iter()
            .zip(&self.counts)
            .filter(|(_, count)| **count > 0)
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        Ok(MosaicSummary {
            used,
            ..Default::default()
        })
    }

    fn update_header(&self, header: &mut dyn HeaderSink) {
        header.insert_history("");
        header.insert_history("Image mosaicking using IDMosaic");
        header.insert_history("");
        header.insert_history("************************************");
        header.insert_history("** Images used                    **");
        header.insert_history("************************************");
        header.insert_history("");

        for (i, (name, count)) in self.names.iter().zip(&self.counts).enumerate() {
            if *count > 0 {
                let prefix = format!("{} ({}): ", i, count);
                header.insert_history(&history_line(&prefix, name));
            }
        }
        header.insert_history("");
        if self.no_coverage > 0 {
            header.insert_history(&format!("Uncovered pixels:{}", self.no_coverage));
        }
        if self.non_physical > 0 {
            header.insert_history(&format!("Pixels off projection:{}", self.non_physical));
        }
        header.insert_history("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::sampler::NearestNeighbor;
    use crate::WCS;

    fn wcs() -> WCS {
        WCS::tangent(1.0, 0.1, 1e-4, 4, 4).unwrap()
    }

    #[test]
    fn codes_and_counts() {
        let mut inputs = [
            Image::blank("north", wcs(), 4, 4, 1),
            Image::blank("south", wcs(), 4, 4, 1),
            Image::blank("unused", wcs(), 4, 4, 1),
        ];
        let entries: Vec<_> = (0..16)
            .map(|pix| match pix {
                0..=5 => Coverage::Image(0),
                6..=10 => Coverage::Image(1),
                11 | 12 => Coverage::NoCoverage,
                13 => Coverage::NonPhysical,
                _ => Coverage::Consumed,
            })
            .collect();
        let source = SourceMap::from_entries(4, entries.clone()).unwrap();

        let mut output = Image::blank("out", wcs(), 4, 4, 2);
        output.fill(99.0);
        let mut id = IDMosaic::new();
        let summary = id
            .process(&mut inputs, &mut output, &source, &mut NearestNeighbor::default(), None)
            .unwrap();

        assert_eq!(id.counts(), [6, 5, 0]);
        assert_eq!(id.no_coverage(), 2);
        assert_eq!(id.non_physical(), 1);
        assert_eq!(id.consumed(), 2);
        let total: usize = id.counts().iter().sum::<usize>()
            + id.no_coverage()
            + id.non_physical()
            + id.consumed();
        assert_eq!(total, 16);

        for (pix, coverage) in entries.iter().enumerate() {
            let expected = match coverage {
                Coverage::Consumed => 99.0,
                c => c.code() as f64,
            };
            assert_eq!(output.get(pix), expected);
            assert_eq!(output.get(pix + 16), expected);
        }
        // candidates are never read
        assert_eq!(
            summary.used,
            [("north".to_string(), 6), ("south".to_string(), 5)]
        );

        let mut header = Header::new();
        id.update_header(&mut header);
        let history: Vec<_> = header.history().collect();
        assert!(history.contains(&"0 (6): north"));
        assert!(history.contains(&"1 (5): south"));
        assert!(history.contains(&"Uncovered pixels:2"));
        assert!(history.contains(&"Pixels off projection:1"));
        assert!(!history.iter().any(|h| h.contains("unused")));
    }

    #[test]
    fn long_names_keep_their_end() {
        let name = format!("/data/{}/tile.fits", "x".repeat(100));
        let line = history_line("12 (345): ", &name);
        assert_eq!(line.len() + HISTORY_LEN, CARD_LEN);
        assert!(line.starts_with("12 (345): ..."));
        assert!(line.ends_with("/tile.fits"));

        assert_eq!(history_line("0 (1): ", "short.fits"), "0 (1): short.fits");
    }

    #[test]
    fn unknown_candidate() {
        let source = SourceMap::from_entries(4, vec![Coverage::Image(2); 16]).unwrap();
        let mut output = Image::blank("out", wcs(), 4, 4, 1);
        let result = IDMosaic::new().process(
            &mut [],
            &mut output,
            &source,
            &mut NearestNeighbor::default(),
            None,
        );
        assert!(result.is_err());
    }
}
