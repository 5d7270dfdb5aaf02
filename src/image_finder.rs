//! Which candidate image supplies each output pixel

use log::{debug, info};

use crate::error::Error;
use crate::image::{Image, PixelBounds};
use crate::settings::{Key, Settings};
use crate::transform::Point;

/// Owner of one output pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// Index of the candidate image
    Image(usize),
    NoCoverage,
    /// The pixel center is off the output projection
    NonPhysical,
    /// Already handled, to be left alone
    Consumed,
}

impl Coverage {
    /// Legacy integer code: the image index or a negative sentinel
    pub fn code(&self) -> i64 {
        match *self {
            Coverage::Image(i) => i as i64,
            Coverage::NoCoverage => -2,
            Coverage::NonPhysical => -3,
            Coverage::Consumed => -4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            c if c >= 0 => Some(Coverage::Image(c as usize)),
            -2 => Some(Coverage::NoCoverage),
            -3 => Some(Coverage::NonPhysical),
            -4 => Some(Coverage::Consumed),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<usize> {
        match *self {
            Coverage::Image(i) => Some(i),
            _ => None,
        }
    }
}

/// One [`Coverage`] per pixel of an output image. An empty map means the
/// finder did not look for overlaps at all
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceMap {
    width: usize,
    entries: Vec<Coverage>,
}

impl SourceMap {
    /// Map of `width * height` uncovered pixels
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            entries: vec![Coverage::NoCoverage; width * height],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(width: usize, entries: Vec<Coverage>) -> Result<Self, Error> {
        if width == 0 || entries.len() % width != 0 {
            return Err(Error::InvalidImage(
                "source map".to_string(),
                format!("{} entries in rows of {}", entries.len(), width),
            ));
        }
        Ok(Self { width, entries })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pix: usize) -> Option<Coverage> {
        self.entries.get(pix).copied()
    }

    pub fn set(&mut self, pix: usize, coverage: Coverage) {
        if let Some(entry) = self.entries.get_mut(pix) {
            *entry = coverage;
        }
    }

    pub fn entries(&self) -> &[Coverage] {
        &self.entries
    }

    /// Whether any pixel is owned by a candidate
    pub fn has_overlap(&self) -> bool {
        self.entries.iter().any(|c| c.image().is_some())
    }

    pub fn count(&self, coverage: Coverage) -> usize {
        self.entries.iter().filter(|c| **c == coverage).count()
    }

    /// Smallest pixel box holding every pixel owned by `image`
    pub fn bounds_of(&self, image: usize) -> Option<PixelBounds> {
        let pixels = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Coverage::Image(image))
            .map(|(pix, _)| pix);
        PixelBounds::enclosing(pixels, self.width)
    }
}

pub trait ImageFinder {
    fn name(&self) -> &'static str;

    fn find_images(&self, candidates: &[Image], output: &Image) -> Result<SourceMap, Error>;
}

/// Projects every output pixel center into the candidates and keeps the
/// one it falls in, away from an `edge` pixels wide border
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Border {
    edge: f64,
    strict: bool,
}

impl Border {
    pub fn new(edge: f64, strict: bool) -> Self {
        Self { edge, strict }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        Ok(Self {
            edge: settings.get_f64(Key::Edge)?.unwrap_or(0.0),
            strict: settings.has(Key::StrictGeometry),
        })
    }

    /// Distance of an output pixel center, given as a unit vector, to the
    /// nearest clipped edge of a candidate. `None` outside
    fn locate(&self, candidate: &Image, unit: Point) -> Option<f64> {
        let [x, y] = candidate.wcs().transform(unit).ok()?.plane("Border").ok()?;
        let x_max = candidate.width() as f64 - self.edge;
        let y_max = candidate.height() as f64 - self.edge;

        let inside = x >= self.edge && y >= self.edge && x < x_max && y < y_max;
        inside.then(|| (x - self.edge).min(x_max - x).min(y - self.edge).min(y_max - y))
    }
}

impl ImageFinder for Border {
    fn name(&self) -> &'static str {
        "Border"
    }

    fn find_images(&self, candidates: &[Image], output: &Image) -> Result<SourceMap, Error> {
        let mut map = SourceMap::new(output.width(), output.height());
        let mut previous: Option<usize> = None;

        for pix in 0..map.len() {
            let unit = match output.wcs().inverse().transform(Point::Plane(output.center(pix))) {
                Ok(unit) => unit,
                Err(e) => {
                    debug!("Output pixel {} is non physical: {}", pix, e);
                    map.set(pix, Coverage::NonPhysical);
                    continue;
                }
            };

            if !self.strict {
                if let Some(prev) = previous {
                    if self.locate(&candidates[prev], unit).is_some() {
                        map.set(pix, Coverage::Image(prev));
                        continue;
                    }
                }
            }

            let mut best: Option<(usize, f64)> = None;
            for (i, candidate) in candidates.iter().enumerate() {
                if let Some(margin) = self.locate(candidate, unit) {
                    if best.map_or(true, |(_, m)| margin > m) {
                        best = Some((i, margin));
                    }
                    if !self.strict {
                        break;
                    }
                }
            }

            if let Some((i, _)) = best {
                map.set(pix, Coverage::Image(i));
                previous = Some(i);
            }
        }

        Ok(map)
    }
}

/// Leaves overlap finding to the caller and returns an empty map
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bypass;

impl ImageFinder for Bypass {
    fn name(&self) -> &'static str {
        "Bypass"
    }

    fn find_images(&self, candidates: &[Image], _output: &Image) -> Result<SourceMap, Error> {
        info!("ImageFinder bypassed: {} images", candidates.len());
        Ok(SourceMap::empty())
    }
}

/// Finder from its name, `None`, "" or "default" giving [`Border`]
pub fn factory(name: Option<&str>, settings: &Settings) -> Result<Box<dyn ImageFinder>, Error> {
    match name.map(str::trim) {
        None | Some("") => Ok(Box::new(Border::from_settings(settings)?)),
        Some(n) if n.eq_ignore_ascii_case("default") || n.eq_ignore_ascii_case("border") => {
            Ok(Box::new(Border::from_settings(settings)?))
        }
        Some(n) if n.eq_ignore_ascii_case("bypass") => Ok(Box::new(Bypass)),
        Some(n) => Err(Error::UnknownComponent("image finder", n.to_string())),
    }
}
