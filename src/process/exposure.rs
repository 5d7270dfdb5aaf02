//! Per pixel exposure of the candidates of an adding mosaic

use log::debug;

use crate::converter::Converter;
use crate::error::Error;
use crate::image::Image;
use crate::sampler::{self, Sampler};
use crate::settings::{Key, Settings};
use crate::transform::Point;

pub trait ExposureFinder {
    fn name(&self) -> &'static str;

    /// Prepare for the pixels of `output` sampled from `input`
    fn set_image(&mut self, input: &Image, output: &Image) -> Result<(), Error>;

    /// Exposure of the current candidate at an output pixel
    fn exposure(&self, pix: usize) -> f64;
}

/// Reads the exposure image sitting next to a candidate
pub trait ExposureLoader {
    fn load(&self, name: &str) -> Result<Image, Error>;
}

/// The same exposure everywhere
#[derive(Clone, Copy, Debug, Default)]
pub struct Null;

impl ExposureFinder for Null {
    fn name(&self) -> &'static str {
        "Null"
    }

    fn set_image(&mut self, _input: &Image, _output: &Image) -> Result<(), Error> {
        Ok(())
    }

    fn exposure(&self, _pix: usize) -> f64 {
        1.0
    }
}

/// Exposure read from a keyword of the candidate, -1 when missing
#[derive(Clone, Debug)]
pub struct FitsKeyword {
    key: String,
    exposure: f64,
}

impl Default for FitsKeyword {
    fn default() -> Self {
        Self::new("EXPOSURE")
    }
}

impl FitsKeyword {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            exposure: -1.0,
        }
    }
}

impl ExposureFinder for FitsKeyword {
    fn name(&self) -> &'static str {
        "FitsKeyword"
    }

    fn set_image(&mut self, input: &Image, _output: &Image) -> Result<(), Error> {
        self.exposure = input.keyword(&self.key).unwrap_or_else(|| {
            debug!("No {} keyword in {}", self.key, input.name());
            -1.0
        });
        Ok(())
    }

    fn exposure(&self, _pix: usize) -> f64 {
        self.exposure
    }
}

/// Current exposure image and its transform from output pixels
struct ExposureMap {
    image: Image,
    converter: Converter,
    output_width: usize,
}

/// Exposure sampled from an exposure image named after the candidate,
/// e.g. `field.exp.fits` for `field.fits`
pub struct ExposureFile {
    loader: Box<dyn ExposureLoader>,
    sampler: Box<dyn Sampler>,
    /// (suffix of the candidate name, suffix of the exposure image name)
    rules: Vec<(String, String)>,
    current: Option<ExposureMap>,
}

impl ExposureFile {
    pub fn new(loader: Box<dyn ExposureLoader>, sampler: Box<dyn Sampler>) -> Self {
        Self {
            loader,
            sampler,
            rules: vec![
                (".fits.gz".to_string(), ".exp.fits.gz".to_string()),
                (".fits".to_string(), ".exp.fits".to_string()),
            ],
            current: None,
        }
    }

    /// `ExposureFileMatch` and `ExposureFileGen` replace the suffix rules,
    /// `Sampler` selects how the exposure image is sampled
    pub fn from_settings(settings: &Settings, loader: Box<dyn ExposureLoader>) -> Result<Self, Error> {
        let sampler = sampler::factory(settings.get(Key::Sampler).unwrap_or(""))?;
        let mut finder = Self::new(loader, sampler);

        match (settings.get(Key::ExposureFileMatch), settings.get(Key::ExposureFileGen)) {
            (Some(from), Some(to)) => finder.rules = vec![(from.to_string(), to.to_string())],
            (None, None) => {}
            (Some(_), None) => return Err(Error::MissingSetting(Key::ExposureFileGen.name().to_string())),
            (None, Some(_)) => return Err(Error::MissingSetting(Key::ExposureFileMatch.name().to_string())),
        }
        Ok(finder)
    }

    /// Name of the exposure image of a candidate
    pub fn exposure_name(&self, name: &str) -> Option<String> {
        self.rules.iter().find_map(|(from, to)| {
            name.strip_suffix(from.as_str())
                .map(|stem| format!("{}{}", stem, to))
        })
    }
}

impl ExposureFinder for ExposureFile {
    fn name(&self) -> &'static str {
        "ExposureFile"
    }

    fn set_image(&mut self, input: &Image, output: &Image) -> Result<(), Error> {
        self.current = None;
        let name = self.exposure_name(input.name()).ok_or_else(|| {
            Error::InvalidImage(input.name().to_string(), "no exposure image name".to_string())
        })?;

        let mut image = self.loader.load(&name)?;
        image.validate()?;
        let mut converter = output.wcs().inverse().clone();
        converter.append(image.wcs())?;

        self.current = Some(ExposureMap {
            image,
            converter,
            output_width: output.width(),
        });
        Ok(())
    }

    /// Zero outside the exposure image
    fn exposure(&self, pix: usize) -> f64 {
        let Some(map) = &self.current else {
            return 0.0;
        };
        let center = [
            (pix % map.output_width) as f64 + 0.5,
            (pix / map.output_width) as f64 + 0.5,
        ];

        map.converter
            .transform(Point::Plane(center))
            .and_then(|p| p.plane("ExposureFile"))
            .ok()
            .and_then(|[x, y]| self.sampler.sample_at(&map.image, x, y, 0))
            .unwrap_or(0.0)
    }
}

/// Exposure finder selected by the `ExposureFinder` setting, [`Null`] when
/// it is not set
pub fn factory(
    settings: &Settings,
    loader: Option<Box<dyn ExposureLoader>>,
) -> Result<Box<dyn ExposureFinder>, Error> {
    let Some(name) = settings.get(Key::ExposureFinder) else {
        return Ok(Box::new(Null));
    };

    match name.to_ascii_lowercase().as_str() {
        "" | "null" => Ok(Box::new(Null)),
        "fitskeyword" => {
            let key = settings.get(Key::ExposureKeyword).unwrap_or("EXPOSURE");
            Ok(Box::new(FitsKeyword::new(key)))
        }
        "exposurefile" => {
            let loader = loader.ok_or_else(|| {
                Error::InvalidSetting(
                    Key::ExposureFinder.name().to_string(),
                    format!("{} without an exposure loader", name),
                )
            })?;
            Ok(Box::new(ExposureFile::from_settings(settings, loader)?))
        }
        _ => Err(Error::UnknownComponent("exposure finder", name.to_string())),
    }
}
