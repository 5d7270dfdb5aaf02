//! Images and their pixel buffers
//!
//! Data is a flat `width * height * depth` buffer, x varying fastest then y
//! then the layer. Pixel `(i, j)` covers `[i, i + 1) x [j, j + 1)` so its
//! center is at `(i + 0.5, j + 0.5)`.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::error::Error;
use crate::WCS;

/// Backing store of an image whose pixels are only loaded when needed
pub trait PixelSource {
    /// Every pixel of the image, in image order
    fn load(&self) -> Result<Vec<f64>, Error>;

    /// Whether the store is split in tiles that can be read separately
    fn is_tiled(&self) -> bool {
        false
    }
}

/// Inclusive pixel box
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl PixelBounds {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Smallest box holding every given pixel index of a `width` wide image
    pub fn enclosing<I: IntoIterator<Item = usize>>(pixels: I, width: usize) -> Option<Self> {
        pixels.into_iter().fold(None, |bounds, pix| {
            let (x, y) = (pix % width, pix / width);
            Some(match bounds {
                None => PixelBounds {
                    x_min: x,
                    x_max: x,
                    y_min: y,
                    y_max: y,
                },
                Some(b) => PixelBounds {
                    x_min: b.x_min.min(x),
                    x_max: b.x_max.max(x),
                    y_min: b.y_min.min(y),
                    y_max: b.y_max.max(y),
                },
            })
        })
    }
}

pub struct Image {
    name: String,
    wcs: WCS,
    width: usize,
    height: usize,
    depth: usize,
    data: Option<Vec<f64>>,
    source: Option<Box<dyn PixelSource>>,
    /// Per spatial pixel, allocated on the first invalid pixel
    invalid: Option<Vec<bool>>,
    accumulate: bool,
    keywords: HashMap<String, f64>,
}

impl Image {
    /// Image holding its data in memory
    pub fn new(
        name: &str,
        wcs: WCS,
        width: usize,
        height: usize,
        depth: usize,
        data: Vec<f64>,
    ) -> Result<Self, Error> {
        let mut image = Self::empty(name, wcs, width, height, depth);
        image.check_length(data.len())?;
        image.data = Some(data);
        Ok(image)
    }

    /// Zero filled image, e.g. the output of a mosaic
    pub fn blank(name: &str, wcs: WCS, width: usize, height: usize, depth: usize) -> Self {
        let mut image = Self::empty(name, wcs, width, height, depth);
        image.data = Some(vec![0.0; width * height * depth]);
        image
    }

    /// Image whose pixels are read from `source` on [`Image::validate`]
    pub fn lazy(
        name: &str,
        wcs: WCS,
        width: usize,
        height: usize,
        depth: usize,
        source: Box<dyn PixelSource>,
    ) -> Self {
        let mut image = Self::empty(name, wcs, width, height, depth);
        image.source = Some(source);
        image
    }

    fn empty(name: &str, wcs: WCS, width: usize, height: usize, depth: usize) -> Self {
        Self {
            name: name.to_string(),
            wcs,
            width,
            height,
            depth,
            data: None,
            source: None,
            invalid: None,
            accumulate: false,
            keywords: HashMap::new(),
        }
    }

    /// Same image geometry, name and keywords with new data
    pub fn derived(&self, depth: usize, data: Vec<f64>) -> Result<Self, Error> {
        let mut image = Self::new(&self.name, self.wcs.clone(), self.width, self.height, depth, data)?;
        image.keywords = self.keywords.clone();
        Ok(image)
    }

    pub fn with_keyword(mut self, key: &str, value: f64) -> Self {
        self.keywords.insert(key.trim().to_ascii_uppercase(), value);
        self
    }

    pub fn keyword(&self, key: &str) -> Option<f64> {
        self.keywords.get(&key.trim().to_ascii_uppercase()).copied()
    }

    fn check_length(&self, len: usize) -> Result<(), Error> {
        let expected = self.width * self.height * self.depth;
        if len != expected {
            return Err(Error::InvalidImage(
                self.name.clone(),
                format!("{} pixels given for a {}x{}x{} image", len, self.width, self.height, self.depth),
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wcs(&self) -> &WCS {
        &self.wcs
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of pixels in one layer
    pub fn plane_size(&self) -> usize {
        self.width * self.height
    }

    /// Make the pixel data resident
    pub fn validate(&mut self) -> Result<(), Error> {
        if self.data.is_some() {
            return Ok(());
        }
        let source = self.source.as_ref().ok_or_else(|| {
            Error::InvalidImage(self.name.clone(), "no pixel data".to_string())
        })?;

        let data = source.load()?;
        self.check_length(data.len())?;
        debug!("Loaded {} pixels of {}", data.len(), self.name);
        self.data = Some(data);
        Ok(())
    }

    /// Release the pixel data. Images without a backing source keep theirs
    /// since it could not be read again
    pub fn clear_data(&mut self) {
        if self.source.is_some() {
            self.data = None;
        }
    }

    pub fn is_resident(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_tiled(&self) -> bool {
        self.source.as_ref().map_or(false, |s| s.is_tiled())
    }

    /// Empty when the data is not resident
    pub fn data(&self) -> &[f64] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    /// Value at a flat index, NaN when out of range or not resident
    pub fn get(&self, index: usize) -> f64 {
        self.data().get(index).copied().unwrap_or(f64::NAN)
    }

    /// Write a value, adding it to the current one in accumulate mode
    pub fn put(&mut self, index: usize, value: f64) {
        let accumulate = self.accumulate;
        if let Some(v) = self.data_mut().get_mut(index) {
            if accumulate {
                *v += value;
            } else {
                *v = value;
            }
        }
    }

    pub fn fill(&mut self, value: f64) {
        self.data_mut().iter_mut().for_each(|v| *v = value);
    }

    pub fn set_accumulate(&mut self, accumulate: bool) {
        self.accumulate = accumulate;
    }

    pub fn is_accumulating(&self) -> bool {
        self.accumulate
    }

    /// Center of a pixel of the first layer
    pub fn center(&self, pix: usize) -> [f64; 2] {
        [
            (pix % self.width) as f64 + 0.5,
            (pix / self.width) as f64 + 0.5,
        ]
    }

    pub fn is_valid(&self, pix: usize) -> bool {
        self.invalid
            .as_ref()
            .map_or(true, |mask| !mask.get(pix).copied().unwrap_or(false))
    }

    pub fn mark_invalid(&mut self, pix: usize) {
        let size = self.plane_size();
        let mask = self.invalid.get_or_insert_with(|| vec![false; size]);
        if let Some(m) = mask.get_mut(pix) {
            *m = true;
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.depth)
            .field("resident", &self.is_resident())
            .field("wcs", &self.wcs)
            .finish()
    }
}
