//! Interpolation of input images at transformed output pixel centers
//!
//! Input values are taken to be measured at pixel centers, so the kernels
//! work in coordinates shifted by half a pixel where the first center is 0.

mod lanczos;
mod li;
mod nn;

pub use lanczos::Lanczos;
pub use li::Bilinear;
pub use nn::NearestNeighbor;

use crate::converter::Converter;
use crate::error::Error;
use crate::image::{Image, PixelBounds};
use crate::transform::Point;

pub trait Sampler {
    fn name(&self) -> String;

    fn description(&self) -> &'static str;

    /// Restrict sampling to a box of output pixels, `None` to lift it
    fn set_bounds(&mut self, bounds: Option<PixelBounds>);

    fn bounds(&self) -> Option<PixelBounds>;

    /// Value of layer `layer` of `input` at pixel position (x, y), `None`
    /// when the kernel does not fit inside the image
    fn sample_at(&self, input: &Image, x: f64, y: f64, layer: usize) -> Option<f64>;

    /// Sample output pixel `pix` from `input`, `transform` going from output
    /// pixels to input pixels. Every layer gets `value * weight`, added or
    /// overwritten according to the accumulate mode of `output`.
    ///
    /// Returns whether anything was written.
    fn sample(
        &self,
        input: &Image,
        transform: &Converter,
        output: &mut Image,
        pix: usize,
        weight: f64,
    ) -> Result<bool, Error> {
        let center = output.center(pix);
        if let Some(bounds) = self.bounds() {
            let (x, y) = (pix % output.width(), pix / output.width());
            if !bounds.contains(x, y) {
                return Ok(false);
            }
        }

        let [x, y] = transform
            .transform(Point::Plane(center))?
            .plane("Sampler")?;

        let plane = output.plane_size();
        let mut written = false;
        for layer in 0..input.depth().min(output.depth()) {
            if let Some(value) = self.sample_at(input, x, y, layer) {
                output.put(pix + layer * plane, value * weight);
                written = true;
            }
        }
        Ok(written)
    }
}

/// Sampler from its name, an optional order suffix selecting e.g. the
/// number of Lanczos lobes ("Lanczos4"). An empty name or "default" gives
/// the nearest neighbor sampler.
pub fn factory(name: &str) -> Result<Box<dyn Sampler>, Error> {
    let name = name.trim();
    if name.is_empty() || name.eq_ignore_ascii_case("default") {
        return Ok(Box::new(NearestNeighbor::default()));
    }

    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    // A name made of digits only has no base
    let (base, order) = if base.is_empty() {
        (name, None)
    } else {
        (base, name[base.len()..].parse::<usize>().ok())
    };

    match base.to_ascii_lowercase().as_str() {
        "nn" => Ok(Box::new(NearestNeighbor::default())),
        "li" => Ok(Box::new(Bilinear::default())),
        "lanczos" => match order {
            Some(0) => Err(Error::InvalidSetting(
                "Sampler".to_string(),
                name.to_string(),
            )),
            Some(n) => Ok(Box::new(Lanczos::new(n))),
            None => Ok(Box::new(Lanczos::default())),
        },
        _ => Err(Error::UnknownComponent("sampler", name.to_string())),
    }
}
