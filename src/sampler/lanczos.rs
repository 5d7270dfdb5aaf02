use std::f64::consts::PI;

use super::Sampler;
use crate::image::{Image, PixelBounds};

/// Smoothly truncated sinc kernel with `lobes` lobes on each side
#[derive(Clone, Debug)]
pub struct Lanczos {
    lobes: usize,
    bounds: Option<PixelBounds>,
}

impl Default for Lanczos {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Lanczos {
    pub fn new(lobes: usize) -> Self {
        Self {
            lobes: lobes.max(1),
            bounds: None,
        }
    }

    pub fn lobes(&self) -> usize {
        self.lobes
    }

    fn kernel(&self, d: f64) -> f64 {
        if d.abs() < 1e-10 {
            return 1.0;
        }
        let n = self.lobes as f64;
        n * (PI * d).sin() * (PI * d / n).sin() / (PI * PI * d * d)
    }

    /// First tap and the weights of the 2n taps around `x`
    fn weights(&self, x: f64, size: usize) -> Option<(usize, Vec<f64>)> {
        let n = self.lobes;
        let ix = x.floor();
        if !(ix >= (n - 1) as f64 && ix + (n as f64) < size as f64) {
            return None;
        }

        let first = ix as usize + 1 - n;
        let weights = (0..2 * n)
            .map(|k| self.kernel(x - (first + k) as f64))
            .collect();
        Some((first, weights))
    }
}

impl Sampler for Lanczos {
    fn name(&self) -> String {
        format!("Lanczos{}", self.lobes)
    }

    fn description(&self) -> &'static str {
        "Sample using smoothly truncated sinc kernel"
    }

    fn set_bounds(&mut self, bounds: Option<PixelBounds>) {
        self.bounds = bounds;
    }

    fn bounds(&self) -> Option<PixelBounds> {
        self.bounds
    }

    fn sample_at(&self, input: &Image, x: f64, y: f64, layer: usize) -> Option<f64> {
        let (x0, xw) = self.weights(x - 0.5, input.width())?;
        let (y0, yw) = self.weights(y - 0.5, input.height())?;

        let offset = layer * input.plane_size();
        let mut total = 0.0;
        let mut norm = 0.0;
        for (j, wy) in yw.iter().enumerate() {
            for (i, wx) in xw.iter().enumerate() {
                let w = wx * wy;
                total += w * input.get(offset + x0 + i + input.width() * (y0 + j));
                norm += w;
            }
        }
        Some(total / norm)
    }
}
