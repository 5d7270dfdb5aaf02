use super::Sampler;
use crate::image::{Image, PixelBounds};

/// Bilinear interpolation between the four nearest pixel centers
#[derive(Clone, Debug, Default)]
pub struct Bilinear {
    bounds: Option<PixelBounds>,
}

impl Sampler for Bilinear {
    fn name(&self) -> String {
        "LI".to_string()
    }

    fn description(&self) -> &'static str {
        "Sample using a bi-linear interpolation"
    }

    fn set_bounds(&mut self, bounds: Option<PixelBounds>) {
        self.bounds = bounds;
    }

    fn bounds(&self) -> Option<PixelBounds> {
        self.bounds
    }

    fn sample_at(&self, input: &Image, x: f64, y: f64, layer: usize) -> Option<f64> {
        let (width, height) = (input.width(), input.height());
        if width == 0 || height == 0 {
            return None;
        }
        // No extrapolation past the outermost pixel centers
        let (x, y) = (x - 0.5, y - 0.5);
        if !(x >= 0.0 && y >= 0.0 && x <= (width - 1) as f64 && y <= (height - 1) as f64) {
            return None;
        }

        let (ix, iy) = (x.floor() as usize, y.floor() as usize);
        let (dx, dy) = (x - ix as f64, y - iy as f64);
        let ix1 = (ix + 1).min(width - 1);
        let iy1 = (iy + 1).min(height - 1);

        let offset = layer * input.plane_size();
        let at = |i: usize, j: usize| input.get(offset + i + width * j);
        Some(
            (1.0 - dx) * (1.0 - dy) * at(ix, iy)
                + dx * (1.0 - dy) * at(ix1, iy)
                + (1.0 - dx) * dy * at(ix, iy1)
                + dx * dy * at(ix1, iy1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::ramp;

    macro_rules! assert_delta {
        ($x:expr, $y:expr, $d:expr) => {
            if ($x - $y).abs() > $d {
                panic!("{} != {} (+/- {})", $x, $y, $d);
            }
        };
    }

    #[test]
    fn ramp_is_reproduced() {
        let input = ramp(4, 3, 2);
        let li = Bilinear::default();

        // value = i + 10 j + 100 layer at center (i + 0.5, j + 0.5)
        for (x, y) in [(0.5, 0.5), (1.25, 2.0), (3.5, 2.5), (2.0, 0.75)] {
            let expected = (x - 0.5) + 10.0 * (y - 0.5);
            assert_delta!(li.sample_at(&input, x, y, 0).unwrap(), expected, 1e-12);
            assert_delta!(li.sample_at(&input, x, y, 1).unwrap(), expected + 100.0, 1e-12);
        }

        assert_eq!(li.sample_at(&input, 0.4, 1.0, 0), None);
        assert_eq!(li.sample_at(&input, 3.6, 1.0, 0), None);
    }
}
