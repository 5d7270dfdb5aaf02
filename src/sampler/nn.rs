use super::Sampler;
use crate::image::{Image, PixelBounds};

/// Value of the input pixel the point falls in
#[derive(Clone, Debug, Default)]
pub struct NearestNeighbor {
    bounds: Option<PixelBounds>,
}

impl Sampler for NearestNeighbor {
    fn name(&self) -> String {
        "NN".to_string()
    }

    fn description(&self) -> &'static str {
        "Sample using the nearest input pixel value"
    }

    fn set_bounds(&mut self, bounds: Option<PixelBounds>) {
        self.bounds = bounds;
    }

    fn bounds(&self) -> Option<PixelBounds> {
        self.bounds
    }

    fn sample_at(&self, input: &Image, x: f64, y: f64, layer: usize) -> Option<f64> {
        // The pixel holding (x, y) is the one whose center is nearest
        let (x, y) = (x.floor(), y.floor());
        if !(x >= 0.0 && y >= 0.0 && x < input.width() as f64 && y < input.height() as f64) {
            return None;
        }

        let index = x as usize + input.width() * (y as usize) + layer * input.plane_size();
        Some(input.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::ramp;

    #[test]
    fn nearest_pixel() {
        let input = ramp(4, 3, 1);
        let nn = NearestNeighbor::default();

        assert_eq!(nn.sample_at(&input, 0.0, 0.0, 0), Some(0.0));
        assert_eq!(nn.sample_at(&input, 2.99, 1.01, 0), Some(12.0));
        assert_eq!(nn.sample_at(&input, 3.99, 2.99, 0), Some(23.0));
        assert_eq!(nn.sample_at(&input, 4.0, 1.0, 0), None);
        assert_eq!(nn.sample_at(&input, -0.01, 1.0, 0), None);
        assert!(nn.sample_at(&input, f64::NAN, 1.0, 0).is_none());
    }
}
