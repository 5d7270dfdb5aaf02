//! Rebinning of the third image axis

use crate::error::Error;
use crate::image::Image;

/// Output layer `k` covers input layers `[zero + k * delta, zero + (k + 1) * delta)`,
/// each input layer contributing its overlapping fraction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthSampler {
    zero: f64,
    delta: f64,
    n: usize,
}

impl DepthSampler {
    pub fn new(zero: f64, delta: f64, n: usize) -> Self {
        Self { zero, delta, n }
    }

    pub fn depth(&self) -> usize {
        self.n
    }

    /// Whether sampling an image of this depth would give it back unchanged
    pub fn is_identity(&self, depth: usize) -> bool {
        self.n == depth && self.zero == 0.0 && self.delta == 1.0
    }

    /// Rebinned copy of a resident image
    pub fn sample(&self, input: &Image) -> Result<Image, Error> {
        if !input.is_resident() {
            return Err(Error::InvalidImage(
                input.name().to_string(),
                "depth sampling an image without data".to_string(),
            ));
        }

        let plane = input.plane_size();
        let in_depth = input.depth() as i64;
        let data = input.data();
        let mut output = vec![0.0; plane * self.n];

        for (k, layer) in output.chunks_mut(plane.max(1)).enumerate() {
            let zmin = self.zero + k as f64 * self.delta;
            let zmax = zmin + self.delta;

            let first = zmin.floor() as i64;
            let last = zmax.ceil() as i64;
            for z in first.max(0)..last.min(in_depth) {
                let overlap = zmax.min((z + 1) as f64) - zmin.max(z as f64);
                if overlap <= 0.0 {
                    continue;
                }
                let input_layer = &data[z as usize * plane..(z as usize + 1) * plane];
                for (out, value) in layer.iter_mut().zip(input_layer) {
                    *out += overlap * value;
                }
            }
        }

        input.derived(self.n, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WCS;

    macro_rules! assert_delta {
        ($x:expr, $y:expr, $d:expr) => {
            if ($x - $y).abs() > $d {
                panic!("{} != {} (+/- {})", $x, $y, $d);
            }
        };
    }

    fn cube() -> Image {
        // 2x1 pixels, layer k holds k + 1
        let wcs = WCS::tangent(0.0, 0.0, 1e-4, 2, 1).unwrap();
        let data = (0..8).map(|p| (p / 2 + 1) as f64).collect();
        Image::new("cube", wcs, 2, 1, 4, data)
            .unwrap()
            .with_keyword("EXPOSURE", 3.0)
    }

    #[test]
    fn identity_request() {
        let sampler = DepthSampler::new(0.0, 1.0, 4);
        assert!(sampler.is_identity(4));
        assert!(!sampler.is_identity(3));

        let same = sampler.sample(&cube()).unwrap();
        assert_eq!(same.data(), cube().data());
    }

    #[test]
    fn collapse_and_split() {
        // Sum of all layers: 1 + 2 + 3 + 4
        let all = DepthSampler::new(0.0, 4.0, 1).sample(&cube()).unwrap();
        assert_eq!(all.depth(), 1);
        assert_eq!(all.data(), [10.0, 10.0]);
        assert_eq!(all.keyword("exposure"), Some(3.0));

        // [0.5, 2) and [2, 3.5)
        let halves = DepthSampler::new(0.5, 1.5, 2).sample(&cube()).unwrap();
        assert_delta!(halves.data()[0], 0.5 * 1.0 + 2.0, 1e-12);
        assert_delta!(halves.data()[2], 3.0 + 0.5 * 4.0, 1e-12);

        // Layers past the input are empty
        let beyond = DepthSampler::new(3.0, 1.0, 2).sample(&cube()).unwrap();
        assert_eq!(beyond.data(), [4.0, 4.0, 0.0, 0.0]);
    }
}
