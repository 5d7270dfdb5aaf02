use crate::error::Error;

const TOLERANCE: f64 = 1e-10;
const MAX_ITERATIONS: usize = 10;

/// Radial cubic distortion `r' = r + scale.r^3` about `(x0, y0)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neat {
    scale: f64,
    x0: f64,
    y0: f64,
}

impl Neat {
    pub fn new(scale: f64, x0: f64, y0: f64) -> Self {
        Self { scale, x0, y0 }
    }

    pub fn inverted(&self) -> NeatInverse {
        NeatInverse(*self)
    }

    pub fn apply(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        let dx = x - self.x0;
        let dy = y - self.y0;
        let r = (dx * dx + dy * dy).sqrt();
        if r == 0.0 {
            return [x, y];
        }

        let stretch = 1.0 + self.scale * r * r;
        [self.x0 + dx * stretch, self.y0 + dy * stretch]
    }
}

/// Inverse of [`Neat`], solving `t + scale.t^3 = r'` for every point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeatInverse(Neat);

impl NeatInverse {
    pub fn inverted(&self) -> Neat {
        self.0
    }

    pub fn apply(&self, [x, y]: [f64; 2]) -> Result<[f64; 2], Error> {
        let Neat { scale, x0, y0 } = self.0;
        let dx = x - x0;
        let dy = y - y0;
        let rp = (dx * dx + dy * dy).sqrt();
        if rp == 0.0 {
            return Ok([x, y]);
        }

        let mut t = rp - scale * rp * rp * rp;
        for _ in 0..MAX_ITERATIONS {
            let delta = (rp - t - scale * t * t * t) / (1.0 + 3.0 * scale * t * t);
            if !delta.is_finite() {
                break;
            }
            t += delta;
            if delta.abs() < TOLERANCE {
                return Ok([x0 + dx * t / rp, y0 + dy * t / rp]);
            }
        }

        Err(Error::NotConverged("NeatInv", MAX_ITERATIONS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn round_trip() {
        let neat = Neat::new(0.05, 0.1, -0.2);
        let inv = neat.inverted();

        for p in [[0.1, -0.2], [0.3, 0.4], [-0.5, 0.05], [0.9, 0.9]] {
            let back = inv.apply(neat.apply(p)).unwrap();
            assert_abs_diff_eq!(back[0], p[0], epsilon = 1e-9);
            assert_abs_diff_eq!(back[1], p[1], epsilon = 1e-9);
        }
    }

    #[test]
    fn distortion_is_radial() {
        let neat = Neat::new(0.5, 1.0, 1.0);
        // r = 1 along +x, r' = 1.5
        assert_eq!(neat.apply([2.0, 1.0]), [2.5, 1.0]);
        assert_eq!(neat.apply([1.0, 1.0]), [1.0, 1.0]);
    }

    #[test]
    fn no_real_solution_does_not_converge() {
        // t - t^3 peaks at 2/(3 sqrt 3) so r' = 1 has no root near the start
        let inv = Neat::new(-1.0, 0.0, 0.0).inverted();
        assert_eq!(
            inv.apply([1.0, 0.0]),
            Err(Error::NotConverged("NeatInv", MAX_ITERATIONS))
        );
    }
}
