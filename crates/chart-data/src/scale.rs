// File: crates/chart-data/src/scale.rs
// Summary: Scale boundary consumed by series node-data: domain value <-> pixel conversion.

/// Coordinate conversion supplied by an axis.
pub trait Scale {
    /// Domain value to pixel.
    fn convert(&self, value: f64) -> f64;
    /// Pixel to domain value.
    fn invert(&self, px: f64) -> f64;
}

/// Linear map from `domain` onto `range`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        let mut s = Self { domain, range };
        if (s.domain[1] - s.domain[0]).abs() < 1e-12 {
            s.domain[1] = s.domain[0] + 1.0;
        }
        s
    }

    #[inline]
    fn span(&self) -> f64 {
        self.domain[1] - self.domain[0]
    }
}

impl Scale for LinearScale {
    #[inline]
    fn convert(&self, value: f64) -> f64 {
        let t = (value - self.domain[0]) / self.span();
        self.range[0] + t * (self.range[1] - self.range[0])
    }

    #[inline]
    fn invert(&self, px: f64) -> f64 {
        let r = self.range[1] - self.range[0];
        if r == 0.0 {
            return self.domain[0];
        }
        self.domain[0] + (px - self.range[0]) / r * self.span()
    }
}
