//! Seeded 2D simplex noise.
//!
//! The gradient permutation is a Fisher-Yates shuffle of `0..256` driven by a
//! ChaCha8 stream seeded from the world seed, duplicated to 512 entries so
//! corner lookups never wrap. Samples are a pure function of
//! `(seed, x, y)`.

use noise::NoiseFn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Skew factor for 2D: `0.5 * (sqrt(3) - 1)`.
const F2: f64 = 0.366_025_403_784_438_6;
/// Unskew factor for 2D: `(3 - sqrt(3)) / 6`.
const G2: f64 = 0.211_324_865_405_187_1;
/// Scales the corner sum into roughly `[-1, 1]`.
const NORMALIZATION: f64 = 70.0;

/// Edge-midpoint gradients of a cube; only the first two components are used.
const GRAD3: [[f64; 2]; 12] = [
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [0.0, 1.0],
    [0.0, -1.0],
];

/// A seeded 2D simplex noise field.
#[derive(Clone)]
pub struct NoiseField {
    seed: u64,
    perm: [u8; 512],
}

impl NoiseField {
    /// Build the permutation table for `seed`.
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut base: [u8; 256] = std::array::from_fn(|i| i as u8);
        for i in (1..256).rev() {
            let j = rng.random_range(0..=i);
            base.swap(i, j);
        }

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = base[i & 255];
        }
        Self { seed, perm }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    fn perm(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Sample the field at `(x, y)`. The result lies in `[-1, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let s = (x + y) * F2;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let t = (i + j) * G2;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        // Upper or lower triangle of the skewed cell.
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + G2;
        let y1 = y0 - j1 as f64 + G2;
        let x2 = x0 - 1.0 + 2.0 * G2;
        let y2 = y0 - 1.0 + 2.0 * G2;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let gi0 = self.perm(ii + self.perm(jj)) % 12;
        let gi1 = self.perm(ii + i1 + self.perm(jj + j1)) % 12;
        let gi2 = self.perm(ii + 1 + self.perm(jj + 1)) % 12;

        let total = corner(gi0, x0, y0) + corner(gi1, x1, y1) + corner(gi2, x2, y2);
        (NORMALIZATION * total).clamp(-1.0, 1.0)
    }
}

/// Contribution of one simplex corner: `(0.5 - d²)⁴ · (g · offset)`.
#[inline]
fn corner(gi: usize, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        0.0
    } else {
        let t2 = t * t;
        let g = GRAD3[gi];
        t2 * t2 * (g[0] * x + g[1] * y)
    }
}

impl NoiseFn<f64, 2> for NoiseField {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// One-shot sample. Prefer a cached [`NoiseField`] when sampling repeatedly.
pub fn sample(seed: u64, x: f64, y: f64) -> f64 {
    NoiseField::new(seed).sample(x, y)
}
