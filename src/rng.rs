use crate::Float;
use rand::prelude::*;
use rand_distr::Open01;

/// Seeded stream of uniform numbers on the open interval (0, 1).
///
/// Kernels pull exactly the number of draws their branching requires and
/// hand them out to particles in slot order, so a run is reproducible for a
/// given seed no matter how many rayon threads execute the kernels.
pub struct RandomStream {
    rng: StdRng,
    drawn: u64,
}

impl RandomStream {
    pub fn new(seed: u64) -> RandomStream {
        RandomStream {
            rng: StdRng::seed_from_u64(seed),
            drawn: 0,
        }
    }

    #[inline(always)]
    pub fn uniform(&mut self) -> Float {
        self.drawn += 1;
        self.rng.sample(Open01)
    }

    pub fn fill(&mut self, buf: &mut [Float]) {
        for v in buf.iter_mut() {
            *v = self.rng.sample(Open01);
        }
        self.drawn += buf.len() as u64;
    }

    pub fn draws(&mut self, n: usize) -> Vec<Float> {
        let mut out = vec![0.0; n];
        self.fill(&mut out);
        out
    }

    /// Total number of uniforms handed out so far.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}
