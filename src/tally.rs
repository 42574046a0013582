use crate::Float;
use itertools::izip;

/// Track-length tallies for the whole run. Never reset between generations.
#[derive(Clone, Debug, PartialEq)]
pub struct Tallies {
    pub distance: Vec<Float>,
    pub distance_sq: Vec<Float>,
    pub leak_left: usize,
    pub leak_right: usize,
}

/// Scalar flux per cell, normalized to its peak, and the standard deviation
/// of the track-length estimate, left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct FluxResult {
    pub scalar_flux: Vec<Float>,
    pub std_dev: Vec<Float>,
}

impl Tallies {
    pub fn new(n_mesh: usize) -> Tallies {
        Tallies {
            distance: vec![0.0; n_mesh],
            distance_sq: vec![0.0; n_mesh],
            leak_left: 0,
            leak_right: 0,
        }
    }

    #[inline(always)]
    pub fn score(&mut self, cell: usize, dist: Float) {
        self.distance[cell] += dist;
        self.distance_sq[cell] += dist * dist;
    }

    pub fn total_distance(&self) -> Float {
        self.distance.iter().sum()
    }

    /// Normalizes by the source population `init_particles`, not by whatever
    /// happened to be alive later in the run.
    pub fn flux(&self, init_particles: usize, dx: Float) -> FluxResult {
        let n = init_particles as Float;
        let mut scalar_flux = Vec::with_capacity(self.distance.len());
        let mut std_dev = Vec::with_capacity(self.distance.len());
        for (d, d2) in izip!(&self.distance, &self.distance_sq) {
            let mean = d / n;
            let mean_sq = d2 / n;
            // round-off can push a zero variance slightly negative
            let var = ((mean_sq - mean * mean) / (n - 1.0)).max(0.0);
            std_dev.push((var / n).sqrt());
            scalar_flux.push(mean / dx);
        }
        let peak = scalar_flux.iter().cloned().fold(0.0, Float::max);
        if peak > 0.0 {
            for phi in scalar_flux.iter_mut() {
                *phi /= peak;
            }
        }
        FluxResult {
            scalar_flux,
            std_dev,
        }
    }
}
