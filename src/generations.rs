use crate::error::{Result, TransportError};
use crate::kernels::KernelSet;
use crate::mesh::Mesh;
use crate::prtls::PhaseSpace;
use crate::rng::RandomStream;
use crate::tally::{FluxResult, Tallies};
use crate::{Float, SimParams};

/// What happened to the population during one generation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenerationStats {
    pub generation: usize,
    pub alive_start: usize,
    pub flight_iterations: usize,
    pub flight_steps: usize,
    pub leaked_left: usize,
    pub leaked_right: usize,
    pub scattered: usize,
    pub captured: usize,
    pub fissioned: usize,
    pub born: usize,
    pub kept: usize,
}

impl GenerationStats {
    /// Particles removed from the population this generation.
    pub fn departed(&self) -> usize {
        self.leaked_left + self.leaked_right + self.captured + self.fissioned
    }

    /// Secondaries born per particle removed, a crude estimate of the
    /// multiplication factor.
    pub fn multiplication(&self) -> Option<Float> {
        match self.departed() {
            0 => None,
            d => Some(self.born as Float / d as Float),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub generations: Vec<GenerationStats>,
    pub source_particles: usize,
    /// Uniforms consumed over the whole run, source included.
    pub draws: u64,
}

impl RunSummary {
    fn sum<F: Fn(&GenerationStats) -> usize>(&self, f: F) -> usize {
        self.generations.iter().map(f).sum()
    }

    pub fn leaked_left(&self) -> usize {
        self.sum(|g| g.leaked_left)
    }

    pub fn leaked_right(&self) -> usize {
        self.sum(|g| g.leaked_right)
    }

    pub fn captured(&self) -> usize {
        self.sum(|g| g.captured)
    }

    pub fn fissioned(&self) -> usize {
        self.sum(|g| g.fissioned)
    }

    pub fn scattered(&self) -> usize {
        self.sum(|g| g.scattered)
    }

    pub fn born(&self) -> usize {
        self.sum(|g| g.born)
    }

    pub fn multiplication(&self) -> Option<Float> {
        let departed = self.sum(|g| g.departed());
        if departed == 0 {
            None
        } else {
            Some(self.born() as Float / departed as Float)
        }
    }
}

/// Final result of a run.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub flux: FluxResult,
    pub tallies: Tallies,
    pub summary: RunSummary,
}

/// Generation loop over a fixed phase space.
///
/// Each `step` runs advance, boundary test, event sampling, scatter,
/// fission and compaction in that order, every phase finishing before the
/// next starts.
pub struct Generations<K: KernelSet> {
    kernels: K,
    params: SimParams,
    mesh: Mesh,
    store: PhaseSpace,
    tallies: Tallies,
    stream: RandomStream,
    summary: RunSummary,
}

impl<K: KernelSet> Generations<K> {
    /// Validates the inputs, allocates `capacity` rows and samples the
    /// source population.
    pub fn new(kernels: K, params: SimParams, mesh: Mesh, capacity: usize) -> Result<Generations<K>> {
        params.validate()?;
        if params.n_mesh != mesh.n_mesh {
            return Err(TransportError::InvalidConfig(format!(
                "params have {} cells, mesh has {}",
                params.n_mesh, mesh.n_mesh
            )));
        }
        if (params.dx - mesh.dx).abs() > 1e-6 * mesh.dx {
            return Err(TransportError::InvalidConfig(format!(
                "params have dx = {}, mesh has dx = {}",
                params.dx, mesh.dx
            )));
        }

        let mut store = PhaseSpace::allocate(capacity);
        let mut stream = RandomStream::new(params.seed);
        kernels.source(&mut store, &mesh, &params, &mut stream)?;
        log::info!(
            "sourced {} particles into {} cells, capacity {}, seed {}",
            params.num,
            mesh.n_mesh,
            capacity,
            params.seed
        );

        let tallies = Tallies::new(mesh.n_mesh);
        let summary = RunSummary {
            source_particles: params.num,
            ..RunSummary::default()
        };
        Ok(Generations {
            kernels,
            params,
            mesh,
            store,
            tallies,
            stream,
            summary,
        })
    }

    pub fn is_done(&self) -> bool {
        self.store.is_empty()
    }

    pub fn store(&self) -> &PhaseSpace {
        &self.store
    }

    pub fn tallies(&self) -> &Tallies {
        &self.tallies
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn step(&mut self) -> Result<GenerationStats> {
        let generation = self.summary.generations.len();
        let alive_start = self.store.alive_count();

        let flight =
            self.kernels
                .advance(&mut self.store, &self.mesh, &mut self.tallies, &mut self.stream);
        let (leaked_left, leaked_right) = self.kernels.still_in(&mut self.store, &self.mesh);
        self.tallies.leak_left += leaked_left;
        self.tallies.leak_right += leaked_right;

        let events = self
            .kernels
            .sample_event(&mut self.store, &self.mesh, &mut self.stream);
        self.kernels
            .scatter(&mut self.store, &events.scatter, &mut self.stream);
        let born = self.kernels.fission_add(
            &mut self.store,
            &events.fission,
            self.params.nu,
            self.params.part_speed,
            &mut self.stream,
        )?;
        let kept = self.kernels.compact(&mut self.store);

        let stats = GenerationStats {
            generation,
            alive_start,
            flight_iterations: flight.iterations,
            flight_steps: flight.steps,
            leaked_left,
            leaked_right,
            scattered: events.scatter.len(),
            captured: events.capture.len(),
            fissioned: events.fission.len(),
            born,
            kept,
        };
        if !cfg!(feature = "unchecked") {
            assert_eq!(alive_start, stats.departed() + stats.scattered);
            assert_eq!(kept, stats.scattered + born);
        }

        log::debug!(
            "generation {}: {} alive, {} sweeps, leaked {}/{}, scattered {}, captured {}, fissioned {}, born {}, kept {}",
            generation,
            alive_start,
            flight.iterations,
            leaked_left,
            leaked_right,
            stats.scattered,
            stats.captured,
            stats.fissioned,
            born,
            kept
        );
        if let Some(k) = stats.multiplication() {
            log::trace!("generation {}: born/departed = {:.4}", generation, k);
        }

        self.summary.generations.push(stats);
        self.summary.draws = self.stream.drawn();
        Ok(stats)
    }

    /// Steps until no particle is left and normalizes the tallies by the
    /// source population.
    pub fn run(mut self) -> Result<Outcome> {
        while !self.is_done() {
            self.step()?;
        }
        self.summary.draws = self.stream.drawn();

        let flux = self.tallies.flux(self.params.num, self.mesh.dx);
        log::info!(
            "finished after {} generations: leaked {}/{}, captured {}, fissioned {}, born {}",
            self.summary.generations.len(),
            self.summary.leaked_left(),
            self.summary.leaked_right(),
            self.summary.captured(),
            self.summary.fissioned(),
            self.summary.born()
        );
        if let Some(k) = self.summary.multiplication() {
            log::info!("born/departed over the run = {:.4}", k);
        }

        Ok(Outcome {
            flux,
            tallies: self.tallies,
            summary: self.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::CpuKernels;
    use crate::mesh::CrossSections;
    use crate::{build_test_mesh, build_test_params};

    fn homogeneous(n: usize, c: Float, s: Float, f: Float, t: Float) -> Mesh {
        let xs = CrossSections::homogeneous(n, c, s, f, t);
        Mesh::new(n, 1.0 / n as Float, &[0.0, 1.0], &xs).unwrap()
    }

    #[test]
    fn pure_absorber_ends_after_one_generation() {
        let mesh = homogeneous(4, 1.0, 0.0, 0.0, 1.0);
        let params = build_test_params();
        let mut sim = Generations::new(CpuKernels, params, mesh, 1000).unwrap();
        assert_eq!(sim.store().logical_count(), 200);

        let stats = sim.step().unwrap();
        assert!(sim.is_done());
        assert_eq!(stats.scattered, 0);
        assert_eq!(stats.fissioned, 0);
        assert_eq!(stats.born, 0);
        assert_eq!(stats.kept, 0);
        assert_eq!(stats.captured + stats.leaked_left + stats.leaked_right, 200);
        assert!(sim.tallies().total_distance() > 0.0);
    }

    #[test]
    fn conservation_every_generation() {
        let mesh = build_test_mesh();
        let sim = Generations::new(CpuKernels, build_test_params(), mesh, 1000).unwrap();
        let out = sim.run().unwrap();

        let gens = &out.summary.generations;
        assert!(!gens.is_empty());
        for pair in gens.windows(2) {
            assert_eq!(pair[1].alive_start, pair[0].kept);
        }
        for g in gens {
            assert_eq!(g.alive_start, g.departed() + g.scattered);
        }
        assert_eq!(gens.last().unwrap().kept, 0);
        assert_eq!(
            out.tallies.leak_left + out.tallies.leak_right,
            out.summary.leaked_left() + out.summary.leaked_right()
        );
        // no fission in the test mesh, so every history ends in a capture or a leak
        assert_eq!(out.summary.born(), 0);
        assert_eq!(
            out.summary.captured() + out.summary.leaked_left() + out.summary.leaked_right(),
            200
        );
    }

    #[test]
    fn same_seed_same_answer() {
        let run = || {
            Generations::new(CpuKernels, build_test_params(), build_test_mesh(), 1000)
                .unwrap()
                .run()
                .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.tallies, b.tallies);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.flux, b.flux);
    }

    #[test]
    fn fission_chain_multiplies() {
        // half fission, nu = 2: every collision is on average break-even
        let mesh = homogeneous(4, 0.5, 0.0, 0.5, 1.0);
        let mut params = build_test_params();
        params.nu = 2;
        let out = Generations::new(CpuKernels, params, mesh, 2000)
            .unwrap()
            .run()
            .unwrap();
        assert!(out.summary.born() > 0);
        assert_eq!(out.summary.born(), 2 * out.summary.fissioned());
        assert!(out.summary.multiplication().is_some());
    }

    #[test]
    fn runaway_population_hits_capacity() {
        // thick pure fissioner with three secondaries per event
        let mesh = homogeneous(4, 0.0, 0.0, 100.0, 100.0);
        let mut params = build_test_params();
        params.nu = 3;
        let mut sim = Generations::new(CpuKernels, params, mesh, 400).unwrap();
        match sim.step() {
            Err(TransportError::CapacityExceeded { capacity, .. }) => assert_eq!(capacity, 400),
            other => panic!("expected capacity error, got {:?}", other),
        }
    }

    #[test]
    fn source_larger_than_capacity_is_rejected() {
        let r = Generations::new(CpuKernels, build_test_params(), build_test_mesh(), 100);
        assert!(matches!(r, Err(TransportError::CapacityExceeded { .. })));
    }

    #[test]
    fn params_must_match_mesh() {
        let mut params = build_test_params();
        params.n_mesh = 5;
        assert!(Generations::new(CpuKernels, params, build_test_mesh(), 1000).is_err());
        let mut params = build_test_params();
        params.dx = 0.3;
        assert!(Generations::new(CpuKernels, params, build_test_mesh(), 1000).is_err());
    }

    #[test]
    fn stats_ratios() {
        let g = GenerationStats {
            captured: 3,
            fissioned: 1,
            born: 2,
            ..GenerationStats::default()
        };
        assert_eq!(g.departed(), 4);
        assert_eq!(g.multiplication(), Some(0.5));
        assert_eq!(GenerationStats::default().multiplication(), None);
    }
}
