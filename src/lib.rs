use serde::Deserialize;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub mod error;
pub mod generations;
pub mod kernels;
pub mod mesh;
pub mod prtls;
pub mod rng;
pub mod save;
pub mod tally;

pub use error::TransportError;
pub use generations::{GenerationStats, Generations, Outcome, RunSummary};
pub use kernels::{CpuKernels, KernelSet};
pub use mesh::{CrossSections, Mesh};
pub use prtls::{Neutron, PhaseSpace};
pub use rng::RandomStream;
pub use tally::{FluxResult, Tallies};

// We use a type alias for f64/Float to easily support
// double and single precision.
#[cfg(feature = "dprec")]
pub type Float = f64;

#[cfg(not(feature = "dprec"))]
pub type Float = f32;

pub const PI: Float = std::f64::consts::PI as Float;

/// Extra distance added to a flight cut at a cell face so the particle ends
/// up strictly inside the neighbor.
#[cfg(feature = "dprec")]
pub const KICKER: Float = 1e-10;

#[cfg(not(feature = "dprec"))]
pub const KICKER: Float = 1e-5;

pub const PRTL_CHUNK_SIZE: usize = 256;

/// Core inputs of a run, after the config has been resolved onto the mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct SimParams {
    pub n_mesh: usize,
    /// Secondaries per fission.
    pub nu: usize,
    /// Source particles, also the normalization of every tally.
    pub num: usize,
    pub dx: Float,
    pub part_speed: Float,
    pub iso: bool,
    pub seed: u64,
}

impl SimParams {
    pub fn validate(&self) -> error::Result<()> {
        let bad = |msg: String| Err(TransportError::InvalidConfig(msg));
        if self.n_mesh == 0 {
            return bad("n_mesh must be positive".to_string());
        }
        // the sample variance needs at least two histories
        if self.num < 2 {
            return bad(format!("need at least 2 source particles, got {}", self.num));
        }
        if !(self.dx.is_finite() && self.dx > 0.0) {
            return bad(format!("dx must be positive, got {}", self.dx));
        }
        if !(self.part_speed.is_finite() && self.part_speed > 0.0) {
            return bad(format!(
                "particle speed must be positive, got {}",
                self.part_speed
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub params: Params,
    pub geometry: Geometry,
    pub regions: Vec<Region>,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub output: Output,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Params {
    pub n_mesh: usize,
    pub nu: usize,
    pub num: usize,
    pub part_speed: Float,
    #[serde(default = "default_iso")]
    pub iso: bool,
    #[serde(default)]
    pub seed: u64,
    /// Phase space rows per source particle.
    #[serde(default = "default_capacity_factor")]
    pub capacity_factor: usize,
}

fn default_iso() -> bool {
    true
}

fn default_capacity_factor() -> usize {
    5
}

/// Material interfaces, left to right. The first and last entries are the
/// slab faces.
#[derive(Deserialize, Clone, Debug)]
pub struct Geometry {
    pub surface_distances: Vec<Float>,
}

/// One homogeneous material between two neighboring surfaces. `total`
/// defaults to the sum of the three reactions.
#[derive(Deserialize, Clone, Debug)]
pub struct Region {
    pub capture: Float,
    pub scatter: Float,
    pub fission: Float,
    pub total: Option<Float>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Source {
    /// Per-cell source weights. Overrides the fission-derived distribution.
    pub weights: Option<Vec<Float>>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Output {
    #[serde(default)]
    pub write_output: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    "output".to_string()
}

impl Default for Output {
    fn default() -> Output {
        Output {
            write_output: false,
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Config> {
        Config::from_file("config.toml")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not open the config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Could not parse config file {}", path.display()))
    }

    fn slab(&self) -> error::Result<(Float, Float)> {
        let s = &self.geometry.surface_distances;
        if s.len() < 2 {
            return Err(TransportError::Geometry(format!(
                "need at least two surfaces, got {}",
                s.len()
            )));
        }
        Ok((s[0], s[s.len() - 1]))
    }

    pub fn sim_params(&self) -> error::Result<SimParams> {
        let (left, right) = self.slab()?;
        let p = &self.params;
        if p.n_mesh == 0 {
            return Err(TransportError::InvalidConfig(
                "n_mesh must be positive".to_string(),
            ));
        }
        let params = SimParams {
            n_mesh: p.n_mesh,
            nu: p.nu,
            num: p.num,
            dx: (right - left) / p.n_mesh as Float,
            part_speed: p.part_speed,
            iso: p.iso,
            seed: p.seed,
        };
        params.validate()?;
        self.capacity()?;
        Ok(params)
    }

    /// Resolves the region materials onto the mesh. Every cell takes the
    /// material of the region that contains its center.
    pub fn cross_sections(&self) -> error::Result<CrossSections> {
        let params = self.sim_params()?;
        let surfaces = &self.geometry.surface_distances;
        if self.regions.len() + 1 != surfaces.len() {
            return Err(TransportError::InvalidConfig(format!(
                "{} surfaces bound {} regions, but {} regions were given",
                surfaces.len(),
                surfaces.len() - 1,
                self.regions.len()
            )));
        }

        let n = params.n_mesh;
        let mut xs = CrossSections {
            capture: Vec::with_capacity(n),
            scatter: Vec::with_capacity(n),
            fission: Vec::with_capacity(n),
            total: Vec::with_capacity(n),
        };
        for cell in 0..n {
            let center = surfaces[0] + (cell as Float + 0.5) * params.dx;
            let region = surfaces[1..surfaces.len() - 1]
                .partition_point(|&s| s <= center)
                .min(self.regions.len() - 1);
            let r = &self.regions[region];
            xs.capture.push(r.capture);
            xs.scatter.push(r.scatter);
            xs.fission.push(r.fission);
            xs.total
                .push(r.total.unwrap_or(r.capture + r.scatter + r.fission));
        }
        Ok(xs)
    }

    pub fn mesh(&self) -> error::Result<Mesh> {
        let params = self.sim_params()?;
        let xs = self.cross_sections()?;
        let mesh = Mesh::new(
            params.n_mesh,
            params.dx,
            &self.geometry.surface_distances,
            &xs,
        )?;
        match &self.source.weights {
            Some(w) => mesh.with_source_weights(w),
            None => Ok(mesh),
        }
    }

    /// Rows to allocate for the phase space.
    pub fn capacity(&self) -> error::Result<usize> {
        self.params
            .capacity_factor
            .checked_mul(self.params.num)
            .ok_or_else(|| {
                TransportError::InvalidConfig(format!(
                    "capacity_factor {} times {} particles overflows",
                    self.params.capacity_factor, self.params.num
                ))
            })
    }
}

pub fn run(cfg: &Config) -> Result<Outcome> {
    let params = cfg.sim_params().context("Invalid simulation parameters")?;
    let mesh = cfg.mesh().context("Could not build the mesh")?;
    let centers = mesh.cell_centers();

    let capacity = cfg.capacity().context("Invalid simulation parameters")?;

    let sim = Generations::new(CpuKernels, params, mesh, capacity)
        .context("Could not set up the initial population")?;
    let outcome = sim.run().context("Transport failed")?;

    if cfg.output.write_output {
        save::save_output(&cfg.output.output_dir, &centers, &outcome.flux)?;
    }
    Ok(outcome)
}

#[cfg(all(test, feature = "dprec"))]
pub const E_TOL: Float = 1e-9;

#[cfg(all(test, not(feature = "dprec")))]
pub const E_TOL: Float = 1e-4;

/// Four cells on [0, 1] with very different optical thickness, half capture
/// and half scatter, no fission.
#[cfg(test)]
pub fn build_test_mesh() -> Mesh {
    let total = vec![0.1, 1.0, 0.1, 100.0];
    let half: Vec<Float> = total.iter().map(|t| 0.5 * t).collect();
    let xs = CrossSections {
        capture: half.clone(),
        scatter: half,
        fission: vec![0.0; 4],
        total,
    };
    match Mesh::new(4, 0.25, &[0.0, 1.0], &xs) {
        Ok(mesh) => mesh,
        Err(e) => panic!("test mesh is invalid: {}", e),
    }
}

#[cfg(test)]
pub fn build_test_params() -> SimParams {
    SimParams {
        n_mesh: 4,
        nu: 2,
        num: 200,
        dx: 0.25,
        part_speed: 1.0,
        iso: true,
        seed: 12345,
    }
}
