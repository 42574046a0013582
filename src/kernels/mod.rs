use crate::error::Result;
use crate::mesh::Mesh;
use crate::prtls::PhaseSpace;
use crate::rng::RandomStream;
use crate::tally::Tallies;
use crate::{Float, SimParams, PI};

pub mod advance;
pub mod boundary;
pub mod events;
pub mod fission;
pub mod scatter;
pub mod source;

pub use advance::Flight;
pub use events::{Event, EventLists};

/// Direction from two uniforms: cosine along x is `2u - 1`, azimuth `2 pi u'`.
#[inline(always)]
pub fn isotropic(u_mu: Float, u_azi: Float) -> [Float; 3] {
    let mu = 2.0 * u_mu - 1.0;
    let azi = 2.0 * PI * u_azi;
    let c = (1.0 - mu * mu).max(0.0).sqrt();
    [mu, azi.cos() * c, azi.sin() * c]
}

/// The operations one generation of event-based transport is built from.
///
/// Every method works on the valid prefix of the phase space and pulls
/// exactly the number of uniforms its branching needs from `stream`.
/// Implementations may run the per-particle work in any order or on any
/// number of threads as long as the results match the serial semantics.
pub trait KernelSet {
    /// Writes `params.num` fresh particles after the current prefix.
    fn source(
        &self,
        store: &mut PhaseSpace,
        mesh: &Mesh,
        params: &SimParams,
        stream: &mut RandomStream,
    ) -> Result<()>;

    /// Moves every live particle to a collision site or out of the slab.
    fn advance(
        &self,
        store: &mut PhaseSpace,
        mesh: &Mesh,
        tallies: &mut Tallies,
        stream: &mut RandomStream,
    ) -> Flight;

    /// Kills particles on or past a slab face. Returns (left, right) leaks.
    fn still_in(&self, store: &mut PhaseSpace, mesh: &Mesh) -> (usize, usize);

    fn sample_event(
        &self,
        store: &mut PhaseSpace,
        mesh: &Mesh,
        stream: &mut RandomStream,
    ) -> EventLists;

    fn scatter(&self, store: &mut PhaseSpace, scattered: &[usize], stream: &mut RandomStream);

    /// Appends `nu` secondaries per parent. Returns the number appended.
    fn fission_add(
        &self,
        store: &mut PhaseSpace,
        parents: &[usize],
        nu: usize,
        speed: Float,
        stream: &mut RandomStream,
    ) -> Result<usize>;

    fn compact(&self, store: &mut PhaseSpace) -> usize;
}

/// Shared-memory kernels on the rayon thread pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuKernels;

impl KernelSet for CpuKernels {
    fn source(
        &self,
        store: &mut PhaseSpace,
        mesh: &Mesh,
        params: &SimParams,
        stream: &mut RandomStream,
    ) -> Result<()> {
        source::source_particles(
            store,
            mesh,
            params.num,
            params.iso,
            params.part_speed,
            stream,
        )
    }

    fn advance(
        &self,
        store: &mut PhaseSpace,
        mesh: &Mesh,
        tallies: &mut Tallies,
        stream: &mut RandomStream,
    ) -> Flight {
        advance::advance(store, mesh, tallies, stream)
    }

    fn still_in(&self, store: &mut PhaseSpace, mesh: &Mesh) -> (usize, usize) {
        boundary::still_in(store, mesh)
    }

    fn sample_event(
        &self,
        store: &mut PhaseSpace,
        mesh: &Mesh,
        stream: &mut RandomStream,
    ) -> EventLists {
        events::sample_event(store, mesh, stream)
    }

    fn scatter(&self, store: &mut PhaseSpace, scattered: &[usize], stream: &mut RandomStream) {
        scatter::scatter(store, scattered, stream)
    }

    fn fission_add(
        &self,
        store: &mut PhaseSpace,
        parents: &[usize],
        nu: usize,
        speed: Float,
        stream: &mut RandomStream,
    ) -> Result<usize> {
        fission::fission_add(store, parents, nu, speed, stream)
    }

    fn compact(&self, store: &mut PhaseSpace) -> usize {
        store.compact()
    }
}
