use super::isotropic;
use crate::error::{Result, TransportError};
use crate::prtls::{Neutron, PhaseSpace};
use crate::rng::RandomStream;
use crate::Float;
use rayon::prelude::*;
use std::ops::Range;

pub fn fission_add(
    store: &mut PhaseSpace,
    parents: &[usize],
    nu: usize,
    speed: Float,
    stream: &mut RandomStream,
) -> Result<usize> {
    let range = claim(store, parents.len(), nu)?;
    let xi = stream.draws(2 * range.len());
    write_secondaries(store, parents, nu, speed, range, &xi);
    Ok(parents.len() * nu)
}

/// Appends `nu` secondaries for every parent directly after the valid
/// prefix. Secondary `s` belongs to parent `parents[s / nu]`: it starts at
/// the parent's position, time and cell with an isotropic direction built
/// from uniforms `2s` and `2s + 1`. Parents are read, never modified, so
/// the caller may pass slots that were already flagged dead.
///
/// Capacity is claimed before anything is allocated or written; on error
/// the store is left as it was.
pub fn fission_from_draws(
    store: &mut PhaseSpace,
    parents: &[usize],
    nu: usize,
    speed: Float,
    xi: &[Float],
) -> Result<usize> {
    let range = claim(store, parents.len(), nu)?;
    if !cfg!(feature = "unchecked") {
        assert_eq!(xi.len(), 2 * range.len());
    }
    write_secondaries(store, parents, nu, speed, range, xi);
    Ok(parents.len() * nu)
}

fn claim(store: &mut PhaseSpace, n_parents: usize, nu: usize) -> Result<Range<usize>> {
    match n_parents.checked_mul(nu) {
        Some(born) => store.grow(born),
        None => Err(TransportError::CapacityExceeded {
            requested: usize::MAX,
            capacity: store.capacity(),
        }),
    }
}

fn write_secondaries(
    store: &mut PhaseSpace,
    parents: &[usize],
    nu: usize,
    speed: Float,
    range: Range<usize>,
    xi: &[Float],
) {
    if range.is_empty() {
        return;
    }
    let rows: Vec<Neutron> = {
        let parent_store: &PhaseSpace = store;
        xi.par_chunks(2)
            .enumerate()
            .map(|(s, u)| {
                let parent = parent_store.read_row(parents[s / nu]);
                Neutron {
                    pos: parent.pos,
                    dir: isotropic(u[0], u[1]),
                    speed,
                    time: parent.time,
                    cell: parent.cell,
                    alive: true,
                }
            })
            .collect()
    };
    for (i, row) in range.zip(rows.iter()) {
        store.write_row(i, row);
    }
}
