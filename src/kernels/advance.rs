use crate::mesh::Mesh;
use crate::prtls::PhaseSpace;
use crate::rng::RandomStream;
use crate::tally::Tallies;
use crate::{Float, KICKER, PRTL_CHUNK_SIZE};
use itertools::izip;
use rayon::prelude::*;

/// Distance moved by one particle in one sweep, charged to the cell it
/// started the move in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub cell: usize,
    pub dist: Float,
}

/// Bookkeeping from one call to `advance`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Flight {
    /// Sweeps over the population until nothing was left in transport.
    pub iterations: usize,
    /// Accepted moves, full or partial. Equal to the uniforms consumed.
    pub steps: usize,
}

/// One free flight from `x` in `cell`.
///
/// Samples a distance against the cell's total cross section. A flight that
/// would leave the cell is cut at the face and nudged across it; the
/// particle then continues in the neighbor with a fresh sample. Returns
/// (distance moved, cell after the move, still in transport). Leaving the
/// outermost cell keeps the cell index in range; the position alone tells
/// the particle has left the slab.
#[inline(always)]
pub fn fly(mesh: &Mesh, x: Float, ux: Float, cell: usize, xi: Float) -> (Float, usize, bool) {
    let dist = -xi.ln() / mesh.total_xsec[cell];
    let x_loc = x + ux * dist;
    let lb = mesh.cell_left(cell);
    let rb = lb + mesh.dx;
    if x_loc < lb {
        (((lb - x) / ux).max(0.0) + KICKER, cell.saturating_sub(1), true)
    } else if x_loc > rb {
        (
            ((rb - x) / ux).max(0.0) + KICKER,
            (cell + 1).min(mesh.n_mesh - 1),
            true,
        )
    } else {
        (dist, cell, false)
    }
}

/// Drives every live particle to a collision site or out of the slab and
/// accumulates the track-length tallies on the way.
///
/// Each sweep first retires particles that are already outside
/// `[left, right)`, then draws one uniform for each particle still in
/// transport (in slot order) and moves them all. Tallies are reduced
/// serially in slot order after each sweep, so the sums do not depend on
/// how rayon split the work.
pub fn advance(
    store: &mut PhaseSpace,
    mesh: &Mesh,
    tallies: &mut Tallies,
    stream: &mut RandomStream,
) -> Flight {
    let n = store.logical_count();
    let mut moving: Vec<bool> = store.alive[..n].to_vec();
    let mut xi: Vec<Float> = vec![0.0; n];
    let mut steps: Vec<Option<Step>> = vec![None; n];
    let mut flight = Flight::default();

    loop {
        for (m, x) in izip!(moving.iter_mut(), &store.pos_x[..n]) {
            if *m && !mesh.contains(*x) {
                *m = false;
            }
        }
        let active = moving.iter().filter(|&&m| m).count();
        if active == 0 {
            break;
        }
        for (r, m) in izip!(xi.iter_mut(), &moving) {
            if *m {
                *r = stream.uniform();
            }
        }

        sweep(store, mesh, n, &mut moving, &xi, &mut steps);

        for step in steps.iter().flatten() {
            tallies.score(step.cell, step.dist);
        }
        flight.steps += active;
        flight.iterations += 1;
        log::trace!(
            "advance sweep {}: {} particles moved",
            flight.iterations,
            active
        );
    }
    flight
}

fn sweep(
    store: &mut PhaseSpace,
    mesh: &Mesh,
    n: usize,
    moving: &mut [bool],
    xi: &[Float],
    steps: &mut [Option<Step>],
) {
    (
        &mut store.pos_x[..n],
        &mut store.pos_y[..n],
        &mut store.pos_z[..n],
        &store.dir_x[..n],
        &store.dir_y[..n],
        &store.dir_z[..n],
        &store.speed[..n],
        &mut store.time[..n],
        &mut store.cell[..n],
        moving,
        xi,
        steps,
    )
        .into_par_iter()
        .chunks(PRTL_CHUNK_SIZE)
        .for_each(|o| {
            o.into_iter()
                .for_each(|(x, y, z, ux, uy, uz, v, t, c, m, r, step)| {
                    if !*m {
                        *step = None;
                        return;
                    }
                    if !cfg!(feature = "unchecked") {
                        assert!(*c < mesh.n_mesh);
                    }
                    let (dist, next, still_moving) = fly(mesh, *x, *ux, *c, *r);
                    *x += ux * dist;
                    *y += uy * dist;
                    *z += uz * dist;
                    *t += dist / v;
                    *step = Some(Step { cell: *c, dist });
                    *c = next;
                    *m = still_moving;
                })
        });
}
