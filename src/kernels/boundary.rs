use crate::mesh::Mesh;
use crate::prtls::PhaseSpace;
use rayon::prelude::*;

/// Kills every live particle sitting on or beyond a slab face and counts
/// the leaks per side. Interior particles are never touched.
pub fn still_in(store: &mut PhaseSpace, mesh: &Mesh) -> (usize, usize) {
    let n = store.logical_count();
    let left = mesh.left;
    let right = mesh.right;
    (&store.pos_x[..n], &mut store.alive[..n])
        .into_par_iter()
        .map(|(x, a)| {
            if !*a {
                (0, 0)
            } else if *x <= left {
                *a = false;
                (1, 0)
            } else if *x >= right {
                *a = false;
                (0, 1)
            } else {
                (0, 0)
            }
        })
        .reduce(|| (0, 0), |l, r| (l.0 + r.0, l.1 + r.1))
}
