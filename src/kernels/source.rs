use super::isotropic;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::prtls::PhaseSpace;
use crate::rng::RandomStream;
use crate::{Float, PRTL_CHUNK_SIZE};
use rayon::prelude::*;
use std::ops::Range;

/// Uniforms consumed per source particle: cell, position in cell and either
/// two angles (isotropic) or one sign (beam along x).
pub fn draws_per_particle(iso: bool) -> usize {
    if iso {
        4
    } else {
        3
    }
}

/// Inverse CDF lookup. Returns the first cell whose cumulative weight
/// exceeds `u`, so cells with zero weight are never picked.
#[inline(always)]
pub fn sample_cell(cdf: &[Float], u: Float, fallback: usize) -> usize {
    let cell = cdf.partition_point(|&c| c <= u);
    if cell < cdf.len() {
        cell
    } else {
        fallback
    }
}

pub fn source_particles(
    store: &mut PhaseSpace,
    mesh: &Mesh,
    num: usize,
    iso: bool,
    speed: Float,
    stream: &mut RandomStream,
) -> Result<()> {
    let range = store.grow(num)?;
    let draws = stream.draws(range.len() * draws_per_particle(iso));
    fill_source(store, mesh, range, iso, speed, &draws);
    Ok(())
}

/// Samples `num` particles from the mesh source distribution using the
/// given uniforms, `draws_per_particle(iso)` of them per particle in slot
/// order.
pub fn source_from_draws(
    store: &mut PhaseSpace,
    mesh: &Mesh,
    num: usize,
    iso: bool,
    speed: Float,
    draws: &[Float],
) -> Result<()> {
    let range = store.grow(num)?;
    if !cfg!(feature = "unchecked") {
        assert_eq!(draws.len(), range.len() * draws_per_particle(iso));
    }
    fill_source(store, mesh, range, iso, speed, draws);
    Ok(())
}

fn fill_source(
    store: &mut PhaseSpace,
    mesh: &Mesh,
    range: Range<usize>,
    iso: bool,
    speed: Float,
    draws: &[Float],
) {
    let per = draws_per_particle(iso);
    let mut cdf = Vec::with_capacity(mesh.n_mesh);
    let mut acc = 0.0;
    for p in &mesh.source_pdf {
        acc += p;
        cdf.push(acc);
    }
    // Round-off can leave the cdf a hair under one. Anything drawn past it
    // goes to the last cell that actually has source weight.
    let fallback = mesh
        .source_pdf
        .iter()
        .rposition(|&p| p > 0.0)
        .unwrap_or(mesh.n_mesh - 1);

    (
        &mut store.pos_x[range.clone()],
        &mut store.pos_y[range.clone()],
        &mut store.pos_z[range.clone()],
        &mut store.dir_x[range.clone()],
        &mut store.dir_y[range.clone()],
        &mut store.dir_z[range.clone()],
        &mut store.speed[range.clone()],
        &mut store.time[range.clone()],
        &mut store.cell[range.clone()],
        &mut store.alive[range],
        draws.par_chunks(per),
    )
        .into_par_iter()
        .chunks(PRTL_CHUNK_SIZE)
        .for_each(|o| {
            o.into_iter()
                .for_each(|(x, y, z, ux, uy, uz, v, t, c, a, xi)| {
                    let cell = sample_cell(&cdf, xi[0], fallback);
                    *c = cell;
                    *x = mesh.cell_left(cell) + mesh.dx * xi[1];
                    *y = 0.0;
                    *z = 0.0;
                    let dir = if iso {
                        isotropic(xi[2], xi[3])
                    } else if xi[2] < 0.5 {
                        [-1.0, 0.0, 0.0]
                    } else {
                        [1.0, 0.0, 0.0]
                    };
                    *ux = dir[0];
                    *uy = dir[1];
                    *uz = dir[2];
                    *v = speed;
                    *t = 0.0;
                    *a = true;
                })
        });
}
