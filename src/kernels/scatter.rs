use super::isotropic;
use crate::prtls::PhaseSpace;
use crate::rng::RandomStream;
use crate::Float;
use rayon::prelude::*;

pub fn scatter(store: &mut PhaseSpace, indices: &[usize], stream: &mut RandomStream) {
    let xi = stream.draws(2 * indices.len());
    scatter_from_draws(store, indices, &xi)
}

/// Gives each listed particle a new isotropic direction from its pair of
/// uniforms. Position, time, speed and cell stay as they were.
pub fn scatter_from_draws(store: &mut PhaseSpace, indices: &[usize], xi: &[Float]) {
    if !cfg!(feature = "unchecked") {
        assert_eq!(xi.len(), 2 * indices.len());
    }
    let dirs: Vec<[Float; 3]> = xi.par_chunks(2).map(|u| isotropic(u[0], u[1])).collect();
    for (&i, dir) in indices.iter().zip(dirs) {
        if !cfg!(feature = "unchecked") {
            assert!(i < store.logical_count() && store.alive[i]);
        }
        store.dir_x[i] = dir[0];
        store.dir_y[i] = dir[1];
        store.dir_z[i] = dir[2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prtls::Neutron;
    use crate::E_TOL;

    fn store_of(n: usize) -> PhaseSpace {
        let mut store = PhaseSpace::allocate(n);
        for i in 0..n {
            store
                .push(&Neutron {
                    pos: [0.1 * i as Float, 0.0, 0.0],
                    dir: [0.0, 0.0, 1.0],
                    speed: 1.0,
                    time: 0.5,
                    cell: 0,
                    alive: true,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn controlled_directions() {
        let mut store = store_of(3);
        scatter_from_draws(&mut store, &[0, 1, 2], &[1.0, 1.0, 0.0, 0.0, 0.5, 0.5]);

        let d0 = store.read_row(0).dir;
        assert!((d0[0] - 1.0).abs() < E_TOL && d0[1].abs() < E_TOL && d0[2].abs() < E_TOL);
        assert_eq!(store.read_row(1).dir, [-1.0, 0.0, 0.0]);
        let d2 = store.read_row(2).dir;
        assert!(d2[0].abs() < E_TOL);
        assert!((d2[1] + 1.0).abs() < E_TOL);
        assert!(d2[2].abs() < E_TOL);
    }

    #[test]
    fn only_listed_particles_turn() {
        let mut store = store_of(4);
        let mut stream = RandomStream::new(11);
        scatter(&mut store, &[1, 3], &mut stream);
        assert_eq!(stream.drawn(), 4);
        assert_eq!(store.read_row(0).dir, [0.0, 0.0, 1.0]);
        assert_eq!(store.read_row(2).dir, [0.0, 0.0, 1.0]);
        assert!(store.max_direction_error() < E_TOL);
        for i in 0..4 {
            let n = store.read_row(i);
            assert_eq!(n.pos[0], 0.1 * i as Float);
            assert_eq!(n.time, 0.5);
        }
    }

    #[test]
    fn empty_list_draws_nothing() {
        let mut store = store_of(2);
        let mut stream = RandomStream::new(11);
        scatter(&mut store, &[], &mut stream);
        assert_eq!(stream.drawn(), 0);
    }

    #[test]
    #[cfg(not(feature = "unchecked"))]
    #[should_panic]
    fn short_draw_slice_is_rejected() {
        let mut store = store_of(2);
        scatter_from_draws(&mut store, &[0, 1], &[0.5, 0.5, 0.5]);
    }
}
