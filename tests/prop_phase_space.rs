//! Property tests for the particle store and the pure kernel helpers.

use proptest::prelude::*;
use slab_mc::kernels::events::{classify, Event};
use slab_mc::kernels::isotropic;
use slab_mc::mesh::ReactionProbs;
use slab_mc::{Float, Neutron, PhaseSpace};

fn neutron(tag: usize, alive: bool) -> Neutron {
    Neutron {
        pos: [tag as Float, 0.0, 0.0],
        dir: [1.0, 0.0, 0.0],
        speed: 1.0,
        time: tag as Float,
        cell: tag,
        alive,
    }
}

proptest! {
    /// Compaction keeps exactly the live rows, in their original order, with
    /// every attribute of a row moved together.
    #[test]
    fn compaction_is_stable(flags in prop::collection::vec(any::<bool>(), 0..200)) {
        let mut store = PhaseSpace::allocate(flags.len());
        for (i, &a) in flags.iter().enumerate() {
            store.push(&neutron(i, a)).unwrap();
        }
        let kept = store.compact();

        let expected: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter(|(_, a)| **a)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(kept, expected.len());
        prop_assert_eq!(store.logical_count(), expected.len());
        for (slot, &tag) in expected.iter().enumerate() {
            prop_assert_eq!(store.read_row(slot), neutron(tag, true));
        }
    }

    /// Growing never hands out rows past capacity.
    #[test]
    fn grow_respects_capacity(cap in 0usize..64, claims in prop::collection::vec(0usize..20, 0..10)) {
        let mut store = PhaseSpace::allocate(cap);
        for extra in claims {
            let before = store.logical_count();
            match store.grow(extra) {
                Ok(range) => {
                    prop_assert_eq!(range.start, before);
                    prop_assert!(range.end <= cap);
                }
                Err(_) => {
                    prop_assert!(before + extra > cap);
                    prop_assert_eq!(store.logical_count(), before);
                }
            }
        }
    }

    /// Sampled directions are unit vectors.
    #[test]
    fn isotropic_directions_are_unit(a in 1e-12f64..1.0, b in 1e-12f64..1.0) {
        let d = isotropic(a as Float, b as Float);
        let norm = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        prop_assert!((norm - 1.0).abs() < 1e-6);
    }

    /// A reaction with zero probability is never picked.
    #[test]
    fn classify_never_picks_impossible_reactions(
        s in 0.0f64..1.0,
        c in 0.0f64..1.0,
        u in 1e-12f64..1.0,
        fissile in any::<bool>(),
    ) {
        let f = if fissile { 0.5 } else { 0.0 };
        let sum = s + c + f;
        prop_assume!(sum > 0.0);
        let p = ReactionProbs {
            scatter: (s / sum) as Float,
            capture: (c / sum) as Float,
            fission: (f / sum) as Float,
        };
        let probability = match classify(&p, u as Float) {
            Event::Scatter => p.scatter,
            Event::Capture => p.capture,
            Event::Fission => p.fission,
        };
        prop_assert!(probability > 0.0);
    }
}
