use crate::mesh::{Mesh, ReactionProbs};
use crate::prtls::PhaseSpace;
use crate::rng::RandomStream;
use crate::Float;
use itertools::izip;
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Scatter,
    Capture,
    Fission,
}

/// Slot indices of the particles that scattered, were captured or fissioned
/// at their collision site, each list in increasing slot order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventLists {
    pub scatter: Vec<usize>,
    pub capture: Vec<usize>,
    pub fission: Vec<usize>,
}

impl EventLists {
    pub fn total(&self) -> usize {
        self.scatter.len() + self.capture.len() + self.fission.len()
    }
}

/// Picks the reaction for uniform `u` with thresholds in the order
/// scatter, capture, fission. A draw that lands past the cumulative sum
/// because of round-off goes to the last reaction that can happen.
#[inline(always)]
pub fn classify(p: &ReactionProbs, u: Float) -> Event {
    let scatter = p.scatter;
    let capture = scatter + p.capture;
    let fission = capture + p.fission;
    if u < scatter {
        Event::Scatter
    } else if u < capture {
        Event::Capture
    } else if u < fission || p.fission > 0.0 {
        Event::Fission
    } else if p.capture > 0.0 {
        Event::Capture
    } else {
        Event::Scatter
    }
}

pub fn sample_event(store: &mut PhaseSpace, mesh: &Mesh, stream: &mut RandomStream) -> EventLists {
    let n = store.logical_count();
    let mut xi = vec![0.0; n];
    for (r, a) in izip!(xi.iter_mut(), &store.alive[..n]) {
        if *a {
            *r = stream.uniform();
        }
    }
    sample_from_draws(store, mesh, &xi)
}

/// Classifies every live particle in the prefix using the uniform stored at
/// its own slot in `xi`. Captured and fissioned particles are flagged dead
/// here; compaction removes them later.
pub fn sample_from_draws(store: &mut PhaseSpace, mesh: &Mesh, xi: &[Float]) -> EventLists {
    let n = store.logical_count();
    if !cfg!(feature = "unchecked") {
        assert_eq!(xi.len(), n);
    }

    let events: Vec<Option<Event>> = (&store.cell[..n], &store.alive[..n], xi)
        .into_par_iter()
        .map(|(c, a, u)| {
            if *a {
                Some(classify(&mesh.reactions[*c], *u))
            } else {
                None
            }
        })
        .collect();

    let mut lists = EventLists::default();
    for (i, (event, alive)) in events.iter().zip(store.alive[..n].iter_mut()).enumerate() {
        match event {
            Some(Event::Scatter) => lists.scatter.push(i),
            Some(Event::Capture) => {
                *alive = false;
                lists.capture.push(i);
            }
            Some(Event::Fission) => {
                *alive = false;
                lists.fission.push(i);
            }
            None => {}
        }
    }
    lists
}
