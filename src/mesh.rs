use crate::error::{Result, TransportError};
use crate::Float;

// Allowed relative slack when comparing floating sums coming out of an
// input deck (total vs. capture + scatter + fission, slab width vs. n * dx).
const REL_TOL: Float = 1e-6;

/// Macroscopic cross sections for every mesh cell, left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossSections {
    pub capture: Vec<Float>,
    pub scatter: Vec<Float>,
    pub fission: Vec<Float>,
    pub total: Vec<Float>,
}

impl CrossSections {
    /// Same material in every cell.
    pub fn homogeneous(
        n_mesh: usize,
        capture: Float,
        scatter: Float,
        fission: Float,
        total: Float,
    ) -> CrossSections {
        CrossSections {
            capture: vec![capture; n_mesh],
            scatter: vec![scatter; n_mesh],
            fission: vec![fission; n_mesh],
            total: vec![total; n_mesh],
        }
    }

    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }
}

/// Branching probabilities of a collision, renormalized over the three
/// reactions of a cell. Independent of the total cross section used to
/// sample flight distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactionProbs {
    pub scatter: Float,
    pub capture: Float,
    pub fission: Float,
}

impl ReactionProbs {
    fn from_xsec(capture: Float, scatter: Float, fission: Float) -> Option<ReactionProbs> {
        let sum = capture + scatter + fission;
        if sum > 0.0 {
            Some(ReactionProbs {
                scatter: scatter / sum,
                capture: capture / sum,
                fission: fission / sum,
            })
        } else {
            None
        }
    }
}

/// Uniform 1D mesh over the slab plus the per-cell data the kernels read.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub n_mesh: usize,
    pub dx: Float,
    pub left: Float,
    pub right: Float,
    pub total_xsec: Vec<Float>,
    pub reactions: Vec<ReactionProbs>,
    pub source_pdf: Vec<Float>,
}

impl Mesh {
    /// Validates geometry and cross sections and precomputes the reaction
    /// branching table and the source distribution. Everything that would make
    /// the generation loop misbehave is rejected here.
    pub fn new(
        n_mesh: usize,
        dx: Float,
        surface_distances: &[Float],
        xs: &CrossSections,
    ) -> Result<Mesh> {
        if n_mesh == 0 {
            return Err(TransportError::InvalidConfig(
                "mesh needs at least one cell".to_string(),
            ));
        }
        if !(dx.is_finite() && dx > 0.0) {
            return Err(TransportError::InvalidConfig(format!(
                "cell width must be positive, got {}",
                dx
            )));
        }
        check_surfaces(surface_distances)?;
        let left = surface_distances[0];
        let right = surface_distances[surface_distances.len() - 1];
        let width = right - left;
        if (n_mesh as Float * dx - width).abs() > REL_TOL * width {
            return Err(TransportError::Geometry(format!(
                "{} cells of width {} do not span the slab [{}, {}]",
                n_mesh, dx, left, right
            )));
        }

        for (name, table) in [
            ("capture", &xs.capture),
            ("scatter", &xs.scatter),
            ("fission", &xs.fission),
            ("total", &xs.total),
        ]
        .iter()
        {
            if table.len() != n_mesh {
                return Err(TransportError::InvalidConfig(format!(
                    "{} table has {} entries, mesh has {} cells",
                    name,
                    table.len(),
                    n_mesh
                )));
            }
        }

        let mut reactions = Vec::with_capacity(n_mesh);
        for cell in 0..n_mesh {
            let (c, s, f, t) = (
                xs.capture[cell],
                xs.scatter[cell],
                xs.fission[cell],
                xs.total[cell],
            );
            let bad = |reason: String| TransportError::CrossSection { cell, reason };
            if ![c, s, f, t].iter().all(|v| v.is_finite() && *v >= 0.0) {
                return Err(bad(format!(
                    "values must be finite and non-negative (capture {}, scatter {}, fission {}, total {})",
                    c, s, f, t
                )));
            }
            if t <= 0.0 {
                return Err(bad("total cross section is zero".to_string()));
            }
            if t < (c + s + f) * (1.0 - REL_TOL) {
                return Err(bad(format!(
                    "total {} is smaller than capture + scatter + fission = {}",
                    t,
                    c + s + f
                )));
            }
            let probs = ReactionProbs::from_xsec(c, s, f)
                .ok_or_else(|| bad("no reaction has a non-zero cross section".to_string()))?;
            reactions.push(probs);
        }

        // Fission sites seed the source. Without any fissile cell fall back to
        // a flat source so pure scatter/absorber problems still run.
        let source_pdf = if xs.fission.iter().any(|&f| f > 0.0) {
            normalize(&xs.fission)?
        } else {
            vec![1.0 / n_mesh as Float; n_mesh]
        };

        Ok(Mesh {
            n_mesh,
            dx,
            left,
            right,
            total_xsec: xs.total.clone(),
            reactions,
            source_pdf,
        })
    }

    /// Replaces the fission-derived source distribution.
    pub fn with_source_weights(mut self, weights: &[Float]) -> Result<Mesh> {
        if weights.len() != self.n_mesh {
            return Err(TransportError::InvalidConfig(format!(
                "source weights have {} entries, mesh has {} cells",
                weights.len(),
                self.n_mesh
            )));
        }
        self.source_pdf = normalize(weights)?;
        Ok(self)
    }

    #[inline(always)]
    pub fn cell_left(&self, cell: usize) -> Float {
        self.left + cell as Float * self.dx
    }

    #[inline(always)]
    pub fn cell_right(&self, cell: usize) -> Float {
        self.cell_left(cell) + self.dx
    }

    /// True while `x` is inside `[left, right)`.
    #[inline(always)]
    pub fn contains(&self, x: Float) -> bool {
        x >= self.left && x < self.right
    }

    pub fn cell_centers(&self) -> Vec<Float> {
        (0..self.n_mesh)
            .map(|cell| self.cell_left(cell) + 0.5 * self.dx)
            .collect()
    }
}

fn check_surfaces(surfaces: &[Float]) -> Result<()> {
    if surfaces.len() < 2 {
        return Err(TransportError::Geometry(format!(
            "need at least two surfaces, got {}",
            surfaces.len()
        )));
    }
    if surfaces.iter().any(|s| !s.is_finite()) {
        return Err(TransportError::Geometry(
            "surface positions must be finite".to_string(),
        ));
    }
    if surfaces.windows(2).any(|w| w[1] <= w[0]) {
        return Err(TransportError::Geometry(format!(
            "surface positions must be strictly increasing: {:?}",
            surfaces
        )));
    }
    Ok(())
}

fn normalize(weights: &[Float]) -> Result<Vec<Float>> {
    if weights.iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
        return Err(TransportError::InvalidConfig(
            "source weights must be finite and non-negative".to_string(),
        ));
    }
    let sum: Float = weights.iter().sum();
    if sum <= 0.0 {
        return Err(TransportError::InvalidConfig(
            "source weights sum to zero".to_string(),
        ));
    }
    Ok(weights.iter().map(|w| w / sum).collect())
}
