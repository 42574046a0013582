use slab_mc::{Config, Float, Geometry, Output, Params, Region, Source};

/// A single-material unit slab split into `n_mesh` cells. Nothing is written
/// to disk.
pub fn setup_config(n_mesh: usize, num: usize, region: Region) -> Config {
    Config {
        params: Params {
            n_mesh,
            nu: 2,
            num,
            part_speed: 1.0,
            iso: true,
            seed: 42,
            capacity_factor: 5,
        },
        geometry: Geometry {
            surface_distances: vec![0.0, 1.0],
        },
        regions: vec![region],
        source: Source::default(),
        output: Output {
            write_output: false,
            output_dir: "output".to_string(),
        },
    }
}

pub fn material(capture: Float, scatter: Float, fission: Float) -> Region {
    Region {
        capture,
        scatter,
        fission,
        total: None,
    }
}

/// Same slab, stretched to `width` mean free paths of a pure scatterer.
pub fn scatter_slab(n_mesh: usize, num: usize, width: Float) -> Config {
    let mut cfg = setup_config(n_mesh, num, material(0.0, 1.0, 0.0));
    cfg.geometry.surface_distances = vec![0.0, width];
    cfg
}
