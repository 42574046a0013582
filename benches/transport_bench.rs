#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};
use slab_mc::kernels::advance::advance;
use slab_mc::kernels::source::source_particles;
use slab_mc::{CpuKernels, CrossSections, Generations, Mesh, PhaseSpace, RandomStream, SimParams, Tallies};

const N_MESH: usize = 100;
const NUM: usize = 100_000;

fn bench_mesh() -> Mesh {
    let xs = CrossSections::homogeneous(N_MESH, 0.25, 0.5, 0.2, 0.95);
    Mesh::new(N_MESH, 0.1, &[0.0, 10.0], &xs).unwrap()
}

fn bench_params() -> SimParams {
    SimParams {
        n_mesh: N_MESH,
        nu: 2,
        num: NUM,
        dx: 0.1,
        part_speed: 1.0,
        iso: true,
        seed: 1,
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mesh = bench_mesh();

    c.bench_function("advance 100k", |b| {
        b.iter(|| {
            let mut store = PhaseSpace::allocate(NUM);
            let mut stream = RandomStream::new(1);
            let mut tallies = Tallies::new(N_MESH);
            source_particles(&mut store, &mesh, NUM, true, 1.0, &mut stream).unwrap();
            black_box(advance(&mut store, &mesh, &mut tallies, &mut stream));
        })
    });

    let mut group = c.benchmark_group("full run");
    group.sample_size(10);
    group.bench_function("100k particles, 100 cells", |b| {
        b.iter(|| {
            let sim = Generations::new(CpuKernels, bench_params(), bench_mesh(), 5 * NUM).unwrap();
            black_box(sim.run().unwrap())
        })
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
