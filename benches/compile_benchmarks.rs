use criterion::{black_box, criterion_group, criterion_main, Criterion};

use deferred_graph::{
    compile, BufferDescriptor, BufferHandle, DummyBackend, GraphConfig, GraphDescription,
    OperationDescriptor, Operator, RenderGraph, TextureFormat, TextureSize,
};

struct Nop;

impl Operator for Nop {
    fn perform(&mut self, _ctx: &mut ()) {}
}

type Description = GraphDescription<deferred_graph::backend::DummyResource>;

fn op(name: &str) -> OperationDescriptor<deferred_graph::backend::DummyResource> {
    OperationDescriptor::new(name, |_| Box::new(Nop))
}

fn color(description: &mut Description, name: &str) -> BufferHandle {
    description.add_buffer(BufferDescriptor::texture(
        name,
        TextureSize::full(),
        TextureFormat::Rgba16Float,
    ))
}

fn chain(length: usize, in_place: bool) -> (Description, BufferHandle) {
    let mut description = Description::new();
    let mut previous = color(&mut description, "b0");
    description.add_operation(op("pass_0").output("out", previous));
    for i in 1..length {
        let next = color(&mut description, &format!("b{i}"));
        let mut pass = op(&format!("pass_{i}"))
            .input("in", previous)
            .output("out", next);
        if in_place {
            pass = pass.bind("in", "out");
        }
        description.add_operation(pass);
        previous = next;
    }
    (description, previous)
}

/// Every pass reads the two previous results, so many candidates are ready
/// at once and the cost estimate dominates.
fn lattice(length: usize) -> (Description, BufferHandle) {
    let mut description = Description::new();
    let mut buffers = vec![color(&mut description, "b0"), color(&mut description, "b1")];
    description.add_operation(op("seed_0").output("out", buffers[0]));
    description.add_operation(op("seed_1").output("out", buffers[1]));
    for i in 2..length {
        let next = color(&mut description, &format!("b{i}"));
        description.add_operation(
            op(&format!("pass_{i}"))
                .input("a", buffers[i - 2])
                .input("b", buffers[i - 1])
                .output("out", next),
        );
        buffers.push(next);
    }
    let last = buffers[buffers.len() - 1];
    (description, last)
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

fn bench_compile_chain(c: &mut Criterion) {
    let (description, last) = chain(32, false);
    let config = GraphConfig::default();
    c.bench_function("compile_32_pass_chain", |b| {
        b.iter(|| black_box(compile(&description, &[last], &config).unwrap()));
    });
}

fn bench_compile_chain_in_place(c: &mut Criterion) {
    let (description, last) = chain(32, true);
    let config = GraphConfig::default();
    c.bench_function("compile_32_pass_chain_in_place", |b| {
        b.iter(|| black_box(compile(&description, &[last], &config).unwrap()));
    });
}

fn bench_compile_lattice(c: &mut Criterion) {
    let (description, last) = lattice(128);
    let config = GraphConfig::default();
    c.bench_function("compile_128_pass_lattice", |b| {
        b.iter(|| black_box(compile(&description, &[last], &config).unwrap()));
    });
}

// ---------------------------------------------------------------------------
// Setup and replay
// ---------------------------------------------------------------------------

fn bench_setup(c: &mut Criterion) {
    let (description, last) = chain(32, false);
    let mut graph = RenderGraph::new(DummyBackend::new());
    c.bench_function("setup_32_pass_chain", |b| {
        b.iter(|| graph.setup(&description, &[last]).unwrap());
    });
}

fn bench_render(c: &mut Criterion) {
    let (description, last) = chain(32, false);
    let mut graph = RenderGraph::new(DummyBackend::new());
    graph.setup(&description, &[last]).unwrap();
    c.bench_function("render_32_pass_chain", |b| {
        b.iter(|| graph.render(&mut ()).unwrap());
    });
}

criterion_group!(
    benches,
    bench_compile_chain,
    bench_compile_chain_in_place,
    bench_compile_lattice,
    bench_setup,
    bench_render,
);
criterion_main!(benches);
