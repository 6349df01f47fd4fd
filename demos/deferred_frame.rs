//! # Deferred Frame Demo
//!
//! Builds a typical deferred frame (shadows, G-buffer, SSAO, lighting, a
//! bloom chain, tone mapping and a debug view), compiles it against the
//! dummy backend and renders a few frames.
//!
//! ```bash
//! cargo run --example deferred_frame -- --debug-view --dot
//! RUST_LOG=debug cargo run --example deferred_frame -- --width 1920 --height 1080
//! ```

use clap::Parser;

use deferred_graph::backend::DummyResource;
use deferred_graph::{
    to_dot, BufferDescriptor, BufferHandle, DummyBackend, GraphConfig, GraphDescription,
    GraphResult, OperationDescriptor, Operator, RenderGraph, ResolvedPorts, TextureFormat,
    TextureSize,
};

#[derive(Parser, Debug)]
#[command(name = "deferred_frame", about = "Compile and run a deferred render graph")]
struct Args {
    /// Output width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value = "720")]
    height: u32,

    /// Number of frames to render
    #[arg(long, default_value = "3")]
    frames: u32,

    /// Also request the G-buffer debug view
    #[arg(long)]
    debug_view: bool,

    /// Print the graph in Graphviz format
    #[arg(long)]
    dot: bool,

    /// Resize to half resolution after rendering and render again
    #[arg(long)]
    resize: bool,
}

/// Per-frame context shared by all passes.
#[derive(Debug, Default)]
struct Frame {
    index: u64,
    draws: usize,
}

struct Pass {
    name: String,
    targets: Vec<(String, DummyResource)>,
}

impl Operator<Frame> for Pass {
    fn perform(&mut self, frame: &mut Frame) {
        let targets: Vec<String> = self
            .targets
            .iter()
            .map(|(port, resource)| format!("{port}=#{}", resource.id()))
            .collect();
        log::debug!(
            "frame {}: {} -> [{}]",
            frame.index,
            self.name,
            targets.join(", ")
        );
        frame.draws += 1;
    }

    fn finalize(&mut self, frame: &mut Frame) {
        if self.name == "present" {
            frame.index += 1;
        }
    }
}

fn pass(name: &str) -> OperationDescriptor<DummyResource, Frame> {
    let owned = name.to_string();
    OperationDescriptor::new(name, move |ports: &ResolvedPorts<DummyResource>| {
        let targets = ports
            .outputs()
            .filter_map(|(port, resource)| resource.map(|r| (port.to_string(), *r)))
            .collect();
        Box::new(Pass {
            name: owned.clone(),
            targets,
        }) as Box<dyn Operator<Frame>>
    })
}

struct Outputs {
    present: BufferHandle,
    debug_view: BufferHandle,
}

fn build_frame(d: &mut GraphDescription<DummyResource, Frame>) -> Outputs {
    let full = TextureSize::full();
    let half = TextureSize::scaled(2);

    let depth = d.add_buffer(BufferDescriptor::texture("depth", full, TextureFormat::Depth32Float));
    let albedo = d.add_buffer(BufferDescriptor::texture("albedo", full, TextureFormat::Rgba8Unorm));
    let normals = d.add_buffer(BufferDescriptor::texture("normals", full, TextureFormat::Rgba16Float));
    let motion = d.add_buffer(BufferDescriptor::texture("motion", full, TextureFormat::Rg16Float));
    let shadow_map = d.add_buffer(BufferDescriptor::texture(
        "shadow_map",
        TextureSize::Absolute {
            width: 2048,
            height: 2048,
        },
        TextureFormat::Depth32Float,
    ));
    let light_list = d.add_buffer(BufferDescriptor::dummy("light_list"));
    let ssao = d.add_buffer(BufferDescriptor::texture("ssao", half, TextureFormat::R8Unorm));
    let hdr = d.add_buffer(BufferDescriptor::texture("hdr", full, TextureFormat::Rgba16Float));
    let bloom_half = d.add_buffer(BufferDescriptor::texture("bloom_half", half, TextureFormat::Rgba16Float));
    let bloom_quarter = d.add_buffer(BufferDescriptor::texture(
        "bloom_quarter",
        TextureSize::scaled(4),
        TextureFormat::Rgba16Float,
    ));
    let bloom_up = d.add_buffer(BufferDescriptor::texture("bloom_up", half, TextureFormat::Rgba16Float));
    let ldr = d.add_buffer(BufferDescriptor::texture("ldr", full, TextureFormat::Rgba8UnormSrgb));
    let debug_view = d.add_buffer(BufferDescriptor::texture("debug_view", full, TextureFormat::Rgba8UnormSrgb));

    d.add_operation(pass("shadows").output("shadow_map", shadow_map));
    d.add_operation(
        pass("gbuffer")
            .output("depth", depth)
            .output("albedo", albedo)
            .output("normals", normals)
            .output("motion", motion)
            .optional("motion"),
    );
    d.add_operation(pass("cull_lights").input("depth", depth).output("lights", light_list));
    d.add_operation(
        pass("ssao")
            .input("depth", depth)
            .input("normals", normals)
            .output("occlusion", ssao),
    );
    d.add_operation(
        pass("lighting")
            .input("albedo", albedo)
            .input("normals", normals)
            .input("depth", depth)
            .input("occlusion", ssao)
            .input("shadows", shadow_map)
            .input("lights", light_list)
            .output("color", hdr),
    );
    d.add_operation(pass("bloom_down").input("source", hdr).output("target", bloom_half));
    d.add_operation(
        pass("bloom_down2")
            .input("source", bloom_half)
            .output("target", bloom_quarter),
    );
    d.add_operation(
        pass("bloom_up")
            .input("source", bloom_quarter)
            .input("accumulate", bloom_half)
            .output("target", bloom_up)
            .bind("accumulate", "target"),
    );
    d.add_operation(
        pass("tonemap")
            .input("hdr", hdr)
            .input("bloom", bloom_up)
            .output("ldr", ldr),
    );
    d.add_operation(
        pass("debug")
            .input("normals", normals)
            .input("depth", depth)
            .output("view", debug_view),
    );
    // Presenting reads the final image and marks the end of a frame.
    let present = d.add_buffer(BufferDescriptor::dummy("presented"));
    d.add_operation(pass("present").input("image", ldr).output("done", present));

    Outputs {
        present,
        debug_view,
    }
}

fn print_schedule(graph: &RenderGraph<DummyBackend, Frame>) {
    let Some(schedule) = graph.schedule() else {
        return;
    };
    println!("Schedule at {}x{}:", schedule.resolution().x, schedule.resolution().y);
    for (i, phase) in schedule.phases().iter().enumerate() {
        let slots: Vec<String> = phase
            .outputs
            .iter()
            .map(|port| match port.allocation {
                Some(a) => format!("c{}s{}", a.class.index(), a.slot),
                None => "-".to_string(),
            })
            .collect();
        println!("  {i:2}. {:<12} writes [{}]", phase.name, slots.join(", "));
    }
    println!("Physical resources:");
    for (class, peak) in schedule.peaks() {
        if *peak > 0 {
            println!("  {peak} x {class}");
        }
    }
}

fn run(args: &Args) -> GraphResult<()> {
    let mut description = GraphDescription::new();
    let outputs = build_frame(&mut description);

    if args.dot {
        println!("{}", to_dot(&description));
    }

    let mut required = vec![outputs.present];
    if args.debug_view {
        required.push(outputs.debug_view);
    }

    let config = GraphConfig::default().with_resolution(args.width, args.height);
    let mut graph = RenderGraph::with_config(DummyBackend::new(), config);
    graph.setup(&description, &required)?;
    print_schedule(&graph);

    let mut frame = Frame::default();
    for _ in 0..args.frames {
        graph.render(&mut frame)?;
    }

    if args.resize && graph.resize(args.width / 2, args.height / 2) {
        graph.setup(&description, &required)?;
        print_schedule(&graph);
        for _ in 0..args.frames {
            graph.render(&mut frame)?;
        }
    }

    println!(
        "Rendered {} frames, {} pass executions, {} resources created",
        frame.index,
        frame.draws,
        graph.factory().created_count()
    );
    graph.dispose();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Deferred frame demo, version {}", deferred_graph::VERSION);

    if let Err(err) = run(&args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
