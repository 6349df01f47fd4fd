//! Common utilities for render graph integration tests.
//!
//! Operators built here are probes: every frame they check that each input
//! resource still holds the content its producer wrote, then stamp their own
//! outputs. Any aliasing mistake in the compiled schedule shows up as a read
//! of somebody else's data.

#![allow(dead_code)]

use std::collections::HashMap;

use deferred_graph::backend::DummyResource;
use deferred_graph::{
    BufferDescriptor, BufferHandle, GraphDescription, OperationDescriptor, Operator,
    ResolvedPorts, TextureFormat, TextureSize,
};

/// Shared per-frame state the probes read and write.
#[derive(Debug, Default)]
pub struct Memory {
    /// Logical buffer currently stored in each physical resource.
    pub contents: HashMap<DummyResource, String>,
    /// Operations in the order they performed.
    pub performed: Vec<String>,
    /// Reads that found the wrong content.
    pub errors: Vec<String>,
}

pub type Description = GraphDescription<DummyResource, Memory>;

struct Probe {
    name: String,
    reads: Vec<(String, DummyResource)>,
    writes: Vec<(String, DummyResource)>,
}

impl Operator<Memory> for Probe {
    fn perform(&mut self, memory: &mut Memory) {
        for (buffer, resource) in &self.reads {
            let found = memory.contents.get(resource);
            if found != Some(buffer) {
                memory.errors.push(format!(
                    "{} read {buffer} from {resource:?} but found {found:?}",
                    self.name
                ));
            }
        }
        for (buffer, resource) in &self.writes {
            memory.contents.insert(*resource, buffer.clone());
        }
        memory.performed.push(self.name.clone());
    }
}

fn present<'a>(
    ports: impl Iterator<Item = (&'a str, Option<&'a DummyResource>)>,
) -> Vec<(String, DummyResource)> {
    ports
        .filter_map(|(port, resource)| resource.map(|r| (port.to_string(), *r)))
        .collect()
}

/// Operation whose port names equal the names of the buffers they carry.
pub fn probe(
    name: &str,
    inputs: &[(&str, BufferHandle)],
    outputs: &[(&str, BufferHandle)],
) -> OperationDescriptor<DummyResource, Memory> {
    let owned = name.to_string();
    let mut op = OperationDescriptor::new(name, move |ports: &ResolvedPorts<DummyResource>| {
        Box::new(Probe {
            name: owned.clone(),
            reads: present(ports.inputs()),
            writes: present(ports.outputs()),
        }) as Box<dyn Operator<Memory>>
    });
    for (port, buffer) in inputs {
        op = op.input(*port, *buffer);
    }
    for (port, buffer) in outputs {
        op = op.output(*port, *buffer);
    }
    op
}

pub fn color(description: &mut Description, name: &str) -> BufferHandle {
    description.add_buffer(BufferDescriptor::texture(
        name,
        TextureSize::full(),
        TextureFormat::Rgba8Unorm,
    ))
}

/// Handles of the buffers in [`deferred_frame`].
pub struct DeferredFrame {
    pub description: Description,
    pub depth: BufferHandle,
    pub albedo: BufferHandle,
    pub normals: BufferHandle,
    pub motion: BufferHandle,
    pub shadow_map: BufferHandle,
    pub light_list: BufferHandle,
    pub ssao: BufferHandle,
    pub hdr: BufferHandle,
    pub bloom_half: BufferHandle,
    pub bloom_quarter: BufferHandle,
    pub bloom_up: BufferHandle,
    pub ldr: BufferHandle,
    pub debug_view: BufferHandle,
}

/// A typical deferred frame with a bloom chain and a debug-only branch.
pub fn deferred_frame() -> DeferredFrame {
    let mut d = Description::new();
    let texture = |d: &mut Description, name: &str, size: TextureSize, format: TextureFormat| {
        d.add_buffer(BufferDescriptor::texture(name, size, format))
    };

    let depth = texture(&mut d, "depth", TextureSize::full(), TextureFormat::Depth32Float);
    let albedo = texture(&mut d, "albedo", TextureSize::full(), TextureFormat::Rgba8Unorm);
    let normals = texture(&mut d, "normals", TextureSize::full(), TextureFormat::Rgba16Float);
    let motion = texture(&mut d, "motion", TextureSize::full(), TextureFormat::Rg16Float);
    let shadow_map = texture(
        &mut d,
        "shadow_map",
        TextureSize::Absolute {
            width: 32,
            height: 32,
        },
        TextureFormat::Depth32Float,
    );
    let light_list = d.add_buffer(BufferDescriptor::dummy("light_list"));
    let ssao = texture(&mut d, "ssao", TextureSize::scaled(2), TextureFormat::R8Unorm);
    let hdr = texture(&mut d, "hdr", TextureSize::full(), TextureFormat::Rgba16Float);
    let bloom_half = texture(&mut d, "bloom_half", TextureSize::scaled(2), TextureFormat::Rgba16Float);
    let bloom_quarter = texture(
        &mut d,
        "bloom_quarter",
        TextureSize::scaled(4),
        TextureFormat::Rgba16Float,
    );
    let bloom_up = texture(&mut d, "bloom_up", TextureSize::scaled(2), TextureFormat::Rgba16Float);
    let ldr = texture(&mut d, "ldr", TextureSize::full(), TextureFormat::Rgba8Unorm);
    let debug_view = texture(&mut d, "debug_view", TextureSize::full(), TextureFormat::Rgba8Unorm);

    d.add_operation(probe("shadows", &[], &[("shadow_map", shadow_map)]));
    d.add_operation(
        probe(
            "gbuffer",
            &[],
            &[
                ("depth", depth),
                ("albedo", albedo),
                ("normals", normals),
                ("motion", motion),
            ],
        )
        .optional("motion"),
    );
    d.add_operation(probe("cull_lights", &[("depth", depth)], &[("light_list", light_list)]));
    d.add_operation(probe(
        "ssao",
        &[("depth", depth), ("normals", normals)],
        &[("ssao", ssao)],
    ));
    d.add_operation(probe(
        "lighting",
        &[
            ("albedo", albedo),
            ("normals", normals),
            ("depth", depth),
            ("ssao", ssao),
            ("shadow_map", shadow_map),
            ("light_list", light_list),
        ],
        &[("hdr", hdr)],
    ));
    d.add_operation(probe("bloom_down", &[("hdr", hdr)], &[("bloom_half", bloom_half)]));
    d.add_operation(probe(
        "bloom_down2",
        &[("bloom_half", bloom_half)],
        &[("bloom_quarter", bloom_quarter)],
    ));
    d.add_operation(
        probe(
            "bloom_up",
            &[("bloom_quarter", bloom_quarter), ("bloom_half", bloom_half)],
            &[("bloom_up", bloom_up)],
        )
        .bind("bloom_half", "bloom_up"),
    );
    d.add_operation(probe(
        "tonemap",
        &[("hdr", hdr), ("bloom_up", bloom_up)],
        &[("ldr", ldr)],
    ));
    d.add_operation(probe(
        "debug",
        &[("normals", normals), ("depth", depth)],
        &[("debug_view", debug_view)],
    ));

    DeferredFrame {
        description: d,
        depth,
        albedo,
        normals,
        motion,
        shadow_map,
        light_list,
        ssao,
        hdr,
        bloom_half,
        bloom_quarter,
        bloom_up,
        ldr,
        debug_view,
    }
}

/// Linear chain `op0 -> op1 -> ... -> op{length-1}`, returning the last buffer.
pub fn chain(description: &mut Description, length: usize, in_place: bool) -> BufferHandle {
    let mut previous = color(description, "b0");
    description.add_operation(probe("op0", &[], &[("b0", previous)]));
    for i in 1..length {
        let input = format!("b{}", i - 1);
        let output = format!("b{i}");
        let next = color(description, &output);
        let mut op = probe(
            &format!("op{i}"),
            &[(input.as_str(), previous)],
            &[(output.as_str(), next)],
        );
        if in_place {
            op = op.bind(input, output);
        }
        description.add_operation(op);
        previous = next;
    }
    previous
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
