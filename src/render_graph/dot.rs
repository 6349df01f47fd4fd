//! Graphviz export of a graph description.

use std::fmt::Write;

use crate::render_graph::description::GraphDescription;
use crate::render_graph::descriptor::BufferKind;

/// Render the full, unpruned description as a DOT digraph.
///
/// Operations become boxes and buffers become edges from producer to
/// consumer. Buffers that are read but never written show up as dashed
/// ellipses; buffers nobody reads end in a plain ellipse. Dummy buffers are
/// drawn dotted. Works on malformed descriptions too, so it can be used to
/// look at a graph that fails to compile.
pub fn to_dot<R, C>(description: &GraphDescription<R, C>) -> String {
    let buffer_count = description.buffers().len();
    let mut producers: Vec<Option<usize>> = vec![None; buffer_count];
    let mut consumed = vec![false; buffer_count];

    for (index, op) in description.operations().iter().enumerate() {
        for buffer in op.output_ports().iter().filter_map(|p| p.buffer) {
            if let Some(producer) = producers.get_mut(buffer.index()) {
                producer.get_or_insert(index);
            }
        }
        for buffer in op.input_ports().iter().filter_map(|p| p.buffer) {
            if let Some(flag) = consumed.get_mut(buffer.index()) {
                *flag = true;
            }
        }
    }

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_dot(description, &producers, &consumed, &mut out);
    out
}

fn write_dot<R, C>(
    description: &GraphDescription<R, C>,
    producers: &[Option<usize>],
    consumed: &[bool],
    out: &mut String,
) -> std::fmt::Result {
    writeln!(out, "digraph render_graph {{")?;
    writeln!(out, "    rankdir=LR;")?;
    writeln!(out, "    node [shape=box];")?;

    for (index, op) in description.operations().iter().enumerate() {
        writeln!(out, "    op{index} [label=\"{}\"];", escape(op.name()))?;
    }

    for (index, buffer) in description.buffers().iter().enumerate() {
        let name = escape(&buffer.name);
        if producers[index].is_none() && consumed[index] {
            writeln!(
                out,
                "    missing{index} [label=\"{name}\", shape=ellipse, style=dashed];"
            )?;
        }
        if producers[index].is_some() && !consumed[index] {
            writeln!(out, "    sink{index} [label=\"{name}\", shape=ellipse];")?;
        }
    }

    for (consumer, op) in description.operations().iter().enumerate() {
        for port in op.input_ports() {
            let Some(buffer) = port.buffer else {
                continue;
            };
            let Some(descriptor) = description.buffers().get(buffer.index()) else {
                continue;
            };
            let source = match producers[buffer.index()] {
                Some(producer) => format!("op{producer}"),
                None => format!("missing{}", buffer.index()),
            };
            let in_place = op.bindings().iter().any(|(input, _)| *input == port.name);
            let mut attributes = vec![format!(
                "label=\"{} ({})\"",
                escape(&descriptor.name),
                escape(&port.name)
            )];
            if matches!(descriptor.kind, BufferKind::Dummy) {
                attributes.push("style=dotted".to_string());
            } else if in_place {
                attributes.push("style=bold".to_string());
            }
            writeln!(
                out,
                "    {source} -> op{consumer} [{}];",
                attributes.join(", ")
            )?;
        }
    }

    for (index, producer) in producers.iter().enumerate() {
        if let (Some(producer), false) = (producer, consumed[index]) {
            let name = escape(&description.buffers()[index].name);
            writeln!(out, "    op{producer} -> sink{index} [label=\"{name}\"];")?;
        }
    }

    writeln!(out, "}}")
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureFormat;
    use crate::render_graph::descriptor::{BufferDescriptor, BufferHandle, TextureSize};
    use crate::render_graph::operation::{OperationDescriptor, Operator};

    struct Nop;

    impl Operator for Nop {
        fn perform(&mut self, _ctx: &mut ()) {}
    }

    fn op(name: &str) -> OperationDescriptor<u32> {
        OperationDescriptor::new(name, |_| Box::new(Nop))
    }

    fn texture(description: &mut GraphDescription<u32>, name: &str) -> BufferHandle {
        description.add_buffer(BufferDescriptor::texture(
            name,
            TextureSize::full(),
            TextureFormat::Rgba8Unorm,
        ))
    }

    #[test]
    fn test_dot_edges() {
        let mut description = GraphDescription::new();
        let albedo = texture(&mut description, "albedo");
        let shadow = texture(&mut description, "shadow_map");
        let lit = texture(&mut description, "lit");
        let order = description.add_buffer(BufferDescriptor::dummy("after_gbuffer"));
        description.add_operation(op("gbuffer").output("albedo", albedo).output("done", order));
        description.add_operation(
            op("lighting")
                .input("albedo", albedo)
                .input("shadow", shadow)
                .input("after", order)
                .output("color", lit)
                .bind("albedo", "color"),
        );

        let dot = to_dot(&description);
        assert!(dot.starts_with("digraph render_graph {"));
        assert!(dot.contains("op0 [label=\"gbuffer\"];"));
        assert!(dot.contains("op0 -> op1 [label=\"albedo (albedo)\", style=bold];"));
        assert!(dot.contains("op0 -> op1 [label=\"after_gbuffer (after)\", style=dotted];"));
        assert!(dot.contains("missing1 [label=\"shadow_map\", shape=ellipse, style=dashed];"));
        assert!(dot.contains("missing1 -> op1"));
        assert!(dot.contains("op1 -> sink2 [label=\"lit\"];"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_escapes_quotes() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        description.add_operation(op("say \"hi\"").output("out", a));

        assert!(to_dot(&description).contains("label=\"say \\\"hi\\\"\""));
    }
}
