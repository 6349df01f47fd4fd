//! Conversion from named ports to positional arrays.
//!
//! Everything after this stage works on indices: an operation's inputs and
//! outputs are plain buffer-handle arrays and bindings are index pairs. This
//! is also where descriptor validation happens, so the later stages can rely
//! on well-formed operations.

use std::collections::HashSet;

use crate::error::{GraphError, GraphResult};
use crate::render_graph::description::GraphDescription;
use crate::render_graph::descriptor::BufferHandle;
use crate::render_graph::operation::Port;

/// An operation with positional ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlatOperation<'a> {
    /// Index in the description's operation list.
    pub index: usize,
    pub name: &'a str,
    pub inputs: Vec<BufferHandle>,
    /// Port index in the descriptor for each flattened input.
    pub input_ports: Vec<usize>,
    pub outputs: Vec<BufferHandle>,
    /// Port index in the descriptor for each flattened output.
    pub output_ports: Vec<usize>,
    pub optional: Vec<bool>,
    /// `(input, output)` pairs into `inputs` / `outputs`.
    pub bindings: Vec<(usize, usize)>,
}

/// Flatten and validate every operation of the description.
pub(crate) fn flatten<R, C>(
    description: &GraphDescription<R, C>,
) -> GraphResult<Vec<FlatOperation<'_>>> {
    let buffer_count = description.buffers().len();
    let mut flat = Vec::with_capacity(description.operations().len());
    let mut producers: Vec<Option<usize>> = vec![None; buffer_count];

    for (index, op) in description.operations().iter().enumerate() {
        let name = op.name();

        check_unique_names(name, op.input_ports(), "input")?;
        check_unique_names(name, op.output_ports(), "output")?;

        let (inputs, input_ports) = present_ports(name, op.input_ports(), buffer_count, "input")?;
        let (outputs, output_ports) =
            present_ports(name, op.output_ports(), buffer_count, "output")?;

        if let Some(shared) = inputs.iter().find(|b| outputs.contains(*b)) {
            return Err(GraphError::malformed(
                name,
                format!(
                    "buffer '{}' is both read and written; declare a binding instead",
                    description.buffer_name(*shared)
                ),
            ));
        }

        for optional in &op.optional_outputs {
            if !op.output_ports().iter().any(|p| &p.name == optional) {
                return Err(GraphError::malformed(
                    name,
                    format!("optional output '{optional}' is not a declared output port"),
                ));
            }
        }
        let optional: Vec<bool> = output_ports
            .iter()
            .map(|&p| op.is_optional(&op.output_ports()[p].name))
            .collect();

        let mut bindings: Vec<(usize, usize)> = Vec::with_capacity(op.bindings().len());
        for (input_name, output_name) in op.bindings() {
            let input = resolve_binding_port(name, op.input_ports(), &input_ports, input_name)?;
            let output =
                resolve_binding_port(name, op.output_ports(), &output_ports, output_name)?;
            if bindings.iter().any(|&(i, _)| i == input) {
                return Err(GraphError::malformed(
                    name,
                    format!("input '{input_name}' appears in more than one binding"),
                ));
            }
            if bindings.iter().any(|&(_, o)| o == output) {
                return Err(GraphError::malformed(
                    name,
                    format!("output '{output_name}' appears in more than one binding"),
                ));
            }
            bindings.push((input, output));
        }

        for output in &outputs {
            let producer = &mut producers[output.index()];
            if let Some(previous) = *producer {
                return Err(GraphError::malformed(
                    name,
                    format!(
                        "buffer '{}' is already produced by '{}'",
                        description.buffer_name(*output),
                        description.operations()[previous].name()
                    ),
                ));
            }
            *producer = Some(index);
        }

        flat.push(FlatOperation {
            index,
            name,
            inputs,
            input_ports,
            outputs,
            output_ports,
            optional,
            bindings,
        });
    }

    Ok(flat)
}

fn check_unique_names(operation: &str, ports: &[Port], direction: &str) -> GraphResult<()> {
    let mut seen = HashSet::with_capacity(ports.len());
    for port in ports {
        if !seen.insert(port.name.as_str()) {
            return Err(GraphError::malformed(
                operation,
                format!("duplicate {direction} port '{}'", port.name),
            ));
        }
    }
    Ok(())
}

/// Drop absent ports and check the remaining handles.
fn present_ports(
    operation: &str,
    ports: &[Port],
    buffer_count: usize,
    direction: &str,
) -> GraphResult<(Vec<BufferHandle>, Vec<usize>)> {
    let mut buffers = Vec::with_capacity(ports.len());
    let mut indices = Vec::with_capacity(ports.len());

    for (port_index, port) in ports.iter().enumerate() {
        let Some(buffer) = port.buffer else {
            continue;
        };
        if buffer.index() >= buffer_count {
            return Err(GraphError::InvalidBufferHandle(buffer));
        }
        if buffers.contains(&buffer) {
            return Err(GraphError::malformed(
                operation,
                format!(
                    "{direction} port '{}' repeats a buffer already used by another {direction}",
                    port.name
                ),
            ));
        }
        buffers.push(buffer);
        indices.push(port_index);
    }

    Ok((buffers, indices))
}

fn resolve_binding_port(
    operation: &str,
    ports: &[Port],
    present: &[usize],
    port_name: &str,
) -> GraphResult<usize> {
    let port_index = ports
        .iter()
        .position(|p| p.name == port_name)
        .ok_or_else(|| {
            GraphError::malformed(
                operation,
                format!("binding references undeclared port '{port_name}'"),
            )
        })?;

    present
        .iter()
        .position(|&p| p == port_index)
        .ok_or_else(|| {
            GraphError::malformed(
                operation,
                format!("binding references absent port '{port_name}'"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TextureFormat;
    use crate::render_graph::descriptor::{BufferDescriptor, TextureSize};
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
    fn test_flatten_drops_absent_ports() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        let b = texture(&mut description, "b");
        let c = texture(&mut description, "c");
        description.add_operation(
            op("combine")
                .input("first", a)
                .maybe_input("unused", None)
                .input("second", b)
                .output("out", c)
                .bind("second", "out"),
        );

        let flat = flatten(&description).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].inputs, vec![a, b]);
        assert_eq!(flat[0].input_ports, vec![0, 2]);
        assert_eq!(flat[0].outputs, vec![c]);
        assert_eq!(flat[0].bindings, vec![(1, 0)]);
        assert_eq!(flat[0].optional, vec![false]);
    }

    #[test]
    fn test_flatten_binding_to_absent_port() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        description.add_operation(
            op("blur")
                .maybe_input("source", None)
                .output("target", a)
                .bind("source", "target"),
        );

        let err = flatten(&description).unwrap_err();
        assert_eq!(
            err,
            GraphError::malformed("blur", "binding references absent port 'source'")
        );
    }

    #[test]
    fn test_flatten_duplicate_binding() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        let b = texture(&mut description, "b");
        let c = texture(&mut description, "c");
        description.add_operation(
            op("split")
                .input("src", a)
                .output("x", b)
                .output("y", c)
                .bind("src", "x")
                .bind("src", "y"),
        );

        assert!(matches!(
            flatten(&description),
            Err(GraphError::MalformedOperation { .. })
        ));
    }

    #[test]
    fn test_flatten_duplicate_port_name() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        let b = texture(&mut description, "b");
        let c = texture(&mut description, "c");
        description.add_operation(op("mix").input("x", a).input("x", b).output("out", c));

        assert_eq!(
            flatten(&description).unwrap_err(),
            GraphError::malformed("mix", "duplicate input port 'x'")
        );

        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        let b = texture(&mut description, "b");
        description.add_operation(op("split").output("y", a).output("y", b));

        assert_eq!(
            flatten(&description).unwrap_err(),
            GraphError::malformed("split", "duplicate output port 'y'")
        );
    }

    #[test]
    fn test_flatten_duplicate_buffer() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        let b = texture(&mut description, "b");
        description.add_operation(op("mix").input("x", a).input("y", a).output("out", b));

        assert!(matches!(
            flatten(&description),
            Err(GraphError::MalformedOperation { .. })
        ));
    }

    #[test]
    fn test_flatten_read_write_same_buffer() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        description.add_operation(op("feedback").input("x", a).output("y", a));

        assert!(matches!(
            flatten(&description),
            Err(GraphError::MalformedOperation { .. })
        ));
    }

    #[test]
    fn test_flatten_two_producers() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        description.add_operation(op("first").output("out", a));
        description.add_operation(op("second").output("out", a));

        let err = flatten(&description).unwrap_err();
        assert_eq!(
            err,
            GraphError::malformed("second", "buffer 'a' is already produced by 'first'")
        );
    }

    #[test]
    fn test_flatten_invalid_handle() {
        let mut description = GraphDescription::new();
        description.add_operation(op("gen").output("out", BufferHandle::new(3)));

        assert_eq!(
            flatten(&description).unwrap_err(),
            GraphError::InvalidBufferHandle(BufferHandle::new(3))
        );
    }

    #[test]
    fn test_flatten_unknown_optional_output() {
        let mut description = GraphDescription::new();
        let a = texture(&mut description, "a");
        description.add_operation(op("gen").output("out", a).optional("debug"));

        assert!(matches!(
            flatten(&description),
            Err(GraphError::MalformedOperation { .. })
        ));
    }
}
