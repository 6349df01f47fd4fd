//! Operation descriptors and the operator contract

use crate::render_graph::descriptor::BufferHandle;

/// A stateful unit of per-frame work produced by an operation's factory.
///
/// Every frame the executor calls `prepare` on all operators, then `perform`
/// on all operators, then `finalize` on all operators, always in schedule
/// order. `dispose` is called once when the schedule is replaced or torn down.
pub trait Operator<C = ()> {
    /// Compute per-frame state. Must not touch shared resources.
    fn prepare(&mut self, _ctx: &mut C) {}

    /// Do the actual work. May read and write the operator's resources.
    fn perform(&mut self, ctx: &mut C);

    /// Per-frame cleanup and bookkeeping.
    fn finalize(&mut self, _ctx: &mut C) {}

    /// Release whatever the operator created for itself.
    fn dispose(&mut self) {}
}

/// Physical resources resolved for the ports of one operation.
///
/// Ports that were absent in the descriptor, and optional outputs nobody
/// consumes, resolve to `None`.
#[derive(Debug, Clone)]
pub struct ResolvedPorts<R> {
    pub(crate) inputs: Vec<(String, Option<R>)>,
    pub(crate) outputs: Vec<(String, Option<R>)>,
}

impl<R> ResolvedPorts<R> {
    /// Resource bound to the named input port.
    pub fn input(&self, name: &str) -> Option<&R> {
        lookup(&self.inputs, name)
    }

    /// Resource bound to the named output port.
    pub fn output(&self, name: &str) -> Option<&R> {
        lookup(&self.outputs, name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&str, Option<&R>)> {
        self.inputs.iter().map(|(n, r)| (n.as_str(), r.as_ref()))
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, Option<&R>)> {
        self.outputs.iter().map(|(n, r)| (n.as_str(), r.as_ref()))
    }
}

fn lookup<'a, R>(ports: &'a [(String, Option<R>)], name: &str) -> Option<&'a R> {
    ports
        .iter()
        .find(|(n, _)| n == name)
        .and_then(|(_, r)| r.as_ref())
}

/// Builds an operator from its resolved resources.
pub type OperatorFactory<R, C> = Box<dyn Fn(&ResolvedPorts<R>) -> Box<dyn Operator<C>>>;

/// A named port. `None` means the port is not present this time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub buffer: Option<BufferHandle>,
}

/// Declarative description of one render operation.
///
/// ```ignore
/// let blur = OperationDescriptor::new("blur", |ports| Box::new(Blur::new(ports)))
///     .input("source", hdr)
///     .output("target", blurred)
///     .bind("source", "target");
/// ```
pub struct OperationDescriptor<R, C = ()> {
    pub(crate) name: String,
    pub(crate) inputs: Vec<Port>,
    pub(crate) outputs: Vec<Port>,
    pub(crate) bindings: Vec<(String, String)>,
    pub(crate) optional_outputs: Vec<String>,
    pub(crate) factory: OperatorFactory<R, C>,
}

impl<R, C> OperationDescriptor<R, C> {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ResolvedPorts<R>) -> Box<dyn Operator<C>> + 'static,
    {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            bindings: Vec::new(),
            optional_outputs: Vec::new(),
            factory: Box::new(factory),
        }
    }

    /// Declare an input port.
    pub fn input(self, name: impl Into<String>, buffer: BufferHandle) -> Self {
        self.maybe_input(name, Some(buffer))
    }

    /// Declare an input port that may be absent.
    pub fn maybe_input(mut self, name: impl Into<String>, buffer: Option<BufferHandle>) -> Self {
        self.inputs.push(Port {
            name: name.into(),
            buffer,
        });
        self
    }

    /// Declare an output port.
    pub fn output(self, name: impl Into<String>, buffer: BufferHandle) -> Self {
        self.maybe_output(name, Some(buffer))
    }

    /// Declare an output port that may be absent.
    pub fn maybe_output(mut self, name: impl Into<String>, buffer: Option<BufferHandle>) -> Self {
        self.outputs.push(Port {
            name: name.into(),
            buffer,
        });
        self
    }

    /// Allow the output to be written into the storage of the input.
    pub fn bind(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.bindings.push((input.into(), output.into()));
        self
    }

    /// Mark an output as droppable when nothing downstream consumes it.
    pub fn optional(mut self, output: impl Into<String>) -> Self {
        self.optional_outputs.push(output.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_ports(&self) -> &[Port] {
        &self.inputs
    }

    pub fn output_ports(&self) -> &[Port] {
        &self.outputs
    }

    pub fn bindings(&self) -> &[(String, String)] {
        &self.bindings
    }

    pub fn is_optional(&self, output: &str) -> bool {
        self.optional_outputs.iter().any(|o| o == output)
    }

    pub(crate) fn instantiate(&self, ports: &ResolvedPorts<R>) -> Box<dyn Operator<C>> {
        (self.factory)(ports)
    }
}

impl<R, C> std::fmt::Debug for OperationDescriptor<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("bindings", &self.bindings)
            .field("optional_outputs", &self.optional_outputs)
            .finish_non_exhaustive()
    }
}
