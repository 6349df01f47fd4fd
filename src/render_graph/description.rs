//! Graph description: the buffer table plus the declared operations

use crate::error::{GraphError, GraphResult};
use crate::render_graph::descriptor::{BufferDescriptor, BufferHandle};
use crate::render_graph::operation::OperationDescriptor;

/// Everything the compiler needs to know about a frame.
///
/// Buffers live in a table owned by the description and are referenced by
/// [`BufferHandle`]. A description can be compiled any number of times; it
/// is never mutated by compilation.
pub struct GraphDescription<R, C = ()> {
    buffers: Vec<BufferDescriptor>,
    operations: Vec<OperationDescriptor<R, C>>,
}

impl<R, C> GraphDescription<R, C> {
    pub fn new() -> Self {
        Self {
            buffers: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Register a logical buffer.
    pub fn add_buffer(&mut self, descriptor: BufferDescriptor) -> BufferHandle {
        let handle = BufferHandle::new(self.buffers.len());
        self.buffers.push(descriptor);
        handle
    }

    /// Declare an operation. Declaration order breaks scheduling ties.
    pub fn add_operation(&mut self, operation: OperationDescriptor<R, C>) {
        self.operations.push(operation);
    }

    pub fn buffer(&self, handle: BufferHandle) -> GraphResult<&BufferDescriptor> {
        self.buffers
            .get(handle.index())
            .ok_or(GraphError::InvalidBufferHandle(handle))
    }

    pub fn buffers(&self) -> &[BufferDescriptor] {
        &self.buffers
    }

    pub fn operations(&self) -> &[OperationDescriptor<R, C>] {
        &self.operations
    }

    /// Handle of the first buffer with the given name.
    pub fn find_buffer(&self, name: &str) -> Option<BufferHandle> {
        self.buffers
            .iter()
            .position(|b| b.name == name)
            .map(BufferHandle::new)
    }

    pub fn buffer_name(&self, handle: BufferHandle) -> &str {
        self.buffers
            .get(handle.index())
            .map(|b| b.name.as_str())
            .unwrap_or("<invalid>")
    }
}

impl<R, C> Default for GraphDescription<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> std::fmt::Debug for GraphDescription<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphDescription")
            .field("buffers", &self.buffers)
            .field("operations", &self.operations)
            .finish()
    }
}
