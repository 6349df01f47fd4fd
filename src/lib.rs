//! Deferred Graph - a render graph compiler for deferred renderers
//!
//! A frame is described as operations that read and write logical buffers.
//! The compiler turns that description into a flat schedule:
//! - operations that don't contribute to the requested outputs are pruned
//! - the remaining operations are ordered greedily, back to front, so that
//!   buffers die as early as possible
//! - logical buffers with matching size and format share physical resources
//!   whenever their lifetimes don't overlap, including in-place reuse of an
//!   input by an output when the operation allows it
//!
//! Physical resources come from a [`ResourceFactory`] and survive
//! recompilation as long as they are still needed.

pub mod backend;
pub mod error;
pub mod render_graph;

pub use backend::{BufferClass, DummyBackend, ResourceFactory, TextureFormat};
pub use error::{GraphError, GraphResult};
pub use render_graph::{
    compile, to_dot, BufferDescriptor, BufferHandle, CompiledSchedule, GraphDescription,
    OperationDescriptor, Operator, RenderGraph, ResolvedPorts, TextureSize,
};

use glam::UVec2;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for compiling a render graph
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Output resolution that relative buffer sizes are resolved against
    pub resolution: UVec2,
    /// Scheduler weight of growing a class's peak slot count
    pub capacity_weight: i64,
    /// Scheduler weight of the net change in live buffers
    pub count_weight: i64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            resolution: UVec2::new(1280, 720),
            capacity_weight: 5,
            count_weight: 1,
        }
    }
}

impl GraphConfig {
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = UVec2::new(width, height).max(UVec2::ONE);
        self
    }

    pub fn with_capacity_weight(mut self, weight: i64) -> Self {
        self.capacity_weight = weight;
        self
    }

    pub fn with_count_weight(mut self, weight: i64) -> Self {
        self.count_weight = weight;
        self
    }
}
