//! Render Graph System
//!
//! Operations declare the logical buffers they read and write. Compiling a
//! [`GraphDescription`] prunes everything the requested outputs don't depend
//! on, orders the rest and packs the logical buffers into as few physical
//! resources as their lifetimes allow. [`RenderGraph`] then realizes those
//! resources through a [`ResourceFactory`](crate::backend::ResourceFactory)
//! and replays the operators every frame.

pub mod allocator;
pub mod compiler;
pub mod description;
pub mod descriptor;
pub mod dot;
pub mod executor;
mod flatten;
pub mod graph;
pub mod operation;
mod prune;
pub mod realizer;
pub mod scheduler;

pub use allocator::{Allocation, BufferAllocator, ClassId};
pub use compiler::{compile, CompiledSchedule};
pub use description::GraphDescription;
pub use descriptor::{BufferDescriptor, BufferHandle, BufferKind, TextureSize};
pub use dot::to_dot;
pub use executor::Executor;
pub use graph::RenderGraph;
pub use operation::{OperationDescriptor, Operator, OperatorFactory, Port, ResolvedPorts};
pub use realizer::{NamedOperator, ResourceRealizer};
pub use scheduler::{PortAllocation, ScheduledPhase};
