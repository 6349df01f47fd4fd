//! Backend abstraction traits
//!
//! The render graph never touches GPU objects itself. It asks a
//! [`ResourceFactory`] for physical resources and hands the resulting handles
//! to the operators it instantiates.

use crate::backend::types::BufferClass;
use crate::error::GraphResult;

/// Creates and destroys the physical resources backing logical buffers.
///
/// Resources are expected to be cheap handles (like a texture id); the
/// realizer clones them into every operator that reads or writes them and
/// keeps the original to decide when to destroy it.
pub trait ResourceFactory {
    /// Handle to one physical resource.
    type Resource: Clone + std::fmt::Debug;

    /// Create a resource able to hold any logical buffer of `class`.
    fn create(&mut self, class: &BufferClass) -> GraphResult<Self::Resource>;

    /// Destroy a resource previously returned by [`create`](Self::create).
    fn destroy(&mut self, resource: Self::Resource);
}

impl<F: ResourceFactory + ?Sized> ResourceFactory for &mut F {
    type Resource = F::Resource;

    fn create(&mut self, class: &BufferClass) -> GraphResult<Self::Resource> {
        (**self).create(class)
    }

    fn destroy(&mut self, resource: Self::Resource) {
        (**self).destroy(resource)
    }
}
