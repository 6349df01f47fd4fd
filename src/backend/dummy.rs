//! Dummy backend for testing and development.
//!
//! This backend doesn't own any GPU objects but hands out unique resource
//! handles and keeps count of what is alive, which is enough to drive and
//! observe the render graph without hardware.

use std::collections::HashMap;

use crate::backend::traits::ResourceFactory;
use crate::backend::types::BufferClass;
use crate::error::{GraphError, GraphResult};

/// Handle to a dummy resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DummyResource(pub(crate) u64);

impl DummyResource {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Dummy resource factory.
#[derive(Debug, Default)]
pub struct DummyBackend {
    next_id: u64,
    live: HashMap<DummyResource, BufferClass>,
    created: usize,
    destroyed: usize,
    /// Fail creation once this many resources are alive.
    capacity: Option<usize>,
}

impl DummyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of simultaneously alive resources.
    pub fn with_capacity_limit(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn name(&self) -> &'static str {
        "Dummy"
    }

    /// Number of resources currently alive.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of alive resources of the given class.
    pub fn live_count_of(&self, class: &BufferClass) -> usize {
        self.live.values().filter(|c| *c == class).count()
    }

    /// Total number of `create` calls that succeeded.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Total number of `destroy` calls.
    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    pub fn is_alive(&self, resource: DummyResource) -> bool {
        self.live.contains_key(&resource)
    }
}

impl ResourceFactory for DummyBackend {
    type Resource = DummyResource;

    fn create(&mut self, class: &BufferClass) -> GraphResult<DummyResource> {
        if let Some(capacity) = self.capacity {
            if self.live.len() >= capacity {
                return Err(GraphError::ResourceCreationFailed(format!(
                    "dummy backend capacity of {capacity} exhausted while creating {class}"
                )));
            }
        }

        let resource = DummyResource(self.next_id);
        self.next_id += 1;
        self.created += 1;
        self.live.insert(resource, *class);
        log::trace!("DummyBackend: created resource {} ({class})", resource.0);
        Ok(resource)
    }

    fn destroy(&mut self, resource: DummyResource) {
        if self.live.remove(&resource).is_some() {
            self.destroyed += 1;
            log::trace!("DummyBackend: destroyed resource {}", resource.0);
        } else {
            log::warn!(
                "DummyBackend: destroy of unknown resource {}",
                resource.0
            );
        }
    }
}
