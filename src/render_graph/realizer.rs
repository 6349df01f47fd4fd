//! Physical resources behind a compiled schedule.
//!
//! The realizer owns every resource created through the factory. Resources
//! are grouped per [`BufferClass`]; a recompilation only creates or destroys
//! the difference between the old and new slot counts, so resources of
//! unchanged classes keep their identity across `setup` calls.

use std::collections::HashMap;

use crate::backend::traits::ResourceFactory;
use crate::backend::types::BufferClass;
use crate::error::{GraphError, GraphResult};
use crate::render_graph::allocator::Allocation;
use crate::render_graph::compiler::CompiledSchedule;
use crate::render_graph::description::GraphDescription;
use crate::render_graph::operation::{Operator, Port, ResolvedPorts};
use crate::render_graph::scheduler::{PortAllocation, ScheduledPhase};

/// An instantiated operator together with the name of its operation.
pub type NamedOperator<C> = (String, Box<dyn Operator<C>>);

pub struct ResourceRealizer<R> {
    resources: HashMap<BufferClass, Vec<R>>,
}

impl<R: Clone + std::fmt::Debug> ResourceRealizer<R> {
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }

    /// Bring the resource pools in line with the peaks of `schedule`.
    pub fn reconcile<F>(&mut self, factory: &mut F, schedule: &CompiledSchedule) -> GraphResult<()>
    where
        F: ResourceFactory<Resource = R>,
    {
        let mut stale: Vec<BufferClass> = self
            .resources
            .keys()
            .filter(|class| schedule.peak(**class) == 0)
            .copied()
            .collect();
        stale.sort();
        for class in stale {
            if let Some(pool) = self.resources.remove(&class) {
                log::debug!("Realizer: dropping all {} resources of {class}", pool.len());
                for resource in pool.into_iter().rev() {
                    factory.destroy(resource);
                }
            }
        }

        let mut created = 0;
        let mut destroyed = 0;
        for &(class, peak) in schedule.peaks() {
            let pool = self.resources.entry(class).or_default();
            while pool.len() > peak {
                if let Some(resource) = pool.pop() {
                    log::trace!("Realizer: destroying surplus {resource:?} of {class}");
                    factory.destroy(resource);
                    destroyed += 1;
                }
            }
            while pool.len() < peak {
                let resource = factory.create(&class)?;
                log::trace!("Realizer: created {resource:?} for {class}");
                pool.push(resource);
                created += 1;
            }
        }
        self.resources.retain(|_, pool| !pool.is_empty());

        log::debug!(
            "Realizer: {created} created, {destroyed} destroyed, {} alive",
            self.resource_count()
        );
        Ok(())
    }

    /// Physical resource backing a logical allocation.
    pub fn resolve(&self, schedule: &CompiledSchedule, allocation: Allocation) -> GraphResult<R> {
        schedule
            .class(allocation.class)
            .and_then(|class| self.resources.get(&class))
            .and_then(|pool| pool.get(allocation.slot as usize))
            .cloned()
            .ok_or_else(|| {
                GraphError::AllocatorInvariant(format!(
                    "no physical resource for slot {} of class {}",
                    allocation.slot,
                    allocation.class.index()
                ))
            })
    }

    /// Resolve every declared port of the phase's operation.
    pub fn resolve_ports<C>(
        &self,
        description: &GraphDescription<R, C>,
        schedule: &CompiledSchedule,
        phase: &ScheduledPhase,
    ) -> GraphResult<ResolvedPorts<R>> {
        let op = &description.operations()[phase.operation];
        Ok(ResolvedPorts {
            inputs: self.resolve_direction(schedule, op.input_ports(), &phase.inputs)?,
            outputs: self.resolve_direction(schedule, op.output_ports(), &phase.outputs)?,
        })
    }

    fn resolve_direction(
        &self,
        schedule: &CompiledSchedule,
        ports: &[Port],
        allocations: &[PortAllocation],
    ) -> GraphResult<Vec<(String, Option<R>)>> {
        ports
            .iter()
            .enumerate()
            .map(|(index, port)| {
                let allocation = allocations
                    .iter()
                    .find(|p| p.port == index)
                    .and_then(|p| p.allocation);
                let resource = match allocation {
                    Some(allocation) => Some(self.resolve(schedule, allocation)?),
                    None => None,
                };
                Ok((port.name.clone(), resource))
            })
            .collect()
    }

    /// Build one operator per phase, in execution order.
    pub fn instantiate<C>(
        &self,
        description: &GraphDescription<R, C>,
        schedule: &CompiledSchedule,
    ) -> GraphResult<Vec<NamedOperator<C>>> {
        schedule
            .phases()
            .iter()
            .map(|phase| {
                let ports = self.resolve_ports(description, schedule, phase)?;
                let op = &description.operations()[phase.operation];
                Ok((phase.name.clone(), op.instantiate(&ports)))
            })
            .collect()
    }

    /// Destroy every resource.
    pub fn dispose<F>(&mut self, factory: &mut F)
    where
        F: ResourceFactory<Resource = R>,
    {
        let mut classes: Vec<BufferClass> = self.resources.keys().copied().collect();
        classes.sort();
        for class in classes {
            if let Some(pool) = self.resources.remove(&class) {
                for resource in pool.into_iter().rev() {
                    factory.destroy(resource);
                }
            }
        }
    }

    pub fn resource_count(&self) -> usize {
        self.resources.values().map(Vec::len).sum()
    }

    /// Resources of one class, in slot order.
    pub fn resources_of(&self, class: &BufferClass) -> &[R] {
        self.resources.get(class).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<R: Clone + std::fmt::Debug> Default for ResourceRealizer<R> {
    fn default() -> Self {
        Self::new()
    }
}
