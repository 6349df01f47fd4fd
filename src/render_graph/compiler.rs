//! Compilation entry point: flatten, prune, schedule.

use glam::UVec2;

use crate::backend::types::BufferClass;
use crate::error::GraphResult;
use crate::render_graph::allocator::{Allocation, ClassId};
use crate::render_graph::description::GraphDescription;
use crate::render_graph::descriptor::BufferHandle;
use crate::render_graph::flatten::flatten;
use crate::render_graph::prune::prune;
use crate::render_graph::scheduler::{schedule, ScheduledPhase};
use crate::GraphConfig;

/// Result of compiling a [`GraphDescription`].
///
/// Holds only logical allocations. Turning them into physical resources is
/// the realizer's job, so a compiled schedule can be inspected and compared
/// without any backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSchedule {
    phases: Vec<ScheduledPhase>,
    /// Class and peak slot count, indexed by [`ClassId`].
    classes: Vec<(BufferClass, usize)>,
    buffer_allocations: Vec<Option<Allocation>>,
    resolution: UVec2,
}

impl CompiledSchedule {
    /// Phases in execution order.
    pub fn phases(&self) -> &[ScheduledPhase] {
        &self.phases
    }

    pub fn operation_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }

    /// Position of the named operation in execution order.
    pub fn position(&self, operation: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name == operation)
    }

    pub fn class(&self, id: ClassId) -> Option<BufferClass> {
        self.classes.get(id.index()).map(|(class, _)| *class)
    }

    /// Every class with its peak number of simultaneously live slots.
    pub fn peaks(&self) -> &[(BufferClass, usize)] {
        &self.classes
    }

    pub fn peak(&self, class: BufferClass) -> usize {
        self.classes
            .iter()
            .find(|(c, _)| *c == class)
            .map_or(0, |(_, peak)| *peak)
    }

    /// Physical resources the schedule needs in total.
    pub fn resource_count(&self) -> usize {
        self.classes.iter().map(|(_, peak)| peak).sum()
    }

    /// Allocation backing `buffer`, or `None` if the buffer was pruned or
    /// discarded.
    pub fn allocation(&self, buffer: BufferHandle) -> Option<Allocation> {
        self.buffer_allocations.get(buffer.index()).copied().flatten()
    }

    pub fn resolution(&self) -> UVec2 {
        self.resolution
    }
}

/// Compile a description into an ordered schedule with logical allocations.
///
/// Pure: the description is not modified and no resources are created.
pub fn compile<R, C>(
    description: &GraphDescription<R, C>,
    required: &[BufferHandle],
    config: &GraphConfig,
) -> GraphResult<CompiledSchedule> {
    for &buffer in required {
        description.buffer(buffer)?;
    }

    let flat = flatten(description)?;
    let selected = prune(description, &flat, required)?;
    let result = schedule(description, &flat, &selected, required, config)?;

    let classes = result.allocator.peaks();
    let compiled = CompiledSchedule {
        phases: result.phases,
        classes,
        buffer_allocations: result.buffer_allocations,
        resolution: config.resolution,
    };

    log::info!(
        "Compiled render graph: {} of {} operations, {} physical resources in {} classes",
        compiled.phases.len(),
        description.operations().len(),
        compiled.resource_count(),
        compiled.classes.len()
    );

    Ok(compiled)
}
