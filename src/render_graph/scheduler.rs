//! Greedy back-to-front scheduling with transient buffer reuse.
//!
//! The schedule is built from the last operation to the first. At every step
//! the scheduler only considers operations whose outputs are "ripe": every
//! consumer of those outputs has already been placed (later in execution
//! order), so nothing can still need the buffer after the producer runs.
//! Among ripe operations it picks the one that grows the peak allocation the
//! least.
//!
//! Walking backwards makes allocation lifetimes fall out naturally: a buffer
//! is allocated when its last reader is scheduled and released when its
//! producer is, so a released slot is immediately reusable by any buffer that
//! is live strictly earlier in execution order.

use crate::error::{GraphError, GraphResult};
use crate::render_graph::allocator::{Allocation, BufferAllocator, ClassId};
use crate::render_graph::description::GraphDescription;
use crate::render_graph::descriptor::BufferHandle;
use crate::render_graph::flatten::FlatOperation;
use crate::GraphConfig;

/// One resolved port of a scheduled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortAllocation {
    /// Port index in the operation descriptor.
    pub port: usize,
    pub buffer: BufferHandle,
    /// `None` for an optional output nobody consumes.
    pub allocation: Option<Allocation>,
}

/// An operation placed in the schedule with all of its buffers resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPhase {
    /// Index in the description's operation list.
    pub operation: usize,
    pub name: String,
    pub inputs: Vec<PortAllocation>,
    pub outputs: Vec<PortAllocation>,
}

impl ScheduledPhase {
    pub fn input(&self, buffer: BufferHandle) -> Option<Allocation> {
        self.inputs
            .iter()
            .find(|p| p.buffer == buffer)
            .and_then(|p| p.allocation)
    }

    pub fn output(&self, buffer: BufferHandle) -> Option<Allocation> {
        self.outputs
            .iter()
            .find(|p| p.buffer == buffer)
            .and_then(|p| p.allocation)
    }
}

/// Result of one scheduling pass.
#[derive(Debug)]
pub(crate) struct Schedule {
    /// Phases in execution order.
    pub phases: Vec<ScheduledPhase>,
    /// Allocation of every buffer that took part in the schedule.
    pub buffer_allocations: Vec<Option<Allocation>>,
    pub allocator: BufferAllocator,
}

#[derive(Debug, Clone, Copy)]
struct Needed {
    uses: u32,
    allocation: Allocation,
}

/// Decisions for one candidate, computed without touching allocator state.
#[derive(Debug)]
struct Plan {
    cost: i64,
    /// Bindings that will be applied in place.
    in_place: Vec<(usize, usize)>,
}

struct Scheduler<'a, 'd, R, C> {
    description: &'d GraphDescription<R, C>,
    operations: &'a [FlatOperation<'d>],
    config: &'a GraphConfig,
    allocator: BufferAllocator,
    class_of: Vec<Option<ClassId>>,
    cost_of: Vec<u64>,
    max_use: Vec<u32>,
    needed: Vec<Option<Needed>>,
    needed_count: usize,
    buffer_allocations: Vec<Option<Allocation>>,
}

/// Order the selected operations and assign logical allocations.
pub(crate) fn schedule<R, C>(
    description: &GraphDescription<R, C>,
    operations: &[FlatOperation<'_>],
    selected: &[usize],
    required: &[BufferHandle],
    config: &GraphConfig,
) -> GraphResult<Schedule> {
    let buffer_count = description.buffers().len();
    let mut scheduler = Scheduler {
        description,
        operations,
        config,
        allocator: BufferAllocator::new(),
        class_of: vec![None; buffer_count],
        cost_of: vec![0; buffer_count],
        max_use: vec![0; buffer_count],
        needed: vec![None; buffer_count],
        needed_count: 0,
        buffer_allocations: vec![None; buffer_count],
    };

    let mut required_unique: Vec<BufferHandle> = Vec::with_capacity(required.len());
    for &buffer in required {
        if !required_unique.contains(&buffer) {
            required_unique.push(buffer);
        }
    }

    for &buffer in &required_unique {
        scheduler.register(buffer)?;
        // The presenter counts as one more consumer.
        scheduler.max_use[buffer.index()] += 1;
    }
    for &index in selected {
        let op = &operations[index];
        for &buffer in op.outputs.iter().chain(&op.inputs) {
            scheduler.register(buffer)?;
        }
        for input in &op.inputs {
            scheduler.max_use[input.index()] += 1;
        }
    }
    for &index in selected {
        scheduler.check_bindings(&operations[index])?;
    }

    for &buffer in &required_unique {
        let allocation = scheduler.acquire(buffer);
        scheduler.push_needed(buffer, allocation);
    }

    let mut pending: Vec<usize> = selected.to_vec();
    let mut phases = Vec::with_capacity(selected.len());

    while scheduler.needed_count > 0 {
        let mut best: Option<(usize, Plan)> = None;
        for (position, &index) in pending.iter().enumerate() {
            let op = &operations[index];
            if !scheduler.is_ready(op) {
                continue;
            }
            let plan = scheduler.plan(op);
            log::trace!("Scheduler: candidate '{}' costs {}", op.name, plan.cost);
            // Strict comparison keeps the earliest declared on ties.
            if best.as_ref().map_or(true, |(_, b)| plan.cost < b.cost) {
                best = Some((position, plan));
            }
        }

        let Some((position, plan)) = best else {
            return Err(scheduler.stalled(&pending));
        };

        let index = pending.remove(position);
        let phase = scheduler.materialize(&operations[index], &plan)?;
        log::debug!(
            "Scheduler: placed '{}' (cost {}, {} in-place)",
            phase.name,
            plan.cost,
            plan.in_place.len()
        );
        phases.push(phase);
    }

    if !pending.is_empty() {
        return Err(GraphError::AllocatorInvariant(format!(
            "{} selected operations were never scheduled",
            pending.len()
        )));
    }

    phases.reverse();

    Ok(Schedule {
        phases,
        buffer_allocations: scheduler.buffer_allocations,
        allocator: scheduler.allocator,
    })
}

impl<'a, 'd, R, C> Scheduler<'a, 'd, R, C> {
    fn register(&mut self, buffer: BufferHandle) -> GraphResult<()> {
        if self.class_of[buffer.index()].is_some() {
            return Ok(());
        }
        let class = self.description.buffer(buffer)?.class(self.config.resolution);
        self.class_of[buffer.index()] = Some(self.allocator.class_id(class));
        self.cost_of[buffer.index()] = class.cost();
        Ok(())
    }

    fn class(&self, buffer: BufferHandle) -> ClassId {
        // Every buffer reaching the scheduler was registered up front.
        self.class_of[buffer.index()].unwrap_or(ClassId(0))
    }

    /// In-place bindings only make sense between mergeable buffers.
    fn check_bindings(&self, op: &FlatOperation<'_>) -> GraphResult<()> {
        for &(input, output) in &op.bindings {
            let (input, output) = (op.inputs[input], op.outputs[output]);
            if self.class(input) != self.class(output) {
                return Err(GraphError::malformed(
                    op.name,
                    format!(
                        "binding between '{}' and '{}' which cannot share storage",
                        self.description.buffer_name(input),
                        self.description.buffer_name(output)
                    ),
                ));
            }
        }
        Ok(())
    }

    fn acquire(&mut self, buffer: BufferHandle) -> Allocation {
        let allocation = self.allocator.acquire(self.class(buffer));
        self.buffer_allocations[buffer.index()] = Some(allocation);
        allocation
    }

    fn push_needed(&mut self, buffer: BufferHandle, allocation: Allocation) {
        self.needed[buffer.index()] = Some(Needed {
            uses: 1,
            allocation,
        });
        self.needed_count += 1;
        self.buffer_allocations[buffer.index()] = Some(allocation);
    }

    fn is_discarded(&self, op: &FlatOperation<'_>, output: usize) -> bool {
        op.optional[output] && self.max_use[op.outputs[output].index()] == 0
    }

    /// Every consumer of every output has been placed already.
    fn is_ready(&self, op: &FlatOperation<'_>) -> bool {
        op.outputs.iter().enumerate().all(|(k, &buffer)| {
            let max_use = self.max_use[buffer.index()];
            if max_use == 0 {
                return op.optional[k];
            }
            matches!(self.needed[buffer.index()], Some(n) if n.uses == max_use)
        })
    }

    fn plan(&self, op: &FlatOperation<'_>) -> Plan {
        let in_place: Vec<(usize, usize)> = op
            .bindings
            .iter()
            .copied()
            .filter(|&(input, output)| {
                !self.is_discarded(op, output) && self.needed[op.inputs[input].index()].is_none()
            })
            .collect();

        // Fresh allocations per class, in first-seen order.
        let mut fresh: Vec<(ClassId, usize, u64)> = Vec::new();
        let mut live_delta: i64 = 0;

        for (i, &buffer) in op.inputs.iter().enumerate() {
            if in_place.iter().any(|&(input, _)| input == i) {
                continue;
            }
            if self.needed[buffer.index()].is_some() {
                continue;
            }
            let class = self.class(buffer);
            let cost = self.cost_of[buffer.index()];
            match fresh.iter_mut().find(|(c, _, _)| *c == class) {
                Some(entry) => entry.1 += 1,
                None => fresh.push((class, 1, cost)),
            }
            live_delta = live_delta.saturating_add(signed(cost));
        }

        for (k, &buffer) in op.outputs.iter().enumerate() {
            if self.is_discarded(op, k) || in_place.iter().any(|&(_, output)| output == k) {
                continue;
            }
            live_delta = live_delta.saturating_sub(signed(self.cost_of[buffer.index()]));
        }

        let growth = fresh.iter().fold(0i64, |total, &(class, count, cost)| {
            let minted = count.saturating_sub(self.allocator.free_count(class));
            total.saturating_add(signed(cost).saturating_mul(signed(minted as u64)))
        });

        Plan {
            cost: self
                .config
                .capacity_weight
                .saturating_mul(growth)
                .saturating_add(self.config.count_weight.saturating_mul(live_delta)),
            in_place,
        }
    }

    fn materialize(&mut self, op: &FlatOperation<'_>, plan: &Plan) -> GraphResult<ScheduledPhase> {
        let mut outputs = Vec::with_capacity(op.outputs.len());
        for (k, &buffer) in op.outputs.iter().enumerate() {
            let allocation = if self.is_discarded(op, k) {
                None
            } else {
                let needed = self.needed[buffer.index()].take().ok_or_else(|| {
                    GraphError::AllocatorInvariant(format!(
                        "output '{}' of '{}' was not needed",
                        self.description.buffer_name(buffer),
                        op.name
                    ))
                })?;
                self.needed_count -= 1;
                if needed.uses != self.max_use[buffer.index()] {
                    return Err(GraphError::AllocatorInvariant(format!(
                        "output '{}' of '{}' produced with {} of {} consumers placed",
                        self.description.buffer_name(buffer),
                        op.name,
                        needed.uses,
                        self.max_use[buffer.index()]
                    )));
                }
                Some(needed.allocation)
            };
            outputs.push(PortAllocation {
                port: op.output_ports[k],
                buffer,
                allocation,
            });
        }

        let mut inputs = Vec::with_capacity(op.inputs.len());
        for (i, &buffer) in op.inputs.iter().enumerate() {
            let bound = plan
                .in_place
                .iter()
                .find(|&&(input, _)| input == i)
                .and_then(|&(_, output)| outputs[output].allocation);

            let allocation = if let Some(allocation) = bound {
                self.push_needed(buffer, allocation);
                allocation
            } else if let Some(needed) = self.needed[buffer.index()].as_mut() {
                needed.uses += 1;
                if needed.uses > self.max_use[buffer.index()] {
                    return Err(GraphError::AllocatorInvariant(format!(
                        "buffer '{}' used more often than it has consumers",
                        self.description.buffer_name(buffer)
                    )));
                }
                needed.allocation
            } else {
                let allocation = self.acquire(buffer);
                self.push_needed(buffer, allocation);
                allocation
            };

            inputs.push(PortAllocation {
                port: op.input_ports[i],
                buffer,
                allocation: Some(allocation),
            });
        }

        for (k, output) in outputs.iter().enumerate() {
            let kept_alive = plan.in_place.iter().any(|&(_, o)| o == k);
            if let (Some(allocation), false) = (output.allocation, kept_alive) {
                self.allocator.release(allocation)?;
            }
        }

        Ok(ScheduledPhase {
            operation: op.index,
            name: op.name.to_string(),
            inputs,
            outputs,
        })
    }

    fn stalled(&self, pending: &[usize]) -> GraphError {
        let buffers = self
            .needed
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.map(|_| i))
            .map(|i| self.description.buffer_name(BufferHandle::new(i)).to_string())
            .collect();
        let operations = pending
            .iter()
            .map(|&index| self.operations[index].name.to_string())
            .collect();
        GraphError::Unrealizable {
            buffers,
            operations,
        }
    }
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
