//! Logical slot allocation per buffer class.
//!
//! The allocator never touches physical resources. It hands out `(class,
//! slot)` pairs and remembers how many slots each class ever needed at once;
//! the realizer later turns those peaks into real resources.

use std::collections::HashMap;

use crate::backend::types::BufferClass;
use crate::error::{GraphError, GraphResult};

/// Index of a buffer class within one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One logical slot. Equal allocations denote the same physical resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Allocation {
    pub class: ClassId,
    pub slot: u32,
}

/// Slot arena of a single class.
#[derive(Debug, Default)]
struct SlotPool {
    /// Live flag per minted slot. The slot count is the peak usage.
    live: Vec<bool>,
    /// Released slots, reused last-in first-out.
    free: Vec<u32>,
}

impl SlotPool {
    fn acquire(&mut self) -> u32 {
        if let Some(slot) = self.free.pop() {
            self.live[slot as usize] = true;
            slot
        } else {
            self.live.push(true);
            (self.live.len() - 1) as u32
        }
    }

    fn release(&mut self, slot: u32) -> bool {
        match self.live.get_mut(slot as usize) {
            Some(live) if *live => {
                *live = false;
                self.free.push(slot);
                true
            }
            _ => false,
        }
    }

    fn peak(&self) -> usize {
        self.live.len()
    }

    fn live_count(&self) -> usize {
        self.live.len() - self.free.len()
    }
}

/// Per-class free-list allocator.
#[derive(Debug, Default)]
pub struct BufferAllocator {
    ids: HashMap<BufferClass, ClassId>,
    classes: Vec<BufferClass>,
    pools: Vec<SlotPool>,
}

impl BufferAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Class id for `class`, registering the class on first sight.
    pub fn class_id(&mut self, class: BufferClass) -> ClassId {
        if let Some(&id) = self.ids.get(&class) {
            return id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.ids.insert(class, id);
        self.classes.push(class);
        self.pools.push(SlotPool::default());
        id
    }

    pub fn acquire(&mut self, class: ClassId) -> Allocation {
        let slot = self.pools[class.index()].acquire();
        log::trace!(
            "Allocator: acquired slot {slot} of class {}",
            self.classes[class.index()]
        );
        Allocation { class, slot }
    }

    pub fn release(&mut self, allocation: Allocation) -> GraphResult<()> {
        let released = self
            .pools
            .get_mut(allocation.class.index())
            .is_some_and(|pool| pool.release(allocation.slot));
        if !released {
            return Err(GraphError::AllocatorInvariant(format!(
                "release of unallocated slot {} of class {}",
                allocation.slot,
                allocation.class.index()
            )));
        }
        log::trace!(
            "Allocator: released slot {} of class {}",
            allocation.slot,
            self.classes[allocation.class.index()]
        );
        Ok(())
    }

    /// Number of released slots ready for reuse.
    pub fn free_count(&self, class: ClassId) -> usize {
        self.pools[class.index()].free.len()
    }

    pub fn live_count(&self, class: ClassId) -> usize {
        self.pools[class.index()].live_count()
    }

    /// Highest number of slots of `class` alive at the same time.
    pub fn peak(&self, class: ClassId) -> usize {
        self.pools[class.index()].peak()
    }

    pub fn class(&self, id: ClassId) -> BufferClass {
        self.classes[id.index()]
    }

    /// All classes with their peak usage, in discovery order.
    pub fn peaks(&self) -> Vec<(BufferClass, usize)> {
        self.classes
            .iter()
            .zip(&self.pools)
            .map(|(class, pool)| (*class, pool.peak()))
            .collect()
    }
}
