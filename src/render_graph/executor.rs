//! Render graph executor

use crate::render_graph::realizer::NamedOperator;

/// Replays the instantiated operators of a compiled schedule.
///
/// A frame runs in three sweeps over the operators in schedule order:
/// `prepare` on all, then `perform` on all, then `finalize` on all.
pub struct Executor<C = ()> {
    operators: Vec<NamedOperator<C>>,
    frames: u64,
}

impl<C> Executor<C> {
    pub fn new() -> Self {
        Self {
            operators: Vec::new(),
            frames: 0,
        }
    }

    /// Install a new operator list, disposing the current one first.
    pub fn install(&mut self, operators: Vec<NamedOperator<C>>) {
        self.dispose();
        log::debug!("Executor: installed {} operators", operators.len());
        self.operators = operators;
    }

    /// Run one frame.
    pub fn execute(&mut self, ctx: &mut C) {
        log::trace!(
            "Executor: frame {} over {} operators",
            self.frames,
            self.operators.len()
        );

        for (_, operator) in &mut self.operators {
            operator.prepare(ctx);
        }
        for (_, operator) in &mut self.operators {
            operator.perform(ctx);
        }
        for (_, operator) in &mut self.operators {
            operator.finalize(ctx);
        }

        self.frames += 1;
    }

    /// Dispose and drop every installed operator.
    pub fn dispose(&mut self) {
        for (name, mut operator) in self.operators.drain(..) {
            log::trace!("Executor: disposing '{name}'");
            operator.dispose();
        }
    }

    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.operators.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Frames executed since creation.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

impl<C> Default for Executor<C> {
    fn default() -> Self {
        Self::new()
    }
}
