//! Render graph façade: compile, realize and run.

use crate::backend::traits::ResourceFactory;
use crate::error::{GraphError, GraphResult};
use crate::render_graph::compiler::{compile, CompiledSchedule};
use crate::render_graph::description::GraphDescription;
use crate::render_graph::descriptor::BufferHandle;
use crate::render_graph::executor::Executor;
use crate::render_graph::realizer::ResourceRealizer;
use crate::GraphConfig;

/// A compiled render graph bound to a resource factory.
///
/// `setup` may be called any number of times. Each call recompiles from
/// scratch, keeps physical resources whose class and count are still needed,
/// and replaces the operators.
pub struct RenderGraph<F: ResourceFactory, C = ()> {
    factory: F,
    config: GraphConfig,
    realizer: ResourceRealizer<F::Resource>,
    executor: Executor<C>,
    schedule: Option<CompiledSchedule>,
}

impl<F: ResourceFactory, C> RenderGraph<F, C> {
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, GraphConfig::default())
    }

    pub fn with_config(factory: F, config: GraphConfig) -> Self {
        Self {
            factory,
            config,
            realizer: ResourceRealizer::new(),
            executor: Executor::new(),
            schedule: None,
        }
    }

    /// Compile `description` for the `required` buffers and get ready to
    /// render.
    ///
    /// A compilation error leaves the previous schedule, resources and
    /// operators untouched. A resource creation error happens after the old
    /// operators were disposed and leaves the graph without a schedule.
    pub fn setup(
        &mut self,
        description: &GraphDescription<F::Resource, C>,
        required: &[BufferHandle],
    ) -> GraphResult<()> {
        let compiled = compile(description, required, &self.config)?;

        self.executor.dispose();
        self.schedule = None;

        self.realizer.reconcile(&mut self.factory, &compiled)?;
        let operators = self.realizer.instantiate(description, &compiled)?;
        self.executor.install(operators);
        self.schedule = Some(compiled);

        Ok(())
    }

    /// Run one frame.
    pub fn render(&mut self, ctx: &mut C) -> GraphResult<()> {
        if self.schedule.is_none() {
            log::warn!("RenderGraph: render called before a successful setup");
            return Err(GraphError::NotCompiled);
        }
        self.executor.execute(ctx);
        Ok(())
    }

    /// Dispose all operators and destroy all physical resources.
    pub fn dispose(&mut self) {
        self.executor.dispose();
        self.realizer.dispose(&mut self.factory);
        if self.schedule.take().is_some() {
            log::debug!("RenderGraph: disposed");
        }
    }

    /// Record a new output resolution. Returns `true` if it changed, in
    /// which case relative-size buffers need a new `setup`.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let resolution = glam::UVec2::new(width, height).max(glam::UVec2::ONE);
        if resolution == self.config.resolution {
            return false;
        }
        log::info!(
            "RenderGraph: resolution {}x{} -> {}x{}",
            self.config.resolution.x,
            self.config.resolution.y,
            resolution.x,
            resolution.y
        );
        self.config.resolution = resolution;
        true
    }

    /// The current schedule, if `setup` succeeded.
    pub fn schedule(&self) -> Option<&CompiledSchedule> {
        self.schedule.as_ref()
    }

    pub fn is_compiled(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn realizer(&self) -> &ResourceRealizer<F::Resource> {
        &self.realizer
    }

    pub fn executor(&self) -> &Executor<C> {
        &self.executor
    }
}

impl<F: ResourceFactory, C> Drop for RenderGraph<F, C> {
    fn drop(&mut self) {
        self.dispose();
    }
}
