//! Resettable context for tests

use std::ops::Deref;
use std::sync::Arc;

use super::context::ContextState;
use super::{set_reflect_context, ReflectContext, ReflectModule};
use crate::config::WeaverConfig;

/// A [`ReflectContext`] that can be reset to its initial registrations
///
/// The snapshot is taken on creation. `reset` drops modules and hooks
/// registered since, and rebuilds every provider instance on next access.
pub struct TestingReflectContext {
    ctx: ReflectContext,
    snapshot: ContextState,
}

impl TestingReflectContext {
    /// Create a testing context with the core modules
    pub fn new() -> Self {
        Self::with_config(WeaverConfig::default())
    }

    /// Create a testing context with the core modules and `config`
    pub fn with_config(config: WeaverConfig) -> Self {
        let ctx = ReflectContext::with_config(config);
        let snapshot = ctx.snapshot();
        Self { ctx, snapshot }
    }

    /// Register test modules
    pub fn register_modules<I>(&self, modules: I) -> &Self
    where
        I: IntoIterator<Item = Arc<dyn ReflectModule>>,
    {
        self.ctx.register_modules(modules);
        self
    }

    /// Restore the initial registrations and drop every built instance
    pub fn reset(&self) {
        tracing::debug!(context = self.ctx.id(), "testing context reset");
        self.ctx.restore(self.snapshot.clone());
    }

    /// Underlying context handle
    pub fn context(&self) -> ReflectContext {
        self.ctx.clone()
    }
}

impl Default for TestingReflectContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestingReflectContext {
    type Target = ReflectContext;

    fn deref(&self) -> &ReflectContext {
        &self.ctx
    }
}

/// Create a testing context and install it as this thread's current context
pub fn configure_testing_context() -> TestingReflectContext {
    let testing = TestingReflectContext::new();
    set_reflect_context(testing.context());
    testing
}
