//! Reflection context arena

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{AnnotationsModule, ReflectModule};
use crate::annotation::AnnotationFactoryHook;
use crate::config::WeaverConfig;
use crate::error::{Result, WeavingError};
use crate::weaver::{JitWeaver, WeaverModule};

type ProviderFactory = Arc<dyn Fn(&ReflectContext) -> Arc<dyn Any + Send + Sync> + Send + Sync>;

static NEXT_CONTEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Lazily-built component of a context, keyed by its type
#[derive(Clone)]
pub struct ReflectProvider {
    type_id: TypeId,
    type_name: &'static str,
    factory: ProviderFactory,
}

impl ReflectProvider {
    /// Provide a `T` built by `factory` on first access
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&ReflectContext) -> T + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            factory: Arc::new(move |ctx: &ReflectContext| {
                Arc::new(factory(ctx)) as Arc<dyn Any + Send + Sync>
            }),
        }
    }

    /// Provided type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Provided type name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ReflectProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectProvider")
            .field("type", &self.type_name)
            .finish()
    }
}

/// Registered modules, providers and hooks (everything but built instances)
#[derive(Clone, Default)]
pub(crate) struct ContextState {
    modules: Vec<Arc<dyn ReflectModule>>,
    providers: FxHashMap<TypeId, ReflectProvider>,
    hooks: Vec<AnnotationFactoryHook>,
}

struct ContextInner {
    id: usize,
    config: WeaverConfig,
    state: RwLock<ContextState>,
    instances: RwLock<FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

/// Handle to a reflection context
///
/// Cloning shares the same arena.
#[derive(Clone)]
pub struct ReflectContext {
    inner: Arc<ContextInner>,
}

impl ReflectContext {
    /// Create a context with the core modules and the default configuration
    pub fn new() -> Self {
        Self::with_config(WeaverConfig::default())
    }

    /// Create a context with the core modules
    pub fn with_config(config: WeaverConfig) -> Self {
        let ctx = Self::empty(config);
        ctx.register_modules([
            Arc::new(AnnotationsModule) as Arc<dyn ReflectModule>,
            Arc::new(WeaverModule),
        ]);
        ctx
    }

    /// Create a context without any module
    pub fn empty(config: WeaverConfig) -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(context = id, "reflect context created");
        Self {
            inner: Arc::new(ContextInner {
                id,
                config,
                state: RwLock::new(ContextState::default()),
                instances: RwLock::new(FxHashMap::default()),
            }),
        }
    }

    /// Context id (unique per process)
    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// Configuration the context was created with
    pub fn config(&self) -> &WeaverConfig {
        &self.inner.config
    }

    /// Resolve a provided component, building it on first access
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let type_id = TypeId::of::<T>();
        if let Some(instance) = self.inner.instances.read().get(&type_id).cloned() {
            return downcast(instance);
        }

        let provider = self
            .inner
            .state
            .read()
            .providers
            .get(&type_id)
            .cloned()
            .ok_or(WeavingError::MissingProvider(type_name::<T>()))?;

        // No lock is held here: factories may resolve other providers.
        let built = (provider.factory)(self);
        let instance = self
            .inner
            .instances
            .write()
            .entry(type_id)
            .or_insert(built)
            .clone();
        downcast(instance)
    }

    /// Check if a provider for `T` is registered
    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        self.inner
            .state
            .read()
            .providers
            .contains_key(&TypeId::of::<T>())
    }

    /// Register modules; a module whose name is already registered is skipped
    pub fn register_modules<I>(&self, modules: I)
    where
        I: IntoIterator<Item = Arc<dyn ReflectModule>>,
    {
        let mut state = self.inner.state.write();
        for module in modules {
            if state.modules.iter().any(|m| m.name() == module.name()) {
                tracing::debug!(module = module.name(), "module already registered");
                continue;
            }
            for provider in module.providers() {
                self.inner.instances.write().remove(&provider.type_id);
                state.providers.insert(provider.type_id, provider);
            }
            for hook in module.hooks() {
                Self::insert_hook(&mut state.hooks, hook);
            }
            tracing::debug!(context = self.inner.id, module = module.name(), "module registered");
            state.modules.push(module);
        }
    }

    /// Check if a module with this name is registered
    pub fn has_module(&self, name: &str) -> bool {
        self.inner.state.read().modules.iter().any(|m| m.name() == name)
    }

    /// Add a single factory hook
    pub fn add_factory_hook(&self, hook: AnnotationFactoryHook) {
        Self::insert_hook(&mut self.inner.state.write().hooks, hook);
    }

    /// Factory hooks in run order
    pub fn factory_hooks(&self) -> Vec<AnnotationFactoryHook> {
        self.inner.state.read().hooks.clone()
    }

    /// The context's weaver
    pub fn weaver(&self) -> Result<Arc<JitWeaver>> {
        self.get::<JitWeaver>()
    }

    /// Weak handle, for components owned by the context itself
    pub fn downgrade(&self) -> WeakReflectContext {
        WeakReflectContext {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn snapshot(&self) -> ContextState {
        self.inner.state.read().clone()
    }

    /// Restore registrations and drop every built instance
    pub(crate) fn restore(&self, state: ContextState) {
        *self.inner.state.write() = state;
        self.inner.instances.write().clear();
    }

    fn insert_hook(hooks: &mut Vec<AnnotationFactoryHook>, hook: AnnotationFactoryHook) {
        // Stable: hooks of equal order keep registration order.
        let index = hooks.partition_point(|h| h.order() <= hook.order());
        hooks.insert(index, hook);
    }
}

impl Default for ReflectContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReflectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("ReflectContext")
            .field("id", &self.inner.id)
            .field(
                "modules",
                &state.modules.iter().map(|m| m.name().to_string()).collect::<Vec<_>>(),
            )
            .field("providers", &state.providers.len())
            .field("hooks", &state.hooks.len())
            .finish()
    }
}

fn downcast<T: Any + Send + Sync>(instance: Arc<dyn Any + Send + Sync>) -> Result<Arc<T>> {
    instance.downcast::<T>().map_err(|_| {
        WeavingError::InvalidState(format!("provider for {} built another type", type_name::<T>()))
            .into()
    })
}

/// Non-owning handle to a reflection context
#[derive(Clone)]
pub struct WeakReflectContext {
    inner: Weak<ContextInner>,
}

impl WeakReflectContext {
    /// Get the context back, if it is still alive
    pub fn upgrade(&self) -> Option<ReflectContext> {
        self.inner.upgrade().map(|inner| ReflectContext { inner })
    }
}

impl fmt::Debug for WeakReflectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakReflectContext")
    }
}

thread_local! {
    static CURRENT: RefCell<Option<ReflectContext>> = const { RefCell::new(None) };
}

/// Current context of this thread, created on first use
pub fn reflect_context() -> ReflectContext {
    CURRENT.with(|current| {
        current
            .borrow_mut()
            .get_or_insert_with(ReflectContext::new)
            .clone()
    })
}

/// Replace the current context of this thread, returning the previous one
pub fn set_reflect_context(ctx: ReflectContext) -> Option<ReflectContext> {
    CURRENT.with(|current| current.borrow_mut().replace(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationRegistry;
    use crate::class::ClassRegistry;
    use std::sync::atomic::AtomicUsize;

    struct Counter(usize);

    struct CounterModule {
        built: Arc<AtomicUsize>,
    }

    impl ReflectModule for CounterModule {
        fn name(&self) -> &str {
            "counter"
        }

        fn providers(&self) -> Vec<ReflectProvider> {
            let built = self.built.clone();
            vec![ReflectProvider::new(move |_: &ReflectContext| {
                Counter(built.fetch_add(1, Ordering::SeqCst))
            })]
        }
    }

    #[test]
    fn test_core_providers() {
        let ctx = ReflectContext::new();
        assert!(ctx.has::<AnnotationRegistry>());
        assert!(ctx.has::<ClassRegistry>());
        assert!(ctx.weaver().is_ok());
        assert!(ctx.has_module("annotations"));
    }

    #[test]
    fn test_provider_is_lazy_and_cached() {
        let ctx = ReflectContext::new();
        let built = Arc::new(AtomicUsize::new(0));
        ctx.register_modules([Arc::new(CounterModule { built: built.clone() }) as Arc<dyn ReflectModule>]);
        assert_eq!(built.load(Ordering::SeqCst), 0);

        let a = ctx.get::<Counter>().unwrap();
        let b = ctx.get::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.0, 0);
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_provider() {
        let ctx = ReflectContext::empty(WeaverConfig::default());
        let err = ctx.get::<AnnotationRegistry>().unwrap_err();
        assert!(err.is_weaving_error());
        assert!(err.to_string().contains("AnnotationRegistry"));
    }

    #[test]
    fn test_module_registered_once() {
        let ctx = ReflectContext::new();
        let hooks = ctx.factory_hooks().len();
        ctx.register_modules([Arc::new(WeaverModule) as Arc<dyn ReflectModule>]);
        assert_eq!(ctx.factory_hooks().len(), hooks);
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = ReflectContext::new();
        let b = ReflectContext::new();
        assert_ne!(a.id(), b.id());
        assert!(!Arc::ptr_eq(
            &a.get::<ClassRegistry>().unwrap(),
            &b.get::<ClassRegistry>().unwrap()
        ));
    }

    #[test]
    fn test_current_context() {
        let ctx = ReflectContext::new();
        set_reflect_context(ctx.clone());
        assert_eq!(reflect_context().id(), ctx.id());

        let weak = ctx.downgrade();
        assert!(weak.upgrade().is_some());
    }
}
