//! Bridge table and its factory hook

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::annotation::{
    Annotation, AnnotationFactoryHook, AnnotationRef, AnnotationTarget, FactoryHook, HookContext,
};
use crate::class::Replacement;
use crate::error::{AspectError, Result};
use crate::reflect::ReflectModule;
use crate::value::Value;

static NEXT_MIXIN: AtomicUsize = AtomicUsize::new(1);

/// A decorator of another framework, driven by bridged annotations
pub trait ForeignDecorator: Send + Sync {
    /// Decorator name (for logs)
    fn name(&self) -> &str;

    /// Apply the decorator on `target` with translated arguments
    fn decorate(&self, target: &AnnotationTarget, args: &[Value]) -> Result<()>;
}

/// Translates source annotation arguments into target arguments
#[derive(Clone, Default)]
pub enum ArgsAdapter {
    /// Arguments are passed unchanged
    #[default]
    PassThrough,
    /// Exactly one argument, mapped to one argument
    Single(Arc<dyn Fn(Value) -> Value + Send + Sync>),
    /// Free-form mapping
    Map(Arc<dyn Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync>),
}

impl ArgsAdapter {
    /// Single-argument adapter
    pub fn single<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        ArgsAdapter::Single(Arc::new(f))
    }

    /// Free-form adapter
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        ArgsAdapter::Map(Arc::new(f))
    }

    /// Translate arguments of `source`
    pub fn translate(&self, source: &AnnotationRef, args: &[Value]) -> Result<Vec<Value>> {
        match self {
            ArgsAdapter::PassThrough => Ok(args.to_vec()),
            ArgsAdapter::Single(f) => match args {
                [arg] => Ok(vec![f(arg.clone())]),
                _ => Err(AspectError::BridgeArity {
                    annotation: source.to_string(),
                    got: args.len(),
                }
                .into()),
            },
            ArgsAdapter::Map(f) => f(args),
        }
    }
}

impl fmt::Debug for ArgsAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgsAdapter::PassThrough => "PassThrough",
            ArgsAdapter::Single(_) => "Single",
            ArgsAdapter::Map(_) => "Map",
        };
        f.write_str(name)
    }
}

/// Where a bridged annotation leads
#[derive(Clone)]
pub enum BridgeTarget {
    /// Another annotation, applied on the same target
    Annotation {
        /// Bridged annotation
        annotation: Annotation,
        /// Argument translation
        adapter: ArgsAdapter,
    },
    /// A foreign decorator
    Foreign {
        /// Decorator to drive
        decorator: Arc<dyn ForeignDecorator>,
        /// Argument translation
        adapter: ArgsAdapter,
    },
}

impl BridgeTarget {
    /// Bridge to an annotation, passing arguments through
    pub fn annotation(annotation: &Annotation) -> Self {
        Self::adapted(annotation, ArgsAdapter::PassThrough)
    }

    /// Bridge to an annotation through an adapter
    pub fn adapted(annotation: &Annotation, adapter: ArgsAdapter) -> Self {
        BridgeTarget::Annotation {
            annotation: annotation.clone(),
            adapter,
        }
    }

    /// Bridge to a foreign decorator, passing arguments through
    pub fn foreign(decorator: Arc<dyn ForeignDecorator>) -> Self {
        Self::foreign_adapted(decorator, ArgsAdapter::PassThrough)
    }

    /// Bridge to a foreign decorator through an adapter
    pub fn foreign_adapted(decorator: Arc<dyn ForeignDecorator>, adapter: ArgsAdapter) -> Self {
        BridgeTarget::Foreign { decorator, adapter }
    }

    fn adapter(&self) -> &ArgsAdapter {
        match self {
            BridgeTarget::Annotation { adapter, .. } | BridgeTarget::Foreign { adapter, .. } => adapter,
        }
    }
}

impl fmt::Debug for BridgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeTarget::Annotation { annotation, adapter } => f
                .debug_struct("Annotation")
                .field("annotation", &annotation.reference())
                .field("adapter", adapter)
                .finish(),
            BridgeTarget::Foreign { decorator, adapter } => f
                .debug_struct("Foreign")
                .field("decorator", &decorator.name())
                .field("adapter", adapter)
                .finish(),
        }
    }
}

type BridgeTable = FxHashMap<AnnotationRef, Vec<BridgeTarget>>;

/// Bridge table builder
#[derive(Debug)]
pub struct AnnotationMixin {
    name: String,
    table: BridgeTable,
}

impl AnnotationMixin {
    /// Create an empty mixin with a generated name
    pub fn new() -> Self {
        let n = NEXT_MIXIN.fetch_add(1, Ordering::Relaxed);
        Self::named(format!("annotation-mixin#{}", n))
    }

    /// Create an empty mixin; modules of the same name register once
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: FxHashMap::default(),
        }
    }

    /// Mixin name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bridge `source` to `target`; a source may have several targets
    pub fn bridge(mut self, source: &Annotation, target: BridgeTarget) -> Self {
        self.table
            .entry(source.reference().clone())
            .or_default()
            .push(target);
        self
    }

    /// Targets bridged from `source`
    pub fn targets(&self, source: &Annotation) -> &[BridgeTarget] {
        self.table
            .get(source.reference())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Module installing the bridge hook on a context
    pub fn into_module(self) -> Arc<dyn ReflectModule> {
        Arc::new(MixinModule {
            name: self.name,
            table: Arc::new(self.table),
        })
    }
}

impl Default for AnnotationMixin {
    fn default() -> Self {
        Self::new()
    }
}

/// Module carrying a mixin's bridge hook
pub struct MixinModule {
    name: String,
    table: Arc<BridgeTable>,
}

impl ReflectModule for MixinModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn hooks(&self) -> Vec<AnnotationFactoryHook> {
        vec![Arc::new(MixinHook {
            name: self.name.clone(),
            table: self.table.clone(),
        })]
    }
}

struct MixinHook {
    name: String,
    table: Arc<BridgeTable>,
}

impl FactoryHook for MixinHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        -50
    }

    fn on_annotation(&self, hook: &HookContext<'_>) -> Result<Vec<Replacement>> {
        let source = hook.annotation().reference();
        let Some(targets) = self.table.get(source) else {
            return Ok(Vec::new());
        };

        for target in targets {
            let args = target.adapter().translate(source, hook.annotation().args())?;
            match target {
                BridgeTarget::Annotation { annotation, .. } => {
                    tracing::debug!(mixin = %self.name, from = %source, to = %annotation, target = %hook.target(), "bridging annotation");
                    hook.apply(&annotation.apply(args))?;
                }
                BridgeTarget::Foreign { decorator, .. } => {
                    tracing::debug!(mixin = %self.name, from = %source, to = decorator.name(), target = %hook.target(), "bridging to foreign decorator");
                    decorator.decorate(hook.target(), &args)?;
                }
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationFactory;
    use crate::error::Error;

    #[test]
    fn test_single_adapter_arity() {
        let get = AnnotationFactory::new("http").create("Get");
        let adapter = ArgsAdapter::single(|v: Value| v);

        assert_eq!(
            adapter.translate(get.reference(), &[Value::from("/users")]).unwrap(),
            vec![Value::from("/users")]
        );
        let err = adapter.translate(get.reference(), &[]).unwrap_err();
        assert_eq!(
            err,
            Error::Aspect(AspectError::BridgeArity {
                annotation: "@http:Get".to_string(),
                got: 0
            })
        );
        assert!(err.to_string().contains("@http:Get"));
    }

    #[test]
    fn test_map_adapter() {
        let get = AnnotationFactory::new("http").create("Get");
        let adapter = ArgsAdapter::map(|args: &[Value]| Ok(vec![Value::from(args.len())]));
        assert_eq!(
            adapter.translate(get.reference(), &[Value::Unit, Value::Unit]).unwrap(),
            vec![Value::Int(2)]
        );
    }

    #[test]
    fn test_bridge_table() {
        let factory = AnnotationFactory::new("http");
        let get = factory.create("Get");
        let route = AnnotationFactory::new("router").create("Route");

        let mixin = AnnotationMixin::named("http-router")
            .bridge(&get, BridgeTarget::annotation(&route))
            .bridge(&get, BridgeTarget::adapted(&route, ArgsAdapter::single(|v: Value| v)));

        assert_eq!(mixin.name(), "http-router");
        assert_eq!(mixin.targets(&get).len(), 2);
        assert!(mixin.targets(&route).is_empty());
    }
}
