//! Annotation factory and factory hooks
//!
//! [`AnnotationFactory`] creates annotations of one group. Applying an
//! annotation while a class is defined runs every [`FactoryHook`]
//! registered on the reflection context; a hook may hand back
//! [`Replacement`]s that are installed in the class's member slots. The
//! weaver and the annotation mixin are both factory hooks.

use std::sync::Arc;

use super::{
    Annotation, AnnotationApplication, AnnotationContext, AnnotationKind, AnnotationRef,
    AnnotationRegistry, AnnotationStub, AnnotationTarget,
};
use crate::class::{Class, Replacement};
use crate::error::{AspectError, Error, Result, WeavingError};
use crate::reflect::ReflectContext;
use crate::value::Value;

/// Creates annotations belonging to one group
#[derive(Debug, Clone)]
pub struct AnnotationFactory {
    group: Arc<str>,
}

impl AnnotationFactory {
    /// Create a factory for `group`
    pub fn new(group: impl AsRef<str>) -> Self {
        Self {
            group: Arc::from(group.as_ref()),
        }
    }

    /// Factory group
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Create an annotation placeable on any kind of element
    pub fn create(&self, name: &str) -> Annotation {
        self.create_with_kinds(&[], name)
    }

    /// Create an annotation declaring the kinds it is meant for
    ///
    /// Declared kinds are informative; placement is validated by aspects.
    pub fn create_with_kinds(&self, kinds: &[AnnotationKind], name: &str) -> Annotation {
        Annotation::new(AnnotationRef::new(&*self.group, name), kinds.to_vec(), None)
    }

    /// Create an annotation whose arguments go through `stub` when applied
    pub fn create_with_stub<F>(&self, kinds: &[AnnotationKind], name: &str, stub: F) -> Annotation
    where
        F: Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        let stub: AnnotationStub = Arc::new(stub);
        Annotation::new(
            AnnotationRef::new(&*self.group, name),
            kinds.to_vec(),
            Some(stub),
        )
    }
}

/// Shared factory hook handle
pub type AnnotationFactoryHook = Arc<dyn FactoryHook>;

/// Callback run on every annotation application
pub trait FactoryHook: Send + Sync {
    /// Hook name (for logs)
    fn name(&self) -> &str;

    /// Hooks run in ascending order
    fn order(&self) -> i32 {
        0
    }

    /// Called once per recorded annotation context
    fn on_annotation(&self, hook: &HookContext<'_>) -> Result<Vec<Replacement>>;

    /// Called once every annotation of a class has been applied
    fn on_class_defined(&self, _ctx: &ReflectContext, _class: &Class) -> Result<()> {
        Ok(())
    }

    /// Called when a definition fails and its class is dropped
    fn on_class_discarded(&self, _ctx: &ReflectContext, _class: &Class) {}
}

/// What a [`FactoryHook`] sees of an annotation application
pub struct HookContext<'a> {
    ctx: &'a ReflectContext,
    class: &'a Class,
    annotation: &'a AnnotationContext,
}

impl<'a> HookContext<'a> {
    /// Reflection context the class is defined against
    pub fn context(&self) -> &ReflectContext {
        self.ctx
    }

    /// Class being defined
    pub fn class(&self) -> &Class {
        self.class
    }

    /// Annotated target
    pub fn target(&self) -> &AnnotationTarget {
        self.annotation.target()
    }

    /// The recorded annotation context
    pub fn annotation(&self) -> &AnnotationContext {
        self.annotation
    }

    /// Apply another annotation on the same target
    pub fn apply(&self, application: &AnnotationApplication) -> Result<()> {
        apply_annotation(self.ctx, self.class, self.annotation.target(), application)
    }
}

/// Apply one annotation on a target of a class being defined
pub(crate) fn apply_annotation(
    ctx: &ReflectContext,
    class: &Class,
    target: &AnnotationTarget,
    application: &AnnotationApplication,
) -> Result<()> {
    let annotation = application.annotation();
    let args = annotation
        .normalize_args(application.args())
        .map_err(|err| match err {
            Error::Aspect(_) => err,
            other => AspectError::InvalidArguments {
                annotation: annotation.to_string(),
                reason: other.to_string(),
            }
            .into(),
        })?;

    let registry = ctx.get::<AnnotationRegistry>()?;
    let context = AnnotationContext::new(target.clone(), annotation.clone(), args);
    if !registry.register(context.clone()) {
        tracing::trace!(annotation = %annotation, target = %target, "annotation already applied");
        return Ok(());
    }
    tracing::debug!(annotation = %annotation, target = %target, "annotation applied");

    let hook_ctx = HookContext {
        ctx,
        class,
        annotation: &context,
    };
    for hook in ctx.factory_hooks() {
        for replacement in hook.on_annotation(&hook_ctx)? {
            if !class.install(&replacement.key, replacement.member) {
                return Err(WeavingError::UnknownMember {
                    class: class.name().to_string(),
                    member: replacement.key.to_string(),
                }
                .into());
            }
            tracing::trace!(hook = hook.name(), member = %replacement.key, "member replaced");
        }
    }
    Ok(())
}
