//! Annotation registry
//!
//! Records every [`AnnotationContext`] created while classes are defined,
//! indexed both by target and by annotation.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{AnnotationContext, AnnotationRef, AnnotationTarget, TargetKey};
use crate::class::{Class, ClassId};

#[derive(Debug, Default)]
struct RegistryState {
    by_target: FxHashMap<TargetKey, Vec<AnnotationContext>>,
    by_annotation: FxHashMap<AnnotationRef, Vec<AnnotationContext>>,
    /// Targets in first-annotation order
    targets: Vec<AnnotationTarget>,
}

/// Annotation contexts of one reflection context
#[derive(Debug, Default)]
pub struct AnnotationRegistry {
    state: RwLock<RegistryState>,
}

impl AnnotationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an annotation context
    ///
    /// Returns false if the same annotation was already recorded on the same
    /// target with the same arguments.
    pub fn register(&self, context: AnnotationContext) -> bool {
        let mut state = self.state.write();
        let key = context.target().key();

        let existing = state.by_target.entry(key).or_default();
        if existing.iter().any(|c| c == &context) {
            return false;
        }
        let first_on_target = existing.is_empty();
        existing.push(context.clone());

        if first_on_target {
            state.targets.push(context.target().clone());
        }
        state
            .by_annotation
            .entry(context.reference().clone())
            .or_default()
            .push(context);
        true
    }

    /// Annotations recorded on a target, in application order
    pub fn find(&self, target: &AnnotationTarget) -> Vec<AnnotationContext> {
        self.state
            .read()
            .by_target
            .get(&target.key())
            .cloned()
            .unwrap_or_default()
    }

    /// Every application of an annotation
    pub fn find_by_annotation(&self, reference: &AnnotationRef) -> Vec<AnnotationContext> {
        self.state
            .read()
            .by_annotation
            .get(reference)
            .cloned()
            .unwrap_or_default()
    }

    /// Start a query restricted to some annotations (empty means any)
    pub fn select<'a>(&'a self, annotations: &[AnnotationRef]) -> AnnotationQuery<'a> {
        AnnotationQuery {
            registry: self,
            annotations: annotations.to_vec(),
            search_parents: false,
        }
    }

    /// All annotated targets
    pub fn targets(&self) -> Vec<AnnotationTarget> {
        self.state.read().targets.clone()
    }

    /// Annotated targets declared by one class
    pub fn targets_for_class(&self, class_id: ClassId) -> Vec<AnnotationTarget> {
        self.state
            .read()
            .targets
            .iter()
            .filter(|t| t.class_id() == class_id)
            .cloned()
            .collect()
    }

    /// Drop every context recorded on a class
    pub fn remove_class(&self, class_id: ClassId) {
        let mut state = self.state.write();
        state.by_target.retain(|key, _| key.class_id != class_id);
        state.targets.retain(|t| t.class_id() != class_id);
        for contexts in state.by_annotation.values_mut() {
            contexts.retain(|c| c.target().class_id() != class_id);
        }
        state.by_annotation.retain(|_, contexts| !contexts.is_empty());
    }

    /// Number of recorded contexts
    pub fn len(&self) -> usize {
        self.state.read().by_target.values().map(Vec::len).sum()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.state.read().by_target.is_empty()
    }
}

/// Query over an [`AnnotationRegistry`]
pub struct AnnotationQuery<'a> {
    registry: &'a AnnotationRegistry,
    annotations: Vec<AnnotationRef>,
    search_parents: bool,
}

impl<'a> AnnotationQuery<'a> {
    /// Also look at the same member on ancestor classes
    pub fn search_parents(mut self, search: bool) -> Self {
        self.search_parents = search;
        self
    }

    /// Run the query on `target`, declared by `class`
    ///
    /// Own annotations come first, then those of ancestors nearest first.
    pub fn on(&self, class: &Class, target: &AnnotationTarget) -> Vec<AnnotationContext> {
        let mut found: Vec<AnnotationContext> = self
            .registry
            .find(target)
            .into_iter()
            .filter(|c| self.accepts(c))
            .collect();

        if self.search_parents {
            for ancestor in class.ancestors().skip(1) {
                let inherited = self.registry.find(&target.rebase(ancestor));
                found.extend(inherited.into_iter().filter(|c| self.accepts(c)));
            }
        }
        found
    }

    fn accepts(&self, context: &AnnotationContext) -> bool {
        self.annotations.is_empty() || self.annotations.contains(context.reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationFactory;
    use crate::class::ClassBuilder;
    use crate::reflect::ReflectContext;
    use crate::value::Value;

    #[test]
    fn test_register_is_idempotent() {
        let ctx = ReflectContext::new();
        let class = ClassBuilder::new("Repo").define(&ctx).unwrap();
        let cache = AnnotationFactory::new("test").create("Cache");
        let registry = AnnotationRegistry::new();
        let target = AnnotationTarget::method(&class, "load");

        let ctx_a = AnnotationContext::new(target.clone(), cache.clone(), vec![Value::Int(10)]);
        let ctx_b = AnnotationContext::new(target.clone(), cache.clone(), vec![Value::Int(20)]);

        assert!(registry.register(ctx_a.clone()));
        assert!(!registry.register(ctx_a));
        assert!(registry.register(ctx_b));
        assert_eq!(registry.find(&target).len(), 2);
        assert_eq!(registry.find_by_annotation(cache.reference()).len(), 2);
        assert_eq!(registry.targets(), vec![target]);
    }

    #[test]
    fn test_remove_class() {
        let ctx = ReflectContext::new();
        let a = ClassBuilder::new("A").define(&ctx).unwrap();
        let b = ClassBuilder::new("B").define(&ctx).unwrap();
        let tag = AnnotationFactory::new("test").create("Tag");
        let registry = AnnotationRegistry::new();

        registry.register(AnnotationContext::new(AnnotationTarget::class(&a), tag.clone(), vec![]));
        registry.register(AnnotationContext::new(AnnotationTarget::class(&b), tag.clone(), vec![]));
        registry.remove_class(a.id());

        assert_eq!(registry.len(), 1);
        assert!(registry.targets_for_class(a.id()).is_empty());
        assert_eq!(registry.find_by_annotation(tag.reference()).len(), 1);
    }

    #[test]
    fn test_select_with_parents() {
        let ctx = ReflectContext::new();
        let factory = AnnotationFactory::new("test");
        let get = factory.create("Get");
        let auth = factory.create("Auth");

        let base = ClassBuilder::new("Base").define(&ctx).unwrap();
        let derived = ClassBuilder::new("Derived").extends(&base).define(&ctx).unwrap();
        let registry = AnnotationRegistry::new();

        let on_base = AnnotationTarget::method(&base, "list");
        let on_derived = AnnotationTarget::method(&derived, "list");
        registry.register(AnnotationContext::new(on_base, auth.clone(), vec![]));
        registry.register(AnnotationContext::new(on_derived.clone(), get.clone(), vec![]));

        let refs = [auth.reference().clone()];
        assert!(registry.select(&refs).on(&derived, &on_derived).is_empty());

        let found = registry.select(&refs).search_parents(true).on(&derived, &on_derived);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].annotation(), &auth);

        let any = registry.select(&[]).search_parents(true).on(&derived, &on_derived);
        assert_eq!(any.len(), 2);
        assert_eq!(any[0].annotation(), &get);
    }
}
