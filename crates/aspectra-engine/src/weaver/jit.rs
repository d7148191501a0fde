//! JIT weaver
//!
//! Weaves members lazily, when they become relevant: on each annotation
//! application during class definition, and on `enable` for classes already
//! defined. Each member slot goes from unwoven to woven at most once;
//! later matches add advices to the same [`WovenMember`].

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use super::WovenMember;
use crate::advice::{
    instance_key, Advice, AdviceBinding, AdviceFn, AdviceId, AdviceRegistry, CompileContext, Order,
};
use crate::annotation::{
    AnnotationContext, AnnotationKind, AnnotationRegistry, AnnotationTarget, FactoryHook,
    HookContext, TargetKey,
};
use crate::aspect::{AdviceSet, AspectRegistry, AspectType, Prepared, Registration};
use crate::class::{Class, ClassId, ClassRegistry, MemberKey, Replacement};
use crate::config::DuplicateAspectPolicy;
use crate::error::{Result, WeavingError};
use crate::pointcut::PointcutPhase;
use crate::reflect::{ReflectContext, WeakReflectContext};

/// Weaves advices into classes of one reflection context
pub struct JitWeaver {
    ctx: WeakReflectContext,
    verify_abstract_return: bool,
    woven: RwLock<FxHashMap<(ClassId, MemberKey), Arc<WovenMember>>>,
    compiled: RwLock<FxHashSet<(AdviceId, TargetKey)>>,
}

impl JitWeaver {
    /// Create the weaver of `ctx`
    pub fn new(ctx: &ReflectContext) -> Self {
        Self {
            ctx: ctx.downgrade(),
            verify_abstract_return: ctx.config().verify_abstract_return,
            woven: RwLock::new(FxHashMap::default()),
            compiled: RwLock::new(FxHashSet::default()),
        }
    }

    fn context(&self) -> Result<ReflectContext> {
        self.ctx
            .upgrade()
            .ok_or_else(|| WeavingError::InvalidState("reflect context dropped".to_string()).into())
    }

    /// Enable aspects and weave every defined class they match
    ///
    /// Re-enabling an aspect id replaces the previous aspect's advices
    /// everywhere. Compile advices of the new aspects run against every
    /// defined class before anything is registered; if one fails, no aspect
    /// of the batch is enabled and the error is returned.
    pub fn enable<I>(&self, aspects: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<dyn AspectType>>,
    {
        let ctx = self.context()?;
        let registry = ctx.get::<AspectRegistry>()?;
        let advices = ctx.get::<AdviceRegistry>()?;

        let mut staged: Vec<(Arc<dyn AspectType>, String, Order, Vec<Advice>)> = Vec::new();
        for aspect in aspects {
            let (id, order) = match registry.prepare(&aspect)? {
                Prepared::AlreadyEnabled(id) => {
                    tracing::debug!(aspect = %id, "aspect already enabled");
                    continue;
                }
                Prepared::Fresh { id, order } => (id, order),
            };
            let key = instance_key(&aspect);
            if staged.iter().any(|(staged, ..)| instance_key(staged) == key) {
                continue;
            }
            if let Some(index) = staged.iter().position(|(_, staged, ..)| *staged == id) {
                if registry.policy() == DuplicateAspectPolicy::Reject {
                    return Err(WeavingError::DuplicateAspect(id).into());
                }
                tracing::warn!(aspect = %id, "aspect id enabled twice in one batch, keeping the last");
                staged.remove(index);
            }

            let mut set = AdviceSet::new(&id, order);
            aspect.clone().register(&mut set);
            let declared = set.build();
            staged.push((aspect, id, order, declared));
        }

        let classes = ctx.get::<ClassRegistry>()?.all();
        let compiled = self.validate(&ctx, &classes, staged.iter().flat_map(|(.., declared)| declared))?;
        self.compiled.write().extend(compiled);

        for (aspect, id, order, declared) in staged {
            if let Registration::Replaced { .. } = registry.insert(aspect.clone(), id.clone(), order)? {
                let detached = self.detach_aspect(&id);
                advices.remove(&id);
                tracing::debug!(aspect = %id, detached, "previous aspect detached");
            }
            tracing::debug!(aspect = %id, advices = declared.len(), "aspect enabled");
            advices.register(instance_key(&aspect), &id, declared);
        }

        for class in classes {
            self.weave_class(&ctx, &class)?;
        }
        Ok(())
    }

    /// Run compile advices over every location of `classes` they select
    ///
    /// Returns the compiled keys; nothing is recorded here.
    fn validate<'a>(
        &self,
        ctx: &ReflectContext,
        classes: &[Class],
        advices: impl Iterator<Item = &'a Advice>,
    ) -> Result<Vec<(AdviceId, TargetKey)>> {
        let annotations = ctx.get::<AnnotationRegistry>()?;
        let mut compiled = Vec::new();
        for advice in advices.filter(|a| a.phase() == PointcutPhase::Compile) {
            for class in classes {
                for target in self.class_targets(ctx, class)? {
                    let key = (advice.id(), target.key());
                    if compiled.contains(&key) || self.compiled.read().contains(&key) {
                        continue;
                    }
                    if let Some((_, contexts)) = advice.bindings(&annotations, class, &target).first() {
                        run_compile(advice, class, &target, contexts)?;
                        compiled.push(key);
                    }
                }
            }
        }
        Ok(compiled)
    }

    /// Drop every woven member and compile record of a class
    pub fn forget_class(&self, class: ClassId) {
        let mut woven = self.woven.write();
        let before = woven.len();
        woven.retain(|(id, _), _| *id != class);
        let forgotten = before - woven.len();
        drop(woven);
        self.compiled.write().retain(|(_, target)| target.class_id != class);
        tracing::debug!(class, forgotten, "class forgotten");
    }

    /// Number of woven members across all classes
    pub fn woven_count(&self) -> usize {
        self.woven.read().len()
    }

    /// Enable a single aspect and get it back
    pub fn enable_aspect<A: AspectType>(&self, aspect: A) -> Result<Arc<A>> {
        let aspect = Arc::new(aspect);
        self.enable([aspect.clone() as Arc<dyn AspectType>])?;
        Ok(aspect)
    }

    /// Enabled aspect of type `A`
    pub fn get_aspect<A: AspectType>(&self) -> Option<Arc<A>> {
        let ctx = self.context().ok()?;
        ctx.get::<AspectRegistry>().ok()?.get::<A>()
    }

    /// Enabled aspect by id
    pub fn get_aspect_by_id(&self, id: &str) -> Option<Arc<dyn AspectType>> {
        let ctx = self.context().ok()?;
        ctx.get::<AspectRegistry>().ok()?.get_by_id(id)
    }

    /// Check if the member behind `target` is woven
    pub fn is_woven(&self, target: &AnnotationTarget) -> bool {
        let keys = member_keys(target);
        let woven = self.woven.read();
        keys.into_iter()
            .any(|key| woven.contains_key(&(target.class_id(), key)))
    }

    /// Woven member of a class, if any
    pub fn woven_member(&self, class: &Class, key: &MemberKey) -> Option<Arc<WovenMember>> {
        self.woven.read().get(&(class.id(), key.clone())).cloned()
    }

    /// Number of advices attached to a member
    pub fn advice_count(&self, class: &Class, key: &MemberKey) -> usize {
        self.woven_member(class, key).map_or(0, |m| m.len())
    }

    /// Weave every member of `class` reachable by `target`
    ///
    /// Returns the wrappers of members woven for the first time; the caller
    /// installs them.
    pub fn weave_target(
        &self,
        ctx: &ReflectContext,
        class: &Class,
        target: &AnnotationTarget,
    ) -> Result<Vec<Replacement>> {
        let annotations = ctx.get::<AnnotationRegistry>()?;
        let advices = ctx.get::<AdviceRegistry>()?;
        let bindings = advices.get_advices_for_target(&annotations, class, target, None);
        if bindings.is_empty() {
            return Ok(Vec::new());
        }

        // Compile advices validate first; nothing is woven if one rejects.
        for (_, binding) in &bindings {
            if binding.advice.phase() != PointcutPhase::Compile {
                continue;
            }
            let key = (binding.advice.id(), target.key());
            if self.compiled.read().contains(&key) {
                continue;
            }
            run_compile(&binding.advice, class, target, &binding.annotations)?;
            self.compiled.write().insert(key);
        }

        let mut replacements = Vec::new();
        for (key, binding) in bindings {
            if matches!(binding.advice.func(), AdviceFn::Compile(_)) {
                continue;
            }
            if let Some(replacement) = self.attach(class, key, binding) {
                replacements.push(replacement);
            }
        }
        Ok(replacements)
    }

    /// Weave every annotated or inherited location of a class and install
    /// the new wrappers
    pub fn weave_class(&self, ctx: &ReflectContext, class: &Class) -> Result<()> {
        for target in self.class_targets(ctx, class)? {
            for replacement in self.weave_target(ctx, class, &target)? {
                class.install(&replacement.key, replacement.member);
            }
        }
        Ok(())
    }

    fn attach(&self, class: &Class, key: MemberKey, binding: AdviceBinding) -> Option<Replacement> {
        // Members inherited but not declared by `class` are woven on their owner.
        let original = class.original(&key)?;
        let advice = binding.advice.name().to_string();

        let mut woven = self.woven.write();
        let slot = (class.id(), key.clone());
        let (member, created) = match woven.get(&slot) {
            Some(member) => (member.clone(), false),
            None => {
                let member = Arc::new(WovenMember::new(
                    class.name(),
                    class.id(),
                    key.clone(),
                    original,
                    self.verify_abstract_return,
                ));
                woven.insert(slot, member.clone());
                (member, true)
            }
        };
        drop(woven);

        if member.attach(binding) {
            tracing::debug!(member = member.label(), advice = %advice, "advice attached");
        }
        if created {
            tracing::debug!(member = member.label(), "member woven");
            Some(Replacement {
                key,
                member: member.wrapper(),
            })
        } else {
            None
        }
    }

    fn detach_aspect(&self, aspect_id: &str) -> usize {
        self.woven
            .read()
            .values()
            .map(|member| member.detach_aspect(aspect_id))
            .sum()
    }

    /// Locations of `class` a pointcut may select
    fn class_targets(&self, ctx: &ReflectContext, class: &Class) -> Result<Vec<AnnotationTarget>> {
        let mut targets = vec![AnnotationTarget::class(class)];
        targets.extend(class.method_names().iter().map(|m| AnnotationTarget::method(class, m)));
        for property in class.properties() {
            targets.push(AnnotationTarget::property(class, &property.name));
        }

        let annotations = ctx.get::<AnnotationRegistry>()?;
        for ancestor in class.ancestors() {
            for target in annotations.targets_for_class(ancestor.id()) {
                if target.kind() != AnnotationKind::Parameter {
                    continue;
                }
                let declared = target.member_name().is_some_and(|m| class.has_method(m));
                let rebased = target.rebase(class);
                if declared && !targets.contains(&rebased) {
                    targets.push(rebased);
                }
            }
        }
        Ok(targets)
    }
}

impl std::fmt::Debug for JitWeaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitWeaver")
            .field("woven", &self.woven.read().len())
            .finish()
    }
}

fn run_compile(
    advice: &Advice,
    class: &Class,
    target: &AnnotationTarget,
    annotations: &[AnnotationContext],
) -> Result<()> {
    if let AdviceFn::Compile(f) = advice.func() {
        f(&CompileContext::new(advice, class, target, annotations))?;
    }
    Ok(())
}

/// Member slots a target maps to
fn member_keys(target: &AnnotationTarget) -> Vec<MemberKey> {
    let member = target.member_name().map(str::to_string);
    match (target.kind(), member) {
        (AnnotationKind::Class, _) => vec![MemberKey::Constructor],
        (AnnotationKind::Method | AnnotationKind::Parameter, Some(m)) => vec![MemberKey::Method(m)],
        (AnnotationKind::Property, Some(p)) => {
            vec![MemberKey::Getter(p.clone()), MemberKey::Setter(p)]
        }
        _ => Vec::new(),
    }
}

/// Factory hook weaving each annotated target as it is applied
#[derive(Debug, Default)]
pub struct JitWeavingHook;

impl FactoryHook for JitWeavingHook {
    fn name(&self) -> &str {
        "jit-weaver"
    }

    fn order(&self) -> i32 {
        100
    }

    fn on_annotation(&self, hook: &HookContext<'_>) -> Result<Vec<Replacement>> {
        let ctx = hook.context();
        ctx.weaver()?.weave_target(ctx, hook.class(), hook.target())
    }

    fn on_class_defined(&self, ctx: &ReflectContext, class: &Class) -> Result<()> {
        ctx.weaver()?.weave_class(ctx, class)
    }

    fn on_class_discarded(&self, ctx: &ReflectContext, class: &Class) {
        if let Ok(weaver) = ctx.weaver() {
            weaver.forget_class(class.id());
        }
    }
}
