//! Advice registry
//!
//! Advices are stored per aspect id. Aspects registered through the weaver
//! are also indexed by the address of their instance, which is how
//! [`AdviceRegistry::get_advices_by_aspect`] finds them.

use std::any::type_name;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{Advice, AdviceBinding};
use crate::annotation::{AnnotationRegistry, AnnotationTarget};
use crate::class::{Class, MemberKey};
use crate::error::{AspectError, Result};
use crate::pointcut::PointcutPhase;

#[derive(Debug, Default)]
struct RegistryState {
    /// Aspect id to its advices, sorted by precedence
    by_aspect: FxHashMap<String, Vec<Advice>>,
    /// Aspect ids in registration order
    aspects: Vec<String>,
    /// Aspect instance address to aspect id
    instances: FxHashMap<usize, String>,
}

/// Advices of every registered aspect
#[derive(Debug, Default)]
pub struct AdviceRegistry {
    state: RwLock<RegistryState>,
}

/// Address of the value behind an `Arc`, ignoring any vtable
pub(crate) fn instance_key<A: ?Sized>(aspect: &Arc<A>) -> usize {
    Arc::as_ptr(aspect) as *const () as usize
}

impl AdviceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the advices of an aspect, replacing any under the same id
    ///
    /// Returns the advices that were replaced.
    pub fn register(&self, instance: usize, aspect_id: &str, mut advices: Vec<Advice>) -> Vec<Advice> {
        advices.sort_by(Advice::cmp_precedence);
        let mut state = self.state.write();
        state.instances.retain(|_, id| id != aspect_id);
        state.instances.insert(instance, aspect_id.to_string());
        if !state.aspects.iter().any(|id| id == aspect_id) {
            state.aspects.push(aspect_id.to_string());
        }
        state
            .by_aspect
            .insert(aspect_id.to_string(), advices)
            .unwrap_or_default()
    }

    /// Advices of an aspect instance, in run order
    pub fn get_advices_by_aspect<A: ?Sized>(&self, aspect: &Arc<A>) -> Result<Vec<Advice>> {
        let state = self.state.read();
        state
            .instances
            .get(&instance_key(aspect))
            .and_then(|id| state.by_aspect.get(id))
            .cloned()
            .ok_or_else(|| AspectError::NotAnAspect(type_name::<A>().to_string()).into())
    }

    /// Advices of an aspect id, in run order
    pub fn get_advices_by_id(&self, aspect_id: &str) -> Option<Vec<Advice>> {
        self.state.read().by_aspect.get(aspect_id).cloned()
    }

    /// Every advice, in run order
    pub fn all(&self) -> Vec<Advice> {
        let state = self.state.read();
        let mut advices: Vec<Advice> = state
            .aspects
            .iter()
            .filter_map(|id| state.by_aspect.get(id))
            .flatten()
            .cloned()
            .collect();
        advices.sort_by(Advice::cmp_precedence);
        advices
    }

    /// Advices that intercept a member of `class` through `target`
    ///
    /// Restricted to `phase` when given; in run order.
    pub fn get_advices_for_target(
        &self,
        annotations: &AnnotationRegistry,
        class: &Class,
        target: &AnnotationTarget,
        phase: Option<PointcutPhase>,
    ) -> Vec<(MemberKey, AdviceBinding)> {
        self.all()
            .into_iter()
            .filter(|advice| phase.map_or(true, |p| advice.phase() == p))
            .flat_map(|advice| {
                advice
                    .bindings(annotations, class, target)
                    .into_iter()
                    .map(move |(key, contexts)| {
                        (
                            key,
                            AdviceBinding {
                                advice: advice.clone(),
                                target: target.clone(),
                                annotations: contexts,
                            },
                        )
                    })
            })
            .collect()
    }

    /// Drop an aspect's advices
    pub fn remove(&self, aspect_id: &str) -> Vec<Advice> {
        let mut state = self.state.write();
        state.instances.retain(|_, id| id != aspect_id);
        state.aspects.retain(|id| id != aspect_id);
        state.by_aspect.remove(aspect_id).unwrap_or_default()
    }

    /// Number of registered aspects
    pub fn aspect_count(&self) -> usize {
        self.state.read().aspects.len()
    }
}
