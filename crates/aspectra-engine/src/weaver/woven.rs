//! Woven members
//!
//! A [`WovenMember`] replaces one member slot and runs the attached advices
//! around the original implementation:
//!
//! 1. before advices, in order
//! 2. around advices, first one outermost, each proceeding through a
//!    one-shot joinpoint down to the original
//! 3. on success, afterReturn advices thread the returned value; on error
//!    (from a before advice, an around advice or the original), every
//!    afterThrow advice sees the error and may swallow it or rethrow
//! 4. after advices, whatever the outcome
//!
//! For constructors no instance is exposed until the constructor returned.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::placeholder;
use crate::advice::{AdviceBinding, AdviceContext, AdviceFn, AroundContext, JoinPoint};
use crate::class::{ClassId, Instance, MemberFn, MemberKey};
use crate::error::{Error, Result, WeavingError};
use crate::value::Value;

/// Advice chain installed on one member slot
pub struct WovenMember {
    label: String,
    class_name: String,
    class_id: ClassId,
    key: MemberKey,
    original: MemberFn,
    verify_abstract_return: bool,
    chain: RwLock<Arc<Vec<AdviceBinding>>>,
}

impl WovenMember {
    pub(crate) fn new(
        class_name: &str,
        class_id: ClassId,
        key: MemberKey,
        original: MemberFn,
        verify_abstract_return: bool,
    ) -> Self {
        Self {
            label: format!("{}.{}", class_name, key),
            class_name: class_name.to_string(),
            class_id,
            key,
            original,
            verify_abstract_return,
            chain: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// `Class.member` label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Intercepted slot
    pub fn key(&self) -> &MemberKey {
        &self.key
    }

    /// Number of attached advices
    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    /// Check if no advice is attached
    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Attached advices, in run order
    pub fn bindings(&self) -> Arc<Vec<AdviceBinding>> {
        self.chain.read().clone()
    }

    /// Attach an advice; an already attached advice gains the new annotations
    ///
    /// Returns true if the advice was not attached before.
    pub(crate) fn attach(&self, binding: AdviceBinding) -> bool {
        let mut chain = self.chain.write();
        let mut next: Vec<AdviceBinding> = chain.as_ref().clone();
        let added = match next.iter_mut().find(|b| b.advice == binding.advice) {
            Some(existing) => {
                for context in binding.annotations {
                    if !existing.annotations.contains(&context) {
                        existing.annotations.push(context);
                    }
                }
                false
            }
            None => {
                next.push(binding);
                next.sort_by(|a, b| a.advice.cmp_precedence(&b.advice));
                true
            }
        };
        *chain = Arc::new(next);
        added
    }

    /// Detach every advice of an aspect; returns how many were removed
    pub(crate) fn detach_aspect(&self, aspect_id: &str) -> usize {
        let mut chain = self.chain.write();
        let before = chain.len();
        let next: Vec<AdviceBinding> = chain
            .iter()
            .filter(|b| b.advice.aspect_id() != aspect_id)
            .cloned()
            .collect();
        let removed = before - next.len();
        *chain = Arc::new(next);
        removed
    }

    /// Callable to install in the member slot
    pub(crate) fn wrapper(self: &Arc<Self>) -> MemberFn {
        let member = Arc::clone(self);
        Arc::new(move |this: &Instance, args: Vec<Value>| member.invoke(this, args))
    }

    /// Run one intercepted call
    pub fn invoke(&self, this: &Instance, args: Vec<Value>) -> Result<Value> {
        let chain = self.chain.read().clone();
        let is_constructor = self.key == MemberKey::Constructor;
        let early = if is_constructor { None } else { Some(this) };
        tracing::trace!(member = %self.label, advices = chain.len(), "woven call");

        let outcome = self
            .run_before(&chain, early, &args)
            .and_then(|()| {
                let arounds: Vec<&AdviceBinding> = chain
                    .iter()
                    .filter(|b| matches!(b.advice.func(), AdviceFn::Around(_)))
                    .collect();
                self.run_around(&arounds, this, early, args.clone())
            });

        let (result, late) = match outcome {
            Ok(value) => {
                let late = Some(this);
                (self.run_after_return(&chain, late, &args, value), late)
            }
            Err(err) => (self.run_after_throw(&chain, early, &args, err), early),
        };

        self.run_after(&chain, late, &args)?;
        let value = result?;

        if is_constructor {
            self.verify_constructor_result(&value)?;
        }
        Ok(value)
    }

    fn run_before(&self, chain: &[AdviceBinding], this: Option<&Instance>, args: &[Value]) -> Result<()> {
        for binding in chain {
            if let AdviceFn::Before(f) = binding.advice.func() {
                tracing::trace!(advice = binding.advice.name(), member = %self.label, "before");
                f(&AdviceContext::new(binding, this, args))?;
            }
        }
        Ok(())
    }

    fn run_around(
        &self,
        arounds: &[&AdviceBinding],
        this: &Instance,
        exposed: Option<&Instance>,
        args: Vec<Value>,
    ) -> Result<Value> {
        let Some((binding, rest)) = arounds.split_first() else {
            return self.call_original(this, args);
        };
        let AdviceFn::Around(f) = binding.advice.func() else {
            return self.run_around(rest, this, exposed, args);
        };
        tracing::trace!(advice = binding.advice.name(), member = %self.label, "around");

        let mut next = |args: Vec<Value>| -> Result<Value> { self.run_around(rest, this, exposed, args) };
        let joinpoint = JoinPoint::new(binding.advice.name(), &mut next);
        let mut ctx = AroundContext::new(binding, exposed, args, joinpoint);
        f(&mut ctx)
    }

    fn call_original(&self, this: &Instance, args: Vec<Value>) -> Result<Value> {
        let guard = placeholder::arm();
        let result = (self.original)(this, args);
        guard.check(result, self.verify_abstract_return)
    }

    fn run_after_return(
        &self,
        chain: &[AdviceBinding],
        this: Option<&Instance>,
        args: &[Value],
        mut value: Value,
    ) -> Result<Value> {
        for binding in chain {
            if let AdviceFn::AfterReturn(f) = binding.advice.func() {
                tracing::trace!(advice = binding.advice.name(), member = %self.label, "afterReturn");
                value = f(&AdviceContext::new(binding, this, args), value)?;
            }
        }
        Ok(value)
    }

    fn run_after_throw(
        &self,
        chain: &[AdviceBinding],
        this: Option<&Instance>,
        args: &[Value],
        err: Error,
    ) -> Result<Value> {
        let mut handled: Option<Value> = None;
        for binding in chain {
            if let AdviceFn::AfterThrow(f) = binding.advice.func() {
                tracing::trace!(advice = binding.advice.name(), member = %self.label, error = %err, "afterThrow");
                handled = Some(f(&AdviceContext::new(binding, this, args), err.clone())?);
            }
        }
        handled.ok_or(err)
    }

    fn run_after(&self, chain: &[AdviceBinding], this: Option<&Instance>, args: &[Value]) -> Result<()> {
        for binding in chain {
            if let AdviceFn::After(f) = binding.advice.func() {
                tracing::trace!(advice = binding.advice.name(), member = %self.label, "after");
                f(&AdviceContext::new(binding, this, args))?;
            }
        }
        Ok(())
    }

    fn verify_constructor_result(&self, value: &Value) -> Result<()> {
        let is_instance = value
            .as_instance()
            .is_some_and(|i| i.class().ancestors().any(|c| c.id() == self.class_id));
        if is_instance {
            Ok(())
        } else {
            Err(WeavingError::ConstructorResult {
                class: self.class_name.clone(),
            }
            .into())
        }
    }
}

impl fmt::Debug for WovenMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WovenMember")
            .field("member", &self.label)
            .field("advices", &self.len())
            .finish()
    }
}
