//! What an advice sees of an intercepted call

use super::{Advice, AdviceBinding, JoinPoint, JoinPointState};
use crate::annotation::{Annotation, AnnotationContext, AnnotationTarget};
use crate::class::{Class, Instance};
use crate::error::{AdviceError, AspectError, Error, Result};
use crate::value::Value;

/// Context passed to before, afterReturn, afterThrow and after advices
pub struct AdviceContext<'a> {
    binding: &'a AdviceBinding,
    instance: Option<&'a Instance>,
    args: &'a [Value],
}

impl<'a> AdviceContext<'a> {
    pub(crate) fn new(
        binding: &'a AdviceBinding,
        instance: Option<&'a Instance>,
        args: &'a [Value],
    ) -> Self {
        Self {
            binding,
            instance,
            args,
        }
    }

    /// Target the advice was attached through
    pub fn target(&self) -> &AnnotationTarget {
        &self.binding.target
    }

    /// Annotations that matched the advice's pointcuts
    pub fn annotations(&self) -> &[AnnotationContext] {
        &self.binding.annotations
    }

    /// First matching application of `annotation`
    pub fn annotation(&self, annotation: &Annotation) -> Option<&AnnotationContext> {
        self.binding
            .annotations
            .iter()
            .find(|c| c.annotation() == annotation)
    }

    /// `this`; `None` in a constructor before it returned
    pub fn instance(&self) -> Option<&Instance> {
        self.instance
    }

    /// Call arguments
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Running advice name
    pub fn advice_name(&self) -> &str {
        self.binding.advice.name()
    }

    /// Id of the aspect declaring the running advice
    pub fn aspect_id(&self) -> &str {
        self.binding.advice.aspect_id()
    }
}

/// Context passed to around advices
///
/// Arguments are owned and may be rewritten before proceeding.
pub struct AroundContext<'a> {
    binding: &'a AdviceBinding,
    instance: Option<&'a Instance>,
    args: Vec<Value>,
    joinpoint: Option<JoinPoint<'a>>,
}

impl<'a> AroundContext<'a> {
    pub(crate) fn new(
        binding: &'a AdviceBinding,
        instance: Option<&'a Instance>,
        args: Vec<Value>,
        joinpoint: JoinPoint<'a>,
    ) -> Self {
        Self {
            binding,
            instance,
            args,
            joinpoint: Some(joinpoint),
        }
    }

    /// Target the advice was attached through
    pub fn target(&self) -> &AnnotationTarget {
        &self.binding.target
    }

    /// Annotations that matched the advice's pointcuts
    pub fn annotations(&self) -> &[AnnotationContext] {
        &self.binding.annotations
    }

    /// First matching application of `annotation`
    pub fn annotation(&self, annotation: &Annotation) -> Option<&AnnotationContext> {
        self.binding
            .annotations
            .iter()
            .find(|c| c.annotation() == annotation)
    }

    /// `this`; `None` around a constructor
    pub fn instance(&self) -> Option<&Instance> {
        self.instance
    }

    /// Current arguments
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Mutable arguments
    pub fn args_mut(&mut self) -> &mut Vec<Value> {
        &mut self.args
    }

    /// Replace the arguments
    pub fn set_args(&mut self, args: Vec<Value>) {
        self.args = args;
    }

    /// Running advice name
    pub fn advice_name(&self) -> &str {
        self.binding.advice.name()
    }

    /// Id of the aspect declaring the running advice
    pub fn aspect_id(&self) -> &str {
        self.binding.advice.aspect_id()
    }

    /// State of the joinpoint (`Called` once it was taken)
    pub fn joinpoint_state(&self) -> JoinPointState {
        self.joinpoint
            .as_ref()
            .map_or(JoinPointState::Called, JoinPoint::state)
    }

    /// Proceed with the current arguments
    pub fn proceed(&mut self) -> Result<Value> {
        let args = self.args.clone();
        self.proceed_with(args)
    }

    /// Proceed with other arguments
    pub fn proceed_with(&mut self, args: Vec<Value>) -> Result<Value> {
        let advice = self.binding.advice.name();
        match self.joinpoint.as_mut() {
            Some(joinpoint) => joinpoint.proceed(args),
            None => Err(AdviceError::MissingJoinPoint {
                advice: advice.to_string(),
            }
            .into()),
        }
    }

    /// Proceed with arguments given as a [`Value::List`]
    pub fn proceed_with_value(&mut self, args: Value) -> Result<Value> {
        match args {
            Value::List(args) => self.proceed_with(args),
            other => Err(AdviceError::NonArrayArguments {
                advice: self.binding.advice.name().to_string(),
                got: other.type_name(),
            }
            .into()),
        }
    }

    /// Take the joinpoint out of the context
    ///
    /// Later `proceed` calls on the context fail with
    /// [`AdviceError::MissingJoinPoint`].
    pub fn take_joinpoint(&mut self) -> Option<JoinPoint<'a>> {
        self.joinpoint.take()
    }
}

/// Context passed to compile advices
pub struct CompileContext<'a> {
    advice: &'a Advice,
    class: &'a Class,
    target: &'a AnnotationTarget,
    annotations: &'a [AnnotationContext],
}

impl<'a> CompileContext<'a> {
    pub(crate) fn new(
        advice: &'a Advice,
        class: &'a Class,
        target: &'a AnnotationTarget,
        annotations: &'a [AnnotationContext],
    ) -> Self {
        Self {
            advice,
            class,
            target,
            annotations,
        }
    }

    /// Class being woven
    pub fn class(&self) -> &Class {
        self.class
    }

    /// Target being woven
    pub fn target(&self) -> &AnnotationTarget {
        self.target
    }

    /// Annotations that matched the advice's pointcuts
    pub fn annotations(&self) -> &[AnnotationContext] {
        self.annotations
    }

    /// Running advice name
    pub fn advice_name(&self) -> &str {
        self.advice.name()
    }

    /// Build the error rejecting this placement
    pub fn reject(&self, reason: impl Into<String>) -> Error {
        let annotation = self
            .annotations
            .first()
            .map(|c| c.reference().to_string())
            .unwrap_or_else(|| self.advice.name().to_string());
        AspectError::InvalidPlacement {
            annotation,
            target: self.target.to_string(),
            reason: reason.into(),
        }
        .into()
    }
}
