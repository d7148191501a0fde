//! Annotation contexts

use super::{Annotation, AnnotationRef, AnnotationTarget};
use crate::value::Value;

/// One application of an annotation on a target
///
/// Created when a class is defined; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationContext {
    target: AnnotationTarget,
    annotation: Annotation,
    args: Vec<Value>,
}

impl AnnotationContext {
    pub(crate) fn new(target: AnnotationTarget, annotation: Annotation, args: Vec<Value>) -> Self {
        Self {
            target,
            annotation,
            args,
        }
    }

    /// Where the annotation was applied
    pub fn target(&self) -> &AnnotationTarget {
        &self.target
    }

    /// The applied annotation
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Identity of the applied annotation
    pub fn reference(&self) -> &AnnotationRef {
        self.annotation.reference()
    }

    /// Arguments given to the annotation (after its stub ran)
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Argument at `index`
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}
