//! Annotations and their applications

use std::fmt;
use std::sync::Arc;

use super::{AnnotationKind, AnnotationRef};
use crate::error::Result;
use crate::value::Value;

/// Validates and normalizes the arguments an annotation is applied with
pub type AnnotationStub = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync>;

struct AnnotationDef {
    reference: AnnotationRef,
    kinds: Vec<AnnotationKind>,
    stub: Option<AnnotationStub>,
}

/// An annotation created by an [`AnnotationFactory`](super::AnnotationFactory)
///
/// Cloning is cheap; clones share identity.
#[derive(Clone)]
pub struct Annotation {
    inner: Arc<AnnotationDef>,
}

impl Annotation {
    pub(crate) fn new(
        reference: AnnotationRef,
        kinds: Vec<AnnotationKind>,
        stub: Option<AnnotationStub>,
    ) -> Self {
        Self {
            inner: Arc::new(AnnotationDef {
                reference,
                kinds,
                stub,
            }),
        }
    }

    /// Get the annotation identity
    pub fn reference(&self) -> &AnnotationRef {
        &self.inner.reference
    }

    /// Annotation name
    pub fn name(&self) -> &str {
        self.inner.reference.name()
    }

    /// Annotation group
    pub fn group(&self) -> &str {
        self.inner.reference.group()
    }

    /// Declared placement kinds (empty means any)
    pub fn kinds(&self) -> &[AnnotationKind] {
        &self.inner.kinds
    }

    /// Check if the declared kinds allow `kind`
    pub fn allows(&self, kind: AnnotationKind) -> bool {
        self.inner.kinds.is_empty() || self.inner.kinds.contains(&kind)
    }

    /// Apply the annotation with call-time arguments
    pub fn apply(&self, args: Vec<Value>) -> AnnotationApplication {
        AnnotationApplication {
            annotation: self.clone(),
            args,
        }
    }

    /// Apply the annotation without arguments
    pub fn bare(&self) -> AnnotationApplication {
        self.apply(Vec::new())
    }

    /// Run the stub over call-time arguments
    pub(crate) fn normalize_args(&self, args: &[Value]) -> Result<Vec<Value>> {
        match &self.inner.stub {
            Some(stub) => stub(args),
            None => Ok(args.to_vec()),
        }
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.inner.reference == other.inner.reference
    }
}

impl Eq for Annotation {}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotation")
            .field("reference", &self.inner.reference)
            .field("kinds", &self.inner.kinds)
            .finish()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner.reference, f)
    }
}

/// One decorator call: an annotation and the arguments it is applied with
#[derive(Debug, Clone)]
pub struct AnnotationApplication {
    annotation: Annotation,
    args: Vec<Value>,
}

impl AnnotationApplication {
    /// The applied annotation
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Call-time arguments
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}
