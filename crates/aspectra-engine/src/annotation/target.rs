//! Annotation targets
//!
//! An [`AnnotationTarget`] uniquely identifies a code location: the
//! declaring class, the member name and, for parameters, the parameter
//! index. It is the join key between recorded annotations and pointcut
//! matches, and stays stable for the lifetime of the class.

use std::fmt;
use std::sync::Arc;

use super::AnnotationKind;
use crate::class::{Class, ClassId, ClassRegistry};

/// Hashable identity of a target, independent of the class name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    /// Declaring class id
    pub class_id: ClassId,
    /// Kind of element
    pub kind: AnnotationKind,
    /// Member name
    pub member: Option<Arc<str>>,
    /// Parameter index
    pub parameter: Option<usize>,
}

/// A code location annotations can be placed on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationTarget {
    kind: AnnotationKind,
    class_id: ClassId,
    class_name: Arc<str>,
    member: Option<Arc<str>>,
    parameter: Option<usize>,
}

impl AnnotationTarget {
    /// The class itself
    pub fn class(class: &Class) -> Self {
        Self {
            kind: AnnotationKind::Class,
            class_id: class.id(),
            class_name: class.name_arc(),
            member: None,
            parameter: None,
        }
    }

    /// A method of the class
    pub fn method(class: &Class, name: &str) -> Self {
        Self {
            kind: AnnotationKind::Method,
            class_id: class.id(),
            class_name: class.name_arc(),
            member: Some(Arc::from(name)),
            parameter: None,
        }
    }

    /// A property of the class
    pub fn property(class: &Class, name: &str) -> Self {
        Self {
            kind: AnnotationKind::Property,
            class_id: class.id(),
            class_name: class.name_arc(),
            member: Some(Arc::from(name)),
            parameter: None,
        }
    }

    /// A parameter of a method of the class
    pub fn parameter(class: &Class, method: &str, index: usize) -> Self {
        Self {
            kind: AnnotationKind::Parameter,
            class_id: class.id(),
            class_name: class.name_arc(),
            member: Some(Arc::from(method)),
            parameter: Some(index),
        }
    }

    /// Kind of element
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Declaring class id
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Declaring class name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Member name (the method name for parameters)
    pub fn member_name(&self) -> Option<&str> {
        self.member.as_deref()
    }

    /// Parameter index
    pub fn parameter_index(&self) -> Option<usize> {
        self.parameter
    }

    /// The method declaring this parameter
    pub fn declaring_method(&self) -> Option<AnnotationTarget> {
        if self.kind != AnnotationKind::Parameter {
            return None;
        }
        Some(Self {
            kind: AnnotationKind::Method,
            class_id: self.class_id,
            class_name: self.class_name.clone(),
            member: self.member.clone(),
            parameter: None,
        })
    }

    /// Hashable key for this target
    pub fn key(&self) -> TargetKey {
        TargetKey {
            class_id: self.class_id,
            kind: self.kind,
            member: self.member.clone(),
            parameter: self.parameter,
        }
    }

    /// The same location on the parent of the declaring class
    pub fn parent(&self, classes: &ClassRegistry) -> Option<AnnotationTarget> {
        let class = classes.get(self.class_id)?;
        class.parent().map(|parent| self.rebase(parent))
    }

    /// The same location declared on another class
    pub fn rebase(&self, class: &Class) -> AnnotationTarget {
        Self {
            kind: self.kind,
            class_id: class.id(),
            class_name: class.name_arc(),
            member: self.member.clone(),
            parameter: self.parameter,
        }
    }
}

impl fmt::Display for AnnotationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.member.as_deref(), self.parameter) {
            (AnnotationKind::Parameter, Some(method), Some(index)) => {
                write!(f, "parameter {}.{}#{}", self.class_name, method, index)
            }
            (kind, Some(member), _) => write!(f, "{} {}.{}", kind, self.class_name, member),
            (kind, None, _) => write!(f, "{} {}", kind, self.class_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::reflect::ReflectContext;

    #[test]
    fn test_targets_and_display() {
        let ctx = ReflectContext::new();
        let class = ClassBuilder::new("Repo").define(&ctx).unwrap();

        let method = AnnotationTarget::method(&class, "save");
        let param = AnnotationTarget::parameter(&class, "save", 1);

        assert_eq!(AnnotationTarget::class(&class).to_string(), "class Repo");
        assert_eq!(method.to_string(), "method Repo.save");
        assert_eq!(param.to_string(), "parameter Repo.save#1");
        assert_eq!(param.declaring_method(), Some(method.clone()));
        assert_eq!(method.declaring_method(), None);
        assert_ne!(method, AnnotationTarget::property(&class, "save"));
    }

    #[test]
    fn test_rebase_keeps_member() {
        let ctx = ReflectContext::new();
        let base = ClassBuilder::new("Base").define(&ctx).unwrap();
        let derived = ClassBuilder::new("Derived").extends(&base).define(&ctx).unwrap();

        let on_derived = AnnotationTarget::method(&derived, "run");
        let on_base = on_derived.rebase(&base);
        assert_eq!(on_base, AnnotationTarget::method(&base, "run"));
        assert_eq!(on_base.member_name(), Some("run"));

        let classes = ctx.get::<ClassRegistry>().unwrap();
        assert_eq!(on_derived.parent(&classes), Some(on_base.clone()));
        assert_eq!(on_base.parent(&classes), None);
        assert_ne!(on_derived.key(), on_base.key());
    }
}
