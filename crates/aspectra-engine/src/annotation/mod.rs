//! Annotation model
//!
//! Annotations are created by an [`AnnotationFactory`], applied to code
//! elements through [`AnnotationApplication`]s when a class is defined, and
//! recorded as [`AnnotationContext`]s in the context's
//! [`AnnotationRegistry`].
//!
//! ```rust,ignore
//! let factory = AnnotationFactory::new("demo");
//! let log = factory.create_with_kinds(&[AnnotationKind::Method], "Log");
//!
//! let service = ClassBuilder::new("Service")
//!     .method(MethodBuilder::new("run", |_, _| Ok(Value::Unit)).annotate(log.apply(vec![])))
//!     .define(&ctx)?;
//! ```

mod annotation;
mod context;
mod factory;
mod kind;
mod reference;
mod registry;
mod target;

pub use annotation::{Annotation, AnnotationApplication, AnnotationStub};
pub use context::AnnotationContext;
pub use factory::{AnnotationFactory, AnnotationFactoryHook, FactoryHook, HookContext};
pub use kind::AnnotationKind;
pub use reference::AnnotationRef;
pub use registry::{AnnotationQuery, AnnotationRegistry};
pub use target::{AnnotationTarget, TargetKey};

pub(crate) use factory::apply_annotation;
