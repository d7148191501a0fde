//! Aspectra Weaving Engine
//!
//! Runtime aspect-oriented programming over an explicit class registry:
//! - **Classes**: dynamic classes and instances whose members dispatch
//!   through replaceable slots (`class` module)
//! - **Annotations**: portable annotations applied at class definition and
//!   recorded per target (`annotation` module)
//! - **Reflection**: the context arena holding every registry (`reflect` module)
//! - **Pointcuts**: the `on::*` selection DSL (`pointcut` module)
//! - **Aspects and advices**: advice declaration, ordering and registries
//!   (`aspect` and `advice` modules)
//! - **Weaver**: JIT interception of matched members (`weaver` module)
//! - **Mixins**: annotation bridging between ecosystems (`mixin` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::{Arc, LazyLock};
//! use aspectra_engine::*;
//!
//! static LOG: LazyLock<Annotation> = LazyLock::new(|| AnnotationFactory::new("demo").create("Log"));
//!
//! struct Logging;
//! impl AspectType for Logging {
//!     fn register(self: Arc<Self>, advices: &mut AdviceSet) {
//!         advices.before(on::methods().with_annotations(&[&LOG]), |ctx| {
//!             tracing::info!(target = %ctx.target(), "call");
//!             Ok(())
//!         });
//!     }
//! }
//!
//! let ctx = ReflectContext::new();
//! ctx.weaver()?.enable_aspect(Logging)?;
//!
//! let service = ClassBuilder::new("Service")
//!     .method(MethodBuilder::new("run", |_, _| Ok(Value::from(42))).annotate(LOG.bare()))
//!     .define(&ctx)?;
//! let result = service.instantiate(vec![])?.call("run", vec![])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_inception)]
#![allow(clippy::type_complexity)]

// ============================================================================
// Core Modules
// ============================================================================

pub mod advice;
pub mod annotation;
pub mod aspect;
pub mod class;
pub mod config;
pub mod error;
pub mod logging;
pub mod mixin;
pub mod pointcut;
pub mod reflect;
pub mod value;
pub mod weaver;

// ============================================================================
// Re-exports
// ============================================================================

pub use advice::{
    Advice, AdviceBinding, AdviceContext, AdviceRegistry, AroundContext, CompileContext, JoinPoint,
    JoinPointState, Order,
};
pub use annotation::{
    Annotation, AnnotationApplication, AnnotationContext, AnnotationFactory, AnnotationFactoryHook,
    AnnotationKind, AnnotationRef, AnnotationRegistry, AnnotationTarget, FactoryHook, HookContext,
};
pub use aspect::{AdviceSet, AspectOptions, AspectRegistry, AspectType};
pub use class::{Class, ClassBuilder, ClassRegistry, Instance, MemberKey, MethodBuilder, PropertyBuilder};
pub use config::{ConfigError, DuplicateAspectPolicy, WeaverConfig};
pub use error::{AdviceError, AspectError, Error, Result, WeavingError};
pub use mixin::{AnnotationMixin, ArgsAdapter, BridgeTarget, ForeignDecorator};
pub use pointcut::{on, Pointcut, PointcutExpression, PointcutPhase, PointcutTargetKind};
pub use reflect::{
    configure_testing_context, reflect_context, set_reflect_context, ReflectContext, ReflectModule,
    ReflectProvider, TestingReflectContext,
};
pub use value::Value;
pub use weaver::{abstract_value, get_weaver, JitWeaver, WeaverModule};
