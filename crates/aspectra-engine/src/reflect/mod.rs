//! Reflection context
//!
//! A [`ReflectContext`] is the arena every other component lives in: the
//! annotation registry, the class registry, the aspect and advice
//! registries and the weaver are all providers resolved lazily from it.
//! Modules contribute providers and factory hooks.
//!
//! Contexts are explicit values. For code that cannot thread a handle
//! around, [`reflect_context`] returns the current thread's context and
//! [`set_reflect_context`] replaces it. Tests use
//! [`configure_testing_context`] to get a resettable one.

mod context;
mod module;
mod testing;

pub use context::{
    reflect_context, set_reflect_context, ReflectContext, ReflectProvider, WeakReflectContext,
};
pub use module::{AnnotationsModule, ReflectModule};
pub use testing::{configure_testing_context, TestingReflectContext};
