//! Advices
//!
//! An [`Advice`] is a callback declared by an aspect, bound to one or more
//! pointcut expressions, running in one [`PointcutPhase`](crate::pointcut::PointcutPhase).
//! Advices are ordered by phase, then [`Order`] (lower runs first, and
//! outermost for around advices), then declaration sequence.

mod advice;
mod context;
mod joinpoint;
mod order;
mod registry;

pub use advice::{
    Advice, AdviceBinding, AdviceFn, AdviceId, AfterFn, AfterReturnFn, AfterThrowFn, AroundFn,
    BeforeFn, CompileFn,
};
pub use context::{AdviceContext, AroundContext, CompileContext};
pub use joinpoint::{JoinPoint, JoinPointState};
pub use order::Order;
pub use registry::AdviceRegistry;

pub(crate) use advice::next_sequence;
pub(crate) use registry::instance_key;
