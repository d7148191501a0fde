//! Pointcut expressions
//!
//! A pointcut selects code locations by kind and annotations:
//!
//! ```rust,ignore
//! on::methods().with_annotations(&[&cacheable])
//! on::properties().setters().with_annotations(&[&validated]).search_parents(true)
//! on::classes()
//! ```
//!
//! Matching is a pure function of the annotation registry, evaluated when a
//! target is woven.

mod expression;
mod pointcut;

pub use expression::{PointcutExpression, PointcutTargetKind};
pub use pointcut::{Pointcut, PointcutPhase};

/// Entry points of the pointcut builder
pub mod on {
    use super::{PointcutExpression, PointcutTargetKind};

    /// Match classes (their constructor)
    pub fn classes() -> PointcutExpression {
        PointcutExpression::new(PointcutTargetKind::Class)
    }

    /// Match methods
    pub fn methods() -> PointcutExpression {
        PointcutExpression::new(PointcutTargetKind::Method)
    }

    /// Match property reads; `.setters()` switches to property writes
    pub fn properties() -> PointcutExpression {
        PointcutExpression::new(PointcutTargetKind::PropertyGet)
    }

    /// Match method parameters (weaves the declaring method)
    pub fn parameters() -> PointcutExpression {
        PointcutExpression::new(PointcutTargetKind::Parameter)
    }
}
