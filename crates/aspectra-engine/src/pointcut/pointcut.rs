//! Pointcut phases

use std::fmt;

use super::PointcutExpression;

/// When an advice runs relative to the member call
///
/// Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointcutPhase {
    /// Once per target, when the advice is first attached
    Compile,
    /// Before the call
    Before,
    /// Around the call, with a joinpoint
    Around,
    /// After a successful call, may replace the result
    AfterReturn,
    /// After a failed call, may swallow or replace the error
    AfterThrow,
    /// After the call, whatever its outcome
    After,
}

impl fmt::Display for PointcutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointcutPhase::Compile => "compile",
            PointcutPhase::Before => "before",
            PointcutPhase::Around => "around",
            PointcutPhase::AfterReturn => "afterReturn",
            PointcutPhase::AfterThrow => "afterThrow",
            PointcutPhase::After => "after",
        };
        f.write_str(name)
    }
}

/// A phase bound to an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Pointcut {
    /// Advice phase
    pub phase: PointcutPhase,
    /// Target selection
    pub expression: PointcutExpression,
}

impl Pointcut {
    /// Create a pointcut
    pub fn new(phase: PointcutPhase, expression: PointcutExpression) -> Self {
        Self { phase, expression }
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.phase, self.expression)
    }
}
