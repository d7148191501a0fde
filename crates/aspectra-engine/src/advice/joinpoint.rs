//! One-shot joinpoints

use std::fmt;

use crate::error::{AdviceError, Result};
use crate::value::Value;

/// Whether a joinpoint has been proceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPointState {
    /// Not proceeded yet
    NotCalled,
    /// Proceeded once; further calls fail
    Called,
}

/// Continuation of an around advice: the next advice, or the member itself
pub struct JoinPoint<'a> {
    state: JoinPointState,
    advice: &'a str,
    next: &'a mut dyn FnMut(Vec<Value>) -> Result<Value>,
}

impl<'a> JoinPoint<'a> {
    pub(crate) fn new(advice: &'a str, next: &'a mut dyn FnMut(Vec<Value>) -> Result<Value>) -> Self {
        Self {
            state: JoinPointState::NotCalled,
            advice,
            next,
        }
    }

    /// Current state
    pub fn state(&self) -> JoinPointState {
        self.state
    }

    /// Run the rest of the chain with `args`
    ///
    /// Fails with [`AdviceError::AlreadyProceeded`] on the second call.
    pub fn proceed(&mut self, args: Vec<Value>) -> Result<Value> {
        if self.state == JoinPointState::Called {
            return Err(AdviceError::AlreadyProceeded {
                advice: self.advice.to_string(),
            }
            .into());
        }
        self.state = JoinPointState::Called;
        (self.next)(args)
    }
}

impl fmt::Debug for JoinPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinPoint")
            .field("advice", &self.advice)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_proceed_once() {
        let mut calls = 0;
        let mut next = |args: Vec<Value>| -> Result<Value> {
            calls += 1;
            Ok(Value::from(args.len()))
        };
        let mut jp = JoinPoint::new("test.around#0", &mut next);
        assert_eq!(jp.state(), JoinPointState::NotCalled);

        assert_eq!(jp.proceed(vec![Value::Unit]).unwrap(), Value::Int(1));
        assert_eq!(jp.state(), JoinPointState::Called);

        let err = jp.proceed(vec![]).unwrap_err();
        assert_eq!(
            err,
            Error::Advice(AdviceError::AlreadyProceeded {
                advice: "test.around#0".to_string()
            })
        );
        drop(jp);
        assert_eq!(calls, 1);
    }
}
