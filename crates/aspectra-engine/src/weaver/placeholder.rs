//! `abstract` placeholder
//!
//! A woven member whose body is supplied by advices returns
//! [`abstract_value`] as a stand-in. The weaver arms one token on the current
//! thread around each original call of a woven member; the placeholder
//! consumes it. Without an armed token (member not woven, second use in the
//! same call) the placeholder fails.

use std::cell::RefCell;

use crate::error::{AspectError, Result};
use crate::value::Value;

thread_local! {
    /// One entry per woven call in progress; true once consumed
    static TOKENS: RefCell<Vec<bool>> = const { RefCell::new(Vec::new()) };
}

/// Placeholder return value for members implemented by advices
///
/// The template travels inside [`Value::Abstract`]; advices usually replace
/// it, [`Value::into_template`] unwraps it otherwise.
pub fn abstract_value(template: impl Into<Value>) -> Result<Value> {
    let consumed = TOKENS.with(|tokens| match tokens.borrow_mut().last_mut() {
        Some(token) if !*token => {
            *token = true;
            true
        }
        _ => false,
    });
    if consumed {
        Ok(Value::Abstract(Box::new(template.into())))
    } else {
        Err(AspectError::AbstractPlaceholder.into())
    }
}

/// Arm a token for one original call
pub(crate) fn arm() -> PlaceholderGuard {
    TOKENS.with(|tokens| tokens.borrow_mut().push(false));
    PlaceholderGuard { _private: () }
}

/// Pops its token when dropped
pub(crate) struct PlaceholderGuard {
    _private: (),
}

impl PlaceholderGuard {
    /// Check the original's result against the token
    ///
    /// A consumed token must come back as the returned value.
    pub(crate) fn check(&self, result: Result<Value>, verify: bool) -> Result<Value> {
        let consumed = TOKENS.with(|tokens| tokens.borrow().last().copied().unwrap_or(false));
        match result {
            Ok(value) if verify && consumed && !value.is_abstract() => {
                Err(AspectError::AbstractPlaceholder.into())
            }
            other => other,
        }
    }
}

impl Drop for PlaceholderGuard {
    fn drop(&mut self) {
        TOKENS.with(|tokens| {
            tokens.borrow_mut().pop();
        });
    }
}
