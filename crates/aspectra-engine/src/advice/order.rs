//! Advice precedence

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Precedence of an advice or aspect; lower values run first
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Order(pub f64);

impl Order {
    /// Runs last (the default)
    pub const LOWEST_PRECEDENCE: Order = Order(f64::INFINITY);

    /// Runs first
    pub const HIGHEST_PRECEDENCE: Order = Order(f64::NEG_INFINITY);

    /// Raw value
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::LOWEST_PRECEDENCE
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Order {}

impl PartialOrd for Order {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Order {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Order {
    fn from(value: f64) -> Self {
        Order(value)
    }
}

impl From<i32> for Order {
    fn from(value: i32) -> Self {
        Order(f64::from(value))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            v if v == f64::INFINITY => f.write_str("lowest"),
            v if v == f64::NEG_INFINITY => f.write_str("highest"),
            v => write!(f, "{}", v),
        }
    }
}
