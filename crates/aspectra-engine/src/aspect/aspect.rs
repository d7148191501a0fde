//! Aspect trait and options

use std::any::{type_name, Any};
use std::sync::Arc;

use super::AdviceSet;
use crate::advice::Order;

/// Upcast support for aspect trait objects
pub trait AsAnyArc: Any + Send + Sync {
    /// Convert to `Arc<dyn Any>` for downcasting
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Concrete type name
    fn aspect_type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn aspect_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Options of an aspect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AspectOptions {
    /// Aspect id; generated from the type name when absent
    pub id: Option<String>,
    /// Default order of the aspect's advices
    pub order: Option<Order>,
}

impl AspectOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the aspect id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the default advice order
    pub fn order(mut self, order: impl Into<Order>) -> Self {
        self.order = Some(order.into());
        self
    }
}

/// A type declaring advices
pub trait AspectType: AsAnyArc {
    /// Aspect options
    fn options(&self) -> AspectOptions {
        AspectOptions::default()
    }

    /// Declare the aspect's advices
    fn register(self: Arc<Self>, advices: &mut AdviceSet);
}
