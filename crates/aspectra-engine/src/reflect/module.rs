//! Reflection modules

use super::ReflectProvider;
use crate::annotation::{AnnotationFactoryHook, AnnotationRegistry};
use crate::class::ClassRegistry;

/// A bundle of providers and factory hooks registered on a context
pub trait ReflectModule: Send + Sync {
    /// Module name; a context registers each name once
    fn name(&self) -> &str;

    /// Providers contributed by this module
    fn providers(&self) -> Vec<ReflectProvider> {
        Vec::new()
    }

    /// Factory hooks contributed by this module
    fn hooks(&self) -> Vec<AnnotationFactoryHook> {
        Vec::new()
    }
}

/// Core module: annotation registry and class registry
#[derive(Debug, Default)]
pub struct AnnotationsModule;

impl ReflectModule for AnnotationsModule {
    fn name(&self) -> &str {
        "annotations"
    }

    fn providers(&self) -> Vec<ReflectProvider> {
        vec![
            ReflectProvider::new(|_| AnnotationRegistry::new()),
            ReflectProvider::new(|_| ClassRegistry::new()),
        ]
    }
}
