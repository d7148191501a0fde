//! Runtime weaving
//!
//! The [`JitWeaver`] turns enabled aspects into advice chains installed on
//! class member slots. [`WeaverModule`] registers it on a reflection
//! context together with the aspect and advice registries and the factory
//! hook that weaves classes as they are defined.

mod jit;
mod placeholder;
mod woven;

use std::sync::Arc;

pub use jit::{JitWeaver, JitWeavingHook};
pub use placeholder::abstract_value;
pub use woven::WovenMember;

use crate::advice::AdviceRegistry;
use crate::annotation::AnnotationFactoryHook;
use crate::aspect::AspectRegistry;
use crate::error::Result;
use crate::reflect::{ReflectContext, ReflectModule, ReflectProvider};

/// Aspect registry, advice registry, weaver and weaving hook
#[derive(Debug, Default)]
pub struct WeaverModule;

impl ReflectModule for WeaverModule {
    fn name(&self) -> &str {
        "weaver"
    }

    fn providers(&self) -> Vec<ReflectProvider> {
        vec![
            ReflectProvider::new(|ctx: &ReflectContext| {
                AspectRegistry::new(ctx.config().duplicate_aspects)
            }),
            ReflectProvider::new(|_: &ReflectContext| AdviceRegistry::new()),
            ReflectProvider::new(JitWeaver::new),
        ]
    }

    fn hooks(&self) -> Vec<AnnotationFactoryHook> {
        vec![Arc::new(JitWeavingHook)]
    }
}

/// Weaver of a context
pub fn get_weaver(ctx: &ReflectContext) -> Result<Arc<JitWeaver>> {
    ctx.get::<JitWeaver>()
}
