//! Annotation bridging
//!
//! An [`AnnotationMixin`] maps source annotations to targets: another
//! annotation (applied on the same location, so it is recorded, hooked and
//! woven like any other) or a [`ForeignDecorator`] standing for a third
//! party framework's decorator. Arguments are translated by an
//! [`ArgsAdapter`].
//!
//! ```rust,ignore
//! let mixin = AnnotationMixin::new()
//!     .bridge(&get, BridgeTarget::annotation(&route))
//!     .bridge(&get, BridgeTarget::foreign_adapted(router, ArgsAdapter::single(path_of)));
//! ctx.register_modules([mixin.into_module()]);
//! ```

mod bridge;

pub use bridge::{AnnotationMixin, ArgsAdapter, BridgeTarget, ForeignDecorator, MixinModule};
