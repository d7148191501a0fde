//! Aspects
//!
//! An aspect is any `Send + Sync` type implementing [`AspectType`]. Its
//! `register` method declares advices on an [`AdviceSet`], binding
//! callbacks (usually closures capturing the aspect) to pointcuts:
//!
//! ```rust,ignore
//! struct Logging { lines: Mutex<Vec<String>> }
//!
//! impl AspectType for Logging {
//!     fn options(&self) -> AspectOptions {
//!         AspectOptions::new().id("logging")
//!     }
//!
//!     fn register(self: Arc<Self>, advices: &mut AdviceSet) {
//!         advices.before(on::methods().with_annotations(&[&LOG]), move |ctx| {
//!             self.lines.lock().push(ctx.target().to_string());
//!             Ok(())
//!         });
//!     }
//! }
//! ```
//!
//! Aspects become active once enabled on the weaver.

mod advice_set;
mod aspect;
mod registry;

pub use advice_set::{AdviceDeclaration, AdviceSet};
pub use aspect::{AsAnyArc, AspectOptions, AspectType};
pub(crate) use registry::Prepared;
pub use registry::{AspectRegistry, Registration};
