//! Runtime resource override engine.
//!
//! This crate intercepts a host application's resource accessors and
//! transparently substitutes registered replacement values, without the
//! host's cooperation. It sits on two seams defined by its sibling crates:
//! the interception primitive (`rsk_intercept`) and the host
//! resolution-context model (`rsk_host`).
//!
//! Three replacement kinds exist:
//!
//! - **Object**: a pre-resolved value returned as stored
//! - **Density**: a magnitude multiplied by the calling context's display
//!   density at resolution time
//! - **Identifier**: a redirect into a packaged alternate resource bundle,
//!   resolved by re-invoking the intercepted accessor against a registered
//!   bundle context (guarded against replacement cycles)
//!
//! Replacements are keyed by structural identity `(scope, category, name)`;
//! a scope of `"*"` matches any package. Lookup probes the exact identity
//! first, then the any-scope form.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rsk_engine::OverrideEngine;
//! use rsk_host::{HostHooks, ResolutionContext, ResourceTable};
//!
//! let hooks = HostHooks::new();
//! let engine = OverrideEngine::new(Arc::clone(&hooks), "skin.pack");
//!
//! let app = Arc::new(ResourceTable::new("app", Arc::clone(&hooks)));
//! let ctx: Arc<dyn ResolutionContext> = Arc::clone(&app) as Arc<dyn ResolutionContext>;
//! engine.load_into(&ctx, false);
//!
//! engine.set_object_replacement("com.example.app", "string", "title", "Skinned");
//! engine.set_density_replacement("*", "dimen", "status_bar_height", 24.0);
//! ```

mod engine;
mod intercept;
mod loader;
mod resolver;
mod table;

pub use engine::{ContextProbe, OverrideEngine};
pub use table::{DensityValue, ReplacementEntry};
