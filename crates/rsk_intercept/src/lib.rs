//! In-process method interception primitive.
//!
//! This crate provides the hooking seam the reskin engine is built on: a
//! [`HookRegistry`] into which *before-phase* callbacks are installed per
//! method, and through which a host dispatches every call to an
//! interceptable operation before running the original method body.
//!
//! Methods are identified by [`MethodDescriptor`] (contract surface, method
//! name, and argument count) rather than by concrete function pointers,
//! because host surfaces overload the same name across several argument
//! shapes and a hook must bind to exactly one of them.
//!
//! The callback contract is deliberately narrow: a [`Hooker`] may inspect the
//! receiver and raw argument words of an in-flight call and optionally supply
//! a return value via [`BeforeInvocation::return_and_skip`], which suppresses
//! the original method body. Hooks that decline leave the call untouched.
//!
//! Installation yields an [`Unhooker`] token; calling
//! [`remove`](Unhooker::remove) uninstalls exactly that hook. Dropping the
//! token without removing it leaves the hook installed.

pub mod descriptor;
pub mod error;
pub mod registry;

pub use descriptor::MethodDescriptor;
pub use error::HookError;
pub use registry::{BeforeInvocation, HookRegistry, Hooker, Unhooker, hooker_fn};
