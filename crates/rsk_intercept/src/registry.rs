//! Hook storage and before-phase dispatch.
//!
//! A [`HookRegistry`] is generic over the receiver type `C` (what a hook sees
//! as `this`) and the short-circuit value type `V` (what a hook may return in
//! place of the original method body). One registry instance backs one
//! contract surface; hosts that expose several surfaces own one registry per
//! surface.
//!
//! Dispatch snapshots the installed hook list before invoking any callback,
//! so a callback is free to re-enter the registry, including re-invoking the
//! very accessor it is intercepting, without deadlocking or observing a
//! half-updated hook list.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::descriptor::MethodDescriptor;
use crate::error::HookError;

/// Before-phase callback contract.
///
/// Implementations may inspect the call and optionally short-circuit it via
/// [`BeforeInvocation::return_and_skip`]. Closures are wrapped through
/// [`hooker_fn`].
pub trait Hooker<C: ?Sized, V>: Send + Sync {
    /// Invoked before the original method body runs.
    fn before(&self, call: &mut BeforeInvocation<'_, C, V>);
}

struct FnHooker<F>(F);

impl<C, V, F> Hooker<C, V> for FnHooker<F>
where
    C: ?Sized,
    F: Fn(&mut BeforeInvocation<'_, C, V>) + Send + Sync,
{
    fn before(&self, call: &mut BeforeInvocation<'_, C, V>) {
        (self.0)(call)
    }
}

/// Wrap a closure as an installable [`Hooker`].
pub fn hooker_fn<C, V, F>(f: F) -> Arc<dyn Hooker<C, V>>
where
    C: ?Sized + 'static,
    V: 'static,
    F: Fn(&mut BeforeInvocation<'_, C, V>) + Send + Sync + 'static,
{
    Arc::new(FnHooker(f))
}

/// View of one in-flight call, handed to every installed [`Hooker`].
pub struct BeforeInvocation<'a, C: ?Sized, V> {
    receiver: &'a C,
    args: &'a [i64],
    outcome: Option<V>,
}

impl<'a, C: ?Sized, V> BeforeInvocation<'a, C, V> {
    /// The object the intercepted method was invoked on.
    pub fn receiver(&self) -> &'a C {
        self.receiver
    }

    /// Raw argument words of the call, in declaration order.
    pub fn args(&self) -> &'a [i64] {
        self.args
    }

    /// Argument word at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<i64> {
        self.args.get(index).copied()
    }

    /// Supply a return value and skip the original method body.
    ///
    /// Later hooks in the chain are not consulted.
    pub fn return_and_skip(&mut self, value: V) {
        self.outcome = Some(value);
    }
}

struct InstalledHook<C: ?Sized, V> {
    id: u64,
    hooker: Arc<dyn Hooker<C, V>>,
}

impl<C: ?Sized, V> Clone for InstalledHook<C, V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            hooker: Arc::clone(&self.hooker),
        }
    }
}

type SlotMap<C, V> = HashMap<MethodDescriptor, Vec<InstalledHook<C, V>>>;

/// Per-surface hook store.
///
/// Install hooks with [`hook`](Self::hook); the host calls
/// [`dispatch_before`](Self::dispatch_before) at the top of every
/// interceptable method. A registry built with
/// [`with_supported`](Self::with_supported) rejects installation on
/// descriptors outside its declared surface, which is how install failures
/// surface to callers that enumerate a larger method set than the registry
/// actually backs.
pub struct HookRegistry<C: ?Sized, V> {
    slots: Arc<RwLock<SlotMap<C, V>>>,
    supported: Option<HashSet<MethodDescriptor>>,
    next_id: AtomicU64,
}

impl<C: ?Sized + 'static, V: 'static> HookRegistry<C, V> {
    /// Create a registry that accepts hooks on any descriptor.
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            supported: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a registry that only accepts hooks on the given descriptors.
    pub fn with_supported(supported: impl IntoIterator<Item = MethodDescriptor>) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            supported: Some(supported.into_iter().collect()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Install a before-phase hook on `descriptor`.
    ///
    /// Hooks on the same descriptor run in installation order until one
    /// short-circuits. Returns the removal token for this installation.
    pub fn hook(
        &self,
        descriptor: MethodDescriptor,
        hooker: Arc<dyn Hooker<C, V>>,
    ) -> Result<Unhooker, HookError> {
        if let Some(supported) = &self.supported {
            if !supported.contains(&descriptor) {
                return Err(HookError::UnsupportedMethod(descriptor));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots
            .write()
            .entry(descriptor)
            .or_default()
            .push(InstalledHook { id, hooker });

        let slots = Arc::clone(&self.slots);
        let remove = move || {
            let mut slots = slots.write();
            if let Some(list) = slots.get_mut(&descriptor) {
                list.retain(|hook| hook.id != id);
                if list.is_empty() {
                    slots.remove(&descriptor);
                }
            }
        };
        Ok(Unhooker {
            descriptor,
            remove: Some(Box::new(remove)),
        })
    }

    /// Run the before phase for one call.
    ///
    /// Returns `Some(value)` if a hook short-circuited the call; the host
    /// must then return `value` without running the original body. Returns
    /// `None` when no hook is installed or every hook declined.
    pub fn dispatch_before(
        &self,
        descriptor: &MethodDescriptor,
        receiver: &C,
        args: &[i64],
    ) -> Option<V> {
        // Snapshot under the read lock, then release it before running
        // callbacks: hooks may re-enter this registry.
        let hooks = self.slots.read().get(descriptor).cloned()?;

        let mut call = BeforeInvocation {
            receiver,
            args,
            outcome: None,
        };
        for hook in &hooks {
            hook.hooker.before(&mut call);
            if call.outcome.is_some() {
                break;
            }
        }
        call.outcome
    }

    /// Number of hooks currently installed on `descriptor`.
    pub fn installed(&self, descriptor: &MethodDescriptor) -> usize {
        self.slots
            .read()
            .get(descriptor)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// `true` if no hooks are installed on any descriptor.
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl<C: ?Sized + 'static, V: 'static> Default for HookRegistry<C, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removal token for one installed hook.
///
/// Dropping the token without calling [`remove`](Self::remove) leaves the
/// hook installed.
pub struct Unhooker {
    descriptor: MethodDescriptor,
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl Unhooker {
    /// The descriptor this token's hook was installed on.
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Uninstall the hook this token was issued for.
    pub fn remove(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for Unhooker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unhooker")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREET: MethodDescriptor = MethodDescriptor::new("test", "greet", 1);
    const OTHER: MethodDescriptor = MethodDescriptor::new("test", "other", 1);

    fn registry() -> HookRegistry<str, i64> {
        HookRegistry::new()
    }

    #[test]
    fn test_dispatch_without_hooks_is_none() {
        let registry = registry();
        assert_eq!(registry.dispatch_before(&GREET, "recv", &[1]), None);
    }

    #[test]
    fn test_short_circuit_stops_the_chain() {
        let registry = registry();
        registry
            .hook(
                GREET,
                hooker_fn(|call| {
                    let doubled = call.arg(0).unwrap_or(0) * 2;
                    call.return_and_skip(doubled);
                }),
            )
            .unwrap();
        // Never reached: the first hook short-circuits.
        registry
            .hook(GREET, hooker_fn(|call| call.return_and_skip(-1)))
            .unwrap();

        assert_eq!(registry.dispatch_before(&GREET, "recv", &[21]), Some(42));
    }

    #[test]
    fn test_declining_hook_falls_through() {
        let registry = registry();
        registry.hook(GREET, hooker_fn(|_call| {})).unwrap();
        assert_eq!(registry.dispatch_before(&GREET, "recv", &[1]), None);
    }

    #[test]
    fn test_unsupported_descriptor_rejected() {
        let registry: HookRegistry<str, i64> = HookRegistry::with_supported([GREET]);
        let err = registry.hook(OTHER, hooker_fn(|_call| {})).unwrap_err();
        assert_eq!(err, HookError::UnsupportedMethod(OTHER));
        assert!(registry.hook(GREET, hooker_fn(|_call| {})).is_ok());
    }

    #[test]
    fn test_remove_uninstalls_exactly_one() {
        let registry = registry();
        let first = registry
            .hook(GREET, hooker_fn(|call| call.return_and_skip(1)))
            .unwrap();
        registry
            .hook(GREET, hooker_fn(|call| call.return_and_skip(2)))
            .unwrap();
        assert_eq!(registry.installed(&GREET), 2);

        first.remove();
        assert_eq!(registry.installed(&GREET), 1);
        assert_eq!(registry.dispatch_before(&GREET, "recv", &[0]), Some(2));
    }

    #[test]
    fn test_dropping_token_leaves_hook_installed() {
        let registry = registry();
        let token = registry
            .hook(GREET, hooker_fn(|call| call.return_and_skip(7)))
            .unwrap();
        assert_eq!(token.descriptor(), &GREET);
        drop(token);
        assert_eq!(registry.dispatch_before(&GREET, "recv", &[0]), Some(7));
    }

    #[test]
    fn test_receiver_is_visible_to_hooks() {
        let registry = registry();
        registry
            .hook(
                GREET,
                hooker_fn(|call: &mut BeforeInvocation<'_, str, i64>| {
                    let len = call.receiver().len() as i64;
                    call.return_and_skip(len);
                }),
            )
            .unwrap();
        assert_eq!(registry.dispatch_before(&GREET, "four", &[]), Some(4));
    }

    #[test]
    fn test_callbacks_may_reenter_the_registry() {
        let registry: Arc<HookRegistry<str, i64>> = Arc::new(HookRegistry::new());
        let inner = Arc::clone(&registry);
        registry
            .hook(
                GREET,
                hooker_fn(move |call| {
                    // Re-entering dispatch must not deadlock.
                    let nested = inner.dispatch_before(&OTHER, "recv", &[]).unwrap_or(10);
                    call.return_and_skip(nested + 1);
                }),
            )
            .unwrap();

        assert_eq!(registry.dispatch_before(&GREET, "recv", &[]), Some(11));
    }
}
