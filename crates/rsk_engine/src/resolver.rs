//! Replacement resolution.
//!
//! Runs synchronously on the caller's thread, inside the before phase of
//! every intercepted accessor call. The general path:
//!
//! 1. opportunistically bootstrap a bundle context if none is registered
//! 2. bail out if the requested identifier is already being substituted
//!    (the reentrancy guard that breaks replacement cycles)
//! 3. derive the structural identity from the calling context
//! 4. probe the replacement table, exact scope first, then any-scope
//! 5. produce a value by replacement kind: Object as stored (text accessor
//!    demands a text value), Density scaled by the caller's display
//!    density, Identifier delegated to a registered bundle context under
//!    the in-flight guard
//! 6. normalize the value to the accessor's return contract
//!
//! A `None` anywhere means "no override": the original accessor body runs
//! unmodified. The one deliberate error is an Identifier replacement whose
//! target no registered bundle context can even name; that propagates the
//! host's not-found failure, because it is a broken override rule the
//! integrator has to fix rather than something to paper over.
//!
//! The typed-attribute path is much narrower: decode the slot, serve only
//! Object replacements, no coercion, no delegation.

use rsk_host::{
    AccessorKind, AccessorOutcome, HostError, ResId, ResolutionContext, ReturnShape,
    SLOT_TYPE_NULL, TypedSlots, Value,
};

use crate::engine::EngineCore;
use crate::table::ReplacementEntry;

impl EngineCore {
    /// Resolve one intercepted accessor call on the general resource
    /// surface. `Some` short-circuits the call with the outcome; `None`
    /// falls through to the original accessor.
    pub(crate) fn resolve_accessor(
        &self,
        ctx: &dyn ResolutionContext,
        kind: AccessorKind,
        args: &[i64],
    ) -> Option<AccessorOutcome> {
        self.bootstrap_contexts();

        let raw = *args.first()?;
        let id = u32::try_from(raw).ok().filter(|&id| id != 0)?;
        if self.in_flight.contains(id) {
            return None;
        }

        let identity = ctx.identify(id).ok()?;
        let entry = self.replacements.lookup(&identity)?;

        let outcome = match entry {
            ReplacementEntry::Object(value) => {
                if kind == AccessorKind::Text && !value.is_text() {
                    tracing::warn!(
                        "Object replacement for {} is {}, not text; ignoring for '{}'",
                        identity,
                        value.type_name(),
                        kind.name()
                    );
                    return None;
                }
                Ok(value)
            }
            ReplacementEntry::Density(density) => {
                if kind == AccessorKind::Text {
                    tracing::warn!(
                        "Density replacement for {} cannot serve the '{}' accessor",
                        identity,
                        kind.name()
                    );
                    return None;
                }
                let Some(magnitude) = density.magnitude() else {
                    tracing::warn!("Density replacement for {} is unparsable; ignoring", identity);
                    return None;
                };
                Ok(Value::Float(magnitude * ctx.density_scale()))
            }
            ReplacementEntry::Identifier(target) => self.delegate_to_bundle(kind, args, target)?,
        };

        match outcome {
            Ok(value) => normalize(kind, value).map(Ok),
            Err(err) => Some(Err(err)),
        }
    }

    /// Resolve one intercepted typed-block access. Serves Object
    /// replacements only; everything else falls through.
    pub(crate) fn resolve_typed_slot(
        &self,
        slots: &TypedSlots,
        index: i64,
        _default: i64,
    ) -> Option<Value> {
        let index = usize::try_from(index).ok()?;
        let (ty, id) = slots.slot_at(index)?;
        if ty == SLOT_TYPE_NULL || id == 0 {
            return None;
        }

        let identity = slots.owner().identify(id).ok()?;
        match self.replacements.lookup(&identity)? {
            ReplacementEntry::Object(value) => Some(value),
            _ => None,
        }
    }

    /// Re-invoke the intercepted accessor against a registered bundle
    /// context, with `target` substituted for the original identifier and
    /// any trailing arguments passed through unchanged.
    fn delegate_to_bundle(
        &self,
        kind: AccessorKind,
        args: &[i64],
        target: ResId,
    ) -> Option<AccessorOutcome> {
        if target == 0 {
            return None;
        }

        let contexts = self.loader.contexts();
        let mut validated = false;
        for bundle_ctx in contexts.iter() {
            if bundle_ctx.identify(target).is_err() {
                continue;
            }
            validated = true;

            let mut delegate_args = Vec::with_capacity(args.len());
            delegate_args.push(target as i64);
            delegate_args.extend_from_slice(&args[1..]);

            let result = {
                let _guard = self.in_flight.enter(target);
                bundle_ctx.invoke(kind, &delegate_args)
            };
            match result {
                Ok(value) => return Some(Ok(value)),
                Err(err) => {
                    tracing::debug!(
                        "Delegated '{}' against {} failed: {}",
                        kind.name(),
                        bundle_ctx.label(),
                        err
                    );
                }
            }
        }

        if !validated {
            // No registered bundle context can even name the target: a
            // misconfigured rule, surfaced as the host's standard failure.
            return Some(Err(HostError::NotFound { id: target }));
        }
        None
    }

    fn bootstrap_contexts(&self) {
        if !self.loader.is_empty() {
            return;
        }
        let Some(probe) = self.probe.get() else {
            return;
        };
        let Some(ctx) = probe() else {
            return;
        };
        if !self.loader.load_into(&ctx, false) {
            tracing::debug!("Opportunistic bundle attachment failed for {}", ctx.label());
        }
    }
}

/// Coerce a resolved value to the exact type the accessor is contractually
/// obligated to return. `None` (logged) means the value cannot satisfy the
/// contract and the override is dropped.
fn normalize(kind: AccessorKind, value: Value) -> Option<Value> {
    match kind.returns() {
        ReturnShape::RoundedInt => match value.as_f64() {
            Some(v) => Some(Value::Int(v.round() as i64)),
            None => mismatch(kind, value),
        },
        ReturnShape::Float => match value.as_f64() {
            Some(v) => Some(Value::Float(v)),
            None => mismatch(kind, value),
        },
        ReturnShape::Bool => match value {
            Value::Bool(_) => Some(value),
            _ => mismatch(kind, value),
        },
        ReturnShape::Text => match value {
            Value::Text(_) => Some(value),
            _ => mismatch(kind, value),
        },
        ReturnShape::Passthrough => Some(value),
    }
}

fn mismatch(kind: AccessorKind, value: Value) -> Option<Value> {
    tracing::warn!(
        "Replacement value of type {} cannot satisfy the '{}' return contract",
        value.type_name(),
        kind.name()
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rounds_integral_contracts() {
        assert_eq!(
            normalize(AccessorKind::Integer, Value::Float(19.6)),
            Some(Value::Int(20))
        );
        assert_eq!(
            normalize(AccessorKind::Color, Value::Int(0xff0000)),
            Some(Value::Int(0xff0000))
        );
        assert_eq!(normalize(AccessorKind::DimensionSize, Value::Text("x".into())), None);
    }

    #[test]
    fn test_normalize_widens_float_contracts() {
        assert_eq!(
            normalize(AccessorKind::Dimension, Value::Int(4)),
            Some(Value::Float(4.0))
        );
        assert_eq!(
            normalize(AccessorKind::Float, Value::Float(1.25)),
            Some(Value::Float(1.25))
        );
    }

    #[test]
    fn test_normalize_is_strict_for_bool_and_text() {
        assert_eq!(
            normalize(AccessorKind::Boolean, Value::Bool(true)),
            Some(Value::Bool(true))
        );
        assert_eq!(normalize(AccessorKind::Boolean, Value::Float(1.0)), None);
        assert_eq!(
            normalize(AccessorKind::Text, Value::Text("t".into())),
            Some(Value::Text("t".into()))
        );
        assert_eq!(normalize(AccessorKind::Text, Value::Int(1)), None);
    }

    #[test]
    fn test_normalize_passes_collections_through() {
        let list = Value::IntList(vec![1, 2]);
        assert_eq!(normalize(AccessorKind::IntList, list.clone()), Some(list));
    }
}
