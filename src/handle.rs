//! Foreign value handles
//!
//! A foreign value lives in another runtime (a script engine, a VM) and is
//! only reachable through an opaque reference. Handles hold that reference
//! strongly or weakly; adapters always hold theirs strongly, so the foreign
//! value outlives the adapter and is released when the adapter drops.

use crate::errors::{ProxyError, Result};
use crate::synth::Adapter;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// A value owned by a foreign runtime
pub trait ForeignObject: Any + Send + Sync + fmt::Debug {
    /// Foreign-side type name, checked against `ValueType::Object`
    fn type_name(&self) -> &str {
        "object"
    }

    fn as_any(&self) -> &dyn Any;
}

/// Shared reference to a foreign value
pub type ForeignValue = Arc<dyn ForeignObject>;

/// Strong or weak reference to a foreign value
#[derive(Clone)]
pub enum ForeignHandle {
    Strong(ForeignValue),
    Weak(Weak<dyn ForeignObject>),
}

impl ForeignHandle {
    /// Wrap a foreign value, keeping it alive unless `weak` is set
    pub fn wrap(value: ForeignValue, weak: bool) -> Self {
        trace!(target: "handle", type_name = value.type_name(), weak, "wrapping foreign value");
        if weak {
            Self::Weak(Arc::downgrade(&value))
        } else {
            Self::Strong(value)
        }
    }

    /// The live foreign value, or `HandleExpired` if a weak target was reclaimed
    pub fn get(&self) -> Result<ForeignValue> {
        match self {
            Self::Strong(value) => Ok(Arc::clone(value)),
            Self::Weak(weak) => weak.upgrade().ok_or(ProxyError::HandleExpired),
        }
    }

    #[inline]
    pub fn is_weak(&self) -> bool {
        matches!(self, Self::Weak(_))
    }

    pub fn is_alive(&self) -> bool {
        match self {
            Self::Strong(_) => true,
            Self::Weak(weak) => weak.strong_count() > 0,
        }
    }

    /// A weak handle to the same value
    pub fn downgrade(&self) -> Self {
        match self {
            Self::Strong(value) => Self::Weak(Arc::downgrade(value)),
            Self::Weak(weak) => Self::Weak(weak.clone()),
        }
    }

    /// Number of strong references to the foreign value (0 once reclaimed)
    pub fn strong_count(&self) -> usize {
        match self {
            Self::Strong(value) => Arc::strong_count(value),
            Self::Weak(weak) => weak.strong_count(),
        }
    }
}

impl fmt::Debug for ForeignHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong(value) => write!(f, "ForeignHandle::Strong({:?})", value),
            Self::Weak(weak) => match weak.upgrade() {
                Some(value) => write!(f, "ForeignHandle::Weak({:?})", value),
                None => write!(f, "ForeignHandle::Weak(<expired>)"),
            },
        }
    }
}

/// The foreign value behind `instance`, if it is an adapter
///
/// Accepts both `Adapter` and `Arc<Adapter>`; anything else yields `None`.
pub fn try_get_foreign_value(instance: &dyn Any) -> Option<ForeignValue> {
    let adapter = instance
        .downcast_ref::<Adapter>()
        .or_else(|| instance.downcast_ref::<Arc<Adapter>>().map(|arc| arc.as_ref()))?;
    adapter.foreign_value().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Script(u32);

    impl ForeignObject for Script {
        fn type_name(&self) -> &str {
            "Script"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_strong_handle_keeps_value_alive() {
        let value: ForeignValue = Arc::new(Script(1));
        let handle = ForeignHandle::wrap(value.clone(), false);
        drop(value);

        let live = handle.get().unwrap();
        assert_eq!(live.as_any().downcast_ref::<Script>().unwrap().0, 1);
        assert!(handle.is_alive());
    }

    #[test]
    fn test_weak_handle_expires() {
        let value: ForeignValue = Arc::new(Script(2));
        let handle = ForeignHandle::wrap(value.clone(), true);
        assert!(handle.is_weak());
        assert!(handle.get().is_ok());

        drop(value);
        assert!(!handle.is_alive());
        assert_eq!(handle.get().unwrap_err(), ProxyError::HandleExpired);
    }

    #[test]
    fn test_downgrade_shares_target() {
        let value: ForeignValue = Arc::new(Script(3));
        let strong = ForeignHandle::wrap(value, false);
        let weak = strong.downgrade();

        assert!(Arc::ptr_eq(&strong.get().unwrap(), &weak.get().unwrap()));
        drop(strong);
        assert_eq!(weak.get().unwrap_err(), ProxyError::HandleExpired);
    }

    #[test]
    fn test_non_adapter_has_no_foreign_value() {
        assert!(try_get_foreign_value(&42u32).is_none());
        assert!(try_get_foreign_value(&"adapter").is_none());
    }
}
