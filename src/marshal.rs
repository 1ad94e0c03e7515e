//! Marshaler contract
//!
//! The marshaler owns value conversion across the boundary. The synthesizer
//! only asks it for one dispatch delegate per member slot, keyed by the
//! declaring interface and member name so same-named members of different
//! interfaces stay distinct.

use crate::errors::MarshalError;
use crate::handle::ForeignValue;
use crate::types::{Param, Value, ValueType};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Which accessor of a member a slot forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DispatchKind {
    Get,
    Set,
    Call,
    AddHandler,
    RemoveHandler,
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Call => "call",
            Self::AddHandler => "add",
            Self::RemoveHandler => "remove",
        };
        f.write_str(name)
    }
}

/// Bound callable performing one member's foreign call.
///
/// Receives the foreign target and the arguments in declared order
/// (index arguments first, then the assigned value for setters).
pub type DispatchDelegate =
    Arc<dyn Fn(&ForeignValue, &[Value]) -> Result<Value, MarshalError> + Send + Sync>;

/// What the synthesizer asks the marshaler for, once per slot
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    /// Interface being implemented
    pub interface: &'a str,
    /// Interface that declares the member (differs for inherited members)
    pub declaring_interface: &'a str,
    pub member: &'a str,
    pub kind: DispatchKind,
    pub overload: usize,
    pub params: &'a [Param],
    /// Return type or property type
    pub ty: &'a ValueType,
}

/// Supplies forwarding behavior for synthesized members
pub trait Marshaler: Send + Sync {
    /// Delegate for one slot, or `None` when the member cannot be forwarded.
    ///
    /// Declining a member does not abort synthesis; calls to that member fail
    /// with `UnsupportedMember` instead.
    fn resolve_dispatch(&self, request: &DispatchRequest<'_>) -> Option<DispatchDelegate>;
}

impl<M: Marshaler + ?Sized> Marshaler for Arc<M> {
    fn resolve_dispatch(&self, request: &DispatchRequest<'_>) -> Option<DispatchDelegate> {
        (**self).resolve_dispatch(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    declaring_interface: String,
    member: String,
    kind: DispatchKind,
    overload: usize,
}

/// Marshaler backed by an explicit table of delegates
#[derive(Default, Clone)]
pub struct TableMarshaler {
    delegates: HashMap<TableKey, DispatchDelegate>,
}

impl TableMarshaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delegate for `(declaring_interface, member, kind)`
    pub fn with(
        mut self,
        declaring_interface: &str,
        member: &str,
        kind: DispatchKind,
        delegate: impl Fn(&ForeignValue, &[Value]) -> Result<Value, MarshalError> + Send + Sync + 'static,
    ) -> Self {
        self.insert(declaring_interface, member, kind, 0, Arc::new(delegate));
        self
    }

    pub fn on_get(
        self,
        declaring_interface: &str,
        member: &str,
        delegate: impl Fn(&ForeignValue, &[Value]) -> Result<Value, MarshalError> + Send + Sync + 'static,
    ) -> Self {
        self.with(declaring_interface, member, DispatchKind::Get, delegate)
    }

    pub fn on_set(
        self,
        declaring_interface: &str,
        member: &str,
        delegate: impl Fn(&ForeignValue, &[Value]) -> Result<Value, MarshalError> + Send + Sync + 'static,
    ) -> Self {
        self.with(declaring_interface, member, DispatchKind::Set, delegate)
    }

    pub fn on_call(
        self,
        declaring_interface: &str,
        member: &str,
        delegate: impl Fn(&ForeignValue, &[Value]) -> Result<Value, MarshalError> + Send + Sync + 'static,
    ) -> Self {
        self.with(declaring_interface, member, DispatchKind::Call, delegate)
    }

    /// Register a delegate for a specific overload of a method
    pub fn on_call_overload(
        mut self,
        declaring_interface: &str,
        member: &str,
        overload: usize,
        delegate: impl Fn(&ForeignValue, &[Value]) -> Result<Value, MarshalError> + Send + Sync + 'static,
    ) -> Self {
        self.insert(declaring_interface, member, DispatchKind::Call, overload, Arc::new(delegate));
        self
    }

    pub fn insert(
        &mut self,
        declaring_interface: &str,
        member: &str,
        kind: DispatchKind,
        overload: usize,
        delegate: DispatchDelegate,
    ) {
        let key = TableKey {
            declaring_interface: declaring_interface.to_string(),
            member: member.to_string(),
            kind,
            overload,
        };
        self.delegates.insert(key, delegate);
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl Marshaler for TableMarshaler {
    fn resolve_dispatch(&self, request: &DispatchRequest<'_>) -> Option<DispatchDelegate> {
        let key = TableKey {
            declaring_interface: request.declaring_interface.to_string(),
            member: request.member.to_string(),
            kind: request.kind,
            overload: request.overload,
        };
        self.delegates.get(&key).cloned()
    }
}

impl fmt::Debug for TableMarshaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .delegates
            .keys()
            .map(|k| format!("{} {}.{}#{}", k.kind, k.declaring_interface, k.member, k.overload))
            .collect();
        keys.sort();
        f.debug_struct("TableMarshaler").field("delegates", &keys).finish()
    }
}
