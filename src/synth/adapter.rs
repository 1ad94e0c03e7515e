//! Adapter instances
//!
//! An adapter pairs a synthesized type with a strong handle to the foreign
//! value it forwards to. All behavior lives in the type's shared dispatch
//! table; the adapter itself only carries the handle.

use super::SynthesizedType;
use crate::errors::Result;
use crate::handle::{ForeignHandle, ForeignValue};
use crate::marshal::DispatchKind;
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

/// Instance of a synthesized type
pub struct Adapter {
    ty: Arc<SynthesizedType>,
    handle: ForeignHandle,
}

impl Adapter {
    pub(crate) fn new(ty: Arc<SynthesizedType>, value: ForeignValue) -> Self {
        Self {
            ty,
            handle: ForeignHandle::wrap(value, false),
        }
    }

    pub fn synthesized_type(&self) -> &Arc<SynthesizedType> {
        &self.ty
    }

    pub fn handle(&self) -> &ForeignHandle {
        &self.handle
    }

    /// The foreign value this adapter forwards to
    pub fn foreign_value(&self) -> Result<ForeignValue> {
        self.handle.get()
    }

    /// Whether the adapter's type implements `interface` (directly or through a base)
    pub fn implements(&self, interface: &str) -> bool {
        self.ty.implements(interface)
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.invoke(None, name, DispatchKind::Get, &[])
    }

    pub fn get_on(&self, interface: &str, name: &str) -> Result<Value> {
        self.invoke(Some(interface), name, DispatchKind::Get, &[])
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.invoke(None, name, DispatchKind::Set, &[value.into()])
            .map(drop)
    }

    pub fn set_on(&self, interface: &str, name: &str, value: impl Into<Value>) -> Result<()> {
        self.invoke(Some(interface), name, DispatchKind::Set, &[value.into()])
            .map(drop)
    }

    pub fn get_indexed(&self, name: &str, index: &[Value]) -> Result<Value> {
        self.invoke(None, name, DispatchKind::Get, index)
    }

    pub fn get_indexed_on(&self, interface: &str, name: &str, index: &[Value]) -> Result<Value> {
        self.invoke(Some(interface), name, DispatchKind::Get, index)
    }

    /// Assign an indexed property; index arguments precede the value
    pub fn set_indexed(&self, name: &str, index: &[Value], value: impl Into<Value>) -> Result<()> {
        let args = with_trailing(index, value.into());
        self.invoke(None, name, DispatchKind::Set, &args).map(drop)
    }

    pub fn set_indexed_on(
        &self,
        interface: &str,
        name: &str,
        index: &[Value],
        value: impl Into<Value>,
    ) -> Result<()> {
        let args = with_trailing(index, value.into());
        self.invoke(Some(interface), name, DispatchKind::Set, &args)
            .map(drop)
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.invoke(None, name, DispatchKind::Call, args)
    }

    pub fn call_on(&self, interface: &str, name: &str, args: &[Value]) -> Result<Value> {
        self.invoke(Some(interface), name, DispatchKind::Call, args)
    }

    pub fn add_handler(&self, event: &str, handler: impl Into<Value>) -> Result<()> {
        self.invoke(None, event, DispatchKind::AddHandler, &[handler.into()])
            .map(drop)
    }

    pub fn add_handler_on(&self, interface: &str, event: &str, handler: impl Into<Value>) -> Result<()> {
        self.invoke(Some(interface), event, DispatchKind::AddHandler, &[handler.into()])
            .map(drop)
    }

    pub fn remove_handler(&self, event: &str, handler: impl Into<Value>) -> Result<()> {
        self.invoke(None, event, DispatchKind::RemoveHandler, &[handler.into()])
            .map(drop)
    }

    pub fn remove_handler_on(
        &self,
        interface: &str,
        event: &str,
        handler: impl Into<Value>,
    ) -> Result<()> {
        self.invoke(Some(interface), event, DispatchKind::RemoveHandler, &[handler.into()])
            .map(drop)
    }

    /// Invoke a slot by index, skipping name resolution
    pub fn invoke_slot(&self, slot: usize, args: &[Value]) -> Result<Value> {
        let body = self.ty.body(slot)?;
        body(self, args)
    }

    /// Resolve `name` to a slot of `kind` and invoke it.
    ///
    /// `interface` restricts resolution to members declared by that interface.
    pub fn invoke(
        &self,
        interface: Option<&str>,
        name: &str,
        kind: DispatchKind,
        args: &[Value],
    ) -> Result<Value> {
        let slot = self.ty.resolve_slot(interface, name, kind, args.len())?;
        self.invoke_slot(slot, args)
    }

    /// Like `invoke`, resolving `name` among the members `view` declares or inherits
    pub fn invoke_as(&self, view: &str, name: &str, kind: DispatchKind, args: &[Value]) -> Result<Value> {
        let slot = self.ty.resolve_slot_as(view, name, kind, args.len())?;
        self.invoke_slot(slot, args)
    }
}

fn with_trailing(index: &[Value], value: Value) -> Vec<Value> {
    let mut args = Vec::with_capacity(index.len() + 1);
    args.extend_from_slice(index);
    args.push(value);
    args
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("type", &self.ty.name())
            .field("handle", &self.handle)
            .finish()
    }
}
