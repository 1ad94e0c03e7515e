//! Adapter type synthesis
//!
//! Design: a synthesized type is a runtime object, not generated machine
//! code. It carries the interface it implements, a slot layout (the
//! v-table shape) and a dispatch table of boxed forwarding closures.
//!
//! Architecture:
//! - `layout.rs` - slot assignment, phase one (SlotKey, SlotLayout)
//! - `emit.rs` - forwarding bodies bound into each slot
//! - `adapter.rs` - instances pairing a type with a foreign handle
//! - `factory.rs` - Synthesizer, cached ProxyFactory, the adapter module
//!
//! Synthesis is two-phase. The type object is created with its layout
//! first; the marshaler is then asked for one delegate per slot and the
//! resulting table is stored once, read-only from then on.

mod adapter;
mod emit;
mod factory;
mod layout;

pub use adapter::Adapter;
pub use emit::ForwardingBody;
pub use factory::{global, implement, install_global, AdapterModule, ProxyFactory, Synthesizer};
pub use layout::{SlotKey, SlotLayout};

pub(crate) use emit::EmitContext;

use crate::config::EventPolicy;
use crate::descriptor::{InterfaceDescriptor, MemberKind};
use crate::errors::{ProxyError, Result};
use crate::handle::ForeignValue;
use crate::marshal::{DispatchKind, DispatchRequest, Marshaler};
use crate::types::TypeInfo;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A concrete type implementing one interface by forwarding
pub struct SynthesizedType {
    name: String,
    interface: Arc<TypeInfo>,
    descriptor: InterfaceDescriptor,
    layout: SlotLayout,
    table: OnceCell<Vec<ForwardingBody>>,
}

impl SynthesizedType {
    /// Phase one: lay out the slots, leaving the dispatch table empty
    pub(crate) fn define(name: String, interface: Arc<TypeInfo>, descriptor: InterfaceDescriptor) -> Self {
        let layout = SlotLayout::from_descriptor(&descriptor);
        debug!(target: "synth", name = %name, slots = layout.len(), "defined type shape");
        Self {
            name,
            interface,
            descriptor,
            layout,
            table: OnceCell::new(),
        }
    }

    /// Phase two: resolve one delegate per slot and store the table
    pub(crate) fn bind(
        &self,
        marshaler: &dyn Marshaler,
        events: EventPolicy,
        ctx: &EmitContext,
    ) -> Result<()> {
        if events == EventPolicy::Reject {
            if let Some(event) = self.descriptor.events().next() {
                return Err(ProxyError::unsupported(
                    event.declaring_interface.clone(),
                    event.name.clone(),
                    "events are rejected by configuration",
                ));
            }
        }

        let bodies: Vec<ForwardingBody> = self
            .layout
            .entries()
            .iter()
            .map(|entry| {
                let member = &self.descriptor.members()[entry.member];
                let kind = entry.key.kind;
                let delegate = match member.kind {
                    MemberKind::Event => None,
                    _ => {
                        let params = emit::slot_params(member, kind);
                        marshaler.resolve_dispatch(&DispatchRequest {
                            interface: self.descriptor.interface(),
                            declaring_interface: &member.declaring_interface,
                            member: &member.name,
                            kind,
                            overload: member.overload,
                            params: &params,
                            ty: &member.ty,
                        })
                    }
                };
                trace!(target: "synth", slot = %entry.key, bound = delegate.is_some(), "binding slot");
                emit::emit_slot(ctx, member, kind, delegate)
            })
            .collect();

        self.table
            .set(bodies)
            .map_err(|_| ProxyError::AlreadyBound(self.name.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interface(&self) -> &Arc<TypeInfo> {
        &self.interface
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    /// Whether instances satisfy `interface`, either the implemented one or a base
    pub fn implements(&self, interface: &str) -> bool {
        self.descriptor.implements(interface)
    }

    pub fn slot_count(&self) -> usize {
        self.layout.len()
    }

    pub fn is_bound(&self) -> bool {
        self.table.get().is_some()
    }

    /// Slot an access by member name resolves to
    pub fn resolve_slot(
        &self,
        interface: Option<&str>,
        name: &str,
        kind: DispatchKind,
        argc: usize,
    ) -> Result<usize> {
        self.layout.resolve(&self.descriptor, interface, name, kind, argc)
    }

    /// Slot `name` resolves to as seen from `view`, the implemented
    /// interface or one of its bases
    pub fn resolve_slot_as(&self, view: &str, name: &str, kind: DispatchKind, argc: usize) -> Result<usize> {
        self.layout.resolve_as(&self.descriptor, view, name, kind, argc)
    }

    pub(crate) fn body(&self, slot: usize) -> Result<&ForwardingBody> {
        let table = self
            .table
            .get()
            .ok_or_else(|| ProxyError::NotBound(self.name.clone()))?;
        table.get(slot).ok_or_else(|| ProxyError::MemberNotFound {
            interface: self.descriptor.interface().to_string(),
            member: format!("slot {}", slot),
        })
    }

    /// Construct an adapter holding a strong handle to `value`
    pub fn construct(self: &Arc<Self>, value: ForeignValue) -> Result<Arc<Adapter>> {
        if !self.is_bound() {
            return Err(ProxyError::NotBound(self.name.clone()));
        }
        trace!(target: "synth", name = %self.name, "constructing adapter");
        Ok(Arc::new(Adapter::new(Arc::clone(self), value)))
    }
}

impl fmt::Debug for SynthesizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesizedType")
            .field("name", &self.name)
            .field("interface", &self.descriptor.interface())
            .field("slots", &self.layout.len())
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Construct an adapter of `ty` around `value`
pub fn construct_adapter(ty: &Arc<SynthesizedType>, value: ForeignValue) -> Result<Arc<Adapter>> {
    ty.construct(value)
}

#[cfg(test)]
mod tests;
