//! Slot layout - phase one of synthesis
//!
//! Every forwardable accessor of every member gets a slot index. Slots are
//! keyed by declaring interface as well as member name, so same-named
//! members of different interfaces never share a slot.

use crate::descriptor::{InterfaceDescriptor, MemberKind};
use crate::errors::{ProxyError, Result};
use crate::marshal::DispatchKind;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Identity of one forwarding slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub declaring_interface: String,
    pub name: String,
    pub kind: DispatchKind,
    pub overload: usize,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.declaring_interface, self.name, self.kind)?;
        if self.overload > 0 {
            write!(f, "#{}", self.overload)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SlotEntry {
    pub key: SlotKey,
    /// Index of the member in the interface descriptor
    pub member: usize,
    /// Number of arguments the slot accepts
    pub arity: usize,
}

/// Ordered slots of a synthesized type
#[derive(Debug, Clone, Default)]
pub struct SlotLayout {
    entries: Vec<SlotEntry>,
    index: HashMap<SlotKey, usize>,
}

impl SlotLayout {
    /// Assign slots in descriptor order
    pub fn from_descriptor(descriptor: &InterfaceDescriptor) -> Self {
        let mut layout = Self::default();
        for (member_index, member) in descriptor.members().iter().enumerate() {
            for kind in member.dispatch_kinds() {
                let arity = match kind {
                    DispatchKind::Set => member.params.len() + 1,
                    _ => member.params.len(),
                };
                let key = SlotKey {
                    declaring_interface: member.declaring_interface.clone(),
                    name: member.name.clone(),
                    kind,
                    overload: member.overload,
                };
                layout.index.insert(key.clone(), layout.entries.len());
                layout.entries.push(SlotEntry {
                    key,
                    member: member_index,
                    arity,
                });
            }
        }
        layout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SlotKey> {
        self.entries.iter().map(|e| &e.key)
    }

    /// Slot index for an exact key
    pub fn slot_of(&self, key: &SlotKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub(crate) fn entries(&self) -> &[SlotEntry] {
        &self.entries
    }

    /// Pick the slot an access by name resolves to.
    ///
    /// With `interface` set, only members declared by that interface are
    /// considered. Without it, the name is looked up as seen from the
    /// implemented interface (see `resolve_as`). Overloads are chosen by
    /// argument count; if none matches, the first candidate is returned and
    /// the call fails its arity check.
    pub(crate) fn resolve(
        &self,
        descriptor: &InterfaceDescriptor,
        interface: Option<&str>,
        name: &str,
        kind: DispatchKind,
        argc: usize,
    ) -> Result<usize> {
        match interface {
            Some(declaring) => self.resolve_in(descriptor, declaring, name, kind, argc),
            None => self.resolve_as(descriptor, descriptor.interface(), name, kind, argc),
        }
    }

    /// Resolve `name` among the members `view` declares or inherits.
    ///
    /// A declaration hides every same-named declaration in the interfaces
    /// its declaring interface extends, whatever their kinds. Two visible
    /// declarations where neither hides the other are ambiguous.
    pub(crate) fn resolve_as(
        &self,
        descriptor: &InterfaceDescriptor,
        view: &str,
        name: &str,
        kind: DispatchKind,
        argc: usize,
    ) -> Result<usize> {
        let mut declaring: SmallVec<[&str; 4]> = SmallVec::new();
        for entry in &self.entries {
            let owner = entry.key.declaring_interface.as_str();
            if entry.key.name == name
                && !declaring.contains(&owner)
                && descriptor.is_or_extends(view, owner)
            {
                declaring.push(owner);
            }
        }

        let visible: SmallVec<[&str; 4]> = declaring
            .iter()
            .copied()
            .filter(|&owner| !declaring.iter().any(|&other| descriptor.extends(other, owner)))
            .collect();

        match visible.as_slice() {
            [] => Err(ProxyError::MemberNotFound {
                interface: view.to_string(),
                member: name.to_string(),
            }),
            [owner] => self.resolve_in(descriptor, owner, name, kind, argc),
            _ => Err(ProxyError::AmbiguousMember {
                member: name.to_string(),
                candidates: visible.iter().map(|d| format!("{}.{}", d, name)).collect(),
            }),
        }
    }

    /// Resolve among members declared by exactly `declaring`
    fn resolve_in(
        &self,
        descriptor: &InterfaceDescriptor,
        declaring: &str,
        name: &str,
        kind: DispatchKind,
        argc: usize,
    ) -> Result<usize> {
        let candidates: SmallVec<[usize; 4]> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.key.kind == kind && e.key.name == name && e.key.declaring_interface == declaring
            })
            .map(|(slot, _)| slot)
            .collect();

        let Some(&first) = candidates.first() else {
            return Err(self.missing(descriptor, declaring, name, kind));
        };
        Ok(candidates
            .iter()
            .copied()
            .find(|&slot| self.entries[slot].arity == argc)
            .unwrap_or(first))
    }

    /// Error for an access with no slot: unknown name or wrong accessor
    fn missing(
        &self,
        descriptor: &InterfaceDescriptor,
        declaring: &str,
        name: &str,
        kind: DispatchKind,
    ) -> ProxyError {
        let Some(member) = descriptor.find_in(declaring, name).next() else {
            return ProxyError::MemberNotFound {
                interface: declaring.to_string(),
                member: name.to_string(),
            };
        };

        let reason = match (member.kind, kind) {
            (MemberKind::Property, DispatchKind::Set) => "property is read-only".to_string(),
            (MemberKind::Property, DispatchKind::Get) => "property is write-only".to_string(),
            (actual, _) => format!("{} does not support {}", actual, kind),
        };
        ProxyError::unsupported(member.declaring_interface.clone(), name, reason)
    }
}
