//! Member descriptor extraction
//!
//! Flattens an interface and everything it extends into an ordered list of
//! forwardable members. The order drives slot assignment, so it must be
//! stable: the interface's own members in declaration order, then each
//! extended interface depth-first. An interface reached twice through a
//! diamond contributes its members once.

use crate::errors::{ProxyError, Result};
use crate::marshal::DispatchKind;
use crate::types::{MemberInfo, Param, TypeInfo, ValueType};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Method,
    Event,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Property => "property",
            Self::Method => "method",
            Self::Event => "event",
        };
        f.write_str(name)
    }
}

/// One forwardable member of an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub kind: MemberKind,
    pub name: String,
    /// Full name of the interface that declares the member
    pub declaring_interface: String,
    /// Method parameters, indexer parameters, or the event handler parameter
    pub params: Vec<Param>,
    /// Return type, property type, or event handler type
    pub ty: ValueType,
    pub readable: bool,
    pub writable: bool,
    /// Position among same-named members of the same kind in the declaring interface
    pub overload: usize,
}

impl MemberDescriptor {
    /// Dispatch kinds this member occupies slots for
    pub fn dispatch_kinds(&self) -> Vec<DispatchKind> {
        match self.kind {
            MemberKind::Method => vec![DispatchKind::Call],
            MemberKind::Event => vec![DispatchKind::AddHandler, DispatchKind::RemoveHandler],
            MemberKind::Property => {
                let mut kinds = Vec::with_capacity(2);
                if self.readable {
                    kinds.push(DispatchKind::Get);
                }
                if self.writable {
                    kinds.push(DispatchKind::Set);
                }
                kinds
            }
        }
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.kind == MemberKind::Property && !self.params.is_empty()
    }

    /// `Interface.Member` form used in diagnostics
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_interface, self.name)
    }
}

/// Ordered members of an interface, including inherited ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    interface: String,
    /// The interface itself followed by every interface it extends, in visit order
    interfaces: Vec<String>,
    /// Direct bases of each visited interface
    bases: HashMap<String, Vec<String>>,
    members: Vec<MemberDescriptor>,
}

impl InterfaceDescriptor {
    /// Enumerate the forwardable members of `interface`
    pub fn extract(interface: &TypeInfo) -> Result<Self> {
        let mut visited = HashSet::new();
        let mut interfaces = Vec::new();
        let mut bases = HashMap::new();
        let mut members = Vec::new();
        collect(interface, &mut visited, &mut interfaces, &mut bases, &mut members)?;

        debug!(
            target: "synth",
            interface = %interface.full_name(),
            members = members.len(),
            interfaces = interfaces.len(),
            "extracted interface members"
        );

        Ok(Self {
            interface: interface.full_name(),
            interfaces,
            bases,
            members,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn properties(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.of_kind(MemberKind::Property)
    }

    pub fn methods(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.of_kind(MemberKind::Method)
    }

    pub fn events(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.of_kind(MemberKind::Event)
    }

    fn of_kind(&self, kind: MemberKind) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(move |m| m.kind == kind)
    }

    /// All members with this name, across every declaring interface
    pub fn find<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MemberDescriptor> {
        self.members.iter().filter(move |m| m.name == name)
    }

    /// Members with this name declared by one specific interface
    pub fn find_in<'a>(
        &'a self,
        interface: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MemberDescriptor> {
        self.members
            .iter()
            .filter(move |m| m.declaring_interface == interface && m.name == name)
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }

    /// Whether `derived` transitively extends `base`
    pub fn extends(&self, derived: &str, base: &str) -> bool {
        self.bases
            .get(derived)
            .map_or(false, |direct| direct.iter().any(|d| d == base || self.extends(d, base)))
    }

    #[inline]
    pub fn is_or_extends(&self, derived: &str, base: &str) -> bool {
        derived == base || self.extends(derived, base)
    }
}

fn collect(
    ty: &TypeInfo,
    visited: &mut HashSet<String>,
    interfaces: &mut Vec<String>,
    bases: &mut HashMap<String, Vec<String>>,
    out: &mut Vec<MemberDescriptor>,
) -> Result<()> {
    let full_name = ty.full_name();
    if !ty.is_interface() {
        return Err(ProxyError::InvalidInterfaceType {
            name: full_name,
            kind: ty.kind.to_string(),
        });
    }
    if !visited.insert(full_name.clone()) {
        return Ok(());
    }
    interfaces.push(full_name.clone());
    bases.insert(
        full_name.clone(),
        ty.extends.iter().map(|base| base.full_name()).collect(),
    );

    let mut overloads: HashMap<(MemberKind, &str), usize> = HashMap::new();
    for member in ty.members.iter().filter(|m| !m.is_static()) {
        let descriptor = match member {
            MemberInfo::Method(m) if m.special_name => continue,
            MemberInfo::Method(m) => MemberDescriptor {
                kind: MemberKind::Method,
                name: m.name.clone(),
                declaring_interface: full_name.clone(),
                params: m.params.clone(),
                ty: m.returns.clone(),
                readable: false,
                writable: false,
                overload: 0,
            },
            MemberInfo::Property(p) => MemberDescriptor {
                kind: MemberKind::Property,
                name: p.name.clone(),
                declaring_interface: full_name.clone(),
                params: p.index_params.clone(),
                ty: p.ty.clone(),
                readable: p.readable,
                writable: p.writable,
                overload: 0,
            },
            MemberInfo::Event(e) => MemberDescriptor {
                kind: MemberKind::Event,
                name: e.name.clone(),
                declaring_interface: full_name.clone(),
                params: vec![Param::new("handler", e.handler.clone())],
                ty: e.handler.clone(),
                readable: false,
                writable: false,
                overload: 0,
            },
        };

        let counter = overloads.entry((descriptor.kind, member.name())).or_insert(0);
        let overload = *counter;
        *counter += 1;
        out.push(MemberDescriptor { overload, ..descriptor });
    }

    for base in &ty.extends {
        collect(base, visited, interfaces, bases, out)?;
    }
    Ok(())
}
