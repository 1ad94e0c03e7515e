//! Type and member metadata
//!
//! Mirrors what a reflective host exposes for a type: its kind, the
//! interfaces it extends, and its declared members. Properties and events
//! also surface their accessor methods (`get_X`, `add_X`, ...) flagged as
//! special-name, the way reflection lists them.

use super::value::ValueType;
use std::fmt;
use std::sync::Arc;

/// Kind of a described type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Interface,
    Class,
    Struct,
    Enum,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interface => "interface",
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Enum => "enum",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: ValueType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self { name: name.into(), ty }
    }

    /// Empty parameter list, for parameterless methods
    pub fn none() -> Vec<Param> {
        Vec::new()
    }
}

impl<S: Into<String>> From<(S, ValueType)> for Param {
    fn from((name, ty): (S, ValueType)) -> Self {
        Param::new(name, ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: String,
    pub ty: ValueType,
    /// Non-empty for indexers
    pub index_params: Vec<Param>,
    pub readable: bool,
    pub writable: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: ValueType,
    pub is_static: bool,
    /// Accessor or event add/remove method generated for another member
    pub special_name: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInfo {
    pub name: String,
    pub handler: ValueType,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberInfo {
    Property(PropertyInfo),
    Method(MethodInfo),
    Event(EventInfo),
}

impl MemberInfo {
    pub fn name(&self) -> &str {
        match self {
            Self::Property(p) => &p.name,
            Self::Method(m) => &m.name,
            Self::Event(e) => &e.name,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Self::Property(p) => p.is_static,
            Self::Method(m) => m.is_static,
            Self::Event(e) => e.is_static,
        }
    }
}

/// Runtime description of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub namespace: String,
    pub name: String,
    pub kind: TypeKind,
    pub extends: Vec<Arc<TypeInfo>>,
    pub members: Vec<MemberInfo>,
}

impl TypeInfo {
    /// Start describing an interface
    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder::new(namespace.into(), name.into(), TypeKind::Interface)
    }

    /// Start describing a class
    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder::new(namespace.into(), name.into(), TypeKind::Class)
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Whether this type is, or transitively extends, the named interface
    pub fn extends_or_is(&self, full_name: &str) -> bool {
        self.full_name() == full_name || self.extends.iter().any(|base| base.extends_or_is(full_name))
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.full_name())
    }
}

/// Builder for `TypeInfo`
#[derive(Debug)]
pub struct InterfaceBuilder {
    info: TypeInfo,
}

impl InterfaceBuilder {
    fn new(namespace: String, name: String, kind: TypeKind) -> Self {
        Self {
            info: TypeInfo {
                namespace,
                name,
                kind,
                extends: Vec::new(),
                members: Vec::new(),
            },
        }
    }

    pub fn extends(mut self, base: Arc<TypeInfo>) -> Self {
        self.info.extends.push(base);
        self
    }

    /// Read/write property
    pub fn property(self, name: &str, ty: ValueType) -> Self {
        self.property_with(name, ty, Vec::new(), true, true)
    }

    pub fn readonly_property(self, name: &str, ty: ValueType) -> Self {
        self.property_with(name, ty, Vec::new(), true, false)
    }

    pub fn writeonly_property(self, name: &str, ty: ValueType) -> Self {
        self.property_with(name, ty, Vec::new(), false, true)
    }

    /// Read/write indexed property
    pub fn indexer<P: Into<Param>>(
        self,
        name: &str,
        index: impl IntoIterator<Item = P>,
        ty: ValueType,
    ) -> Self {
        let index = index.into_iter().map(Into::into).collect();
        self.property_with(name, ty, index, true, true)
    }

    pub fn property_with(
        mut self,
        name: &str,
        ty: ValueType,
        index_params: Vec<Param>,
        readable: bool,
        writable: bool,
    ) -> Self {
        if readable {
            self.push_special(format!("get_{}", name), index_params.clone(), ty.clone());
        }
        if writable {
            let mut params = index_params.clone();
            params.push(Param::new("value", ty.clone()));
            self.push_special(format!("set_{}", name), params, ValueType::Void);
        }
        self.info.members.push(MemberInfo::Property(PropertyInfo {
            name: name.to_string(),
            ty,
            index_params,
            readable,
            writable,
            is_static: false,
        }));
        self
    }

    pub fn method<P: Into<Param>>(
        mut self,
        name: &str,
        params: impl IntoIterator<Item = P>,
        returns: ValueType,
    ) -> Self {
        self.info.members.push(MemberInfo::Method(MethodInfo {
            name: name.to_string(),
            params: params.into_iter().map(Into::into).collect(),
            returns,
            is_static: false,
            special_name: false,
        }));
        self
    }

    /// Static method; has no foreign target and is never forwarded
    pub fn static_method<P: Into<Param>>(
        mut self,
        name: &str,
        params: impl IntoIterator<Item = P>,
        returns: ValueType,
    ) -> Self {
        self.info.members.push(MemberInfo::Method(MethodInfo {
            name: name.to_string(),
            params: params.into_iter().map(Into::into).collect(),
            returns,
            is_static: true,
            special_name: false,
        }));
        self
    }

    pub fn event(mut self, name: &str, handler: ValueType) -> Self {
        let handler_param = vec![Param::new("handler", handler.clone())];
        self.push_special(format!("add_{}", name), handler_param.clone(), ValueType::Void);
        self.push_special(format!("remove_{}", name), handler_param, ValueType::Void);
        self.info.members.push(MemberInfo::Event(EventInfo {
            name: name.to_string(),
            handler,
            is_static: false,
        }));
        self
    }

    /// Append an arbitrary member as-is
    pub fn member(mut self, member: MemberInfo) -> Self {
        self.info.members.push(member);
        self
    }

    fn push_special(&mut self, name: String, params: Vec<Param>, returns: ValueType) {
        self.info.members.push(MemberInfo::Method(MethodInfo {
            name,
            params,
            returns,
            is_static: false,
            special_name: true,
        }));
    }

    pub fn build(self) -> Arc<TypeInfo> {
        Arc::new(self.info)
    }
}
