//! Runtime synthesis of interface adapters
//!
//! Given a runtime description of an interface and a marshaler, the crate
//! builds an adapter type implementing that interface by forwarding every
//! property access and method call to a value owned by a foreign runtime.
//! One type is synthesized per interface and shared by every adapter.

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod handle;
pub mod logging;
pub mod macros;
pub mod marshal;
pub mod metrics;
pub mod synth;
pub mod types;

// Re-export commonly used items
pub use cache::SynthesisCache;
pub use config::{EventPolicy, ProxyConfig};
pub use descriptor::{InterfaceDescriptor, MemberDescriptor, MemberKind};
pub use errors::{MarshalError, ProxyError, Result};
pub use handle::{try_get_foreign_value, ForeignHandle, ForeignObject, ForeignValue};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use marshal::{DispatchDelegate, DispatchKind, DispatchRequest, Marshaler, TableMarshaler};
pub use metrics::{ProxyStats, StatsSnapshot};
pub use synth::{
    construct_adapter, global, implement, install_global, Adapter, AdapterModule, ProxyFactory,
    SlotKey, SlotLayout, SynthesizedType, Synthesizer,
};
pub use types::{InterfaceBuilder, MemberInfo, Param, TypeInfo, TypeKind, Value, ValueType};
