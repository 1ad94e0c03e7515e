//! Synthesizer, adapter module and the cached factory

use super::{Adapter, EmitContext, SynthesizedType};
use crate::cache::SynthesisCache;
use crate::config::ProxyConfig;
use crate::descriptor::InterfaceDescriptor;
use crate::errors::{ProxyError, Result};
use crate::handle::ForeignValue;
use crate::marshal::Marshaler;
use crate::metrics::{ProxyStats, StatsSnapshot};
use crate::types::TypeInfo;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug_span, info, warn};

/// Registry of synthesized type names, the host every type is defined in.
///
/// Names are permanent once a type is bound; only a synthesis that fails
/// before binding completes gives its name back.
#[derive(Debug)]
pub struct AdapterModule {
    name: String,
    types: DashMap<String, String>,
}

impl AdapterModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `type_name` as implementing `interface`
    pub fn define(&self, type_name: &str, interface: &str) -> Result<()> {
        match self.types.entry(type_name.to_string()) {
            Entry::Occupied(_) => Err(ProxyError::DuplicateTypeName(type_name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(interface.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn undefine(&self, type_name: &str) {
        self.types.remove(type_name);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Interface a registered type implements
    pub fn interface_of(&self, type_name: &str) -> Option<String> {
        self.types.get(type_name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

/// Builds synthesized types. Not cached: asking twice for the same
/// interface fails with `DuplicateTypeName`.
pub struct Synthesizer {
    module: Arc<AdapterModule>,
    marshaler: Arc<dyn Marshaler>,
    config: ProxyConfig,
    stats: Arc<ProxyStats>,
}

impl Synthesizer {
    pub fn new(marshaler: Arc<dyn Marshaler>, config: ProxyConfig) -> Self {
        Self::with_stats(marshaler, config, Arc::new(ProxyStats::new()))
    }

    pub fn with_stats(marshaler: Arc<dyn Marshaler>, config: ProxyConfig, stats: Arc<ProxyStats>) -> Self {
        Self {
            module: Arc::new(AdapterModule::new(config.module_name.clone())),
            marshaler,
            config,
            stats,
        }
    }

    pub fn module(&self) -> &Arc<AdapterModule> {
        &self.module
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Deterministic type name for an interface
    pub fn type_name_for(&self, interface: &TypeInfo) -> String {
        format!("{}.{}Proxy", self.module.name(), interface.full_name())
    }

    /// Synthesize and bind a new type implementing `interface`
    pub fn implement(&self, interface: &Arc<TypeInfo>) -> Result<Arc<SynthesizedType>> {
        let full_name = interface.full_name();
        let _span = debug_span!(target: "synth", "implement", interface = %full_name).entered();

        match self.synthesize(interface, &full_name) {
            Ok(ty) => {
                self.stats.record_synthesized();
                info!(
                    target: "synth",
                    name = ty.name(),
                    slots = ty.slot_count(),
                    "synthesized adapter type"
                );
                Ok(ty)
            }
            Err(err) => {
                self.stats.record_synthesis_failure();
                warn!(target: "synth", interface = %full_name, error = %err, "synthesis failed");
                Err(err)
            }
        }
    }

    fn synthesize(&self, interface: &Arc<TypeInfo>, full_name: &str) -> Result<Arc<SynthesizedType>> {
        // Rejects non-interfaces before anything is registered
        let descriptor = InterfaceDescriptor::extract(interface)?;
        let name = self.type_name_for(interface);

        self.module.define(&name, full_name)?;
        let ty = Arc::new(SynthesizedType::define(name.clone(), Arc::clone(interface), descriptor));

        let ctx = EmitContext {
            coerce_numbers: self.config.coerce_numbers,
            stats: Arc::clone(&self.stats),
        };
        let bound = crate::time_block!("bind", {
            ty.bind(self.marshaler.as_ref(), self.config.events, &ctx)
        });
        if let Err(err) = bound {
            self.module.undefine(&name);
            return Err(err);
        }
        Ok(ty)
    }
}

/// Cached, thread-safe entry point: one synthesized type per interface
pub struct ProxyFactory {
    synthesizer: Synthesizer,
    cache: SynthesisCache<Arc<SynthesizedType>>,
    stats: Arc<ProxyStats>,
}

impl ProxyFactory {
    pub fn new(marshaler: impl Marshaler + 'static) -> Self {
        Self::build(Arc::new(marshaler), ProxyConfig::default())
    }

    pub fn with_config(marshaler: impl Marshaler + 'static, config: ProxyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(Arc::new(marshaler), config))
    }

    fn build(marshaler: Arc<dyn Marshaler>, config: ProxyConfig) -> Self {
        let stats = Arc::new(ProxyStats::new());
        Self {
            synthesizer: Synthesizer::with_stats(marshaler, config, Arc::clone(&stats)),
            cache: SynthesisCache::with_stats(Arc::clone(&stats)),
            stats,
        }
    }

    /// The synthesized type for `interface`, built on first request
    pub fn implement(&self, interface: &Arc<TypeInfo>) -> Result<Arc<SynthesizedType>> {
        if !interface.is_interface() {
            self.stats.record_synthesis_failure();
            return Err(ProxyError::InvalidInterfaceType {
                name: interface.full_name(),
                kind: interface.kind.to_string(),
            });
        }
        self.cache
            .get_or_create(&interface.full_name(), || self.synthesizer.implement(interface))
    }

    /// Implement `interface` and wrap `value` in an adapter of that type
    pub fn wrap(&self, interface: &Arc<TypeInfo>, value: ForeignValue) -> Result<Arc<Adapter>> {
        self.implement(interface)?.construct(value)
    }

    pub fn module(&self) -> &AdapterModule {
        self.synthesizer.module()
    }

    pub fn config(&self) -> &ProxyConfig {
        self.synthesizer.config()
    }

    pub fn cache(&self) -> &SynthesisCache<Arc<SynthesizedType>> {
        &self.cache
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

static GLOBAL: OnceCell<ProxyFactory> = OnceCell::new();

/// Install the process-wide factory. Fails if one is already installed.
pub fn install_global(factory: ProxyFactory) -> Result<&'static ProxyFactory> {
    GLOBAL
        .set(factory)
        .map_err(|_| ProxyError::Config("a global proxy factory is already installed".to_string()))?;
    GLOBAL
        .get()
        .ok_or_else(|| ProxyError::Config("global proxy factory missing after install".to_string()))
}

pub fn global() -> Option<&'static ProxyFactory> {
    GLOBAL.get()
}

/// Implement `interface` through the process-wide factory
pub fn implement(interface: &Arc<TypeInfo>) -> Result<Arc<SynthesizedType>> {
    global()
        .ok_or_else(|| ProxyError::Config("no global proxy factory installed".to_string()))?
        .implement(interface)
}
