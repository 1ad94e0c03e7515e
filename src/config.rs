use crate::errors::{ProxyError, Result};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How event members are treated during synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPolicy {
    /// Synthesis succeeds; add/remove calls fail with `UnsupportedMember`
    #[default]
    Stub,
    /// Synthesis of an interface declaring events fails with `UnsupportedMember`
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Prefix of every synthesized type name
    pub module_name: String,

    pub events: EventPolicy,

    /// Allow lossless numeric widening and exact narrowing during conversion
    pub coerce_numbers: bool,

    pub log: LogConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            module_name: default_module_name(),
            events: EventPolicy::default(),
            coerce_numbers: true,
            log: LogConfig::default(),
        }
    }
}

fn default_module_name() -> String {
    "InterfaceProxies".to_string()
}

impl ProxyConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ProxyError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `IFACE_PROXY_MODULE`, `IFACE_PROXY_EVENTS`
    /// and `IFACE_PROXY_STRICT_NUMBERS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(module) = std::env::var("IFACE_PROXY_MODULE") {
            config.module_name = module;
        }

        if let Ok(events) = std::env::var("IFACE_PROXY_EVENTS") {
            config.events = match events.to_lowercase().as_str() {
                "stub" => EventPolicy::Stub,
                "reject" => EventPolicy::Reject,
                other => {
                    return Err(ProxyError::Config(format!("Unknown event policy: {}", other)));
                }
            };
        }

        if let Ok(val) = std::env::var("IFACE_PROXY_STRICT_NUMBERS") {
            config.coerce_numbers = !(val == "1" || val.to_lowercase() == "true");
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    pub fn with_events(mut self, events: EventPolicy) -> Self {
        self.events = events;
        self
    }

    pub fn with_coerce_numbers(mut self, coerce: bool) -> Self {
        self.coerce_numbers = coerce;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.module_name.trim();
        if name.is_empty() {
            return Err(ProxyError::Config("module_name must not be empty".to_string()));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ProxyError::Config(format!(
                "module_name must not contain whitespace: {:?}",
                self.module_name
            )));
        }
        Ok(())
    }
}
