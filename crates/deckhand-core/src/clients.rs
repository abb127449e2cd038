//! Contracts for the external store, proxy and config backends
//!
//! The coordinator never touches configuration files, processes or the
//! network itself. Everything authoritative lives behind these traits;
//! the desktop shell wires in the real implementations and tests wire in
//! instrumented mocks.

use crate::error::ClientResult;
use crate::tool::Tool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The effective configuration the store reports as active for a tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConfigSnapshot {
    /// Name of the profile the store considers active, if any
    pub active_profile: Option<String>,
    /// Endpoint the tool is currently pointed at
    pub base_url: Option<String>,
    /// When the store last changed this configuration
    pub updated_at: Option<DateTime<Utc>>,
}

/// Live proxy state for one tool, as reported by the proxy subsystem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStatus {
    /// Whether the user has the proxy enabled for this tool
    pub enabled: bool,
    /// Whether the proxy process is actually running
    pub running: bool,
}

impl ProxyStatus {
    /// True when a profile switch can hot-apply through the proxy
    #[must_use]
    pub fn is_active(self) -> bool {
        self.enabled && self.running
    }
}

/// Global application configuration relevant to the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Per-tool proxy enablement flags
    #[serde(default)]
    pub proxy_enabled: HashMap<Tool, bool>,
}

/// Authoritative profile store for all managed tools
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// List the profile names known for a tool
    async fn list_profiles(&self, tool: Tool) -> ClientResult<Vec<String>>;

    /// Make `name` the active profile for `tool`
    async fn switch_profile(&self, tool: Tool, name: &str) -> ClientResult<()>;

    /// Delete the named profile for `tool`
    async fn delete_profile(&self, tool: Tool, name: &str) -> ClientResult<()>;

    /// Fetch the effective active configuration for `tool`
    async fn get_active_config(&self, tool: Tool) -> ClientResult<ActiveConfigSnapshot>;
}

/// Control surface of the per-tool transparent proxy
#[async_trait]
pub trait ProxyControl: Send + Sync {
    /// Start the proxy for `tool`, returning the backend's result message
    async fn start_proxy(&self, tool: Tool) -> ClientResult<String>;

    /// Stop the proxy for `tool`, returning the backend's result message
    async fn stop_proxy(&self, tool: Tool) -> ClientResult<String>;

    /// Fetch proxy status for every tool in one batched call
    async fn get_all_status(&self) -> ClientResult<HashMap<Tool, ProxyStatus>>;
}

/// Read access to the global application configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the current global configuration
    async fn get_global_config(&self) -> ClientResult<GlobalConfig>;
}
