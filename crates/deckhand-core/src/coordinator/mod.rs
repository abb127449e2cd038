//! Profile/proxy coordination
//!
//! [`ProfileCoordinator`] owns the cached dashboard view (profile lists,
//! active profiles, proxy status, in-flight markers) and sequences every
//! state-mutating operation against the authoritative backends. Each
//! operation runs in two phases: the primary mutation, which must succeed
//! or the whole operation fails with the backend's raw error, and a
//! best-effort reconciliation that refreshes cached display data and is
//! allowed to fail silently (logged, never surfaced).
//!
//! Reads outside an operation may observe the window between an
//! optimistic update and its reconciliation. That staleness is bounded by
//! the next refresh and is accepted; failed reconciliations are not
//! retried automatically.

mod state;
mod types;

pub use types::{DashboardSnapshot, OperationOutcome, SwitchOutcome, ToolDashboard};

use crate::clients::{ActiveConfigSnapshot, ConfigStore, GlobalConfig, ProfileStore, ProxyControl};
use crate::error::{ClientResult, LockTimeout};
use crate::lock::{OperationTicket, ToolOperationLock};
use crate::tool::Tool;
use state::{lock, DashboardState, Flag, FlagGuard, SharedState};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Coordinates profile switches, deletes and proxy toggles per tool
///
/// Operations for the same tool are serialized through
/// [`ToolOperationLock`]; operations for different tools run fully
/// concurrently. All backend access goes through the injected clients.
pub struct ProfileCoordinator {
    store: Arc<dyn ProfileStore>,
    proxy: Arc<dyn ProxyControl>,
    config: Arc<dyn ConfigStore>,
    locks: ToolOperationLock,
    state: SharedState,
    lock_timeout: Option<Duration>,
}

impl ProfileCoordinator {
    /// Create a coordinator over the given backends
    #[must_use]
    pub fn new(
        store: Arc<dyn ProfileStore>,
        proxy: Arc<dyn ProxyControl>,
        config: Arc<dyn ConfigStore>,
    ) -> Self {
        Self {
            store,
            proxy,
            config,
            locks: ToolOperationLock::new(),
            state: Arc::new(Mutex::new(DashboardState::default())),
            lock_timeout: None,
        }
    }

    /// Bound the wait for a tool's operation lock
    ///
    /// By default operations wait indefinitely for the previous operation
    /// on the same tool. With a timeout set, a wait past the deadline
    /// fails the operation instead, so a wedged backend call cannot lock
    /// a tool out forever.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    async fn acquire(&self, tool: Tool) -> Result<OperationTicket, LockTimeout> {
        match self.lock_timeout {
            Some(deadline) => self.locks.acquire_with_timeout(tool, deadline).await,
            None => Ok(self.locks.acquire(tool).await),
        }
    }

    /// Populate the cached view for every tool from the backends
    ///
    /// Called once at startup; unlike operation-phase reconciliation,
    /// failures here are surfaced so the shell can show a load error.
    ///
    /// # Errors
    /// Returns the first backend failure encountered.
    pub async fn load_all(&self) -> ClientResult<()> {
        for tool in Tool::ALL {
            self.load_tool(tool).await?;
        }
        let status = self.proxy.get_all_status().await?;
        lock(&self.state).proxy_status = status;
        let global = self.config.get_global_config().await?;
        lock(&self.state).apply_global_config(global);
        Ok(())
    }

    /// Populate the cached profile list and active config for one tool
    ///
    /// # Errors
    /// Returns the backend failure, if any.
    pub async fn load_tool(&self, tool: Tool) -> ClientResult<()> {
        let profiles = self.store.list_profiles(tool).await?;
        let snapshot = self.store.get_active_config(tool).await?;
        let mut guard = lock(&self.state);
        guard.profiles.insert(tool, profiles);
        guard.apply_active_config(tool, snapshot);
        Ok(())
    }

    /// Switch `tool`'s active profile to `name`
    ///
    /// Unknown names are not rejected locally; the store's verdict is
    /// authoritative and its error text is returned on rejection. On
    /// success the result says whether a running proxy hot-applied the
    /// change or the CLI process must be restarted to pick it up.
    pub async fn switch_profile(&self, tool: Tool, name: &str) -> SwitchOutcome {
        let _ticket = match self.acquire(tool).await {
            Ok(ticket) => ticket,
            Err(err) => return SwitchOutcome::failure(err.to_string()),
        };
        let _flag = FlagGuard::set(&self.state, Flag::Switching(tool));

        // Decide the hot-apply question from the snapshot taken before
        // the mutation: it describes the proxy session the change lands in.
        let was_active_via_proxy = lock(&self.state).proxy(tool).is_active();

        if let Err(err) = self.store.switch_profile(tool, name).await {
            return SwitchOutcome::failure(err.message);
        }

        // Confirmed by the store, safe to publish before reconciling.
        lock(&self.state)
            .active_profiles
            .insert(tool, name.to_string());

        self.refresh_active_config(tool).await;
        self.refresh_global_config().await;

        let message = if was_active_via_proxy {
            format!("已切换到配置 '{name}'，代理已自动更新，无需重启")
        } else {
            format!("已切换到配置 '{name}'，请重启 {tool} 后生效")
        };
        SwitchOutcome::success(message, was_active_via_proxy)
    }

    /// Delete `name` from `tool`'s profiles
    ///
    /// The cached list drops the profile as soon as the store confirms
    /// the delete; the follow-up reload only refreshes display data and
    /// never rolls the deletion back.
    pub async fn delete_profile(&self, tool: Tool, name: &str) -> OperationOutcome {
        let _ticket = match self.acquire(tool).await {
            Ok(ticket) => ticket,
            Err(err) => return OperationOutcome::failure(err.to_string()),
        };
        let _flag = FlagGuard::set(&self.state, Flag::Deleting(tool, name.to_string()));

        if let Err(err) = self.store.delete_profile(tool, name).await {
            return OperationOutcome::failure(err.message);
        }

        let was_active = {
            let mut guard = lock(&self.state);
            guard.remove_profile(tool, name);
            if guard.selected_profiles.get(&tool).map(String::as_str) == Some(name) {
                guard.selected_profiles.remove(&tool);
            }
            guard.active_profiles.get(&tool).map(String::as_str) == Some(name)
        };

        match self.store.list_profiles(tool).await {
            Ok(profiles) => {
                lock(&self.state).profiles.insert(tool, profiles);
            }
            Err(err) => {
                tracing::warn!(tool = %tool, error = %err, "profile list reload failed after delete");
            }
        }

        // The deleted profile must never be shown as active. Checked both
        // before and after the reload, since either view can be the one
        // the UI is currently holding.
        let still_active =
            lock(&self.state).active_profiles.get(&tool).map(String::as_str) == Some(name);
        if was_active || still_active {
            self.refresh_active_config(tool).await;
        }

        OperationOutcome::success(format!("配置 '{name}' 已删除"))
    }

    /// Start the proxy for `tool`
    pub async fn start_proxy(&self, tool: Tool) -> OperationOutcome {
        let _ticket = match self.acquire(tool).await {
            Ok(ticket) => ticket,
            Err(err) => return OperationOutcome::failure(err.to_string()),
        };
        let _flag = FlagGuard::set(&self.state, Flag::Loading(tool));

        match self.proxy.start_proxy(tool).await {
            Ok(message) => {
                self.refresh_proxy_status().await;
                OperationOutcome::success(message)
            }
            Err(err) => OperationOutcome::failure(err.message),
        }
    }

    /// Stop the proxy for `tool`
    ///
    /// Also refreshes the tool's active config: with the proxy gone, the
    /// effectively active configuration can change.
    pub async fn stop_proxy(&self, tool: Tool) -> OperationOutcome {
        let _ticket = match self.acquire(tool).await {
            Ok(ticket) => ticket,
            Err(err) => return OperationOutcome::failure(err.to_string()),
        };
        let _flag = FlagGuard::set(&self.state, Flag::Loading(tool));

        match self.proxy.stop_proxy(tool).await {
            Ok(message) => {
                self.refresh_proxy_status().await;
                self.refresh_active_config(tool).await;
                OperationOutcome::success(message)
            }
            Err(err) => OperationOutcome::failure(err.message),
        }
    }

    // Phase-2 refreshes. These update cached display data only; failures
    // are logged and swallowed so they cannot turn a successful mutation
    // into a reported failure.

    async fn refresh_active_config(&self, tool: Tool) {
        match self.store.get_active_config(tool).await {
            Ok(snapshot) => lock(&self.state).apply_active_config(tool, snapshot),
            Err(err) => {
                tracing::warn!(tool = %tool, error = %err, "active-config refresh failed");
            }
        }
    }

    async fn refresh_global_config(&self) {
        match self.config.get_global_config().await {
            Ok(global) => lock(&self.state).apply_global_config(global),
            Err(err) => {
                tracing::warn!(error = %err, "global-config refresh failed");
            }
        }
    }

    /// Proxy status is reported as one batched map covering every tool,
    /// so any start/stop refreshes the whole map rather than patching the
    /// single tool.
    async fn refresh_proxy_status(&self) {
        match self.proxy.get_all_status().await {
            Ok(status) => lock(&self.state).proxy_status = status,
            Err(err) => {
                tracing::warn!(error = %err, "proxy status refresh failed");
            }
        }
    }

    /// Whether the proxy is enabled for `tool` (absent entries are false)
    #[must_use]
    pub fn is_proxy_enabled(&self, tool: Tool) -> bool {
        lock(&self.state).proxy(tool).enabled
    }

    /// Whether the proxy is running for `tool` (absent entries are false)
    #[must_use]
    pub fn is_proxy_running(&self, tool: Tool) -> bool {
        lock(&self.state).proxy(tool).running
    }

    /// Whether any switch/delete/start/stop is in flight for `tool`
    ///
    /// Drives UI affordances only; actual exclusion is the operation
    /// lock's job.
    #[must_use]
    pub fn is_operation_in_flight(&self, tool: Tool) -> bool {
        lock(&self.state).flags.in_flight(tool)
    }

    /// Cached profile names for `tool`
    #[must_use]
    pub fn profiles(&self, tool: Tool) -> Vec<String> {
        lock(&self.state).profiles.get(&tool).cloned().unwrap_or_default()
    }

    /// Active profile for `tool`, as last confirmed by the store
    #[must_use]
    pub fn active_profile(&self, tool: Tool) -> Option<String> {
        lock(&self.state).active_profiles.get(&tool).cloned()
    }

    /// Last observed active-config snapshot for `tool`
    #[must_use]
    pub fn active_config(&self, tool: Tool) -> Option<ActiveConfigSnapshot> {
        lock(&self.state).active_configs.get(&tool).cloned()
    }

    /// Last observed global configuration
    #[must_use]
    pub fn global_config(&self) -> GlobalConfig {
        lock(&self.state).global_config.clone()
    }

    /// Profile currently highlighted in the UI for `tool`
    #[must_use]
    pub fn selected_profile(&self, tool: Tool) -> Option<String> {
        lock(&self.state).selected_profiles.get(&tool).cloned()
    }

    /// Highlight a profile in the UI for `tool`, or clear the highlight
    pub fn select_profile(&self, tool: Tool, name: Option<String>) {
        let mut guard = lock(&self.state);
        match name {
            Some(name) => {
                guard.selected_profiles.insert(tool, name);
            }
            None => {
                guard.selected_profiles.remove(&tool);
            }
        }
    }

    /// Full dashboard view across all managed tools
    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        let guard = lock(&self.state);
        let tools = Tool::ALL
            .into_iter()
            .map(|tool| ToolDashboard {
                tool,
                profiles: guard.profiles.get(&tool).cloned().unwrap_or_default(),
                active_profile: guard.active_profiles.get(&tool).cloned(),
                selected_profile: guard.selected_profiles.get(&tool).cloned(),
                active_config: guard.active_configs.get(&tool).cloned(),
                proxy: guard.proxy(tool),
                busy: guard.flags.in_flight(tool),
            })
            .collect();
        DashboardSnapshot { tools }
    }
}
