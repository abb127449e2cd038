//! Shared dashboard state
//!
//! All per-tool cached views live here, behind one `std::sync::Mutex`.
//! The mutex is only held for short, synchronous sections and never
//! across an `.await`; per-tool operation ordering is the lock module's
//! job, not this one's.

use crate::clients::{ActiveConfigSnapshot, GlobalConfig, ProxyStatus};
use crate::tool::Tool;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) type SharedState = Arc<Mutex<DashboardState>>;

/// Lock the shared state, recovering from a poisoned mutex
///
/// A panic inside a critical section leaves the cached view stale at
/// worst, never structurally broken, so the data is still usable.
pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-flight operation markers, kept purely for UI affordances
#[derive(Debug, Default)]
pub(crate) struct OperationFlags {
    /// Tools with a switch in progress
    pub switching: HashSet<Tool>,
    /// (tool, profile) pairs with a delete in progress
    pub deleting: HashSet<(Tool, String)>,
    /// Tools with a proxy start/stop in progress
    pub loading: HashSet<Tool>,
}

impl OperationFlags {
    /// Whether any operation is in flight for `tool`
    pub fn in_flight(&self, tool: Tool) -> bool {
        self.switching.contains(&tool)
            || self.loading.contains(&tool)
            || self.deleting.iter().any(|(t, _)| *t == tool)
    }
}

/// The coordinator's cached view of every tool's dashboard data
#[derive(Debug, Default)]
pub(crate) struct DashboardState {
    /// Known profile names per tool
    pub profiles: HashMap<Tool, Vec<String>>,
    /// Active profile per tool, as last confirmed by the store
    pub active_profiles: HashMap<Tool, String>,
    /// Last observed active-config snapshot per tool
    pub active_configs: HashMap<Tool, ActiveConfigSnapshot>,
    /// Last observed proxy status per tool
    pub proxy_status: HashMap<Tool, ProxyStatus>,
    /// Last observed global configuration
    pub global_config: GlobalConfig,
    /// Profile the user has highlighted in the UI, per tool
    pub selected_profiles: HashMap<Tool, String>,
    /// In-flight operation markers
    pub flags: OperationFlags,
}

impl DashboardState {
    pub fn proxy(&self, tool: Tool) -> ProxyStatus {
        self.proxy_status.get(&tool).copied().unwrap_or_default()
    }

    /// Apply a store-confirmed active-config snapshot
    ///
    /// The active-profile reference follows the snapshot: a name replaces
    /// the cached one, a store-confirmed `None` clears it. The reference
    /// is never cleared from a guess.
    pub fn apply_active_config(&mut self, tool: Tool, snapshot: ActiveConfigSnapshot) {
        match &snapshot.active_profile {
            Some(name) => {
                self.active_profiles.insert(tool, name.clone());
            }
            None => {
                self.active_profiles.remove(&tool);
            }
        }
        self.active_configs.insert(tool, snapshot);
    }

    /// Fold global-config proxy flags into the cached status map
    ///
    /// Keeps `is_proxy_enabled` reads consistent no matter which of the
    /// two backends reported last.
    pub fn apply_global_config(&mut self, config: GlobalConfig) {
        for (tool, enabled) in &config.proxy_enabled {
            self.proxy_status.entry(*tool).or_default().enabled = *enabled;
        }
        self.global_config = config;
    }

    /// Remove a profile from a tool's cached list
    pub fn remove_profile(&mut self, tool: Tool, name: &str) {
        if let Some(list) = self.profiles.get_mut(&tool) {
            list.retain(|p| p != name);
        }
    }
}

/// One in-flight operation marker
#[derive(Debug, Clone)]
pub(crate) enum Flag {
    Switching(Tool),
    Deleting(Tool, String),
    Loading(Tool),
}

/// RAII marker that clears its flag when dropped
///
/// Every operation sets its flag through a guard, so the flag returns to
/// idle on success, failure and panic unwinds alike.
#[derive(Debug)]
pub(crate) struct FlagGuard {
    state: SharedState,
    flag: Flag,
}

impl FlagGuard {
    pub fn set(state: &SharedState, flag: Flag) -> Self {
        {
            let mut guard = lock(state);
            match &flag {
                Flag::Switching(tool) => {
                    guard.flags.switching.insert(*tool);
                }
                Flag::Deleting(tool, name) => {
                    guard.flags.deleting.insert((*tool, name.clone()));
                }
                Flag::Loading(tool) => {
                    guard.flags.loading.insert(*tool);
                }
            }
        }
        Self {
            state: Arc::clone(state),
            flag,
        }
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        let mut guard = lock(&self.state);
        match &self.flag {
            Flag::Switching(tool) => {
                guard.flags.switching.remove(tool);
            }
            Flag::Deleting(tool, name) => {
                guard.flags.deleting.remove(&(*tool, name.clone()));
            }
            Flag::Loading(tool) => {
                guard.flags.loading.remove(tool);
            }
        }
    }
}
