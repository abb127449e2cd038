//! Results and views exposed to the presentation layer

use crate::clients::{ActiveConfigSnapshot, ProxyStatus};
use crate::tool::Tool;
use serde::{Deserialize, Serialize};

/// Outcome of a delete or proxy start/stop operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Whether the primary mutation succeeded
    pub success: bool,
    /// Result message, or the backend's raw error text on failure
    pub message: String,
}

impl OperationOutcome {
    /// Successful outcome with a result message
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed outcome carrying the backend's raw error text
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Outcome of a profile switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchOutcome {
    /// Whether the store accepted the switch
    pub success: bool,
    /// Result message, or the backend's raw error text on failure
    pub message: String,
    /// True when a running proxy applied the change without a restart
    pub hot_applied: bool,
}

impl SwitchOutcome {
    /// Successful switch
    pub fn success(message: impl Into<String>, hot_applied: bool) -> Self {
        Self {
            success: true,
            message: message.into(),
            hot_applied,
        }
    }

    /// Failed switch carrying the backend's raw error text
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            hot_applied: false,
        }
    }
}

/// Dashboard view for one tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDashboard {
    /// The tool this row describes
    pub tool: Tool,
    /// Known profile names
    pub profiles: Vec<String>,
    /// Active profile, as last confirmed by the store
    pub active_profile: Option<String>,
    /// Profile highlighted in the UI
    pub selected_profile: Option<String>,
    /// Last observed active-config snapshot
    pub active_config: Option<ActiveConfigSnapshot>,
    /// Last observed proxy status
    pub proxy: ProxyStatus,
    /// Whether any operation is in flight (disables UI controls)
    pub busy: bool,
}

/// Full dashboard view across all managed tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// One entry per managed tool, in display order
    pub tools: Vec<ToolDashboard>,
}
