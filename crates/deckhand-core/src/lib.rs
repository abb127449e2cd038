//! Deckhand Core - Profile/proxy coordination engine
//!
//! This crate keeps the dashboard's view of each managed CLI tool (its
//! profiles, active profile and proxy state) consistent with the
//! authoritative backends, serializing mutations per tool and
//! reconciling cached state after every change.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clients;
pub mod coordinator;
pub mod error;
pub mod lock;
pub mod tool;

pub use clients::{
    ActiveConfigSnapshot, ConfigStore, GlobalConfig, ProfileStore, ProxyControl, ProxyStatus,
};
pub use coordinator::{
    DashboardSnapshot, OperationOutcome, ProfileCoordinator, SwitchOutcome, ToolDashboard,
};
pub use error::{ClientError, ClientResult, LockTimeout};
pub use lock::{OperationTicket, ToolOperationLock};
pub use tool::Tool;
