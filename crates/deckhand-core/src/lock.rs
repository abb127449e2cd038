//! Per-tool operation serialization
//!
//! Switch/delete/start/stop must never overlap for the same tool, while
//! different tools stay fully concurrent. One async mutex per tool gives
//! exactly that; the guard is the ticket and releases on every exit path.

use crate::error::LockTimeout;
use crate::tool::Tool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Proof that the caller holds a tool's operation lock
///
/// Dropping the ticket releases the lock, so holding it across the whole
/// guarded operation guarantees release on success, failure and panic
/// unwinds alike.
#[derive(Debug)]
pub struct OperationTicket {
    _guard: OwnedMutexGuard<()>,
}

/// Mutual exclusion for state-mutating operations, keyed by tool
#[derive(Debug)]
pub struct ToolOperationLock {
    slots: HashMap<Tool, Arc<Mutex<()>>>,
}

impl ToolOperationLock {
    /// Create a lock with one slot per managed tool
    #[must_use]
    pub fn new() -> Self {
        let slots = Tool::ALL
            .into_iter()
            .map(|tool| (tool, Arc::new(Mutex::new(()))))
            .collect();
        Self { slots }
    }

    fn slot(&self, tool: Tool) -> Arc<Mutex<()>> {
        // The map is built from Tool::ALL and Tool is a closed enum.
        Arc::clone(&self.slots[&tool])
    }

    /// Wait until no other operation holds `tool`'s lock, then take it
    ///
    /// Never blocks operations for a different tool. Waiters are served
    /// in arrival order.
    pub async fn acquire(&self, tool: Tool) -> OperationTicket {
        let guard = self.slot(tool).lock_owned().await;
        OperationTicket { _guard: guard }
    }

    /// Like [`acquire`](Self::acquire), but give up after `deadline`
    ///
    /// # Errors
    /// Returns [`LockTimeout`] if the lock was not acquired in time.
    pub async fn acquire_with_timeout(
        &self,
        tool: Tool,
        deadline: Duration,
    ) -> Result<OperationTicket, LockTimeout> {
        let slot = self.slot(tool);
        match tokio::time::timeout(deadline, slot.lock_owned()).await {
            Ok(guard) => Ok(OperationTicket { _guard: guard }),
            Err(_) => Err(LockTimeout { tool }),
        }
    }

    /// Whether an operation currently holds `tool`'s lock
    ///
    /// Diagnostic only; the answer can be stale by the time it is used.
    #[must_use]
    pub fn is_held(&self, tool: Tool) -> bool {
        self.slots[&tool].try_lock().is_err()
    }
}

impl Default for ToolOperationLock {
    fn default() -> Self {
        Self::new()
    }
}
