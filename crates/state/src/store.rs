// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory durable store for changes/tasks: an opaque key/value store
//! of changes and their task attributes. A real deployment would back
//! this with disk or a database; restart behavior here is "rebuild, not
//! resume" (see DESIGN.md), so an in-memory store is a faithful,
//! complete implementation, not a stub.

use crate::change::{Change, LogEntry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use warden_core::{ChangeId, ChangeKind, ChangeStatus, Clock, CheckDetails, Error, SystemClock};

/// Invoked whenever a change reaches a terminal status: the state-machine
/// transition hook.
pub type TransitionListener = Arc<dyn Fn(&Change) + Send + Sync>;

struct Inner {
    changes: HashMap<ChangeId, Change>,
}

/// The coarse, serializing lock over every change. All reads/writes go
/// through this one structure; callers never see partial updates.
pub struct StateStore<C: Clock = SystemClock> {
    clock: C,
    inner: Mutex<Inner>,
    listeners: Mutex<Vec<TransitionListener>>,
}

impl StateStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for StateStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> StateStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner { changes: HashMap::new() }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener fired synchronously whenever a change transitions
    /// into a terminal status. Handler panics are caught and logged rather
    /// than propagated, so a misbehaving listener can't stall the store.
    pub fn on_terminal_transition(&self, listener: TransitionListener) {
        self.listeners.lock().push(listener);
    }

    pub fn create_change(&self, kind: ChangeKind, task: CheckDetails) -> ChangeId {
        let change = Change::new(kind, task);
        let id = change.id.clone();
        self.inner.lock().changes.insert(id.clone(), change);
        id
    }

    pub fn get(&self, id: &ChangeId) -> Option<Change> {
        self.inner.lock().changes.get(id).cloned()
    }

    /// All changes currently not in a terminal status.
    pub fn active_changes(&self) -> Vec<Change> {
        self.inner
            .lock()
            .changes
            .values()
            .filter(|c| c.is_active())
            .cloned()
            .collect()
    }

    /// The single non-terminal change owning `check_name`, if any — at
    /// most one non-terminal change exists per check name.
    pub fn active_change_for(&self, check_name: &str) -> Option<Change> {
        self.inner
            .lock()
            .changes
            .values()
            .find(|c| c.is_active() && c.task.name == check_name)
            .cloned()
    }

    pub fn update_task<F>(&self, id: &ChangeId, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut CheckDetails),
    {
        let mut guard = self.inner.lock();
        let change = guard
            .changes
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(vec![id.to_string()]))?;
        f(&mut change.task);
        Ok(())
    }

    pub fn append_log(&self, id: &ChangeId, message: impl Into<String>) -> Result<(), Error> {
        let at_epoch_ms = self.clock.epoch_ms();
        let mut guard = self.inner.lock();
        let change = guard
            .changes
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(vec![id.to_string()]))?;
        change.log.push(LogEntry { at_epoch_ms, message: message.into() });
        Ok(())
    }

    /// Set a change's status, firing terminal-transition listeners outside
    /// the store's own lock — never call a listener while holding a lock
    /// it might need to re-enter.
    pub fn set_status(&self, id: &ChangeId, status: ChangeStatus) -> Result<(), Error> {
        let snapshot = {
            let mut guard = self.inner.lock();
            let change = guard
                .changes
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(vec![id.to_string()]))?;
            change.status = status;
            if status.is_terminal() {
                Some(change.clone())
            } else {
                None
            }
        };

        if let Some(change) = snapshot {
            for listener in self.listeners.lock().iter() {
                let listener = listener.clone();
                let change = change.clone();
                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || listener(&change))).is_err() {
                    tracing::error!(change = %id, "terminal-transition listener panicked");
                }
            }
        }
        Ok(())
    }

    /// Abort a change in place: `Abort` status, `proceed = false` so no
    /// successor change is created.
    pub fn abort(&self, id: &ChangeId) -> Result<(), Error> {
        self.update_task(id, |task| task.proceed = false)?;
        self.set_status(id, ChangeStatus::Abort)
    }
}
