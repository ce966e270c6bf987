//! Flash notifications for CRUD helpers.
//!
//! Every [`BaseModel`](crate::BaseModel) operation reports its outcome as a
//! short user-facing message through a [`Notifier`]. The default notifier
//! writes them as `tracing` events; applications that show messages to users
//! plug in their own sink.

use std::sync::Mutex;
use tracing::{info, warn};

/// Outcome class of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Success,
    Error,
}

/// Sink for flash messages.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);

    fn flash(&self, kind: Flash, message: &str) {
        match kind {
            Flash::Success => self.success(message),
            Flash::Error => self.error(message),
        }
    }
}

/// Emits flashes as `tracing` events on the `pgbase.flash` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "pgbase.flash", "{message}");
    }

    fn error(&self, message: &str) {
        warn!(target: "pgbase.flash", "{message}");
    }
}

/// Discards every flash.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn success(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}

/// Keeps flashes in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    entries: Mutex<Vec<(Flash, String)>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all collected flashes, leaving the collector empty.
    pub fn take(&self) -> Vec<(Flash, String)> {
        match self.entries.lock() {
            Ok(mut entries) => std::mem::take(&mut *entries),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    /// Copy of the collected flashes.
    pub fn entries(&self) -> Vec<(Flash, String)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, kind: Flash, message: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push((kind, message.to_string()));
    }
}

impl Notifier for CollectingNotifier {
    fn success(&self, message: &str) {
        self.push(Flash::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(Flash::Error, message);
    }
}

/// User-facing flash texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Store called with an empty record.
    pub nothing_to_store: &'static str,
    pub stored: &'static str,
    pub store_failed: &'static str,
    /// A mutating call got an empty where-map.
    pub empty_condition: &'static str,
    /// Update called with an empty record.
    pub empty_update: &'static str,
    /// Update matched no rows.
    pub no_matching_rows: &'static str,
    pub updated: &'static str,
    pub update_failed: &'static str,
    pub destroyed: &'static str,
    pub destroy_failed: &'static str,
    pub restored: &'static str,
    pub restore_failed: &'static str,
    pub force_deleted: &'static str,
    pub force_delete_failed: &'static str,
    pub batch_done: &'static str,
    pub batch_failed: &'static str,
}

impl Messages {
    pub fn en() -> Self {
        Self {
            nothing_to_store: "Nothing to add",
            stored: "Added successfully",
            store_failed: "Failed to add",
            empty_condition: "Condition is empty",
            empty_update: "Nothing to update",
            no_matching_rows: "No matching records",
            updated: "Updated successfully",
            update_failed: "Failed to update",
            destroyed: "Deleted successfully",
            destroy_failed: "Failed to delete",
            restored: "Restored successfully",
            restore_failed: "Failed to restore",
            force_deleted: "Permanently deleted",
            force_delete_failed: "Failed to permanently delete",
            batch_done: "Operation succeeded",
            batch_failed: "Operation failed",
        }
    }

    pub fn zh_cn() -> Self {
        Self {
            nothing_to_store: "无需要添加的数据",
            stored: "添加成功",
            store_failed: "添加失败",
            empty_condition: "条件为空",
            empty_update: "修改的数据为空",
            no_matching_rows: "无需要添加的数据",
            updated: "修改成功",
            update_failed: "修改失败",
            destroyed: "删除成功",
            destroy_failed: "删除失败",
            restored: "恢复成功",
            restore_failed: "恢复失败",
            force_deleted: "彻底删除成功",
            force_delete_failed: "彻底删除失败",
            batch_done: "操作成功",
            batch_failed: "操作失败",
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::en()
    }
}
