use std::collections::BTreeSet;

use crate::clients::{BackendClient, ClientError};
use crate::models::docker::ResourceKind;

/// The destructive half of a bulk delete, kept behind a trait so the
/// coordinator can be driven without a live backend.
pub trait ResourceDeleter {
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Deletes resources of one kind through the backend client.
pub struct KindDeleter<'a> {
    pub backend: &'a BackendClient,
    pub kind: ResourceKind,
}

impl ResourceDeleter for KindDeleter<'_> {
    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.backend.delete_resource(self.kind, id).await
    }
}

/// One row of the list view the coordinator operates over.
#[derive(Debug, Clone)]
pub struct BulkRow {
    pub id: String,
    pub name: String,
    pub in_use: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkState {
    Idle,
    Selecting,
    ConfirmPending,
    Deleting,
    ErrorDisplayed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// Every item in the batch was deleted.
    Completed { deleted: Vec<String> },
    /// The batch aborted at the first failure; earlier deletes stand.
    Failed { deleted: Vec<String>, error: String },
    /// `confirm` was called outside ConfirmPending and did nothing.
    Ignored,
}

/// Multi-select delete for one list view. Selection only ever admits rows that
/// are not in use, deletion requires an explicit confirm step, and the batch
/// runs sequentially in list order, aborting on the first failure. Deletion is
/// not transactional: rows deleted before a failure stay deleted.
pub struct BulkCoordinator {
    rows: Vec<BulkRow>,
    selection: BTreeSet<String>,
    pending: Vec<BulkRow>,
    state: BulkState,
    error: Option<String>,
}

impl BulkCoordinator {
    pub fn new(rows: Vec<BulkRow>) -> Self {
        Self {
            rows,
            selection: BTreeSet::new(),
            pending: Vec::new(),
            state: BulkState::Idle,
            error: None,
        }
    }

    pub fn state(&self) -> BulkState {
        self.state
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn pending(&self) -> &[BulkRow] {
        &self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn eligible_ids(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .filter(|r| !r.in_use)
            .map(|r| r.id.clone())
            .collect()
    }

    fn settle_selection_state(&mut self) {
        if matches!(self.state, BulkState::Idle | BulkState::Selecting) {
            self.state = if self.selection.is_empty() {
                BulkState::Idle
            } else {
                BulkState::Selecting
            };
        }
    }

    /// Flips one row's membership in the selection. Rows that are in use (or
    /// unknown) are not toggleable; returns whether the toggle took effect.
    pub fn toggle_select(&mut self, id: &str) -> bool {
        if !matches!(self.state, BulkState::Idle | BulkState::Selecting) {
            return false;
        }
        let Some(row) = self.rows.iter().find(|r| r.id == id) else {
            return false;
        };
        if row.in_use {
            return false;
        }

        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
        self.settle_selection_state();
        true
    }

    /// Toggle against the full eligible set: selecting everything that is not
    /// in use, or clearing the selection when it already covers that set.
    /// Calling this twice in a row is a no-op pair.
    pub fn select_all(&mut self) {
        if !matches!(self.state, BulkState::Idle | BulkState::Selecting) {
            return;
        }
        let eligible = self.eligible_ids();
        if !eligible.is_empty() && self.selection == eligible {
            self.selection.clear();
        } else {
            self.selection = eligible;
        }
        self.settle_selection_state();
    }

    /// Materializes the confirmation batch: the selected rows that are still
    /// not in use, in list order. Nothing is deleted yet.
    pub fn request_delete(&mut self) -> bool {
        if self.state != BulkState::Selecting {
            return false;
        }
        let pending: Vec<BulkRow> = self
            .rows
            .iter()
            .filter(|r| self.selection.contains(&r.id) && !r.in_use)
            .cloned()
            .collect();
        if pending.is_empty() {
            return false;
        }
        self.pending = pending;
        self.state = BulkState::ConfirmPending;
        true
    }

    pub fn cancel(&mut self) {
        if self.state != BulkState::ConfirmPending {
            return;
        }
        self.pending.clear();
        self.state = BulkState::Selecting;
        self.settle_selection_state();
    }

    /// Runs the confirmed batch. Only valid in ConfirmPending; any other state
    /// (including a re-entrant call while a delete run is underway) is ignored.
    /// The pending batch is always cleared on exit so the confirmation step
    /// never dangles.
    pub async fn confirm<D: ResourceDeleter>(&mut self, deleter: &D) -> BulkOutcome {
        if self.state != BulkState::ConfirmPending {
            return BulkOutcome::Ignored;
        }
        self.state = BulkState::Deleting;
        let batch = std::mem::take(&mut self.pending);

        let mut deleted = Vec::new();
        for row in &batch {
            match deleter.delete(&row.id).await {
                Ok(()) => deleted.push(row.name.clone()),
                Err(e) => {
                    let error = match e {
                        ClientError::Backend { message, .. } => message,
                        ClientError::Request { .. } => format!("Failed to delete {}", row.name),
                    };
                    tracing::warn!("bulk delete aborted at {}: {}", row.name, error);
                    self.error = Some(error.clone());
                    self.state = BulkState::ErrorDisplayed;
                    return BulkOutcome::Failed { deleted, error };
                }
            }
        }

        self.selection.clear();
        self.state = BulkState::Idle;
        BulkOutcome::Completed { deleted }
    }
}
