//! Console actions that tie ordering, storage, dialogs and notifications
//! together.

use crate::{
    config::OrderingConfig,
    dialog::DialogHandle,
    domain::{OrderedCollection, ReorderCommand, ReorderRequest, Study, StudyId, Tag},
    error::{ConsoleError, Result},
    notify::{Notification, Notifier},
    storage::{OrderKeyStore, Storage},
};
use std::{fmt, sync::Arc};
use tracing::{debug, info, warn};

/// What a reorder ended up writing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReorderOutcome {
    /// Dropped in place; nothing written
    Unchanged,
    /// Only the moved study got a new key
    Moved { key: f64 },
    /// The list was renumbered; `writes` studies were stored
    Rebalanced { writes: usize },
}

/// Persists the writes of an applied reorder
///
/// If a write fails, writes that already went through are rolled back to
/// their previous keys before the error is returned. Rollback failures are
/// logged; the original error is what the caller sees.
pub async fn persist_reorder<Id, S>(store: &S, command: &ReorderCommand<Id>) -> Result<()>
where
    Id: Clone + Eq + fmt::Display + Send + Sync,
    S: OrderKeyStore<Id> + ?Sized,
{
    for (done, (id, key)) in command.writes().iter().enumerate() {
        if let Err(err) = store.update_order_key(id, *key).await {
            for (written, _) in &command.writes()[..done] {
                let Some(previous) = command.previous_key(written) else {
                    continue;
                };
                if let Err(undo_err) = store.update_order_key(written, previous).await {
                    warn!(id = %written, error = %undo_err, "Failed to roll back stored order");
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

/// Study administration backed by a store, a notifier and the shared dialog
pub struct StudyConsole<S, N> {
    store: Arc<S>,
    notifier: N,
    dialog: DialogHandle,
    ordering: OrderingConfig,
}

impl<S, N> StudyConsole<S, N>
where
    S: Storage + OrderKeyStore<StudyId>,
    N: Notifier,
{
    pub fn new(
        store: Arc<S>,
        notifier: N,
        dialog: DialogHandle,
        ordering: OrderingConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            dialog,
            ordering,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Fetches every study for the reorder screen
    pub async fn load_order_board(&self) -> Result<OrderedCollection<Study>> {
        if !self.store.is_initialized().await {
            return Err(ConsoleError::ProjectNotInitialized);
        }
        let studies = self.store.list_studies().await?;
        Ok(OrderedCollection::new(studies, self.ordering))
    }

    /// Creates a study at the end of the display order
    pub async fn create_study(
        &self,
        title: String,
        subtitle: Option<String>,
        tags: Vec<Tag>,
    ) -> Result<Study> {
        let order = self.store.next_order(self.ordering.head_key).await?;
        let mut study = Study::new(title, order);
        study.subtitle = subtitle;
        study.tags = tags;

        self.store.save_study(&study).await?;
        info!(id = %study.id, order = study.order, "Created study");
        Ok(study)
    }

    /// Moves a study on the board and stores its new key
    ///
    /// The board is updated before the write. If storing fails the board is
    /// put back exactly as it was, an error notification is shown and the
    /// error is returned; the admin has to drag again.
    pub async fn move_study(
        &self,
        board: &mut OrderedCollection<Study>,
        request: ReorderRequest<StudyId>,
    ) -> Result<ReorderOutcome> {
        let Some(command) = board.apply(&request)? else {
            debug!(id = %request.moved_id, "Study dropped in place");
            return Ok(ReorderOutcome::Unchanged);
        };

        if let Err(err) = persist_reorder(self.store.as_ref(), &command).await {
            board.revert(&command);
            warn!(id = %request.moved_id, error = %err, "Reverted unsaved reorder");
            self.notifier.notify(
                Notification::error("Failed to save the new order").with_description(err.to_string()),
            );
            return Err(err);
        }

        let outcome = if command.is_rebalance() {
            ReorderOutcome::Rebalanced {
                writes: command.writes().len(),
            }
        } else {
            ReorderOutcome::Moved {
                key: command.writes()[0].1,
            }
        };
        info!(id = %request.moved_id, ?outcome, "Saved study order");
        self.notifier.notify(Notification::success("Order saved"));
        Ok(outcome)
    }

    /// Deletes a study after the admin confirms
    ///
    /// Returns `Ok(false)` when the admin declines; storage is untouched.
    pub async fn delete_study(&self, id: &StudyId) -> Result<bool> {
        let confirmed = self
            .dialog
            .request_confirmation("Delete study", "Are you sure you want to delete this?")
            .await?;
        if !confirmed {
            debug!(%id, "Delete declined");
            return Ok(false);
        }

        match self.store.delete_study(id).await {
            Ok(()) => {
                info!(%id, "Deleted study");
                self.notifier.notify(Notification::success("Deleted"));
                Ok(true)
            }
            Err(err) => {
                self.notifier
                    .notify(Notification::error("Delete failed").with_description(err.to_string()));
                Err(err)
            }
        }
    }
}
