//! Shared confirmation dialog
//!
//! Any part of the console can ask the admin a yes/no question through a
//! [`DialogHandle`] and await the answer. The host owns the single
//! [`DialogProvider`], renders whatever [`DialogProvider::current`] returns
//! and reports the admin's action back by dialog id. Hosts that should not
//! poll can [`subscribe`](DialogProvider::subscribe) to the open dialog
//! instead.
//!
//! Only one dialog is open at a time. Requests made while one is open wait in
//! a FIFO queue and open in turn. Every request resolves exactly once:
//! `true` on confirm, `false` on cancel or any other dismissal, and `false`
//! if the provider goes away before the admin answers.

use crate::config::DialogConfig;
use crate::error::{ConsoleError, Result};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch};
use tracing::debug;

pub type DialogId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open,
}

/// Ways a dialog can close without an explicit button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    EscapeKey,
    OutsideClick,
    Programmatic,
}

/// How an open dialog was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Confirmed,
    Cancelled,
    Dismissed(DismissReason),
}

impl Resolution {
    pub fn decision(self) -> bool {
        matches!(self, Resolution::Confirmed)
    }
}

/// What the host renders for the open dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub id: DialogId,
    pub title: String,
    pub description: String,
}

struct DialogRequest {
    view: DialogView,
    decision: oneshot::Sender<bool>,
}

impl DialogRequest {
    fn is_abandoned(&self) -> bool {
        self.decision.is_closed()
    }
}

struct Slot {
    active: Option<DialogRequest>,
    queue: VecDeque<DialogRequest>,
    next_id: DialogId,
    max_pending: usize,
    published: watch::Sender<Option<DialogView>>,
}

impl Slot {
    /// Tells subscribers which dialog is open now
    fn publish(&self) {
        let next = self.active.as_ref().map(|request| request.view.clone());
        self.published.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Opens the next queued request whose caller is still waiting
    fn advance(&mut self) {
        while let Some(request) = self.queue.pop_front() {
            if request.is_abandoned() {
                debug!(id = request.view.id, "Skipping abandoned confirmation");
                continue;
            }
            debug!(id = request.view.id, title = %request.view.title, "Dialog opened");
            self.active = Some(request);
            break;
        }
        self.publish();
    }

    /// Drops an open request nobody is waiting on anymore
    fn discard_abandoned_active(&mut self) {
        let abandoned = self
            .active
            .as_ref()
            .map(DialogRequest::is_abandoned)
            .unwrap_or(false);
        if abandoned {
            if let Some(request) = self.active.take() {
                debug!(id = request.view.id, "Open dialog abandoned by caller");
            }
            self.advance();
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The single dialog surface; owned by the host UI
pub struct DialogProvider {
    slot: Arc<Mutex<Slot>>,
}

impl DialogProvider {
    pub fn new(config: DialogConfig) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            slot: Arc::new(Mutex::new(Slot {
                active: None,
                queue: VecDeque::new(),
                next_id: 1,
                max_pending: config.max_pending,
                published,
            })),
        }
    }

    /// A handle call sites use to ask for confirmation
    pub fn handle(&self) -> DialogHandle {
        DialogHandle {
            slot: Arc::downgrade(&self.slot),
        }
    }

    pub fn state(&self) -> DialogState {
        let mut slot = lock(&self.slot);
        slot.discard_abandoned_active();
        if slot.active.is_some() {
            DialogState::Open
        } else {
            DialogState::Closed
        }
    }

    /// The dialog to render, if any
    pub fn current(&self) -> Option<DialogView> {
        let mut slot = lock(&self.slot);
        slot.discard_abandoned_active();
        slot.active.as_ref().map(|request| request.view.clone())
    }

    /// Follows the open dialog
    ///
    /// The receiver sees a new value whenever a dialog opens, closes or the
    /// queue moves on. `changed()` fails once the provider is dropped.
    pub fn subscribe(&self) -> watch::Receiver<Option<DialogView>> {
        let mut slot = lock(&self.slot);
        slot.discard_abandoned_active();
        slot.published.subscribe()
    }

    /// Requests waiting behind the open dialog
    pub fn pending(&self) -> usize {
        lock(&self.slot).queue.len()
    }

    pub fn confirm(&self, id: DialogId) -> bool {
        self.resolve(id, Resolution::Confirmed)
    }

    pub fn cancel(&self, id: DialogId) -> bool {
        self.resolve(id, Resolution::Cancelled)
    }

    pub fn dismiss(&self, id: DialogId, reason: DismissReason) -> bool {
        self.resolve(id, Resolution::Dismissed(reason))
    }

    /// Closes dialog `id` with the given outcome
    ///
    /// Returns `false` when `id` is not the open dialog, which makes repeated
    /// events for an already closed dialog no-ops.
    pub fn resolve(&self, id: DialogId, resolution: Resolution) -> bool {
        let mut slot = lock(&self.slot);

        let is_active = slot
            .active
            .as_ref()
            .map(|request| request.view.id == id)
            .unwrap_or(false);
        if !is_active {
            debug!(id, ?resolution, "Ignoring resolution for inactive dialog");
            return false;
        }

        let Some(request) = slot.active.take() else {
            return false;
        };
        // The caller may have stopped waiting; the dialog still closes
        let _ = request.decision.send(resolution.decision());
        debug!(id, ?resolution, "Dialog closed");

        slot.advance();
        true
    }
}

impl Default for DialogProvider {
    fn default() -> Self {
        Self::new(DialogConfig::default())
    }
}

/// Cheap, cloneable entry point for requesting confirmation
#[derive(Clone)]
pub struct DialogHandle {
    slot: Weak<Mutex<Slot>>,
}

impl DialogHandle {
    /// Queues a confirmation request and returns its pending decision
    ///
    /// Fails with [`ConsoleError::DialogUnavailable`] once the provider has
    /// been dropped and with [`ConsoleError::DialogQueueFull`] when too many
    /// requests are already waiting.
    pub fn request(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<PendingDecision> {
        let slot = self.slot.upgrade().ok_or(ConsoleError::DialogUnavailable)?;
        let mut slot = lock(&slot);

        slot.queue.retain(|request| !request.is_abandoned());
        slot.discard_abandoned_active();

        if slot.active.is_some() && slot.queue.len() >= slot.max_pending {
            return Err(ConsoleError::DialogQueueFull(slot.queue.len()));
        }

        let id = slot.next_id;
        slot.next_id += 1;

        let (decision, receiver) = oneshot::channel();
        let request = DialogRequest {
            view: DialogView {
                id,
                title: title.into(),
                description: description.into(),
            },
            decision,
        };

        if slot.active.is_none() {
            debug!(id, title = %request.view.title, "Dialog opened");
            slot.active = Some(request);
            slot.publish();
        } else {
            debug!(id, waiting = slot.queue.len() + 1, "Dialog queued");
            slot.queue.push_back(request);
        }

        Ok(PendingDecision {
            id,
            receiver,
            slot: self.slot.clone(),
        })
    }

    /// Asks for confirmation and waits for the admin's answer
    pub async fn request_confirmation(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<bool> {
        Ok(self.request(title, description)?.await)
    }
}

/// The answer to one confirmation request
///
/// Resolves to `false` if the provider is dropped first. Dropping it
/// withdraws the request.
pub struct PendingDecision {
    id: DialogId,
    receiver: oneshot::Receiver<bool>,
    slot: Weak<Mutex<Slot>>,
}

impl PendingDecision {
    pub fn id(&self) -> DialogId {
        self.id
    }
}

impl Future for PendingDecision {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|decision| decision.unwrap_or(false))
    }
}

impl Drop for PendingDecision {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(slot) = self.slot.upgrade() {
            lock(&slot).discard_abandoned_active();
        }
    }
}

impl std::fmt::Debug for PendingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDecision").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_resolves_true() {
        let provider = DialogProvider::default();
        let pending = provider
            .handle()
            .request("Delete quiz", "Are you sure?")
            .unwrap();

        let view = provider.current().unwrap();
        assert_eq!(view.id, pending.id());
        assert_eq!(view.title, "Delete quiz");
        assert_eq!(view.description, "Are you sure?");
        assert_eq!(provider.state(), DialogState::Open);

        assert!(provider.confirm(view.id));
        assert!(pending.await);
        assert_eq!(provider.state(), DialogState::Closed);
    }

    #[tokio::test]
    async fn test_cancel_and_dismiss_resolve_false() {
        let provider = DialogProvider::default();
        let handle = provider.handle();

        let cancelled = handle.request("T", "D").unwrap();
        assert!(provider.cancel(cancelled.id()));
        assert!(!cancelled.await);

        let escaped = handle.request("T", "D").unwrap();
        assert!(provider.dismiss(escaped.id(), DismissReason::EscapeKey));
        assert!(!escaped.await);

        let clicked_outside = handle.request("T", "D").unwrap();
        assert!(provider.dismiss(clicked_outside.id(), DismissReason::OutsideClick));
        assert!(!clicked_outside.await);
    }

    #[tokio::test]
    async fn test_second_resolution_is_noop() {
        let provider = DialogProvider::default();
        let pending = provider.handle().request("T", "D").unwrap();
        let id = pending.id();

        assert!(provider.confirm(id));
        assert!(!provider.dismiss(id, DismissReason::Programmatic));
        assert!(!provider.cancel(id));

        assert!(pending.await);
    }

    #[tokio::test]
    async fn test_requests_open_in_fifo_order() {
        let provider = DialogProvider::default();
        let handle = provider.handle();

        let first = handle.request("first", "").unwrap();
        let second = handle.request("second", "").unwrap();
        let third = handle.request("third", "").unwrap();

        assert_eq!(provider.current().unwrap().title, "first");
        assert_eq!(provider.pending(), 2);

        assert!(provider.confirm(first.id()));
        assert_eq!(provider.current().unwrap().title, "second");

        // A late event for the first dialog must not touch the second
        assert!(!provider.cancel(first.id()));
        assert_eq!(provider.current().unwrap().title, "second");

        assert!(provider.cancel(second.id()));
        assert!(provider.dismiss(third.id(), DismissReason::Programmatic));
        assert_eq!(provider.state(), DialogState::Closed);

        assert!(first.await);
        assert!(!second.await);
        assert!(!third.await);
    }

    #[tokio::test]
    async fn test_request_without_provider_fails() {
        let provider = DialogProvider::default();
        let handle = provider.handle();
        drop(provider);

        let err = handle.request("T", "D").unwrap_err();
        assert!(matches!(err, ConsoleError::DialogUnavailable));

        let err = handle.request_confirmation("T", "D").await.unwrap_err();
        assert!(matches!(err, ConsoleError::DialogUnavailable));
    }

    #[tokio::test]
    async fn test_dropping_provider_resolves_waiters_false() {
        let provider = DialogProvider::default();
        let handle = provider.handle();

        let open = handle.request("open", "").unwrap();
        let queued = handle.request("queued", "").unwrap();
        drop(provider);

        assert!(!open.await);
        assert!(!queued.await);
    }

    #[tokio::test]
    async fn test_queue_limit() {
        let provider = DialogProvider::new(DialogConfig { max_pending: 1 });
        let handle = provider.handle();

        let _open = handle.request("open", "").unwrap();
        let _queued = handle.request("queued", "").unwrap();

        let err = handle.request("overflow", "").unwrap_err();
        assert!(matches!(err, ConsoleError::DialogQueueFull(1)));
    }

    #[tokio::test]
    async fn test_abandoned_requests_are_skipped() {
        let provider = DialogProvider::default();
        let handle = provider.handle();

        let first = handle.request("first", "").unwrap();
        let second = handle.request("second", "").unwrap();
        let _third = handle.request("third", "").unwrap();
        drop(second);

        assert!(provider.confirm(first.id()));
        assert_eq!(provider.current().unwrap().title, "third");
    }

    #[tokio::test]
    async fn test_abandoned_open_dialog_advances() {
        let provider = DialogProvider::default();
        let handle = provider.handle();

        let first = handle.request("first", "").unwrap();
        let _second = handle.request("second", "").unwrap();
        drop(first);

        assert_eq!(provider.current().unwrap().title, "second");
        assert_eq!(provider.pending(), 0);
    }

    #[tokio::test]
    async fn test_request_confirmation_awaits_host() {
        let provider = DialogProvider::default();
        let handle = provider.handle();

        let caller =
            tokio::spawn(async move { handle.request_confirmation("Delete", "Sure?").await });

        let mut opened = provider.subscribe();
        let view = opened.wait_for(Option::is_some).await.unwrap().clone().unwrap();
        assert_eq!(view.title, "Delete");
        assert!(provider.confirm(view.id));

        assert!(caller.await.unwrap().unwrap());
        assert_eq!(*opened.borrow(), None);
    }

    #[tokio::test]
    async fn test_queued_request_is_published_after_close() {
        let provider = DialogProvider::default();
        let handle = provider.handle();
        let mut opened = provider.subscribe();
        assert_eq!(*opened.borrow_and_update(), None);

        let first = handle.request("first", "").unwrap();
        let second = handle.request("second", "").unwrap();
        opened.changed().await.unwrap();
        assert_eq!(opened.borrow_and_update().as_ref().unwrap().id, first.id());

        // Queueing behind an open dialog changes nothing the host renders
        assert!(!opened.has_changed().unwrap());

        assert!(provider.confirm(first.id()));
        opened.changed().await.unwrap();
        let view = opened.borrow_and_update().clone().unwrap();
        assert_eq!(view.id, second.id());
        assert_eq!(view.title, "second");

        assert!(provider.cancel(second.id()));
        opened.changed().await.unwrap();
        assert_eq!(*opened.borrow_and_update(), None);

        assert!(first.await);
        assert!(!second.await);
    }

    #[tokio::test]
    async fn test_withdrawn_request_is_unpublished() {
        let provider = DialogProvider::default();
        let handle = provider.handle();
        let mut opened = provider.subscribe();

        let first = handle.request("first", "").unwrap();
        opened.changed().await.unwrap();
        assert_eq!(opened.borrow_and_update().as_ref().unwrap().title, "first");

        drop(first);
        opened.changed().await.unwrap();
        assert_eq!(*opened.borrow_and_update(), None);
    }

    #[tokio::test]
    async fn test_subscription_ends_with_provider() {
        let provider = DialogProvider::default();
        let mut opened = provider.subscribe();
        drop(provider);

        assert!(opened.changed().await.is_err());
    }
}
