//! Debounced mirroring of the editing state to both draft stores.
//!
//! [`MirrorMachine`] is the pure transition table. [`MirrorScheduler`] runs
//! it on a tokio task: edits arrive over a channel, the quiescence timer is a
//! `sleep_until` raced against the channel, and a fired timer writes the
//! latest snapshot to the local and the remote store.
//!
//! A clear raises a one-shot suppression: the change notification caused by
//! resetting the form is swallowed so the emptied form is never mirrored
//! back over the cleared stores.

use std::time::Duration;

use log::{debug, warn};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{sleep_until, Instant},
};

use crate::{models::Draft, store::DraftStores};

/// Default quiescence delay before an edit burst is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorState {
    #[default]
    Idle,
    PendingMirror,
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorEvent {
    Edit,
    TimerFired,
    ClearRequested,
}

/// What the driver must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAction {
    /// Start the timer, replacing any running one
    ArmTimer,
    CancelTimer,
    /// Write the latest snapshot to both stores
    Persist,
    Ignore,
}

/// Mirror transition table.
#[derive(Debug, Clone, Default)]
pub struct MirrorMachine {
    state: MirrorState,
}

impl MirrorMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MirrorState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == MirrorState::PendingMirror
    }

    /// Applies an event and returns the action it requires.
    pub fn handle(&mut self, event: MirrorEvent) -> MirrorAction {
        use MirrorAction::*;
        use MirrorState::*;

        let (next, action) = match (self.state, event) {
            (_, MirrorEvent::ClearRequested) => (Suppressed, CancelTimer),
            (Suppressed, MirrorEvent::Edit) => (Idle, Ignore),
            (Idle | PendingMirror, MirrorEvent::Edit) => (PendingMirror, ArmTimer),
            (PendingMirror, MirrorEvent::TimerFired) => (Idle, Persist),
            (state @ (Idle | Suppressed), MirrorEvent::TimerFired) => (state, Ignore),
        };
        self.state = next;
        action
    }
}

enum Command {
    Edit(Box<Draft>),
    Clear(oneshot::Sender<()>),
    Settle(oneshot::Sender<()>),
}

/// Handle to the running mirror task.
///
/// Dropping the handle stops the task; a pending write is abandoned.
pub struct MirrorScheduler {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl MirrorScheduler {
    /// Starts mirroring into `stores` with the given quiescence delay.
    pub fn spawn(stores: DraftStores, delay: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(stores, delay, receiver));
        Self { commands, task }
    }

    /// Reports a change of the editing state.
    pub fn notify(&self, draft: &Draft) {
        self.send(Command::Edit(Box::new(draft.clone())));
    }

    /// Cancels any pending write and swallows the next change notification.
    ///
    /// Returns once the task has taken the clear, which happens only
    /// between writes: after this no mirrored write is in flight, so the
    /// caller may delete the stored copies.
    pub async fn clear(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Clear(tx));
        let _ = rx.await;
    }

    /// Waits until no write is pending.
    ///
    /// Edits sent before the call are taken into account. This does not
    /// shorten the delay; it returns once the timer has fired and the write
    /// has finished, or straight away when nothing is pending.
    pub async fn settle(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Settle(tx));
        // A closed channel means the task is gone and nothing can be pending.
        let _ = rx.await;
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Draft mirroring has stopped; change not mirrored");
        }
    }
}

impl Drop for MirrorScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(stores: DraftStores, delay: Duration, mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut machine = MirrorMachine::new();
    let mut latest: Option<Draft> = None;
    let mut deadline: Option<Instant> = None;
    let mut waiters: Vec<oneshot::Sender<()>> = Vec::new();

    loop {
        let timer = sleep_until(deadline.unwrap_or_else(Instant::now));

        tokio::select! {
            command = commands.recv() => match command {
                None => break,
                Some(Command::Edit(draft)) => match machine.handle(MirrorEvent::Edit) {
                    MirrorAction::ArmTimer => {
                        latest = Some(*draft);
                        deadline = Some(Instant::now() + delay);
                    }
                    _ => debug!("Change after clear not mirrored"),
                },
                Some(Command::Clear(ack)) => {
                    machine.handle(MirrorEvent::ClearRequested);
                    latest = None;
                    deadline = None;
                    release(&mut waiters);
                    let _ = ack.send(());
                }
                Some(Command::Settle(waiter)) => {
                    if machine.is_pending() {
                        waiters.push(waiter);
                    } else {
                        let _ = waiter.send(());
                    }
                }
            },
            () = timer, if deadline.is_some() => {
                deadline = None;
                if machine.handle(MirrorEvent::TimerFired) == MirrorAction::Persist {
                    if let Some(draft) = latest.take() {
                        persist(&stores, draft).await;
                    }
                }
                release(&mut waiters);
            }
        }
    }
}

fn release(waiters: &mut Vec<oneshot::Sender<()>>) {
    for waiter in waiters.drain(..) {
        let _ = waiter.send(());
    }
}

/// Stamps the snapshot and writes it to both stores independently.
async fn persist(stores: &DraftStores, mut draft: Draft) {
    draft.touch();
    let (local, remote) = tokio::join!(stores.write_local(&draft), stores.write_remote(&draft));

    if let Err(e) = local {
        warn!("Failed to mirror draft to local store: {e}");
    }
    if let Err(e) = remote {
        warn!("Failed to mirror draft to remote store: {e}");
    }
    debug!("Mirrored draft stamped {:?}", draft.timestamp);
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::{
        error::Result,
        store::{
            Document, DocumentStore, Fields, KeyValueStore, MemoryDocumentStore,
            MemoryKeyValueStore,
        },
    };

    #[derive(Default)]
    struct CountingLocal {
        inner: MemoryKeyValueStore,
        sets: AtomicUsize,
    }

    impl KeyValueStore for CountingLocal {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[derive(Default)]
    struct CountingRemote {
        inner: MemoryDocumentStore,
        merges: AtomicUsize,
    }

    impl DocumentStore for CountingRemote {
        fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
            self.inner.get(collection, id)
        }

        fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
            self.merges.fetch_add(1, Ordering::SeqCst);
            self.inner.merge(collection, id, fields)
        }

        fn list(&self, collection: &str) -> Result<Vec<Document>> {
            self.inner.list(collection)
        }

        fn delete(&self, collection: &str, id: &str) -> Result<bool> {
            self.inner.delete(collection, id)
        }
    }

    #[test]
    fn test_edit_arms_and_rearms() {
        let mut machine = MirrorMachine::new();
        assert_eq!(machine.handle(MirrorEvent::Edit), MirrorAction::ArmTimer);
        assert_eq!(machine.handle(MirrorEvent::Edit), MirrorAction::ArmTimer);
        assert_eq!(machine.state(), MirrorState::PendingMirror);
        assert_eq!(machine.handle(MirrorEvent::TimerFired), MirrorAction::Persist);
        assert_eq!(machine.state(), MirrorState::Idle);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut machine = MirrorMachine::new();
        assert_eq!(machine.handle(MirrorEvent::TimerFired), MirrorAction::Ignore);
        assert_eq!(machine.state(), MirrorState::Idle);

        machine.handle(MirrorEvent::ClearRequested);
        assert_eq!(machine.handle(MirrorEvent::TimerFired), MirrorAction::Ignore);
        assert_eq!(machine.state(), MirrorState::Suppressed);
    }

    #[test]
    fn test_clear_cancels_pending_write() {
        let mut machine = MirrorMachine::new();
        machine.handle(MirrorEvent::Edit);
        assert_eq!(
            machine.handle(MirrorEvent::ClearRequested),
            MirrorAction::CancelTimer
        );
        assert_eq!(machine.handle(MirrorEvent::TimerFired), MirrorAction::Ignore);
    }

    #[test]
    fn test_suppression_swallows_exactly_one_change() {
        let mut machine = MirrorMachine::new();
        machine.handle(MirrorEvent::ClearRequested);
        assert_eq!(machine.handle(MirrorEvent::Edit), MirrorAction::Ignore);
        assert_eq!(machine.state(), MirrorState::Idle);
        assert_eq!(machine.handle(MirrorEvent::Edit), MirrorAction::ArmTimer);
    }

    fn memory_stores() -> DraftStores {
        DraftStores::new(
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(MemoryDocumentStore::new()),
            "teacher",
        )
    }

    fn draft_with_unit(unit: &str) -> Draft {
        let mut draft = Draft::default();
        draft.form.unit = unit.to_string();
        draft
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_writes_only_last_state() {
        let local = Arc::new(CountingLocal::default());
        let remote = Arc::new(CountingRemote::default());
        let stores = DraftStores::new(local.clone(), remote.clone(), "teacher");
        let scheduler = MirrorScheduler::spawn(stores.clone(), DEFAULT_DEBOUNCE);

        for i in 1..=5 {
            scheduler.notify(&draft_with_unit(&format!("edit {i}")));
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert_eq!(local.sets.load(Ordering::SeqCst), 0);

        scheduler.settle().await;
        assert_eq!(local.sets.load(Ordering::SeqCst), 1);
        assert_eq!(remote.merges.load(Ordering::SeqCst), 1);

        let mirrored = Draft::from_json(&stores.read_local().await.unwrap().unwrap()).unwrap();
        assert_eq!(mirrored.form.unit, "edit 5");
        assert_eq!(stores.read_remote().await.unwrap().unwrap().form.unit, "edit 5");
        assert!(mirrored.parsed_timestamp().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_suppresses_next_change_only() {
        let stores = memory_stores();
        let scheduler = MirrorScheduler::spawn(stores.clone(), DEFAULT_DEBOUNCE);

        scheduler.notify(&draft_with_unit("before clear"));
        scheduler.clear().await;
        scheduler.notify(&draft_with_unit(""));
        scheduler.settle().await;
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(stores.read_local().await.unwrap(), None);
        assert_eq!(stores.read_remote().await.unwrap(), None);

        scheduler.notify(&draft_with_unit("after clear"));
        scheduler.settle().await;
        let remote = stores.read_remote().await.unwrap().unwrap();
        assert_eq!(remote.form.unit, "after clear");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_abandons_pending_write() {
        let stores = memory_stores();
        let scheduler = MirrorScheduler::spawn(stores.clone(), DEFAULT_DEBOUNCE);
        scheduler.notify(&draft_with_unit("never written"));
        tokio::task::yield_now().await;
        drop(scheduler);

        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
        assert_eq!(stores.read_local().await.unwrap(), None);
    }
}
