use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::command::Command;
use crate::error::BridgeError;

/// How a pending request finally settles: the response payload on success,
/// or the timeout/disposed/remote error.
pub type Settlement = Result<Option<Value>, BridgeError>;

/// One outstanding request: the settle-once completion handle plus the
/// timeout task scheduled for it. The originating command is kept for
/// diagnostics.
pub struct PendingRequest {
    pub command: Command,
    tx: oneshot::Sender<Settlement>,
    timer: JoinHandle<()>,
}

impl PendingRequest {
    pub fn new(command: Command, tx: oneshot::Sender<Settlement>, timer: JoinHandle<()>) -> Self {
        Self { command, tx, timer }
    }

    /// The single terminal transition. Cancels the timeout task so a stray
    /// late rejection can never fire after settlement. The send is allowed
    /// to fail: the caller may have given up on the receiver already.
    pub fn settle(self, outcome: Settlement) {
        self.timer.abort();
        let _ = self.tx.send(outcome);
    }

    /// Tear the entry down without settling; used when the send primitive
    /// failed and the error goes straight back to the caller instead.
    pub fn cancel(self) {
        self.timer.abort();
    }
}

/// Ordered table from request id to outstanding entry. Ids are generated in
/// lexicographic creation order, so iteration (and `drain`) walk requests
/// oldest-first. Removal is atomic: whichever settlement path takes the
/// entry first wins, and every later path sees `None`.
#[derive(Default)]
pub struct PendingTable {
    entries: Mutex<BTreeMap<String, PendingRequest>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: String, entry: PendingRequest) {
        self.entries.lock().insert(id, entry);
    }

    pub fn take(&self, id: &str) -> Option<PendingRequest> {
        self.entries.lock().remove(id)
    }

    /// Removes every entry at once; no partially-drained state is observable
    /// to other threads.
    pub fn drain(&self) -> Vec<(String, PendingRequest)> {
        let mut entries = self.entries.lock();
        std::mem::take(&mut *entries).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
