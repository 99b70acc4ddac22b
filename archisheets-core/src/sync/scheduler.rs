use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{push, SyncError};
use crate::google::GoogleClient;
use crate::models::Project;

/// Last known push state of one spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Saved,
    /// A queued snapshot is waiting and no push is running for it
    Pending,
    Error(String),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::Syncing => write!(f, "syncing"),
            SyncStatus::Saved => write!(f, "saved"),
            SyncStatus::Pending => write!(f, "unsaved changes"),
            SyncStatus::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// What happened to a submitted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This call ran the pushes, including any snapshots queued meanwhile
    Pushed { pushes: usize },
    /// A push was already running; the snapshot will be written after it
    Queued,
    /// The project has no spreadsheet
    Skipped,
}

struct Pending {
    token: String,
    project: Project,
}

#[derive(Default)]
struct Slot {
    in_flight: bool,
    pending: Option<Pending>,
    status: SyncStatus,
}

impl Slot {
    fn claim(&mut self) {
        self.in_flight = true;
        self.status = SyncStatus::Syncing;
    }
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<String, Slot>> {
    slots.lock().unwrap_or_else(|e| e.into_inner())
}

/// Serializes pushes per spreadsheet.
///
/// At most one push per `sheet_id` is on the wire. A snapshot submitted
/// while one is running replaces any older queued snapshot, and the running
/// caller writes it as soon as its own push finishes. Different
/// spreadsheets push independently.
///
/// If the running caller is dropped before it gets to a queued snapshot, the
/// snapshot stays queued and the status becomes [`SyncStatus::Pending`]; the
/// next [`submit`](Self::submit) supersedes it and [`flush`](Self::flush)
/// writes it.
#[derive(Clone)]
pub struct PushScheduler {
    client: GoogleClient,
    slots: Slots,
}

/// Releases the slot if the owning runner future is dropped mid-push.
struct InFlightGuard<'a> {
    slots: &'a Slots,
    sheet_id: &'a str,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slots = lock(self.slots);
        if let Some(slot) = slots.get_mut(self.sheet_id) {
            slot.in_flight = false;
            slot.status = if slot.pending.is_some() {
                tracing::warn!("Push to {} cancelled with a queued snapshot", self.sheet_id);
                SyncStatus::Pending
            } else {
                SyncStatus::Idle
            };
        }
    }
}

impl PushScheduler {
    pub fn new(client: GoogleClient) -> Self {
        Self {
            client,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn status(&self, sheet_id: &str) -> SyncStatus {
        lock(&self.slots)
            .get(sheet_id)
            .map(|slot| slot.status.clone())
            .unwrap_or_default()
    }

    pub fn is_in_flight(&self, sheet_id: &str) -> bool {
        lock(&self.slots)
            .get(sheet_id)
            .is_some_and(|slot| slot.in_flight)
    }

    /// Push `project`, or queue it behind the push already running for the
    /// same spreadsheet.
    ///
    /// The returned result is that of the last push this call ran. A failed
    /// push does not stop a queued snapshot from being attempted.
    pub async fn submit(&self, token: &str, project: &Project) -> Result<SubmitOutcome, SyncError> {
        let Some(sheet_id) = project.sheet_id.clone() else {
            return Ok(SubmitOutcome::Skipped);
        };

        {
            let mut slots = lock(&self.slots);
            let slot = slots.entry(sheet_id.clone()).or_default();
            if slot.in_flight {
                tracing::debug!("Push to {} in flight, queueing snapshot", sheet_id);
                slot.pending = Some(Pending {
                    token: token.to_string(),
                    project: project.clone(),
                });
                return Ok(SubmitOutcome::Queued);
            }
            if slot.pending.take().is_some() {
                tracing::debug!("Snapshot left queued for {} superseded", sheet_id);
            }
            slot.claim();
        }

        self.run(&sheet_id, token.to_string(), project.clone()).await
    }

    /// Write a snapshot left queued by a runner that was dropped.
    ///
    /// Returns `None` when nothing is waiting. While a push is running the
    /// queued snapshot is that runner's to write, so this only reports it.
    pub async fn flush(&self, sheet_id: &str) -> Result<Option<SubmitOutcome>, SyncError> {
        let pending = {
            let mut slots = lock(&self.slots);
            let Some(slot) = slots.get_mut(sheet_id) else {
                return Ok(None);
            };
            if slot.in_flight {
                return Ok(slot.pending.is_some().then_some(SubmitOutcome::Queued));
            }
            let Some(pending) = slot.pending.take() else {
                return Ok(None);
            };
            slot.claim();
            pending
        };

        self.run(sheet_id, pending.token, pending.project)
            .await
            .map(Some)
    }

    /// Push until no snapshot is queued. The slot must already be claimed.
    async fn run(
        &self,
        sheet_id: &str,
        mut token: String,
        mut project: Project,
    ) -> Result<SubmitOutcome, SyncError> {
        let mut guard = InFlightGuard {
            slots: &self.slots,
            sheet_id,
            armed: true,
        };
        let mut pushes = 0;

        loop {
            let result = push(&self.client, &token, &project).await;
            pushes += 1;

            let next = {
                let mut slots = lock(&self.slots);
                let slot = slots.entry(sheet_id.to_string()).or_default();
                let next = slot.pending.take();
                if next.is_none() {
                    slot.in_flight = false;
                    slot.status = match &result {
                        Ok(()) => SyncStatus::Saved,
                        Err(e) => SyncStatus::Error(e.to_string()),
                    };
                }
                next
            };

            match next {
                Some(pending) => {
                    if let Err(e) = &result {
                        tracing::warn!("Push to {} failed, retrying with newer snapshot: {}", sheet_id, e);
                    }
                    token = pending.token;
                    project = pending.project;
                }
                None => {
                    guard.armed = false;
                    return result.map(|()| SubmitOutcome::Pushed { pushes });
                }
            }
        }
    }
}
