use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::commands::giveaway::manager::GiveawayManager;

// One armed close timer. The handle exists only to make best-effort
// cancellation possible; the close path stays correct without it, since
// a timer that fires after an explicit end lands on the idempotent NoOp
// branch.
#[derive(Debug)]
pub struct ScheduleHandle {
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    pub fn disarm(&self) {
        self.task.abort();
    }
}

#[derive(Debug)]
pub struct Scheduler {
    timers: DashMap<Uuid, ScheduleHandle>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            timers: DashMap::new(),
        }
    }

    // Schedules the single close trigger for the giveaway. A deadline
    // already in the past fires immediately.
    pub fn arm(&self, manager: Arc<GiveawayManager>, id: Uuid, deadline: Instant) {
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline.into()).await;
            manager.timer_fired(id).await;
        });
        self.timers.insert(id, ScheduleHandle { task });
    }

    // Best-effort cancellation; a no-op when the timer already fired or
    // was never armed.
    pub fn disarm(&self, id: Uuid) {
        if let Some((_, handle)) = self.timers.remove(&id) {
            handle.disarm();
        }
    }

    // Drops the bookkeeping entry once the timer has fired on its own.
    pub fn release(&self, id: Uuid) {
        self.timers.remove(&id);
    }
}
