//! Delayed reply scheduler
//!
//! Holds the pending set of encoded replies that are not due yet and runs
//! the dispatcher loop that transmits each one exactly once, never before
//! its due time. The pending set is a binary heap ordered by due time
//! alone, so the earliest entry is always at the head regardless of
//! insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;

/// Upper bound on one dispatcher wait, so the loop keeps re-checking the
/// running flag even when the pending set is empty or far from due
pub const SCHED_IDLE_WAIT: Duration = Duration::from_millis(100);

/// One pending reply transmission
#[derive(Debug, Clone)]
pub struct ScheduledDelivery {
    /// When the payload becomes eligible to send
    pub due: Instant,
    /// Requester address the reply goes back to
    pub destination: SocketAddr,
    /// Encoded reply datagram
    pub payload: Bytes,
}

impl PartialEq for ScheduledDelivery {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due
    }
}

impl Eq for ScheduledDelivery {}

impl PartialOrd for ScheduledDelivery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledDelivery {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order so BinaryHeap pops the earliest due time first
        other.due.cmp(&self.due)
    }
}

/// Pending set shared between the receive path and the dispatcher thread
pub struct Scheduler {
    pending: Mutex<BinaryHeap<ScheduledDelivery>>,
    not_idle: Condvar,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            pending: Mutex::new(BinaryHeap::new()),
            not_idle: Condvar::new(),
        }
    }

    /// Insert one pending delivery and wake the dispatcher
    pub fn enqueue(&self, entry: ScheduledDelivery) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.push(entry);
        self.not_idle.notify_one();
    }

    /// Number of deliveries not yet dispatched
    pub fn len(&self) -> usize {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return the earliest entry if it is due at `now`
    ///
    /// An entry is due once `now` has reached its due time. Removal
    /// happens under the lock, before any transmission, so no entry can
    /// be dispatched twice.
    pub fn pop_due(&self, now: Instant) -> Option<ScheduledDelivery> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        match pending.peek() {
            Some(head) if head.due <= now => pending.pop(),
            _ => None,
        }
    }

    /// Block until the head entry may have become due or a new entry
    /// arrives, whichever comes first
    fn wait_for_head(&self) {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let wait = match pending.peek() {
            // Head became due between the caller's check and this lock
            Some(head) if head.due <= now => return,
            Some(head) => (head.due - now).min(SCHED_IDLE_WAIT),
            None => SCHED_IDLE_WAIT,
        };

        let (guard, _timeout) = self
            .not_idle
            .wait_timeout(pending, wait)
            .unwrap_or_else(|e| e.into_inner());
        drop(guard);
    }

    /// Dispatcher loop: transmits each pending entry once it is due
    ///
    /// Entries that share a due time drain back to back. The loop exits
    /// when `running` clears; a send failure is returned to the caller.
    pub fn run(&self, socket: &UdpSocket, running: &AtomicBool) -> io::Result<()> {
        while running.load(AtomicOrdering::SeqCst) {
            match self.pop_due(Instant::now()) {
                Some(entry) => {
                    socket.send_to(&entry.payload, entry.destination)?;
                    log::debug!(
                        "[SEND] Delayed reply ({} bytes) to [{}]",
                        entry.payload.len(),
                        entry.destination
                    );
                }
                None => self.wait_for_head(),
            }
        }
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
