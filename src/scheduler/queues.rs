/*
 * Ready Queues
 *
 * One fixed-capacity container serves all three tiers; the tier tag
 * decides the extraction discipline. The top tier's ordering key (the
 * remaining burst) keeps changing while threads sit in the queue, so the
 * queue is not kept sorted at all: extraction scans for the minimum with
 * fresh values. Queues are small (at most MAX_THREADS entries) and the
 * scan runs with interrupts off, so the linear pass is fine.
 */

use super::thread::{ThreadId, ThreadTable, MAX_THREADS};
use super::types::QueueLevel;

/// One ready-queue tier
///
/// Stores ids in admission order. `take_front`/`peek_front` apply the
/// tier's discipline:
/// - L1: minimum fresh remaining burst, ties to the lowest id
/// - L2: maximum priority, ties to the earliest admission
/// - L3: FIFO
pub struct ReadyQueue {
    level: QueueLevel,
    items: heapless::Vec<ThreadId, MAX_THREADS>,
}

impl ReadyQueue {
    pub fn new(level: QueueLevel) -> Self {
        Self {
            level,
            items: heapless::Vec::new(),
        }
    }

    pub fn level(&self) -> QueueLevel {
        self.level
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, tid: ThreadId) -> bool {
        self.items.iter().any(|&t| t == tid)
    }

    /// Non-consuming traversal in admission order.
    pub fn iter(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.items.iter().copied()
    }

    /// Append a thread. The caller is responsible for the membership
    /// check; more ready threads than the table can hold is a kernel bug.
    pub fn push(&mut self, tid: ThreadId) {
        self.items
            .push(tid)
            .expect("ready queue capacity exceeded");
    }

    /// Index of the thread the discipline would extract next.
    fn front_index(&self, table: &ThreadTable) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }

        let thread = |i: usize| {
            table
                .get(self.items[i])
                .expect("ready queue holds unknown thread")
        };

        match self.level {
            QueueLevel::L1 => {
                let mut best = 0;
                for i in 1..self.items.len() {
                    let (a, b) = (thread(i), thread(best));
                    if (a.remain(), a.id) < (b.remain(), b.id) {
                        best = i;
                    }
                }
                Some(best)
            }
            QueueLevel::L2 => {
                // strict > keeps the earliest admission on a tie
                let mut best = 0;
                for i in 1..self.items.len() {
                    if thread(i).priority > thread(best).priority {
                        best = i;
                    }
                }
                Some(best)
            }
            QueueLevel::L3 => Some(0),
        }
    }

    /// The thread the discipline would extract next, without removing it.
    pub fn peek_front(&self, table: &ThreadTable) -> Option<ThreadId> {
        self.front_index(table).map(|i| self.items[i])
    }

    /// Extract the front thread under this tier's discipline.
    pub fn take_front(&mut self, table: &ThreadTable) -> Option<ThreadId> {
        let idx = self.front_index(table)?;
        Some(self.items.remove(idx))
    }
}
