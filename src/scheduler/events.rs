/*
 * Scheduling Trace Events
 *
 * The scheduler reports every observable action (admission, selection,
 * promotion, dispatch) as a structured TraceEvent. The rendered line
 * format is a stable contract: test golden files and grading scripts
 * match on it verbatim, so the wording here must not drift.
 *
 * Sinks decide what to do with events. TraceBuffer stores rendered lines
 * behind a spin lock (safe to append from interrupt context, drained
 * from debug context); TraceEvent::log forwards to the kernel logging
 * facade for live inspection.
 */

use alloc::{format, string::String, vec::Vec};
use bitflags::bitflags;
use spin::Mutex;

use super::thread::ThreadId;
use super::types::{Priority, QueueLevel};

bitflags! {
    /// Debug trace categories, in the style of single-letter kernel
    /// debug flags. A sink records an event only when its category is
    /// enabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DebugFlags: u32 {
        /// Thread lifecycle messages
        const THREAD = 1 << 0;
        /// Scheduling decisions (admission, selection, aging, dispatch)
        const SCHED = 1 << 1;
    }
}

/// One observable scheduler action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// A thread entered a ready queue.
    Admitted {
        tick: u64,
        tid: ThreadId,
        level: QueueLevel,
    },
    /// A thread was extracted from a ready queue by selection.
    Removed {
        tick: u64,
        tid: ThreadId,
        level: QueueLevel,
    },
    /// The aging engine promoted a waiting thread.
    PriorityRaised {
        tick: u64,
        tid: ThreadId,
        old: Priority,
        new: Priority,
    },
    /// The dispatcher handed the CPU to a new thread.
    Dispatched {
        tick: u64,
        next: ThreadId,
        prev: ThreadId,
        prev_exec: u64,
    },
}

impl TraceEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            TraceEvent::Admitted { .. } => "Admitted",
            TraceEvent::Removed { .. } => "Removed",
            TraceEvent::PriorityRaised { .. } => "PriorityRaised",
            TraceEvent::Dispatched { .. } => "Dispatched",
        }
    }

    pub fn category(&self) -> DebugFlags {
        DebugFlags::SCHED
    }

    /// Render the canonical trace line.
    ///
    /// Field order and bracketing are part of the observable contract;
    /// note the one-off space in the promotion line.
    pub fn render(&self) -> String {
        match *self {
            TraceEvent::Admitted { tick, tid, level } => format!(
                "[A]Tick[{}]: Thread[{}] is inserted into queue L[{}]",
                tick,
                tid.0,
                level.number()
            ),
            TraceEvent::Removed { tick, tid, level } => format!(
                "[B]Tick[{}]: Thread[{}] is removed from queue L[{}]",
                tick,
                tid.0,
                level.number()
            ),
            TraceEvent::PriorityRaised { tick, tid, old, new } => format!(
                "[C]Tick[{}]: Thread [{}] changes its priority from [{}] to [{}]",
                tick, tid.0, old, new
            ),
            TraceEvent::Dispatched {
                tick,
                next,
                prev,
                prev_exec,
            } => format!(
                "[E]Tick[{}]: Thread[{}] is now selected for execution, thread[{}] is replaced, and it has executed [{}] ticks",
                tick, next.0, prev.0, prev_exec
            ),
        }
    }

    /// Forward the rendered line to the kernel logging facade.
    pub fn log(&self) {
        log::debug!(target: "sched", "{}", self.render());
    }
}

/// Line store for trace events
///
/// Appending happens with interrupts off, so the spin lock is never
/// contended on a uniprocessor; it exists so the drain side (tests, a
/// post-mortem dump) is sound too.
pub struct TraceBuffer {
    flags: DebugFlags,
    lines: Mutex<Vec<String>>,
}

impl TraceBuffer {
    pub const fn new(flags: DebugFlags) -> Self {
        Self {
            flags,
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Record an event if its category is enabled.
    pub fn record(&self, event: &TraceEvent) {
        if self.flags.contains(event.category()) {
            self.lines.lock().push(event.render());
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Copy of the recorded lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Take all recorded lines, leaving the buffer empty.
    pub fn drain(&self) -> Vec<String> {
        core::mem::take(&mut *self.lines.lock())
    }
}
