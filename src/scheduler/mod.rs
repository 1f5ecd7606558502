/*
 * Multilevel Feedback Ready-Queue Scheduler
 *
 * Thread scheduling subsystem for a cooperative, single-CPU teaching
 * kernel. Three disciplines compose into one policy:
 *
 * 1. L1 (priority 100-149): shortest remaining burst runs first, with a
 *    remaining-time preemption rule for new arrivals
 * 2. L2 (priority 50-99): strict priority, no in-tier preemption
 * 3. L3 (priority 0-49): FIFO with a 100-tick round-robin quantum
 *
 * An aging engine runs every timer quantum and promotes threads that
 * have waited 1000 ticks, so starvation in the lower tiers is bounded.
 * Promotion does not move a thread between queues; the new band takes
 * effect at its next admission.
 *
 * MODULE MAP:
 * ===========
 *
 * - types:      priority bands, verdicts, policy tunables
 * - thread:     descriptors and the owning ThreadTable arena
 * - queues:     the tier containers and their extraction disciplines
 * - traits:     KernelCtx / AddressSpace collaborator boundaries
 * - events:     structured trace events and sinks
 * - sched_core: admission, selection, aging, preemption, dispatch
 *
 * There is no global scheduler instance. The kernel bootstrap owns a
 * ThreadTable, a Scheduler, and a KernelCtx implementation, and threads
 * them through every call site with interrupts disabled.
 */

pub mod events;
pub mod queues;
pub mod sched_core;
pub mod thread;
pub mod traits;
pub mod types;

pub use events::{DebugFlags, TraceBuffer, TraceEvent};
pub use queues::ReadyQueue;
pub use sched_core::Scheduler;
pub use thread::{
    Thread, ThreadId, ThreadState, ThreadTable, UserContext, MAX_THREADS, THREAD_STACK_SIZE,
};
pub use traits::{AddressSpace, KernelCtx};
pub use types::{
    IntLevel, PreemptVerdict, Priority, QueueLevel, AGING_BOOST, AGING_THRESHOLD, PRIORITY_MAX,
    RR_QUANTUM, TIMER_TICKS,
};
