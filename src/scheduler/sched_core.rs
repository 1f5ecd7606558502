/*
 * Scheduler Core
 *
 * Routines to choose the next thread to run and to dispatch to it. The
 * policy is a three-tier feedback queue: L1 orders by shortest remaining
 * burst, L2 by strict priority, L3 is FIFO with a round-robin quantum,
 * and an aging engine promotes long-waiting threads upward.
 *
 * These routines assume interrupts are already disabled; on a
 * uniprocessor that gives mutual exclusion over all scheduler state.
 * Locks cannot be used here: waiting for a busy lock would call back
 * into thread selection and loop forever.
 *
 * Ownership is explicit. The caller threads the ThreadTable and the
 * KernelCtx through every entry point; there is no hidden global
 * scheduler instance.
 */

use super::events::TraceEvent;
use super::queues::ReadyQueue;
use super::thread::{ThreadId, ThreadState, ThreadTable};
use super::traits::KernelCtx;
use super::types::{
    IntLevel, PreemptVerdict, QueueLevel, AGING_THRESHOLD, RR_QUANTUM, TIMER_TICKS,
};

/// The ready-queue scheduler
///
/// Holds the three tiers, the running thread's id, and the
/// deferred-destruction slot. Thread descriptors themselves live in the
/// ThreadTable; the scheduler only stores handles.
pub struct Scheduler {
    l1: ReadyQueue,
    l2: ReadyQueue,
    l3: ReadyQueue,
    current: ThreadId,
    to_be_destroyed: Option<ThreadId>,
    context_switches: u64,
}

impl Scheduler {
    /// Create the scheduler with `main_thread` (normally id 0) running.
    pub fn new(main_thread: ThreadId) -> Self {
        Self {
            l1: ReadyQueue::new(QueueLevel::L1),
            l2: ReadyQueue::new(QueueLevel::L2),
            l3: ReadyQueue::new(QueueLevel::L3),
            current: main_thread,
            to_be_destroyed: None,
            context_switches: 0,
        }
    }

    /// The thread currently holding the CPU.
    pub fn current(&self) -> ThreadId {
        self.current
    }

    /// Total dispatches performed.
    pub fn context_switches(&self) -> u64 {
        self.context_switches
    }

    /// Number of threads across all three ready queues.
    pub fn ready_count(&self) -> usize {
        self.l1.len() + self.l2.len() + self.l3.len()
    }

    /// Which tier currently holds `tid`, if any.
    pub fn ready_level(&self, tid: ThreadId) -> Option<QueueLevel> {
        for level in [QueueLevel::L1, QueueLevel::L2, QueueLevel::L3] {
            if self.queue(level).contains(tid) {
                return Some(level);
            }
        }
        None
    }

    fn queue(&self, level: QueueLevel) -> &ReadyQueue {
        match level {
            QueueLevel::L1 => &self.l1,
            QueueLevel::L2 => &self.l2,
            QueueLevel::L3 => &self.l3,
        }
    }

    fn queue_mut(&mut self, level: QueueLevel) -> &mut ReadyQueue {
        match level {
            QueueLevel::L1 => &mut self.l1,
            QueueLevel::L2 => &mut self.l2,
            QueueLevel::L3 => &mut self.l3,
        }
    }

    fn assert_int_off(ctx: &dyn KernelCtx) {
        assert!(
            ctx.int_level() == IntLevel::Off,
            "scheduler entered with interrupts enabled"
        );
    }

    // ========================================================================
    // ADMISSION AND SELECTION
    // ========================================================================

    /// Mark a thread ready and place it on the queue its priority maps to.
    ///
    /// The band is selected from the priority the thread carries *into*
    /// admission; only afterwards is the priority reset to the initial
    /// value. A thread promoted into the top band and then blocked will
    /// therefore re-enter L1 while its effective priority restarts low:
    /// aging is per wait episode.
    ///
    /// Admitting a thread that is already queued anywhere is a silent
    /// no-op, so double admission can never duplicate an entry or move a
    /// promoted thread between tiers.
    pub fn ready_to_run(&mut self, table: &mut ThreadTable, ctx: &dyn KernelCtx, tid: ThreadId) {
        Self::assert_int_off(ctx);

        let thread = table.get_mut(tid).expect("ready_to_run: unknown thread");
        assert!(
            thread.priority.is_valid(),
            "ready_to_run: priority {} out of range",
            thread.priority
        );

        let level = thread.priority.level();
        let inserted = if self.ready_level(tid).is_none() {
            self.queue_mut(level).push(tid);
            true
        } else {
            false
        };

        thread.state = ThreadState::Ready;
        thread.waiting_time = 0;
        thread.priority = thread.init_priority; // after band selection, see above

        if inserted {
            ctx.trace(&TraceEvent::Admitted {
                tick: ctx.total_ticks(),
                tid,
                level,
            });
        }
    }

    /// Select and remove the next thread to run.
    ///
    /// Probes L1, then L2, then L3; each tier yields its own front (L1
    /// the shortest fresh remain, L2 the highest priority, L3 the oldest
    /// entry). Returns None when every tier is empty so the caller can
    /// take the idle path.
    pub fn find_next_to_run(
        &mut self,
        table: &ThreadTable,
        ctx: &dyn KernelCtx,
    ) -> Option<ThreadId> {
        Self::assert_int_off(ctx);

        for level in [QueueLevel::L1, QueueLevel::L2, QueueLevel::L3] {
            if let Some(tid) = self.queue_mut(level).take_front(table) {
                ctx.trace(&TraceEvent::Removed {
                    tick: ctx.total_ticks(),
                    tid,
                    level,
                });
                return Some(tid);
            }
        }
        None
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    /// Hand the CPU to `next`, saving the outgoing thread's state.
    ///
    /// With `finishing` set, the outgoing thread is parked in the
    /// deferred-destruction slot and reclaimed after the switch, once
    /// execution has left its stack.
    ///
    /// The context-switch call returns when the outgoing thread is next
    /// dispatched; everything after it runs on the outgoing thread's
    /// stack at that later time, starting with the reclamation of
    /// whichever finished thread was parked by then.
    pub fn run(
        &mut self,
        table: &mut ThreadTable,
        ctx: &mut dyn KernelCtx,
        next: ThreadId,
        finishing: bool,
    ) {
        Self::assert_int_off(&*ctx);

        let old = self.current;

        if finishing {
            assert!(
                self.to_be_destroyed.is_none(),
                "run: destruction already pending"
            );
            self.to_be_destroyed = Some(old);
        }

        let old_exec = {
            let old_thread = table.get_mut(old).expect("run: current thread missing");
            if old_thread.has_space() {
                old_thread.save_user_state(&*ctx);
                if let Some(space) = old_thread.space.as_mut() {
                    space.save_state();
                }
            }
            old_thread.check_overflow();
            old_thread.total_exe
        };

        self.current = next;
        {
            let next_thread = table.get_mut(next).expect("run: next thread missing");
            next_thread.state = ThreadState::Running;
            next_thread.waiting_time = 0;
        }

        ctx.trace(&TraceEvent::Dispatched {
            tick: ctx.total_ticks(),
            next,
            prev: old,
            prev_exec: old_exec,
        });

        let now = ctx.total_ticks();
        table
            .get_mut(next)
            .expect("run: next thread missing")
            .last_exec_tick = now;

        self.context_switches += 1;
        ctx.switch_threads(old, next);

        // Back in the old thread's context. Interrupts must still be off
        // when the switch primitive returns.
        assert!(
            ctx.int_level() == IntLevel::Off,
            "interrupts re-enabled across context switch"
        );

        self.check_to_be_destroyed(table);

        // The resumed thread may itself have been the parked one (a mock
        // switch returns immediately); only restore what still exists.
        if let Some(old_thread) = table.get_mut(old) {
            if old_thread.has_space() {
                old_thread.restore_user_state(ctx);
                if let Some(space) = old_thread.space.as_mut() {
                    space.restore_state();
                }
            }
        }
    }

    /// Reclaim the thread parked for destruction, if any.
    ///
    /// Runs after the context switch has moved execution off the dead
    /// thread's stack; a finished thread cannot free itself earlier.
    pub fn check_to_be_destroyed(&mut self, table: &mut ThreadTable) {
        if let Some(tid) = self.to_be_destroyed.take() {
            let victim = table
                .remove(tid)
                .expect("check_to_be_destroyed: thread already gone");
            log::debug!("Reclaimed {} ('{}')", tid, victim.name);
        }
    }

    // ========================================================================
    // AGING
    // ========================================================================

    /// Charge one timer quantum of waiting time to every ready thread
    /// and promote those past the threshold.
    ///
    /// Promotion adds a fixed boost, saturating at the cap, and resets
    /// the wait counter. The main thread (id 0) never ages. A promoted
    /// thread stays in its current tier until it is next selected and
    /// re-admitted; moving entries between queues inside the tick
    /// handler would invalidate the iteration.
    pub fn update_priority(&self, table: &mut ThreadTable, ctx: &dyn KernelCtx) {
        Self::assert_int_off(ctx);

        let tick = ctx.total_ticks();
        for level in [QueueLevel::L1, QueueLevel::L2, QueueLevel::L3] {
            for tid in self.queue(level).iter() {
                let thread = table.get_mut(tid).expect("aging: queued thread missing");
                assert!(
                    thread.state == ThreadState::Ready,
                    "aging: non-ready thread in ready queue"
                );

                thread.waiting_time += TIMER_TICKS;
                if thread.waiting_time >= AGING_THRESHOLD && tid.0 > 0 {
                    let old = thread.priority;
                    let new = old.boosted();
                    thread.priority = new;
                    thread.waiting_time = 0;
                    ctx.trace(&TraceEvent::PriorityRaised {
                        tick,
                        tid,
                        old,
                        new,
                    });
                }
            }
        }
    }

    // ========================================================================
    // PREEMPTION ORACLE
    // ========================================================================

    /// Top-tier preemption test: does the L1 front beat the running
    /// thread on remaining burst?
    ///
    /// Both remains are computed fresh at the comparison; a figure cached
    /// at insertion time could have drifted as execution accrued.
    pub fn check_remain(&self, table: &ThreadTable) -> PreemptVerdict {
        if let Some(head) = self.l1.peek_front(table) {
            let head_remain = table
                .get(head)
                .expect("check_remain: queued thread missing")
                .remain();
            let running_remain = table
                .get(self.current)
                .expect("check_remain: current thread missing")
                .remain();
            if head_remain < running_remain {
                return PreemptVerdict::Preempt;
            }
        }
        PreemptVerdict::Continue
    }

    /// True if any tier that outranks `band` has a thread waiting.
    fn higher_tier_ready(&self, band: QueueLevel) -> bool {
        [QueueLevel::L1, QueueLevel::L2, QueueLevel::L3]
            .into_iter()
            .any(|level| level.outranks(band) && !self.queue(level).is_empty())
    }

    /// Full preemption decision for the timer handler.
    ///
    /// - Top-band runner: displaced only by a shorter remaining burst in
    ///   L1, never by lower-tier arrivals.
    /// - Middle-band runner: displaced by any L1 arrival; never by
    ///   another middle-band thread, whatever its priority.
    /// - Bottom-band runner: displaced by any L1 or L2 arrival, and
    ///   otherwise by round-robin once it has held the CPU for a full
    ///   quantum, whether or not L3 holds a successor.
    pub fn should_preempt(&self, table: &ThreadTable, ctx: &dyn KernelCtx) -> PreemptVerdict {
        let running = table
            .get(self.current)
            .expect("should_preempt: current thread missing");

        let band = running.priority.level();
        match band {
            QueueLevel::L1 => self.check_remain(table),
            QueueLevel::L2 | QueueLevel::L3 => {
                if self.higher_tier_ready(band) {
                    PreemptVerdict::Preempt
                } else if band == QueueLevel::L3
                    && ctx.total_ticks().saturating_sub(running.last_exec_tick) >= RR_QUANTUM
                {
                    PreemptVerdict::Preempt
                } else {
                    PreemptVerdict::Continue
                }
            }
        }
    }

    /// One timer-quantum update cycle: age the waiters, then decide
    /// whether the running thread keeps the CPU.
    ///
    /// On `Preempt` the interrupt handler re-admits the running thread
    /// (unless it is blocking or finishing) and drives
    /// `find_next_to_run` + `run`.
    pub fn on_tick(&self, table: &mut ThreadTable, ctx: &dyn KernelCtx) -> PreemptVerdict {
        self.update_priority(table, ctx);
        self.should_preempt(table, ctx)
    }

    // ========================================================================
    // DEBUGGING
    // ========================================================================

    /// Dump the top-tier queue contents through the logging facade.
    pub fn print(&self, table: &ThreadTable) {
        log::info!("L1 ready queue contents:");
        for tid in self.l1.iter() {
            if let Some(thread) = table.get(tid) {
                log::info!(
                    "  {} '{}' priority {} remain {}",
                    tid,
                    thread.name,
                    thread.priority,
                    thread.remain()
                );
            }
        }
    }
}
