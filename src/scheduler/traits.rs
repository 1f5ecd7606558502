/*
 * Collaborator Trait Definitions
 *
 * The scheduler never touches hardware directly. Everything machine- or
 * kernel-owned (interrupt controller, tick counter, context switch, user
 * register file, trace sink) is reached through KernelCtx, and user
 * memory images through AddressSpace. The embedding kernel supplies the
 * real implementations; the test suite supplies mocks.
 */

use super::events::TraceEvent;
use super::thread::{ThreadId, UserContext};
use super::types::IntLevel;

/// Kernel mechanism interface consumed by the scheduler
///
/// This trait is the only way scheduling code can observe or drive the
/// machine. Keeping the boundary narrow means the policy logic can be
/// exercised hosted, with a scripted clock and a recorded switch log.
pub trait KernelCtx {
    /// Current processor interrupt level.
    ///
    /// Every scheduler entry point asserts this is `Off`; on a
    /// uniprocessor that is the mutual exclusion for all scheduler state.
    fn int_level(&self) -> IntLevel;

    /// Monotonic tick counter maintained by the statistics module.
    fn total_ticks(&self) -> u64;

    /// Deliver one scheduling trace event to the debug channel.
    fn trace(&self, event: &TraceEvent);

    /// Read the machine's user-mode registers.
    fn capture_user_ctx(&self) -> UserContext;

    /// Write a saved register file back into the machine.
    fn load_user_ctx(&mut self, ctx: &UserContext);

    /// The machine-dependent context switch.
    ///
    /// Suspends `prev` and resumes `next`. The call returns in `prev`'s
    /// context when `prev` is next dispatched, which may be arbitrarily
    /// far in the future.
    fn switch_threads(&mut self, prev: ThreadId, next: ThreadId);
}

/// User memory image attached to a thread
///
/// Saved before a user thread is switched out and restored when it
/// resumes. The backing store (page tables, swap, simulator pages) is the
/// implementation's business.
pub trait AddressSpace: Send {
    fn save_state(&mut self);
    fn restore_state(&mut self);
}
