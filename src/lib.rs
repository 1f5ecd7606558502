/*
 * mlfq-sched
 *
 * Thread scheduling core for a single-CPU teaching kernel: a three-tier
 * multilevel feedback ready queue with priority aging, a preemption
 * oracle driven by the timer interrupt, and a dispatcher with deferred
 * thread destruction.
 *
 * The crate is freestanding (no_std with alloc); the embedding kernel
 * supplies the allocator, a logger backend for the `log` facade, and an
 * implementation of the KernelCtx collaborator trait covering the
 * interrupt controller, the tick counter, the user register file, and
 * the machine context switch. Unit tests run hosted against mocks.
 */

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod scheduler;

pub use scheduler::{
    AddressSpace, DebugFlags, IntLevel, KernelCtx, PreemptVerdict, Priority, QueueLevel,
    ReadyQueue, Scheduler, Thread, ThreadId, ThreadState, ThreadTable, TraceBuffer, TraceEvent,
    UserContext,
};
