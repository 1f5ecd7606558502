/*
 * Thread Descriptors and the Thread Table
 *
 * The Thread structure carries everything the scheduler reads or writes
 * about a thread: its priority pair, burst accounting, waiting time, the
 * kernel stack, and the saved user-mode context. Descriptors live in the
 * ThreadTable arena; the ready queues only ever hold ThreadId handles,
 * and a descriptor is dropped exclusively through the scheduler's
 * deferred-destruction slot.
 */

use alloc::{boxed::Box, collections::BTreeMap, string::String};
use core::fmt;

use super::traits::{AddressSpace, KernelCtx};
use super::types::Priority;

/// Thread stack size (64 KiB per thread)
pub const THREAD_STACK_SIZE: usize = 64 * 1024;

/// Maximum number of threads
pub const MAX_THREADS: usize = 64;

/// Fencepost word written at the low end of every kernel stack.
const STACK_FENCEPOST: u64 = 0xdead_beef_cafe_f00d;

/// Thread identifier
///
/// Id 0 is reserved for the main thread, which also serves as the idle
/// thread and is exempt from aging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ThreadId(pub usize);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread({})", self.0)
    }
}

/// Thread state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    New,
    Ready,
    Running,
    Blocked,
    Terminated,
}

/// Saved user-mode register file
///
/// Captured from the machine when a user thread is switched out and
/// loaded back when it resumes. The layout is machine-neutral; the
/// KernelCtx implementation maps it onto the real register set.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserContext {
    pub gpr: [u64; 16],
    pub pc: u64,
    pub sp: u64,
    pub flags: u64,
}

/// Thread descriptor
///
/// `priority` is the effective scheduling priority and moves upward under
/// aging; `init_priority` is the creation-time value re-applied on every
/// admission. `burst_time` and `total_exe` feed the derived remaining
/// burst used for top-tier ordering.
pub struct Thread {
    pub id: ThreadId,
    pub name: String,
    pub state: ThreadState,
    pub priority: Priority,
    pub init_priority: Priority,
    pub burst_time: u64,
    pub total_exe: u64,
    pub waiting_time: u64,
    pub last_exec_tick: u64,
    pub user_ctx: UserContext,
    pub space: Option<Box<dyn AddressSpace>>,
    stack: Box<[u8]>,
}

impl Thread {
    pub(crate) fn new(id: ThreadId, name: String, init_priority: Priority, burst_time: u64) -> Self {
        let mut stack = alloc::vec![0u8; THREAD_STACK_SIZE].into_boxed_slice();
        stack[..8].copy_from_slice(&STACK_FENCEPOST.to_ne_bytes());

        Self {
            id,
            name,
            state: ThreadState::New,
            priority: init_priority,
            init_priority,
            burst_time,
            total_exe: 0,
            waiting_time: 0,
            last_exec_tick: 0,
            user_ctx: UserContext::default(),
            space: None,
            stack,
        }
    }

    /// Remaining burst, recomputed on every call.
    ///
    /// `total_exe` mutates while the thread is enqueued, so the value is
    /// never cached; every comparison sees the current figure.
    pub fn remain(&self) -> u64 {
        self.burst_time.saturating_sub(self.total_exe)
    }

    /// True if this thread carries a user memory image.
    pub fn has_space(&self) -> bool {
        self.space.is_some()
    }

    /// Capture the machine's user registers into this descriptor.
    pub fn save_user_state(&mut self, ctx: &dyn KernelCtx) {
        self.user_ctx = ctx.capture_user_ctx();
    }

    /// Load this descriptor's saved user registers back into the machine.
    pub fn restore_user_state(&self, ctx: &mut dyn KernelCtx) {
        ctx.load_user_ctx(&self.user_ctx);
    }

    /// Verify the kernel stack fencepost is intact.
    ///
    /// # Panics
    /// Panics if the stack grew past its low end and stomped the
    /// fencepost word.
    pub fn check_overflow(&self) {
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.stack[..8]);
        assert!(
            u64::from_ne_bytes(word) == STACK_FENCEPOST,
            "kernel stack overflow detected on {}",
            self.id
        );
    }

    #[cfg(test)]
    fn stomp_stack(&mut self) {
        self.stack[0] = 0;
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("priority", &self.priority)
            .field("remain", &self.remain())
            .field("stack_size", &self.stack.len())
            .finish()
    }
}

/// Arena of all live thread descriptors
///
/// Owns the descriptors; everything else in the subsystem refers to
/// threads by id. Ids increase monotonically and are never reused, so a
/// stale handle can only miss, never alias.
pub struct ThreadTable {
    threads: BTreeMap<ThreadId, Thread>,
    next_id: usize,
}

impl ThreadTable {
    pub fn new() -> Self {
        Self {
            threads: BTreeMap::new(),
            next_id: 1, // id 0 reserved for the main thread
        }
    }

    /// Register the bootstrap thread as id 0, already Running.
    ///
    /// This is the thread the first dispatch switches away from. It has
    /// no declared burst and never ages.
    pub fn init_main_thread(&mut self, name: &str) -> ThreadId {
        let id = ThreadId(0);
        assert!(
            !self.threads.contains_key(&id),
            "main thread already registered"
        );

        let mut main = Thread::new(id, name.into(), Priority::MIN, 0);
        main.state = ThreadState::Running;
        self.threads.insert(id, main);

        log::info!("Registered main thread '{}' as {}", name, id);
        id
    }

    /// Allocate a new thread descriptor.
    ///
    /// The thread starts in the New state; it only becomes schedulable
    /// once admitted to a ready queue.
    pub fn create(
        &mut self,
        name: &str,
        init_priority: Priority,
        burst_time: u64,
    ) -> Result<ThreadId, &'static str> {
        if self.threads.len() >= MAX_THREADS {
            return Err("thread table full");
        }
        assert!(
            init_priority.is_valid(),
            "create: priority {} out of range",
            init_priority
        );

        let id = ThreadId(self.next_id);
        self.next_id += 1;

        let thread = Thread::new(id, name.into(), init_priority, burst_time);
        self.threads.insert(id, thread);

        log::info!("Created thread '{}' with id {}", name, id);
        Ok(id)
    }

    /// Install a user memory image on a thread.
    pub fn attach_space(&mut self, tid: ThreadId, space: Box<dyn AddressSpace>) {
        let thread = self
            .threads
            .get_mut(&tid)
            .expect("attach_space: unknown thread");
        thread.space = Some(space);
    }

    pub fn get(&self, tid: ThreadId) -> Option<&Thread> {
        self.threads.get(&tid)
    }

    pub fn get_mut(&mut self, tid: ThreadId) -> Option<&mut Thread> {
        self.threads.get_mut(&tid)
    }

    pub fn remove(&mut self, tid: ThreadId) -> Option<Thread> {
        self.threads.remove(&tid)
    }

    pub fn contains(&self, tid: ThreadId) -> bool {
        self.threads.contains_key(&tid)
    }
}

impl Default for ThreadTable {
    fn default() -> Self {
        Self::new()
    }
}
