//! Bounded FIFO of motion commands.
//!
//! Ring buffer with free-running write/read indices masked to the capacity.
//! The producer side is the command handlers, the consumer side is the poll
//! loop; both run in the foreground, so the queue is plain `&mut self`.
//!
//! `is_full()` reports back-pressure once fewer than `headroom` slots are
//! free. `push` itself only fails when no slot is left at all, so a caller
//! that saw `is_full() == false` can always admit a burst of `headroom`
//! commands.

use tracing::warn;
use wire_common::consts::{QUEUE_CAPACITY, QUEUE_HEADROOM_DEFAULT};

use crate::command::MotionCommand;
use crate::error::{MotionError, MotionResult};

/// Fixed-capacity command queue. `N` must be a power of two.
#[derive(Debug, Clone)]
pub struct CommandQueue<const N: usize = QUEUE_CAPACITY> {
    slots: [Option<MotionCommand>; N],
    write_index: usize,
    read_index: usize,
    headroom: usize,
}

impl<const N: usize> CommandQueue<N> {
    const CAPACITY_CHECK: () = assert!(N.is_power_of_two(), "queue capacity must be a power of two");
    const MASK: usize = N - 1;

    /// Empty queue with the default headroom of 3 slots.
    pub fn new() -> Self {
        Self::with_headroom(QUEUE_HEADROOM_DEFAULT)
    }

    /// Empty queue reporting full once fewer than `headroom` slots are free.
    /// `headroom` is clamped to the capacity.
    pub fn with_headroom(headroom: usize) -> Self {
        let () = Self::CAPACITY_CHECK;
        Self {
            slots: [None; N],
            write_index: 0,
            read_index: 0,
            headroom: headroom.min(N),
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub const fn headroom(&self) -> usize {
        self.headroom
    }

    /// Number of queued commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.write_index.wrapping_sub(self.read_index)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.write_index == self.read_index
    }

    /// Free slots left.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.len()
    }

    /// Back-pressure: fewer than `headroom` slots free.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free() < self.headroom
    }

    /// Append a command.
    ///
    /// The headroom is not enforced here: a push succeeds while any slot
    /// is free, even when [`is_full`](Self::is_full) already reports
    /// back-pressure. Callers that must keep the reserve check `is_full`
    /// first.
    ///
    /// # Errors
    /// `MotionError::QueueFull` if no slot is free; the queue is unchanged.
    pub fn push(&mut self, cmd: MotionCommand) -> MotionResult<()> {
        if self.free() == 0 {
            warn!("Command queue full, dropping {}", cmd.name());
            return Err(MotionError::QueueFull { capacity: N });
        }
        self.slots[self.write_index & Self::MASK] = Some(cmd);
        self.write_index = self.write_index.wrapping_add(1);
        Ok(())
    }

    /// Append every command of `cmds`, or none of them.
    ///
    /// # Errors
    /// `MotionError::QueueFull` if the burst does not fit.
    pub fn push_all(&mut self, cmds: &[MotionCommand]) -> MotionResult<()> {
        if cmds.len() > self.free() {
            warn!(
                "Command queue cannot admit {} commands ({} free)",
                cmds.len(),
                self.free()
            );
            return Err(MotionError::QueueFull { capacity: N });
        }
        for cmd in cmds {
            self.push(*cmd)?;
        }
        Ok(())
    }

    /// Remove and return the oldest command.
    pub fn pop(&mut self) -> Option<MotionCommand> {
        if self.is_empty() {
            return None;
        }
        let cmd = self.slots[self.read_index & Self::MASK].take();
        self.read_index = self.read_index.wrapping_add(1);
        cmd
    }

    /// Oldest command without removing it.
    pub fn peek(&self) -> Option<&MotionCommand> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.read_index & Self::MASK].as_ref()
    }

    /// Drop every pending command and reset both indices.
    pub fn clear(&mut self) {
        self.slots = [None; N];
        self.write_index = 0;
        self.read_index = 0;
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
