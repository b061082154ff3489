//! Activities, the runtime's cooperative execution contexts.
//!
//! One activity owns one logical thread of interpreter execution: the
//! garbage-collected arena its values live in, the storage backing its
//! expression stacks, and the condition trap state of the code it is
//! running. Activities never share any of this; concurrent interpreters run
//! entirely disjoint activities.

use std::{
    alloc::{self, Layout},
    ptr::NonNull,
};

use crate::{
    condition::{Condition, TrapMask},
    gc::GcArena,
    stack::ExpressionStack,
    value::Value,
};

/// One allocation of expression stack storage.
///
/// Buffers hand out raw slot memory; the stack bound to a buffer tracks
/// which slots are live. Dropping a buffer frees the allocation.
struct StackFrameBuffer {
    base: NonNull<Value>,
    entries: usize,
}

impl StackFrameBuffer {
    /// Allocation failure is fatal. Frame sizing is an interpreter bug or a
    /// genuine out-of-memory, neither of which is reported as a condition.
    fn new(entries: usize) -> Self {
        let layout = Layout::array::<Value>(entries).unwrap();
        let ptr = unsafe { alloc::alloc(layout) };
        let Some(base) = NonNull::new(ptr.cast::<Value>()) else {
            alloc::handle_alloc_error(layout);
        };
        StackFrameBuffer { base, entries }
    }
}

impl Drop for StackFrameBuffer {
    fn drop(&mut self) {
        unsafe {
            alloc::dealloc(
                self.base.as_ptr().cast(),
                Layout::array::<Value>(self.entries).unwrap(),
            )
        }
    }
}

pub struct Activity {
    arena: GcArena,
    frames: Vec<StackFrameBuffer>,
    traps: TrapMask,
}

impl Default for Activity {
    fn default() -> Self {
        Activity::new()
    }
}

impl Activity {
    /// Frame size used when a caller has no better estimate of expression
    /// depth.
    pub const DEFAULT_FRAME_ENTRIES: usize = 64;

    pub fn new() -> Self {
        Activity {
            arena: GcArena::new(),
            frames: Vec::new(),
            traps: TrapMask::SYNTAX,
        }
    }

    pub fn arena(&self) -> &GcArena {
        &self.arena
    }

    /// Allocate fresh backing storage and bind `stack` to it.
    ///
    /// The previous binding, if any, stays allocated until released; a
    /// migrating stack still has to copy its slots out of it.
    pub fn allocate_stack_frame(&mut self, stack: &mut ExpressionStack, entries: usize) {
        debug_assert!(entries > 0);
        let buffer = StackFrameBuffer::new(entries);
        log::trace!("activity: stack frame of {} entries", entries);
        unsafe { stack.assign_frame(buffer.base, entries) };
        self.frames.push(buffer);
    }

    /// Return a frame buffer to the allocator.
    ///
    /// No-op when `base` belongs to a different activity; that activity
    /// frees the buffer when it is itself discarded.
    pub fn release_stack_frame(&mut self, base: NonNull<Value>) {
        if let Some(idx) = self.frames.iter().position(|f| f.base == base) {
            self.frames.swap_remove(idx);
        }
    }

    pub fn set_trap(&mut self, trap: TrapMask) {
        self.traps |= trap;
    }

    pub fn clear_trap(&mut self, trap: TrapMask) {
        self.traps &= !trap;
    }

    /// Whether a handler in this activity traps the given condition.
    pub fn traps(&self, condition: &Condition) -> bool {
        self.traps.contains(condition.trap())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::atom::Atoms;

    #[test]
    fn frames_bind_and_release() {
        let mut activity = Activity::new();
        let mut stack = ExpressionStack::new();
        activity.allocate_stack_frame(&mut stack, 16);
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.raw_frame().1, 16);

        let (base, _) = stack.raw_frame();
        activity.allocate_stack_frame(&mut stack, 32);
        activity.release_stack_frame(base);
        assert_eq!(stack.raw_frame().1, 32);
    }

    #[test]
    fn trap_state() {
        let mut atoms = Atoms::new();
        let name = atoms.intern("POS");
        let condition = Condition::TooFewArgs {
            routine: name,
            min: 2,
        };

        let mut activity = Activity::new();
        assert!(activity.traps(&condition));
        activity.clear_trap(TrapMask::SYNTAX);
        assert!(!activity.traps(&condition));
        activity.set_trap(TrapMask::SYNTAX | TrapMask::NOVALUE);
        assert!(activity.traps(&condition));
    }
}
