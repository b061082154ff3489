//! A tracing garbage collector for interpreter values.
//!
//! The arena owns every heap cell through an intrusive list. A collection
//! marks from a caller-supplied root and then sweeps the list, freeing every
//! cell the mark phase never reached.
//!
//! Collections run to completion at explicit safe points. Activities mutate
//! their expression stacks, which are collection roots, without any write
//! barrier in between, so the collector must never observe a half-mutated
//! root mid-cycle. The owning activity guarantees it only calls
//! [`GcArena::collect`] while no stack operation is in flight.

use std::{
    cell::{Cell, UnsafeCell},
    mem,
    ptr::NonNull,
};

mod trace;
pub use trace::{GeneralTracer, Trace};

mod ptr;
pub use ptr::{Color, Gc, GcBox};

#[cfg(test)]
mod test;

/// Marking context handed to [`Trace::trace`] implementations.
#[derive(Clone, Copy)]
pub struct Ctx<'gc>(&'gc GcArena);

impl<'gc> Ctx<'gc> {
    /// Mark a pointer as reachable, queueing it for tracing if its value can
    /// itself hold pointers.
    #[inline]
    pub fn mark<T: Trace + 'static>(self, gc: Gc<T>) {
        unsafe {
            if gc.0.as_ref().color.get() != Color::White {
                return;
            }
            if T::needs_trace() {
                gc.0.as_ref().color.set(Color::Gray);
                (*self.0.grays.get()).push(gc.0);
            } else {
                gc.0.as_ref().color.set(Color::Black);
            }
        }
    }
}

pub struct GcArena {
    /// Head of the intrusive list of every live cell.
    all: Cell<Option<NonNull<GcBox<dyn Trace>>>>,
    /// Worklist of cells marked reachable but not yet traced.
    grays: UnsafeCell<Vec<NonNull<GcBox<dyn Trace>>>>,

    total_allocated: Cell<usize>,
    wakeup_total: Cell<usize>,
}

impl Default for GcArena {
    fn default() -> Self {
        GcArena::new()
    }
}

impl GcArena {
    /// Allocation volume below which [`GcArena::collect_if_due`] never runs
    /// a cycle.
    pub const MIN_SLEEP: usize = 4096;
    const PAUSE_FACTOR: f64 = 1.5;

    pub fn new() -> Self {
        GcArena {
            all: Cell::new(None),
            grays: UnsafeCell::new(Vec::new()),
            total_allocated: Cell::new(0),
            wakeup_total: Cell::new(Self::MIN_SLEEP),
        }
    }

    /// Bytes currently held by cells in this arena.
    pub fn total_allocated(&self) -> usize {
        self.total_allocated.get()
    }

    /// Move a value into the arena.
    ///
    /// # Safety
    ///
    /// The returned pointer is unreachable from any root. The caller must
    /// store it into a rooted location before the next collection.
    pub unsafe fn allocate<T: Trace + 'static>(&self, value: T) -> Gc<T> {
        let size = mem::size_of::<GcBox<T>>();
        self.total_allocated.set(self.total_allocated.get() + size);

        let ptr = NonNull::new_unchecked(Box::into_raw(Box::new(GcBox {
            color: Cell::new(Color::White),
            next: Cell::new(self.all.get()),
            value: UnsafeCell::new(value),
        })));

        self.all.set(Some(ptr));
        Gc(ptr)
    }

    /// Run a full collection cycle if enough has been allocated since the
    /// last one.
    ///
    /// # Safety
    ///
    /// Same contract as [`GcArena::collect`].
    pub unsafe fn collect_if_due<T: Trace>(&self, root: &T) {
        if self.total_allocated.get() > self.wakeup_total.get() {
            self.collect(root);
        }
    }

    /// Run a full mark-and-sweep cycle.
    ///
    /// # Safety
    ///
    /// Every pointer the caller intends to use afterwards must be reachable
    /// from `root`. Anything else is freed.
    pub unsafe fn collect<T: Trace>(&self, root: &T) {
        log::trace!(
            "gc: collecting, {} bytes allocated",
            self.total_allocated.get()
        );

        root.trace(Ctx(self));
        while let Some(x) = (*self.grays.get()).pop() {
            x.as_ref().color.set(Color::Black);
            (*x.as_ref().value.get()).trace(Ctx(self));
        }

        self.sweep();

        let live = self.total_allocated.get();
        self.wakeup_total
            .set(((live as f64 * Self::PAUSE_FACTOR) as usize).max(Self::MIN_SLEEP));
        log::trace!("gc: done, {} bytes live", live);
    }

    unsafe fn sweep(&self) {
        let mut prev: Option<NonNull<GcBox<dyn Trace>>> = None;
        let mut cur = self.all.get();
        while let Some(x) = cur {
            cur = x.as_ref().next.get();
            if x.as_ref().color.get() == Color::White {
                match prev {
                    Some(p) => p.as_ref().next.set(cur),
                    None => self.all.set(cur),
                }
                self.total_allocated
                    .set(self.total_allocated.get() - mem::size_of_val(x.as_ref()));
                drop(Box::from_raw(x.as_ptr()));
            } else {
                x.as_ref().color.set(Color::White);
                prev = Some(x);
            }
        }
    }
}

impl Drop for GcArena {
    fn drop(&mut self) {
        // Nothing can be live once the arena goes away.
        unsafe {
            let mut cur = self.all.get();
            while let Some(x) = cur {
                cur = x.as_ref().next.get();
                drop(Box::from_raw(x.as_ptr()));
            }
        }
    }
}
