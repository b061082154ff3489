use std::{
    cell::{Cell, UnsafeCell},
    fmt,
    ops::Deref,
    ptr::NonNull,
};

use super::Trace;

/// Mark state of a heap cell.
///
/// White cells have not been reached this cycle, gray cells are reached but
/// not yet traced, black cells are reached and fully traced.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Color {
    White,
    Gray,
    Black,
}

/// Header plus value of a collector-managed allocation.
///
/// Cells are linked into a single intrusive list owned by the arena, which
/// the sweep phase walks to find unreachable cells.
pub struct GcBox<T: Trace + ?Sized> {
    pub(crate) color: Cell<Color>,
    pub(crate) next: Cell<Option<NonNull<GcBox<dyn Trace>>>>,
    pub(crate) value: UnsafeCell<T>,
}

/// A pointer to a value owned by a [`GcArena`](super::GcArena).
///
/// Copying the pointer does not root the value. A `Gc` is only safe to hold
/// across a collection while something reachable from the collection root
/// refers to it.
pub struct Gc<T: Trace + ?Sized>(pub(crate) NonNull<GcBox<T>>);

impl<T: Trace + ?Sized> Copy for Gc<T> {}
impl<T: Trace + ?Sized> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: fmt::Debug + Trace> fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Gc")
            .field(unsafe { &(*self.0.as_ref().value.get()) })
            .finish()
    }
}

impl<T: Trace + 'static> Gc<T> {
    #[inline]
    pub fn into_raw(this: Self) -> *mut () {
        this.0.as_ptr() as *mut _
    }

    /// # Safety
    ///
    /// `this` must come from [`Gc::into_raw`] for the same `T`.
    #[inline]
    pub unsafe fn from_raw(this: *mut ()) -> Self {
        Gc(NonNull::new_unchecked(this as *mut GcBox<T>))
    }

    /// Pointer identity, the identity test for interpreter values.
    #[inline]
    pub fn ptr_eq(this: Self, other: Self) -> bool {
        this.0 == other.0
    }
}

impl<T: Trace + ?Sized> Deref for Gc<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &(*self.0.as_ref().value.get()) }
    }
}
