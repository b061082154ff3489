//! The expression evaluation stack.
//!
//! Every expression the evaluator runs keeps its intermediate values here,
//! and every message send or native routine call receives its arguments as
//! a contiguous run of slots at the stack top:
//!
//! ```text
//!            ╔═══════╦═══..   ..═══╦═══════╦═══════╦═══════╗
//!            ║ temp  ║   ..temps.. ║ arg 1 ║ arg 2 ║ arg 3 ║ unused..
//!            ╚═══════╩═══..   ..═══╩═══════╩═══════╩═══════╝
//!                △                     △                        △
//!   base pointer ╝   offset 2 from top ╝            top pointer ╝
//! ```
//!
//! Keeping an argument list contiguous at the top means the whole list can
//! be handed to dispatch as a plain slice with no copying; the price is
//! that the evaluator must know the argument count up front.
//!
//! The primitives do no bounds checking beyond debug builds. The evaluator
//! computes frame sizes before running an expression and a violation here
//! is a bug in that computation, not a recoverable state. Validation of
//! argument *values* is a different story and lives in the coercion
//! helpers, which raise language-level conditions.

use std::ptr::{self, NonNull};

use common::{atom::Atom, slow_assert};

use crate::{
    activity::Activity,
    condition::{Condition, Result},
    gc::{Ctx, Gc, GcArena, GeneralTracer, Trace},
    number::ARGUMENT_DIGITS,
    value::Value,
};

pub struct ExpressionStack {
    /// Base of the bound frame storage.
    base: NonNull<Value>,
    /// One past the highest occupied slot. Equal to `base` when empty.
    top: *mut Value,
    /// Slot capacity of the bound frame.
    entries: usize,
}

impl ExpressionStack {
    /// An unbound stack. Unusable until an activity assigns it a frame.
    pub fn new() -> Self {
        let base = NonNull::dangling();
        ExpressionStack {
            base,
            top: base.as_ptr(),
            entries: 0,
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub fn depth(&self) -> usize {
        unsafe { self.top.offset_from(self.base.as_ptr()) as usize }
    }

    /// # Safety
    ///
    /// The bound frame must have room for one more value.
    #[inline]
    pub unsafe fn push(&mut self, value: Value) {
        debug_assert!(self.depth() < self.entries);
        self.top.write(value);
        self.top = self.top.add(1);
    }

    /// # Safety
    ///
    /// The stack must not be empty.
    #[inline]
    pub unsafe fn pop(&mut self) -> Value {
        slow_assert!(self.depth() > 0);
        self.top = self.top.sub(1);
        self.top.read()
    }

    /// Read the slot `offset` positions below the top without consuming it.
    /// `peek(0)` is the top of the stack.
    ///
    /// # Safety
    ///
    /// `offset` must be less than the current depth.
    #[inline]
    pub unsafe fn peek(&self, offset: usize) -> Value {
        slow_assert!(offset < self.depth());
        self.top.sub(offset + 1).read()
    }

    /// Address of the slot `offset` positions below the top, for in-place
    /// replacement.
    ///
    /// # Safety
    ///
    /// `offset` must be less than the current depth. The pointer is
    /// invalidated by any frame rebinding.
    #[inline]
    pub unsafe fn slot_ptr(&self, offset: usize) -> *mut Value {
        slow_assert!(offset < self.depth());
        self.top.sub(offset + 1)
    }

    /// Overwrite the slot `offset` positions below the top, leaving the
    /// depth unchanged.
    ///
    /// # Safety
    ///
    /// `offset` must be less than the current depth.
    #[inline]
    pub unsafe fn replace(&mut self, offset: usize, value: Value) {
        self.slot_ptr(offset).write(value)
    }

    /// Discard the top `count` values at once.
    ///
    /// # Safety
    ///
    /// `count` must not exceed the current depth.
    #[inline]
    pub unsafe fn pop_n(&mut self, count: usize) {
        slow_assert!(count <= self.depth());
        self.top = self.top.sub(count);
    }

    /// Abandon everything on the stack, as when unwinding out of a partially
    /// evaluated expression.
    #[inline]
    pub fn clear(&mut self) {
        self.top = self.base.as_ptr();
    }

    /// Set the depth to an absolute value, restoring a previously observed
    /// position.
    ///
    /// # Safety
    ///
    /// Every slot below `depth` must have been written since the frame was
    /// bound, and `depth` must not exceed the frame capacity.
    #[inline]
    pub unsafe fn set_depth(&mut self, depth: usize) {
        debug_assert!(depth <= self.entries);
        self.top = self.base.as_ptr().add(depth);
    }

    /// Store the result of a binary operator: two operands become one
    /// result in a single depth decrement.
    ///
    /// # Safety
    ///
    /// The current depth must be at least two.
    #[inline]
    pub unsafe fn operator_result(&mut self, value: Value) {
        slow_assert!(self.depth() >= 2);
        self.top = self.top.sub(1);
        self.top.sub(1).write(value);
    }

    /// Store the result of a prefix operator over its sole operand, leaving
    /// the depth unchanged.
    ///
    /// # Safety
    ///
    /// The stack must not be empty.
    #[inline]
    pub unsafe fn prefix_result(&mut self, value: Value) {
        slow_assert!(self.depth() > 0);
        self.top.sub(1).write(value)
    }

    /// The top `count` slots as a contiguous argument vector in
    /// left-to-right call order. No values are copied.
    ///
    /// # Safety
    ///
    /// `count` must not exceed the current depth.
    #[inline]
    pub unsafe fn arguments(&self, count: usize) -> &[Value] {
        slow_assert!(count <= self.depth());
        std::slice::from_raw_parts(self.top.sub(count), count)
    }

    /// The raw backing storage and its capacity. Only frame owners have
    /// business with this.
    pub fn raw_frame(&self) -> (NonNull<Value>, usize) {
        (self.base, self.entries)
    }

    /// Bind this stack to externally allocated storage and reset it to
    /// empty.
    ///
    /// # Safety
    ///
    /// `base` must be valid for `entries` values for as long as the binding
    /// lasts. The storage need not be initialized; no operation reads a
    /// slot it has not written.
    pub unsafe fn assign_frame(&mut self, base: NonNull<Value>, entries: usize) {
        self.base = base;
        self.top = base.as_ptr();
        self.entries = entries;
    }

    /// Move this stack onto fresh storage owned by `activity`, preserving
    /// every occupied slot and the current depth. Used to grow a frame or
    /// to carry a stack over to another activity.
    ///
    /// Callers must not hold pointers from [`ExpressionStack::slot_ptr`]
    /// across a migration.
    pub fn migrate(&mut self, activity: &mut Activity, entries: usize) {
        let depth = self.depth();
        debug_assert!(entries >= depth);
        let (old_base, old_entries) = self.raw_frame();
        activity.allocate_stack_frame(self, entries);
        unsafe {
            ptr::copy_nonoverlapping(old_base.as_ptr(), self.base.as_ptr(), depth);
            self.top = self.base.as_ptr().add(depth);
        }
        if old_entries != 0 {
            activity.release_stack_frame(old_base);
        }
    }

    /// Shared slot walk for both marking flavours. Slots beyond the top are
    /// never read; they may hold stale values from popped expressions.
    fn for_each_live(&self, mut f: impl FnMut(Value)) {
        unsafe {
            let mut cur = self.base.as_ptr();
            while cur < self.top {
                let value = cur.read();
                if !value.is_empty() {
                    f(value);
                }
                cur = cur.add(1);
            }
        }
    }

    /// Report every live slot to a whole-graph walk, such as flattening.
    /// Traversal is identical to the collection-cycle marking; only the
    /// visitor differs.
    pub fn trace_general(&self, tracer: &mut dyn GeneralTracer) {
        self.for_each_live(|v| tracer.visit_value(v));
    }
}

impl Default for ExpressionStack {
    fn default() -> Self {
        ExpressionStack::new()
    }
}

unsafe impl Trace for ExpressionStack {
    fn needs_trace() -> bool
    where
        Self: Sized,
    {
        true
    }

    fn trace(&self, ctx: Ctx) {
        self.for_each_live(|v| v.trace(ctx));
    }
}

/// Argument coercion.
///
/// These helpers read a slot known to be an argument of a call in flight
/// and coerce it to the representation a native routine needs. A successful
/// conversion is written back into the slot, so reading the same argument
/// twice converts once. Failures raise conditions; the primitives' no-check
/// policy does not apply here because these validate what a *user* passed.
impl ExpressionStack {
    /// Coerce the argument at `offset` to a string, raising NOSTRING when
    /// the value has no string form.
    ///
    /// # Safety
    ///
    /// `offset` must be less than the current depth.
    pub unsafe fn required_string_arg(
        &mut self,
        offset: usize,
        arena: &GcArena,
    ) -> Result<Gc<String>> {
        let value = self.peek(offset);
        if value.is_string() {
            return Ok(value.into_string());
        }
        match value.string_value(arena) {
            Some(converted) => {
                self.replace(offset, Value::from(converted));
                Ok(converted)
            }
            None => Err(Condition::NoString {
                value: value.display_string(),
            }),
        }
    }

    /// As [`ExpressionStack::required_string_arg`], but an omitted argument
    /// is a legitimate `None`, not a condition.
    ///
    /// # Safety
    ///
    /// `offset` must be less than the current depth.
    pub unsafe fn optional_string_arg(
        &mut self,
        offset: usize,
        arena: &GcArena,
    ) -> Result<Option<Gc<String>>> {
        if self.peek(offset).is_empty() {
            return Ok(None);
        }
        self.required_string_arg(offset, arena).map(Some)
    }

    /// Coerce the argument at `offset` to a whole number within the
    /// argument digit ceiling.
    ///
    /// `argcount` is the length of the argument list the offset indexes
    /// into; conditions cite position `argcount - offset`, the 1-based
    /// left-to-right position the caller wrote.
    ///
    /// # Safety
    ///
    /// `offset` must be less than the current depth.
    pub unsafe fn required_integer_arg(
        &mut self,
        offset: usize,
        argcount: usize,
        routine: Atom,
    ) -> Result<Value> {
        let value = self.peek(offset);
        if value.is_int() {
            return Ok(value);
        }
        match value.whole_number(ARGUMENT_DIGITS) {
            Some(v) => {
                // The digit ceiling keeps v within the inline integer range.
                let converted = Value::from(v as i32);
                self.replace(offset, converted);
                Ok(converted)
            }
            None => Err(Condition::NotWholeNumber {
                routine,
                position: argcount - offset,
                value: value.display_string(),
            }),
        }
    }

    /// # Safety
    ///
    /// `offset` must be less than the current depth.
    pub unsafe fn optional_integer_arg(
        &mut self,
        offset: usize,
        argcount: usize,
        routine: Atom,
    ) -> Result<Option<Value>> {
        if self.peek(offset).is_empty() {
            return Ok(None);
        }
        self.required_integer_arg(offset, argcount, routine)
            .map(Some)
    }

    /// Coerce the argument at `offset` to a 64-bit integer for native
    /// routine interop. Unlike [`ExpressionStack::required_integer_arg`]
    /// this uses the full 64-bit range; values beyond it raise.
    ///
    /// # Safety
    ///
    /// `offset` must be less than the current depth.
    pub unsafe fn required_int64_arg(
        &mut self,
        offset: usize,
        argcount: usize,
        routine: Atom,
        arena: &GcArena,
    ) -> Result<i64> {
        let value = self.peek(offset);
        if value.is_int() {
            return Ok(i64::from(value.into_int()));
        }
        if value.is_object() {
            if let Some(v) = value.into_object().int64() {
                return Ok(v);
            }
        }
        match value.int64() {
            Some(v) => {
                self.replace(offset, Value::from_int64(v, arena));
                Ok(v)
            }
            None => Err(Condition::NotWholeNumber {
                routine,
                position: argcount - offset,
                value: value.display_string(),
            }),
        }
    }

    /// # Safety
    ///
    /// `offset` must be less than the current depth.
    pub unsafe fn optional_int64_arg(
        &mut self,
        offset: usize,
        argcount: usize,
        routine: Atom,
        arena: &GcArena,
    ) -> Result<Option<i64>> {
        if self.peek(offset).is_empty() {
            return Ok(None);
        }
        self.required_int64_arg(offset, argcount, routine, arena)
            .map(Some)
    }

    /// Check an argument list against a routine's declared arity, then
    /// check that every required position was actually supplied. The first
    /// missing required position, counted left to right, is the one
    /// reported.
    ///
    /// # Safety
    ///
    /// `argcount` must not exceed the current depth.
    pub unsafe fn validate_arity(
        &self,
        argcount: usize,
        min: usize,
        max: usize,
        routine: Atom,
    ) -> Result<()> {
        if argcount < min {
            return Err(Condition::TooFewArgs { routine, min });
        }
        if argcount > max {
            return Err(Condition::TooManyArgs { routine, max });
        }
        for position in 1..=min {
            if self.peek(argcount - position).is_empty() {
                return Err(Condition::MissingArg { routine, position });
            }
        }
        Ok(())
    }
}
