//! The minimal heap object the runtime needs.
//!
//! The full class hierarchy lives a layer up; the runtime only distinguishes
//! objects it must look inside: the boxed 64-bit integer that argument
//! coercion creates for values too wide for an inline integer.

use crate::gc::{Ctx, Trace};
use crate::number;

#[derive(Debug)]
pub enum ObjectKind {
    /// An opaque object. Has no string or numeric form at this layer.
    Ordinary,
    /// A whole number outside the inline 32-bit range.
    Int64(i64),
}

#[derive(Debug)]
pub struct Object {
    kind: ObjectKind,
}

impl Object {
    pub fn new() -> Self {
        Object {
            kind: ObjectKind::Ordinary,
        }
    }

    pub fn new_int64(value: i64) -> Self {
        Object {
            kind: ObjectKind::Int64(value),
        }
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// The object's string form, if it has one.
    pub fn string_value(&self) -> Option<String> {
        match self.kind {
            ObjectKind::Ordinary => None,
            ObjectKind::Int64(v) => Some(v.to_string()),
        }
    }

    /// The object's value as a 64-bit integer, if it has one.
    pub fn int64(&self) -> Option<i64> {
        match self.kind {
            ObjectKind::Ordinary => None,
            ObjectKind::Int64(v) => Some(v),
        }
    }

    /// Whole-number view bounded to `digits` significant digits.
    pub fn whole_number(&self, digits: u32) -> Option<i64> {
        self.int64()
            .filter(|&v| number::within_digits(v, digits))
    }
}

impl Default for Object {
    fn default() -> Self {
        Object::new()
    }
}

unsafe impl Trace for Object {
    fn needs_trace() -> bool
    where
        Self: Sized,
    {
        false
    }

    fn trace(&self, _ctx: Ctx) {}
}
