//! The NaN-tagged value representation used throughout the runtime.

use crate::{
    gc::{Ctx, Gc, GcArena, Trace},
    number,
    object::Object,
};
use static_assertions::assert_eq_size;
use std::{cmp, fmt, hash};

const MAX_DOUBLE: u64 = (0xfff8_0000) << 32;
pub const TAG_INT: u64 = (0xfff9_0000) << 32;
pub const TAG_EMPTY: u64 = (0xfffa_0000) << 32;
pub const TAG_NIL: u64 = (0xfffb_0000) << 32;
pub const TAG_OBJECT: u64 = (0xfffd_0000) << 32;
pub const TAG_STRING: u64 = (0xfffe_0000) << 32;
pub const TAG_MASK: u64 = (0xffff_0000) << 32;

const PTR_MASK: u64 = 0x0000_ffff_ffff_ffff;
const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

#[derive(Copy, Clone)]
pub union ValueUnion {
    float: f64,
    int: i32,
    pub bits: u64,
}

impl cmp::Eq for ValueUnion {}
impl cmp::PartialEq<ValueUnion> for ValueUnion {
    fn eq(&self, other: &ValueUnion) -> bool {
        unsafe { self.bits == other.bits }
    }
}

impl hash::Hash for ValueUnion {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        state.write_u64(unsafe { self.bits })
    }
}

/// A NaN-tagged interpreter value.
///
/// Holds either an inline payload (32-bit integer, float, the nil object,
/// the empty marker) or a pointer to a heap value (string, object). The
/// empty marker is not a language value; it marks an expression stack slot
/// whose argument was never supplied.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Value(ValueUnion);

assert_eq_size!(Value, u64);

impl Default for Value {
    fn default() -> Self {
        Value::empty()
    }
}

impl Value {
    /// The omitted-argument marker.
    #[inline]
    pub fn empty() -> Self {
        Value(ValueUnion { bits: TAG_EMPTY })
    }

    /// The nil object.
    #[inline]
    pub fn nil() -> Self {
        Value(ValueUnion { bits: TAG_NIL })
    }

    #[inline]
    pub fn tag(self) -> u64 {
        unsafe { self.0.bits & TAG_MASK }
    }

    #[inline]
    pub fn bits(self) -> u64 {
        unsafe { self.0.bits }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        unsafe { self.0.bits == TAG_EMPTY }
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        unsafe { self.0.bits == TAG_NIL }
    }

    #[inline]
    pub fn is_int(self) -> bool {
        unsafe { self.0.bits & TAG_MASK == TAG_INT }
    }

    #[inline]
    pub fn is_float(self) -> bool {
        unsafe { self.0.bits < MAX_DOUBLE }
    }

    #[inline]
    pub fn is_string(self) -> bool {
        unsafe { self.0.bits & TAG_MASK == TAG_STRING }
    }

    #[inline]
    pub fn is_object(self) -> bool {
        unsafe { self.0.bits & TAG_MASK == TAG_OBJECT }
    }

    #[inline]
    pub fn into_int(self) -> i32 {
        unsafe {
            debug_assert!(self.is_int());
            self.0.int
        }
    }

    #[inline]
    pub fn into_float(self) -> f64 {
        unsafe {
            debug_assert!(self.is_float());
            self.0.float
        }
    }

    /// # Safety
    ///
    /// Undefined behaviour if the value is not tagged as a string.
    #[inline]
    pub unsafe fn into_string(self) -> Gc<String> {
        debug_assert!(self.is_string());
        Gc::from_raw((self.0.bits & PTR_MASK) as *mut ())
    }

    /// # Safety
    ///
    /// Undefined behaviour if the value is not tagged as an object.
    #[inline]
    pub unsafe fn into_object(self) -> Gc<Object> {
        debug_assert!(self.is_object());
        Gc::from_raw((self.0.bits & PTR_MASK) as *mut ())
    }

    /// Box a 64-bit integer, inline when it fits the tagged range.
    ///
    /// # Safety
    ///
    /// May allocate; the result must be rooted before the next collection.
    pub unsafe fn from_int64(value: i64, arena: &GcArena) -> Value {
        match i32::try_from(value) {
            Ok(v) => Value::from(v),
            Err(_) => Value::from(arena.allocate(Object::new_int64(value))),
        }
    }

    /// The value's string form, if it has one.
    ///
    /// # Safety
    ///
    /// May allocate; the result must be rooted before the next collection.
    pub unsafe fn string_value(self, arena: &GcArena) -> Option<Gc<String>> {
        if self.is_string() {
            Some(self.into_string())
        } else if self.is_int() {
            Some(arena.allocate(self.into_int().to_string()))
        } else if self.is_float() {
            Some(arena.allocate(number::format_float(self.into_float())))
        } else if self.is_nil() {
            Some(arena.allocate("The NIL object".to_string()))
        } else if self.is_object() {
            self.into_object()
                .string_value()
                .map(|s| arena.allocate(s))
        } else {
            None
        }
    }

    /// The value as a whole number of at most `digits` significant digits.
    pub fn whole_number(self, digits: u32) -> Option<i64> {
        if self.is_int() {
            let v = i64::from(self.into_int());
            number::within_digits(v, digits).then_some(v)
        } else if self.is_float() {
            let f = self.into_float();
            if f.fract() != 0.0 {
                return None;
            }
            let v = f as i64;
            number::within_digits(v, digits).then_some(v)
        } else if self.is_string() {
            unsafe { number::parse_whole_number(&self.into_string(), digits) }
        } else if self.is_object() {
            unsafe { self.into_object().whole_number(digits) }
        } else {
            None
        }
    }

    /// The value as a 64-bit integer, unbounded by the argument digit
    /// ceiling.
    pub fn int64(self) -> Option<i64> {
        if self.is_int() {
            Some(i64::from(self.into_int()))
        } else if self.is_float() {
            let f = self.into_float();
            let in_range = f >= -(2f64.powi(63)) && f < 2f64.powi(63);
            (f.fract() == 0.0 && in_range).then(|| f as i64)
        } else if self.is_string() {
            unsafe { number::parse_int64(&self.into_string()) }
        } else if self.is_object() {
            unsafe { self.into_object().int64() }
        } else {
            None
        }
    }

    /// Human-readable form used in condition messages. Never fails, unlike
    /// [`Value::string_value`].
    pub fn display_string(self) -> String {
        unsafe {
            if self.is_int() {
                self.into_int().to_string()
            } else if self.is_float() {
                number::format_float(self.into_float())
            } else if self.is_string() {
                (*self.into_string()).clone()
            } else if self.is_nil() {
                "The NIL object".to_string()
            } else if self.is_object() {
                match self.into_object().string_value() {
                    Some(s) => s,
                    None => "an Object".to_string(),
                }
            } else {
                "(no value)".to_string()
            }
        }
    }
}

impl From<bool> for Value {
    /// Rexx booleans are the numbers 0 and 1.
    #[inline]
    fn from(b: bool) -> Value {
        Value::from(b as i32)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(v: i32) -> Value {
        Value(ValueUnion {
            bits: TAG_INT | (v as u32) as u64,
        })
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(v: f64) -> Value {
        if v.is_nan() {
            Value(ValueUnion {
                bits: CANONICAL_NAN,
            })
        } else {
            Value(ValueUnion { float: v })
        }
    }
}

impl From<Gc<String>> for Value {
    #[inline]
    fn from(v: Gc<String>) -> Value {
        let ptr = Gc::into_raw(v);
        Value(ValueUnion {
            bits: TAG_STRING | (ptr as usize as u64 & PTR_MASK),
        })
    }
}

impl From<Gc<Object>> for Value {
    #[inline]
    fn from(v: Gc<Object>) -> Value {
        let ptr = Gc::into_raw(v);
        Value(ValueUnion {
            bits: TAG_OBJECT | (ptr as usize as u64 & PTR_MASK),
        })
    }
}

unsafe impl Trace for Value {
    fn needs_trace() -> bool
    where
        Self: Sized,
    {
        true
    }

    fn trace(&self, ctx: Ctx) {
        if self.is_string() {
            unsafe { ctx.mark(self.into_string()) }
        } else if self.is_object() {
            unsafe { ctx.mark(self.into_object()) }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        unsafe {
            match self.0.bits & TAG_MASK {
                TAG_STRING => f
                    .debug_tuple("Value::String")
                    .field(&*self.into_string())
                    .finish(),
                TAG_OBJECT => f
                    .debug_tuple("Value::Object")
                    .field(&*self.into_object())
                    .finish(),
                TAG_INT => f.debug_tuple("Value::Int").field(&self.into_int()).finish(),
                TAG_EMPTY => f.debug_tuple("Value::Empty").finish(),
                TAG_NIL => f.debug_tuple("Value::Nil").finish(),
                _ => f
                    .debug_tuple("Value::Float")
                    .field(&self.into_float())
                    .finish(),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn inline_tags() {
        assert!(Value::empty().is_empty());
        assert!(!Value::nil().is_empty());
        assert!(Value::nil().is_nil());

        let v = Value::from(-7);
        assert!(v.is_int());
        assert_eq!(v.into_int(), -7);

        let v = Value::from(2.5);
        assert!(v.is_float());
        assert_eq!(v.into_float(), 2.5);

        let v = Value::from(f64::NAN);
        assert!(v.is_float());
        assert!(v.into_float().is_nan());
    }

    #[test]
    fn heap_tags() {
        let arena = GcArena::new();
        unsafe {
            let s = arena.allocate("hello".to_string());
            let v = Value::from(s);
            assert!(v.is_string());
            assert!(!v.is_float());
            assert!(Gc::ptr_eq(v.into_string(), s));

            let o = arena.allocate(Object::new());
            let v = Value::from(o);
            assert!(v.is_object());
        }
    }

    #[test]
    fn whole_number_conversions() {
        let arena = GcArena::new();
        assert_eq!(Value::from(42).whole_number(9), Some(42));
        assert_eq!(Value::from(3.0).whole_number(9), Some(3));
        assert_eq!(Value::from(3.5).whole_number(9), None);
        assert_eq!(Value::nil().whole_number(9), None);
        assert_eq!(Value::empty().whole_number(9), None);
        unsafe {
            let s = Value::from(arena.allocate(" 19 ".to_string()));
            assert_eq!(s.whole_number(9), Some(19));
            let s = Value::from(arena.allocate("abc".to_string()));
            assert_eq!(s.whole_number(9), None);
        }
    }

    #[test]
    fn int64_conversions() {
        let arena = GcArena::new();
        unsafe {
            let wide = Value::from_int64(5_000_000_000, &arena);
            assert!(wide.is_object());
            assert_eq!(wide.int64(), Some(5_000_000_000));
            assert_eq!(wide.whole_number(9), None);
            assert_eq!(wide.display_string(), "5000000000");

            let narrow = Value::from_int64(12, &arena);
            assert!(narrow.is_int());
            assert_eq!(narrow.int64(), Some(12));
        }
    }

    #[test]
    fn display_strings() {
        assert_eq!(Value::from(42).display_string(), "42");
        assert_eq!(Value::nil().display_string(), "The NIL object");
        let arena = GcArena::new();
        unsafe {
            let o = Value::from(arena.allocate(Object::new()));
            assert_eq!(o.display_string(), "an Object");
        }
    }
}
