use super::Ctx;
use crate::value::Value;

/// A trait marking a type as traceable by the collector.
///
/// # Safety
///
/// `trace` must mark every [`Gc`](super::Gc) pointer reachable from the
/// receiver. Failing to mark a live pointer lets the sweep phase free memory
/// which is still in use.
pub unsafe trait Trace {
    fn needs_trace() -> bool
    where
        Self: Sized;

    fn trace(&self, ctx: Ctx);
}

/// Visitor for whole-graph walks outside a collection cycle, such as
/// flattening an object graph into an envelope for transfer.
///
/// Types which participate share their traversal with their [`Trace`] impl;
/// only the callback differs.
pub trait GeneralTracer {
    fn visit_value(&mut self, value: Value);
}

macro_rules! impl_trace_primitive{
    ($($ty:ident,)*) => {
        $(
            unsafe impl Trace for $ty{
                fn needs_trace() -> bool{
                    false
                }

                fn trace(&self, _ctx: Ctx){}
            }
        )*
    };
}

impl_trace_primitive!(bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, String,);

unsafe impl Trace for () {
    fn needs_trace() -> bool
    where
        Self: Sized,
    {
        false
    }

    fn trace(&self, _ctx: Ctx) {}
}

unsafe impl<T: Trace> Trace for Box<T> {
    fn needs_trace() -> bool
    where
        Self: Sized,
    {
        T::needs_trace()
    }

    fn trace(&self, ctx: Ctx) {
        (**self).trace(ctx)
    }
}

unsafe impl<T: Trace> Trace for Option<T> {
    fn needs_trace() -> bool
    where
        Self: Sized,
    {
        T::needs_trace()
    }

    fn trace(&self, ctx: Ctx) {
        if let Some(x) = self.as_ref() {
            x.trace(ctx)
        }
    }
}

unsafe impl<T: Trace> Trace for Vec<T> {
    fn needs_trace() -> bool
    where
        Self: Sized,
    {
        T::needs_trace()
    }

    fn trace(&self, ctx: Ctx) {
        for x in self.iter() {
            x.trace(ctx)
        }
    }
}
