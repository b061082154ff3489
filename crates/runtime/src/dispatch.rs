//! The seam between the stack and message dispatch.
//!
//! The stack only promises dispatch a contiguous argument vector; routing a
//! message to actual code is the evaluator's problem and arrives here as a
//! trait object.

use common::atom::Atom;

use crate::{condition::Result, stack::ExpressionStack, value::Value};

/// Receives a message send. `args` is the argument vector in left-to-right
/// call order, borrowed straight out of the stack frame.
pub trait MessageDispatcher {
    fn dispatch(&mut self, receiver: Value, message: Atom, args: &[Value]) -> Result<Value>;
}

impl ExpressionStack {
    /// Send `message` to the receiver sitting below the top `argcount`
    /// slots, then collapse receiver and arguments into the single result.
    ///
    /// # Safety
    ///
    /// The top of the stack must hold the receiver followed by `argcount`
    /// argument slots.
    pub unsafe fn send(
        &mut self,
        message: Atom,
        argcount: usize,
        dispatcher: &mut dyn MessageDispatcher,
    ) -> Result<Value> {
        let receiver = self.peek(argcount);
        let result = dispatcher.dispatch(receiver, message, self.arguments(argcount))?;
        self.pop_n(argcount);
        self.prefix_result(result);
        Ok(result)
    }
}
