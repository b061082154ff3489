//! Argument marshalling the way a native routine would drive it: arity
//! check first, then per-position coercion, with conditions surfacing the
//! routine name and the argument position the caller wrote.

use common::atom::{Atom, Atoms};
use trex_runtime::{
    condition::Result, Activity, Condition, ExpressionStack, Value,
};

/// A native SUBSTR(string, start [, length]) built over the coercion
/// helpers, shaped like any builtin in the library would be.
unsafe fn substr(
    stack: &mut ExpressionStack,
    argcount: usize,
    name: Atom,
    activity: &Activity,
) -> Result<String> {
    stack.validate_arity(argcount, 2, 3, name)?;

    let needle = stack.required_string_arg(argcount - 1, activity.arena())?;
    let start = stack
        .required_integer_arg(argcount - 2, argcount, name)?
        .into_int() as usize;
    let length = if argcount > 2 {
        stack
            .optional_integer_arg(argcount - 3, argcount, name)?
            .map(|v| v.into_int() as usize)
    } else {
        None
    };

    let chars: Vec<char> = needle.chars().collect();
    let from = start.saturating_sub(1).min(chars.len());
    let until = match length {
        Some(l) => (from + l).min(chars.len()),
        None => chars.len(),
    };
    Ok(chars[from..until].iter().collect())
}

fn harness() -> (Activity, ExpressionStack, Atoms) {
    let mut activity = Activity::new();
    let mut stack = ExpressionStack::new();
    activity.allocate_stack_frame(&mut stack, Activity::DEFAULT_FRAME_ENTRIES);
    (activity, stack, Atoms::new())
}

#[test]
fn marshals_a_full_argument_list() {
    let (activity, mut stack, mut atoms) = harness();
    let name = atoms.intern("SUBSTR");
    unsafe {
        stack.push(Value::from(activity.arena().allocate("hello world".to_string())));
        stack.push(Value::from(activity.arena().allocate("7".to_string())));
        stack.push(Value::from(3));

        let out = substr(&mut stack, 3, name, &activity).unwrap();
        assert_eq!(out, "wor");

        // Coercion cached the converted start position in its slot.
        assert!(stack.peek(1).is_int());
        stack.pop_n(3);
        assert_eq!(stack.depth(), 0);
    }
}

#[test]
fn omitted_trailing_argument_is_fine() {
    let (activity, mut stack, mut atoms) = harness();
    let name = atoms.intern("SUBSTR");
    unsafe {
        stack.push(Value::from(activity.arena().allocate("hello".to_string())));
        stack.push(Value::from(2));
        stack.push(Value::empty());

        let out = substr(&mut stack, 3, name, &activity).unwrap();
        assert_eq!(out, "ello");
    }
}

#[test]
fn conditions_surface_to_readable_messages() {
    let (activity, mut stack, mut atoms) = harness();
    let name = atoms.intern("SUBSTR");
    unsafe {
        // Too few arguments.
        stack.push(Value::from(activity.arena().allocate("hello".to_string())));
        let err = substr(&mut stack, 1, name, &activity).unwrap_err();
        assert!(activity.traps(&err));
        assert_eq!(
            err.message(&atoms),
            "Too few arguments in invocation of SUBSTR; minimum expected is 2"
        );
        stack.clear();

        // A start position that is no whole number, reported as the second
        // argument even though it sits one below the stack top.
        stack.push(Value::from(activity.arena().allocate("hello".to_string())));
        stack.push(Value::from(activity.arena().allocate("soon".to_string())));
        stack.push(Value::empty());
        let err = substr(&mut stack, 3, name, &activity).unwrap_err();
        assert_eq!(
            err,
            Condition::NotWholeNumber {
                routine: name,
                position: 2,
                value: "soon".to_string(),
            }
        );
        stack.clear();

        // A required argument that was never supplied.
        stack.push(Value::from(activity.arena().allocate("hello".to_string())));
        stack.push(Value::empty());
        let err = substr(&mut stack, 2, name, &activity).unwrap_err();
        assert_eq!(
            err.message(&atoms),
            "Missing argument in invocation of SUBSTR; argument 2 is required"
        );
    }
}

#[test]
fn collection_during_a_call_keeps_arguments_alive() {
    let (activity, mut stack, mut atoms) = harness();
    let name = atoms.intern("SUBSTR");
    unsafe {
        stack.push(Value::from(activity.arena().allocate("argument".to_string())));
        stack.push(Value::from(1));

        // Burn through enough temporaries to make a collection worthwhile,
        // the way a busy routine body would.
        for i in 0..1000 {
            activity.arena().allocate(format!("temporary {}", i));
        }
        activity.arena().collect_if_due(&stack);

        let out = substr(&mut stack, 2, name, &activity).unwrap();
        assert_eq!(out, "argument");
    }
}
