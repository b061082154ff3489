use std::mem;

use super::*;
use crate::{activity::Activity, object::Object, stack::ExpressionStack, value::Value};

fn rooted_stack(entries: usize) -> (Activity, ExpressionStack) {
    let mut activity = Activity::new();
    let mut stack = ExpressionStack::new();
    activity.allocate_stack_frame(&mut stack, entries);
    (activity, stack)
}

#[test]
fn collect_frees_unreachable_values() {
    let (activity, mut stack) = rooted_stack(8);
    let arena = activity.arena();
    unsafe {
        let kept = arena.allocate("kept".to_string());
        stack.push(Value::from(kept));
        // Allocated but never stored anywhere reachable.
        arena.allocate("dropped".to_string());

        let before = arena.total_allocated();
        arena.collect(&stack);
        let after = arena.total_allocated();
        assert_eq!(before - after, mem::size_of::<GcBox<String>>());
        assert_eq!(&*stack.peek(0).into_string(), "kept");
    }
}

#[test]
fn collect_retains_everything_on_the_stack() {
    let (activity, mut stack) = rooted_stack(16);
    let arena = activity.arena();
    unsafe {
        for i in 0..10 {
            stack.push(Value::from(arena.allocate(format!("value {}", i))));
        }
        arena.collect(&stack);
        arena.collect(&stack);
        for offset in 0..10 {
            let s = stack.peek(offset).into_string();
            assert_eq!(&*s, &format!("value {}", 9 - offset));
        }
    }
}

#[test]
fn popped_slots_are_not_roots() {
    let (activity, mut stack) = rooted_stack(8);
    let arena = activity.arena();
    unsafe {
        stack.push(Value::from(arena.allocate("live".to_string())));
        stack.push(Value::from(arena.allocate("stale".to_string())));
        stack.pop();

        let before = arena.total_allocated();
        arena.collect(&stack);
        // The popped slot still holds the pointer bits but marking must not
        // treat it as reachable.
        assert_eq!(
            before - arena.total_allocated(),
            mem::size_of::<GcBox<String>>()
        );
    }
}

#[test]
fn marking_traces_through_objects() {
    let (activity, mut stack) = rooted_stack(8);
    let arena = activity.arena();
    unsafe {
        stack.push(Value::from(arena.allocate(Object::new_int64(1 << 40))));
        arena.collect(&stack);
        assert_eq!(stack.peek(0).int64(), Some(1 << 40));
    }
}

#[test]
fn collect_if_due_waits_for_the_pacing_threshold() {
    let arena = GcArena::new();
    unsafe {
        arena.allocate("tiny".to_string());
        let before = arena.total_allocated();
        assert!(before < GcArena::MIN_SLEEP);
        // Below the threshold nothing happens, even with an empty root.
        arena.collect_if_due(&());
        assert_eq!(arena.total_allocated(), before);

        while arena.total_allocated() <= GcArena::MIN_SLEEP {
            arena.allocate("filler".to_string());
        }
        arena.collect_if_due(&());
        assert_eq!(arena.total_allocated(), 0);
    }
}

#[test]
fn general_tracer_sees_each_live_slot_once() {
    struct Collector {
        seen: Vec<Value>,
    }

    impl GeneralTracer for Collector {
        fn visit_value(&mut self, value: Value) {
            self.seen.push(value);
        }
    }

    let (activity, mut stack) = rooted_stack(8);
    let arena = activity.arena();
    unsafe {
        let s = arena.allocate("walked".to_string());
        stack.push(Value::from(1));
        stack.push(Value::empty());
        stack.push(Value::from(s));
        stack.push(Value::from(2));
        // Values beyond the top must stay invisible.
        stack.push(Value::from(99));
        stack.pop();

        let mut tracer = Collector { seen: Vec::new() };
        stack.trace_general(&mut tracer);

        let ints: Vec<i32> = tracer
            .seen
            .iter()
            .filter(|v| v.is_int())
            .map(|v| v.into_int())
            .collect();
        assert_eq!(ints, vec![1, 2]);
        assert_eq!(tracer.seen.len(), 3);
        assert!(tracer.seen.iter().any(|v| v.is_string()));
    }
}

#[test]
fn empty_stack_marks_nothing() {
    struct Failing;
    impl GeneralTracer for Failing {
        fn visit_value(&mut self, value: Value) {
            panic!("visited {:?} on an empty stack", value);
        }
    }

    let (activity, stack) = rooted_stack(4);
    stack.trace_general(&mut Failing);
    unsafe { activity.arena().collect(&stack) };
}
