//! Action filter behavior: only/except activation, cancellation, after-hook
//! arming, LIFO unwinding, and result threading.

use std::sync::{Arc, Mutex};
use trellis_core::Value;
use trellis_runtime::{
    BehaviorBuilder, ClassBuilder, Component, Event, ObjectDescriptor, Runtime, RuntimeError,
    ACTION_FILTER_CLASS, AFTER_ACTION, BEFORE_ACTION,
};

type Log = Arc<Mutex<Vec<String>>>;

/// A filter subclass that counts its hook invocations and answers its
/// `verdict` field from `before_action`, logging each call when a log is
/// shared with the class.
fn filter_runtime(log: &Log) -> Runtime {
    let runtime = Runtime::new();
    runtime
        .register_class(ClassBuilder::new("controller"))
        .unwrap();

    let before_log = log.clone();
    let after_log = log.clone();
    runtime
        .register_behavior(
            BehaviorBuilder::new("probe_filter")
                .parent(ACTION_FILTER_CLASS)
                .field("label", "probe")
                .field("before_calls", 0i64)
                .field("after_calls", 0i64)
                .field("verdict", true)
                .method("before_action", move |obj, args| {
                    let label = field_str(obj, "label");
                    let action = args.first().and_then(Value::as_str).unwrap_or_default();
                    before_log.lock().unwrap().push(format!("{label}:before:{action}"));
                    bump(obj, "before_calls");
                    Ok(obj.field_value("verdict").cloned().unwrap_or(Value::Null))
                })
                .method("after_action", move |obj, args| {
                    let label = field_str(obj, "label");
                    let action = args.first().and_then(Value::as_str).unwrap_or_default();
                    after_log.lock().unwrap().push(format!("{label}:after:{action}"));
                    bump(obj, "after_calls");
                    Ok(args.get(1).cloned().unwrap_or(Value::Null))
                }),
        )
        .unwrap();
    runtime
}

fn field_str(obj: &trellis_runtime::PropertyObject, name: &str) -> String {
    obj.field_value(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bump(obj: &mut trellis_runtime::PropertyObject, name: &str) {
    let current = obj.field_value(name).and_then(Value::as_int).unwrap_or(0);
    obj.set_field(name, Value::Int(current + 1));
}

fn counts(controller: &mut Component, name: &str) -> (i64, i64) {
    let cell = controller.get_behavior(name).unwrap().unwrap();
    let behavior = cell.borrow();
    let read = |field: &str| behavior.get(field).unwrap().as_int().unwrap();
    (read("before_calls"), read("after_calls"))
}

fn run_before(controller: &mut Component, action: &str) -> Event {
    let mut event = Event::for_action(BEFORE_ACTION, action);
    controller.trigger_with(BEFORE_ACTION, &mut event).unwrap();
    event
}

fn run_after(controller: &mut Component, action: &str) -> Event {
    let mut event = Event::for_action(AFTER_ACTION, action);
    controller.trigger_with(AFTER_ACTION, &mut event).unwrap();
    event
}

#[test]
fn test_after_hook_fires_once_per_armed_before() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = filter_runtime(&log);
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior(
            "filter",
            ObjectDescriptor::new("probe_filter").with("only", vec!["create"]),
        )
        .unwrap();

    let before = run_before(&mut controller, "create");
    assert!(before.is_valid);
    assert!(!before.handled);
    assert_eq!(counts(&mut controller, "filter"), (1, 0));

    run_after(&mut controller, "create");
    assert_eq!(counts(&mut controller, "filter"), (1, 1));

    // A second after-event for the same action finds nothing armed
    run_after(&mut controller, "create");
    assert_eq!(counts(&mut controller, "filter"), (1, 1));
}

#[test]
fn test_inactive_action_skips_both_hooks() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = filter_runtime(&log);
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior(
            "filter",
            ObjectDescriptor::new("probe_filter").with("only", vec!["create"]),
        )
        .unwrap();

    let before = run_before(&mut controller, "delete");
    assert!(before.is_valid);
    assert!(!before.handled);
    run_after(&mut controller, "delete");
    assert_eq!(counts(&mut controller, "filter"), (0, 0));
}

#[test]
fn test_except_overrides_only() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = filter_runtime(&log);
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior(
            "filter",
            ObjectDescriptor::new("probe_filter")
                .with("only", vec!["create"])
                .with("except", vec!["create"]),
        )
        .unwrap();

    run_before(&mut controller, "create");
    assert_eq!(counts(&mut controller, "filter"), (0, 0));
}

#[test]
fn test_failing_before_hook_cancels_and_never_arms() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = filter_runtime(&log);
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior(
            "filter",
            ObjectDescriptor::new("probe_filter").with("verdict", false),
        )
        .unwrap();

    let before = run_before(&mut controller, "create");
    assert!(!before.is_valid);
    assert!(before.handled);
    assert_eq!(counts(&mut controller, "filter"), (1, 0));

    // The action never ran, so the after-hook must not fire
    run_after(&mut controller, "create");
    assert_eq!(counts(&mut controller, "filter"), (1, 0));
}

#[test]
fn test_cancellation_suppresses_later_filters() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = filter_runtime(&log);
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior(
            "vetoer",
            ObjectDescriptor::new("probe_filter")
                .with("label", "vetoer")
                .with("verdict", false),
        )
        .unwrap();
    controller
        .attach_behavior(
            "bystander",
            ObjectDescriptor::new("probe_filter").with("label", "bystander"),
        )
        .unwrap();

    let before = run_before(&mut controller, "create");
    assert!(!before.is_valid);
    assert_eq!(*log.lock().unwrap(), ["vetoer:before:create"]);
    assert_eq!(counts(&mut controller, "bystander"), (0, 0));
}

#[test]
fn test_filters_unwind_in_reverse_order() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = filter_runtime(&log);
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior(
            "first",
            ObjectDescriptor::new("probe_filter").with("label", "first"),
        )
        .unwrap();
    controller
        .attach_behavior(
            "second",
            ObjectDescriptor::new("probe_filter").with("label", "second"),
        )
        .unwrap();

    run_before(&mut controller, "create");
    run_after(&mut controller, "create");

    // Before-hooks run in attach order; after-hooks unwind in reverse
    assert_eq!(
        *log.lock().unwrap(),
        [
            "first:before:create",
            "second:before:create",
            "second:after:create",
            "first:after:create",
        ]
    );
}

#[test]
fn test_nested_actions_pair_lifo() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = filter_runtime(&log);
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior("filter", ObjectDescriptor::new("probe_filter"))
        .unwrap();

    run_before(&mut controller, "outer");
    run_before(&mut controller, "inner");

    // "inner" is on top: an out-of-order after-event for "outer" must wait
    run_after(&mut controller, "outer");
    assert_eq!(counts(&mut controller, "filter"), (2, 0));

    run_after(&mut controller, "inner");
    assert_eq!(counts(&mut controller, "filter"), (2, 1));
    run_after(&mut controller, "outer");
    assert_eq!(counts(&mut controller, "filter"), (2, 2));
}

#[test]
fn test_after_hook_threads_the_result() {
    let runtime = Runtime::new();
    runtime
        .register_class(ClassBuilder::new("controller"))
        .unwrap();
    runtime
        .register_behavior(
            BehaviorBuilder::new("stamping_filter")
                .parent(ACTION_FILTER_CLASS)
                .method("after_action", |_, args| {
                    let result = args.get(1).and_then(Value::as_str).unwrap_or_default();
                    Ok(Value::Str(format!("{result}!")))
                }),
        )
        .unwrap();
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior("stamp", ObjectDescriptor::new("stamping_filter"))
        .unwrap();

    run_before(&mut controller, "create");
    let mut event = Event::for_action(AFTER_ACTION, "create");
    event.result = Value::Str("ok".to_string());
    controller.trigger_with(AFTER_ACTION, &mut event).unwrap();
    assert_eq!(event.result, Value::Str("ok!".to_string()));
}

#[test]
fn test_arming_state_not_reachable_through_owner() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = filter_runtime(&log);
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior("filter", ObjectDescriptor::new("probe_filter"))
        .unwrap();

    // The arming stack is filter-private: not visible by delegation, and
    // a write attempt cannot corrupt the pairing
    assert!(!controller.can_get("pending", true, true).unwrap());
    assert!(!controller.can_set("pending", true, true).unwrap());
    let err = controller
        .set("pending", Value::Str("junk".to_string()))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownProperty { .. }));

    run_before(&mut controller, "create");
    run_after(&mut controller, "create");
    assert_eq!(counts(&mut controller, "filter"), (1, 1));
}

#[test]
fn test_default_filter_allows_everything() {
    let runtime = Runtime::new();
    runtime
        .register_class(ClassBuilder::new("controller"))
        .unwrap();
    let mut controller = runtime.create(&"controller".into()).unwrap();
    controller
        .attach_behavior("filter", ObjectDescriptor::new(ACTION_FILTER_CLASS))
        .unwrap();

    let before = run_before(&mut controller, "anything");
    assert!(before.is_valid);

    let mut event = Event::for_action(AFTER_ACTION, "anything");
    event.result = Value::Int(3);
    controller.trigger_with(AFTER_ACTION, &mut event).unwrap();
    // The default after-hook passes the result through unchanged
    assert_eq!(event.result, Value::Int(3));
}
