//! The built-in action filter behavior.
//!
//! An action filter hooks the `before_action`/`after_action` event pair
//! around action execution. Its `before_action` hook runs when the filter's
//! `only`/`except` lists allow the event's action; only a passing hook arms
//! the matching after-hook, so the after-hook never fires without a
//! corresponding successful before-hook, and nested action invocations pair
//! correctly. A failing hook cancels the action by clearing `is_valid` and
//! setting `handled`.
//!
//! Subclass the `action_filter` class (via
//! [`BehaviorBuilder::parent`](crate::BehaviorBuilder::parent)) and override
//! the `before_action`/`after_action` methods to supply the hook bodies; the
//! defaults allow everything and pass results through unchanged.

use crate::behavior::Behavior;
use crate::builder::BehaviorBuilder;
use crate::class::ClassKind;
use crate::error::RuntimeResult;
use crate::event::Event;
use crate::object::PropertyObject;
use crate::registry::ClassRegistry;
use trellis_core::Value;

/// Event triggered before an action runs
pub const BEFORE_ACTION: &str = "before_action";

/// Event triggered after an action has run
pub const AFTER_ACTION: &str = "after_action";

/// Name of the built-in action filter behavior class
pub const ACTION_FILTER_CLASS: &str = "action_filter";

const PENDING_FIELD: &str = "pending";

/// Register the built-in `action_filter` class. Called once per runtime,
/// on a registry that cannot yet contain the name.
pub(crate) fn register_builtin(registry: &mut ClassRegistry) {
    let builder = BehaviorBuilder::new(ACTION_FILTER_CLASS)
        .field("only", Value::List(Vec::new()))
        .field("except", Value::List(Vec::new()))
        // Internal: the arming stack must not leak onto owners by delegation
        .internal_field(PENDING_FIELD, Value::List(Vec::new()))
        .handler("before_filter", before_filter)
        .handler("after_filter", after_filter)
        .handles(BEFORE_ACTION, "before_filter")
        // Prepended, so filters unwind in reverse order of their before-hooks
        .handles_first(AFTER_ACTION, "after_filter")
        .method("before_action", |_, _| Ok(Value::Bool(true)))
        .method("after_action", |_, args| {
            Ok(args.get(1).cloned().unwrap_or(Value::Null))
        });
    registry.insert_builtin(builder.into_parts(), ClassKind::Behavior);
}

/// Whether the filter applies to `action`: an explicit `except` entry wins,
/// and an empty `only` list allows everything.
fn is_active(object: &PropertyObject, action: &str) -> bool {
    let only = string_list(object, "only");
    let except = string_list(object, "except");
    !except.iter().any(|name| name == action)
        && (only.is_empty() || only.iter().any(|name| name == action))
}

fn string_list(object: &PropertyObject, field: &str) -> Vec<String> {
    object
        .field_value(field)
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn pending_stack(object: &PropertyObject) -> Vec<Value> {
    object
        .field_value(PENDING_FIELD)
        .and_then(Value::as_list)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

/// Handler for `before_action`: consult `is_active`, run the virtual
/// before-hook, and either arm the after-hook or cancel the event.
fn before_filter(behavior: &mut Behavior, event: &mut Event) -> RuntimeResult<()> {
    let Some(action) = event.action.clone() else {
        return Ok(());
    };
    if !is_active(behavior.object(), &action) {
        return Ok(());
    }
    let verdict = behavior.call("before_action", &[Value::Str(action.clone())])?;
    if verdict.is_truthy() {
        let mut pending = pending_stack(behavior.object());
        pending.push(Value::Str(action));
        behavior.object_mut().set_field(PENDING_FIELD, Value::List(pending));
    } else {
        event.is_valid = false;
        event.handled = true;
    }
    Ok(())
}

/// Handler for `after_action`: fire the virtual after-hook exactly once per
/// armed invocation, threading the event result through it.
fn after_filter(behavior: &mut Behavior, event: &mut Event) -> RuntimeResult<()> {
    let Some(action) = event.action.clone() else {
        return Ok(());
    };
    let mut pending = pending_stack(behavior.object());
    if pending.last().and_then(Value::as_str) != Some(action.as_str()) {
        return Ok(());
    }
    pending.pop();
    behavior.object_mut().set_field(PENDING_FIELD, Value::List(pending));
    let result = behavior.call("after_action", &[Value::Str(action), event.result.clone()])?;
    event.result = result;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::IntoValue;

    fn filter_object(only: &[&str], except: &[&str]) -> PropertyObject {
        let mut registry = ClassRegistry::new();
        register_builtin(&mut registry);
        let class = registry.by_name(ACTION_FILTER_CLASS).unwrap();
        let mut object = PropertyObject::new(class);
        let to_list = |names: &[&str]| {
            Value::List(names.iter().map(|n| (*n).into_value()).collect())
        };
        object.set_field("only", to_list(only));
        object.set_field("except", to_list(except));
        object
    }

    #[test]
    fn test_empty_only_allows_all() {
        let object = filter_object(&[], &[]);
        assert!(is_active(&object, "create"));
        assert!(is_active(&object, "delete"));
    }

    #[test]
    fn test_only_list_restricts() {
        let object = filter_object(&["create"], &[]);
        assert!(is_active(&object, "create"));
        assert!(!is_active(&object, "delete"));
    }

    #[test]
    fn test_except_overrides_only() {
        let object = filter_object(&["create"], &["create"]);
        assert!(!is_active(&object, "create"));
    }
}
