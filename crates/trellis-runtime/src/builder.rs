//! Fluent class registration builders.
//!
//! Accessor, method, and handler maps are registered explicitly here at
//! class-definition time; nothing in the runtime reflects over types.

use crate::behavior::Behavior;
use crate::class::{
    BehaviorDecl, ClassDef, ClassId, ClassKind, EventDecl, FieldDef, GetterFn, HandlerMethodFn,
    InitFn, MethodFn, SetterFn,
};
use crate::descriptor::ObjectDescriptor;
use crate::error::RuntimeResult;
use crate::event::Event;
use crate::object::PropertyObject;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use trellis_core::{IntoValue, Value};

/// The accumulated pieces of a class under construction, shared by both
/// builders. Flattening against the parent happens in `build`.
pub(crate) struct ClassParts {
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    fields: Vec<(String, Value, bool)>,
    getters: Vec<(String, GetterFn)>,
    setters: Vec<(String, SetterFn)>,
    methods: Vec<(String, MethodFn)>,
    handlers: Vec<(String, HandlerMethodFn)>,
    init: Option<InitFn>,
    behaviors: Vec<BehaviorDecl>,
    subscriptions: Vec<EventDecl>,
}

impl ClassParts {
    fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            fields: Vec::new(),
            getters: Vec::new(),
            setters: Vec::new(),
            methods: Vec::new(),
            handlers: Vec::new(),
            init: None,
            behaviors: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Produce the flattened definition. The registry has already resolved
    /// and validated `parent` (existence, kind, and name uniqueness).
    pub(crate) fn build(self, id: ClassId, kind: ClassKind, parent: Option<&ClassDef>) -> ClassDef {
        let mut fields: Vec<FieldDef> = Vec::new();
        let mut field_index = FxHashMap::default();
        let mut getters = FxHashMap::default();
        let mut setters = FxHashMap::default();
        let mut methods = FxHashMap::default();
        let mut handlers = FxHashMap::default();
        let mut init = None;
        let mut behaviors = Vec::new();
        let mut subscriptions = Vec::new();
        let mut ancestry = vec![id];

        if let Some(parent) = parent {
            fields = parent.fields.clone();
            field_index = parent.field_index.clone();
            getters = parent.getters.clone();
            setters = parent.setters.clone();
            methods = parent.methods.clone();
            handlers = parent.handlers.clone();
            init = parent.init.clone();
            behaviors = parent.behaviors.clone();
            subscriptions = parent.subscriptions.clone();
            ancestry.extend(parent.ancestry.iter().copied());
        }

        for (name, default, internal) in self.fields {
            match field_index.get(&name) {
                Some(&slot) => {
                    fields[slot].default = default;
                    fields[slot].internal = internal;
                }
                None => {
                    field_index.insert(name.clone(), fields.len());
                    fields.push(FieldDef {
                        name,
                        default,
                        internal,
                    });
                }
            }
        }
        for (name, f) in self.getters {
            getters.insert(name.to_ascii_lowercase(), f);
        }
        for (name, f) in self.setters {
            setters.insert(name.to_ascii_lowercase(), f);
        }
        for (name, f) in self.methods {
            methods.insert(name.to_ascii_lowercase(), f);
        }
        for (name, f) in self.handlers {
            handlers.insert(name.to_ascii_lowercase(), f);
        }
        if self.init.is_some() {
            init = self.init;
        }
        for decl in self.behaviors {
            let replaces = decl.name.as_ref().and_then(|name| {
                behaviors
                    .iter()
                    .position(|existing| existing.name.as_ref() == Some(name))
            });
            match replaces {
                Some(slot) => behaviors[slot] = decl,
                None => behaviors.push(decl),
            }
        }
        for decl in self.subscriptions {
            match subscriptions.iter().position(|e: &EventDecl| e.event == decl.event) {
                Some(slot) => subscriptions[slot] = decl,
                None => subscriptions.push(decl),
            }
        }

        ClassDef {
            id,
            name: self.name,
            kind,
            parent: parent.map(|p| p.id),
            ancestry,
            fields,
            field_index,
            getters,
            setters,
            methods,
            handlers,
            init,
            behaviors,
            subscriptions,
        }
    }
}

/// Fluent builder for a component class.
///
/// ```
/// use trellis_core::Value;
/// use trellis_runtime::{ClassBuilder, Runtime};
///
/// let runtime = Runtime::new();
/// runtime
///     .register_class(
///         ClassBuilder::new("widget")
///             .field("width", 0i64)
///             .getter("area", |obj| {
///                 let w = obj.field_value("width").and_then(Value::as_int).unwrap_or(0);
///                 Ok(Value::Int(w * w))
///             }),
///     )
///     .unwrap();
/// ```
pub struct ClassBuilder {
    parts: ClassParts,
}

impl ClassBuilder {
    /// Start a component class named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            parts: ClassParts::new(name.into()),
        }
    }

    /// Inherit from `name`: the child starts from the parent's tables and
    /// overrides entries by name.
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parts.parent = Some(name.into());
        self
    }

    /// Declare a field with a default value. Field names are case-sensitive.
    pub fn field(mut self, name: impl Into<String>, default: impl IntoValue) -> Self {
        self.parts
            .fields
            .push((name.into(), default.into_value(), false));
        self
    }

    /// Register a getter accessor. A getter without a matching setter makes
    /// the property read-only.
    pub fn getter(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&PropertyObject) -> RuntimeResult<Value> + 'static,
    ) -> Self {
        self.parts.getters.push((name.into(), Arc::new(f)));
        self
    }

    /// Register a setter accessor. A setter without a matching getter makes
    /// the property write-only.
    pub fn setter(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut PropertyObject, Value) -> RuntimeResult<()> + 'static,
    ) -> Self {
        self.parts.setters.push((name.into(), Arc::new(f)));
        self
    }

    /// Register both accessor directions of a property at once.
    pub fn property(
        self,
        name: impl Into<String>,
        get: impl Fn(&PropertyObject) -> RuntimeResult<Value> + 'static,
        set: impl Fn(&mut PropertyObject, Value) -> RuntimeResult<()> + 'static,
    ) -> Self {
        let name = name.into();
        self.getter(name.clone(), get).setter(name, set)
    }

    /// Register an instance method. Method names match case-insensitively.
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut PropertyObject, &[Value]) -> RuntimeResult<Value> + 'static,
    ) -> Self {
        self.parts.methods.push((name.into(), Arc::new(f)));
        self
    }

    /// Register the `init` hook, run after configuration is applied.
    pub fn init(
        mut self,
        f: impl Fn(&mut PropertyObject) -> RuntimeResult<()> + 'static,
    ) -> Self {
        self.parts.init = Some(Arc::new(f));
        self
    }

    /// Declare a named behavior, materialized lazily on first touch.
    pub fn behavior(mut self, name: impl Into<String>, spec: impl Into<ObjectDescriptor>) -> Self {
        self.parts.behaviors.push(BehaviorDecl {
            name: Some(name.into()),
            descriptor: spec.into(),
        });
        self
    }

    /// Declare an anonymous behavior: attached in declaration order, never
    /// addressable by name.
    pub fn behavior_anonymous(mut self, spec: impl Into<ObjectDescriptor>) -> Self {
        self.parts.behaviors.push(BehaviorDecl {
            name: None,
            descriptor: spec.into(),
        });
        self
    }

    pub(crate) fn into_parts(self) -> ClassParts {
        self.parts
    }
}

/// Fluent builder for a behavior class.
///
/// Besides the property surface shared with [`ClassBuilder`], a behavior
/// class declares handler methods and the event-subscription map wiring them
/// to its future owner's bus.
pub struct BehaviorBuilder {
    parts: ClassParts,
}

impl BehaviorBuilder {
    /// Start a behavior class named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            parts: ClassParts::new(name.into()),
        }
    }

    /// Inherit from `name`; the parent must be a behavior class.
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parts.parent = Some(name.into());
        self
    }

    /// Declare a field with a default value.
    pub fn field(mut self, name: impl Into<String>, default: impl IntoValue) -> Self {
        self.parts
            .fields
            .push((name.into(), default.into_value(), false));
        self
    }

    /// Declare an internal field: behavior-private state that never appears
    /// on the named property surface, so an owner cannot reach it through
    /// delegation. Handler and method bodies access it with
    /// [`field_value`](PropertyObject::field_value)/
    /// [`set_field`](PropertyObject::set_field).
    pub fn internal_field(mut self, name: impl Into<String>, default: impl IntoValue) -> Self {
        self.parts
            .fields
            .push((name.into(), default.into_value(), true));
        self
    }

    /// Register a getter accessor.
    pub fn getter(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&PropertyObject) -> RuntimeResult<Value> + 'static,
    ) -> Self {
        self.parts.getters.push((name.into(), Arc::new(f)));
        self
    }

    /// Register a setter accessor.
    pub fn setter(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut PropertyObject, Value) -> RuntimeResult<()> + 'static,
    ) -> Self {
        self.parts.setters.push((name.into(), Arc::new(f)));
        self
    }

    /// Register both accessor directions of a property at once.
    pub fn property(
        self,
        name: impl Into<String>,
        get: impl Fn(&PropertyObject) -> RuntimeResult<Value> + 'static,
        set: impl Fn(&mut PropertyObject, Value) -> RuntimeResult<()> + 'static,
    ) -> Self {
        let name = name.into();
        self.getter(name.clone(), get).setter(name, set)
    }

    /// Register an instance method. Methods become callable on the owner
    /// through delegation once the behavior is attached.
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut PropertyObject, &[Value]) -> RuntimeResult<Value> + 'static,
    ) -> Self {
        self.parts.methods.push((name.into(), Arc::new(f)));
        self
    }

    /// Register a handler method, referenced by name from `handles`.
    pub fn handler(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut Behavior, &mut Event) -> RuntimeResult<()> + 'static,
    ) -> Self {
        self.parts.handlers.push((name.into(), Arc::new(f)));
        self
    }

    /// Register the `init` hook.
    pub fn init(
        mut self,
        f: impl Fn(&mut PropertyObject) -> RuntimeResult<()> + 'static,
    ) -> Self {
        self.parts.init = Some(Arc::new(f));
        self
    }

    /// Subscribe `method` to `event` on the owner's bus at attach time,
    /// appended after existing handlers.
    pub fn handles(mut self, event: impl Into<String>, method: impl Into<String>) -> Self {
        self.parts.subscriptions.push(EventDecl {
            event: event.into(),
            method: method.into(),
            append: true,
        });
        self
    }

    /// Subscribe `method` to `event` on the owner's bus at attach time,
    /// prepended before existing handlers.
    pub fn handles_first(mut self, event: impl Into<String>, method: impl Into<String>) -> Self {
        self.parts.subscriptions.push(EventDecl {
            event: event.into(),
            method: method.into(),
            append: false,
        });
        self
    }

    pub(crate) fn into_parts(self) -> ClassParts {
        self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClassRegistry;

    #[test]
    fn test_accessor_keys_lowercased() {
        let mut registry = ClassRegistry::new();
        let id = registry
            .register_component(
                ClassBuilder::new("widget").getter("Title", |_| Ok(Value::Str("t".to_string()))),
            )
            .unwrap();
        let class = registry.get(id).unwrap();
        assert!(class.getter("title").is_some());
        assert!(class.getter("TITLE").is_some());
    }

    #[test]
    fn test_child_overrides_parent_entries() {
        let mut registry = ClassRegistry::new();
        registry
            .register_component(
                ClassBuilder::new("base")
                    .field("size", 1i64)
                    .field("color", "red")
                    .getter("kind", |_| Ok(Value::Str("base".to_string()))),
            )
            .unwrap();
        let child_id = registry
            .register_component(
                ClassBuilder::new("derived")
                    .parent("base")
                    .field("size", 9i64)
                    .getter("kind", |_| Ok(Value::Str("derived".to_string()))),
            )
            .unwrap();

        let child = registry.get(child_id).unwrap();
        let obj = PropertyObject::new(child);
        // Overridden default, inherited field, overridden getter
        assert_eq!(obj.get("size").unwrap(), Value::Int(9));
        assert_eq!(obj.get("color").unwrap(), Value::Str("red".to_string()));
        assert_eq!(obj.get("kind").unwrap(), Value::Str("derived".to_string()));
    }

    #[test]
    fn test_internal_field_hidden_from_property_surface() {
        let mut registry = ClassRegistry::new();
        let id = registry
            .register_behavior(
                BehaviorBuilder::new("stateful")
                    .field("visible", 1i64)
                    .internal_field("state", 2i64),
            )
            .unwrap();
        let mut obj = PropertyObject::new(registry.get(id).unwrap());

        assert!(obj.can_get("visible", true));
        assert!(!obj.can_get("state", true));
        assert!(!obj.can_set("state", true));
        assert!(obj.get("state").is_err());

        // Direct field access still reaches it
        assert_eq!(obj.field_value("state"), Some(&Value::Int(2)));
        assert!(obj.set_field("state", Value::Int(5)));
        assert_eq!(obj.field_value("state"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_subscription_override_by_event() {
        let mut registry = ClassRegistry::new();
        registry
            .register_behavior(
                BehaviorBuilder::new("base")
                    .handler("on_a", |_, _| Ok(()))
                    .handler("on_b", |_, _| Ok(()))
                    .handles("tick", "on_a"),
            )
            .unwrap();
        let child_id = registry
            .register_behavior(
                BehaviorBuilder::new("derived")
                    .parent("base")
                    .handles("tick", "on_b"),
            )
            .unwrap();

        let child = registry.get(child_id).unwrap();
        assert_eq!(child.subscriptions().len(), 1);
        assert_eq!(child.subscriptions()[0].method, "on_b");
    }
}
