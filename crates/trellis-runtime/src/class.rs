//! Class definitions: accessor tables, fields, methods, declared behaviors

use crate::behavior::Behavior;
use crate::descriptor::ObjectDescriptor;
use crate::error::RuntimeResult;
use crate::event::Event;
use crate::object::PropertyObject;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use trellis_core::Value;

/// Identifier of a registered class (index into the class registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    /// Registry index of this class
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of a registered class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    /// A component: properties plus events plus behaviors
    Component,
    /// A behavior: attachable to a component
    Behavior,
}

impl ClassKind {
    /// Lowercase kind name, for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ClassKind::Component => "component",
            ClassKind::Behavior => "behavior",
        }
    }
}

/// Getter accessor: computes a property value from the instance
pub type GetterFn = Arc<dyn Fn(&PropertyObject) -> RuntimeResult<Value>>;

/// Setter accessor: applies a property value to the instance
pub type SetterFn = Arc<dyn Fn(&mut PropertyObject, Value) -> RuntimeResult<()>>;

/// Instance method: invoked with the instance and positional arguments
pub type MethodFn = Arc<dyn Fn(&mut PropertyObject, &[Value]) -> RuntimeResult<Value>>;

/// Event handler method declared on a behavior class
pub type HandlerMethodFn = Arc<dyn Fn(&mut Behavior, &mut Event) -> RuntimeResult<()>>;

/// Initialization hook, run after configuration is applied
pub type InitFn = Arc<dyn Fn(&mut PropertyObject) -> RuntimeResult<()>>;

/// A declared field: name plus default value
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name (case-sensitive)
    pub name: String,
    /// Value the field starts with on every new instance
    pub default: Value,
    /// Hidden from the named property surface (and so from delegation);
    /// reachable only through direct field access
    pub internal: bool,
}

/// One entry of a behavior class's declared event-subscription map
#[derive(Debug, Clone)]
pub struct EventDecl {
    /// Event name to subscribe to on the owner
    pub event: String,
    /// Handler method name on the behavior class
    pub method: String,
    /// Append (true) or prepend (false) on the owner's bus
    pub append: bool,
}

/// One entry of a component class's declared behavior list
#[derive(Debug, Clone)]
pub struct BehaviorDecl {
    /// Named slot, or `None` for an anonymous slot
    pub name: Option<String>,
    /// How to materialize the behavior at ensure time
    pub descriptor: ObjectDescriptor,
}

/// A registered class: the shared template every instance of it points at.
///
/// Accessor, method, and handler tables are keyed by lowercased name, so
/// property and method lookup is case-insensitive. Field names are
/// case-sensitive. Registration flattens inheritance: a child class starts
/// from its parent's tables and overrides entries by name, so no lookup ever
/// walks the parent chain at run time.
pub struct ClassDef {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) parent: Option<ClassId>,
    /// Ancestry, self first, root last. Used by the class-level event walk.
    pub(crate) ancestry: Vec<ClassId>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) field_index: FxHashMap<String, usize>,
    pub(crate) getters: FxHashMap<String, GetterFn>,
    pub(crate) setters: FxHashMap<String, SetterFn>,
    pub(crate) methods: FxHashMap<String, MethodFn>,
    pub(crate) handlers: FxHashMap<String, HandlerMethodFn>,
    pub(crate) init: Option<InitFn>,
    /// Component classes: behaviors materialized on first touch
    pub(crate) behaviors: Vec<BehaviorDecl>,
    /// Behavior classes: events subscribed on the owner at attach time
    pub(crate) subscriptions: Vec<EventDecl>,
}

impl ClassDef {
    /// Identifier of this class
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Registered class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind this class was registered with
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Parent class, if any
    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    /// Ancestry of this class: itself first, then each parent up to the root
    pub fn ancestry(&self) -> &[ClassId] {
        &self.ancestry
    }

    /// Declared event subscriptions (behavior classes)
    pub fn subscriptions(&self) -> &[EventDecl] {
        &self.subscriptions
    }

    /// Declared behavior list (component classes)
    pub fn behavior_decls(&self) -> &[BehaviorDecl] {
        &self.behaviors
    }

    pub(crate) fn getter(&self, name: &str) -> Option<GetterFn> {
        self.getters.get(&name.to_ascii_lowercase()).cloned()
    }

    pub(crate) fn setter(&self, name: &str) -> Option<SetterFn> {
        self.setters.get(&name.to_ascii_lowercase()).cloned()
    }

    pub(crate) fn method_fn(&self, name: &str) -> Option<MethodFn> {
        self.methods.get(&name.to_ascii_lowercase()).cloned()
    }

    pub(crate) fn handler_fn(&self, name: &str) -> Option<HandlerMethodFn> {
        self.handlers.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Slot of a field visible to the named property surface.
    pub(crate) fn field_slot(&self, name: &str) -> Option<usize> {
        self.field_index
            .get(name)
            .copied()
            .filter(|&slot| !self.fields[slot].internal)
    }

    /// Slot of any declared field, internal included. Backs the direct
    /// `field_value`/`set_field` access.
    pub(crate) fn any_field_slot(&self, name: &str) -> Option<usize> {
        self.field_index.get(name).copied()
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("fields", &self.fields.len())
            .field("getters", &self.getters.len())
            .field("setters", &self.setters.len())
            .field("methods", &self.methods.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ClassKind::Component.name(), "component");
        assert_eq!(ClassKind::Behavior.name(), "behavior");
    }

    #[test]
    fn test_class_id_roundtrip() {
        let id = ClassId(3);
        assert_eq!(id.index(), 3);

        let json = serde_json::to_string(&id).unwrap();
        let back: ClassId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
