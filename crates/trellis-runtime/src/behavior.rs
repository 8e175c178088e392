//! Behaviors: attachable units of property, method, and event logic

use crate::class::EventDecl;
use crate::error::RuntimeResult;
use crate::object::PropertyObject;
use std::cell::RefCell;
use std::rc::Rc;
use trellis_core::Value;

/// Shared handle to an attached behavior.
///
/// The owning component's table holds the strong reference; the owner's bus
/// holds weak ones for the behavior's event subscriptions.
pub type BehaviorCell = Rc<RefCell<Behavior>>;

/// Slot a behavior occupies in its owner's table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BehaviorSlot {
    /// Named slot: unique per owner, addressable, replaceable
    Named(String),
    /// Anonymous slot: insertion-ordered, never addressable by name
    Anonymous,
}

impl BehaviorSlot {
    /// Slot name, if named.
    pub fn name(&self) -> Option<&str> {
        match self {
            BehaviorSlot::Named(name) => Some(name),
            BehaviorSlot::Anonymous => None,
        }
    }
}

/// An instance of a behavior class.
///
/// A behavior is owned by at most one component at a time. Attaching sets
/// the owner back-reference and subscribes the class's declared events on
/// the owner's bus; detaching reverses both. While attached, the behavior's
/// properties and methods are visible on the owner through delegation.
#[derive(Debug)]
pub struct Behavior {
    object: PropertyObject,
    owner: Option<u64>,
}

impl Behavior {
    /// Wrap a freshly built instance, not yet attached.
    pub(crate) fn new(object: PropertyObject) -> Self {
        Self {
            object,
            owner: None,
        }
    }

    /// The underlying property object.
    pub fn object(&self) -> &PropertyObject {
        &self.object
    }

    /// Mutable access to the underlying property object.
    pub fn object_mut(&mut self) -> &mut PropertyObject {
        &mut self.object
    }

    /// Instance ID of the owning component, if attached.
    pub fn owner(&self) -> Option<u64> {
        self.owner
    }

    /// Whether this behavior is currently attached.
    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }

    pub(crate) fn set_owner(&mut self, owner: u64) {
        self.owner = Some(owner);
    }

    pub(crate) fn clear_owner(&mut self) {
        self.owner = None;
    }

    /// The class's declared event subscriptions.
    pub fn events(&self) -> &[EventDecl] {
        self.object.class().subscriptions()
    }

    /// Read a property of this behavior.
    pub fn get(&self, name: &str) -> RuntimeResult<Value> {
        self.object.get(name)
    }

    /// Write a property of this behavior.
    pub fn set(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        self.object.set(name, value)
    }

    /// Whether the named property is readable here.
    pub fn can_get(&self, name: &str, check_fields: bool) -> bool {
        self.object.can_get(name, check_fields)
    }

    /// Whether the named property is writable here.
    pub fn can_set(&self, name: &str, check_fields: bool) -> bool {
        self.object.can_set(name, check_fields)
    }

    /// Whether the named property exists here in either direction.
    pub fn has_property(&self, name: &str, check_fields: bool) -> bool {
        self.object.has_property(name, check_fields)
    }

    /// Clear a property to null where writable.
    pub fn unset(&mut self, name: &str) -> RuntimeResult<()> {
        self.object.unset(name)
    }

    /// Invoke a method of this behavior's class.
    pub fn call(&mut self, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        self.object.call(name, args)
    }

    /// Whether the class method table contains `name`.
    pub fn has_method(&self, name: &str) -> bool {
        self.object.has_method(name)
    }
}

// A cloned behavior starts detached; the owner slot is attachment-scoped.
impl Clone for Behavior {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            owner: None,
        }
    }
}

/// Input to `attach_behavior`: a ready instance or a descriptor to
/// materialize through the runtime's factory.
#[derive(Debug)]
pub enum BehaviorSpec {
    /// An already-built behavior instance
    Ready(Behavior),
    /// A descriptor naming a registered behavior class
    Descriptor(crate::descriptor::ObjectDescriptor),
}

impl From<Behavior> for BehaviorSpec {
    fn from(behavior: Behavior) -> Self {
        BehaviorSpec::Ready(behavior)
    }
}

impl From<crate::descriptor::ObjectDescriptor> for BehaviorSpec {
    fn from(descriptor: crate::descriptor::ObjectDescriptor) -> Self {
        BehaviorSpec::Descriptor(descriptor)
    }
}

impl From<&str> for BehaviorSpec {
    fn from(class: &str) -> Self {
        BehaviorSpec::Descriptor(crate::descriptor::ObjectDescriptor::new(class))
    }
}
