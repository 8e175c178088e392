//! Base property object: virtual properties over accessor and field tiers

use crate::class::ClassDef;
use crate::error::{RuntimeError, RuntimeResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use trellis_core::Value;

/// Global counter for generating unique instance IDs
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique instance ID
fn generate_instance_id() -> u64 {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// An instance of a registered class, with virtual property support.
///
/// Property reads resolve own getter accessor first, then the declared field
/// of that name; writes resolve own setter first, then the field. Accessor
/// names match case-insensitively, field names are case-sensitive. When
/// neither tier matches, the error distinguishes a property that exists only
/// in the opposite direction (`ReadOnlyProperty`/`WriteOnlyProperty`) from
/// one that does not exist at all (`UnknownProperty`).
///
/// [`Component`](crate::Component) embeds one of these and extends the same
/// chains with a behavior-delegation tier.
#[derive(Debug)]
pub struct PropertyObject {
    class: Arc<ClassDef>,
    instance_id: u64,
    fields: Vec<Value>,
}

impl PropertyObject {
    /// Create an instance of `class` with every field at its default value.
    pub fn new(class: Arc<ClassDef>) -> Self {
        let fields = class.fields.iter().map(|f| f.default.clone()).collect();
        Self {
            class,
            instance_id: generate_instance_id(),
            fields,
        }
    }

    /// The class this instance was created from
    pub fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    /// Registered name of this instance's class
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Unique instance ID (assigned on creation and on clone)
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Read a property: own getter first, then the declared field.
    pub fn get(&self, name: &str) -> RuntimeResult<Value> {
        if let Some(getter) = self.class.getter(name) {
            return getter(self);
        }
        if let Some(slot) = self.class.field_slot(name) {
            return Ok(self.fields[slot].clone());
        }
        if self.class.setter(name).is_some() {
            Err(RuntimeError::write_only(self.class.name(), name))
        } else {
            Err(RuntimeError::unknown_property(self.class.name(), name))
        }
    }

    /// Write a property: own setter first, then the declared field.
    pub fn set(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        if let Some(setter) = self.class.setter(name) {
            return setter(self, value);
        }
        if let Some(slot) = self.class.field_slot(name) {
            self.fields[slot] = value;
            return Ok(());
        }
        if self.class.getter(name).is_some() {
            Err(RuntimeError::read_only(self.class.name(), name))
        } else {
            Err(RuntimeError::unknown_property(self.class.name(), name))
        }
    }

    /// Whether the property is readable: a getter exists, or (when
    /// `check_fields`) a declared field of that name exists.
    pub fn can_get(&self, name: &str, check_fields: bool) -> bool {
        self.class.getter(name).is_some() || (check_fields && self.class.field_slot(name).is_some())
    }

    /// Whether the property is writable: a setter exists, or (when
    /// `check_fields`) a declared field of that name exists.
    pub fn can_set(&self, name: &str, check_fields: bool) -> bool {
        self.class.setter(name).is_some() || (check_fields && self.class.field_slot(name).is_some())
    }

    /// Whether the property exists in either direction.
    pub fn has_property(&self, name: &str, check_fields: bool) -> bool {
        self.can_get(name, check_fields) || self.can_set(name, check_fields)
    }

    /// Whether the property is readable here and currently non-null.
    /// Never an error: unreadable names answer `false`.
    pub fn is_set(&self, name: &str) -> bool {
        match self.get(name) {
            Ok(value) => !value.is_null(),
            Err(_) => false,
        }
    }

    /// Clear a property to null where writable. A getter-only property is a
    /// `ReadOnlyProperty` error; a wholly unknown name is a silent no-op.
    pub fn unset(&mut self, name: &str) -> RuntimeResult<()> {
        if self.can_set(name, true) {
            return self.set(name, Value::Null);
        }
        if self.class.getter(name).is_some() {
            return Err(RuntimeError::read_only(self.class.name(), name));
        }
        Ok(())
    }

    /// Invoke a method from the class method table.
    ///
    /// Method names match case-insensitively. An unregistered name fails
    /// with `UnknownMethod`; `Component` overrides that fallthrough to
    /// consult behaviors first.
    pub fn call(&mut self, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        if let Some(method) = self.class.method_fn(name) {
            return method(self, args);
        }
        Err(RuntimeError::unknown_method(self.class.name(), name))
    }

    /// Whether the class method table contains `name`.
    pub fn has_method(&self, name: &str) -> bool {
        self.class.method_fn(name).is_some()
    }

    /// Run the class `init` hook, if one was registered.
    pub(crate) fn run_init(&mut self) -> RuntimeResult<()> {
        if let Some(init) = self.class.init.clone() {
            init(self)?;
        }
        Ok(())
    }

    /// Direct field read by name, bypassing accessors. Reaches internal
    /// fields too.
    pub fn field_value(&self, name: &str) -> Option<&Value> {
        self.class
            .any_field_slot(name)
            .map(|slot| &self.fields[slot])
    }

    /// Direct field write by name, bypassing accessors. Returns whether the
    /// field exists. Reaches internal fields too.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self.class.any_field_slot(name) {
            Some(slot) => {
                self.fields[slot] = value;
                true
            }
            None => false,
        }
    }
}

// Clones start fresh: same class and field values, new identity.
impl Clone for PropertyObject {
    fn clone(&self) -> Self {
        Self {
            class: self.class.clone(),
            instance_id: generate_instance_id(),
            fields: self.fields.clone(),
        }
    }
}
