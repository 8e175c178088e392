//! Object descriptors: factory input for components and behaviors

use crate::error::RuntimeResult;
use crate::event::{Event, HandlerFn};
use std::fmt;
use std::sync::Arc;
use trellis_core::{IntoValue, Value};

/// One configuration entry of a descriptor.
///
/// Plain values apply through the property `set` chain. Handlers are only
/// legal under an `"on <event>"` key, behavior descriptors only under an
/// `"as <name>"` key; anything else is an `InvalidConfig` error at
/// construction time.
#[derive(Clone)]
pub enum ConfigValue {
    /// A plain property value
    Value(Value),
    /// An event handler, for `on` shorthand keys
    Handler(HandlerFn),
    /// A nested behavior descriptor, for `as` shorthand keys
    Behavior(ObjectDescriptor),
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ConfigValue::Handler(h) => write!(f, "Handler({:p})", Arc::as_ptr(h)),
            ConfigValue::Behavior(d) => f.debug_tuple("Behavior").field(d).finish(),
        }
    }
}

/// Factory input for an instance: a class name plus ordered configuration.
///
/// Entries apply in declaration order, before the class `init` hook runs, so
/// a malformed configuration fails before any partially-initialized instance
/// is exposed. Two magic key forms are recognized on components:
/// `"on <event>"` registers the entry's handler on the new instance's bus,
/// and `"as <name>"` attaches the entry's behavior under that name.
#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
    /// Registered class name to instantiate
    pub class: String,
    /// Ordered configuration entries
    pub entries: Vec<(String, ConfigValue)>,
}

impl ObjectDescriptor {
    /// Describe an instance of `class` with no configuration.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            entries: Vec::new(),
        }
    }

    /// Add a plain property entry.
    pub fn with(mut self, key: impl Into<String>, value: impl IntoValue) -> Self {
        self.entries
            .push((key.into(), ConfigValue::Value(value.into_value())));
        self
    }

    /// Add an `"on <event>"` shorthand entry registering `handler`.
    pub fn on(
        mut self,
        event: &str,
        handler: impl Fn(&mut Event) -> RuntimeResult<()> + 'static,
    ) -> Self {
        self.entries
            .push((format!("on {event}"), ConfigValue::Handler(Arc::new(handler))));
        self
    }

    /// Add an `"as <name>"` shorthand entry attaching a behavior.
    pub fn behavior(mut self, name: &str, descriptor: ObjectDescriptor) -> Self {
        self.entries
            .push((format!("as {name}"), ConfigValue::Behavior(descriptor)));
        self
    }
}

impl From<&str> for ObjectDescriptor {
    fn from(class: &str) -> Self {
        ObjectDescriptor::new(class)
    }
}

impl From<String> for ObjectDescriptor {
    fn from(class: String) -> Self {
        ObjectDescriptor::new(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_entry_order() {
        let descriptor = ObjectDescriptor::new("widget")
            .with("width", 3i64)
            .on("resize", |_| Ok(()))
            .behavior("tracker", ObjectDescriptor::new("tracking"))
            .with("height", 4i64);

        let keys: Vec<&str> = descriptor.entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["width", "on resize", "as tracker", "height"]);
    }

    #[test]
    fn test_descriptor_from_class_name() {
        let descriptor: ObjectDescriptor = "widget".into();
        assert_eq!(descriptor.class, "widget");
        assert!(descriptor.entries.is_empty());
    }
}
