//! The runtime handle: class registry, class-level events, and factories

use crate::behavior::Behavior;
use crate::builder::{BehaviorBuilder, ClassBuilder};
use crate::class::{ClassDef, ClassId, ClassKind};
use crate::class_events::ClassEventRegistry;
use crate::component::Component;
use crate::descriptor::{ConfigValue, ObjectDescriptor};
use crate::error::{RuntimeError, RuntimeResult};
use crate::event::HandlerFn;
use crate::filter;
use crate::object::PropertyObject;
use crate::registry::ClassRegistry;
use parking_lot::RwLock;
use std::sync::Arc;
use trellis_core::Value;

/// The injected context every component carries: the class registry and the
/// class-level event table.
///
/// Cheap to clone (shared inner). There is no ambient singleton; anything
/// that needs to register classes, subscribe class-level handlers, or build
/// instances does it through a `Runtime` handle. Construction registers the
/// built-in [`action_filter`](crate::filter) behavior class.
#[derive(Debug, Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

#[derive(Debug, Default)]
struct RuntimeInner {
    classes: RwLock<ClassRegistry>,
    class_events: ClassEventRegistry,
}

impl Runtime {
    /// Create a runtime with the built-in behavior classes registered.
    pub fn new() -> Self {
        let runtime = Self {
            inner: Arc::new(RuntimeInner::default()),
        };
        filter::register_builtin(&mut runtime.inner.classes.write());
        runtime
    }

    // ========================================================================
    // Class registration
    // ========================================================================

    /// Register a component class.
    pub fn register_class(&self, builder: ClassBuilder) -> RuntimeResult<ClassId> {
        self.inner.classes.write().register_component(builder)
    }

    /// Register a behavior class.
    pub fn register_behavior(&self, builder: BehaviorBuilder) -> RuntimeResult<ClassId> {
        self.inner.classes.write().register_behavior(builder)
    }

    /// Look up a class ID by name.
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.inner.classes.read().id_of(name)
    }

    /// Look up a class definition by ID.
    pub fn class_def(&self, id: ClassId) -> Option<Arc<ClassDef>> {
        self.inner.classes.read().get(id)
    }

    // ========================================================================
    // Factories
    // ========================================================================

    /// Build a component from a descriptor: instantiate the class, apply the
    /// configuration entries in order, then run the `init` hook.
    pub fn create(&self, descriptor: &ObjectDescriptor) -> RuntimeResult<Component> {
        let class = self.class_by_name(&descriptor.class, ClassKind::Component)?;
        let mut component = Component::new(class, self.clone());
        component.apply_descriptor(descriptor)?;
        component.run_init()?;
        Ok(component)
    }

    /// Build a behavior from a descriptor. Behavior configuration takes
    /// plain values only; `on`/`as` shorthands belong to components.
    pub fn create_behavior(&self, descriptor: &ObjectDescriptor) -> RuntimeResult<Behavior> {
        let class = self.class_by_name(&descriptor.class, ClassKind::Behavior)?;
        let mut object = PropertyObject::new(class);
        for (key, entry) in &descriptor.entries {
            match entry {
                ConfigValue::Value(value) => object.set(key, value.clone())?,
                _ => {
                    return Err(RuntimeError::invalid_config(
                        key,
                        "behavior configuration takes plain values only",
                    ));
                }
            }
        }
        object.run_init()?;
        Ok(Behavior::new(object))
    }

    fn class_by_name(&self, name: &str, kind: ClassKind) -> RuntimeResult<Arc<ClassDef>> {
        let class = self
            .inner
            .classes
            .read()
            .by_name(name)
            .ok_or_else(|| RuntimeError::UnknownClass {
                name: name.to_string(),
            })?;
        if class.kind() != kind {
            return Err(RuntimeError::ClassKindMismatch {
                class: name.to_string(),
                expected: kind.name().to_string(),
                actual: class.kind().name().to_string(),
            });
        }
        Ok(class)
    }

    // ========================================================================
    // Class-level events
    // ========================================================================

    /// Register a class-level handler: it fires for every instance of
    /// `class` and its subclasses, after the instance's own handlers.
    pub fn on_class(
        &self,
        class: ClassId,
        event: &str,
        handler: HandlerFn,
        data: Value,
        append: bool,
    ) {
        self.inner.class_events.on(class, event, handler, data, append);
    }

    /// Remove a class-level handler by identity. Returns whether any
    /// registration was removed.
    pub fn off_class(&self, class: ClassId, event: &str, handler: &HandlerFn) -> bool {
        self.inner.class_events.off(class, event, handler)
    }

    /// Remove every class-level handler for `event` on `class`.
    pub fn off_class_all(&self, class: ClassId, event: &str) -> bool {
        self.inner.class_events.off_all(class, event)
    }

    /// Whether `class` or an ancestor has a class-level handler for `event`.
    pub fn has_class_handlers(&self, class: ClassId, event: &str) -> bool {
        match self.class_def(class) {
            Some(def) => self.inner.class_events.has_handlers(def.ancestry(), event),
            None => false,
        }
    }

    pub(crate) fn class_events(&self) -> &ClassEventRegistry {
        &self.inner.class_events
    }
}

// Every construction path must register the built-ins.
impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_filter_class_registered() {
        let runtime = Runtime::new();
        let id = runtime.class_id(filter::ACTION_FILTER_CLASS).unwrap();
        let def = runtime.class_def(id).unwrap();
        assert_eq!(def.kind(), ClassKind::Behavior);
    }

    #[test]
    fn test_default_runtime_has_builtin_classes() {
        let runtime = Runtime::default();
        assert!(runtime.class_id(filter::ACTION_FILTER_CLASS).is_some());
        runtime
            .create_behavior(&ObjectDescriptor::new(filter::ACTION_FILTER_CLASS))
            .unwrap();
    }

    #[test]
    fn test_create_unknown_class() {
        let runtime = Runtime::new();
        let err = runtime.create(&ObjectDescriptor::new("missing")).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownClass { .. }));
    }

    #[test]
    fn test_create_kind_mismatch() {
        let runtime = Runtime::new();
        // action_filter is a behavior class, not a component class
        let err = runtime
            .create(&ObjectDescriptor::new(filter::ACTION_FILTER_CLASS))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ClassKindMismatch { .. }));

        runtime
            .register_class(ClassBuilder::new("widget"))
            .unwrap();
        let err = runtime
            .create_behavior(&ObjectDescriptor::new("widget"))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ClassKindMismatch { .. }));
    }

    #[test]
    fn test_behavior_config_rejects_shorthands() {
        let runtime = Runtime::new();
        let descriptor =
            ObjectDescriptor::new(filter::ACTION_FILTER_CLASS).on("tick", |_| Ok(()));
        let err = runtime.create_behavior(&descriptor).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConfig { .. }));
    }
}
