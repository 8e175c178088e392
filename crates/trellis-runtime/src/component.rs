//! Components: property objects with events and attachable behaviors

use crate::behavior::{BehaviorCell, BehaviorSlot, BehaviorSpec};
use crate::class::ClassDef;
use crate::descriptor::{ConfigValue, ObjectDescriptor};
use crate::error::{RuntimeError, RuntimeResult};
use crate::event::{Event, EventBus, EventSender, Handler, HandlerFn};
use crate::object::PropertyObject;
use crate::runtime::Runtime;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};
use trellis_core::Value;

/// A property object with an event bus and a behavior table.
///
/// Components extend the base property chains with a behavior-delegation
/// tier. Resolution order is fixed: own accessor, then own declared field,
/// then the first attached behavior that can satisfy the access, in attach
/// order. The same order governs reads, writes, and existence checks
/// independently per direction.
///
/// The behavior table starts uninitialized and is built lazily on first
/// touch from the class's declared behavior list; after that, behaviors
/// attach and detach individually across the component's life. Cloning a
/// component clears its event registrations and behavior table: behaviors
/// are attachment-scoped and cannot be shared between two owners.
#[derive(Debug)]
pub struct Component {
    object: PropertyObject,
    runtime: Runtime,
    bus: EventBus,
    behaviors: Option<Vec<(BehaviorSlot, BehaviorCell)>>,
}

impl Component {
    pub(crate) fn new(class: Arc<ClassDef>, runtime: Runtime) -> Self {
        Self {
            object: PropertyObject::new(class),
            runtime,
            bus: EventBus::new(),
            behaviors: None,
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

    /// Registered name of this component's class.
    pub fn class_name(&self) -> &str {
        self.object.class_name()
    }

    /// Unique instance ID.
    pub fn instance_id(&self) -> u64 {
        self.object.instance_id()
    }

    /// The runtime this component was created by.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    // ========================================================================
    // Property resolution
    // ========================================================================

    /// Read a property: own getter, own field, then the first behavior that
    /// can read it.
    pub fn get(&mut self, name: &str) -> RuntimeResult<Value> {
        if let Some(getter) = self.object.class().getter(name) {
            return getter(&self.object);
        }
        if let Some(value) = self.object.field_value(name) {
            return Ok(value.clone());
        }
        let mut source = None;
        for (_, cell) in self.table()? {
            if cell.borrow().can_get(name, true) {
                source = Some(cell.clone());
                break;
            }
        }
        if let Some(cell) = source {
            return cell.borrow().get(name);
        }
        if self.object.class().setter(name).is_some() {
            Err(RuntimeError::write_only(self.object.class_name(), name))
        } else {
            Err(RuntimeError::unknown_property(self.object.class_name(), name))
        }
    }

    /// Write a property: own setter, own field, then the first behavior that
    /// can write it.
    pub fn set(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        if let Some(setter) = self.object.class().setter(name) {
            return setter(&mut self.object, value);
        }
        if self.object.class().field_slot(name).is_some() {
            self.object.set_field(name, value);
            return Ok(());
        }
        let mut target = None;
        for (_, cell) in self.table()? {
            if cell.borrow().can_set(name, true) {
                target = Some(cell.clone());
                break;
            }
        }
        if let Some(cell) = target {
            return cell.borrow_mut().set(name, value);
        }
        if self.object.class().getter(name).is_some() {
            Err(RuntimeError::read_only(self.object.class_name(), name))
        } else {
            Err(RuntimeError::unknown_property(self.object.class_name(), name))
        }
    }

    /// Whether the property is readable, optionally consulting fields and
    /// behaviors.
    pub fn can_get(
        &mut self,
        name: &str,
        check_fields: bool,
        check_behaviors: bool,
    ) -> RuntimeResult<bool> {
        if self.object.can_get(name, check_fields) {
            return Ok(true);
        }
        if check_behaviors {
            for (_, cell) in self.table()? {
                if cell.borrow().can_get(name, check_fields) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Whether the property is writable, optionally consulting fields and
    /// behaviors.
    pub fn can_set(
        &mut self,
        name: &str,
        check_fields: bool,
        check_behaviors: bool,
    ) -> RuntimeResult<bool> {
        if self.object.can_set(name, check_fields) {
            return Ok(true);
        }
        if check_behaviors {
            for (_, cell) in self.table()? {
                if cell.borrow().can_set(name, check_fields) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Whether the property exists in either direction.
    pub fn has_property(
        &mut self,
        name: &str,
        check_fields: bool,
        check_behaviors: bool,
    ) -> RuntimeResult<bool> {
        Ok(self.can_get(name, check_fields, check_behaviors)?
            || self.can_set(name, check_fields, check_behaviors)?)
    }

    /// Whether the property is readable through the full chain and currently
    /// non-null. Never an error: unreadable names answer `false`.
    pub fn is_set(&mut self, name: &str) -> bool {
        match self.get(name) {
            Ok(value) => !value.is_null(),
            Err(_) => false,
        }
    }

    /// Clear a property to null where writable, through the full chain. A
    /// readable-only property is a `ReadOnlyProperty` error; a wholly
    /// unknown name is a silent no-op.
    pub fn unset(&mut self, name: &str) -> RuntimeResult<()> {
        if self.object.can_set(name, true) {
            return self.object.set(name, Value::Null);
        }
        let mut target = None;
        for (_, cell) in self.table()? {
            if cell.borrow().can_set(name, true) {
                target = Some(cell.clone());
                break;
            }
        }
        if let Some(cell) = target {
            return cell.borrow_mut().unset(name);
        }
        if self.object.class().getter(name).is_some() {
            return Err(RuntimeError::read_only(self.object.class_name(), name));
        }
        Ok(())
    }

    // ========================================================================
    // Method resolution
    // ========================================================================

    /// Invoke a method: own method table first, then behaviors.
    pub fn call(&mut self, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        if let Some(method) = self.object.class().method_fn(name) {
            return method(&mut self.object, args);
        }
        self.call_unknown_method(name, args)
    }

    /// Fallthrough for a method the class does not declare: the first
    /// behavior whose method table contains `name` handles the call.
    pub fn call_unknown_method(&mut self, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        let mut target = None;
        for (_, cell) in self.table()? {
            if cell.borrow().has_method(name) {
                target = Some(cell.clone());
                break;
            }
        }
        match target {
            Some(cell) => cell.borrow_mut().call(name, args),
            None => Err(RuntimeError::unknown_method(self.object.class_name(), name)),
        }
    }

    /// Whether the method exists, optionally consulting behaviors.
    pub fn has_method(&mut self, name: &str, check_behaviors: bool) -> RuntimeResult<bool> {
        if self.object.has_method(name) {
            return Ok(true);
        }
        if check_behaviors {
            for (_, cell) in self.table()? {
                if cell.borrow().has_method(name) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register a handler closure for `name`, appended with no context
    /// value. Returns the shared handler for later [`off`](Self::off) calls.
    pub fn on(
        &mut self,
        name: &str,
        handler: impl Fn(&mut Event) -> RuntimeResult<()> + 'static,
    ) -> RuntimeResult<HandlerFn> {
        let handler: HandlerFn = Arc::new(handler);
        self.on_with(name, Handler::Func(handler.clone()), Value::Null, true)?;
        Ok(handler)
    }

    /// Register a handler for `name` with a context value, appended or
    /// prepended. No de-duplication: the same handler may be registered
    /// multiple times and fires once per registration.
    pub fn on_with(
        &mut self,
        name: &str,
        handler: Handler,
        data: Value,
        append: bool,
    ) -> RuntimeResult<()> {
        self.ensure_behaviors()?;
        self.bus.on(name, handler, data, append);
        Ok(())
    }

    /// Remove every registration of `handler` (by identity) for `name`,
    /// preserving the order of the remainder. Returns whether any were
    /// removed.
    pub fn off(&mut self, name: &str, handler: &Handler) -> RuntimeResult<bool> {
        self.ensure_behaviors()?;
        Ok(self.bus.off(name, Some(handler)))
    }

    /// Remove all registrations for `name`. Returns whether any existed.
    pub fn off_all(&mut self, name: &str) -> RuntimeResult<bool> {
        self.ensure_behaviors()?;
        Ok(self.bus.off(name, None))
    }

    /// Whether handlers exist for `name`: local registrations, or a
    /// class-level handler on this component's class or an ancestor.
    pub fn has_event_handlers(&mut self, name: &str) -> RuntimeResult<bool> {
        self.ensure_behaviors()?;
        Ok(self.has_any_handlers(name))
    }

    /// Trigger `name` with a default event. A no-op when no local and no
    /// class-level handlers exist: no event is even constructed.
    pub fn trigger(&mut self, name: &str) -> RuntimeResult<()> {
        self.ensure_behaviors()?;
        if !self.has_any_handlers(name) {
            trace!(event = name, "trigger: no handlers");
            return Ok(());
        }
        let mut event = Event::new(name);
        self.dispatch(name, &mut event)
    }

    /// Trigger `name` with a caller-supplied event, observable after the
    /// dispatch (`handled`, `is_valid`, `result`, payload fields). The
    /// no-handler no-op leaves the event untouched.
    pub fn trigger_with(&mut self, name: &str, event: &mut Event) -> RuntimeResult<()> {
        self.ensure_behaviors()?;
        if !self.has_any_handlers(name) {
            trace!(event = name, "trigger: no handlers");
            return Ok(());
        }
        self.dispatch(name, event)
    }

    fn has_any_handlers(&self, name: &str) -> bool {
        self.bus.has_handlers(name)
            || self
                .runtime
                .class_events()
                .has_handlers(self.object.class().ancestry(), name)
    }

    /// Run one dispatch: local registrations in order over a snapshot, then
    /// class-level handlers along the ancestry, short-circuiting on
    /// `handled` at every step.
    fn dispatch(&mut self, name: &str, event: &mut Event) -> RuntimeResult<()> {
        if event.sender.is_none() {
            event.sender = Some(EventSender {
                instance_id: self.object.instance_id(),
                class: self.object.class().id(),
            });
        }
        event.handled = false;
        if event.name != name {
            event.name = name.to_string();
        }
        trace!(event = name, instance = self.object.instance_id(), "dispatch");

        // Snapshot before iterating: handlers may attach or detach
        // registrations for this very event without corrupting the walk.
        for registration in self.bus.snapshot(name) {
            event.data = registration.data;
            match &registration.handler {
                Handler::Func(handler) => handler(event)?,
                Handler::Method { behavior, method } => match behavior.upgrade() {
                    Some(cell) => {
                        let handler = cell.borrow().object().class().handler_fn(method);
                        match handler {
                            Some(handler) => handler(&mut cell.borrow_mut(), event)?,
                            None => {
                                let class = cell.borrow().object().class_name().to_string();
                                return Err(RuntimeError::unknown_method(class, method.clone()));
                            }
                        }
                    }
                    None => {
                        trace!(event = name, method = method.as_str(), "skipping stale behavior handler");
                        continue;
                    }
                },
            }
            if event.handled {
                debug!(event = name, "dispatch short-circuited");
                return Ok(());
            }
        }

        let ancestry = self.object.class().ancestry().to_vec();
        for registration in self.runtime.class_events().snapshot(&ancestry, name) {
            event.data = registration.data;
            (registration.handler)(event)?;
            if event.handled {
                debug!(event = name, "dispatch short-circuited at class level");
                return Ok(());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Behaviors
    // ========================================================================

    /// Materialize the class's declared behaviors. Idempotent: only the
    /// first call builds the table.
    pub fn ensure_behaviors(&mut self) -> RuntimeResult<()> {
        self.table()?;
        Ok(())
    }

    /// Attach a behavior under `name`. If the name is already occupied, the
    /// old behavior is detached first; the new one keeps the slot position.
    /// Returns a handle to the attached behavior.
    pub fn attach_behavior(
        &mut self,
        name: &str,
        spec: impl Into<BehaviorSpec>,
    ) -> RuntimeResult<BehaviorCell> {
        self.ensure_behaviors()?;
        let cell = self.materialize(spec.into())?;
        self.attach_cell(BehaviorSlot::Named(name.to_string()), cell.clone())?;
        Ok(cell)
    }

    /// Attach a behavior to an anonymous slot: appended, never addressable
    /// by name, never replaced.
    pub fn attach_behavior_anonymous(
        &mut self,
        spec: impl Into<BehaviorSpec>,
    ) -> RuntimeResult<BehaviorCell> {
        self.ensure_behaviors()?;
        let cell = self.materialize(spec.into())?;
        self.attach_cell(BehaviorSlot::Anonymous, cell.clone())?;
        Ok(cell)
    }

    /// Attach a list of named and anonymous behaviors in order.
    pub fn attach_behaviors(
        &mut self,
        specs: Vec<(Option<String>, BehaviorSpec)>,
    ) -> RuntimeResult<()> {
        for (name, spec) in specs {
            match name {
                Some(name) => {
                    self.attach_behavior(&name, spec)?;
                }
                None => {
                    self.attach_behavior_anonymous(spec)?;
                }
            }
        }
        Ok(())
    }

    /// Detach and return the named behavior, or `None` if absent. Detaching
    /// unsubscribes its declared events and clears its owner reference.
    pub fn detach_behavior(&mut self, name: &str) -> RuntimeResult<Option<BehaviorCell>> {
        self.ensure_behaviors()?;
        match self.named_position(name) {
            Some(index) => {
                let cell = match self.behaviors.as_mut() {
                    Some(table) => table.remove(index).1,
                    None => return Ok(None),
                };
                self.detach_cell(&cell);
                Ok(Some(cell))
            }
            None => Ok(None),
        }
    }

    /// Detach every named and anonymous behavior, leaving the table built
    /// but empty.
    pub fn detach_behaviors(&mut self) -> RuntimeResult<()> {
        self.ensure_behaviors()?;
        let cells: Vec<BehaviorCell> = self
            .behaviors
            .get_or_insert_with(Vec::new)
            .drain(..)
            .map(|(_, cell)| cell)
            .collect();
        for cell in &cells {
            self.detach_cell(cell);
        }
        Ok(())
    }

    /// Get the behavior attached under `name`, if any.
    pub fn get_behavior(&mut self, name: &str) -> RuntimeResult<Option<BehaviorCell>> {
        self.ensure_behaviors()?;
        Ok(self.named_position(name).and_then(|index| {
            self.behaviors
                .as_ref()
                .and_then(|table| table.get(index))
                .map(|(_, cell)| cell.clone())
        }))
    }

    /// All attached behaviors in attach order, named and anonymous
    /// interleaved exactly as attached.
    pub fn get_behaviors(&mut self) -> RuntimeResult<&[(BehaviorSlot, BehaviorCell)]> {
        Ok(self.table()?.as_slice())
    }

    /// The behavior table, built on first access from the class's declared
    /// behavior list.
    fn table(&mut self) -> RuntimeResult<&mut Vec<(BehaviorSlot, BehaviorCell)>> {
        if self.behaviors.is_none() {
            self.behaviors = Some(Vec::new());
            let decls = self.object.class().behavior_decls().to_vec();
            for decl in decls {
                let behavior = self.runtime.create_behavior(&decl.descriptor)?;
                let cell = Rc::new(RefCell::new(behavior));
                let slot = match decl.name {
                    Some(name) => BehaviorSlot::Named(name),
                    None => BehaviorSlot::Anonymous,
                };
                self.attach_cell(slot, cell)?;
            }
        }
        Ok(self.behaviors.get_or_insert_with(Vec::new))
    }

    fn materialize(&self, spec: BehaviorSpec) -> RuntimeResult<BehaviorCell> {
        let behavior = match spec {
            BehaviorSpec::Ready(behavior) => behavior,
            BehaviorSpec::Descriptor(descriptor) => self.runtime.create_behavior(&descriptor)?,
        };
        Ok(Rc::new(RefCell::new(behavior)))
    }

    fn attach_cell(&mut self, slot: BehaviorSlot, cell: BehaviorCell) -> RuntimeResult<()> {
        // Validate the declared subscriptions before mutating anything.
        let decls = {
            let behavior = cell.borrow();
            let class = behavior.object().class();
            for decl in class.subscriptions() {
                if class.handler_fn(&decl.method).is_none() {
                    return Err(RuntimeError::unknown_method(
                        class.name(),
                        decl.method.clone(),
                    ));
                }
            }
            class.subscriptions().to_vec()
        };

        self.behaviors.get_or_insert_with(Vec::new);
        let replaced = match &slot {
            BehaviorSlot::Named(name) => self.named_position(name),
            BehaviorSlot::Anonymous => None,
        };
        match replaced {
            Some(index) => {
                let old = self
                    .behaviors
                    .as_ref()
                    .and_then(|table| table.get(index))
                    .map(|(_, cell)| cell.clone());
                if let Some(old) = old {
                    self.detach_cell(&old);
                }
                if let Some(table) = self.behaviors.as_mut() {
                    table[index] = (slot, cell.clone());
                }
            }
            None => self
                .behaviors
                .get_or_insert_with(Vec::new)
                .push((slot, cell.clone())),
        }

        cell.borrow_mut().set_owner(self.object.instance_id());
        let class_name = cell.borrow().object().class_name().to_string();
        debug!(
            class = class_name.as_str(),
            owner = self.object.instance_id(),
            "behavior attached"
        );
        for decl in decls {
            let handler = Handler::Method {
                behavior: Rc::downgrade(&cell),
                method: decl.method.clone(),
            };
            self.bus.on(&decl.event, handler, Value::Null, decl.append);
        }
        Ok(())
    }

    fn detach_cell(&mut self, cell: &BehaviorCell) {
        let decls = cell.borrow().events().to_vec();
        for decl in &decls {
            let probe = Handler::Method {
                behavior: Rc::downgrade(cell),
                method: decl.method.clone(),
            };
            self.bus.off(&decl.event, Some(&probe));
        }
        cell.borrow_mut().clear_owner();
        let class_name = cell.borrow().object().class_name().to_string();
        debug!(
            class = class_name.as_str(),
            owner = self.object.instance_id(),
            "behavior detached"
        );
    }

    fn named_position(&self, name: &str) -> Option<usize> {
        self.behaviors
            .as_ref()
            .and_then(|table| table.iter().position(|(slot, _)| slot.name() == Some(name)))
    }

    // ========================================================================
    // Construction plumbing
    // ========================================================================

    /// Apply a descriptor's entries in order. `"on <event>"` keys register
    /// handlers, `"as <name>"` keys attach behaviors; everything else goes
    /// through the property `set` chain. Runs before `init`, so a malformed
    /// entry fails construction.
    pub(crate) fn apply_descriptor(&mut self, descriptor: &ObjectDescriptor) -> RuntimeResult<()> {
        for (key, entry) in &descriptor.entries {
            if let Some(event) = key.strip_prefix("on ") {
                match entry {
                    ConfigValue::Handler(handler) => {
                        self.on_with(event, Handler::Func(handler.clone()), Value::Null, true)?;
                    }
                    _ => {
                        return Err(RuntimeError::invalid_config(
                            key,
                            "event shorthand requires a handler",
                        ));
                    }
                }
            } else if let Some(name) = key.strip_prefix("as ") {
                match entry {
                    ConfigValue::Behavior(spec) => {
                        self.attach_behavior(name, spec.clone())?;
                    }
                    _ => {
                        return Err(RuntimeError::invalid_config(
                            key,
                            "behavior shorthand requires a behavior descriptor",
                        ));
                    }
                }
            } else {
                match entry {
                    ConfigValue::Value(value) => self.set(key, value.clone())?,
                    ConfigValue::Handler(_) => {
                        return Err(RuntimeError::invalid_config(
                            key,
                            "handler outside an `on` shorthand",
                        ));
                    }
                    ConfigValue::Behavior(_) => {
                        return Err(RuntimeError::invalid_config(
                            key,
                            "behavior outside an `as` shorthand",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn run_init(&mut self) -> RuntimeResult<()> {
        self.object.run_init()
    }
}

// Clones start fresh: events and behaviors are attachment-scoped, so the
// clone gets an empty bus and an unbuilt behavior table.
impl Clone for Component {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            runtime: self.runtime.clone(),
            bus: EventBus::new(),
            behaviors: None,
        }
    }
}
