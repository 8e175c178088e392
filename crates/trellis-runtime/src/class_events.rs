//! Class-level event handlers: subscriptions indexed by class, not instance

use crate::class::ClassId;
use crate::event::HandlerFn;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use trellis_core::Value;

/// A class-level registration: handler plus context value
#[derive(Clone)]
pub(crate) struct ClassRegistration {
    pub(crate) handler: HandlerFn,
    pub(crate) data: Value,
}

/// Process-wide table of class-level event handlers.
///
/// A class-level handler fires for every instance of the registered class
/// and its subclasses, after the instance's own handlers and subject to the
/// same `handled` short-circuit. The table is shared across instances and
/// guarded by a reader/writer lock; dispatch snapshots the matching handler
/// lists out of the lock before invoking anything.
#[derive(Default)]
pub struct ClassEventRegistry {
    table: RwLock<FxHashMap<ClassId, FxHashMap<String, Vec<ClassRegistration>>>>,
}

impl ClassEventRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `event` on every instance of `class` and its
    /// subclasses, appended or prepended within the class's list.
    pub fn on(&self, class: ClassId, event: &str, handler: HandlerFn, data: Value, append: bool) {
        let mut table = self.table.write();
        let list = table
            .entry(class)
            .or_default()
            .entry(event.to_string())
            .or_default();
        let registration = ClassRegistration { handler, data };
        if append {
            list.push(registration);
        } else {
            list.insert(0, registration);
        }
        trace!(event, class = class.index(), "class-level handler registered");
    }

    /// Remove every registration of `handler` (by identity) for `event` on
    /// `class`. Returns whether anything was removed.
    pub fn off(&self, class: ClassId, event: &str, handler: &HandlerFn) -> bool {
        let mut table = self.table.write();
        let Some(events) = table.get_mut(&class) else {
            return false;
        };
        let Some(list) = events.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|reg| !Arc::ptr_eq(&reg.handler, handler));
        let removed = list.len() < before;
        if list.is_empty() {
            events.remove(event);
        }
        removed
    }

    /// Remove every registration for `event` on `class`. Returns whether any
    /// existed.
    pub fn off_all(&self, class: ClassId, event: &str) -> bool {
        let mut table = self.table.write();
        match table.get_mut(&class) {
            Some(events) => events.remove(event).is_some_and(|l| !l.is_empty()),
            None => false,
        }
    }

    /// Whether any class in `ancestry` has a registration for `event`.
    pub fn has_handlers(&self, ancestry: &[ClassId], event: &str) -> bool {
        let table = self.table.read();
        ancestry.iter().any(|class| {
            table
                .get(class)
                .and_then(|events| events.get(event))
                .is_some_and(|l| !l.is_empty())
        })
    }

    /// Snapshot the handlers matching `event` along `ancestry`, in walk
    /// order: the instance's own class first, then each ancestor, each
    /// class's registrations in their registered order.
    pub(crate) fn snapshot(&self, ancestry: &[ClassId], event: &str) -> Vec<ClassRegistration> {
        let table = self.table.read();
        let mut matched = Vec::new();
        for class in ancestry {
            if let Some(list) = table.get(class).and_then(|events| events.get(event)) {
                matched.extend(list.iter().cloned());
            }
        }
        matched
    }
}

impl fmt::Debug for ClassEventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read();
        f.debug_struct("ClassEventRegistry")
            .field("classes", &table.len())
            .finish()
    }
}
