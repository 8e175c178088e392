//! Events, handlers, and the per-instance event bus

use crate::behavior::Behavior;
use crate::class::ClassId;
use crate::error::RuntimeResult;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;
use std::sync::Arc;
use trellis_core::Value;

/// Identity of the instance that triggered an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSender {
    /// Instance ID of the triggering component
    pub instance_id: u64,
    /// Class of the triggering component
    pub class: ClassId,
}

/// The mutable record passed to every handler of one dispatch.
///
/// `handled` is a cooperative cancellation flag: once a handler sets it, the
/// bus stops invoking further handlers for that dispatch, including
/// class-level ones. `data` is rewritten before each handler invocation from
/// that handler's registration.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name, set by the dispatching component
    pub name: String,
    /// Triggering instance, filled in at dispatch if unset
    pub sender: Option<EventSender>,
    /// Per-registration context value
    pub data: Value,
    /// Cooperative cancellation flag
    pub handled: bool,
    /// Action ID, for action events
    pub action: Option<String>,
    /// Whether the action should proceed; filters clear this to cancel
    pub is_valid: bool,
    /// Action result, threaded through after-hooks
    pub result: Value,
    /// Free-form payload fields
    pub payload: FxHashMap<String, Value>,
}

impl Event {
    /// Create an event with the given name and default state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sender: None,
            data: Value::Null,
            handled: false,
            action: None,
            is_valid: true,
            result: Value::Null,
            payload: FxHashMap::default(),
        }
    }

    /// Create an action event carrying the given action ID.
    pub fn for_action(name: impl Into<String>, action: impl Into<String>) -> Self {
        let mut event = Self::new(name);
        event.action = Some(action.into());
        event
    }
}

/// A plain event handler function
pub type HandlerFn = Arc<dyn Fn(&mut Event) -> RuntimeResult<()>>;

/// An event handler registered on a bus.
///
/// `Func` is a free closure. `Method` names a handler method on an attached
/// behavior, held weakly: the owner's table keeps the behavior alive, and a
/// registration whose behavior is gone is skipped at dispatch.
#[derive(Clone)]
pub enum Handler {
    /// Free handler closure, compared by pointer identity
    Func(HandlerFn),
    /// Named handler method on an attached behavior
    Method {
        /// The behavior carrying the method
        behavior: Weak<RefCell<Behavior>>,
        /// Handler method name on the behavior's class
        method: String,
    },
}

impl Handler {
    /// Wrap a closure as a `Func` handler.
    pub fn func(f: impl Fn(&mut Event) -> RuntimeResult<()> + 'static) -> Self {
        Handler::Func(Arc::new(f))
    }

    /// Identity comparison: pointer equality for closures, behavior pointer
    /// plus method name for behavior methods.
    pub fn same(&self, other: &Handler) -> bool {
        match (self, other) {
            (Handler::Func(a), Handler::Func(b)) => Arc::ptr_eq(a, b),
            (
                Handler::Method {
                    behavior: a,
                    method: m,
                },
                Handler::Method {
                    behavior: b,
                    method: n,
                },
            ) => Weak::ptr_eq(a, b) && m.eq_ignore_ascii_case(n),
            _ => false,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Func(func) => write!(f, "Handler::Func({:p})", Arc::as_ptr(func)),
            Handler::Method { method, .. } => write!(f, "Handler::Method({method})"),
        }
    }
}

/// One registration on the bus: the handler plus its context value
#[derive(Debug, Clone)]
pub struct EventRegistration {
    /// The handler to invoke
    pub handler: Handler,
    /// Context value written into `Event::data` before invocation
    pub data: Value,
}

/// Per-instance ordered registry of event name → handler list.
///
/// Insertion order is dispatch order unless a registration prepends. The
/// same handler may be registered multiple times and fires once per
/// registration. Dispatch (driven by `Component::trigger`) iterates over a
/// snapshot, so handlers detached during a dispatch neither corrupt nor
/// reorder the traversal.
#[derive(Debug, Default)]
pub struct EventBus {
    registrations: FxHashMap<String, Vec<EventRegistration>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `name`, appended or prepended.
    pub fn on(&mut self, name: &str, handler: Handler, data: Value, append: bool) {
        let list = self.registrations.entry(name.to_string()).or_default();
        let registration = EventRegistration { handler, data };
        if append {
            list.push(registration);
        } else {
            list.insert(0, registration);
        }
    }

    /// Remove registrations for `name`.
    ///
    /// With a handler, removes every registration comparing identical to it
    /// and preserves the order of the remainder; with `None`, removes all.
    /// Returns whether anything was removed.
    pub fn off(&mut self, name: &str, handler: Option<&Handler>) -> bool {
        match handler {
            None => self.registrations.remove(name).is_some_and(|l| !l.is_empty()),
            Some(target) => match self.registrations.get_mut(name) {
                Some(list) => {
                    let before = list.len();
                    list.retain(|reg| !reg.handler.same(target));
                    let removed = list.len() < before;
                    if list.is_empty() {
                        self.registrations.remove(name);
                    }
                    removed
                }
                None => false,
            },
        }
    }

    /// Whether any local registrations exist for `name`.
    pub fn has_handlers(&self, name: &str) -> bool {
        self.registrations.get(name).is_some_and(|l| !l.is_empty())
    }

    /// Snapshot the registration list for `name`, for mutation-safe dispatch.
    pub fn snapshot(&self, name: &str) -> Vec<EventRegistration> {
        self.registrations.get(name).cloned().unwrap_or_default()
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.registrations.clear();
    }
}
