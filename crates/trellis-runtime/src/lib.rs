//! Trellis Runtime - a dynamic object-composition runtime
//!
//! Every instance built on this runtime gets virtual properties resolved
//! through accessor-method lookup; components additionally get a per-instance
//! event bus with ordered dispatch and cooperative cancellation, and a table
//! of runtime-attachable behaviors whose properties and methods become
//! visible on their owner through delegation.
//!
//! Classes are registered explicitly through [`ClassBuilder`] and
//! [`BehaviorBuilder`] on a [`Runtime`] handle; instances are built from
//! [`ObjectDescriptor`]s, which apply configuration before the class `init`
//! hook runs.
//!
//! # Example
//!
//! ```
//! use trellis_core::Value;
//! use trellis_runtime::{ClassBuilder, ObjectDescriptor, Runtime};
//!
//! let runtime = Runtime::new();
//! runtime
//!     .register_class(ClassBuilder::new("counter").field("count", 0i64))
//!     .unwrap();
//!
//! let mut counter = runtime
//!     .create(&ObjectDescriptor::new("counter").with("count", 5i64))
//!     .unwrap();
//! assert_eq!(counter.get("count").unwrap(), Value::Int(5));
//!
//! counter.on("tick", |event| {
//!     event.handled = true;
//!     Ok(())
//! }).unwrap();
//! counter.trigger("tick").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod behavior;
pub mod builder;
pub mod class;
pub mod class_events;
pub mod component;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod filter;
pub mod object;
pub mod registry;
pub mod runtime;

pub use behavior::{Behavior, BehaviorCell, BehaviorSlot, BehaviorSpec};
pub use builder::{BehaviorBuilder, ClassBuilder};
pub use class::{ClassDef, ClassId, ClassKind, EventDecl};
pub use class_events::ClassEventRegistry;
pub use component::Component;
pub use descriptor::{ConfigValue, ObjectDescriptor};
pub use error::{RuntimeError, RuntimeResult};
pub use event::{Event, EventBus, EventSender, Handler, HandlerFn};
pub use filter::{ACTION_FILTER_CLASS, AFTER_ACTION, BEFORE_ACTION};
pub use object::PropertyObject;
pub use registry::ClassRegistry;
pub use runtime::Runtime;

pub use trellis_core::{FromValue, IntoValue, Value};
