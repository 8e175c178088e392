//! Trellis Core - dynamic value model for the Trellis object runtime
//!
//! This crate provides the minimal types shared by everything built on the
//! runtime: the dynamically typed [`Value`] carried by virtual properties,
//! event payloads, and configuration descriptors, plus the conversion traits
//! between `Value` and plain Rust types.
//!
//! # Example
//!
//! ```
//! use trellis_core::{FromValue, IntoValue, Value};
//!
//! let v = 42i64.into_value();
//! assert_eq!(v, Value::Int(42));
//! assert_eq!(i64::from_value(&v).unwrap(), 42);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod convert;
pub mod error;
pub mod value;

pub use convert::{FromValue, IntoValue};
pub use error::ValueError;
pub use value::Value;
