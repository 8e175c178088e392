//! Runtime error types

use trellis_core::ValueError;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by the object runtime.
///
/// All of these are programmer-visible failures surfaced synchronously from
/// the offending call. The runtime performs no retry and no suppression;
/// failure handling belongs to the caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// Property name matches no accessor, field, or behavior property
    #[error("getting or setting unknown property: {class}::{property}")]
    UnknownProperty {
        /// Class the lookup started on
        class: String,
        /// Property name that failed to resolve
        property: String,
    },

    /// Property has a getter but no setter
    #[error("setting read-only property: {class}::{property}")]
    ReadOnlyProperty {
        /// Class the lookup started on
        class: String,
        /// Property name
        property: String,
    },

    /// Property has a setter but no getter
    #[error("getting write-only property: {class}::{property}")]
    WriteOnlyProperty {
        /// Class the lookup started on
        class: String,
        /// Property name
        property: String,
    },

    /// Method name matches no own method and no behavior method
    #[error("calling unknown method: {class}::{method}()")]
    UnknownMethod {
        /// Class the lookup started on
        class: String,
        /// Method name that failed to resolve
        method: String,
    },

    /// Class name is not registered
    #[error("unknown class: {name}")]
    UnknownClass {
        /// The unregistered class name
        name: String,
    },

    /// Class name is already registered
    #[error("duplicate class: {name}")]
    DuplicateClass {
        /// The colliding class name
        name: String,
    },

    /// Class is registered under the wrong kind for this use
    #[error("class {class} is a {actual} class, expected {expected}")]
    ClassKindMismatch {
        /// The offending class name
        class: String,
        /// Kind required by the caller
        expected: String,
        /// Kind the class was registered with
        actual: String,
    },

    /// A configuration descriptor entry cannot be applied
    #[error("invalid configuration entry {key:?}: {reason}")]
    InvalidConfig {
        /// The descriptor key that failed
        key: String,
        /// Why it could not be applied
        reason: String,
    },

    /// Value conversion failure inside an accessor or handler
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl RuntimeError {
    /// Build an `UnknownProperty` error.
    pub fn unknown_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        RuntimeError::UnknownProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Build a `ReadOnlyProperty` error.
    pub fn read_only(class: impl Into<String>, property: impl Into<String>) -> Self {
        RuntimeError::ReadOnlyProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Build a `WriteOnlyProperty` error.
    pub fn write_only(class: impl Into<String>, property: impl Into<String>) -> Self {
        RuntimeError::WriteOnlyProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Build an `UnknownMethod` error.
    pub fn unknown_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        RuntimeError::UnknownMethod {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Build an `InvalidConfig` error.
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        RuntimeError::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
