//! Error types for value conversion

/// Result type for value conversions
pub type ValueResult<T> = Result<T, ValueError>;

/// Value conversion error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValueError {
    /// Value kind does not match the requested type
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected kind name
        expected: String,
        /// Actual kind name
        got: String,
    },
}

impl ValueError {
    /// Build a `TypeMismatch` from the expected kind and the actual kind.
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        ValueError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}
