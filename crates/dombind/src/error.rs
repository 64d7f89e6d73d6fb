//! Error types for the binding layer

use crate::host::HostError;

/// Result type for binding operations
pub type BindResult<T> = Result<T, BindingError>;

/// Coarse classification of a [`BindingError`].
///
/// Registration errors abort bootstrap, lookup errors are programmer errors
/// between typed code and the catalogue, lifecycle errors are handle misuse,
/// and boundary errors come from the host or from value shape mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Catalogue or registry construction failed
    Registration,
    /// Typed code does not match the catalogue
    Lookup,
    /// Handle lifecycle misuse
    Lifecycle,
    /// Host rejection or value shape mismatch
    Boundary,
}

/// Binding error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum BindingError {
    // ========================================================================
    // Registration
    // ========================================================================
    /// A descriptor with the same class id is already registered
    #[error("Duplicate binding: class '{0}' is already registered")]
    DuplicateBinding(String),

    /// `register` called after `freeze`
    #[error("Registry is frozen: cannot register '{0}'")]
    RegistryFrozen(String),

    /// A binder was created over a registry still in its bootstrap phase
    #[error("Registry is not frozen")]
    RegistryNotFrozen,

    /// A declared type is neither a bound class nor a coercion rule
    #[error("Unregistered type '{type_name}' used by '{class}.{member}'")]
    UnregisteredType {
        /// Class declaring the member
        class: String,
        /// Member using the type
        member: String,
        /// Type name that could not be resolved
        type_name: String,
    },

    /// Two own fields or two own methods share a name
    #[error("Duplicate member '{member}' in class '{class}'")]
    DuplicateMember {
        /// Class declaring the member twice
        class: String,
        /// Repeated member name
        member: String,
    },

    /// Supertype was not registered before the subtype
    #[error("Class '{class}' extends unregistered class '{super_class}'")]
    MissingSuperType {
        /// Subtype
        class: String,
        /// Missing supertype
        super_class: String,
    },

    /// The supertype chain loops back on itself
    #[error("Inheritance cycle through class '{0}'")]
    InheritanceCycle(String),

    // ========================================================================
    // Lookup
    // ========================================================================
    /// No descriptor for the class id
    #[error("Unknown binding: class '{0}' is not registered")]
    UnknownBinding(String),

    /// No field mapping anywhere in the chain
    #[error("Unknown field '{field}' on class '{class}'")]
    UnknownField {
        /// Class the lookup started from
        class: String,
        /// Field name
        field: String,
    },

    /// No method mapping anywhere in the chain
    #[error("Unknown method '{method}' on class '{class}'")]
    UnknownMethod {
        /// Class the lookup started from
        class: String,
        /// Method name
        method: String,
    },

    /// Argument count differs from the declared parameter count
    #[error("Arity mismatch calling '{member}': expected {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Method (or constructor) name
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    // ========================================================================
    // Lifecycle
    // ========================================================================
    /// The wrapper has no attached handle
    #[error("Wrapper of class '{0}' is not bound to a host object")]
    Unbound(String),

    /// The handle was detached and can no longer be used
    #[error("Native handle was detached")]
    HandleDetached,

    /// The handle or wrapper belongs to a different binder
    #[error("Native handle belongs to another binder")]
    ForeignHandle,

    /// The host object already has a live handle or wrapper
    #[error("Host object {host} is already adopted as '{existing}'")]
    DuplicateAdoption {
        /// Host reference, formatted
        host: String,
        /// Class of the live owner
        existing: String,
    },

    /// `attach` on a wrapper that already holds a handle
    #[error("Wrapper of class '{0}' is already bound")]
    AlreadyBound(String),

    /// The descriptor declares no host constructor
    #[error("Class '{0}' has no host constructor")]
    NoHostConstructor(String),

    /// The host rejected construction
    #[error("Host failed to construct '{constructor}' for class '{class}': {source}")]
    HostConstructionFailed {
        /// Bound class
        class: String,
        /// Host constructor name
        constructor: String,
        /// Host-side failure
        #[source]
        source: HostError,
    },

    // ========================================================================
    // Boundary
    // ========================================================================
    /// The host raised an error during a get/set/call
    #[error("Host error in '{class}.{member}': {source}")]
    HostInvocationFailed {
        /// Bound class
        class: String,
        /// Field or method
        member: String,
        /// Host-side failure
        #[source]
        source: HostError,
    },

    /// Value shape is incompatible with the declared type
    #[error("Coercion error: expected {expected}, got {got}")]
    CoercionError {
        /// Declared type
        expected: String,
        /// What was found
        got: String,
    },

    /// The field mapping is read-only
    #[error("Field '{field}' of class '{class}' is read-only")]
    ReadOnlyField {
        /// Class declaring the field
        class: String,
        /// Field name
        field: String,
    },
}

impl BindingError {
    /// Shorthand for a coercion failure
    pub(crate) fn coercion(expected: impl ToString, got: impl ToString) -> Self {
        BindingError::CoercionError {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            BindingError::DuplicateBinding(_)
            | BindingError::RegistryFrozen(_)
            | BindingError::RegistryNotFrozen
            | BindingError::UnregisteredType { .. }
            | BindingError::DuplicateMember { .. }
            | BindingError::MissingSuperType { .. }
            | BindingError::InheritanceCycle(_) => ErrorCategory::Registration,
            BindingError::UnknownBinding(_)
            | BindingError::UnknownField { .. }
            | BindingError::UnknownMethod { .. }
            | BindingError::ArityMismatch { .. } => ErrorCategory::Lookup,
            BindingError::Unbound(_)
            | BindingError::HandleDetached
            | BindingError::ForeignHandle
            | BindingError::DuplicateAdoption { .. }
            | BindingError::AlreadyBound(_)
            | BindingError::NoHostConstructor(_)
            | BindingError::HostConstructionFailed { .. } => ErrorCategory::Lifecycle,
            BindingError::HostInvocationFailed { .. }
            | BindingError::CoercionError { .. }
            | BindingError::ReadOnlyField { .. } => ErrorCategory::Boundary,
        }
    }
}
