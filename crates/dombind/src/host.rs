//! The host object model the binding layer calls into
//!
//! Defines the interface a host environment implements. The binding core
//! only ever reaches the host through these four operations, so any host
//! that provides them (a browser DOM, an in-memory tree, a test double)
//! can be bound against.

use crate::value::{HostRef, HostValue};

/// Error raised by the host during construction, property access or an
/// operation call. Carries the host's own message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    /// Create a host error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The host-provided message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError::new(s)
    }
}

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError::new(s)
    }
}

/// Result type for host calls
pub type HostResult<T> = Result<T, HostError>;

/// Abstract host object model.
///
/// All calls are synchronous request/response. Asynchronous work the host
/// schedules from inside an operation is invisible here.
pub trait HostObjectModel {
    /// Instantiate a new host object with the named constructor
    fn construct(&self, name: &str, args: &[HostValue]) -> HostResult<HostRef>;

    /// Read a property of a host object
    fn get_property(&self, target: HostRef, name: &str) -> HostResult<HostValue>;

    /// Write a property of a host object
    fn set_property(&self, target: HostRef, name: &str, value: HostValue) -> HostResult<()>;

    /// Call a named operation on a host object
    fn call_operation(
        &self,
        target: HostRef,
        name: &str,
        args: &[HostValue],
    ) -> HostResult<HostValue>;

    /// Whether `name` resolves to a constructible host entity.
    ///
    /// Hosts that cannot answer cheaply keep the default, and construction
    /// failures then surface at `construct` time instead.
    fn has_constructor(&self, _name: &str) -> bool {
        true
    }
}
