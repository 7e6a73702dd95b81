//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod access;
pub mod host;
pub mod operation;
pub mod sequence;
pub mod topology;

// Re-export commonly used types
pub use host::{Host, Role};
pub use operation::{OperationAction, OperationSequence, OperationVars, VarValue};
pub use topology::{SkipReason, TopologyCheck};
