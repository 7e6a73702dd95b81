//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services talk to infrastructure through the traits in `ports`.

pub mod lifecycle;
pub mod ports;

// Re-export commonly used types
pub use lifecycle::{LifecycleService, Outcome};
pub use ports::RunOptions;
