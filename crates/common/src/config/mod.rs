//! # Configuration Abstractions
//!
//! Layered configuration loading shared across Bonesquad binaries.

pub mod loader;
pub mod traits;

// Re-export commonly used types
pub use loader::*;
pub use traits::*;
