//! # Common Bonesquad
//!
//! Shared building blocks for the Bonesquad migration tooling.
//!
//! ## Key Features
//! - Strongly-typed backend keys (`IdentityKey`, `FeedKey`, `GroupKey`)
//! - Error handling with the `BonesquadError` marker trait
//! - Layered configuration loading (defaults, TOML file, environment)

pub mod config;
pub mod error;
pub mod identity;

// Re-export commonly used types at the crate root for convenience
pub use config::*;
pub use error::*;
pub use identity::*;

/// Version of the common crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(VERSION.chars().any(|c| c.is_ascii_digit()));
    }
}
