//! # Bonesquad Legacy Migrator
//!
//! One-shot transfer of the legacy spreadsheet dataset into the hosted
//! backend.
//!
//! ## Pipeline
//!
//! - **Snapshot**: the whole legacy dataset in one fetch, decoded per record
//! - **Identities**: one pre-confirmed account per member, reused on re-run
//! - **Resolver**: member, group and feed lookups for cross-references
//! - **Stages**: tasks, feeds, comments, group memberships, group posts and
//!   diet logs, in dependency order
//! - **Report**: per-stage counts and the login handles to hand out

pub mod avatar;
pub mod backend;
pub mod config;
pub mod error;
pub mod identity;
pub mod legacy;
pub mod orchestrator;
pub mod report;
pub mod resolver;
pub mod snapshot;
pub mod stages;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use orchestrator::Migrator;
pub use report::MigrationReport;

/// Version of the migrator crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }
}
