//! Identity provisioning configuration

use serde::{Deserialize, Serialize};

/// Settings for the synthetic accounts created per legacy member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Domain appended to derived login handles
    pub handle_domain: String,

    /// Length of the random one-time secret
    pub secret_length: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            handle_domain: "bonesquad.temp".to_string(),
            secret_length: 24,
        }
    }
}
