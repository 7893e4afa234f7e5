//! Record transform configuration

use serde::{Deserialize, Serialize};

/// Settings applied while transforming legacy records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Category given to every task item; the legacy format has none
    pub task_category: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            task_category: "study".to_string(),
        }
    }
}
