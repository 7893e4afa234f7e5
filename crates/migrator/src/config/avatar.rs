//! Avatar enrichment configuration

use crate::avatar::AvatarStyle;
use serde::{Deserialize, Serialize};

/// Avatar settings used during profile enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Generate an avatar URL for members without a legacy avatar
    pub fill_missing: bool,

    /// Style used for generated avatars
    pub style: AvatarStyle,

    /// Pixel size requested from the avatar service
    pub size: u32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            fill_missing: false,
            style: AvatarStyle::default(),
            size: 128,
        }
    }
}
