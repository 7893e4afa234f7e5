//! Generated avatar URLs
//!
//! Profiles without an uploaded image fall back to a DiceBear avatar keyed by
//! a seed string (the member's display name) and a style.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

/// DiceBear HTTP API root, pinned to the 7.x schema the web app uses
pub const AVATAR_API_BASE: &str = "https://api.dicebear.com/7.x";

/// Avatar styles offered by the web app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvatarStyle {
    #[default]
    Notionists,
    NotionistsNeutral,
    Avataaars,
    AvataaarsNeutral,
    Bottts,
    BotttsNeutral,
    Lorelei,
    LoreleiNeutral,
    Micah,
    Personas,
    PixelArt,
    PixelArtNeutral,
    Thumbs,
}

impl AvatarStyle {
    pub const ALL: [AvatarStyle; 13] = [
        AvatarStyle::Notionists,
        AvatarStyle::NotionistsNeutral,
        AvatarStyle::Avataaars,
        AvatarStyle::AvataaarsNeutral,
        AvatarStyle::Bottts,
        AvatarStyle::BotttsNeutral,
        AvatarStyle::Lorelei,
        AvatarStyle::LoreleiNeutral,
        AvatarStyle::Micah,
        AvatarStyle::Personas,
        AvatarStyle::PixelArt,
        AvatarStyle::PixelArtNeutral,
        AvatarStyle::Thumbs,
    ];

    /// Style name as used in the API path and the `avatar_style` column
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarStyle::Notionists => "notionists",
            AvatarStyle::NotionistsNeutral => "notionists-neutral",
            AvatarStyle::Avataaars => "avataaars",
            AvatarStyle::AvataaarsNeutral => "avataaars-neutral",
            AvatarStyle::Bottts => "bottts",
            AvatarStyle::BotttsNeutral => "bottts-neutral",
            AvatarStyle::Lorelei => "lorelei",
            AvatarStyle::LoreleiNeutral => "lorelei-neutral",
            AvatarStyle::Micah => "micah",
            AvatarStyle::Personas => "personas",
            AvatarStyle::PixelArt => "pixel-art",
            AvatarStyle::PixelArtNeutral => "pixel-art-neutral",
            AvatarStyle::Thumbs => "thumbs",
        }
    }
}

impl fmt::Display for AvatarStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvatarStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AvatarStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| format!("unknown avatar style: {s}"))
    }
}

/// Percent-encode like the browser's `encodeURIComponent`
///
/// Spaces become `%20`, never `+`, so the stored URL matches the one the web
/// app builds for the same name.
fn encode_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

/// Build the SVG avatar URL for `seed`
pub fn avatar_url(seed: &str, style: AvatarStyle, size: u32) -> String {
    format!(
        "{AVATAR_API_BASE}/{style}/svg?seed={}&size={size}",
        encode_component(seed)
    )
}

/// Prefer a stored avatar, otherwise generate one from the display name
pub fn resolve_avatar(stored: Option<&str>, name: &str, style: AvatarStyle, size: u32) -> String {
    match stored {
        Some(url) if !url.trim().is_empty() => url.to_string(),
        _ => avatar_url(name, style, size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_url_encodes_seed() {
        let url = avatar_url("김 철수", AvatarStyle::PixelArt, 64);
        assert!(url.starts_with("https://api.dicebear.com/7.x/pixel-art/svg?seed="));
        assert!(url.ends_with("&size=64"));
        assert!(!url.contains(' '));
        assert!(url.contains("%EA%B9%80"));
    }

    #[test]
    fn test_seed_encoding_matches_browser() {
        assert_eq!(
            avatar_url("Jin Park", AvatarStyle::Notionists, 128),
            "https://api.dicebear.com/7.x/notionists/svg?seed=Jin%20Park&size=128"
        );
        assert_eq!(encode_component("a+b&c=d"), "a%2Bb%26c%3Dd");
        assert_eq!(encode_component("it's (ok)!*~"), "it's (ok)!*~");
    }

    #[test]
    fn test_style_names_round_trip() {
        for style in AvatarStyle::ALL {
            assert_eq!(style.as_str().parse::<AvatarStyle>().unwrap(), style);
            let json = serde_json::to_string(&style).unwrap();
            assert_eq!(json, format!("\"{}\"", style.as_str()));
        }
        assert!("cartoon".parse::<AvatarStyle>().is_err());
    }

    #[test]
    fn test_resolve_prefers_stored_avatar() {
        let stored = "https://cdn.example/avatars/jin.png";
        assert_eq!(
            resolve_avatar(Some(stored), "jin", AvatarStyle::Micah, 128),
            stored
        );
        assert!(resolve_avatar(Some("  "), "jin", AvatarStyle::Micah, 128)
            .contains("/micah/svg?seed=jin"));
    }
}
