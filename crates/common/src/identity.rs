//! Key types for Bonesquad backend records
//!
//! - `IdentityKey`: account identifier assigned by the hosted auth service
//! - `FeedKey`: identifier of a feed post in the relational store
//! - `GroupKey`: identifier of a pre-existing group
//!
//! All keys wrap a UUID and serialize transparently, so they can be written
//! straight into row payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random key
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_key!(
    /// Account identifier issued when an identity is provisioned
    IdentityKey
);

uuid_key!(
    /// Feed post identifier, distinct from the legacy feed id
    FeedKey
);

uuid_key!(
    /// Group identifier; groups exist before any migration runs
    GroupKey
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_key_round_trips_through_string() {
        let key = IdentityKey::new();
        let parsed = IdentityKey::from_str(&key.to_string()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(FeedKey::from_str("feed-17").is_err());
    }

    #[test]
    fn test_key_serializes_as_bare_uuid() {
        let uuid = Uuid::parse_str("5b3c1c7e-2f7e-4d8a-9f61-0d6c8b1f2a33").unwrap();
        let key = GroupKey::from_uuid(uuid);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"5b3c1c7e-2f7e-4d8a-9f61-0d6c8b1f2a33\"");

        let back: GroupKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_uuid(), &uuid);
    }
}
