//! Typed legacy records
//!
//! One struct per sheet. Field names follow the legacy JSON (camelCase);
//! required cells fail deserialization, optional ones default to `None`.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;

use super::cells;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMember {
    #[serde(deserialize_with = "cells::key")]
    pub name: String,
    #[serde(default, deserialize_with = "cells::optional_text")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "cells::optional_text")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTask {
    #[serde(deserialize_with = "cells::key")]
    pub member_name: String,
    #[serde(deserialize_with = "cells::date")]
    pub date: NaiveDate,
    /// One task per line
    #[serde(deserialize_with = "cells::text")]
    pub content: String,
    /// Satisfaction rating in half-star steps
    #[serde(default, deserialize_with = "cells::optional_rating")]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFeed {
    /// Only unique within the legacy sheet
    #[serde(deserialize_with = "cells::key")]
    pub id: String,
    #[serde(deserialize_with = "cells::key")]
    pub member_name: String,
    #[serde(deserialize_with = "cells::text")]
    pub content: String,
    #[serde(default, deserialize_with = "cells::optional_text")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "cells::timestamp")]
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyComment {
    #[serde(deserialize_with = "cells::key")]
    pub feed_id: String,
    #[serde(deserialize_with = "cells::key")]
    pub member_name: String,
    #[serde(deserialize_with = "cells::text")]
    pub content: String,
    #[serde(deserialize_with = "cells::timestamp")]
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyGroupMember {
    #[serde(deserialize_with = "cells::key")]
    pub group: String,
    #[serde(deserialize_with = "cells::key")]
    pub member_name: String,
    #[serde(deserialize_with = "cells::timestamp")]
    pub joined_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyGroupPost {
    #[serde(deserialize_with = "cells::key")]
    pub group: String,
    #[serde(deserialize_with = "cells::key")]
    pub member_name: String,
    #[serde(deserialize_with = "cells::text")]
    pub content: String,
    #[serde(deserialize_with = "cells::timestamp")]
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDietLog {
    #[serde(deserialize_with = "cells::key")]
    pub member_name: String,
    #[serde(deserialize_with = "cells::date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "cells::optional_text")]
    pub breakfast: Option<String>,
    #[serde(default, deserialize_with = "cells::optional_text")]
    pub lunch: Option<String>,
    #[serde(default, deserialize_with = "cells::optional_text")]
    pub dinner: Option<String>,
    #[serde(default, deserialize_with = "cells::optional_text")]
    pub snack: Option<String>,
    #[serde(default, deserialize_with = "cells::optional_text")]
    pub exercise: Option<String>,
}
