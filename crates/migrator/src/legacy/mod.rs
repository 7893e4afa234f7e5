//! Legacy dataset model
//!
//! The snapshot endpoint returns one JSON object holding seven arrays. Each
//! element is decoded on its own so a malformed row becomes an
//! [`InvalidRecord`] for its stage to skip, instead of failing the whole
//! snapshot.

mod cells;
mod records;

pub use cells::{parse_date, parse_timestamp};
pub use records::{
    LegacyComment, LegacyDietLog, LegacyFeed, LegacyGroupMember, LegacyGroupPost, LegacyMember,
    LegacyTask,
};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// A decoded legacy row, or the reason it could not be decoded
pub type LegacyRecord<T> = Result<T, InvalidRecord>;

/// A legacy row that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRecord {
    /// Position in its legacy collection
    pub index: usize,
    /// Best-effort member name, for operator follow-up
    pub member_name: Option<String>,
    pub reason: String,
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member_name {
            Some(name) => write!(f, "row {} ({}): {}", self.index, name, self.reason),
            None => write!(f, "row {}: {}", self.index, self.reason),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    members: Option<Vec<Value>>,
    tasks: Option<Vec<Value>>,
    feeds: Option<Vec<Value>>,
    comments: Option<Vec<Value>>,
    group_members: Option<Vec<Value>>,
    group_posts: Option<Vec<Value>>,
    diet_logs: Option<Vec<Value>>,
}

/// The complete legacy dataset, held in memory for the whole run
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub members: Vec<LegacyRecord<LegacyMember>>,
    pub tasks: Vec<LegacyRecord<LegacyTask>>,
    pub feeds: Vec<LegacyRecord<LegacyFeed>>,
    pub comments: Vec<LegacyRecord<LegacyComment>>,
    pub group_members: Vec<LegacyRecord<LegacyGroupMember>>,
    pub group_posts: Vec<LegacyRecord<LegacyGroupPost>>,
    pub diet_logs: Vec<LegacyRecord<LegacyDietLog>>,
}

impl Snapshot {
    /// Decode a snapshot payload
    ///
    /// Fails only when the payload is not an object of arrays; individual
    /// rows never fail the snapshot.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: RawSnapshot = serde_json::from_str(body)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawSnapshot = serde_json::from_value(value)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSnapshot) -> Self {
        Self {
            members: decode_collection("members", raw.members),
            tasks: decode_collection("tasks", raw.tasks),
            feeds: decode_collection("feeds", raw.feeds),
            comments: decode_collection("comments", raw.comments),
            group_members: decode_collection("groupMembers", raw.group_members),
            group_posts: decode_collection("groupPosts", raw.group_posts),
            diet_logs: decode_collection("dietLogs", raw.diet_logs),
        }
    }

    /// Total rows across all collections, valid or not
    pub fn record_count(&self) -> usize {
        self.members.len()
            + self.tasks.len()
            + self.feeds.len()
            + self.comments.len()
            + self.group_members.len()
            + self.group_posts.len()
            + self.diet_logs.len()
    }

    /// Rows that failed validation
    pub fn invalid_count(&self) -> usize {
        fn invalid<T>(records: &[LegacyRecord<T>]) -> usize {
            records.iter().filter(|r| r.is_err()).count()
        }
        invalid(&self.members)
            + invalid(&self.tasks)
            + invalid(&self.feeds)
            + invalid(&self.comments)
            + invalid(&self.group_members)
            + invalid(&self.group_posts)
            + invalid(&self.diet_logs)
    }
}

fn decode_collection<T: DeserializeOwned>(
    name: &str,
    rows: Option<Vec<Value>>,
) -> Vec<LegacyRecord<T>> {
    let Some(rows) = rows else {
        warn!("[WARN] Snapshot has no `{}` collection; treating it as empty", name);
        return Vec::new();
    };

    debug!("Decoding {} {} rows", rows.len(), name);

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let member_name = row
                .get("memberName")
                .or_else(|| row.get("name"))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string());
            serde_json::from_value(row).map_err(|e| InvalidRecord {
                index,
                member_name,
                reason: e.to_string(),
            })
        })
        .collect()
}
