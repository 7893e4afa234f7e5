//! Hosted backend capability
//!
//! The migrator only needs a narrow slice of the hosted platform: account
//! provisioning, a profile update, a read of existing groups, and inserts or
//! upserts into six tables. [`Backend`] captures exactly that slice so the
//! pipeline can run against the real service ([`SupabaseBackend`]) or an
//! in-process stand-in ([`MemoryBackend`]).

mod memory;
mod supabase;

pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use common::{BonesquadError, FeedKey, GroupKey, IdentityKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::avatar::AvatarStyle;

/// Backend collections written or read by the migrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Accounts,
    Profiles,
    Groups,
    GroupMembers,
    GroupPosts,
    WeeklyLogs,
    Feeds,
    Comments,
    DietLogs,
}

impl Table {
    /// Relational collection name
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Accounts => "users",
            Table::Profiles => "profiles",
            Table::Groups => "groups",
            Table::GroupMembers => "group_members",
            Table::GroupPosts => "group_posts",
            Table::WeeklyLogs => "weekly_logs",
            Table::Feeds => "feeds",
            Table::Comments => "comments",
            Table::DietLogs => "diet_logs",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a backend operation
#[derive(Debug, Error)]
pub enum BackendError {
    /// The target already exists (duplicate handle, unique violation)
    #[error("{table} conflict: {message}")]
    AlreadyExists { table: Table, message: String },

    /// The backend refused the request for any other reason
    #[error("{table} request rejected with status {status}: {message}")]
    Rejected {
        table: Table,
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a response
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response could not be understood
    #[error("Invalid backend response from {table}: {details}")]
    InvalidResponse { table: Table, details: String },
}

impl BonesquadError for BackendError {}

impl BackendError {
    /// Whether the request failed only because the target already exists
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackendError::AlreadyExists { .. })
    }

    pub fn rejected(table: Table, status: u16, message: impl Into<String>) -> Self {
        BackendError::Rejected {
            table,
            status,
            code: None,
            message: message.into(),
        }
    }
}

/// Metadata stored on a new account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub name: String,
}

/// Account creation request
#[derive(Clone, PartialEq, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    /// Created accounts are pre-confirmed; no confirmation mail is sent
    pub email_confirm: bool,
    pub user_metadata: AccountMetadata,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("email_confirm", &self.email_confirm)
            .field("user_metadata", &self.user_metadata)
            .finish()
    }
}

/// An account known to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: IdentityKey,
    #[serde(default)]
    pub email: Option<String>,
}

/// Profile enrichment written after account creation
///
/// `bio` and `avatar_url` are always sent, as null when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_style: Option<AvatarStyle>,
}

/// A group created ahead of the migration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupKey,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLogItem {
    pub category: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLogContent {
    pub items: Vec<WeeklyLogItem>,
}

/// `weekly_logs` row, unique on (user_id, date)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyLogRow {
    pub user_id: IdentityKey,
    pub date: NaiveDate,
    pub rating: Option<f64>,
    pub content: WeeklyLogContent,
}

/// `feeds` row; the key is assigned by the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedRow {
    pub user_id: IdentityKey,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// `comments` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRow {
    pub feed_id: FeedKey,
    pub user_id: IdentityKey,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
}

/// `group_members` row, unique on (group_id, user_id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMemberRow {
    pub group_id: GroupKey,
    pub user_id: IdentityKey,
    pub joined_at: DateTime<FixedOffset>,
}

/// `group_posts` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPostRow {
    pub group_id: GroupKey,
    pub user_id: IdentityKey,
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
}

/// `diet_logs` row, unique on (user_id, date)
///
/// Absent meals are serialized as explicit nulls so an upsert clears them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DietLogRow {
    pub user_id: IdentityKey,
    pub date: NaiveDate,
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
    pub snack: Option<String>,
    pub exercise: Option<String>,
}

/// Operations the migrator performs against the hosted platform
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create a pre-confirmed account; `AlreadyExists` when the handle is taken
    async fn create_account(&self, account: &NewAccount) -> Result<Account, BackendError>;

    /// Every existing account
    async fn list_accounts(&self) -> Result<Vec<Account>, BackendError>;

    /// Update the profile row owned by `id`
    async fn update_profile(
        &self,
        id: &IdentityKey,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError>;

    /// Every pre-existing group
    async fn list_groups(&self) -> Result<Vec<Group>, BackendError>;

    /// Insert or replace the task log for (user, date)
    async fn upsert_weekly_log(&self, row: &WeeklyLogRow) -> Result<(), BackendError>;

    /// Insert a feed post and return its new key
    async fn insert_feed(&self, row: &FeedRow) -> Result<FeedKey, BackendError>;

    async fn insert_comment(&self, row: &CommentRow) -> Result<(), BackendError>;

    /// Insert a membership; `AlreadyExists` when the pair is already present
    async fn insert_group_member(&self, row: &GroupMemberRow) -> Result<(), BackendError>;

    async fn insert_group_post(&self, row: &GroupPostRow) -> Result<(), BackendError>;

    /// Insert or replace the diet log for (user, date)
    async fn upsert_diet_log(&self, row: &DietLogRow) -> Result<(), BackendError>;
}
