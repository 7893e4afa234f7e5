//! In-process [`Backend`]
//!
//! Enforces the same uniqueness and reference rules as the hosted schema:
//! one account per email, one weekly/diet log per (user, date), one
//! membership per (group, user), comments only on existing feeds. Tables can
//! be told to reject reads or writes, and every write attempt is counted.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{FeedKey, GroupKey, IdentityKey};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use super::{
    Account, Backend, BackendError, CommentRow, DietLogRow, FeedRow, Group, GroupMemberRow,
    GroupPostRow, NewAccount, ProfileUpdate, Table, WeeklyLogRow,
};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: Vec<Account>,
    profiles: HashMap<IdentityKey, ProfileUpdate>,
    groups: Vec<Group>,
    weekly_logs: HashMap<(IdentityKey, NaiveDate), WeeklyLogRow>,
    feeds: Vec<(FeedKey, FeedRow)>,
    comments: Vec<CommentRow>,
    group_members: Vec<GroupMemberRow>,
    group_posts: Vec<GroupPostRow>,
    diet_logs: HashMap<(IdentityKey, NaiveDate), DietLogRow>,
    rejected_tables: HashSet<Table>,
    unreadable_tables: HashSet<Table>,
    write_attempts: usize,
}

impl MemoryState {
    fn begin_write(&mut self, table: Table) -> Result<(), BackendError> {
        self.write_attempts += 1;
        if self.rejected_tables.contains(&table) {
            return Err(BackendError::rejected(
                table,
                500,
                format!("writes to {table} are rejected"),
            ));
        }
        Ok(())
    }

    fn begin_read(&self, table: Table) -> Result<(), BackendError> {
        if self.unreadable_tables.contains(&table) {
            return Err(BackendError::rejected(
                table,
                403,
                format!("reads of {table} are rejected"),
            ));
        }
        Ok(())
    }
}

/// In-memory backend for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing groups and accounts
    pub fn seeded(groups: Vec<Group>, accounts: Vec<Account>) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock();
            for account in &accounts {
                state.profiles.entry(account.id).or_default();
            }
            state.groups = groups;
            state.accounts = accounts;
        }
        backend
    }

    /// Add a pre-existing group and return its key
    pub fn add_group(&self, name: impl Into<String>) -> GroupKey {
        let id = GroupKey::new();
        self.state.lock().groups.push(Group {
            id,
            name: name.into(),
        });
        id
    }

    /// Make every later write to `table` fail
    pub fn reject_writes_to(&self, table: Table) {
        self.state.lock().rejected_tables.insert(table);
    }

    /// Make every later read of `table` fail
    pub fn reject_reads_of(&self, table: Table) {
        self.state.lock().unreadable_tables.insert(table);
    }

    /// Number of write calls received, successful or not
    pub fn write_attempts(&self) -> usize {
        self.state.lock().write_attempts
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.state.lock().accounts.clone()
    }

    pub fn profile(&self, id: &IdentityKey) -> Option<ProfileUpdate> {
        self.state.lock().profiles.get(id).cloned()
    }

    pub fn weekly_logs(&self) -> Vec<WeeklyLogRow> {
        let mut rows: Vec<_> = self.state.lock().weekly_logs.values().cloned().collect();
        rows.sort_by_key(|row| row.date);
        rows
    }

    pub fn feeds(&self) -> Vec<(FeedKey, FeedRow)> {
        self.state.lock().feeds.clone()
    }

    pub fn comments(&self) -> Vec<CommentRow> {
        self.state.lock().comments.clone()
    }

    pub fn group_members(&self) -> Vec<GroupMemberRow> {
        self.state.lock().group_members.clone()
    }

    pub fn group_posts(&self) -> Vec<GroupPostRow> {
        self.state.lock().group_posts.clone()
    }

    pub fn diet_logs(&self) -> Vec<DietLogRow> {
        let mut rows: Vec<_> = self.state.lock().diet_logs.values().cloned().collect();
        rows.sort_by_key(|row| row.date);
        rows
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn create_account(&self, account: &NewAccount) -> Result<Account, BackendError> {
        let mut state = self.state.lock();
        state.begin_write(Table::Accounts)?;

        if state
            .accounts
            .iter()
            .any(|a| a.email.as_deref() == Some(account.email.as_str()))
        {
            return Err(BackendError::AlreadyExists {
                table: Table::Accounts,
                message: format!("{} is already registered", account.email),
            });
        }

        let created = Account {
            id: IdentityKey::new(),
            email: Some(account.email.clone()),
        };
        state.accounts.push(created.clone());
        state.profiles.insert(created.id, ProfileUpdate::default());
        Ok(created)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, BackendError> {
        let state = self.state.lock();
        state.begin_read(Table::Accounts)?;
        Ok(state.accounts.clone())
    }

    async fn update_profile(
        &self,
        id: &IdentityKey,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.begin_write(Table::Profiles)?;

        match state.profiles.get_mut(id) {
            Some(profile) => {
                *profile = update.clone();
                Ok(())
            }
            None => Err(BackendError::rejected(
                Table::Profiles,
                404,
                format!("no profile row for account {id}"),
            )),
        }
    }

    async fn list_groups(&self) -> Result<Vec<Group>, BackendError> {
        let state = self.state.lock();
        state.begin_read(Table::Groups)?;
        Ok(state.groups.clone())
    }

    async fn upsert_weekly_log(&self, row: &WeeklyLogRow) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.begin_write(Table::WeeklyLogs)?;
        state
            .weekly_logs
            .insert((row.user_id, row.date), row.clone());
        Ok(())
    }

    async fn insert_feed(&self, row: &FeedRow) -> Result<FeedKey, BackendError> {
        let mut state = self.state.lock();
        state.begin_write(Table::Feeds)?;
        let id = FeedKey::new();
        state.feeds.push((id, row.clone()));
        Ok(id)
    }

    async fn insert_comment(&self, row: &CommentRow) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.begin_write(Table::Comments)?;

        if !state.feeds.iter().any(|(id, _)| *id == row.feed_id) {
            return Err(BackendError::Rejected {
                table: Table::Comments,
                status: 409,
                code: Some("23503".to_string()),
                message: format!("feed {} does not exist", row.feed_id),
            });
        }
        state.comments.push(row.clone());
        Ok(())
    }

    async fn insert_group_member(&self, row: &GroupMemberRow) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.begin_write(Table::GroupMembers)?;

        if state
            .group_members
            .iter()
            .any(|m| m.group_id == row.group_id && m.user_id == row.user_id)
        {
            return Err(BackendError::AlreadyExists {
                table: Table::GroupMembers,
                message: format!("{} is already a member of {}", row.user_id, row.group_id),
            });
        }
        state.group_members.push(row.clone());
        Ok(())
    }

    async fn insert_group_post(&self, row: &GroupPostRow) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.begin_write(Table::GroupPosts)?;
        state.group_posts.push(row.clone());
        Ok(())
    }

    async fn upsert_diet_log(&self, row: &DietLogRow) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.begin_write(Table::DietLogs)?;
        state.diet_logs.insert((row.user_id, row.date), row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AccountMetadata;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password: "correct-horse-battery".to_string(),
            email_confirm: true,
            user_metadata: AccountMetadata {
                name: email.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_duplicate_account_is_conflict() {
        let backend = MemoryBackend::new();
        backend
            .create_account(&new_account("jin@bonesquad.temp"))
            .await
            .unwrap();

        let err = backend
            .create_account(&new_account("jin@bonesquad.temp"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(backend.accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_weekly_log_upsert_replaces() {
        let backend = MemoryBackend::new();
        let user_id = IdentityKey::new();
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        for rating in [Some(2.0), Some(4.5)] {
            backend
                .upsert_weekly_log(&WeeklyLogRow {
                    user_id,
                    date,
                    rating,
                    content: Default::default(),
                })
                .await
                .unwrap();
        }

        let logs = backend.weekly_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].rating, Some(4.5));
        assert_eq!(backend.write_attempts(), 2);
    }

    #[tokio::test]
    async fn test_rejected_table_fails_writes() {
        let backend = MemoryBackend::new();
        backend.reject_writes_to(Table::GroupPosts);

        let err = backend
            .insert_group_post(&GroupPostRow {
                group_id: GroupKey::new(),
                user_id: IdentityKey::new(),
                content: "hello".to_string(),
                created_at: chrono::Utc::now().fixed_offset(),
            })
            .await
            .unwrap_err();
        assert!(!err.is_conflict());
        assert!(backend.group_posts().is_empty());
    }

    #[tokio::test]
    async fn test_profile_update_requires_account() {
        let backend = MemoryBackend::new();
        let err = backend
            .update_profile(&IdentityKey::new(), &ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 404, .. }));
    }
}
