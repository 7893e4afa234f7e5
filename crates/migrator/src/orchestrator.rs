//! Migration pipeline
//!
//! Runs every stage in dependency order over one snapshot. Each stage reads
//! the resolver tables filled by the stages before it:
//!
//! ```text
//! fetch → groups → members → tasks → feeds → comments
//!       → group members → group posts → diet logs → report
//! ```
//!
//! The resolver is created here and lives for exactly one run.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::backend::{Backend, MemoryBackend};
use crate::config::Config;
use crate::error::Result;
use crate::identity::IdentityProvisioner;
use crate::legacy::Snapshot;
use crate::report::{MigrationReport, Stage, StageCounts, StageSummary};
use crate::resolver::ReferenceResolver;
use crate::snapshot::SnapshotFetcher;
use crate::stages;

pub struct Migrator<'a> {
    backend: &'a dyn Backend,
    config: &'a Config,
    dry_run: bool,
}

impl<'a> Migrator<'a> {
    pub fn new(backend: &'a dyn Backend, config: &'a Config) -> Self {
        Self {
            backend,
            config,
            dry_run: false,
        }
    }

    /// Mark the report as a rehearsal
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Fetch the snapshot, then migrate it
    ///
    /// A failed fetch returns before any backend call.
    pub async fn run(&self, fetcher: &SnapshotFetcher) -> Result<MigrationReport> {
        let snapshot = fetcher.fetch().await?;
        Ok(self.migrate(&snapshot).await)
    }

    /// Migrate an already fetched snapshot
    pub async fn migrate(&self, snapshot: &Snapshot) -> MigrationReport {
        let started_at = Utc::now();
        let mut resolver = ReferenceResolver::new();
        let mut summaries = Vec::with_capacity(Stage::ALL.len());

        let groups_loaded = self.load_groups(&mut resolver).await;

        let provisioning =
            IdentityProvisioner::new(self.backend, &self.config.identity, &self.config.avatar)
                .provision_all(&snapshot.members, &mut resolver)
                .await;
        summaries.push(summary(Stage::Members, provisioning.counts));

        let counts = stages::migrate_tasks(
            self.backend,
            &snapshot.tasks,
            &resolver,
            &self.config.migration.task_category,
        )
        .await;
        summaries.push(summary(Stage::Tasks, counts));

        let counts = stages::migrate_feeds(self.backend, &snapshot.feeds, &mut resolver).await;
        summaries.push(summary(Stage::Feeds, counts));

        let counts = stages::migrate_comments(self.backend, &snapshot.comments, &resolver).await;
        summaries.push(summary(Stage::Comments, counts));

        let counts =
            stages::migrate_group_members(self.backend, &snapshot.group_members, &resolver).await;
        summaries.push(summary(Stage::GroupMembers, counts));

        let counts =
            stages::migrate_group_posts(self.backend, &snapshot.group_posts, &resolver).await;
        summaries.push(summary(Stage::GroupPosts, counts));

        let counts = stages::migrate_diet_logs(self.backend, &snapshot.diet_logs, &resolver).await;
        summaries.push(summary(Stage::DietLogs, counts));

        info!("Migration complete");
        MigrationReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.dry_run,
            groups_loaded,
            stages: summaries,
            accounts: provisioning.accounts,
        }
    }

    /// Register existing groups; a failed read leaves the table empty
    async fn load_groups(&self, resolver: &mut ReferenceResolver) -> usize {
        info!("Loading groups...");
        match self.backend.list_groups().await {
            Ok(groups) => {
                resolver.register_groups(groups);
                let loaded = resolver.group_count();
                info!("Loaded {} groups", loaded);
                loaded
            }
            Err(e) => {
                error!("Failed to load groups: {}", e);
                warn!("[WARN] Every group reference will be skipped");
                0
            }
        }
    }
}

fn summary(stage: Stage, counts: StageCounts) -> StageSummary {
    StageSummary { stage, counts }
}

/// In-memory copy of the remote groups and accounts for a dry run
pub async fn rehearsal_backend(remote: &dyn Backend) -> Result<MemoryBackend> {
    let groups = remote.list_groups().await?;
    let accounts = remote.list_accounts().await?;
    info!(
        groups = groups.len(),
        accounts = accounts.len(),
        "Seeded dry-run backend from remote state"
    );
    Ok(MemoryBackend::seeded(groups, accounts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Table;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        Snapshot::from_value(json!({
            "members": [{ "name": "jin" }, { "name": "mina" }],
            "tasks": [{ "memberName": "jin", "date": "2024-01-02", "content": "read\nwrite", "rating": 4 }],
            "feeds": [{ "id": "1", "memberName": "mina", "content": "hi", "timestamp": "2024-01-02T10:00:00Z" }],
            "comments": [{ "feedId": "1", "memberName": "jin", "content": "hey", "timestamp": "2024-01-02T11:00:00Z" }],
            "groupMembers": [{ "group": "diet", "memberName": "mina", "joinedAt": "2024-01-01" }],
            "groupPosts": [{ "group": "diet", "memberName": "mina", "content": "day 1", "timestamp": "2024-01-02" }],
            "dietLogs": [{ "memberName": "mina", "date": "2024-01-02", "breakfast": "oats" }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_full_pipeline_in_order() {
        let backend = MemoryBackend::new();
        backend.add_group("diet");
        let config = Config::default();

        let report = Migrator::new(&backend, &config).migrate(&snapshot()).await;

        assert_eq!(report.groups_loaded, 1);
        for stage in Stage::ALL {
            let counts = report.counts(stage).unwrap();
            assert!(counts.succeeded >= 1, "{stage}");
            assert_eq!(counts.failed, 0, "{stage}");
            assert_eq!(counts.skipped, 0, "{stage}");
        }
        assert_eq!(report.counts(Stage::Members).unwrap().succeeded, 2);
        assert_eq!(backend.comments().len(), 1);
        assert_eq!(report.accounts.len(), 2);
    }

    #[tokio::test]
    async fn test_group_load_failure_is_not_fatal() {
        let backend = MemoryBackend::new();
        backend.add_group("diet");
        backend.reject_reads_of(Table::Groups);
        let config = Config::default();

        let report = Migrator::new(&backend, &config).migrate(&snapshot()).await;

        assert_eq!(report.groups_loaded, 0);
        assert_eq!(report.counts(Stage::GroupMembers).unwrap().skipped, 1);
        assert_eq!(report.counts(Stage::GroupPosts).unwrap().skipped, 1);
        assert_eq!(report.counts(Stage::DietLogs).unwrap().succeeded, 1);
    }

    #[tokio::test]
    async fn test_rehearsal_backend_copies_remote_state() {
        let remote = MemoryBackend::new();
        remote.add_group("diet");
        let config = Config::default();
        Migrator::new(&remote, &config)
            .migrate(&Snapshot::from_value(json!({ "members": [{ "name": "jin" }] })).unwrap())
            .await;
        let writes_before = remote.write_attempts();

        let rehearsal = rehearsal_backend(&remote).await.unwrap();
        let report = Migrator::new(&rehearsal, &config)
            .dry_run(true)
            .migrate(&snapshot())
            .await;

        assert!(report.dry_run);
        assert_eq!(remote.write_attempts(), writes_before);
        assert_eq!(report.groups_loaded, 1);
        let members = report.counts(Stage::Members).unwrap();
        assert_eq!(members.skipped, 1);
        assert_eq!(members.succeeded, 1);
    }
}
