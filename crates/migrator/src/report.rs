//! Per-stage outcome counters and the final operator report

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Migration stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Members,
    Tasks,
    Feeds,
    Comments,
    GroupMembers,
    GroupPosts,
    DietLogs,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Members,
        Stage::Tasks,
        Stage::Feeds,
        Stage::Comments,
        Stage::GroupMembers,
        Stage::GroupPosts,
        Stage::DietLogs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Members => "members",
            Stage::Tasks => "tasks",
            Stage::Feeds => "feeds",
            Stage::Comments => "comments",
            Stage::GroupMembers => "group members",
            Stage::GroupPosts => "group posts",
            Stage::DietLogs => "diet logs",
        }
    }

    /// Singular noun used in per-record log lines
    pub fn record_noun(&self) -> &'static str {
        match self {
            Stage::Members => "Member",
            Stage::Tasks => "Task",
            Stage::Feeds => "Feed",
            Stage::Comments => "Comment",
            Stage::GroupMembers => "Group member",
            Stage::GroupPosts => "Group post",
            Stage::DietLogs => "Diet log",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome counters for one stage
///
/// `tolerated` counts writes the backend refused as already present and that
/// were accepted as successes; they are included in `succeeded`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub tolerated: usize,
}

impl StageCounts {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_tolerated(&mut self) {
        self.succeeded += 1;
        self.tolerated += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Records seen by the stage
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

impl std::ops::AddAssign for StageCounts {
    fn add_assign(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.tolerated += other.tolerated;
    }
}

/// How a member's identity was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountOutcome {
    Created,
    Reused,
}

/// A member with a usable identity, for credential hand-off
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedAccount {
    pub name: String,
    pub handle: String,
    pub outcome: AccountOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub counts: StageCounts,
}

/// Everything the operator needs after a run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub groups_loaded: usize,
    pub stages: Vec<StageSummary>,
    pub accounts: Vec<ProvisionedAccount>,
}

impl MigrationReport {
    pub fn counts(&self, stage: Stage) -> Option<StageCounts> {
        self.stages
            .iter()
            .find(|summary| summary.stage == stage)
            .map(|summary| summary.counts)
    }

    pub fn totals(&self) -> StageCounts {
        let mut totals = StageCounts::default();
        for summary in &self.stages {
            totals += summary.counts;
        }
        totals
    }

    pub fn created_accounts(&self) -> impl Iterator<Item = &ProvisionedAccount> {
        self.accounts
            .iter()
            .filter(|account| account.outcome == AccountOutcome::Created)
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body).map_err(|source| Error::Report {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        if self.dry_run {
            writeln!(f, "Migration rehearsal complete (dry run, nothing written)")?;
        } else {
            writeln!(f, "Migration complete")?;
        }
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "Duration: {}s, groups loaded: {}",
            (self.finished_at - self.started_at).num_seconds(),
            self.groups_loaded
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<14} {:>8} {:>8} {:>8} {:>10}",
            "stage", "ok", "skip", "error", "duplicate"
        )?;
        for summary in &self.stages {
            let c = summary.counts;
            writeln!(
                f,
                "{:<14} {:>8} {:>8} {:>8} {:>10}",
                summary.stage.label(),
                c.succeeded,
                c.skipped,
                c.failed,
                c.tolerated
            )?;
        }
        let t = self.totals();
        writeln!(
            f,
            "{:<14} {:>8} {:>8} {:>8} {:>10}",
            "total", t.succeeded, t.skipped, t.failed, t.tolerated
        )?;

        writeln!(f)?;
        if self.accounts.is_empty() {
            writeln!(f, "No accounts were provisioned.")?;
        } else {
            writeln!(f, "Temporary accounts (ask users to reset their passwords):")?;
            for account in &self.accounts {
                let note = match account.outcome {
                    AccountOutcome::Created => "",
                    AccountOutcome::Reused => " (existing)",
                };
                writeln!(f, "  {}: {}{}", account.name, account.handle, note)?;
            }
        }
        Ok(())
    }
}
