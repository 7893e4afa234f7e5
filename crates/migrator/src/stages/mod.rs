//! Entity migration stages
//!
//! One function per legacy collection. Each walks its records in order,
//! resolves references through the [`ReferenceResolver`], writes through the
//! [`Backend`](crate::backend::Backend) and returns the stage's
//! [`StageCounts`]. A record never aborts its stage: invalid rows and
//! unresolved references are skips, rejected writes are failures.

mod comments;
mod diet_logs;
mod feeds;
mod group_members;
mod group_posts;
mod tasks;

pub use comments::migrate_comments;
pub use diet_logs::migrate_diet_logs;
pub use feeds::migrate_feeds;
pub use group_members::migrate_group_members;
pub use group_posts::migrate_group_posts;
pub use tasks::{migrate_tasks, task_content};

use tracing::{info, warn};

use crate::legacy::LegacyRecord;
use crate::report::{Stage, StageCounts};

/// Pass through a decoded record, or count the invalid row as a skip
fn decoded<'r, T>(
    stage: Stage,
    record: &'r LegacyRecord<T>,
    counts: &mut StageCounts,
) -> Option<&'r T> {
    match record {
        Ok(record) => Some(record),
        Err(invalid) => {
            warn!("[SKIP] {} - invalid record {}", stage.record_noun(), invalid);
            counts.record_skip();
            None
        }
    }
}

fn log_stage_start(stage: Stage, total: usize) {
    info!("Migrating {} {}...", total, stage.label());
}

fn log_stage_end(stage: Stage, counts: &StageCounts) {
    info!(
        stage = stage.label(),
        succeeded = counts.succeeded,
        skipped = counts.skipped,
        failed = counts.failed,
        "{} migration: {} success, {} skipped, {} failed",
        stage.record_noun(),
        counts.succeeded,
        counts.skipped,
        counts.failed
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::InvalidRecord;

    #[test]
    fn test_invalid_record_is_skipped() {
        let mut counts = StageCounts::default();
        let record: LegacyRecord<u32> = Err(InvalidRecord {
            index: 3,
            member_name: Some("jin".to_string()),
            reason: "missing field `date`".to_string(),
        });

        assert!(decoded(Stage::Tasks, &record, &mut counts).is_none());
        assert_eq!(counts.skipped, 1);

        let record: LegacyRecord<u32> = Ok(7);
        assert_eq!(decoded(Stage::Tasks, &record, &mut counts), Some(&7));
        assert_eq!(counts.total(), 1);
    }
}
