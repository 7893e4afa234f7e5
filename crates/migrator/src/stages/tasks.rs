use tracing::{debug, error, warn};

use super::{decoded, log_stage_end, log_stage_start};
use crate::backend::{Backend, WeeklyLogContent, WeeklyLogItem, WeeklyLogRow};
use crate::legacy::{LegacyRecord, LegacyTask};
use crate::report::{Stage, StageCounts};
use crate::resolver::ReferenceResolver;

/// Ratings are half-star steps in (0, 5]
const MAX_RATING: f64 = 5.0;

/// Split free-text task content into one item per non-blank line
pub fn task_content(content: &str, category: &str) -> WeeklyLogContent {
    let items = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| WeeklyLogItem {
            category: category.to_string(),
            content: line.to_string(),
        })
        .collect();
    WeeklyLogContent { items }
}

fn checked_rating(task: &LegacyTask) -> Option<f64> {
    let rating = task.rating?;
    if rating > 0.0 && rating <= MAX_RATING {
        Some(rating)
    } else {
        warn!(
            member = %task.member_name,
            date = %task.date,
            "[WARN] Task rating {} out of range; storing none",
            rating
        );
        None
    }
}

/// Upsert one weekly log per (member, date)
pub async fn migrate_tasks(
    backend: &dyn Backend,
    tasks: &[LegacyRecord<LegacyTask>],
    resolver: &ReferenceResolver,
    category: &str,
) -> StageCounts {
    let stage = Stage::Tasks;
    log_stage_start(stage, tasks.len());
    let mut counts = StageCounts::default();

    for record in tasks {
        let Some(task) = decoded(stage, record, &mut counts) else {
            continue;
        };

        let Some(user_id) = resolver.member(&task.member_name) else {
            warn!(
                member = %task.member_name,
                "[SKIP] Task - member not found: {}",
                task.member_name
            );
            counts.record_skip();
            continue;
        };

        let row = WeeklyLogRow {
            user_id,
            date: task.date,
            rating: checked_rating(task),
            content: task_content(&task.content, category),
        };

        match backend.upsert_weekly_log(&row).await {
            Ok(()) => {
                debug!(member = %task.member_name, date = %task.date, "[OK] Task");
                counts.record_success();
            }
            Err(e) => {
                error!(
                    member = %task.member_name,
                    date = %task.date,
                    "[ERROR] Task for {} on {}: {}",
                    task.member_name,
                    task.date,
                    e
                );
                counts.record_failure();
            }
        }
    }

    log_stage_end(stage, &counts);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Table};
    use chrono::NaiveDate;
    use common::IdentityKey;

    fn task(
        member: &str,
        day: u32,
        content: &str,
        rating: Option<f64>,
    ) -> LegacyRecord<LegacyTask> {
        Ok(LegacyTask {
            member_name: member.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            content: content.to_string(),
            rating,
        })
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let content = task_content("Read ch.1\n\nRead ch.2", "study");
        assert_eq!(content.items.len(), 2);
        assert_eq!(content.items[0].content, "Read ch.1");
        assert_eq!(content.items[1].content, "Read ch.2");
        assert!(content.items.iter().all(|item| item.category == "study"));
    }

    #[test]
    fn test_lines_are_kept_verbatim() {
        let content = task_content("  indented \r\n   \r\nlast", "study");
        assert_eq!(content.items.len(), 2);
        assert_eq!(content.items[0].content, "  indented ");
        assert_eq!(content.items[1].content, "last");
    }

    #[tokio::test]
    async fn test_unknown_member_is_skipped() {
        let backend = MemoryBackend::new();
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());

        let tasks = vec![
            task("jin", 1, "a", None),
            task("ghost", 2, "b", None),
            task("jin", 3, "c", Some(4.5)),
        ];
        let counts = migrate_tasks(&backend, &tasks, &resolver, "study").await;

        assert_eq!(counts.succeeded, 2);
        assert_eq!(counts.skipped, 1);
        assert_eq!(backend.weekly_logs().len(), 2);
        assert_eq!(backend.write_attempts(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_dropped() {
        let backend = MemoryBackend::new();
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());

        let tasks = vec![task("jin", 1, "a", Some(7.0)), task("jin", 2, "b", Some(3.5))];
        migrate_tasks(&backend, &tasks, &resolver, "study").await;

        let logs = backend.weekly_logs();
        assert_eq!(logs[0].rating, None);
        assert_eq!(logs[1].rating, Some(3.5));
    }

    #[tokio::test]
    async fn test_half_star_rating_is_kept() {
        let backend = MemoryBackend::new();
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());

        let tasks = vec![
            task("jin", 1, "a", Some(0.5)),
            task("jin", 2, "b", Some(5.0)),
            task("jin", 3, "c", Some(-1.0)),
        ];
        migrate_tasks(&backend, &tasks, &resolver, "study").await;

        let logs = backend.weekly_logs();
        assert_eq!(logs[0].rating, Some(0.5));
        assert_eq!(logs[1].rating, Some(5.0));
        assert_eq!(logs[2].rating, None);
    }

    #[tokio::test]
    async fn test_rejected_write_is_failure() {
        let backend = MemoryBackend::new();
        backend.reject_writes_to(Table::WeeklyLogs);
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());

        let counts =
            migrate_tasks(&backend, &[task("jin", 1, "a", None)], &resolver, "study").await;
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.succeeded, 0);
    }
}
