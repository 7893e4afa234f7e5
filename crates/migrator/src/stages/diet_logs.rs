use tracing::{debug, error, warn};

use super::{decoded, log_stage_end, log_stage_start};
use crate::backend::{Backend, DietLogRow};
use crate::legacy::{LegacyDietLog, LegacyRecord};
use crate::report::{Stage, StageCounts};
use crate::resolver::ReferenceResolver;

/// Upsert one diet log per (member, date); absent meals are written as null
pub async fn migrate_diet_logs(
    backend: &dyn Backend,
    logs: &[LegacyRecord<LegacyDietLog>],
    resolver: &ReferenceResolver,
) -> StageCounts {
    let stage = Stage::DietLogs;
    log_stage_start(stage, logs.len());
    let mut counts = StageCounts::default();

    for record in logs {
        let Some(log) = decoded(stage, record, &mut counts) else {
            continue;
        };

        let Some(user_id) = resolver.member(&log.member_name) else {
            warn!(
                member = %log.member_name,
                "[SKIP] Diet log - member not found: {}",
                log.member_name
            );
            counts.record_skip();
            continue;
        };

        let row = DietLogRow {
            user_id,
            date: log.date,
            breakfast: log.breakfast.clone(),
            lunch: log.lunch.clone(),
            dinner: log.dinner.clone(),
            snack: log.snack.clone(),
            exercise: log.exercise.clone(),
        };

        match backend.upsert_diet_log(&row).await {
            Ok(()) => {
                debug!(member = %log.member_name, date = %log.date, "[OK] Diet log");
                counts.record_success();
            }
            Err(e) => {
                error!(
                    member = %log.member_name,
                    date = %log.date,
                    "[ERROR] Diet log for {} on {}: {}",
                    log.member_name,
                    log.date,
                    e
                );
                counts.record_failure();
            }
        }
    }

    log_stage_end(stage, &counts);
    counts
}
