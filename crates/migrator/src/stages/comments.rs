use tracing::{debug, error, warn};

use super::{decoded, log_stage_end, log_stage_start};
use crate::backend::{Backend, CommentRow};
use crate::legacy::{LegacyComment, LegacyRecord};
use crate::report::{Stage, StageCounts};
use crate::resolver::ReferenceResolver;

/// Insert comments whose author and feed post both resolve
pub async fn migrate_comments(
    backend: &dyn Backend,
    comments: &[LegacyRecord<LegacyComment>],
    resolver: &ReferenceResolver,
) -> StageCounts {
    let stage = Stage::Comments;
    log_stage_start(stage, comments.len());
    let mut counts = StageCounts::default();

    for record in comments {
        let Some(comment) = decoded(stage, record, &mut counts) else {
            continue;
        };

        let Some(user_id) = resolver.member(&comment.member_name) else {
            warn!(
                member = %comment.member_name,
                "[SKIP] Comment - member not found: {}",
                comment.member_name
            );
            counts.record_skip();
            continue;
        };

        let Some(feed_id) = resolver.feed(&comment.feed_id) else {
            warn!(
                legacy_id = %comment.feed_id,
                "[SKIP] Comment - feed not found: {}",
                comment.feed_id
            );
            counts.record_skip();
            continue;
        };

        let row = CommentRow {
            feed_id,
            user_id,
            content: comment.content.clone(),
            created_at: comment.timestamp,
        };

        match backend.insert_comment(&row).await {
            Ok(()) => {
                debug!(member = %comment.member_name, legacy_id = %comment.feed_id, "[OK] Comment");
                counts.record_success();
            }
            Err(e) => {
                error!(
                    member = %comment.member_name,
                    legacy_id = %comment.feed_id,
                    "[ERROR] Comment by {}: {}",
                    comment.member_name,
                    e
                );
                counts.record_failure();
            }
        }
    }

    log_stage_end(stage, &counts);
    counts
}
