use tracing::{debug, error, warn};

use super::{decoded, log_stage_end, log_stage_start};
use crate::backend::{Backend, FeedRow};
use crate::legacy::{LegacyFeed, LegacyRecord};
use crate::report::{Stage, StageCounts};
use crate::resolver::ReferenceResolver;

/// Insert feed posts and record each legacy id → new key mapping
pub async fn migrate_feeds(
    backend: &dyn Backend,
    feeds: &[LegacyRecord<LegacyFeed>],
    resolver: &mut ReferenceResolver,
) -> StageCounts {
    let stage = Stage::Feeds;
    log_stage_start(stage, feeds.len());
    let mut counts = StageCounts::default();

    for record in feeds {
        let Some(feed) = decoded(stage, record, &mut counts) else {
            continue;
        };

        let Some(user_id) = resolver.member(&feed.member_name) else {
            warn!(
                member = %feed.member_name,
                legacy_id = %feed.id,
                "[SKIP] Feed - member not found: {}",
                feed.member_name
            );
            counts.record_skip();
            continue;
        };

        let row = FeedRow {
            user_id,
            content: feed.content.clone(),
            image_url: feed.image_url.clone(),
            created_at: feed.timestamp,
        };

        match backend.insert_feed(&row).await {
            Ok(key) => {
                if resolver.feed(&feed.id).is_some() {
                    warn!(
                        legacy_id = %feed.id,
                        "[WARN] Legacy feed id {} appears more than once; comments will attach to the latest",
                        feed.id
                    );
                }
                resolver.register_feed(feed.id.clone(), key);
                debug!(legacy_id = %feed.id, feed = %key, "[OK] Feed");
                counts.record_success();
            }
            Err(e) => {
                error!(
                    member = %feed.member_name,
                    legacy_id = %feed.id,
                    "[ERROR] Feed by {}: {}",
                    feed.member_name,
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
    use chrono::{TimeZone, Utc};
    use common::IdentityKey;

    fn feed(id: &str, member: &str) -> LegacyRecord<LegacyFeed> {
        Ok(LegacyFeed {
            id: id.to_string(),
            member_name: member.to_string(),
            content: format!("post {id}"),
            image_url: None,
            timestamp: Utc
                .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
                .unwrap()
                .fixed_offset(),
        })
    }

    #[tokio::test]
    async fn test_feed_map_is_recorded() {
        let backend = MemoryBackend::new();
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());

        let counts = migrate_feeds(
            &backend,
            &[feed("10", "jin"), feed("11", "ghost")],
            &mut resolver,
        )
        .await;

        assert_eq!(counts.succeeded, 1);
        assert_eq!(counts.skipped, 1);
        let stored = backend.feeds();
        assert_eq!(resolver.feed("10"), Some(stored[0].0));
        assert_eq!(resolver.feed("11"), None);
        assert_eq!(
            stored[0].1.created_at.to_rfc3339(),
            "2024-05-01T09:30:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_failed_feed_is_not_mapped() {
        let backend = MemoryBackend::new();
        backend.reject_writes_to(Table::Feeds);
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());

        let counts = migrate_feeds(&backend, &[feed("10", "jin")], &mut resolver).await;
        assert_eq!(counts.failed, 1);
        assert_eq!(resolver.feed_count(), 0);
    }
}
