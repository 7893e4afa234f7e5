use tracing::{debug, error, warn};

use super::{decoded, log_stage_end, log_stage_start};
use crate::backend::{Backend, GroupPostRow};
use crate::legacy::{LegacyGroupPost, LegacyRecord};
use crate::report::{Stage, StageCounts};
use crate::resolver::ReferenceResolver;

pub async fn migrate_group_posts(
    backend: &dyn Backend,
    posts: &[LegacyRecord<LegacyGroupPost>],
    resolver: &ReferenceResolver,
) -> StageCounts {
    let stage = Stage::GroupPosts;
    log_stage_start(stage, posts.len());
    let mut counts = StageCounts::default();

    for record in posts {
        let Some(post) = decoded(stage, record, &mut counts) else {
            continue;
        };

        let (Some(user_id), Some(group_id)) =
            (resolver.member(&post.member_name), resolver.group(&post.group))
        else {
            warn!(
                member = %post.member_name,
                group = %post.group,
                "[SKIP] Group post - member or group not found: {} / {}",
                post.member_name,
                post.group
            );
            counts.record_skip();
            continue;
        };

        let row = GroupPostRow {
            group_id,
            user_id,
            content: post.content.clone(),
            created_at: post.timestamp,
        };

        match backend.insert_group_post(&row).await {
            Ok(()) => {
                debug!(member = %post.member_name, group = %post.group, "[OK] Group post");
                counts.record_success();
            }
            Err(e) => {
                error!(
                    member = %post.member_name,
                    group = %post.group,
                    "[ERROR] Group post by {}: {}",
                    post.member_name,
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
    use crate::backend::MemoryBackend;
    use chrono::Utc;
    use common::IdentityKey;

    #[tokio::test]
    async fn test_post_requires_member_and_group() {
        let backend = MemoryBackend::new();
        backend.add_group("diet");
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());
        resolver.register_groups(backend.list_groups().await.unwrap());

        let post = |group: &str, member: &str| -> LegacyRecord<LegacyGroupPost> {
            Ok(LegacyGroupPost {
                group: group.to_string(),
                member_name: member.to_string(),
                content: "weekly check-in".to_string(),
                timestamp: Utc::now().fixed_offset(),
            })
        };

        let counts = migrate_group_posts(
            &backend,
            &[post("diet", "jin"), post("diet", "ghost"), post("gym", "jin")],
            &resolver,
        )
        .await;

        assert_eq!(counts.succeeded, 1);
        assert_eq!(counts.skipped, 2);
        assert_eq!(backend.group_posts().len(), 1);
    }
}
