use tracing::{debug, error, info, warn};

use super::{decoded, log_stage_end, log_stage_start};
use crate::backend::{Backend, GroupMemberRow};
use crate::legacy::{LegacyGroupMember, LegacyRecord};
use crate::report::{Stage, StageCounts};
use crate::resolver::ReferenceResolver;

/// Insert memberships; an already-present membership counts as success
pub async fn migrate_group_members(
    backend: &dyn Backend,
    memberships: &[LegacyRecord<LegacyGroupMember>],
    resolver: &ReferenceResolver,
) -> StageCounts {
    let stage = Stage::GroupMembers;
    log_stage_start(stage, memberships.len());
    let mut counts = StageCounts::default();

    for record in memberships {
        let Some(membership) = decoded(stage, record, &mut counts) else {
            continue;
        };

        let Some(user_id) = resolver.member(&membership.member_name) else {
            warn!(
                member = %membership.member_name,
                group = %membership.group,
                "[SKIP] Group member - member not found: {}",
                membership.member_name
            );
            counts.record_skip();
            continue;
        };

        let Some(group_id) = resolver.group(&membership.group) else {
            warn!(
                member = %membership.member_name,
                group = %membership.group,
                "[SKIP] Group member - group not found: {}",
                membership.group
            );
            counts.record_skip();
            continue;
        };

        let row = GroupMemberRow {
            group_id,
            user_id,
            joined_at: membership.joined_at,
        };

        match backend.insert_group_member(&row).await {
            Ok(()) => {
                debug!(
                    member = %membership.member_name,
                    group = %membership.group,
                    "[OK] Group member"
                );
                counts.record_success();
            }
            Err(e) if e.is_conflict() => {
                info!(
                    member = %membership.member_name,
                    group = %membership.group,
                    "[OK] {} already a member of {}",
                    membership.member_name,
                    membership.group
                );
                counts.record_tolerated();
            }
            Err(e) => {
                error!(
                    member = %membership.member_name,
                    group = %membership.group,
                    "[ERROR] Group member {} in {}: {}",
                    membership.member_name,
                    membership.group,
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

    fn membership(group: &str, member: &str) -> LegacyRecord<LegacyGroupMember> {
        Ok(LegacyGroupMember {
            group: group.to_string(),
            member_name: member.to_string(),
            joined_at: Utc::now().fixed_offset(),
        })
    }

    #[tokio::test]
    async fn test_duplicate_membership_is_tolerated() {
        let backend = MemoryBackend::new();
        let group = backend.add_group("diet");
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());
        resolver.register_groups(backend.list_groups().await.unwrap());

        let counts = migrate_group_members(
            &backend,
            &[membership("diet", "jin"), membership("diet", "jin")],
            &resolver,
        )
        .await;

        assert_eq!(counts.succeeded, 2);
        assert_eq!(counts.tolerated, 1);
        assert_eq!(counts.failed, 0);
        let rows = backend.group_members();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].group_id, group);
    }

    #[tokio::test]
    async fn test_unknown_group_is_skipped() {
        let backend = MemoryBackend::new();
        let mut resolver = ReferenceResolver::new();
        resolver.register_member("jin", IdentityKey::new());

        let counts =
            migrate_group_members(&backend, &[membership("reading", "jin")], &resolver).await;
        assert_eq!(counts.skipped, 1);
        assert_eq!(backend.write_attempts(), 0);
    }
}
