//! Identity provisioning
//!
//! Every legacy member becomes a pre-confirmed backend account with a
//! synthetic login handle derived from the display name. Provisioning is
//! idempotent: when the handle is already registered the existing account is
//! reused instead. Either way the member name lands in the resolver's member
//! table, which every later stage reads.

use common::IdentityKey;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::avatar::resolve_avatar;
use crate::backend::{
    AccountMetadata, Backend, BackendError, NewAccount, ProfileUpdate, Table,
};
use crate::config::{AvatarConfig, IdentityConfig};
use crate::legacy::{LegacyMember, LegacyRecord};
use crate::report::{AccountOutcome, ProvisionedAccount, StageCounts};
use crate::resolver::ReferenceResolver;

/// Derive the login handle for a display name
///
/// All whitespace is removed and the rest lowercased, so `"Jin Park"` and
/// `"jinpark"` share a handle.
pub fn login_handle(name: &str, domain: &str) -> String {
    let local: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    format!("{local}@{domain}")
}

/// Random one-time secret for a new account
pub fn generate_secret(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Result of provisioning every member
#[derive(Debug, Default)]
pub struct ProvisioningSummary {
    pub counts: StageCounts,
    pub accounts: Vec<ProvisionedAccount>,
}

pub struct IdentityProvisioner<'a> {
    backend: &'a dyn Backend,
    identity: &'a IdentityConfig,
    avatar: &'a AvatarConfig,
    /// Existing accounts by lowercased handle, loaded on first conflict
    directory: Option<HashMap<String, IdentityKey>>,
    /// Handles claimed during this run, with the member that claimed them
    claimed: HashMap<String, String>,
}

impl<'a> IdentityProvisioner<'a> {
    pub fn new(
        backend: &'a dyn Backend,
        identity: &'a IdentityConfig,
        avatar: &'a AvatarConfig,
    ) -> Self {
        Self {
            backend,
            identity,
            avatar,
            directory: None,
            claimed: HashMap::new(),
        }
    }

    /// Provision every member in order, registering each obtained identity
    pub async fn provision_all(
        &mut self,
        members: &[LegacyRecord<LegacyMember>],
        resolver: &mut ReferenceResolver,
    ) -> ProvisioningSummary {
        info!("Migrating {} members...", members.len());
        let mut summary = ProvisioningSummary::default();

        for record in members {
            let member = match record {
                Ok(member) => member,
                Err(invalid) => {
                    warn!("[SKIP] Member {}", invalid);
                    summary.counts.record_skip();
                    continue;
                }
            };

            let handle = login_handle(&member.name, &self.identity.handle_domain);
            match self.provision(member, &handle).await {
                Ok((key, outcome)) => {
                    resolver.register_member(member.name.clone(), key);
                    match outcome {
                        AccountOutcome::Created => summary.counts.record_success(),
                        AccountOutcome::Reused => summary.counts.record_skip(),
                    }
                    summary.accounts.push(ProvisionedAccount {
                        name: member.name.clone(),
                        handle,
                        outcome,
                    });
                }
                Err(e) => {
                    error!(member = %member.name, "[ERROR] {}: {}", member.name, e);
                    summary.counts.record_failure();
                }
            }
        }

        info!(
            "Member migration complete. Mapped {} members.",
            resolver.member_count()
        );
        summary
    }

    async fn provision(
        &mut self,
        member: &LegacyMember,
        handle: &str,
    ) -> Result<(IdentityKey, AccountOutcome), BackendError> {
        if let Some(previous) = self.claimed.get(handle) {
            if previous != &member.name {
                warn!(
                    member = %member.name,
                    "[WARN] {} shares login handle {} with {}; reusing that account",
                    member.name,
                    handle,
                    previous
                );
            }
        }

        let request = NewAccount {
            email: handle.to_string(),
            password: generate_secret(self.identity.secret_length),
            email_confirm: true,
            user_metadata: AccountMetadata {
                name: member.name.clone(),
            },
        };

        match self.backend.create_account(&request).await {
            Ok(account) => {
                self.remember(handle, account.id, &member.name);
                self.enrich_profile(member, &account.id).await;
                info!(member = %member.name, "[OK] {}", member.name);
                Ok((account.id, AccountOutcome::Created))
            }
            Err(e) if e.is_conflict() => {
                debug!("{} is already registered: {}", handle, e);
                let key = self.lookup(handle).await?.ok_or_else(|| {
                    BackendError::InvalidResponse {
                        table: Table::Accounts,
                        details: format!("{handle} is registered but not listed"),
                    }
                })?;
                self.remember(handle, key, &member.name);
                info!(member = %member.name, "[SKIP] {} - already exists", member.name);
                Ok((key, AccountOutcome::Reused))
            }
            Err(e) => Err(e),
        }
    }

    fn remember(&mut self, handle: &str, key: IdentityKey, name: &str) {
        if let Some(directory) = self.directory.as_mut() {
            directory.insert(handle.to_lowercase(), key);
        }
        self.claimed
            .entry(handle.to_string())
            .or_insert_with(|| name.to_string());
    }

    /// Find an existing account by handle, reloading the directory on a miss
    async fn lookup(&mut self, handle: &str) -> Result<Option<IdentityKey>, BackendError> {
        let wanted = handle.to_lowercase();
        if let Some(key) = self.directory.as_ref().and_then(|d| d.get(&wanted)) {
            return Ok(Some(*key));
        }

        let accounts = self.backend.list_accounts().await?;
        debug!("Loaded {} existing accounts", accounts.len());
        let directory: HashMap<String, IdentityKey> = accounts
            .into_iter()
            .filter_map(|account| account.email.map(|email| (email.to_lowercase(), account.id)))
            .collect();
        let found = directory.get(&wanted).copied();
        self.directory = Some(directory);
        Ok(found)
    }

    /// Best-effort profile update after a fresh account
    async fn enrich_profile(&self, member: &LegacyMember, id: &IdentityKey) {
        let update = self.profile_update(member);
        if let Err(e) = self.backend.update_profile(id, &update).await {
            warn!(
                member = %member.name,
                "[WARN] Profile update failed for {}: {}",
                member.name,
                e
            );
        }
    }

    fn profile_update(&self, member: &LegacyMember) -> ProfileUpdate {
        if !self.avatar.fill_missing {
            return ProfileUpdate {
                bio: member.bio.clone(),
                avatar_url: member.avatar.clone(),
                avatar_style: None,
            };
        }

        ProfileUpdate {
            bio: member.bio.clone(),
            avatar_url: Some(resolve_avatar(
                member.avatar.as_deref(),
                &member.name,
                self.avatar.style,
                self.avatar.size,
            )),
            avatar_style: member.avatar.is_none().then_some(self.avatar.style),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::AvatarStyle;
    use crate::backend::MemoryBackend;
    use crate::legacy::InvalidRecord;

    fn member(name: &str) -> LegacyRecord<LegacyMember> {
        Ok(LegacyMember {
            name: name.to_string(),
            bio: None,
            avatar: None,
        })
    }

    #[test]
    fn test_login_handle_strips_whitespace() {
        assert_eq!(
            login_handle("Jin  Park\t", "bonesquad.temp"),
            "jinpark@bonesquad.temp"
        );
        assert_eq!(login_handle("김철수", "example.org"), "김철수@example.org");
    }

    #[test]
    fn test_generate_secret() {
        let secret = generate_secret(24);
        assert_eq!(secret.len(), 24);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(secret, generate_secret(24));
    }

    #[tokio::test]
    async fn test_second_run_reuses_every_identity() {
        let backend = MemoryBackend::new();
        let identity = IdentityConfig::default();
        let avatar = AvatarConfig::default();
        let members = vec![member("Jin Park"), member("mina")];

        let mut first_resolver = ReferenceResolver::new();
        let first = IdentityProvisioner::new(&backend, &identity, &avatar)
            .provision_all(&members, &mut first_resolver)
            .await;
        assert_eq!(first.counts.succeeded, 2);

        let mut second_resolver = ReferenceResolver::new();
        let second = IdentityProvisioner::new(&backend, &identity, &avatar)
            .provision_all(&members, &mut second_resolver)
            .await;

        assert_eq!(second.counts.succeeded, 0);
        assert_eq!(second.counts.skipped, 2);
        assert_eq!(second.counts.failed, 0);
        assert_eq!(backend.accounts().len(), 2);
        assert_eq!(
            first_resolver.member("Jin Park"),
            second_resolver.member("Jin Park")
        );
        assert!(second
            .accounts
            .iter()
            .all(|a| a.outcome == AccountOutcome::Reused));
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_member() {
        let backend = MemoryBackend::new();
        backend.reject_writes_to(Table::Profiles);
        let identity = IdentityConfig::default();
        let avatar = AvatarConfig::default();

        let mut resolver = ReferenceResolver::new();
        let summary = IdentityProvisioner::new(&backend, &identity, &avatar)
            .provision_all(&[member("jin")], &mut resolver)
            .await;

        assert_eq!(summary.counts.succeeded, 1);
        assert_eq!(summary.counts.failed, 0);
        assert!(resolver.member("jin").is_some());
    }

    #[tokio::test]
    async fn test_failed_account_is_not_registered() {
        let backend = MemoryBackend::new();
        backend.reject_writes_to(Table::Accounts);
        let identity = IdentityConfig::default();
        let avatar = AvatarConfig::default();

        let mut resolver = ReferenceResolver::new();
        let members = vec![
            member("jin"),
            Err(InvalidRecord {
                index: 1,
                member_name: None,
                reason: "missing field `name`".to_string(),
            }),
        ];
        let summary = IdentityProvisioner::new(&backend, &identity, &avatar)
            .provision_all(&members, &mut resolver)
            .await;

        assert_eq!(summary.counts.failed, 1);
        assert_eq!(summary.counts.skipped, 1);
        assert!(summary.accounts.is_empty());
        assert_eq!(resolver.member("jin"), None);
    }

    #[tokio::test]
    async fn test_colliding_names_share_identity() {
        let backend = MemoryBackend::new();
        let identity = IdentityConfig::default();
        let avatar = AvatarConfig::default();

        let mut resolver = ReferenceResolver::new();
        let summary = IdentityProvisioner::new(&backend, &identity, &avatar)
            .provision_all(&[member("Jin Park"), member("jinpark")], &mut resolver)
            .await;

        assert_eq!(summary.counts.succeeded, 1);
        assert_eq!(summary.counts.skipped, 1);
        assert_eq!(resolver.member("Jin Park"), resolver.member("jinpark"));
    }

    #[tokio::test]
    async fn test_fill_missing_avatar() {
        let backend = MemoryBackend::new();
        let identity = IdentityConfig::default();
        let avatar = AvatarConfig {
            fill_missing: true,
            style: AvatarStyle::Lorelei,
            size: 64,
        };

        let mut resolver = ReferenceResolver::new();
        IdentityProvisioner::new(&backend, &identity, &avatar)
            .provision_all(&[member("jin")], &mut resolver)
            .await;

        let key = resolver.member("jin").unwrap();
        let profile = backend.profile(&key).unwrap();
        assert_eq!(profile.avatar_style, Some(AvatarStyle::Lorelei));
        assert!(profile
            .avatar_url
            .unwrap()
            .starts_with("https://api.dicebear.com/7.x/lorelei/svg?seed=jin"));
    }
}
