//! Resolution of recipient keys to chat identities.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::NotifyResult;
use crate::models::NotificationTarget;

/// What the directory knows about a recipient.
///
/// `upn` is `None` when the key matched nobody. `conversation_id` is `None`
/// when the person exists but has no conversation with the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatIdentity {
    pub upn: Option<String>,
    pub conversation_id: Option<String>,
}

impl ChatIdentity {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn new(upn: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            upn: Some(upn.into()),
            conversation_id,
        }
    }
}

/// Maps an alias, UPN, or object id to a chat-capable identity, scoped per tenant.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a single recipient to its canonical UPN and bot conversation id.
    async fn resolve_chat_identity(&self, key: &str, tenant_id: &str) -> NotifyResult<ChatIdentity>;

    /// Resolve a set of recipients to the id of a group chat containing all of them.
    async fn resolve_group_chat_id(&self, keys: &[String], tenant_id: &str) -> NotifyResult<Option<String>>;
}

#[derive(Debug, Clone)]
struct DirectoryEntry {
    upn: String,
    conversation_id: Option<String>,
}

/// In-memory directory (for development/testing).
///
/// Every entry is reachable by UPN, alias, and optionally object id. A bare
/// alias that is not registered is retried with the default domain appended.
#[derive(Debug, Clone)]
pub struct InMemoryIdentityResolver {
    default_domain: Option<String>,
    entries: Arc<RwLock<HashMap<(String, String), DirectoryEntry>>>,
    groups: Arc<RwLock<HashMap<(String, Vec<String>), String>>>,
}

impl InMemoryIdentityResolver {
    pub fn new() -> Self {
        Self {
            default_domain: None,
            entries: Arc::new(RwLock::new(HashMap::new())),
            groups: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_default_domain(mut self, domain: impl Into<String>) -> Self {
        self.default_domain = Some(domain.into().trim_start_matches('@').to_lowercase());
        self
    }

    /// Register a person. The alias is derived from the UPN's local part.
    pub async fn register(
        &self,
        tenant_id: &str,
        upn: &str,
        object_id: Option<uuid::Uuid>,
        conversation_id: Option<&str>,
    ) {
        let entry = DirectoryEntry {
            upn: upn.to_string(),
            conversation_id: conversation_id.map(str::to_string),
        };

        let mut keys = vec![upn.to_lowercase()];
        if let Some((alias, _)) = upn.split_once('@') {
            keys.push(alias.to_lowercase());
        }
        if let Some(oid) = object_id {
            keys.push(oid.to_string());
        }

        let mut entries = self.entries.write().await;
        for key in keys {
            entries.insert((tenant_id.to_string(), key), entry.clone());
        }
    }

    /// Register a group chat containing exactly these members.
    pub async fn register_group(&self, tenant_id: &str, members: &[&str], chat_id: &str) {
        let key = Self::group_key(members.iter().copied());
        self.groups
            .write()
            .await
            .insert((tenant_id.to_string(), key), chat_id.to_string());
    }

    fn group_key<'a>(members: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut key: Vec<String> = members.map(|m| m.trim().to_lowercase()).collect();
        key.sort();
        key.dedup();
        key
    }

    fn candidate_keys(&self, key: &str) -> Vec<String> {
        match NotificationTarget::parse(key) {
            NotificationTarget::ObjectId(oid) => vec![oid.to_string()],
            NotificationTarget::Upn(upn) => vec![upn.to_lowercase()],
            NotificationTarget::Alias(alias) => {
                let alias = alias.to_lowercase();
                let mut keys = vec![alias.clone()];
                if let Some(domain) = &self.default_domain {
                    keys.push(format!("{}@{}", alias, domain));
                }
                keys
            }
        }
    }
}

impl Default for InMemoryIdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityResolver {
    async fn resolve_chat_identity(&self, key: &str, tenant_id: &str) -> NotifyResult<ChatIdentity> {
        let entries = self.entries.read().await;

        let found = self
            .candidate_keys(key)
            .into_iter()
            .find_map(|candidate| entries.get(&(tenant_id.to_string(), candidate)).cloned());

        debug!(tenant_id = %tenant_id, resolved = found.is_some(), "Resolved chat identity");

        Ok(found
            .map(|entry| ChatIdentity {
                upn: Some(entry.upn),
                conversation_id: entry.conversation_id,
            })
            .unwrap_or_default())
    }

    async fn resolve_group_chat_id(&self, keys: &[String], tenant_id: &str) -> NotifyResult<Option<String>> {
        let key = Self::group_key(keys.iter().map(String::as_str));
        Ok(self.groups.read().await.get(&(tenant_id.to_string(), key)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const TENANT: &str = "tenant-1";

    #[tokio::test]
    async fn test_resolves_by_upn_alias_and_object_id() {
        let oid = Uuid::new_v4();
        let resolver = InMemoryIdentityResolver::new();
        resolver.register(TENANT, "Jane@corp.com", Some(oid), Some("19:abc")).await;

        let oid_key = oid.to_string();
        for key in ["jane@corp.com", "JANE", oid_key.as_str()] {
            let identity = resolver.resolve_chat_identity(key, TENANT).await.unwrap();
            assert_eq!(identity, ChatIdentity::new("Jane@corp.com", Some("19:abc".to_string())));
        }
    }

    #[tokio::test]
    async fn test_unknown_key_and_other_tenant() {
        let resolver = InMemoryIdentityResolver::new();
        resolver.register(TENANT, "jane@corp.com", None, Some("19:abc")).await;

        let ghost = resolver.resolve_chat_identity("ghost@corp.com", TENANT).await.unwrap();
        assert_eq!(ghost, ChatIdentity::unknown());

        let elsewhere = resolver.resolve_chat_identity("jane@corp.com", "tenant-2").await.unwrap();
        assert!(elsewhere.upn.is_none());
    }

    #[tokio::test]
    async fn test_bot_not_installed_has_no_conversation() {
        let resolver = InMemoryIdentityResolver::new();
        resolver.register(TENANT, "bob@corp.com", None, None).await;

        let identity = resolver.resolve_chat_identity("bob@corp.com", TENANT).await.unwrap();
        assert_eq!(identity.upn.as_deref(), Some("bob@corp.com"));
        assert!(identity.conversation_id.is_none());
    }

    #[tokio::test]
    async fn test_alias_expanded_with_default_domain() {
        let resolver = InMemoryIdentityResolver::new().with_default_domain("@Corp.com");
        // Registered under a different alias so only the expanded UPN matches.
        resolver.register(TENANT, "kim@corp.com", None, Some("19:kim")).await;
        resolver.entries.write().await.remove(&(TENANT.to_string(), "kim".to_string()));

        let identity = resolver.resolve_chat_identity("Kim", TENANT).await.unwrap();
        assert_eq!(identity.conversation_id.as_deref(), Some("19:kim"));
    }

    #[tokio::test]
    async fn test_group_lookup_ignores_order_and_case() {
        let resolver = InMemoryIdentityResolver::new();
        resolver
            .register_group(TENANT, &["a@corp.com", "b@corp.com"], "19:group")
            .await;

        let keys = vec!["B@corp.com".to_string(), "a@corp.com".to_string()];
        assert_eq!(
            resolver.resolve_group_chat_id(&keys, TENANT).await.unwrap().as_deref(),
            Some("19:group")
        );

        let partial = vec!["a@corp.com".to_string()];
        assert!(resolver.resolve_group_chat_id(&partial, TENANT).await.unwrap().is_none());
    }
}
