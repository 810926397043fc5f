//! Conversation transport implementations.
//!
//! This module contains the `ConversationTransport` trait, the value types
//! exchanged with it, and the HTTP implementation talking to the bot
//! connector service.

mod connector;

pub use connector::{BotConnectorTransport, CredentialSource, StaticCredentialSource};

use crate::error::TransportResult;
use crate::models::{Attachment, OutgoingMessage};
use async_trait::async_trait;
use core_config::BotSettings;
use serde::{Deserialize, Serialize};

/// A participant of a conversation (user or bot).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad_object_id: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Credentials the bot acts with. Built fresh for every dispatch.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_password: String,
    pub oauth_scope: String,
}

impl AppCredentials {
    pub fn from_settings(settings: &BotSettings) -> Self {
        Self {
            app_id: settings.app_id.clone(),
            app_password: settings.app_password.clone(),
            oauth_scope: settings.oauth_scope.clone(),
        }
    }

    /// The bot's own account; the `28:` prefix marks bot ids on the platform.
    pub fn bot_account(&self) -> ChannelAccount {
        ChannelAccount::new(format!("28:{}", self.app_id))
    }
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("app_password", &"***")
            .field("oauth_scope", &self.oauth_scope)
            .finish()
    }
}

/// A message activity on the wire.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl From<&OutgoingMessage> for Activity {
    fn from(message: &OutgoingMessage) -> Self {
        Self {
            activity_type: "message".to_string(),
            text: message.text_body().map(str::to_string),
            attachments: message.attachments().to_vec(),
        }
    }
}

/// Parameters for creating a conversation.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationParameters {
    pub is_group: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<serde_json::Value>,
    /// Delivered as the first message of the new conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
}

impl ConversationParameters {
    /// A one-to-one conversation between the bot and `member`.
    pub fn one_to_one(bot: ChannelAccount, member: ChannelAccount, tenant_id: &str) -> Self {
        Self {
            is_group: false,
            bot: Some(bot),
            members: vec![member],
            tenant_id: Some(tenant_id.to_string()),
            ..Default::default()
        }
    }

    /// A group conversation addressed to an existing channel or group chat.
    pub fn group(channel_id: &str, tenant_id: Option<&str>, activity: Option<Activity>) -> Self {
        Self {
            is_group: true,
            tenant_id: tenant_id.map(str::to_string),
            channel_data: Some(serde_json::json!({ "channel": { "id": channel_id } })),
            activity,
            ..Default::default()
        }
    }
}

/// Everything needed to create a conversation.
#[derive(Debug, Clone)]
pub struct CreateConversationRequest {
    pub credentials: AppCredentials,
    /// Channel or chat the conversation is created in; `None` for one-to-one.
    pub target_id: Option<String>,
    pub service_url: String,
    pub parameters: ConversationParameters,
}

/// Routing information for resuming a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationReference {
    pub conversation_id: String,
    pub service_url: String,
    pub bot: ChannelAccount,
    pub tenant_id: Option<String>,
    /// Id of the activity posted on creation, if the platform returned one.
    pub activity_id: Option<String>,
}

/// A resumed conversation, ready to send into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnContext {
    pub credentials: AppCredentials,
    pub reference: ConversationReference,
}

/// Acknowledgement of a sent activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentActivity {
    pub id: Option<String>,
}

/// Client for the messaging platform's conversation API.
///
/// Creating a conversation and sending within it are separate calls: the
/// reference returned by `create_conversation` is passed explicitly to
/// `continue_conversation`, whose context is passed to `send`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationTransport: Send + Sync {
    /// List the members of an existing conversation.
    async fn conversation_members(
        &self,
        credentials: &AppCredentials,
        service_url: &str,
        conversation_id: &str,
    ) -> TransportResult<Vec<ChannelAccount>>;

    /// Create (or reopen) a conversation.
    async fn create_conversation(&self, request: &CreateConversationRequest) -> TransportResult<ConversationReference>;

    /// Resume a conversation so messages can be sent into it.
    async fn continue_conversation(
        &self,
        credentials: &AppCredentials,
        reference: &ConversationReference,
    ) -> TransportResult<TurnContext>;

    /// Send a message into a resumed conversation.
    async fn send(&self, context: &TurnContext, message: &OutgoingMessage) -> TransportResult<SentActivity>;

    /// Get the transport name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_to_one_parameters_serialize() {
        let credentials = AppCredentials {
            app_id: "app-1".to_string(),
            app_password: "secret".to_string(),
            oauth_scope: "scope".to_string(),
        };
        let params = ConversationParameters::one_to_one(
            credentials.bot_account(),
            ChannelAccount::new("29:user"),
            "tenant-1",
        );

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "isGroup": false,
                "bot": { "id": "28:app-1" },
                "members": [{ "id": "29:user" }],
                "tenantId": "tenant-1"
            })
        );
    }

    #[test]
    fn test_group_parameters_embed_activity() {
        let message = OutgoingMessage::text("hello");
        let params = ConversationParameters::group("19:channel", None, Some(Activity::from(&message)));

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["isGroup"], true);
        assert_eq!(value["channelData"]["channel"]["id"], "19:channel");
        assert_eq!(value["activity"], json!({ "type": "message", "text": "hello" }));
        assert!(value.get("members").is_none());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = AppCredentials::from_settings(&BotSettings::new("app", "hunter2", "teams"));
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
