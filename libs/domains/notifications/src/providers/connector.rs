//! Bot connector REST transport.

use super::{
    Activity, AppCredentials, ChannelAccount, ConversationReference, ConversationTransport,
    CreateConversationRequest, SentActivity, TurnContext,
};
use crate::error::{NotifyResult, TransportError, TransportResult};
use crate::models::OutgoingMessage;
use async_trait::async_trait;
use core_config::BotSettings;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

/// Supplies bearer tokens for connector calls.
///
/// Token acquisition and caching belong to the identity platform client.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn bearer_token(&self, credentials: &AppCredentials) -> TransportResult<String>;
}

/// Hands out a fixed token. Suitable for the local emulator and tests.
#[derive(Clone)]
pub struct StaticCredentialSource {
    token: String,
}

impl StaticCredentialSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentialSource {
    async fn bearer_token(&self, _credentials: &AppCredentials) -> TransportResult<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationResourceResponse {
    id: String,
    #[serde(default)]
    service_url: Option<String>,
    #[serde(default)]
    activity_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Transport speaking the connector's `v3/conversations` API.
pub struct BotConnectorTransport<C: CredentialSource> {
    client: Client,
    credentials: C,
}

impl<C: CredentialSource> BotConnectorTransport<C> {
    pub fn new(credentials: C, timeout: Duration) -> NotifyResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, credentials })
    }

    pub fn from_settings(settings: &BotSettings, credentials: C) -> NotifyResult<Self> {
        Self::new(credentials, settings.http_timeout)
    }

    fn endpoint(service_url: &str, path: &str) -> String {
        format!("{}/{}", service_url.trim_end_matches('/'), path)
    }

    async fn token(&self, credentials: &AppCredentials) -> TransportResult<String> {
        self.credentials.bearer_token(credentials).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response, operation: &str) -> TransportResult<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                TransportError::other(format!("{} returned an unreadable body: {}", operation, e))
            });
        }

        let body = response.text().await.unwrap_or_default();
        error!(operation = %operation, status = %status, error = %body, "Connector call failed");
        Err(status_error(status, operation, &body))
    }
}

fn status_error(status: StatusCode, operation: &str, body: &str) -> TransportError {
    let detail = format!("{} failed ({}): {}", operation, status, body);
    if status == StatusCode::FORBIDDEN {
        TransportError::forbidden(detail)
    } else {
        TransportError::other(detail)
    }
}

#[async_trait]
impl<C: CredentialSource> ConversationTransport for BotConnectorTransport<C> {
    async fn conversation_members(
        &self,
        credentials: &AppCredentials,
        service_url: &str,
        conversation_id: &str,
    ) -> TransportResult<Vec<ChannelAccount>> {
        let url = Self::endpoint(
            service_url,
            &format!("v3/conversations/{}/members", urlencoding::encode(conversation_id)),
        );
        debug!(url = %url, "Listing conversation members");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token(credentials).await?)
            .send()
            .await?;

        Self::read_json(response, "get_conversation_members").await
    }

    async fn create_conversation(&self, request: &CreateConversationRequest) -> TransportResult<ConversationReference> {
        let url = Self::endpoint(&request.service_url, "v3/conversations");
        debug!(
            is_group = request.parameters.is_group,
            target_id = ?request.target_id,
            "Creating conversation"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token(&request.credentials).await?)
            .json(&request.parameters)
            .send()
            .await?;

        let created: ConversationResourceResponse = Self::read_json(response, "create_conversation").await?;

        info!(conversation_id = %created.id, "Conversation created");

        Ok(ConversationReference {
            conversation_id: created.id,
            service_url: created.service_url.unwrap_or_else(|| request.service_url.clone()),
            bot: request
                .parameters
                .bot
                .clone()
                .unwrap_or_else(|| request.credentials.bot_account()),
            tenant_id: request.parameters.tenant_id.clone(),
            activity_id: created.activity_id,
        })
    }

    async fn continue_conversation(
        &self,
        credentials: &AppCredentials,
        reference: &ConversationReference,
    ) -> TransportResult<TurnContext> {
        if reference.conversation_id.is_empty() {
            return Err(TransportError::other("cannot continue a conversation without an id"));
        }

        Ok(TurnContext {
            credentials: credentials.clone(),
            reference: reference.clone(),
        })
    }

    async fn send(&self, context: &TurnContext, message: &OutgoingMessage) -> TransportResult<SentActivity> {
        let reference = &context.reference;
        let url = Self::endpoint(
            &reference.service_url,
            &format!("v3/conversations/{}/activities", urlencoding::encode(&reference.conversation_id)),
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token(&context.credentials).await?)
            .json(&Activity::from(message))
            .send()
            .await?;

        let sent: ResourceResponse = Self::read_json(response, "send_to_conversation").await?;

        info!(
            conversation_id = %reference.conversation_id,
            activity_id = ?sent.id,
            "Activity sent"
        );

        Ok(SentActivity { id: sent.id })
    }

    fn name(&self) -> &'static str {
        "BotConnector"
    }
}
