//! Notification dispatcher.
//!
//! Turns talent events into proactive chat messages. Each call makes at most
//! one delivery attempt and reports it as a [`NotificationResult`]; transport
//! errors never escape a dispatch call.

use crate::cancel::CancelSignal;
use crate::deep_link::{POTENTIAL_CANDIDATES_TAB_LABEL, entity_deep_link};
use crate::error::{NotificationError, NotifyResult};
use crate::identity::IdentityResolver;
use crate::models::{
    Candidate, CandidateTemplateModel, NotificationResult, NotificationTarget, OutgoingMessage, Position,
    PositionTemplateModel, TemplateModel, UiAction,
};
use crate::providers::{
    Activity, AppCredentials, ConversationParameters, ConversationTransport, CreateConversationRequest, SentActivity,
};
use crate::recruiters::RecruiterService;
use crate::templates::MessageRenderer;
use core_config::BotSettings;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Title of the button attached to new-position notifications.
pub const SHOW_ALL_POSITIONS_TITLE: &str = "Show all assigned positions";

/// Dispatches notifications through the configured collaborators.
pub struct NotificationDispatcher<R, I, M, T>
where
    R: RecruiterService,
    I: IdentityResolver,
    M: MessageRenderer,
    T: ConversationTransport,
{
    settings: Arc<BotSettings>,
    recruiters: Arc<R>,
    identity: Arc<I>,
    renderer: Arc<M>,
    transport: Arc<T>,
}

impl<R, I, M, T> NotificationDispatcher<R, I, M, T>
where
    R: RecruiterService,
    I: IdentityResolver,
    M: MessageRenderer,
    T: ConversationTransport,
{
    pub fn new(settings: BotSettings, recruiters: R, identity: I, renderer: M, transport: T) -> Self {
        Self::with_arcs(
            Arc::new(settings),
            Arc::new(recruiters),
            Arc::new(identity),
            Arc::new(renderer),
            Arc::new(transport),
        )
    }

    /// Create a dispatcher sharing already Arc-wrapped collaborators.
    pub fn with_arcs(
        settings: Arc<BotSettings>,
        recruiters: Arc<R>,
        identity: Arc<I>,
        renderer: Arc<M>,
        transport: Arc<T>,
    ) -> Self {
        Self {
            settings,
            recruiters,
            identity,
            renderer,
            transport,
        }
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ========================================================================
    // Event notifications
    // ========================================================================

    /// Tell the hiring manager of the candidate's position about a stage change.
    ///
    /// Returns `Ok(None)` without sending anything when the candidate is not
    /// attached to a position.
    #[instrument(skip(self, candidate, cancel), fields(candidate_id = candidate.id, stage = %candidate.stage))]
    pub async fn notify_on_stage_change(
        &self,
        tenant_id: &str,
        candidate: &Candidate,
        cancel: &CancelSignal,
    ) -> NotifyResult<Option<NotificationResult>> {
        let Some(position) = &candidate.position else {
            debug!("Candidate has no position, skipping notification");
            return Ok(None);
        };

        let hiring_manager = cancel
            .run(self.recruiters.get_by_id(position.hiring_manager_id))
            .await?;
        let interviewers = cancel.run(self.recruiters.get_all_interviewers()).await?;

        let rendered = self
            .renderer
            .render(&TemplateModel::CandidateStageChanged(CandidateTemplateModel {
                items: vec![candidate.clone()],
                interviewers,
            }))?;
        let message = OutgoingMessage::new(rendered.text, rendered.attachments, Vec::new());

        let result = self
            .send_one_to_one_notification(&hiring_manager.alias, tenant_id, &message, cancel)
            .await;

        info!(
            hiring_manager_id = hiring_manager.id,
            result = %result,
            "Stage change notification dispatched"
        );

        Ok(Some(result))
    }

    /// Tell the hiring manager that a position was opened for them.
    #[instrument(skip(self, position, cancel), fields(position_id = position.id))]
    pub async fn notify_on_new_position(
        &self,
        tenant_id: &str,
        position: &Position,
        cancel: &CancelSignal,
    ) -> NotifyResult<NotificationResult> {
        let hiring_manager = cancel
            .run(self.recruiters.get_by_id(position.hiring_manager_id))
            .await?;

        let actions = vec![UiAction::open_url(
            SHOW_ALL_POSITIONS_TITLE,
            entity_deep_link(
                &self.settings.teams_app_id,
                &self.settings.open_positions_tab_entity_id,
                POTENTIAL_CANDIDATES_TAB_LABEL,
            ),
        )];

        let rendered = self
            .renderer
            .render(&TemplateModel::NewPosition(PositionTemplateModel {
                items: vec![position.clone()],
                actions: actions.clone(),
            }))?;
        let message = OutgoingMessage::new(rendered.text, rendered.attachments, actions);

        let result = self
            .send_one_to_one_notification(&hiring_manager.alias, tenant_id, &message, cancel)
            .await;

        info!(
            hiring_manager_id = hiring_manager.id,
            result = %result,
            "New position notification dispatched"
        );

        Ok(result)
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    /// Deliver a message into the recipient's personal chat with the bot.
    #[instrument(
        skip(self, recipient_key, message, cancel),
        fields(recipient_kind = NotificationTarget::parse(recipient_key).kind())
    )]
    pub async fn send_one_to_one_notification(
        &self,
        recipient_key: &str,
        tenant_id: &str,
        message: &OutgoingMessage,
        cancel: &CancelSignal,
    ) -> NotificationResult {
        debug!(recipient_key = %recipient_key, "Resolving recipient");

        let identity = match cancel
            .run(self.identity.resolve_chat_identity(recipient_key, tenant_id))
            .await
        {
            Ok(identity) => identity,
            Err(e) => return classify(e),
        };

        let Some(upn) = identity.upn else {
            warn!("Recipient not found");
            return NotificationResult::RecipientNotFound;
        };

        let Some(conversation_id) = identity.conversation_id else {
            debug!(upn = %upn, "No bot conversation for resolved recipient");
            warn!("Recipient has no conversation with the bot");
            return NotificationResult::BotNotInstalled;
        };

        match self
            .try_send_one_to_one(tenant_id, &conversation_id, message, cancel)
            .await
        {
            Ok(sent) => {
                info!(activity_id = ?sent.id, transport = self.transport.name(), "One-to-one notification sent");
                NotificationResult::Success
            }
            Err(e) => classify(e),
        }
    }

    async fn try_send_one_to_one(
        &self,
        tenant_id: &str,
        conversation_id: &str,
        message: &OutgoingMessage,
        cancel: &CancelSignal,
    ) -> NotifyResult<SentActivity> {
        let credentials = AppCredentials::from_settings(&self.settings);
        let service_url = &self.settings.service_url;

        let members = cancel
            .run(
                self.transport
                    .conversation_members(&credentials, service_url, conversation_id),
            )
            .await?;
        let member = members
            .into_iter()
            .next()
            .ok_or_else(|| NotificationError::NoConversationMembers(conversation_id.to_string()))?;

        let request = CreateConversationRequest {
            target_id: None,
            service_url: service_url.clone(),
            parameters: ConversationParameters::one_to_one(credentials.bot_account(), member, tenant_id),
            credentials: credentials.clone(),
        };

        let reference = cancel.run(self.transport.create_conversation(&request)).await?;
        let context = cancel
            .run(self.transport.continue_conversation(&credentials, &reference))
            .await?;
        cancel.run(self.transport.send(&context, message)).await
    }

    /// Post a message into a channel. The message travels with the
    /// create-conversation call, so no separate send follows.
    #[instrument(skip(self, message, cancel))]
    pub async fn send_channel_notification(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
        cancel: &CancelSignal,
    ) -> NotificationResult {
        let request = CreateConversationRequest {
            target_id: Some(channel_id.to_string()),
            service_url: self.settings.service_url.clone(),
            parameters: ConversationParameters::group(channel_id, None, Some(Activity::from(message))),
            credentials: AppCredentials::from_settings(&self.settings),
        };

        match cancel.run(self.transport.create_conversation(&request)).await {
            Ok(reference) => {
                info!(
                    conversation_id = %reference.conversation_id,
                    activity_id = ?reference.activity_id,
                    "Channel notification sent"
                );
                NotificationResult::Success
            }
            Err(e) => classify(e),
        }
    }

    /// Deliver a message into the group chat shared by exactly these recipients.
    #[instrument(skip(self, recipient_keys, message, cancel), fields(recipients = recipient_keys.len()))]
    pub async fn send_group_notification(
        &self,
        recipient_keys: &[String],
        tenant_id: &str,
        message: &OutgoingMessage,
        cancel: &CancelSignal,
    ) -> NotificationResult {
        if recipient_keys.is_empty() {
            warn!("Group notification without recipients");
            return NotificationResult::RecipientNotFound;
        }

        let chat_id = match cancel
            .run(self.identity.resolve_group_chat_id(recipient_keys, tenant_id))
            .await
        {
            Ok(Some(chat_id)) => chat_id,
            Ok(None) => {
                warn!("No group chat found for recipients");
                return NotificationResult::RecipientNotFound;
            }
            Err(e) => return classify(e),
        };

        match self.try_send_group(&chat_id, tenant_id, message, cancel).await {
            Ok(sent) => {
                info!(chat_id = %chat_id, activity_id = ?sent.id, "Group notification sent");
                NotificationResult::Success
            }
            Err(e) => classify(e),
        }
    }

    async fn try_send_group(
        &self,
        chat_id: &str,
        tenant_id: &str,
        message: &OutgoingMessage,
        cancel: &CancelSignal,
    ) -> NotifyResult<SentActivity> {
        let credentials = AppCredentials::from_settings(&self.settings);
        let request = CreateConversationRequest {
            target_id: Some(chat_id.to_string()),
            service_url: self.settings.service_url.clone(),
            parameters: ConversationParameters::group(chat_id, Some(tenant_id), None),
            credentials: credentials.clone(),
        };

        let reference = cancel.run(self.transport.create_conversation(&request)).await?;
        let context = cancel
            .run(self.transport.continue_conversation(&credentials, &reference))
            .await?;
        cancel.run(self.transport.send(&context, message)).await
    }
}

impl<R, I, M, T> Clone for NotificationDispatcher<R, I, M, T>
where
    R: RecruiterService,
    I: IdentityResolver,
    M: MessageRenderer,
    T: ConversationTransport,
{
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            recruiters: Arc::clone(&self.recruiters),
            identity: Arc::clone(&self.identity),
            renderer: Arc::clone(&self.renderer),
            transport: Arc::clone(&self.transport),
        }
    }
}

/// Fold a delivery error into the closed result set.
fn classify(error: NotificationError) -> NotificationResult {
    match error {
        NotificationError::Transport(e) if e.is_forbidden() => {
            warn!(error = %e, "Platform refused delivery, bot is not installed");
            NotificationResult::BotNotInstalled
        }
        NotificationError::Cancelled => {
            warn!("Notification cancelled before delivery completed");
            NotificationResult::Failed
        }
        other => {
            error!(error = %other, "Failed to deliver notification");
            NotificationResult::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel;
    use crate::error::TransportError;
    use crate::identity::{ChatIdentity, MockIdentityResolver};
    use crate::models::{InterviewStage, Recruiter, RecruiterRole};
    use crate::providers::{ChannelAccount, ConversationReference, MockConversationTransport, TurnContext};
    use crate::recruiters::MockRecruiterService;
    use crate::templates::{MockMessageRenderer, TemplateEngine};

    const TENANT: &str = "tenant-1";

    fn settings() -> BotSettings {
        BotSettings::new("app-1", "secret", "teams-app").with_service_url("https://smba.test/teams/")
    }

    fn position() -> Position {
        Position {
            id: 3,
            position_external_id: "POS-003".to_string(),
            title: "Staff Engineer".to_string(),
            description: "Platform team".to_string(),
            location: "Remote".to_string(),
            days_open: 4,
            hiring_manager_id: 7,
        }
    }

    fn jane_doe() -> Candidate {
        Candidate {
            id: 11,
            name: "Jane Doe".to_string(),
            stage: InterviewStage::Offered,
            previous_stage: Some(InterviewStage::Interviewing),
            summary: "Great fit".to_string(),
            position: Some(position()),
        }
    }

    fn hiring_manager() -> Recruiter {
        Recruiter::new(7, "Hannah", "jane@corp.com", RecruiterRole::HiringManager)
    }

    fn recruiters() -> MockRecruiterService {
        let mut recruiters = MockRecruiterService::new();
        recruiters
            .expect_get_by_id()
            .with(mockall::predicate::eq(7))
            .returning(|_| Ok(hiring_manager()));
        recruiters.expect_get_all_interviewers().returning(|| {
            Ok(vec![Recruiter::new(2, "Ivan", "ivan@corp.com", RecruiterRole::Interviewer)])
        });
        recruiters
    }

    fn identity(key: &'static str, resolved: ChatIdentity) -> MockIdentityResolver {
        let mut identity = MockIdentityResolver::new();
        identity
            .expect_resolve_chat_identity()
            .withf(move |k, tenant| k == key && tenant == TENANT)
            .times(1)
            .returning(move |_, _| Ok(resolved.clone()));
        identity
    }

    fn reference(conversation_id: &str) -> ConversationReference {
        ConversationReference {
            conversation_id: conversation_id.to_string(),
            service_url: "https://smba.test/teams/".to_string(),
            bot: ChannelAccount::new("28:app-1"),
            tenant_id: Some(TENANT.to_string()),
            activity_id: None,
        }
    }

    /// Transport that lets a one-to-one dispatch through, checking each step.
    fn delivering_transport(conversation_id: &'static str) -> MockConversationTransport {
        let mut transport = MockConversationTransport::new();
        transport
            .expect_conversation_members()
            .withf(move |credentials, service_url, id| {
                credentials.app_id == "app-1" && service_url == "https://smba.test/teams/" && id == conversation_id
            })
            .times(1)
            .returning(|_, _, _| Ok(vec![ChannelAccount::new("29:member")]));
        transport
            .expect_create_conversation()
            .withf(|request| {
                let params = &request.parameters;
                !params.is_group
                    && params.bot == Some(ChannelAccount::new("28:app-1"))
                    && params.members == vec![ChannelAccount::new("29:member")]
                    && params.tenant_id.as_deref() == Some(TENANT)
            })
            .times(1)
            .returning(|_| Ok(reference("a:personal")));
        transport
            .expect_continue_conversation()
            .withf(|_, reference| reference.conversation_id == "a:personal")
            .times(1)
            .returning(|credentials, reference| {
                Ok(TurnContext {
                    credentials: credentials.clone(),
                    reference: reference.clone(),
                })
            });
        transport.expect_name().return_const("Mock");
        transport
    }

    #[tokio::test]
    async fn test_stage_change_sends_to_hiring_manager() {
        let mut transport = delivering_transport("19:abc");
        transport
            .expect_send()
            .withf(|context, message| {
                let text = message.text_body().unwrap_or_default();
                context.reference.conversation_id == "a:personal"
                    && text.contains("Jane Doe")
                    && text.contains("Interview")
                    && text.contains("Offer")
            })
            .times(1)
            .returning(|_, _| Ok(SentActivity { id: Some("1".to_string()) }));

        let dispatcher = NotificationDispatcher::new(
            settings(),
            recruiters(),
            identity("jane@corp.com", ChatIdentity::new("jane@corp.com", Some("19:abc".to_string()))),
            TemplateEngine::new().unwrap(),
            transport,
        );

        let result = dispatcher
            .notify_on_stage_change(TENANT, &jane_doe(), &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(result, Some(NotificationResult::Success));
    }

    #[tokio::test]
    async fn test_stage_change_without_position_sends_nothing() {
        let mut recruiters = MockRecruiterService::new();
        recruiters.expect_get_by_id().never();
        let mut transport = MockConversationTransport::new();
        transport.expect_send().never();
        transport.expect_create_conversation().never();

        let dispatcher = NotificationDispatcher::new(
            settings(),
            recruiters,
            MockIdentityResolver::new(),
            MockMessageRenderer::new(),
            transport,
        );

        let mut candidate = jane_doe();
        candidate.position = None;

        let result = dispatcher
            .notify_on_stage_change(TENANT, &candidate, &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_stage_change_propagates_missing_hiring_manager() {
        let mut recruiters = MockRecruiterService::new();
        recruiters
            .expect_get_by_id()
            .returning(|id| Err(NotificationError::RecruiterNotFound(id)));

        let dispatcher = NotificationDispatcher::new(
            settings(),
            recruiters,
            MockIdentityResolver::new(),
            MockMessageRenderer::new(),
            MockConversationTransport::new(),
        );

        let result = dispatcher
            .notify_on_stage_change(TENANT, &jane_doe(), &CancelSignal::never())
            .await;
        assert!(matches!(result, Err(NotificationError::RecruiterNotFound(7))));
    }

    #[tokio::test]
    async fn test_new_position_carries_deep_link_action() {
        let mut transport = delivering_transport("19:abc");
        transport
            .expect_send()
            .withf(|_, message| match message.actions() {
                [UiAction::OpenUrl { title, url }] => {
                    title == SHOW_ALL_POSITIONS_TITLE
                        && url == "https://teams.microsoft.com/l/entity/teams-app/OpenPositionsTab?label=Potential%20candidates"
                        && message.attachments().len() == 1
                }
                _ => false,
            })
            .times(1)
            .returning(|_, _| Ok(SentActivity::default()));

        let dispatcher = NotificationDispatcher::new(
            settings(),
            recruiters(),
            identity("jane@corp.com", ChatIdentity::new("jane@corp.com", Some("19:abc".to_string()))),
            TemplateEngine::new().unwrap(),
            transport,
        );

        let result = dispatcher
            .notify_on_new_position(TENANT, &position(), &CancelSignal::never())
            .await
            .unwrap();
        assert_eq!(result, NotificationResult::Success);
    }

    #[tokio::test]
    async fn test_unknown_recipient_skips_transport() {
        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity("ghost@corp.com", ChatIdentity::unknown()),
            MockMessageRenderer::new(),
            MockConversationTransport::new(),
        );

        let result = dispatcher
            .send_one_to_one_notification(
                "ghost@corp.com",
                TENANT,
                &OutgoingMessage::text("hi"),
                &CancelSignal::never(),
            )
            .await;
        assert_eq!(result, NotificationResult::RecipientNotFound);
    }

    #[tokio::test]
    async fn test_missing_conversation_is_bot_not_installed() {
        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity("bob@corp.com", ChatIdentity::new("bob@corp.com", None)),
            MockMessageRenderer::new(),
            MockConversationTransport::new(),
        );

        let result = dispatcher
            .send_one_to_one_notification("bob@corp.com", TENANT, &OutgoingMessage::text("hi"), &CancelSignal::never())
            .await;
        assert_eq!(result, NotificationResult::BotNotInstalled);
    }

    #[tokio::test]
    async fn test_forbidden_create_is_bot_not_installed() {
        let mut transport = MockConversationTransport::new();
        transport
            .expect_conversation_members()
            .returning(|_, _, _| Ok(vec![ChannelAccount::new("29:member")]));
        transport
            .expect_create_conversation()
            .returning(|_| Err(TransportError::forbidden("bot blocked")));
        transport.expect_send().never();

        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity("jane@corp.com", ChatIdentity::new("jane@corp.com", Some("19:abc".to_string()))),
            MockMessageRenderer::new(),
            transport,
        );

        let result = dispatcher
            .send_one_to_one_notification("jane@corp.com", TENANT, &OutgoingMessage::text("hi"), &CancelSignal::never())
            .await;
        assert_eq!(result, NotificationResult::BotNotInstalled);
    }

    #[tokio::test]
    async fn test_other_transport_errors_are_failed() {
        let mut transport = delivering_transport("19:abc");
        transport
            .expect_send()
            .returning(|_, _| Err(TransportError::other("503 service unavailable")));

        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity("jane@corp.com", ChatIdentity::new("jane@corp.com", Some("19:abc".to_string()))),
            MockMessageRenderer::new(),
            transport,
        );

        let result = dispatcher
            .send_one_to_one_notification("jane@corp.com", TENANT, &OutgoingMessage::text("hi"), &CancelSignal::never())
            .await;
        assert_eq!(result, NotificationResult::Failed);
    }

    #[tokio::test]
    async fn test_empty_member_list_is_failed() {
        let mut transport = MockConversationTransport::new();
        transport.expect_conversation_members().returning(|_, _, _| Ok(Vec::new()));
        transport.expect_create_conversation().never();

        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity("jane@corp.com", ChatIdentity::new("jane@corp.com", Some("19:abc".to_string()))),
            MockMessageRenderer::new(),
            transport,
        );

        let result = dispatcher
            .send_one_to_one_notification("jane@corp.com", TENANT, &OutgoingMessage::text("hi"), &CancelSignal::never())
            .await;
        assert_eq!(result, NotificationResult::Failed);
    }

    #[tokio::test]
    async fn test_resolver_error_is_failed() {
        let mut identity = MockIdentityResolver::new();
        identity
            .expect_resolve_chat_identity()
            .returning(|_, _| Err(NotificationError::Identity("directory unavailable".to_string())));

        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity,
            MockMessageRenderer::new(),
            MockConversationTransport::new(),
        );

        let result = dispatcher
            .send_one_to_one_notification("jane@corp.com", TENANT, &OutgoingMessage::text("hi"), &CancelSignal::never())
            .await;
        assert_eq!(result, NotificationResult::Failed);
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_is_failed_without_sends() {
        let (handle, signal) = cancel::channel();
        handle.cancel();

        let mut identity = MockIdentityResolver::new();
        identity
            .expect_resolve_chat_identity()
            .returning(|_, _| Ok(ChatIdentity::new("jane@corp.com", Some("19:abc".to_string()))));
        let mut transport = MockConversationTransport::new();
        transport.expect_send().never();

        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity,
            MockMessageRenderer::new(),
            transport,
        );

        let result = dispatcher
            .send_one_to_one_notification("jane@corp.com", TENANT, &OutgoingMessage::text("hi"), &signal)
            .await;
        assert_eq!(result, NotificationResult::Failed);
    }

    #[tokio::test]
    async fn test_channel_notification_embeds_activity() {
        let mut transport = MockConversationTransport::new();
        transport
            .expect_create_conversation()
            .withf(|request| {
                let params = &request.parameters;
                request.target_id.as_deref() == Some("19:channel")
                    && params.is_group
                    && params.channel_data == Some(serde_json::json!({ "channel": { "id": "19:channel" } }))
                    && params
                        .activity
                        .as_ref()
                        .and_then(|a| a.text.as_deref())
                        == Some("deploy finished")
            })
            .times(1)
            .returning(|_| Ok(reference("19:channel;messageid=1")));
        transport.expect_continue_conversation().never();
        transport.expect_send().never();

        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            MockIdentityResolver::new(),
            MockMessageRenderer::new(),
            transport,
        );

        let result = dispatcher
            .send_channel_notification("19:channel", &OutgoingMessage::text("deploy finished"), &CancelSignal::never())
            .await;
        assert_eq!(result, NotificationResult::Success);
    }

    #[tokio::test]
    async fn test_channel_notification_classifies_errors() {
        for (error, expected) in [
            (TransportError::forbidden("not in team"), NotificationResult::BotNotInstalled),
            (TransportError::other("timeout"), NotificationResult::Failed),
        ] {
            let mut transport = MockConversationTransport::new();
            transport
                .expect_create_conversation()
                .returning(move |_| Err(error.clone()));

            let dispatcher = NotificationDispatcher::new(
                settings(),
                MockRecruiterService::new(),
                MockIdentityResolver::new(),
                MockMessageRenderer::new(),
                transport,
            );

            let result = dispatcher
                .send_channel_notification("19:channel", &OutgoingMessage::text("hi"), &CancelSignal::never())
                .await;
            assert_eq!(result, expected);
        }
    }

    #[tokio::test]
    async fn test_group_notification_sends_into_resolved_chat() {
        let mut identity = MockIdentityResolver::new();
        identity
            .expect_resolve_group_chat_id()
            .withf(|keys, tenant| keys.len() == 2 && tenant == TENANT)
            .returning(|_, _| Ok(Some("19:group".to_string())));

        let mut transport = MockConversationTransport::new();
        transport
            .expect_create_conversation()
            .withf(|request| {
                request.target_id.as_deref() == Some("19:group")
                    && request.parameters.is_group
                    && request.parameters.activity.is_none()
            })
            .times(1)
            .returning(|_| Ok(reference("19:group")));
        transport
            .expect_continue_conversation()
            .returning(|credentials, reference| {
                Ok(TurnContext {
                    credentials: credentials.clone(),
                    reference: reference.clone(),
                })
            });
        transport
            .expect_send()
            .withf(|context, _| context.reference.conversation_id == "19:group")
            .times(1)
            .returning(|_, _| Ok(SentActivity::default()));

        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity,
            MockMessageRenderer::new(),
            transport,
        );

        let keys = vec!["a@corp.com".to_string(), "b@corp.com".to_string()];
        let result = dispatcher
            .send_group_notification(&keys, TENANT, &OutgoingMessage::text("standup"), &CancelSignal::never())
            .await;
        assert_eq!(result, NotificationResult::Success);
    }

    #[tokio::test]
    async fn test_group_notification_unresolved_or_failing() {
        let mut identity = MockIdentityResolver::new();
        identity.expect_resolve_group_chat_id().returning(|_, _| Ok(None));
        let dispatcher = NotificationDispatcher::new(
            settings(),
            MockRecruiterService::new(),
            identity,
            MockMessageRenderer::new(),
            MockConversationTransport::new(),
        );
        let keys = vec!["a@corp.com".to_string()];
        assert_eq!(
            dispatcher
                .send_group_notification(&keys, TENANT, &OutgoingMessage::text("x"), &CancelSignal::never())
                .await,
            NotificationResult::RecipientNotFound
        );
        assert_eq!(
            dispatcher
                .send_group_notification(&[], TENANT, &OutgoingMessage::text("x"), &CancelSignal::never())
                .await,
            NotificationResult::RecipientNotFound
        );

        for (error, expected) in [
            (TransportError::forbidden("bot removed from chat"), NotificationResult::BotNotInstalled),
            (TransportError::other("boom"), NotificationResult::Failed),
        ] {
            let mut identity = MockIdentityResolver::new();
            identity
                .expect_resolve_group_chat_id()
                .returning(|_, _| Ok(Some("19:group".to_string())));
            let mut transport = MockConversationTransport::new();
            transport
                .expect_create_conversation()
                .returning(move |_| Err(error.clone()));
            transport.expect_send().never();
            let dispatcher = NotificationDispatcher::new(
                settings(),
                MockRecruiterService::new(),
                identity,
                MockMessageRenderer::new(),
                transport,
            );
            assert_eq!(
                dispatcher
                    .send_group_notification(&keys, TENANT, &OutgoingMessage::text("x"), &CancelSignal::never())
                    .await,
                expected
            );
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(TransportError::forbidden("x").into()),
            NotificationResult::BotNotInstalled
        );
        assert_eq!(classify(NotificationError::Cancelled), NotificationResult::Failed);
        assert_eq!(
            classify(NotificationError::NoConversationMembers("19:abc".to_string())),
            NotificationResult::Failed
        );
    }
}
