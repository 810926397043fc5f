//! Data models for the notifications domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Talent Entities
// ============================================================================

/// Role a recruiter plays in the hiring process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecruiterRole {
    HiringManager,
    Interviewer,
    Recruiter,
}

/// A member of the hiring team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recruiter {
    pub id: i32,
    pub name: String,
    /// Alias, UPN, or object id used to reach this person in chat.
    pub alias: String,
    pub role: RecruiterRole,
}

impl Recruiter {
    pub fn new(id: i32, name: impl Into<String>, alias: impl Into<String>, role: RecruiterRole) -> Self {
        Self {
            id,
            name: name.into(),
            alias: alias.into(),
            role,
        }
    }
}

/// An open position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub id: i32,
    pub position_external_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub days_open: u32,
    pub hiring_manager_id: i32,
}

/// Interview pipeline stage.
///
/// Serialized using the label shown to users so templates can print it directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InterviewStage {
    #[serde(rename = "Applied")]
    Applied,
    #[serde(rename = "Screening")]
    Screening,
    #[serde(rename = "Interview", alias = "Interviewing")]
    Interviewing,
    #[serde(rename = "Offer", alias = "Offered")]
    Offered,
}

impl InterviewStage {
    pub fn label(&self) -> &'static str {
        match self {
            InterviewStage::Applied => "Applied",
            InterviewStage::Screening => "Screening",
            InterviewStage::Interviewing => "Interview",
            InterviewStage::Offered => "Offer",
        }
    }
}

impl std::fmt::Display for InterviewStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A candidate moving through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub id: i32,
    pub name: String,
    pub stage: InterviewStage,
    pub previous_stage: Option<InterviewStage>,
    pub summary: String,
    /// Position the candidate applied for, if any.
    pub position: Option<Position>,
}

// ============================================================================
// Notification Types
// ============================================================================

/// How a recipient key identifies a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    /// Bare alias such as `jane`.
    Alias(String),
    /// User principal name such as `jane@corp.com`.
    Upn(String),
    /// Directory object id.
    ObjectId(Uuid),
}

impl NotificationTarget {
    /// Classify a recipient key. Never fails: anything that is neither a UPN
    /// nor a GUID is treated as an alias.
    pub fn parse(key: &str) -> Self {
        let key = key.trim();
        if let Ok(oid) = Uuid::parse_str(key) {
            NotificationTarget::ObjectId(oid)
        } else if key.contains('@') {
            NotificationTarget::Upn(key.to_string())
        } else {
            NotificationTarget::Alias(key.to_string())
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotificationTarget::Alias(_) => "alias",
            NotificationTarget::Upn(_) => "upn",
            NotificationTarget::ObjectId(_) => "object_id",
        }
    }
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationResult {
    /// The platform accepted the message.
    Success,
    /// The recipient key could not be resolved to a chat-capable account.
    RecipientNotFound,
    /// The account exists but has no reachable conversation with the bot.
    BotNotInstalled,
    /// Any other failure; possibly transient.
    Failed,
}

impl NotificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, NotificationResult::Success)
    }
}

impl std::fmt::Display for NotificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationResult::Success => write!(f, "success"),
            NotificationResult::RecipientNotFound => write!(f, "recipient_not_found"),
            NotificationResult::BotNotInstalled => write!(f, "bot_not_installed"),
            NotificationResult::Failed => write!(f, "failed"),
        }
    }
}

/// A button shown with a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiAction {
    OpenUrl { title: String, url: String },
}

impl UiAction {
    pub fn open_url(title: impl Into<String>, url: impl Into<String>) -> Self {
        UiAction::OpenUrl {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Content type of adaptive card attachments.
pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// A structured attachment, usually a card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: serde_json::Value,
}

impl Attachment {
    pub fn adaptive_card(content: serde_json::Value) -> Self {
        Self {
            content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
            content,
        }
    }
}

/// A fully rendered message, ready for delivery.
///
/// `actions` have already been rendered into the card attachments by the
/// template engine; they are kept here so callers can inspect them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    text: Option<String>,
    attachments: Vec<Attachment>,
    actions: Vec<UiAction>,
}

impl OutgoingMessage {
    pub fn new(text: Option<String>, attachments: Vec<Attachment>, actions: Vec<UiAction>) -> Self {
        Self {
            text,
            attachments,
            actions,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn text_body(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn actions(&self) -> &[UiAction] {
        &self.actions
    }
}

// ============================================================================
// Template Data Structures
// ============================================================================

/// Data for the candidate card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTemplateModel {
    pub items: Vec<Candidate>,
    /// Offered as choices when scheduling an interview.
    pub interviewers: Vec<Recruiter>,
}

/// Data for the position card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionTemplateModel {
    pub items: Vec<Position>,
    pub actions: Vec<UiAction>,
}

/// Everything the renderer knows how to turn into a message.
#[derive(Debug, Clone)]
pub enum TemplateModel {
    /// A candidate moved to a new stage; rendered as a sentence plus a candidate card.
    CandidateStageChanged(CandidateTemplateModel),
    /// A position was opened; rendered as a position card with its actions.
    NewPosition(PositionTemplateModel),
}

impl TemplateModel {
    pub fn kind(&self) -> &'static str {
        match self {
            TemplateModel::CandidateStageChanged(_) => "candidate_stage_changed",
            TemplateModel::NewPosition(_) => "new_position",
        }
    }
}
