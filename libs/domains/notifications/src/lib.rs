//! Notifications Domain
//!
//! This module delivers proactive chat notifications for the talent
//! application's bot.
//!
//! # Features
//!
//! - Candidate stage change notifications to the position's hiring manager
//! - New position notifications with a deep link to the positions tab
//! - One-to-one, channel, and group chat delivery
//! - Delivery outcomes folded into a closed [`NotificationResult`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Talent Event  │  ← Stage change, new position
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Dispatcher    │  ← Looks up recruiters, renders, classifies outcome
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │IdentityResolver │  ← Alias / UPN / object id → conversation id
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Transport     │  ← Bot connector REST API
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use core_config::{BotSettings, FromEnv};
//! use domain_notifications::{
//!     CancelSignal, InMemoryIdentityResolver, InMemoryRecruiterService, NotificationDispatcher,
//!     TemplateEngine,
//!     providers::{BotConnectorTransport, StaticCredentialSource},
//! };
//!
//! let settings = BotSettings::from_env()?;
//! let transport = BotConnectorTransport::from_settings(&settings, StaticCredentialSource::new(token))?;
//! let dispatcher = NotificationDispatcher::new(
//!     settings,
//!     InMemoryRecruiterService::new(),
//!     InMemoryIdentityResolver::new(),
//!     TemplateEngine::new()?,
//!     transport,
//! );
//!
//! let result = dispatcher
//!     .notify_on_stage_change(&tenant_id, &candidate, &CancelSignal::never())
//!     .await?;
//! ```

pub mod cancel;
pub mod deep_link;
pub mod dispatcher;
pub mod error;
pub mod identity;
pub mod models;
pub mod providers;
pub mod recruiters;
pub mod templates;

// Re-export commonly used types
pub use cancel::{CancelHandle, CancelSignal};
pub use dispatcher::NotificationDispatcher;
pub use error::{NotificationError, NotifyResult, TransportError, TransportErrorKind, TransportResult};
pub use identity::{ChatIdentity, IdentityResolver, InMemoryIdentityResolver};
pub use models::{
    Candidate, InterviewStage, NotificationResult, NotificationTarget, OutgoingMessage, Position, Recruiter,
    RecruiterRole, UiAction,
};
pub use providers::{BotConnectorTransport, ConversationTransport};
pub use recruiters::{InMemoryRecruiterService, RecruiterService};
pub use templates::{MessageRenderer, TemplateEngine};
