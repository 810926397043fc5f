//! Message template rendering engine.
//!
//! Cards are Handlebars templates producing adaptive card JSON. Every
//! interpolated value goes through a JSON string escape, so names containing
//! quotes or newlines cannot break the card. Plain-text templates use
//! triple-stash (`{{{value}}}`) to opt out of that escaping.

use crate::error::{NotificationError, NotifyResult};
use crate::models::{Attachment, CandidateTemplateModel, PositionTemplateModel, TemplateModel};
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Rendered message content.
#[derive(Debug, Clone, Default)]
pub struct RenderedMessage {
    /// Plain text shown above the attachments, if any.
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Turns a template model into message content.
#[cfg_attr(test, mockall::automock)]
pub trait MessageRenderer: Send + Sync {
    fn render(&self, model: &TemplateModel) -> NotifyResult<RenderedMessage>;
}

/// Handlebars-backed renderer for notification cards.
#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Arc<Handlebars<'static>>,
}

impl TemplateEngine {
    /// Create a new template engine with all templates registered.
    pub fn new() -> NotifyResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(json_escape);

        for (name, source) in [
            ("candidate_card", CANDIDATE_CARD_TEMPLATE),
            ("position_card", POSITION_CARD_TEMPLATE),
            ("stage_changed_text", STAGE_CHANGED_TEXT_TEMPLATE),
        ] {
            handlebars.register_template_string(name, source).map_err(|e| {
                NotificationError::TemplateError(format!("Failed to register {}: {}", name, e))
            })?;
        }

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    fn render_string<T: Serialize>(&self, template_name: &str, data: &T) -> NotifyResult<String> {
        Ok(self.handlebars.render(template_name, data)?)
    }

    fn render_card<T: Serialize>(&self, template_name: &str, data: &T) -> NotifyResult<Attachment> {
        let json = self.render_string(template_name, data)?;
        let content: serde_json::Value = serde_json::from_str(&json).map_err(|e| {
            NotificationError::TemplateError(format!("{} produced invalid card JSON: {}", template_name, e))
        })?;
        Ok(Attachment::adaptive_card(content))
    }

    /// Render the stage-change sentence and one card for the candidates.
    pub fn render_stage_changed(&self, model: &CandidateTemplateModel) -> NotifyResult<RenderedMessage> {
        debug!(candidates = model.items.len(), "Rendering stage changed message");

        let text = match model.items.first() {
            Some(candidate) => Some(self.render_string("stage_changed_text", candidate)?),
            None => None,
        };
        let card = self.render_card("candidate_card", model)?;

        Ok(RenderedMessage {
            text,
            attachments: vec![card],
        })
    }

    /// Render a position card, including its action buttons.
    pub fn render_positions(&self, model: &PositionTemplateModel) -> NotifyResult<RenderedMessage> {
        debug!(positions = model.items.len(), actions = model.actions.len(), "Rendering position message");

        Ok(RenderedMessage {
            text: None,
            attachments: vec![self.render_card("position_card", model)?],
        })
    }
}

impl MessageRenderer for TemplateEngine {
    fn render(&self, model: &TemplateModel) -> NotifyResult<RenderedMessage> {
        match model {
            TemplateModel::CandidateStageChanged(data) => self.render_stage_changed(data),
            TemplateModel::NewPosition(data) => self.render_positions(data),
        }
    }
}

/// Escape a value for embedding inside a JSON string literal.
fn json_escape(raw: &str) -> String {
    let quoted = serde_json::Value::String(raw.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

// ============================================================================
// Templates
// ============================================================================

const STAGE_CHANGED_TEXT_TEMPLATE: &str = "Candidate stage has been changed for {{{name}}}{{#if previous_stage}} from {{{previous_stage}}}{{/if}} to {{{stage}}}";

const CANDIDATE_CARD_TEMPLATE: &str = r#"{
  "type": "AdaptiveCard",
  "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
  "version": "1.2",
  "body": [
    {{#each items}}
    {
      "type": "Container",
      "separator": {{#if @index}}true{{else}}false{{/if}},
      "items": [
        { "type": "TextBlock", "text": "{{name}}", "weight": "Bolder", "size": "Medium", "wrap": true },
        {
          "type": "FactSet",
          "facts": [
            { "title": "Stage", "value": "{{stage}}" },
            { "title": "Previous stage", "value": "{{previous_stage}}" },
            { "title": "Position", "value": "{{position.title}}" }
          ]
        },
        { "type": "TextBlock", "text": "{{summary}}", "wrap": true, "isSubtle": true }
      ]
    }{{#unless @last}},{{/unless}}
    {{/each}}
  ]{{#if interviewers}},
  "actions": [
    {
      "type": "Action.ShowCard",
      "title": "Schedule an interview",
      "card": {
        "type": "AdaptiveCard",
        "body": [
          {
            "type": "Input.ChoiceSet",
            "id": "interviewerId",
            "choices": [
              {{#each interviewers}}{ "title": "{{name}}", "value": "{{id}}" }{{#unless @last}},{{/unless}}{{/each}}
            ]
          }
        ]
      }
    }
  ]{{/if}}
}"#;

const POSITION_CARD_TEMPLATE: &str = r#"{
  "type": "AdaptiveCard",
  "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
  "version": "1.2",
  "body": [
    {{#each items}}
    {
      "type": "Container",
      "separator": {{#if @index}}true{{else}}false{{/if}},
      "items": [
        { "type": "TextBlock", "text": "{{title}}", "weight": "Bolder", "size": "Medium", "wrap": true },
        {
          "type": "FactSet",
          "facts": [
            { "title": "Position ID", "value": "{{position_external_id}}" },
            { "title": "Location", "value": "{{location}}" },
            { "title": "Days open", "value": "{{days_open}}" }
          ]
        },
        { "type": "TextBlock", "text": "{{description}}", "wrap": true }
      ]
    }{{#unless @last}},{{/unless}}
    {{/each}}
  ]{{#if actions}},
  "actions": [
    {{#each actions}}{ "type": "Action.OpenUrl", "title": "{{title}}", "url": "{{url}}" }{{#unless @last}},{{/unless}}{{/each}}
  ]{{/if}}
}"#;
