use crate::{env_or_default, env_parse_or_default, env_required, ConfigError, FromEnv};
use std::time::Duration;

const DEFAULT_SERVICE_URL: &str = "https://smba.trafficmanager.net/teams/";
const DEFAULT_OAUTH_SCOPE: &str = "https://api.botframework.com/.default";
const DEFAULT_OPEN_POSITIONS_TAB: &str = "OpenPositionsTab";

/// Bot registration and messaging endpoint settings
#[derive(Clone)]
pub struct BotSettings {
    /// Bot application (client) id
    pub app_id: String,
    pub app_password: String,
    /// Connector service URL all conversations are created against
    pub service_url: String,
    pub oauth_scope: String,
    /// Id of the chat app manifest, used when building deep links
    pub teams_app_id: String,
    /// Entity id of the "open positions" static tab
    pub open_positions_tab_entity_id: String,
    pub http_timeout: Duration,
}

impl BotSettings {
    pub fn new(app_id: impl Into<String>, app_password: impl Into<String>, teams_app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_password: app_password.into(),
            service_url: DEFAULT_SERVICE_URL.to_string(),
            oauth_scope: DEFAULT_OAUTH_SCOPE.to_string(),
            teams_app_id: teams_app_id.into(),
            open_positions_tab_entity_id: DEFAULT_OPEN_POSITIONS_TAB.to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_service_url(mut self, service_url: impl Into<String>) -> Self {
        self.service_url = service_url.into();
        self
    }

    pub fn with_open_positions_tab_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.open_positions_tab_entity_id = entity_id.into();
        self
    }
}

// The password never shows up in logs.
impl std::fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSettings")
            .field("app_id", &self.app_id)
            .field("app_password", &"***")
            .field("service_url", &self.service_url)
            .field("oauth_scope", &self.oauth_scope)
            .field("teams_app_id", &self.teams_app_id)
            .field("open_positions_tab_entity_id", &self.open_positions_tab_entity_id)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl FromEnv for BotSettings {
    /// Reads from environment variables:
    /// - MICROSOFT_APP_ID, MICROSOFT_APP_PASSWORD, TEAMS_APP_ID: required
    /// - BOT_SERVICE_URL: defaults to the public Teams connector
    /// - BOT_OAUTH_SCOPE: defaults to the Bot Framework scope
    /// - OPEN_POSITIONS_TAB_ENTITY_ID: defaults to "OpenPositionsTab"
    /// - BOT_HTTP_TIMEOUT_SECS: defaults to 30
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = env_parse_or_default("BOT_HTTP_TIMEOUT_SECS", 30)?;

        Ok(Self {
            app_id: env_required("MICROSOFT_APP_ID")?,
            app_password: env_required("MICROSOFT_APP_PASSWORD")?,
            service_url: env_or_default("BOT_SERVICE_URL", DEFAULT_SERVICE_URL),
            oauth_scope: env_or_default("BOT_OAUTH_SCOPE", DEFAULT_OAUTH_SCOPE),
            teams_app_id: env_required("TEAMS_APP_ID")?,
            open_positions_tab_entity_id: env_or_default(
                "OPEN_POSITIONS_TAB_ENTITY_ID",
                DEFAULT_OPEN_POSITIONS_TAB,
            ),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
