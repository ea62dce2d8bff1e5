use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub wizard: WizardConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Admin service endpoints.
///
/// Everything derives from one service root; the invalidation service is a
/// separate deployment with its own URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// Root of the admin service
    #[serde(default = "default_admin_base")]
    pub admin_base: String,

    /// Host suffix for preview content links in the log viewer
    #[serde(default = "default_preview_host")]
    pub preview_host: String,

    /// Host suffix for live content links in the log viewer
    #[serde(default = "default_live_host")]
    pub live_host: String,

    /// Push-invalidation service URL
    #[serde(default = "default_invalidation_url")]
    pub invalidation_url: String,
}

fn default_admin_base() -> String {
    "https://admin.siteworks.dev".to_string()
}

fn default_preview_host() -> String {
    "siteworks.page".to_string()
}

fn default_live_host() -> String {
    "siteworks.live".to_string()
}

fn default_invalidation_url() -> String {
    "https://services.siteworks.dev/push-invalidation/v1".to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            admin_base: default_admin_base(),
            preview_host: default_preview_host(),
            live_host: default_live_host(),
            invalidation_url: default_invalidation_url(),
        }
    }
}

impl EndpointsConfig {
    fn base(&self) -> &str {
        self.admin_base.trim_end_matches('/')
    }

    /// Registration lookup endpoint for an owner/repo pair
    pub fn info_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/register/info/{owner}/{repo}", self.base())
    }

    /// Sign-in page for an owner/repo pair (opened in the sign-in window)
    pub fn login_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/login/{owner}/{repo}", self.base())
    }

    /// Profile endpoint for an owner/repo pair
    pub fn profile_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/profile/{owner}/{repo}", self.base())
    }

    /// Disconnect endpoint for an owner/repo pair
    pub fn disconnect_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/register/disconnect/{owner}/{repo}", self.base())
    }

    /// Log endpoint for an owner/repo pair. Logs are only served for main.
    pub fn log_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/log/{owner}/{repo}/main", self.base())
    }
}

/// Which step follows a completed sign-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostSignInStep {
    ConnectUser,
    ConnectApp,
}

impl Default for PostSignInStep {
    fn default() -> Self {
        Self::ConnectUser
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Step the wizard advances to once the sign-in window closes
    #[serde(default)]
    pub post_signin_step: PostSignInStep,

    /// How many steps a successful disconnect regresses.
    /// Deployments connecting via the app path should set 1.
    #[serde(default = "default_disconnect_regress_steps")]
    pub disconnect_regress_steps: usize,

    /// How often the sign-in window is polled for having closed
    #[serde(default = "default_signin_poll_interval_ms")]
    pub signin_poll_interval_ms: u64,
}

fn default_disconnect_regress_steps() -> usize {
    2
}

fn default_signin_poll_interval_ms() -> u64 {
    1500
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            post_signin_step: PostSignInStep::default(),
            disconnect_regress_steps: default_disconnect_regress_steps(),
            signin_poll_interval_ms: default_signin_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
}

fn default_tick_rate() -> u64 {
    250
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// State directory for log files
    #[serde(default = "default_state_path")]
    pub state: String,
}

fn default_state_path() -> String {
    ".siteops".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state: default_state_path(),
        }
    }
}

impl Config {
    /// Directory where runtime log files are written
    pub fn logs_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.state).join("logs")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the console works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // User config in ~/.config/siteops/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("siteops").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with SITEOPS_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("SITEOPS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
