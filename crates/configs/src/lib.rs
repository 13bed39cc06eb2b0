//! # configs
//!
//! Typed runtime settings for the moderation pipeline: which forums are
//! served, which checkers run where, checker tunables, the listener
//! account, credential material, and the dry-run switch.
//!
//! Layered load order: `config.toml` (optional), then `BAWU_*` environment
//! variables (`BAWU_REVIEW__LEVEL_WALL=3`).

use std::collections::{HashMap, HashSet};

use config::{Config, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Evaluate the full pipeline but suppress external side effects.
    pub dry_run: bool,
    /// Cursor/audit/permission store location.
    pub database_url: String,
    pub review: ReviewSettings,
    pub command: CommandSettings,
    /// Delegated account credentials, for the client plumbing to turn into
    /// forum clients.
    pub accounts: Vec<AccountSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    /// Forums to crawl, each with its enabled-checker allow-list.
    pub forums: Vec<ForumSettings>,
    pub keywords: Vec<String>,
    /// Keyword hits only count against authors at or below this level.
    pub keyword_max_level: u8,
    /// 0 disables the level wall.
    pub level_wall: u8,
    /// Official/operator accounts exempt from most checkers.
    pub office_accounts: Vec<i64>,
    /// Concurrent remote fetches per forum sweep.
    pub fetch_permits: usize,
    /// Randomized pause between sweeps, in seconds.
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        ReviewSettings {
            forums: Vec::new(),
            keywords: Vec::new(),
            keyword_max_level: 6,
            level_wall: 0,
            office_accounts: Vec::new(),
            fetch_permits: 8,
            min_interval_secs: 35,
            max_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumSettings {
    pub name: String,
    /// Checker names enabled for this forum.
    pub checkers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Display name of the listener account; mentions must start with
    /// `@<listener> `.
    pub listener: String,
    /// Forums the bot answers commands on.
    pub forums: Vec<String>,
    /// Concurrent-mention budget, separate from the crawler's.
    pub permits: usize,
    /// Seconds the mention feed lags behind the content endpoints.
    pub feed_lag_secs: u64,
    /// Seconds between mention-feed polls.
    pub poll_interval_secs: u64,
}

impl Default for CommandSettings {
    fn default() -> Self {
        CommandSettings {
            listener: String::new(),
            forums: Vec::new(),
            permits: 4,
            feed_lag_secs: 3,
            poll_interval_secs: 10,
        }
    }
}

/// One delegated account. The tokens never leave [`SecretString`] except
/// at the client construction boundary.
#[derive(Debug, Deserialize)]
pub struct AccountSettings {
    pub user_id: i64,
    pub username: String,
    pub bduss: SecretString,
    pub stoken: SecretString,
}

impl Settings {
    /// Loads `config.toml` (optional) with environment overrides.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        let settings: Settings = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("BAWU").separator("__"))
            .build()?
            .try_deserialize()?;
        debug!(
            forums = settings.review.forums.len(),
            dry_run = settings.dry_run,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Parses a TOML document directly; test and embedding entry point.
    pub fn from_toml(toml: &str) -> Result<Self, SettingsError> {
        Ok(Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?)
    }

    /// Forum name → enabled checker names, the crawler's plan shape.
    pub fn enabled_checkers(&self) -> HashMap<String, HashSet<String>> {
        self.review
            .forums
            .iter()
            .map(|forum| {
                (
                    forum.name.clone(),
                    forum.checkers.iter().cloned().collect(),
                )
            })
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dry_run: false,
            database_url: "sqlite://.cache/moderation.db?mode=rwc".to_string(),
            review: ReviewSettings::default(),
            command: CommandSettings::default(),
            accounts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert!(!settings.dry_run);
        assert_eq!(settings.review.fetch_permits, 8);
        assert_eq!(settings.review.keyword_max_level, 6);
        assert_eq!(settings.command.permits, 4);
        assert!(settings.review.forums.is_empty());
    }

    #[test]
    fn test_full_document() {
        let settings = Settings::from_toml(
            r#"
            dry_run = true
            database_url = "sqlite://./.cache/db.sqlite"

            [review]
            keywords = ["微信", "代练"]
            keyword_max_level = 4
            level_wall = 2
            office_accounts = [167570067]
            fetch_permits = 4

            [[review.forums]]
            name = "rust"
            checkers = ["keyword", "blacklist-loop"]

            [command]
            listener = "Bot"
            forums = ["rust"]

            [[accounts]]
            user_id = 100
            username = "executor-account"
            bduss = "opaque-token"
            stoken = "opaque-token-2"
            "#,
        )
        .unwrap();

        assert!(settings.dry_run);
        assert_eq!(settings.review.keywords.len(), 2);
        assert_eq!(settings.command.listener, "Bot");
        assert_eq!(settings.accounts.len(), 1);

        let plan = settings.enabled_checkers();
        assert!(plan["rust"].contains("keyword"));
        assert!(!plan["rust"].contains("level-wall"));
    }

    #[test]
    fn test_secrets_do_not_leak_through_debug() {
        let settings = Settings::from_toml(
            r#"
            [[accounts]]
            user_id = 1
            username = "acct"
            bduss = "super-secret"
            stoken = "extra-secret"
            "#,
        )
        .unwrap();
        let debugged = format!("{:?}", settings.accounts[0]);
        assert!(!debugged.contains("super-secret"));
    }
}
