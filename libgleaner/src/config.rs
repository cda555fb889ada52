//! Configuration management for Gleaner

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Inclusive `[min, max]` range of whole seconds (or counts) drawn from
/// uniformly at random. Deserialization rejects inverted ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    min: u64,
    max: u64,
}

impl Window {
    pub fn new(min: u64, max: u64) -> std::result::Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::Invalid(format!(
                "window min {} exceeds max {}",
                min, max
            )));
        }
        Ok(Window { min, max })
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// Draw one value uniformly from the window.
    pub fn draw(&self) -> u64 {
        use rand::Rng;
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl<'de> Deserialize<'de> for Window {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawWindow {
            min: u64,
            max: u64,
        }

        let raw = RawWindow::deserialize(deserializer)?;
        Window::new(raw.min, raw.max).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub platform: PlatformConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub churn: ChurnConfig,
    #[serde(default)]
    pub comments: CommentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the instance, e.g. `https://mastodon.social`
    pub instance: String,
    /// Path to a file holding the access token, `~` and `$VAR` are expanded
    pub token_file: String,
}

/// Which action kinds the engine is allowed to perform at all.
///
/// Comments and direct messages trip write limits quickly, so they default
/// to off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub repost: bool,
    pub favorite: bool,
    pub follow: bool,
    pub comment: bool,
    pub direct_message: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            repost: true,
            favorite: true,
            follow: true,
            comment: false,
            direct_message: false,
        }
    }
}

/// Keyword lists that mark a post as asking for each action kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub repost: Vec<String>,
    pub favorite: Vec<String>,
    pub follow: Vec<String>,
    pub comment: Vec<String>,
    pub tag: Vec<String>,
    pub direct_message: Vec<String>,
}

fn string_vec(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        KeywordConfig {
            repost: string_vec(&[
                "rt", "retweet", "repost", "boost", "#rt", "🔁", "rt,", "rt.", "rt!",
            ]),
            favorite: string_vec(&["like", "favorite", "fav", "❤️"]),
            follow: string_vec(&["follow", "mbf", "flw"]),
            comment: string_vec(&["reply", "comment"]),
            tag: string_vec(&["tag", "mention", "friend"]),
            direct_message: string_vec(&["message", "dm"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search terms rotated round-robin, one per batch
    pub keywords: Vec<String>,
    /// Posts requested per batch
    pub count: u32,
    /// Authors whose handle contains any of these words are skipped
    pub banned_authors: Vec<String>,
    /// Posts whose body contains any of these words are skipped
    pub banned_text: Vec<String>,
    pub include_reposts: bool,
    pub include_replies: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            keywords: string_vec(&["giveaway", "contest", "sweepstake"]),
            count: 40,
            banned_authors: string_vec(&["bot", "bts", "stan", "kpop"]),
            banned_text: string_vec(&[
                "join",
                "download",
                "bts",
                "kpop",
                "album",
                "gcash",
                "subscribe",
                "answer",
                "robux",
            ]),
            include_reposts: true,
            include_replies: false,
        }
    }
}

/// Sleep windows, in whole seconds, for the four pause classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Scales every drawn pause; 0.0 disables pacing entirely
    pub multiplier: f64,
    /// After each action call on a post
    pub per_action: Window,
    /// After all actions on a post are done
    pub per_post: Window,
    /// After each unfollow inside a churn campaign
    pub per_unfollow: Window,
    /// At the start and end of a churn campaign
    pub per_churn_cycle: Window,
}

impl Default for PacingConfig {
    fn default() -> Self {
        PacingConfig {
            multiplier: 1.0,
            per_action: Window { min: 45, max: 60 },
            per_post: Window { min: 180, max: 240 },
            per_unfollow: Window { min: 200, max: 300 },
            per_churn_cycle: Window {
                min: 10800,
                max: 14400,
            },
        }
    }
}

/// When and how hard to prune the following list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    /// Following ceiling; a fresh ceiling is drawn before every follow
    pub max_following: Window,
    /// How many accounts one campaign sheds
    pub campaign_size: Window,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        ChurnConfig {
            max_following: Window {
                min: 1900,
                max: 1999,
            },
            campaign_size: Window { min: 100, max: 200 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Append every hashtag found in the post to generated comments
    pub echo_hashtags: bool,
    /// Handles mentioned by tag comments
    pub tag_handles: Vec<String>,
    /// Phrase pool for generated text
    pub phrases: Vec<String>,
    /// Punctuation pool appended to the chosen phrase
    pub punctuation: Vec<String>,
}

impl Default for CommentConfig {
    fn default() -> Self {
        CommentConfig {
            echo_hashtags: true,
            tag_handles: string_vec(&["pluggrr", "cheapprr", "deallrr"]),
            phrases: string_vec(&[
                "Entering the giveaway",
                "I really want to win",
                "Please pick me",
                "Please choose me",
                "Done",
                "Entered",
                "Finished",
                "Pls pick me",
                "Me",
                "Me me me",
                "Please",
                "Omg pls",
                "Omg please pick me",
                "Let me win",
                "Pls let me win",
                "This would change my life",
                "Pick me",
                "Pick me pick me",
            ]),
            punctuation: string_vec(&["", "!", "!!", "!!!", ".", "..", "..."]),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Config {
            platform: PlatformConfig {
                instance: "https://mastodon.social".to_string(),
                token_file: "~/.config/gleaner/mastodon.token".to_string(),
            },
            features: FeatureConfig::default(),
            keywords: KeywordConfig::default(),
            search: SearchConfig::default(),
            pacing: PacingConfig::default(),
            churn: ChurnConfig::default(),
            comments: CommentConfig::default(),
        }
    }

    /// Reject configurations that would misbehave at runtime.
    ///
    /// Everything here fails at startup rather than hours into a run.
    pub fn validate(&self) -> Result<()> {
        if self.platform.instance.trim().is_empty() {
            return Err(ConfigError::MissingField("platform.instance".to_string()).into());
        }
        if self.platform.token_file.trim().is_empty() {
            return Err(ConfigError::MissingField("platform.token_file".to_string()).into());
        }
        if self.search.keywords.is_empty() {
            return Err(
                ConfigError::Invalid("search.keywords must not be empty".to_string()).into(),
            );
        }
        if self.search.count == 0 {
            return Err(ConfigError::Invalid("search.count must be at least 1".to_string()).into());
        }
        if !self.pacing.multiplier.is_finite() || self.pacing.multiplier < 0.0 {
            return Err(ConfigError::Invalid(
                "pacing.multiplier must be a finite number >= 0".to_string(),
            )
            .into());
        }
        let text_needed = self.features.comment || self.features.direct_message;
        if text_needed && self.comments.phrases.is_empty() {
            return Err(ConfigError::Invalid(
                "comments.phrases must not be empty while comment or direct_message is enabled"
                    .to_string(),
            )
            .into());
        }
        if text_needed && self.comments.punctuation.is_empty() {
            return Err(ConfigError::Invalid(
                "comments.punctuation must not be empty while comment or direct_message is enabled"
                    .to_string(),
            )
            .into());
        }
        if self.features.comment && self.comments.tag_handles.is_empty() {
            return Err(ConfigError::Invalid(
                "comments.tag_handles must not be empty while comment is enabled".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("GLEANER_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("gleaner").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const MINIMAL: &str = r#"
[platform]
instance = "https://fedi.example"
token_file = "/tmp/token"
"#;

    #[test]
    fn test_window_draw_stays_within_bounds() {
        let window = Window::new(45, 60).unwrap();
        for _ in 0..200 {
            let value = window.draw();
            assert!((45..=60).contains(&value));
        }
    }

    #[test]
    fn test_window_draw_degenerate_range() {
        let window = Window::new(7, 7).unwrap();
        assert_eq!(window.draw(), 7);
    }

    #[test]
    fn test_window_new_rejects_inverted_range() {
        assert!(Window::new(10, 5).is_err());
    }

    #[test]
    fn test_window_deserialization_rejects_inverted_range() {
        let result: std::result::Result<PacingConfig, _> =
            toml::from_str("per_action = { min = 9, max = 3 }");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("min 9 exceeds max 3"), "got: {}", err);
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert!(config.features.repost);
        assert!(!config.features.comment);
        assert_eq!(
            config.search.keywords,
            vec!["giveaway", "contest", "sweepstake"]
        );
        assert_eq!(config.pacing.per_post.min(), 180);
        assert_eq!(config.churn.max_following.max(), 1999);
        assert!(config.comments.echo_hashtags);
        config.validate().unwrap();
    }

    #[test]
    fn test_full_config_parses() {
        let toml_str = r#"
[platform]
instance = "https://fedi.example"
token_file = "/tmp/token"

[features]
repost = true
favorite = true
follow = false
comment = true
direct_message = false

[keywords]
repost = ["rt", "boost"]
favorite = ["like"]
follow = ["follow"]
comment = ["reply"]
tag = ["tag"]
direct_message = ["dm"]

[search]
keywords = ["giveaway"]
count = 20
banned_authors = ["bot"]
banned_text = ["crypto"]
include_reposts = false
include_replies = false

[pacing]
multiplier = 0.5
per_action = { min = 1, max = 2 }
per_post = { min = 3, max = 4 }
per_unfollow = { min = 5, max = 6 }
per_churn_cycle = { min = 7, max = 8 }

[churn]
max_following = { min = 100, max = 200 }
campaign_size = { min = 10, max = 20 }

[comments]
echo_hashtags = false
tag_handles = ["friend1"]
phrases = ["Entered"]
punctuation = ["", "!"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();
        assert!(config.features.comment);
        assert!(!config.features.follow);
        assert_eq!(config.search.count, 20);
        assert_eq!(config.pacing.multiplier, 0.5);
        assert_eq!(config.pacing.per_churn_cycle.max(), 8);
        assert_eq!(config.churn.campaign_size.min(), 10);
    }

    #[test]
    fn test_default_config_validates() {
        Config::default_config().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_search_keywords() {
        let mut config = Config::default_config();
        config.search.keywords.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_count() {
        let mut config = Config::default_config();
        config.search.count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_multiplier() {
        let mut config = Config::default_config();
        config.pacing.multiplier = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_multiplier() {
        let mut config = Config::default_config();
        config.pacing.multiplier = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_zero_multiplier() {
        let mut config = Config::default_config();
        config.pacing.multiplier = 0.0;
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_phrases_when_comment_enabled() {
        let mut config = Config::default_config();
        config.features.comment = true;
        config.comments.phrases.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_punctuation_when_dm_enabled() {
        let mut config = Config::default_config();
        config.features.direct_message = true;
        config.comments.punctuation.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_allows_empty_phrases_when_text_features_off() {
        let mut config = Config::default_config();
        config.features.comment = false;
        config.features.direct_message = false;
        config.comments.phrases.clear();
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_tag_handles_when_comment_enabled() {
        let mut config = Config::default_config();
        config.features.comment = true;
        config.comments.tag_handles.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.platform.instance, "https://fedi.example");
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let path = PathBuf::from("/nonexistent/gleaner/config.toml");
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_env_override() {
        std::env::set_var("GLEANER_CONFIG", "/tmp/gleaner-test.toml");
        let path = resolve_config_path().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/gleaner-test.toml"));
        std::env::remove_var("GLEANER_CONFIG");
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_default_location() {
        std::env::remove_var("GLEANER_CONFIG");
        let path = resolve_config_path().unwrap();
        assert!(path.ends_with("gleaner/config.toml"));
    }
}
