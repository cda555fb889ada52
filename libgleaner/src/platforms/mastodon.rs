//! Mastodon platform implementation
//!
//! Talks to Mastodon and other Fediverse servers that speak the Mastodon
//! API through the megalodon library. Post bodies arrive as HTML and are
//! flattened to lowercase plain text before the classifier sees them.

use async_trait::async_trait;
use megalodon::megalodon::{
    AccountFollowersInputOptions, PostStatusInputOptions, SearchInputOptions, SearchType,
};
use megalodon::{entities, Megalodon, SNS};
use tracing::debug;

use crate::config::PlatformConfig;
use crate::error::{Failure, Result};
use crate::platforms::Platform;
use crate::types::{Author, Engagement, Post};

/// Mastodon platform client
pub struct MastodonPlatform {
    /// The megalodon client for API interactions
    client: Box<dyn Megalodon + Send + Sync>,

    /// The instance URL (e.g., "https://mastodon.social")
    instance_url: String,

    /// Acting account, resolved by `verify`
    account: Option<Author>,
}

impl MastodonPlatform {
    /// Create a new Mastodon client
    ///
    /// # Arguments
    ///
    /// * `instance_url` - The base URL of the instance
    /// * `access_token` - OAuth access token for authentication
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use libgleaner::platforms::mastodon::MastodonPlatform;
    ///
    /// # fn example() -> libgleaner::Result<()> {
    /// let platform = MastodonPlatform::new(
    ///     "https://mastodon.social".to_string(),
    ///     "your-access-token".to_string(),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(instance_url: String, access_token: String) -> Result<Self> {
        let client = megalodon::generator(
            SNS::Mastodon,
            instance_url.clone(),
            Some(access_token),
            None,
        )
        .map_err(|e| {
            Failure::Authentication(format!("Failed to create Mastodon client: {:?}", e))
        })?;

        Ok(Self {
            client,
            instance_url,
            account: None,
        })
    }

    /// Create a Mastodon client from configuration
    ///
    /// Reads the access token from the configured token file. Fails if the
    /// file cannot be read or holds nothing but whitespace.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use libgleaner::config::PlatformConfig;
    /// use libgleaner::platforms::mastodon::MastodonPlatform;
    ///
    /// # fn example() -> libgleaner::Result<()> {
    /// let config = PlatformConfig {
    ///     instance: "mastodon.social".to_string(),
    ///     token_file: "~/.config/gleaner/mastodon.token".to_string(),
    /// };
    ///
    /// let platform = MastodonPlatform::from_config(&config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        let token_path = shellexpand::full(&config.token_file).map_err(|e| {
            Failure::Authentication(format!("Failed to expand token file path: {}", e))
        })?;

        let token = std::fs::read_to_string(token_path.as_ref())
            .map_err(|e| {
                Failure::Authentication(format!("Failed to read Mastodon token file: {}", e))
            })?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(Failure::Authentication("Mastodon token file is empty".to_string()).into());
        }

        // Ensure instance URL has a scheme
        let instance_url =
            if config.instance.starts_with("http://") || config.instance.starts_with("https://") {
                config.instance.clone()
            } else {
                format!("https://{}", config.instance)
            };

        Self::new(instance_url, token)
    }

    fn account_id(&self) -> std::result::Result<String, Failure> {
        self.account
            .as_ref()
            .map(|author| author.id.clone())
            .ok_or_else(|| {
                Failure::Authentication("acting account not resolved; verify first".to_string())
            })
    }
}

#[async_trait]
impl Platform for MastodonPlatform {
    async fn verify(&mut self) -> std::result::Result<Author, Failure> {
        debug!(instance = %self.instance_url, "verifying credentials");
        let response = self
            .client
            .verify_account_credentials()
            .await
            .map_err(|e| map_megalodon_error(e, "verify credentials"))?;

        let account = response.json;
        let author = Author::new(account.id, account.acct);
        self.account = Some(author.clone());
        Ok(author)
    }

    async fn search_posts(
        &self,
        keyword: &str,
        limit: u32,
    ) -> std::result::Result<Vec<Post>, Failure> {
        let options = SearchInputOptions {
            r#type: Some(SearchType::Statuses),
            limit: Some(limit),
            ..Default::default()
        };
        let response = self
            .client
            .search(keyword.to_string(), Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "search"))?;

        Ok(response
            .json
            .statuses
            .into_iter()
            .map(status_to_post)
            .collect())
    }

    async fn engagement(&self, post_id: &str) -> std::result::Result<Engagement, Failure> {
        let response = self
            .client
            .get_status(post_id.to_string())
            .await
            .map_err(|e| map_megalodon_error(e, "engagement lookup"))?;

        let status = response.json;
        Ok(Engagement {
            favorited: status.favourited.unwrap_or(false),
            reposted: status.reblogged.unwrap_or(false),
        })
    }

    async fn repost(&self, post_id: &str) -> std::result::Result<(), Failure> {
        self.client
            .reblog_status(post_id.to_string())
            .await
            .map_err(|e| map_megalodon_error(e, "repost"))?;
        Ok(())
    }

    async fn favorite(&self, post_id: &str) -> std::result::Result<(), Failure> {
        self.client
            .favourite_status(post_id.to_string())
            .await
            .map_err(|e| map_megalodon_error(e, "favorite"))?;
        Ok(())
    }

    async fn follow(&self, account_id: &str) -> std::result::Result<(), Failure> {
        self.client
            .follow_account(account_id.to_string(), None)
            .await
            .map_err(|e| map_megalodon_error(e, "follow"))?;
        Ok(())
    }

    async fn comment(&self, post_id: &str, text: &str) -> std::result::Result<(), Failure> {
        let options = PostStatusInputOptions {
            in_reply_to_id: Some(post_id.to_string()),
            ..Default::default()
        };
        self.client
            .post_status(text.to_string(), Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "comment"))?;
        Ok(())
    }

    async fn direct_message(&self, handle: &str, text: &str) -> std::result::Result<(), Failure> {
        // Mastodon direct messages are statuses with Direct visibility that
        // mention the recipient.
        let options = PostStatusInputOptions {
            visibility: Some(entities::StatusVisibility::Direct),
            ..Default::default()
        };
        let status = format!("@{} {}", handle, text);
        self.client
            .post_status(status, Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "direct message"))?;
        Ok(())
    }

    async fn following_count(&self) -> std::result::Result<u64, Failure> {
        let response = self
            .client
            .verify_account_credentials()
            .await
            .map_err(|e| map_megalodon_error(e, "following count"))?;
        Ok(u64::from(response.json.following_count))
    }

    async fn following_page(&self, limit: u32) -> std::result::Result<Vec<Author>, Failure> {
        let id = self.account_id()?;
        let options = AccountFollowersInputOptions {
            limit: Some(limit),
            ..Default::default()
        };
        let response = self
            .client
            .get_account_following(id, Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "following page"))?;

        Ok(response
            .json
            .into_iter()
            .map(|account| Author::new(account.id, account.acct))
            .collect())
    }

    async fn unfollow(&self, account_id: &str) -> std::result::Result<(), Failure> {
        self.client
            .unfollow_account(account_id.to_string())
            .await
            .map_err(|e| map_megalodon_error(e, "unfollow"))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "mastodon"
    }
}

/// Convert a search hit into the engine's post shape.
///
/// For boosts the inner status is the one to act on: favoriting a boost
/// wrapper does nothing useful, and the contest host is the inner author.
fn status_to_post(status: entities::Status) -> Post {
    let author = Author::new(status.account.id, status.account.acct);
    let is_reply = status.in_reply_to_id.is_some();
    match status.reblog {
        Some(boxed) => {
            let original = *boxed;
            Post {
                id: original.id,
                text: flatten_html(&original.content).to_lowercase(),
                author,
                is_repost: true,
                original_author: Some(Author::new(original.account.id, original.account.acct)),
                is_reply,
            }
        }
        None => Post {
            id: status.id,
            text: flatten_html(&status.content).to_lowercase(),
            author,
            is_repost: false,
            original_author: None,
            is_reply,
        },
    }
}

/// Strip HTML down to the text the classifier matches against.
///
/// Block-level boundaries become spaces so words in adjacent paragraphs
/// stay separate tokens; runs of whitespace collapse afterwards. Hashtag
/// anchors survive because `#` and the tag name are text nodes.
fn flatten_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag = String::new();
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag.trim_start_matches('/');
                if name.starts_with('p') || name.starts_with("br") || name.starts_with("div") {
                    text.push(' ');
                }
            }
            _ if in_tag => tag.push(c),
            _ => text.push(c),
        }
    }
    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map megalodon errors to [`Failure`]
///
/// The megalodon error type does not expose the HTTP status directly, so
/// it is recovered from the error text. Anything carrying a status becomes
/// `Failure::Api` and triage decides what the code means; statusless
/// errors fall back to authentication or network buckets by keyword.
fn map_megalodon_error(error: megalodon::error::Error, context: &str) -> Failure {
    let error_str = error.to_string();

    if let Some(status) = extract_http_status(&error_str) {
        return Failure::Api {
            status,
            message: format!("{}: {}", context, error_str),
        };
    }

    let error_lower = error_str.to_lowercase();
    if error_lower.contains("unauthorized")
        || error_lower.contains("forbidden")
        || error_lower.contains("authentication")
        || error_lower.contains("token")
    {
        Failure::Authentication(format!("{}: {}", context, error_str))
    } else {
        Failure::Network(format!("{}: {}", context, error_str))
    }
}

/// Extract an HTTP status code from an error message.
///
/// Looks for the prefixes megalodon and reqwest put in front of codes,
/// then for any standalone three-digit number delimited by `:` or space.
fn extract_http_status(error_str: &str) -> Option<u16> {
    const PREFIXES: [&str; 4] = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &PREFIXES {
        if let Some(pos) = error_str.find(prefix) {
            let rest = &error_str[pos + prefix.len()..];
            if let Some(code) = rest.get(0..3).and_then(|s| s.parse::<u16>().ok()) {
                if (100..=599).contains(&code) {
                    return Some(code);
                }
            }
        }
    }

    let bytes = error_str.as_bytes();
    for (i, window) in bytes.windows(4).enumerate() {
        let delimited = window[3] == b':' || window[3] == b' ';
        if !delimited || !window[..3].iter().all(u8::is_ascii_digit) {
            continue;
        }
        // Skip digits that are the tail of a longer number
        if i > 0 && bytes[i - 1].is_ascii_digit() {
            continue;
        }
        if let Ok(code) = std::str::from_utf8(&window[..3]).unwrap_or("").parse::<u16>() {
            if (100..=599).contains(&code) {
                return Some(code);
            }
        }
    }

    None
}
