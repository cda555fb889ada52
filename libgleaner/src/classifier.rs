//! Post classification.
//!
//! Decides, for each search hit, whether the post is a contest worth
//! engaging and which actions it asks for. Classification is read-only:
//! its single external call is the engagement lookup, and everything else
//! is pure string work over the already-lowercased post body.

use tracing::{debug, warn};

use crate::config::{Config, FeatureConfig, KeywordConfig};
use crate::error::FatalError;
use crate::platforms::Platform;
use crate::triage;
use crate::types::{ActionSet, Post, SkipReason, Verdict};

#[derive(Debug, Clone)]
pub struct Classifier {
    features: FeatureConfig,
    keywords: KeywordConfig,
    banned_authors: Vec<String>,
    banned_text: Vec<String>,
}

fn lowered(list: &[String]) -> Vec<String> {
    list.iter().map(|word| word.to_lowercase()).collect()
}

fn banned_word<'a>(list: &'a [String], haystack: &str) -> Option<&'a str> {
    list.iter()
        .find(|word| haystack.contains(word.as_str()))
        .map(String::as_str)
}

/// Substring containment for every keyword except the bare `rt`, which
/// only counts as its own whitespace-delimited token. Contest posts write
/// "rt to enter"; "shirt" and "start" must not read as repost requests.
fn keyword_matches(text: &str, keyword: &str) -> bool {
    if keyword == "rt" {
        text.split_whitespace().any(|token| token == "rt")
    } else {
        text.contains(keyword)
    }
}

fn matches_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| keyword_matches(text, k))
}

impl Classifier {
    pub fn new(config: &Config) -> Self {
        Classifier {
            features: config.features,
            keywords: KeywordConfig {
                repost: lowered(&config.keywords.repost),
                favorite: lowered(&config.keywords.favorite),
                follow: lowered(&config.keywords.follow),
                comment: lowered(&config.keywords.comment),
                tag: lowered(&config.keywords.tag),
                direct_message: lowered(&config.keywords.direct_message),
            },
            banned_authors: lowered(&config.search.banned_authors),
            banned_text: lowered(&config.search.banned_text),
        }
    }

    /// Classify one post.
    ///
    /// The banned-list checks run first so obviously unwanted posts never
    /// cost an engagement lookup. A non-fatal lookup failure skips the
    /// post; a fatal one propagates so the run can stop.
    pub async fn classify(
        &self,
        platform: &dyn Platform,
        post: &Post,
    ) -> Result<Verdict, FatalError> {
        if let Some(word) = self.banned_author_word(post) {
            debug!(author = %post.author.handle, word, "skipping banned author");
            return Ok(Verdict::Skip(SkipReason::BannedAuthor));
        }
        if let Some(word) = banned_word(&self.banned_text, &post.text) {
            debug!(post = %post.id, word, "skipping banned text");
            return Ok(Verdict::Skip(SkipReason::BannedText));
        }

        match platform.engagement(&post.id).await {
            Ok(engagement) if engagement.any() => {
                debug!(post = %post.id, "already engaged, skipping");
                return Ok(Verdict::Skip(SkipReason::AlreadyEngaged));
            }
            Ok(_) => {}
            Err(failure) => {
                if triage::is_fatal(&failure) {
                    return Err(FatalError::new("engagement lookup", failure));
                }
                warn!(post = %post.id, error = %failure, "engagement lookup failed, skipping post");
                return Ok(Verdict::Skip(SkipReason::LookupFailed));
            }
        }

        let actions = self.detect(&post.text);
        if !actions.is_actionable() {
            debug!(post = %post.id, "no actionable keywords");
            return Ok(Verdict::Skip(SkipReason::NoActions));
        }
        Ok(Verdict::Engage(actions))
    }

    fn banned_author_word(&self, post: &Post) -> Option<&str> {
        let handle = post.author.handle.to_lowercase();
        if let Some(word) = banned_word(&self.banned_authors, &handle) {
            return Some(word);
        }
        if let Some(original) = &post.original_author {
            let handle = original.handle.to_lowercase();
            if let Some(word) = banned_word(&self.banned_authors, &handle) {
                return Some(word);
            }
        }
        None
    }

    /// Map keyword hits to action flags, honoring the feature toggles.
    /// Tag detection rides the comment toggle since a tag comment is
    /// delivered as a comment.
    fn detect(&self, text: &str) -> ActionSet {
        let mut actions = ActionSet::default();
        if self.features.repost {
            actions.repost = matches_any(text, &self.keywords.repost);
        }
        if self.features.favorite {
            actions.favorite = matches_any(text, &self.keywords.favorite);
        }
        if self.features.follow {
            actions.follow = matches_any(text, &self.keywords.follow);
        }
        if self.features.comment {
            actions.comment = matches_any(text, &self.keywords.comment);
            actions.tag_comment = matches_any(text, &self.keywords.tag);
        }
        if self.features.direct_message {
            actions.direct_message = matches_any(text, &self.keywords.direct_message);
        }
        actions
    }
}
