//! Core types for the Gleaner engine

use std::fmt;

use serde::{Deserialize, Serialize};

/// A platform account: opaque platform identifier plus human-readable handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Platform-assigned account id, used for follow/unfollow calls
    pub id: String,
    /// Handle as shown to humans, e.g. `prizes@example.social`
    pub handle: String,
}

impl Author {
    pub fn new(id: impl Into<String>, handle: impl Into<String>) -> Self {
        Author {
            id: id.into(),
            handle: handle.into(),
        }
    }
}

/// Immutable snapshot of one post as returned by search.
///
/// `text` is the flattened, lowercased body; all keyword matching is
/// case-insensitive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Id of the status to act on (for reposts, the original status)
    pub id: String,
    /// Account that produced the search hit
    pub author: Author,
    /// Lowercased plain-text body
    pub text: String,
    /// Whether the search hit was itself a repost of another status
    pub is_repost: bool,
    /// Original author when `is_repost` is set
    pub original_author: Option<Author>,
    /// Whether the status is a reply to another status
    pub is_reply: bool,
}

impl Post {
    /// The account that follow and direct-message actions target.
    ///
    /// For reposted contests that is the account that ran the contest, not
    /// the account whose repost surfaced in search.
    pub fn engagement_author(&self) -> &Author {
        self.original_author.as_ref().unwrap_or(&self.author)
    }
}

/// Engagement state of a post as reported by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Engagement {
    pub favorited: bool,
    pub reposted: bool,
}

impl Engagement {
    /// True when the acting account already touched this post in any way.
    pub fn any(&self) -> bool {
        self.favorited || self.reposted
    }
}

/// The six engagement operations a contest post can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Repost,
    Favorite,
    Follow,
    Comment,
    TagComment,
    DirectMessage,
}

impl ActionKind {
    /// All kinds, in execution order.
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Repost,
        ActionKind::Favorite,
        ActionKind::Follow,
        ActionKind::Comment,
        ActionKind::TagComment,
        ActionKind::DirectMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Repost => "repost",
            ActionKind::Favorite => "favorite",
            ActionKind::Follow => "follow",
            ActionKind::Comment => "comment",
            ActionKind::TagComment => "tag comment",
            ActionKind::DirectMessage => "direct message",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which actions a post asks for, one flag per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSet {
    pub repost: bool,
    pub favorite: bool,
    pub follow: bool,
    pub comment: bool,
    pub tag_comment: bool,
    pub direct_message: bool,
}

impl ActionSet {
    pub fn get(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Repost => self.repost,
            ActionKind::Favorite => self.favorite,
            ActionKind::Follow => self.follow,
            ActionKind::Comment => self.comment,
            ActionKind::TagComment => self.tag_comment,
            ActionKind::DirectMessage => self.direct_message,
        }
    }

    pub fn set(&mut self, kind: ActionKind, value: bool) {
        match kind {
            ActionKind::Repost => self.repost = value,
            ActionKind::Favorite => self.favorite = value,
            ActionKind::Follow => self.follow = value,
            ActionKind::Comment => self.comment = value,
            ActionKind::TagComment => self.tag_comment = value,
            ActionKind::DirectMessage => self.direct_message = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        ActionKind::ALL.iter().all(|k| !self.get(*k))
    }

    /// Whether this set is worth engaging.
    ///
    /// A post that only asks for a follow is almost never a contest, so a
    /// lone follow flag does not count as actionable.
    pub fn is_actionable(&self) -> bool {
        let follow_only = self.follow
            && !self.repost
            && !self.favorite
            && !self.comment
            && !self.tag_comment
            && !self.direct_message;
        !self.is_empty() && !follow_only
    }
}

/// Result of one action attempt against the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    NotAttempted,
    Succeeded,
    Failed,
}

/// Per-kind outcomes accumulated while executing one post, plus the number
/// of accounts shed by any unfollow campaign the follow step triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub repost: ActionStatus,
    pub favorite: ActionStatus,
    pub follow: ActionStatus,
    pub comment: ActionStatus,
    pub tag_comment: ActionStatus,
    pub direct_message: ActionStatus,
    pub unfollowed: usize,
}

impl ActionOutcome {
    pub fn get(&self, kind: ActionKind) -> ActionStatus {
        match kind {
            ActionKind::Repost => self.repost,
            ActionKind::Favorite => self.favorite,
            ActionKind::Follow => self.follow,
            ActionKind::Comment => self.comment,
            ActionKind::TagComment => self.tag_comment,
            ActionKind::DirectMessage => self.direct_message,
        }
    }

    pub fn record(&mut self, kind: ActionKind, status: ActionStatus) {
        match kind {
            ActionKind::Repost => self.repost = status,
            ActionKind::Favorite => self.favorite = status,
            ActionKind::Follow => self.follow = status,
            ActionKind::Comment => self.comment = status,
            ActionKind::TagComment => self.tag_comment = status,
            ActionKind::DirectMessage => self.direct_message = status,
        }
    }

    /// Number of actions that went through.
    pub fn succeeded(&self) -> usize {
        ActionKind::ALL
            .iter()
            .filter(|k| self.get(**k) == ActionStatus::Succeeded)
            .count()
    }
}

/// Why the classifier refused a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Author handle contains a banned word
    BannedAuthor,
    /// Post body contains a banned word
    BannedText,
    /// The acting account already favorited or reposted it
    AlreadyEngaged,
    /// The engagement lookup failed non-fatally
    LookupFailed,
    /// No actionable keywords found
    NoActions,
}

/// Classifier decision for one post.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Engage the post with the given action flags
    Engage(ActionSet),
    /// Leave the post alone
    Skip(SkipReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            id: "100".to_string(),
            author: Author::new("7", "booster@example.social"),
            text: "rt to win".to_string(),
            is_repost: false,
            original_author: None,
            is_reply: false,
        }
    }

    #[test]
    fn test_engagement_author_plain_post() {
        let post = sample_post();
        assert_eq!(post.engagement_author().handle, "booster@example.social");
    }

    #[test]
    fn test_engagement_author_prefers_original() {
        let mut post = sample_post();
        post.is_repost = true;
        post.original_author = Some(Author::new("42", "contest@example.social"));
        assert_eq!(post.engagement_author().id, "42");
    }

    #[test]
    fn test_engagement_any() {
        assert!(!Engagement::default().any());
        assert!(Engagement {
            favorited: true,
            reposted: false
        }
        .any());
        assert!(Engagement {
            favorited: false,
            reposted: true
        }
        .any());
    }

    #[test]
    fn test_action_kind_display() {
        assert_eq!(ActionKind::Repost.to_string(), "repost");
        assert_eq!(ActionKind::DirectMessage.to_string(), "direct message");
        assert_eq!(ActionKind::TagComment.to_string(), "tag comment");
    }

    #[test]
    fn test_action_set_get_set_round_trip() {
        let mut set = ActionSet::default();
        assert!(set.is_empty());
        for kind in ActionKind::ALL {
            set.set(kind, true);
            assert!(set.get(kind));
        }
        assert!(!set.is_empty());
    }

    #[test]
    fn test_empty_set_is_not_actionable() {
        assert!(!ActionSet::default().is_actionable());
    }

    #[test]
    fn test_lone_follow_is_not_actionable() {
        let set = ActionSet {
            follow: true,
            ..Default::default()
        };
        assert!(!set.is_actionable());
    }

    #[test]
    fn test_follow_with_repost_is_actionable() {
        let set = ActionSet {
            follow: true,
            repost: true,
            ..Default::default()
        };
        assert!(set.is_actionable());
    }

    #[test]
    fn test_single_non_follow_flag_is_actionable() {
        let set = ActionSet {
            favorite: true,
            ..Default::default()
        };
        assert!(set.is_actionable());
    }

    #[test]
    fn test_outcome_defaults_to_not_attempted() {
        let outcome = ActionOutcome::default();
        for kind in ActionKind::ALL {
            assert_eq!(outcome.get(kind), ActionStatus::NotAttempted);
        }
        assert_eq!(outcome.succeeded(), 0);
    }

    #[test]
    fn test_outcome_record_and_count() {
        let mut outcome = ActionOutcome::default();
        outcome.record(ActionKind::Repost, ActionStatus::Succeeded);
        outcome.record(ActionKind::Favorite, ActionStatus::Failed);
        outcome.record(ActionKind::Follow, ActionStatus::Succeeded);
        assert_eq!(outcome.succeeded(), 2);
        assert_eq!(outcome.get(ActionKind::Favorite), ActionStatus::Failed);
        assert_eq!(
            outcome.get(ActionKind::Comment),
            ActionStatus::NotAttempted
        );
    }
}
