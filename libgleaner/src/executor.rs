//! Action execution.
//!
//! Carries out the actions a classified post asks for, in a fixed order,
//! with a pause after every platform call. One misbehaving action abandons
//! the rest of the post rather than hammering a platform that is already
//! pushing back; the follow step is the exception, since a refused follow
//! says nothing about whether the host will accept a comment.

use tracing::{info, warn};

use crate::churn::ChurnPolicy;
use crate::config::Config;
use crate::error::{Failure, FatalError};
use crate::pacing::{PaceClass, Pacer};
use crate::platforms::Platform;
use crate::textgen::{hashtags, TextGenerator};
use crate::triage;
use crate::types::{ActionKind, ActionOutcome, ActionSet, ActionStatus, Post};

#[derive(Debug, Clone)]
pub struct Executor {
    churn: ChurnPolicy,
    textgen: TextGenerator,
    echo_hashtags: bool,
    tag_handles: Vec<String>,
}

impl Executor {
    pub fn new(config: &Config) -> Self {
        Executor {
            churn: ChurnPolicy::new(&config.churn),
            textgen: TextGenerator::new(&config.comments),
            echo_hashtags: config.comments.echo_hashtags,
            tag_handles: config.comments.tag_handles.clone(),
        }
    }

    /// Run the applicable actions for one post.
    ///
    /// Order is fixed: repost, favorite, follow, comment, direct message.
    /// A tag comment replaces the plain comment when both are flagged. The
    /// per-post pause runs however the post ends, except on a fatal
    /// failure, which propagates without any further waiting.
    pub async fn execute(
        &self,
        platform: &dyn Platform,
        pacer: &Pacer,
        post: &Post,
        actions: ActionSet,
    ) -> Result<ActionOutcome, FatalError> {
        let mut outcome = ActionOutcome::default();
        self.run_steps(platform, pacer, post, actions, &mut outcome)
            .await?;
        pacer.pause(PaceClass::Post).await;
        Ok(outcome)
    }

    async fn run_steps(
        &self,
        platform: &dyn Platform,
        pacer: &Pacer,
        post: &Post,
        actions: ActionSet,
        outcome: &mut ActionOutcome,
    ) -> Result<(), FatalError> {
        if actions.repost {
            let result = platform.repost(&post.id).await;
            if !self.settle(pacer, ActionKind::Repost, result, outcome).await? {
                return Ok(());
            }
        }

        if actions.favorite {
            let result = platform.favorite(&post.id).await;
            if !self
                .settle(pacer, ActionKind::Favorite, result, outcome)
                .await?
            {
                return Ok(());
            }
        }

        if actions.follow {
            // Make room before adding to the following list.
            outcome.unfollowed = self.churn.maybe_churn(platform, pacer).await?;
            let target = post.engagement_author();
            let result = platform.follow(&target.id).await;
            // Best-effort: a refused follow does not abandon the post.
            self.settle(pacer, ActionKind::Follow, result, outcome)
                .await?;
        }

        if actions.tag_comment || actions.comment {
            let (kind, text) = if actions.tag_comment {
                (ActionKind::TagComment, self.tag_comment_text(post))
            } else {
                (ActionKind::Comment, self.comment_text(post))
            };
            let result = platform.comment(&post.id, &text).await;
            if !self.settle(pacer, kind, result, outcome).await? {
                return Ok(());
            }
        }

        if actions.direct_message {
            let target = post.engagement_author();
            let text = self.textgen.generate();
            let result = platform.direct_message(&target.handle, &text).await;
            if !self
                .settle(pacer, ActionKind::DirectMessage, result, outcome)
                .await?
            {
                return Ok(());
            }
        }

        Ok(())
    }

    /// Record one action result and run the per-action pause.
    ///
    /// Returns whether the post is still worth continuing. Fatal failures
    /// propagate immediately, before any pause.
    async fn settle(
        &self,
        pacer: &Pacer,
        kind: ActionKind,
        result: Result<(), Failure>,
        outcome: &mut ActionOutcome,
    ) -> Result<bool, FatalError> {
        match result {
            Ok(()) => {
                info!(action = %kind, "action succeeded");
                outcome.record(kind, ActionStatus::Succeeded);
                pacer.pause(PaceClass::Action).await;
                Ok(true)
            }
            Err(failure) => {
                if triage::is_fatal(&failure) {
                    return Err(FatalError::new(kind.as_str(), failure));
                }
                warn!(action = %kind, error = %failure, "action failed");
                outcome.record(kind, ActionStatus::Failed);
                pacer.pause(PaceClass::Action).await;
                Ok(false)
            }
        }
    }

    fn comment_text(&self, post: &Post) -> String {
        let mut text = self.textgen.generate();
        if self.echo_hashtags {
            for tag in hashtags(&post.text) {
                text.push(' ');
                text.push_str(tag);
            }
        }
        text
    }

    fn tag_comment_text(&self, post: &Post) -> String {
        let mut text = String::new();
        for handle in &self.tag_handles {
            text.push('@');
            text.push_str(handle);
            text.push(' ');
        }
        text.push_str(&self.comment_text(post));
        text
    }
}
