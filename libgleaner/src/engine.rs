//! The poll loop.
//!
//! Rotates through the configured search keywords, classifies every hit,
//! and hands engageable posts to the executor. The loop only stops for a
//! shutdown request or a fatal platform failure; everything else is logged
//! and survived.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::config::{Config, SearchConfig};
use crate::error::{FatalError, Result};
use crate::executor::Executor;
use crate::pacing::{PaceClass, Pacer, Shutdown};
use crate::platforms::Platform;
use crate::triage;
use crate::types::{ActionKind, ActionOutcome, ActionStatus, Post, Verdict};

/// Tallies for one run, kept current even when the run ends early.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub batches: u64,
    pub posts_seen: u64,
    pub posts_skipped: u64,
    pub posts_engaged: u64,
    pub reposts: u64,
    pub favorites: u64,
    pub follows: u64,
    pub comments: u64,
    pub tag_comments: u64,
    pub direct_messages: u64,
    pub unfollows: u64,
}

impl RunSummary {
    fn absorb(&mut self, outcome: &ActionOutcome) {
        for kind in ActionKind::ALL {
            if outcome.get(kind) != ActionStatus::Succeeded {
                continue;
            }
            match kind {
                ActionKind::Repost => self.reposts += 1,
                ActionKind::Favorite => self.favorites += 1,
                ActionKind::Follow => self.follows += 1,
                ActionKind::Comment => self.comments += 1,
                ActionKind::TagComment => self.tag_comments += 1,
                ActionKind::DirectMessage => self.direct_messages += 1,
            }
        }
        self.unfollows += outcome.unfollowed as u64;
    }
}

pub struct Engine {
    platform: Box<dyn Platform>,
    classifier: Classifier,
    executor: Executor,
    pacer: Pacer,
    search: SearchConfig,
    cursor: usize,
    summary: RunSummary,
}

impl Engine {
    pub fn new(config: Config, platform: Box<dyn Platform>, shutdown: Shutdown) -> Self {
        let classifier = Classifier::new(&config);
        let executor = Executor::new(&config);
        let pacer = Pacer::new(config.pacing.clone(), shutdown);
        Engine {
            platform,
            classifier,
            executor,
            pacer,
            search: config.search,
            cursor: 0,
            summary: RunSummary::default(),
        }
    }

    /// Tallies accumulated so far. Valid even after a run ended early on a
    /// fatal failure.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Poll until shutdown is requested or a fatal failure surfaces.
    pub async fn run(&mut self) -> Result<()> {
        info!(platform = self.platform.name(), "engine starting");
        loop {
            if self.pacer.shutdown_requested() {
                info!("shutdown requested, stopping");
                return Ok(());
            }
            let batch = self.next_batch().await?;
            if batch.is_empty() {
                // An idle search term must not turn into a hot loop.
                self.pacer.pause(PaceClass::Post).await;
                continue;
            }
            for post in batch {
                if self.pacer.shutdown_requested() {
                    info!("shutdown requested, abandoning batch");
                    return Ok(());
                }
                self.process(post).await?;
            }
        }
    }

    /// Process a single batch and return.
    pub async fn run_once(&mut self) -> Result<()> {
        let batch = self.next_batch().await?;
        for post in batch {
            if self.pacer.shutdown_requested() {
                break;
            }
            self.process(post).await?;
        }
        Ok(())
    }

    /// Fetch the next batch, advancing the keyword rotation.
    ///
    /// A transient search failure yields an empty batch; the rotation still
    /// advances so one broken term cannot wedge the loop.
    async fn next_batch(&mut self) -> std::result::Result<Vec<Post>, FatalError> {
        let keyword = match self.search.keywords.get(self.cursor) {
            Some(keyword) => keyword.clone(),
            None => return Ok(Vec::new()),
        };
        self.cursor = (self.cursor + 1) % self.search.keywords.len();

        self.summary.batches += 1;
        let posts = match self.platform.search_posts(&keyword, self.search.count).await {
            Ok(posts) => posts,
            Err(failure) => {
                if triage::is_fatal(&failure) {
                    return Err(FatalError::new("search", failure));
                }
                warn!(keyword, error = %failure, "search failed, serving empty batch");
                Vec::new()
            }
        };

        let fetched = posts.len();
        let include_reposts = self.search.include_reposts;
        let include_replies = self.search.include_replies;
        let batch: Vec<Post> = posts
            .into_iter()
            .filter(|post| include_reposts || !post.is_repost)
            .filter(|post| include_replies || !post.is_reply)
            .collect();
        debug!(keyword, fetched, kept = batch.len(), "batch ready");
        Ok(batch)
    }

    async fn process(&mut self, post: Post) -> std::result::Result<(), FatalError> {
        self.summary.posts_seen += 1;
        let verdict = self.classifier.classify(self.platform.as_ref(), &post).await?;
        match verdict {
            Verdict::Skip(reason) => {
                debug!(post = %post.id, author = %post.author.handle, ?reason, "skipping");
                self.summary.posts_skipped += 1;
            }
            Verdict::Engage(actions) => {
                info!(post = %post.id, author = %post.author.handle, "engaging");
                let outcome = self
                    .executor
                    .execute(self.platform.as_ref(), &self.pacer, &post, actions)
                    .await?;
                self.summary.posts_engaged += 1;
                self.summary.absorb(&outcome);
            }
        }
        Ok(())
    }
}
