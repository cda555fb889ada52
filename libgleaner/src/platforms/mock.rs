//! Mock platform implementation for testing
//!
//! Fully scripted: tests queue search batches, engagement states, and
//! failures up front, then assert against the journal of calls the code
//! under test actually made. No timers, no network.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::Failure;
use crate::platforms::Platform;
use crate::types::{Author, Engagement, Post};

/// One platform call as the mock observed it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Verify,
    Search { keyword: String, limit: u32 },
    Engagement { post_id: String },
    Repost { post_id: String },
    Favorite { post_id: String },
    Follow { account_id: String },
    Comment { post_id: String, text: String },
    DirectMessage { handle: String, text: String },
    FollowingCount,
    FollowingPage { limit: u32 },
    Unfollow { account_id: String },
}

#[derive(Default)]
pub struct MockPlatform {
    calls: Arc<Mutex<Vec<Call>>>,
    batches: Mutex<VecDeque<Vec<Post>>>,
    search_failure: Option<Failure>,
    engagements: HashMap<String, Engagement>,
    engagement_failure: Option<Failure>,
    repost_failure: Option<Failure>,
    favorite_failure: Option<Failure>,
    follow_failure: Option<Failure>,
    comment_failure: Option<Failure>,
    direct_message_failure: Option<Failure>,
    following_count: Mutex<u64>,
    following_count_failure: Option<Failure>,
    following_pages: Mutex<VecDeque<Result<Vec<Author>, Failure>>>,
    unfollow_failures: HashMap<String, Failure>,
}

impl MockPlatform {
    pub fn new() -> Self {
        MockPlatform::default()
    }

    /// Queue one search batch; batches are served in order and an empty
    /// queue serves empty batches.
    pub fn with_batch(self, posts: Vec<Post>) -> Self {
        self.batches.lock().unwrap().push_back(posts);
        self
    }

    pub fn with_search_failure(mut self, failure: Failure) -> Self {
        self.search_failure = Some(failure);
        self
    }

    pub fn with_engagement(mut self, post_id: &str, engagement: Engagement) -> Self {
        self.engagements.insert(post_id.to_string(), engagement);
        self
    }

    pub fn with_engagement_failure(mut self, failure: Failure) -> Self {
        self.engagement_failure = Some(failure);
        self
    }

    pub fn with_repost_failure(mut self, failure: Failure) -> Self {
        self.repost_failure = Some(failure);
        self
    }

    pub fn with_favorite_failure(mut self, failure: Failure) -> Self {
        self.favorite_failure = Some(failure);
        self
    }

    pub fn with_follow_failure(mut self, failure: Failure) -> Self {
        self.follow_failure = Some(failure);
        self
    }

    pub fn with_comment_failure(mut self, failure: Failure) -> Self {
        self.comment_failure = Some(failure);
        self
    }

    pub fn with_direct_message_failure(mut self, failure: Failure) -> Self {
        self.direct_message_failure = Some(failure);
        self
    }

    pub fn with_following_count(self, count: u64) -> Self {
        *self.following_count.lock().unwrap() = count;
        self
    }

    pub fn with_following_count_failure(mut self, failure: Failure) -> Self {
        self.following_count_failure = Some(failure);
        self
    }

    /// Queue one following page, newest follow first.
    pub fn with_following_page(self, page: Vec<Author>) -> Self {
        self.following_pages.lock().unwrap().push_back(Ok(page));
        self
    }

    pub fn with_following_page_failure(self, failure: Failure) -> Self {
        self.following_pages.lock().unwrap().push_back(Err(failure));
        self
    }

    /// Make unfollowing one specific account fail.
    pub fn with_unfollow_failure(mut self, account_id: &str, failure: Failure) -> Self {
        self.unfollow_failures
            .insert(account_id.to_string(), failure);
        self
    }

    /// Snapshot of every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Shared handle to the journal, for tests that move the mock into a
    /// `Box<dyn Platform>` and inspect afterward.
    pub fn journal(&self) -> Arc<Mutex<Vec<Call>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn verify(&mut self) -> Result<Author, Failure> {
        self.record(Call::Verify);
        Ok(Author::new("self", "gleaner@mock.example"))
    }

    async fn search_posts(&self, keyword: &str, limit: u32) -> Result<Vec<Post>, Failure> {
        self.record(Call::Search {
            keyword: keyword.to_string(),
            limit,
        });
        if let Some(failure) = &self.search_failure {
            return Err(failure.clone());
        }
        Ok(self
            .batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn engagement(&self, post_id: &str) -> Result<Engagement, Failure> {
        self.record(Call::Engagement {
            post_id: post_id.to_string(),
        });
        if let Some(failure) = &self.engagement_failure {
            return Err(failure.clone());
        }
        Ok(self.engagements.get(post_id).copied().unwrap_or_default())
    }

    async fn repost(&self, post_id: &str) -> Result<(), Failure> {
        self.record(Call::Repost {
            post_id: post_id.to_string(),
        });
        match &self.repost_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn favorite(&self, post_id: &str) -> Result<(), Failure> {
        self.record(Call::Favorite {
            post_id: post_id.to_string(),
        });
        match &self.favorite_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn follow(&self, account_id: &str) -> Result<(), Failure> {
        self.record(Call::Follow {
            account_id: account_id.to_string(),
        });
        match &self.follow_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn comment(&self, post_id: &str, text: &str) -> Result<(), Failure> {
        self.record(Call::Comment {
            post_id: post_id.to_string(),
            text: text.to_string(),
        });
        match &self.comment_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn direct_message(&self, handle: &str, text: &str) -> Result<(), Failure> {
        self.record(Call::DirectMessage {
            handle: handle.to_string(),
            text: text.to_string(),
        });
        match &self.direct_message_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    async fn following_count(&self) -> Result<u64, Failure> {
        self.record(Call::FollowingCount);
        match &self.following_count_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(*self.following_count.lock().unwrap()),
        }
    }

    async fn following_page(&self, limit: u32) -> Result<Vec<Author>, Failure> {
        self.record(Call::FollowingPage { limit });
        self.following_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn unfollow(&self, account_id: &str) -> Result<(), Failure> {
        self.record(Call::Unfollow {
            account_id: account_id.to_string(),
        });
        if let Some(failure) = self.unfollow_failures.get(account_id) {
            return Err(failure.clone());
        }
        let mut count = self.following_count.lock().unwrap();
        *count = count.saturating_sub(1);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_journal_records_calls_in_order() {
        let platform = MockPlatform::new();
        platform.repost("5").await.unwrap();
        platform.favorite("5").await.unwrap();
        assert_eq!(
            platform.calls(),
            vec![
                Call::Repost {
                    post_id: "5".to_string()
                },
                Call::Favorite {
                    post_id: "5".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_scripted_failure_is_returned() {
        let platform = MockPlatform::new().with_repost_failure(Failure::api(429, "slow down"));
        let err = platform.repost("5").await.unwrap_err();
        assert_eq!(err, Failure::api(429, "slow down"));
    }

    #[tokio::test]
    async fn test_batches_served_in_order_then_empty() {
        let platform = MockPlatform::new()
            .with_batch(vec![])
            .with_batch(vec![Post {
                id: "9".to_string(),
                author: Author::new("2", "a@b"),
                text: "win".to_string(),
                is_repost: false,
                original_author: None,
                is_reply: false,
            }]);
        assert!(platform.search_posts("x", 10).await.unwrap().is_empty());
        assert_eq!(platform.search_posts("x", 10).await.unwrap().len(), 1);
        assert!(platform.search_posts("x", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unfollow_decrements_count() {
        let platform = MockPlatform::new().with_following_count(10);
        platform.unfollow("3").await.unwrap();
        assert_eq!(platform.following_count().await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_page_queue_serves_failures() {
        let platform = MockPlatform::new()
            .with_following_page(vec![Author::new("1", "a@b")])
            .with_following_page_failure(Failure::Network("down".to_string()));
        assert_eq!(platform.following_page(40).await.unwrap().len(), 1);
        assert!(platform.following_page(40).await.is_err());
        assert!(platform.following_page(40).await.unwrap().is_empty());
    }
}
