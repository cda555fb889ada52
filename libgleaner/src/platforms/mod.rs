//! Platform abstraction and implementations
//!
//! Everything the engine needs from a social platform lives behind one
//! trait: searching, reading engagement state, and the write calls the
//! executor performs. Implementations translate their client library's
//! errors into [`Failure`] so triage stays platform-agnostic.

use async_trait::async_trait;

use crate::error::Failure;
use crate::types::{Author, Engagement, Post};

pub mod mastodon;
// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Trait for social platform implementations
#[async_trait]
pub trait Platform: Send + Sync {
    /// Verify credentials and resolve the acting account.
    ///
    /// Must be called once before any other method; implementations may
    /// cache the resolved account for later relationship calls.
    async fn verify(&mut self) -> Result<Author, Failure>;

    /// Fetch one batch of posts matching a search keyword.
    async fn search_posts(&self, keyword: &str, limit: u32) -> Result<Vec<Post>, Failure>;

    /// Whether the acting account already favorited or reposted a post.
    async fn engagement(&self, post_id: &str) -> Result<Engagement, Failure>;

    /// Repost (boost) a post.
    async fn repost(&self, post_id: &str) -> Result<(), Failure>;

    /// Favorite a post.
    async fn favorite(&self, post_id: &str) -> Result<(), Failure>;

    /// Follow an account by id.
    async fn follow(&self, account_id: &str) -> Result<(), Failure>;

    /// Reply to a post.
    async fn comment(&self, post_id: &str, text: &str) -> Result<(), Failure>;

    /// Send a direct message to a handle.
    async fn direct_message(&self, handle: &str, text: &str) -> Result<(), Failure>;

    /// Current size of the following list. Callers must not cache this.
    async fn following_count(&self) -> Result<u64, Failure>;

    /// One page of the following list, newest follow first.
    async fn following_page(&self, limit: u32) -> Result<Vec<Author>, Failure>;

    /// Unfollow an account by id.
    async fn unfollow(&self, account_id: &str) -> Result<(), Failure>;

    /// Lowercase platform name for logs.
    fn name(&self) -> &str;
}
