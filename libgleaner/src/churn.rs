//! Following-list churn.
//!
//! Contest entry follows pile up fast, and platforms cap how many accounts
//! one account may follow. Before every new follow the engine asks this
//! policy whether the following list has hit its ceiling; when it has, a
//! bounded unfollow campaign sheds the oldest follows to make room.

use tracing::{debug, info, warn};

use crate::config::{ChurnConfig, Window};
use crate::error::FatalError;
use crate::pacing::{PaceClass, Pacer};
use crate::platforms::Platform;
use crate::triage;

/// Page size for following-list reads.
const FOLLOWING_PAGE_LIMIT: u32 = 40;

#[derive(Debug, Clone)]
pub struct ChurnPolicy {
    max_following: Window,
    campaign_size: Window,
}

impl ChurnPolicy {
    pub fn new(config: &ChurnConfig) -> Self {
        ChurnPolicy {
            max_following: config.max_following,
            campaign_size: config.campaign_size,
        }
    }

    /// Run an unfollow campaign if the following list has hit its ceiling.
    ///
    /// The count is re-fetched on every call; follow totals drift from
    /// outside this process, so a cached value would be wrong within
    /// minutes. Both the ceiling and the campaign size are drawn fresh so
    /// consecutive campaigns never trip at the same number.
    ///
    /// Returns how many accounts were actually unfollowed. A failed page
    /// fetch ends the campaign early with the partial count; a fatal
    /// failure anywhere propagates immediately.
    pub async fn maybe_churn(
        &self,
        platform: &dyn Platform,
        pacer: &Pacer,
    ) -> Result<usize, FatalError> {
        let count = match platform.following_count().await {
            Ok(count) => count,
            Err(failure) => {
                if triage::is_fatal(&failure) {
                    return Err(FatalError::new("following count", failure));
                }
                warn!(error = %failure, "following count unavailable, skipping churn check");
                return Ok(0);
            }
        };

        let ceiling = self.max_following.draw();
        if count < ceiling {
            debug!(count, ceiling, "following below ceiling");
            return Ok(0);
        }

        let goal = self.campaign_size.draw() as usize;
        info!(count, ceiling, goal, "following ceiling reached, starting unfollow campaign");
        pacer.pause(PaceClass::ChurnCycle).await;

        let mut removed = 0;
        'campaign: while removed < goal && !pacer.shutdown_requested() {
            let page = match platform.following_page(FOLLOWING_PAGE_LIMIT).await {
                Ok(page) => page,
                Err(failure) => {
                    if triage::is_fatal(&failure) {
                        return Err(FatalError::new("following page", failure));
                    }
                    warn!(error = %failure, removed, "following page fetch failed, ending campaign early");
                    break;
                }
            };
            if page.is_empty() {
                debug!(removed, "following list exhausted");
                break;
            }

            let before = removed;
            // Pages arrive newest-first; walking them backward sheds the
            // oldest follows first.
            for member in page.iter().rev() {
                if removed >= goal || pacer.shutdown_requested() {
                    break 'campaign;
                }
                match platform.unfollow(&member.id).await {
                    Ok(()) => {
                        removed += 1;
                        debug!(handle = %member.handle, removed, goal, "unfollowed");
                    }
                    Err(failure) => {
                        if triage::is_fatal(&failure) {
                            return Err(FatalError::new("unfollow", failure));
                        }
                        warn!(handle = %member.handle, error = %failure, "unfollow failed, skipping");
                    }
                }
                pacer.pause(PaceClass::Unfollow).await;
            }
            if removed == before {
                warn!(removed, "no progress over a full page, ending campaign early");
                break;
            }
        }

        pacer.pause(PaceClass::ChurnCycle).await;
        info!(removed, "unfollow campaign finished");
        Ok(removed)
    }
}
