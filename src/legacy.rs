/* src/legacy.rs */

//! Boolean like/unlike API kept for screens that have not moved to
//! [`SparkGuard`] yet. Delete once no caller uses it.

#![allow(deprecated)]

use crate::guard::SparkGuard;

#[deprecated(note = "use SparkGuard::spark / SparkGuard::unspark and match on ActionResult")]
pub struct LegacyLikes<'a> {
    guard: &'a SparkGuard,
}

impl<'a> LegacyLikes<'a> {
    pub fn new(guard: &'a SparkGuard) -> Self {
        Self { guard }
    }

    /// `true` when the post ends up liked, immediately or via the offline queue.
    pub async fn like_post(&self, user_id: &str, post_id: &str) -> bool {
        self.guard.spark(Some(user_id), post_id).await.is_done()
    }

    pub async fn unlike_post(&self, user_id: &str, post_id: &str) -> bool {
        self.guard.unspark(Some(user_id), post_id).await.is_done()
    }

    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> bool {
        self.guard.has_sparked(user_id, post_id).await
    }

    /// Likes or unlikes depending on the cached state; returns the new state.
    pub async fn toggle_like(&self, user_id: &str, post_id: &str) -> bool {
        if self.has_liked(user_id, post_id).await {
            let undone = self.unlike_post(user_id, post_id).await;
            !undone
        } else {
            self.like_post(user_id, post_id).await
        }
    }
}
