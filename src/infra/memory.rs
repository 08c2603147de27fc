//! In-process post store used when no database is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, RepoError};
use crate::domain::entities::PostRecord;

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    posts: BTreeMap<i64, PostRecord>,
}

/// Keeps posts in a map keyed by id. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryRepositories {
    state: Mutex<MemoryState>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a post with an explicit creation time.
    pub async fn create_post_at(
        &self,
        params: CreatePostParams,
        created_at: OffsetDateTime,
    ) -> PostRecord {
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let record = PostRecord {
            id: state.last_id,
            content: params.content,
            posted_by: params.posted_by,
            tracking_cookie: params.tracking_cookie,
            created_at,
        };
        state.posts.insert(record.id, record.clone());
        record
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.posts.len()
    }
}

#[async_trait]
impl PostsRepo for MemoryRepositories {
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.posts.values().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.state.lock().await.posts.get(&id).cloned())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        Ok(self
            .create_post_at(params, OffsetDateTime::now_utc())
            .await)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        self.state
            .lock()
            .await
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}
