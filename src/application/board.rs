//! Board service: listing, posting and deleting.

use std::sync::Arc;

use chrono_tz::Tz;
use metrics::counter;
use thiserror::Error;

use crate::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, RepoError};
use crate::domain::entities::PostRecord;
use crate::domain::identity::{Identity, may_delete};
use crate::domain::posts;
use crate::domain::tracking::TrackingId;
use crate::presentation::views::{BoardContext, PostView};
use crate::util::timezone;

pub const POSTS_CREATED_METRIC: &str = "secret_board_posts_created_total";
pub const POSTS_DELETED_METRIC: &str = "secret_board_posts_deleted_total";
pub const DELETE_DENIED_METRIC: &str = "secret_board_delete_denied_total";

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted(PostRecord),
    /// The post exists but the requester is neither its owner nor the admin.
    Denied,
    Missing,
}

#[derive(Clone)]
pub struct BoardService {
    posts: Arc<dyn PostsRepo>,
    writes: Arc<dyn PostsWriteRepo>,
    timezone: Tz,
}

impl BoardService {
    pub fn new(posts: Arc<dyn PostsRepo>, writes: Arc<dyn PostsWriteRepo>, timezone: Tz) -> Self {
        Self {
            posts,
            writes,
            timezone,
        }
    }

    /// Loads every post, newest id first, decorated for the given viewer.
    pub async fn board_context(&self, viewer: Option<&Identity>) -> Result<BoardContext, BoardError> {
        let records = self.posts.list_posts().await?;
        let posts = records
            .iter()
            .map(|record| self.decorate(record, viewer))
            .collect();

        Ok(BoardContext {
            viewer: viewer.map(|identity| identity.to_string()),
            show_authors: viewer.is_some_and(Identity::is_admin),
            posts,
        })
    }

    pub async fn create_post(
        &self,
        author: Option<&Identity>,
        tracking: Option<&TrackingId>,
        content: String,
    ) -> Result<PostRecord, BoardError> {
        let record = self
            .writes
            .create_post(CreatePostParams {
                content,
                posted_by: author.map(|identity| identity.to_string()),
                tracking_cookie: tracking.map(|id| id.to_string()),
            })
            .await?;

        counter!(POSTS_CREATED_METRIC).increment(1);
        Ok(record)
    }

    pub async fn delete_post(
        &self,
        requester: Option<&Identity>,
        id: i64,
    ) -> Result<DeleteOutcome, BoardError> {
        let Some(post) = self.posts.find_by_id(id).await? else {
            return Ok(DeleteOutcome::Missing);
        };

        if !may_delete(requester, &post) {
            counter!(DELETE_DENIED_METRIC).increment(1);
            return Ok(DeleteOutcome::Denied);
        }

        match self.writes.delete_post(post.id).await {
            Ok(()) => {}
            // Lost a race with another delete of the same post.
            Err(RepoError::NotFound) => return Ok(DeleteOutcome::Missing),
            Err(err) => return Err(err.into()),
        }

        counter!(POSTS_DELETED_METRIC).increment(1);
        Ok(DeleteOutcome::Deleted(post))
    }

    pub async fn health(&self) -> Result<(), BoardError> {
        self.posts.ping().await.map_err(BoardError::from)
    }

    fn decorate(&self, record: &PostRecord, viewer: Option<&Identity>) -> PostView {
        let local = timezone::localized_datetime(record.created_at, self.timezone);
        PostView {
            id: record.id,
            content_html: posts::content_to_html(&record.content),
            display_time: posts::format_display_timestamp(&local),
            posted_by: record.posted_by.clone(),
            can_delete: may_delete(viewer, record),
        }
    }
}
