//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub content: String,
    pub posted_by: Option<String>,
    pub tracking_cookie: Option<String>,
    pub created_at: OffsetDateTime,
}
