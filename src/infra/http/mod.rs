mod auth;
mod board;
mod forms;
mod middleware;
mod tracking;
mod visitor;

pub use board::{HttpState, build_router};
pub use tracking::TRACKING_COOKIE_TTL;

/// Where every successful write sends the browser.
pub const POSTS_PATH: &str = "/posts";

/// Body of the bad-request response for unsupported methods.
pub const BAD_REQUEST_MESSAGE: &str = "未対応のリクエストです";
