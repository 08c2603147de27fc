use crate::application::error::HttpError;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// One post decorated for display.
#[derive(Clone, Debug)]
pub struct PostView {
    pub id: i64,
    /// Escaped content with newlines already turned into `<br>`.
    pub content_html: String,
    pub display_time: String,
    pub posted_by: Option<String>,
    pub can_delete: bool,
}

#[derive(Clone, Debug)]
pub struct BoardContext {
    pub viewer: Option<String>,
    /// Authors are only revealed to the administrator.
    pub show_authors: bool,
    pub posts: Vec<PostView>,
}

#[derive(Template)]
#[template(path = "posts.html")]
pub struct PostsTemplate {
    pub view: BoardContext,
}

#[derive(Template)]
#[template(path = "logout.html")]
pub struct LogoutTemplate;
