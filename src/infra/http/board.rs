use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::{
    application::{
        auth::Authenticator,
        board::{BoardError, BoardService, DeleteOutcome},
        error::{ErrorReport, HttpError},
    },
    presentation::views::{PostsTemplate, render_template_response},
};

use super::{
    BAD_REQUEST_MESSAGE, POSTS_PATH,
    auth::{logout, require_identity},
    forms::form_field,
    middleware::{log_responses, set_request_context},
    tracking::ensure_tracking_cookie,
    visitor::Visitor,
};

#[derive(Clone)]
pub struct HttpState {
    pub board: Arc<BoardService>,
    pub auth: Arc<Authenticator>,
}

pub fn build_router(state: HttpState) -> Router {
    let board_routes = Router::new()
        .route(
            POSTS_PATH,
            // `get` alone would also answer HEAD with the listing.
            get(list_posts)
                .head(bad_request)
                .post(create_post)
                .fallback(bad_request)
                .layer(middleware::from_fn(ensure_tracking_cookie)),
        )
        .route("/posts/delete", post(delete_post).fallback(bad_request))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    let open_routes = Router::new()
        .route("/logout", get(logout))
        .route("/_health/db", get(db_health));

    board_routes
        .merge(open_routes)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn list_posts(State(state): State<HttpState>, visitor: Visitor) -> Response {
    info!(
        target = "secret_board::access",
        user = visitor.user_label(),
        tracking_id = visitor.tracking_label(),
        remote_address = %visitor.remote_label(),
        user_agent = visitor.user_agent_label(),
        "board viewed"
    );

    match state.board.board_context(visitor.identity.as_ref()).await {
        Ok(view) => render_template_response(PostsTemplate { view }, StatusCode::OK),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn create_post(State(state): State<HttpState>, visitor: Visitor, body: Bytes) -> Response {
    let content = form_field(&body, "content").unwrap_or_default();

    let record = match state
        .board
        .create_post(visitor.identity.as_ref(), visitor.tracking.as_ref(), content)
        .await
    {
        Ok(record) => record,
        Err(err) => return HttpError::from(err).into_response(),
    };

    info!(
        target = "secret_board::access",
        user = visitor.user_label(),
        tracking_id = visitor.tracking_label(),
        remote_address = %visitor.remote_label(),
        user_agent = visitor.user_agent_label(),
        post_id = record.id,
        "post created"
    );
    Redirect::to(POSTS_PATH).into_response()
}

async fn delete_post(State(state): State<HttpState>, visitor: Visitor, body: Bytes) -> Response {
    let Some(id) = form_field(&body, "id").and_then(|raw| raw.trim().parse::<i64>().ok()) else {
        debug!(
            target = "secret_board::http::delete",
            "delete request without a usable id"
        );
        return Redirect::to(POSTS_PATH).into_response();
    };

    match state.board.delete_post(visitor.identity.as_ref(), id).await {
        Ok(DeleteOutcome::Deleted(post)) => {
            info!(
                target = "secret_board::access",
                user = visitor.user_label(),
                remote_address = %visitor.remote_label(),
                user_agent = visitor.user_agent_label(),
                post_id = post.id,
                "post deleted"
            );
        }
        Ok(DeleteOutcome::Denied) => {
            debug!(
                target = "secret_board::http::delete",
                user = visitor.user_label(),
                post_id = id,
                "delete denied"
            );
        }
        Ok(DeleteOutcome::Missing) => {}
        Err(err) => return HttpError::from(err).into_response(),
    }

    Redirect::to(POSTS_PATH).into_response()
}

async fn bad_request(method: Method, uri: Uri) -> Response {
    HttpError::new(
        "infra::http::bad_request",
        StatusCode::BAD_REQUEST,
        BAD_REQUEST_MESSAGE,
        format!("unsupported method {method} for {}", uri.path()),
    )
    .into_response()
}

async fn db_health(State(state): State<HttpState>) -> Response {
    health_response(state.board.health().await)
}

fn health_response(result: Result<(), BoardError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
