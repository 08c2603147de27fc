use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::domain::{identity::Identity, tracking::TrackingId};

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Who a failed response was served to. The board layers run inside this one,
/// so identity and tracking id are read back from the response extensions.
struct Caller {
    user: String,
    tracking_id: String,
}

impl Caller {
    fn from_response(response: &Response) -> Self {
        let extensions = response.extensions();
        Self {
            user: extensions
                .get::<Identity>()
                .map(Identity::to_string)
                .unwrap_or_default(),
            tracking_id: extensions
                .get::<TrackingId>()
                .map(TrackingId::to_string)
                .unwrap_or_default(),
        }
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let elapsed_ms = start.elapsed().as_millis();
    let caller = Caller::from_response(&response);
    let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .map(String::as_str)
        .unwrap_or("no diagnostic available");

    if status.is_server_error() {
        error!(
            target = "secret_board::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            source,
            detail,
            chain = ?messages,
            request_id,
            user = caller.user,
            tracking_id = caller.tracking_id,
            "request failed",
        );
    } else {
        warn!(
            target = "secret_board::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            source,
            detail,
            chain = ?messages,
            request_id,
            user = caller.user,
            tracking_id = caller.tracking_id,
            "client request error",
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::*;

    #[test]
    fn caller_is_read_from_response_extensions() {
        let mut response = StatusCode::BAD_REQUEST.into_response();
        response.extensions_mut().insert(Identity::new("alice"));
        response
            .extensions_mut()
            .insert(TrackingId::from_cookie("42").expect("id"));

        let caller = Caller::from_response(&response);
        assert_eq!(caller.user, "alice");
        assert_eq!(caller.tracking_id, "42");
    }

    #[test]
    fn anonymous_caller_logs_empty_fields() {
        let response = StatusCode::NOT_FOUND.into_response();
        let caller = Caller::from_response(&response);
        assert!(caller.user.is_empty());
        assert!(caller.tracking_id.is_empty());
    }
}
