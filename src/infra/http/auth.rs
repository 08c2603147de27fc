use axum::{
    extract::{Request, State},
    http::{
        StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::{auth::Authenticator, error::ErrorReport};
use crate::presentation::views::{LogoutTemplate, render_template_response};

use super::HttpState;

/// Resolves the caller's identity from HTTP Basic credentials.
///
/// When no users are configured the request continues without an identity.
pub(super) async fn require_identity(
    State(state): State<HttpState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.auth.is_enabled() {
        return next.run(request).await;
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.auth.authenticate_header(header) {
        Ok(identity) => {
            request.extensions_mut().insert(identity.clone());
            let mut response = next.run(request).await;
            response.extensions_mut().insert(identity);
            response
        }
        Err(err) => {
            let mut response = challenge_response(
                &state.auth,
                (StatusCode::UNAUTHORIZED, "Authentication required").into_response(),
            );
            ErrorReport::from_error("infra::http::auth", StatusCode::UNAUTHORIZED, &err)
                .attach(&mut response);
            response
        }
    }
}

/// Answers 401 so the browser forgets the cached credentials.
pub(super) async fn logout(State(state): State<HttpState>) -> Response {
    let page = render_template_response(LogoutTemplate, StatusCode::UNAUTHORIZED);
    let mut response = challenge_response(&state.auth, page);
    ErrorReport::from_message(
        "infra::http::logout",
        StatusCode::UNAUTHORIZED,
        "logged out",
    )
    .attach(&mut response);
    response
}

fn challenge_response(auth: &Authenticator, response: Response) -> Response {
    ([(WWW_AUTHENTICATE, auth.challenge())], response).into_response()
}
