use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::domain::tracking::{TRACKING_COOKIE_NAME, TrackingId};

/// Lifetime of a freshly issued tracking cookie.
pub const TRACKING_COOKIE_TTL: Duration = Duration::hours(24);

/// Makes sure the visitor carries a tracking id before the handler runs.
///
/// An existing cookie is passed through untouched. Otherwise a new id is
/// generated, exposed to the handler through the request extensions and set on
/// the response with a 24 hour expiry. Either way the id is also left on the
/// response extensions for the response logger.
pub(super) async fn ensure_tracking_cookie(
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(existing) = jar
        .get(TRACKING_COOKIE_NAME)
        .and_then(|cookie| TrackingId::from_cookie(cookie.value()))
    {
        request.extensions_mut().insert(existing.clone());
        let mut response = next.run(request).await;
        response.extensions_mut().insert(existing);
        return response;
    }

    let issued = TrackingId::generate();
    request.extensions_mut().insert(issued.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(issued.clone());

    debug!(
        target = "secret_board::http::tracking",
        tracking_id = %issued,
        "issued tracking cookie"
    );
    let expires = OffsetDateTime::now_utc() + TRACKING_COOKIE_TTL;
    (jar.add(tracking_cookie(&issued, expires)), response).into_response()
}

fn tracking_cookie(id: &TrackingId, expires: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((TRACKING_COOKIE_NAME, id.to_string()))
        .path("/")
        .http_only(true)
        .expires(expires)
        .build()
}
