use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{
        HeaderName, HeaderValue, Method, Request, Response, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE, WWW_AUTHENTICATE},
    },
};
use axum_extra::extract::cookie::Cookie;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono_tz::Asia::Tokyo;
use http_body_util::BodyExt;
use secret_board::application::auth::{Authenticator, UserCredential};
use secret_board::application::board::BoardService;
use secret_board::application::repos::PostsRepo;
use secret_board::domain::entities::PostRecord;
use secret_board::infra::http::{
    BAD_REQUEST_MESSAGE, HttpState, POSTS_PATH, TRACKING_COOKIE_TTL, build_router,
};
use secret_board::infra::memory::MemoryRepositories;
use time::OffsetDateTime;
use tower::ServiceExt;

const REALM: &str = "Enter username and password.";

struct TestApp {
    router: Router,
    repos: Arc<MemoryRepositories>,
}

impl TestApp {
    fn anonymous() -> Self {
        Self::with_users(Vec::new())
    }

    fn with_users(users: Vec<UserCredential>) -> Self {
        let repos = Arc::new(MemoryRepositories::new());
        let state = HttpState {
            board: Arc::new(BoardService::new(repos.clone(), repos.clone(), Tokyo)),
            auth: Arc::new(Authenticator::new(REALM, users)),
        };
        Self {
            router: build_router(state),
            repos,
        }
    }

    fn with_board_users() -> Self {
        Self::with_users(vec![
            UserCredential::from_password("admin", "apple"),
            UserCredential::from_password("alice", "wonderland"),
            UserCredential::from_password("bob", "builder"),
        ])
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    async fn posts(&self) -> Vec<PostRecord> {
        self.repos.list_posts().await.expect("list posts")
    }
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(COOKIE, "tracking_id=42")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

fn with_header(mut request: Request<Body>, name: HeaderName, value: &str) -> Request<Body> {
    request.headers_mut().insert(
        name,
        HeaderValue::from_str(value).expect("valid header value"),
    );
    request
}

fn as_user(request: Request<Body>, user: &str, password: &str) -> Request<Body> {
    with_header(request, AUTHORIZATION, &basic(user, password))
}

fn delete_form(id: i64) -> Request<Body> {
    form_post("/posts/delete", &format!("id={id}"))
}

fn issued_cookie(response: &Response<Body>) -> Option<Cookie<'static>> {
    let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    Cookie::parse(header.to_string()).ok()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn assert_redirects_to_board(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some(POSTS_PATH)
    );
}

#[tokio::test]
async fn create_decodes_form_and_redirects() {
    let app = TestApp::anonymous();

    let response = app.send(form_post("/posts", "content=hello+world")).await;
    assert_redirects_to_board(&response);
    assert!(body_text(response).await.is_empty());

    let posts = app.posts().await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content, "hello world");
    assert_eq!(posts[0].posted_by, None);
    assert_eq!(posts[0].tracking_cookie.as_deref(), Some("42"));
}

#[tokio::test]
async fn missing_content_creates_an_empty_post() {
    let app = TestApp::anonymous();

    let response = app.send(form_post("/posts", "other=value")).await;
    assert_redirects_to_board(&response);

    let posts = app.posts().await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content, "");
}

#[tokio::test]
async fn authenticated_create_records_the_author() {
    let app = TestApp::with_board_users();

    let response = app
        .send(as_user(form_post("/posts", "content=hi"), "alice", "wonderland"))
        .await;
    assert_redirects_to_board(&response);

    let posts = app.posts().await;
    assert_eq!(posts[0].posted_by.as_deref(), Some("alice"));
}

#[tokio::test]
async fn listing_renders_newest_first_with_line_breaks() {
    let app = TestApp::anonymous();
    for body in ["content=first", "content=line1%0Aline2", "content=third"] {
        app.send(form_post("/posts", body)).await;
    }

    let response = app
        .send(with_header(get("/posts"), COOKIE, "tracking_id=42"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/html; charset=utf-8")
    );

    let html = body_text(response).await;
    let third = html.find("third").expect("third rendered");
    let second = html.find("line1<br>line2").expect("line break rendered");
    let first = html.find("first").expect("first rendered");
    assert!(third < second && second < first);
    assert!(html.contains("投稿日時: "));
}

#[tokio::test]
async fn listing_escapes_markup_in_content() {
    let app = TestApp::anonymous();
    app.send(form_post(
        "/posts",
        "content=%3Cscript%3Ealert(1)%3C%2Fscript%3E",
    ))
    .await;

    let html = body_text(app.send(get("/posts")).await).await;
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn tracking_cookie_is_issued_once_with_a_day_of_lifetime() {
    let app = TestApp::anonymous();
    let before = OffsetDateTime::now_utc();

    let response = app.send(get("/posts")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = issued_cookie(&response).expect("tracking cookie issued");

    assert_eq!(cookie.name(), "tracking_id");
    assert_eq!(cookie.path(), Some("/"));
    let value: u64 = cookie.value().parse().expect("decimal tracking id");
    assert!(value < (1u64 << 53));

    let expires = cookie.expires_datetime().expect("expiry set");
    let lifetime = expires - before;
    assert!(lifetime > TRACKING_COOKIE_TTL - time::Duration::minutes(1));
    assert!(lifetime <= TRACKING_COOKIE_TTL + time::Duration::minutes(1));

    let again = app
        .send(with_header(
            get("/posts"),
            COOKIE,
            &format!("tracking_id={value}"),
        ))
        .await;
    assert_eq!(again.status(), StatusCode::OK);
    assert!(again.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn freshly_issued_cookie_is_stored_with_the_post() {
    let app = TestApp::anonymous();

    let mut request = form_post("/posts", "content=new");
    request.headers_mut().remove(COOKIE);
    let response = app.send(request).await;
    assert_redirects_to_board(&response);

    let cookie = issued_cookie(&response).expect("tracking cookie issued");
    let posts = app.posts().await;
    assert_eq!(posts[0].tracking_cookie.as_deref(), Some(cookie.value()));
}

#[tokio::test]
async fn unsupported_methods_are_rejected_without_touching_the_store() {
    let app = TestApp::anonymous();

    for (method, uri) in [
        (Method::HEAD, "/posts"),
        (Method::PUT, "/posts"),
        (Method::DELETE, "/posts"),
        (Method::GET, "/posts/delete"),
        (Method::PATCH, "/posts/delete"),
    ] {
        let request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(Body::from("content=sneaky"))
            .expect("request should build");
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method} {uri}");
        if method != Method::HEAD {
            assert_eq!(body_text(response).await, BAD_REQUEST_MESSAGE);
        }
    }

    assert!(app.posts().await.is_empty());
}

#[tokio::test]
async fn delete_is_limited_to_owner_or_admin() {
    let app = TestApp::with_board_users();
    for _ in 0..2 {
        app.send(as_user(form_post("/posts", "content=mine"), "alice", "wonderland"))
            .await;
    }
    let ids: Vec<i64> = app.posts().await.iter().map(|post| post.id).collect();

    let denied = app
        .send(as_user(delete_form(ids[0]), "bob", "builder"))
        .await;
    assert_redirects_to_board(&denied);
    assert_eq!(app.posts().await.len(), 2);

    let by_owner = app
        .send(as_user(delete_form(ids[0]), "alice", "wonderland"))
        .await;
    assert_redirects_to_board(&by_owner);
    assert_eq!(app.posts().await.len(), 1);

    let by_admin = app
        .send(as_user(delete_form(ids[1]), "admin", "apple"))
        .await;
    assert_redirects_to_board(&by_admin);
    assert!(app.posts().await.is_empty());
}

#[tokio::test]
async fn delete_without_usable_id_is_a_silent_redirect() {
    let app = TestApp::with_board_users();
    app.send(as_user(form_post("/posts", "content=keep"), "admin", "apple"))
        .await;

    for body in ["", "id=", "id=abc", "id=999", "name=1"] {
        let response = app
            .send(as_user(form_post("/posts/delete", body), "admin", "apple"))
            .await;
        assert_redirects_to_board(&response);
    }

    assert_eq!(app.posts().await.len(), 1);
}

#[tokio::test]
async fn anonymous_requester_cannot_delete_anonymous_posts() {
    let app = TestApp::anonymous();
    app.send(form_post("/posts", "content=orphan")).await;
    let id = app.posts().await[0].id;

    let response = app.send(delete_form(id)).await;
    assert_redirects_to_board(&response);
    assert_eq!(app.posts().await.len(), 1);
}

#[tokio::test]
async fn authors_and_delete_buttons_depend_on_viewer() {
    let app = TestApp::with_board_users();
    app.send(as_user(form_post("/posts", "content=secret"), "alice", "wonderland"))
        .await;

    let as_admin = body_text(app.send(as_user(get("/posts"), "admin", "apple")).await).await;
    assert!(as_admin.contains("投稿者: alice"));
    assert!(as_admin.contains(r#"action="/posts/delete""#));

    let as_bob = body_text(app.send(as_user(get("/posts"), "bob", "builder")).await).await;
    assert!(!as_bob.contains("投稿者: alice"));
    assert!(!as_bob.contains(r#"action="/posts/delete""#));
    assert!(as_bob.contains("bob としてログイン中"));
}

#[tokio::test]
async fn wrong_or_missing_credentials_are_challenged() {
    let app = TestApp::with_board_users();

    let attempts = [
        get("/posts"),
        as_user(get("/posts"), "alice", "wrong"),
        with_header(get("/posts"), AUTHORIZATION, "Bearer token"),
    ];
    for request in attempts {
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|value| value.to_str().ok()),
            Some(r#"Basic realm="Enter username and password.""#)
        );
    }

    let rejected_write = app
        .send(as_user(form_post("/posts", "content=x"), "mallory", "x"))
        .await;
    assert_eq!(rejected_write.status(), StatusCode::UNAUTHORIZED);
    assert!(app.posts().await.is_empty());
}

#[tokio::test]
async fn logout_answers_unauthorized_with_a_way_back() {
    let app = TestApp::with_board_users();

    let response = app.send(get("/logout")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(WWW_AUTHENTICATE));

    let html = body_text(response).await;
    assert!(html.contains("ログアウトしました"));
    assert!(html.contains(r#"href="/posts""#));
}

#[tokio::test]
async fn health_reports_a_reachable_store() {
    let app = TestApp::with_board_users();
    let response = app.send(get("/_health/db")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
