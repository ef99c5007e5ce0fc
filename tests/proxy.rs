//! API proxy forwarding against a mock upstream.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

mod common;

async fn body_string(res: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_comment_api_request_is_rewritten_and_cors_relaxed() {
    let (upstream, mut seen) = common::start_recording_backend(|_| async {
        (
            200,
            vec![
                ("Content-Type", "application/json"),
                ("Access-Control-Allow-Origin", "https://disqus.com"),
            ],
            r#"{"code":0}"#.to_string(),
        )
    })
    .await;

    let mut config = common::config_with_collector(common::closed_addr().await);
    config.proxy.upstreams[0].base_url = format!("http://{upstream}/api/");
    let server = common::server(config);

    let req = Request::builder()
        .uri("/disqus/3.0/threads/list?forum=blog")
        .header(header::USER_AGENT, "Mozilla/5.0 (Test)")
        .header(header::ACCEPT, "application/json")
        .header(header::REFERER, "https://blog.example.com/posts/1")
        .header(header::COOKIE, "uuid=private")
        .header(header::AUTHORIZATION, "Bearer private")
        .body(Body::empty())
        .unwrap();
    let res = server.app().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, HEAD, POST, OPTIONS");
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_string(res).await, r#"{"code":0}"#);

    let forwarded = common::next_request(&mut seen).await;
    assert_eq!(forwarded.method, "GET");
    assert_eq!(forwarded.target, "/api/3.0/threads/list?forum=blog");
    assert_eq!(forwarded.header("user-agent"), Some("Mozilla/5.0 (Test)"));
    assert_eq!(forwarded.header("referer"), Some("https://blog.example.com/posts/1"));
    assert_eq!(forwarded.header("origin"), None);
    assert_eq!(forwarded.header("cookie"), None);
    assert_eq!(forwarded.header("authorization"), None);
}

#[tokio::test]
async fn test_gist_post_forwards_method_and_body() {
    let (upstream, mut seen) = common::start_mock_backend(404, "missing").await;

    let mut config = common::config_with_collector(common::closed_addr().await);
    config.proxy.upstreams[1].base_url = format!("http://{upstream}/");
    let server = common::server(config);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/gist/someone/abc123")
        .header(header::ORIGIN, "https://blog.example.com")
        .body(Body::from("payload"))
        .unwrap();
    let res = server.app().oneshot(req).await.unwrap();

    // upstream status passes through untouched
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(body_string(res).await, "missing");

    let forwarded = common::next_request(&mut seen).await;
    assert_eq!(forwarded.method, "POST");
    assert_eq!(forwarded.target, "/someone/abc123");
    assert_eq!(forwarded.header("origin"), Some("https://blog.example.com"));
    assert_eq!(forwarded.body, b"payload");
}

#[tokio::test]
async fn test_unreachable_upstream_is_internal_error() {
    let mut config = common::config_with_collector(common::closed_addr().await);
    config.proxy.upstreams[0].base_url = format!("http://{}/api/", common::closed_addr().await);
    let server = common::server(config);

    let req = Request::builder()
        .uri("/disqus/3.0/threads/list")
        .body(Body::empty())
        .unwrap();
    let res = server.app().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(res).await, "Internal Server Error");
}
