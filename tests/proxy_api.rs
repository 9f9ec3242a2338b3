#![cfg(feature = "server")]

mod common;

use actix_web::{http::header, test, App};
use ghibli_relay::{server, ProxyConfig};
use reqwest::Url;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{config_for, state};

const JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

fn proxy_uri(target: &str) -> String {
    let url = Url::parse_with_params("http://relay.test/api/proxy-image", &[("url", target)]).unwrap();
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

#[actix_web::test]
async fn streams_bytes_with_cors_headers() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/results/x.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/jpeg")
                .set_body_bytes(JPEG),
        )
        .expect(1)
        .mount(&host)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&config_for("http://127.0.0.1:9")))
            .configure(server::routes),
    )
    .await;

    let target = format!("{}/results/x.jpg", host.uri());
    let resp = test::call_service(&app, test::TestRequest::get().uri(&proxy_uri(&target)).to_request()).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/jpeg");
    assert_eq!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    assert_eq!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "GET");

    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), JPEG);
}

#[actix_web::test]
async fn missing_url_is_rejected_without_fetching() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&host)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&config_for("http://127.0.0.1:9")))
            .configure(server::routes),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/proxy-image").to_request()).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Image URL is required"}));
}

#[actix_web::test]
async fn host_outside_allow_list_is_forbidden() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&host)
        .await;

    let config = config_for("http://127.0.0.1:9")
        .with_proxy(ProxyConfig::new().with_allowed_hosts(["oaidalleapiprodscus.blob.core.windows.net"]));
    let app = test::init_service(App::new().app_data(state(&config)).configure(server::routes)).await;

    let target = format!("{}/x.png", host.uri());
    let resp = test::call_service(&app, test::TestRequest::get().uri(&proxy_uri(&target)).to_request()).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn upstream_status_is_relayed() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&host)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&config_for("http://127.0.0.1:9")))
            .configure(server::routes),
    )
    .await;

    let target = format!("{}/expired.png", host.uri());
    let resp = test::call_service(&app, test::TestRequest::get().uri(&proxy_uri(&target)).to_request()).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Failed to fetch image"}));
}

#[actix_web::test]
async fn unreachable_host_is_a_server_error() {
    let app = test::init_service(
        App::new()
            .app_data(state(&config_for("http://127.0.0.1:9")))
            .configure(server::routes),
    )
    .await;

    // Port 9 (discard) is not expected to be listening.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri(&proxy_uri("http://127.0.0.1:9/x.png")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), 500);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Failed to proxy image"));
}

#[actix_web::test]
async fn redirect_off_the_allow_list_is_forbidden() {
    let internal = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("INTERNAL"))
        .expect(0)
        .mount(&internal)
        .await;

    // Same listener, reached through a host name that is not allowed.
    let internal_by_name = format!("http://localhost:{}/secret", internal.address().port());
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/moved.png"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", internal_by_name.as_str()))
        .expect(1)
        .mount(&host)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&config_for("http://127.0.0.1:9")))
            .configure(server::routes),
    )
    .await;

    let target = format!("{}/moved.png", host.uri());
    let resp = test::call_service(&app, test::TestRequest::get().uri(&proxy_uri(&target)).to_request()).await;
    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("localhost"));
}

#[actix_web::test]
async fn redirect_within_the_allow_list_is_followed() {
    let host = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/moved.jpg"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/results/x.jpg"))
        .mount(&host)
        .await;
    Mock::given(method("GET"))
        .and(path("/results/x.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/jpeg")
                .set_body_bytes(JPEG),
        )
        .expect(1)
        .mount(&host)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(state(&config_for("http://127.0.0.1:9")))
            .configure(server::routes),
    )
    .await;

    let target = format!("{}/moved.jpg", host.uri());
    let resp = test::call_service(&app, test::TestRequest::get().uri(&proxy_uri(&target)).to_request()).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(test::read_body(resp).await.as_ref(), JPEG);
}
