//! Integration tests for the panel dispatcher.
//!
//! A wiremock server stands in for the hosting panel so the full signed
//! POST can be observed on the wire.

use std::time::Duration;

use jarvis::panel::actions::{self, NewCrontab};
use jarvis::panel::signer::token;
use jarvis::panel::{decode_items, find_id, Envelope, FixedClock, FormParams, PanelClient, PanelError};
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "secret";
const NOW: i64 = 1_700_000_000;

fn client(server: &MockServer) -> PanelClient {
    PanelClient::new(server.uri()).unwrap()
}

// =============================================================================
// Dispatcher
// =============================================================================

#[tokio::test]
async fn returns_body_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/site"))
        .and(query_param("action", "GetPHPVersion"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"1","msg":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let body = client(&server)
        .signed_post_with_clock(actions::SITE_PHP_VERSIONS, KEY, FormParams::new(), &FixedClock(NOW))
        .await
        .unwrap();
    assert_eq!(body, r#"{"status":"1","msg":"ok"}"#);
}

#[tokio::test]
async fn posts_signed_form_after_existing_params() {
    let server = MockServer::start().await;
    let expected = format!(
        "name=backup&request_time={}&request_token={}",
        NOW,
        token(KEY, NOW)
    );
    Mock::given(method("POST"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(expected))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let params = FormParams::new().with("name", "backup");
    client(&server)
        .signed_post_with_clock("/crontab?action=GetCrontab", KEY, params, &FixedClock(NOW))
        .await
        .unwrap();
}

#[tokio::test]
async fn key_is_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("request_token="))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    client(&server)
        .signed_post(actions::SITE_TYPES, "super-secret-key", FormParams::new())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(!body.contains("super-secret-key"));
}

#[tokio::test]
async fn http_error_status_still_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let body = client(&server)
        .signed_post("/anything", KEY, FormParams::new())
        .await
        .unwrap();
    assert_eq!(body, "oops");
}

#[tokio::test]
async fn unreachable_host_is_an_error() {
    // Port 1 is reserved and refuses connections.
    let client = PanelClient::new("http://127.0.0.1:1").unwrap();
    let err = client
        .signed_post("/site?action=GetPHPVersion", KEY, FormParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PanelError::Transport { .. }));
}

#[tokio::test]
async fn slow_panel_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = PanelClient::with_timeout(server.uri(), Duration::from_millis(200)).unwrap();
    let err = client
        .signed_post(actions::SITE_TYPES, KEY, FormParams::new())
        .await
        .unwrap_err();
    match err {
        PanelError::Transport { source, .. } => assert!(source.is_timeout()),
        other => panic!("expected transport error, got {other:?}"),
    }
}

// =============================================================================
// Operations
// =============================================================================

#[tokio::test]
async fn crontab_create_sends_fixed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/crontab"))
        .and(query_param("action", "AddCrontab"))
        .and(body_string_contains("type=minute-n"))
        .and(body_string_contains("sType=toShell"))
        .and(body_string_contains("sBody=echo+hi"))
        .and(body_string_contains("save_local=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":true,"msg":"added"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let task = NewCrontab {
        name: "hello".into(),
        script: "echo hi".into(),
    };
    let body = client(&server)
        .signed_post(actions::CRONTAB_ADD, KEY, task.to_params())
        .await
        .unwrap();
    let envelope = Envelope::decode(&body);
    assert!(!envelope.is_error());
    assert_eq!(envelope.message(), "added");
}

#[tokio::test]
async fn delete_by_name_resolves_id_from_listing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/crontab"))
        .and(query_param("action", "GetCrontab"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id":3,"name":"backup","type":"day"},{"id":9,"name":"cleanup","type":"minute-n"}]"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/crontab"))
        .and(query_param("action", "DelCrontab"))
        .and(body_string_contains("id=9&"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":true,"msg":"deleted"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let panel = client(&server);
    let listing = panel
        .signed_post(actions::CRONTAB_LIST, KEY, FormParams::new())
        .await
        .unwrap();
    let items = decode_items(&listing);
    let id = find_id(&items, "cleanup").unwrap();
    assert_eq!(find_id(&items, "missing"), None);

    let body = panel
        .signed_post(actions::CRONTAB_DELETE, KEY, actions::delete_crontab_params(id))
        .await
        .unwrap();
    assert_eq!(Envelope::decode(&body).message(), "deleted");
}

#[tokio::test]
async fn error_envelope_is_detected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status":false,"msg":"bad token"}"#),
        )
        .mount(&server)
        .await;

    let body = client(&server)
        .signed_post(actions::CRONTAB_LIST, KEY, FormParams::new())
        .await
        .unwrap();
    let envelope = Envelope::decode(&body);
    assert!(envelope.is_error());
    assert_eq!(envelope.message(), "bad token");
    assert!(decode_items(&body).is_empty());
}
