use std::time::Duration;

use listing_watcher::config::TelegramConfig;
use listing_watcher::plugins::notifiers::{TelegramNotifier, Throttled};
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const TOKEN: &str = "TESTTOKEN";
const SEND_PATH: &str = "/botTESTTOKEN/sendMessage";

fn telegram_config(server: &MockServer, retry_attempts: usize) -> TelegramConfig {
    TelegramConfig {
        token: TOKEN.to_string(),
        chat_id: CHAT.to_string(),
        api_base: server.uri(),
        request_timeout: Duration::from_secs(5),
        retry_attempts,
        retry_base_delay: Duration::from_millis(10),
    }
}

fn ok_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {"message_id": 1}}))
}

fn error_response(status: u16, description: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "ok": false,
        "error_code": status,
        "description": description,
    }))
}

#[tokio::test]
async fn test_delivers_message_to_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(body_json(json!({"chat_id": CHAT, "text": "hello"})))
        .respond_with(ok_response())
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&telegram_config(&server, 2)).unwrap();

    notifier.deliver(CHAT, "hello").await.unwrap();
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(error_response(502, "Bad Gateway"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ok_response())
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&telegram_config(&server, 2)).unwrap();

    notifier.deliver(CHAT, "hello").await.unwrap();
}

#[rstest]
#[case::rate_limited(429, 3)]
#[case::server_error(500, 3)]
#[case::unauthorized(401, 1)]
#[case::bad_request(400, 1)]
#[tokio::test]
async fn test_failure_attempts_by_status(#[case] status: u16, #[case] expected_attempts: u64) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(error_response(status, "nope"))
        .expect(expected_attempts)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&telegram_config(&server, 2)).unwrap();
    let err = notifier.deliver(CHAT, "hello").await.unwrap_err();

    match err {
        AppError::Delivery { status: Some(code), message } => {
            assert_eq!(code, status);
            assert!(message.contains("nope"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_not_ok_body_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&telegram_config(&server, 2)).unwrap();

    assert!(notifier.deliver(CHAT, "hello").await.is_err());
}

#[tokio::test]
async fn test_non_json_body_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let notifier = TelegramNotifier::new(&telegram_config(&server, 0)).unwrap();

    assert!(matches!(
        notifier.deliver(CHAT, "hello").await,
        Err(AppError::Delivery { .. })
    ));
}

#[tokio::test]
async fn test_throttled_telegram_spaces_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ok_response())
        .expect(2)
        .mount(&server)
        .await;

    let spacing = Duration::from_millis(200);
    let notifier = Throttled::new(
        TelegramNotifier::new(&telegram_config(&server, 0)).unwrap(),
        spacing,
    );

    let start = std::time::Instant::now();
    notifier.deliver(CHAT, "one").await.unwrap();
    notifier.deliver(CHAT, "two").await.unwrap();

    assert!(start.elapsed() >= spacing);
}
