//! Mock Telegram API server for testing
//!
//! A wiremock server standing in for the Bot API, so [`TelegramTransport`]
//! can be exercised end to end.

use serde_json::{json, Value};
use teloxide::Bot;
use wiremock::{
    matchers::{body_string_contains, method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

use ReportBuddy::services::TelegramTransport;

pub const TEST_BOT_TOKEN: &str = "12345:test_token";

pub struct TelegramMockServer {
    pub server: MockServer,
}

impl TelegramMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// A transport whose bot talks to this server
    pub fn transport(&self) -> TelegramTransport {
        let url = self.server.uri().parse().expect("mock server url");
        TelegramTransport::new(Bot::new(TEST_BOT_TOKEN).set_api_url(url))
    }

    fn method_path(name: &str) -> String {
        format!("(?i)^/bot[^/]+/{}$", name)
    }

    fn message_result(chat_id: i64, text: &str) -> Value {
        json!({
            "ok": true,
            "result": {
                "message_id": 123,
                "from": {
                    "id": 12345,
                    "is_bot": true,
                    "first_name": "ReportBuddy",
                    "username": "reportbuddy_bot"
                },
                "chat": {
                    "id": chat_id,
                    "title": "Test Group",
                    "type": "supergroup"
                },
                "date": 1760000000,
                "text": text
            }
        })
    }

    /// Accept sendMessage calls whose body contains `needle`
    pub async fn expect_send_containing(&self, needle: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("sendmessage")))
            .and(body_string_contains(needle))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(Self::message_result(-100, needle)),
            )
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn reject_sends(&self, description: &str) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("sendmessage")))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": description
            })))
            .mount(&self.server)
            .await;
    }

    /// Accept exactly one answer to the callback query `callback_id`
    pub async fn expect_callback_answer(&self, callback_id: &str) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("answercallbackquery")))
            .and(body_string_contains(format!("\"callback_query_id\":\"{}\"", callback_id)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Methods answering a bare `true`
    pub async fn accept(&self, api_method: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path(&api_method.to_lowercase())))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true })),
            )
            .expect(times)
            .mount(&self.server)
            .await;
    }
}
