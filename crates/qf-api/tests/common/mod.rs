use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use http_body_util::BodyExt;
use qf_api::{config::ApiConfig, router, state::ApiState};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Token sent by tests that authenticate generation calls
pub const TEST_TOKEN: &str = "sk-test-token";

/// Wrap `quiz` in the fenced block the generation parser looks for
pub fn fenced_reply(quiz: &Value) -> String {
    format!(
        "Here is the quiz you asked for.\n\n```json\n{}\n```\n",
        serde_json::to_string_pretty(quiz).expect("Failed to serialize quiz")
    )
}

/// A small, valid generated quiz
pub fn sample_quiz() -> Value {
    json!({
        "title": "Cell Biology",
        "questions": [
            {"id": "1", "title": "What is the powerhouse of the cell?", "description": "One word", "type": "short_answer"},
            {"id": "2", "title": "Describe mitosis", "description": "", "type": "long_answer"},
            {"id": "2", "title": "How well do you know this topic?", "type": "rating"}
        ]
    })
}

/// What the fake chat endpoint answers with
#[derive(Clone)]
pub enum FakeReply {
    /// A successful completion with this message content
    Content(String),
    /// An error status with this body
    Status(StatusCode, String),
    /// A successful completion delivered after a delay
    Delayed(Duration, String),
}

/// A request received by the fake chat endpoint
#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct FakeChatState {
    reply: FakeReply,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Chat-completion endpoint bound to a random local port
pub struct FakeChatServer {
    pub url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeChatServer {
    pub async fn start(reply: FakeReply) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake chat server");
        let addr = listener.local_addr().expect("Failed to read local address");

        let captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/v1/chat/completions", post(fake_completion))
            .with_state(FakeChatState {
                reply,
                captured: captured.clone(),
            });

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake chat server failed");
        });

        Self {
            url: format!("http://{addr}/v1/chat/completions"),
            captured,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().expect("Captured requests lock").clone()
    }
}

async fn fake_completion(
    State(fake): State<FakeChatState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.captured
        .lock()
        .expect("Captured requests lock")
        .push(CapturedRequest {
            authorization: headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
            body,
        });

    match fake.reply {
        FakeReply::Content(content) => completion(&content).into_response(),
        FakeReply::Status(status, body) => (status, body).into_response(),
        FakeReply::Delayed(delay, content) => {
            tokio::time::sleep(delay).await;
            completion(&content).into_response()
        }
    }
}

fn completion(content: &str) -> Json<Value> {
    Json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }
        ]
    }))
}

/// Test state builder for creating an ApiState
pub struct TestStateBuilder {
    config: ApiConfig,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            config: ApiConfig {
                // Nothing listens here; tests that generate point at a fake server
                chat_completions_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
                chat_timeout_secs: 10,
                ..ApiConfig::default()
            },
        }
    }

    pub fn with_chat_server(mut self, server: &FakeChatServer) -> Self {
        self.config.chat_completions_url = server.url.clone();
        self
    }

    pub fn with_fallback_token(mut self, token: &str) -> Self {
        self.config.chat_api_key = Some(token.to_string());
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.config.max_upload_bytes = limit;
        self
    }

    pub fn with_max_source_chars(mut self, limit: usize) -> Self {
        self.config.max_source_chars = limit;
        self
    }

    pub fn build(self) -> ApiState {
        ApiState::new(&self.config).expect("Failed to create test state")
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to make requests to the test app
#[derive(Clone)]
pub struct TestClient {
    router: Router,
}

impl TestClient {
    pub fn new(state: ApiState) -> Self {
        Self {
            router: router::router().with_state(state),
        }
    }

    /// Send a request and get the response
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            body: body_bytes.to_vec(),
            headers,
        }
    }

    fn builder(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "127.0.0.1") // Required for rate limiting in tests
    }

    /// Send a GET request
    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Self::builder("GET", uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.request(request).await
    }

    /// Send a DELETE request
    pub async fn delete(&self, uri: &str) -> TestResponse {
        let request = Self::builder("DELETE", uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.request(request).await
    }

    /// Send a request with a JSON body
    pub async fn send_json<T: serde::Serialize>(
        &self,
        method: &str,
        uri: &str,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        let json_body = serde_json::to_string(body).expect("Failed to serialize body");

        let mut builder = Self::builder(method, uri).header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.request(request).await
    }

    /// Send a POST request with JSON body
    pub async fn post_json<T: serde::Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        self.send_json("POST", uri, body, None).await
    }

    /// Send a PATCH request with JSON body
    pub async fn patch_json<T: serde::Serialize>(&self, uri: &str, body: &T) -> TestResponse {
        self.send_json("PATCH", uri, body, None).await
    }

    /// Send a POST request with raw bytes
    pub async fn post_bytes(&self, uri: &str, bytes: Vec<u8>) -> TestResponse {
        let request = Self::builder("POST", uri)
            .header("content-type", "application/pdf")
            .body(Body::from(bytes))
            .expect("Failed to build request");

        self.request(request).await
    }

    /// Create a draft and return its id
    pub async fn create_quiz(&self, title: &str) -> String {
        let response = self.post_json("/quizzes", &json!({ "title": title })).await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["id"]
            .as_str()
            .expect("Draft should have an id")
            .to_string()
    }

    /// Add a question to a draft and return it
    pub async fn add_question(&self, quiz_id: &str, title: &str) -> Value {
        let response = self
            .post_json(
                &format!("/quizzes/{quiz_id}/questions"),
                &json!({ "title": title }),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

impl TestResponse {
    /// Assert the response has the expected status code
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
    }

    /// Parse response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get response body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Assert the response is a JSON `{"error": ..}` body
    pub fn assert_json_error(&self) {
        let content_type = self
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(
            content_type.starts_with("application/json"),
            "Expected a JSON error, got content type {content_type:?}. Body: {}",
            self.text()
        );
        assert!(!self.error_message().is_empty());
    }

    /// The `error` message of a JSON error response
    pub fn error_message(&self) -> String {
        self.json::<Value>()["error"]
            .as_str()
            .expect("Error response should carry a message")
            .to_string()
    }
}

/// Titles of a draft's questions, in order
pub fn question_titles(draft: &Value) -> Vec<String> {
    draft["questions"]
        .as_array()
        .expect("Draft should have questions")
        .iter()
        .map(|q| q["title"].as_str().unwrap_or_default().to_string())
        .collect()
}
