use std::{collections::HashSet, time::Duration};

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    FakeChatServer, FakeReply, TEST_TOKEN, TestClient, TestStateBuilder, fenced_reply,
    question_titles, sample_quiz,
};

async fn client_with_reply(reply: FakeReply) -> (TestClient, FakeChatServer) {
    let server = FakeChatServer::start(reply).await;
    let client = TestClient::new(TestStateBuilder::new().with_chat_server(&server).build());
    (client, server)
}

async fn generate(client: &TestClient, quiz_id: &str, body: &Value, token: Option<&str>) -> Value {
    let response = client
        .send_json("POST", &format!("/quizzes/{quiz_id}/generate"), body, token)
        .await;
    response.assert_status(StatusCode::OK);
    response.json()
}

fn request_body() -> Value {
    json!({
        "text": "The mitochondrion is the powerhouse of the cell.",
        "difficulty": "hard",
        "question_count": 3
    })
}

#[tokio::test]
async fn test_generate_replaces_draft() {
    let (client, _server) = client_with_reply(FakeReply::Content(fenced_reply(&sample_quiz()))).await;
    let id = client.create_quiz("Draft").await;
    client.add_question(&id, "Old question").await;

    let draft = generate(&client, &id, &request_body(), Some(TEST_TOKEN)).await;

    assert_eq!(draft["title"], "Cell Biology");
    assert_eq!(draft["generating"], false);
    assert_eq!(
        question_titles(&draft),
        [
            "What is the powerhouse of the cell?",
            "Describe mitosis",
            "How well do you know this topic?"
        ]
    );
    assert_eq!(draft["questions"][1]["type"], "long_answer");
    assert_eq!(draft["questions"][2]["type"], "rating");

    // Ids from the model collide; stored ones do not
    let ids: HashSet<&str> = draft["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 3);

    let stored: Value = client.get(&format!("/quizzes/{id}")).await.json();
    assert_eq!(stored["questions"], draft["questions"]);
}

#[tokio::test]
async fn test_generate_forwards_token_and_parameters() {
    let (client, server) = client_with_reply(FakeReply::Content(fenced_reply(&sample_quiz()))).await;
    let id = client.create_quiz("Draft").await;

    generate(&client, &id, &request_body(), Some(TEST_TOKEN)).await;

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.authorization.as_deref(),
        Some(format!("Bearer {TEST_TOKEN}").as_str())
    );
    assert_eq!(request.body["model"], "gpt-4o-mini");
    assert!(request.body["temperature"].is_number());

    let messages = request.body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    let prompt = messages[1]["content"].as_str().unwrap();
    assert!(prompt.contains("exactly 3 questions"));
    assert!(prompt.contains("hard difficulty"));
    assert!(prompt.contains("The mitochondrion is the powerhouse of the cell."));
}

#[tokio::test]
async fn test_generate_defaults_and_truncates_source() {
    let server = FakeChatServer::start(FakeReply::Content(fenced_reply(&sample_quiz()))).await;
    let client = TestClient::new(
        TestStateBuilder::new()
            .with_chat_server(&server)
            .with_max_source_chars(10)
            .build(),
    );
    let id = client.create_quiz("Draft").await;

    generate(
        &client,
        &id,
        &json!({ "text": "0123456789ABCDEF", "question_count": 0 }),
        Some(TEST_TOKEN),
    )
    .await;

    let requests = server.requests();
    let prompt = requests[0].body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("exactly 5 questions"));
    assert!(prompt.contains("medium difficulty"));
    assert!(prompt.contains("0123456789"));
    assert!(!prompt.contains("ABCDEF"));
}

#[tokio::test]
async fn test_generate_uses_configured_token() {
    let server = FakeChatServer::start(FakeReply::Content(fenced_reply(&sample_quiz()))).await;
    let client = TestClient::new(
        TestStateBuilder::new()
            .with_chat_server(&server)
            .with_fallback_token("sk-server-key")
            .build(),
    );
    let id = client.create_quiz("Draft").await;

    generate(&client, &id, &request_body(), None).await;

    assert_eq!(
        server.requests()[0].authorization.as_deref(),
        Some("Bearer sk-server-key")
    );
}

#[tokio::test]
async fn test_generate_without_token_is_401() {
    let (client, server) = client_with_reply(FakeReply::Content(fenced_reply(&sample_quiz()))).await;
    let id = client.create_quiz("Draft").await;

    let response = client
        .post_json(&format!("/quizzes/{id}/generate"), &request_body())
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert!(server.requests().is_empty());

    let draft: Value = client.get(&format!("/quizzes/{id}")).await.json();
    assert_eq!(draft["title"], "Draft");
}

#[tokio::test]
async fn test_generate_blank_text_is_400() {
    let (client, server) = client_with_reply(FakeReply::Content(fenced_reply(&sample_quiz()))).await;
    let id = client.create_quiz("Draft").await;

    let response = client
        .send_json(
            "POST",
            &format!("/quizzes/{id}/generate"),
            &json!({ "text": "  \n " }),
            Some(TEST_TOKEN),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_generate_for_unknown_quiz_is_404() {
    let (client, _server) =
        client_with_reply(FakeReply::Content(fenced_reply(&sample_quiz()))).await;

    let response = client
        .send_json(
            "POST",
            "/quizzes/550e8400-e29b-41d4-a716-446655440000/generate",
            &request_body(),
            Some(TEST_TOKEN),
        )
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

/// Generate against a failing upstream and check the draft came through untouched
async fn assert_generation_fails(reply: FakeReply, expected_message: &str) {
    let (client, _server) = client_with_reply(reply).await;
    let id = client.create_quiz("Draft").await;
    client.add_question(&id, "Keep me").await;

    let response = client
        .send_json(
            "POST",
            &format!("/quizzes/{id}/generate"),
            &request_body(),
            Some(TEST_TOKEN),
        )
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    assert!(
        response.error_message().contains(expected_message),
        "unexpected error: {}",
        response.error_message()
    );

    let draft: Value = client.get(&format!("/quizzes/{id}")).await.json();
    assert_eq!(draft["title"], "Draft");
    assert_eq!(question_titles(&draft), ["Keep me"]);
    assert_eq!(draft["generating"], false);
}

#[tokio::test]
async fn test_upstream_error_status_is_502() {
    assert_generation_fails(
        FakeReply::Status(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded".to_string()),
        "upstream exploded",
    )
    .await;
}

#[tokio::test]
async fn test_upstream_rejected_token_is_502() {
    assert_generation_fails(
        FakeReply::Status(StatusCode::UNAUTHORIZED, "invalid api key".to_string()),
        "401",
    )
    .await;
}

#[tokio::test]
async fn test_reply_without_fenced_block_is_502() {
    assert_generation_fails(
        FakeReply::Content("Sorry, I cannot help with that.".to_string()),
        "fenced JSON block",
    )
    .await;
}

#[tokio::test]
async fn test_reply_with_malformed_json_is_502() {
    assert_generation_fails(
        FakeReply::Content("```json\n{\"title\": \"Broken\", \"questions\": [\n```".to_string()),
        "malformed JSON",
    )
    .await;
}

#[tokio::test]
async fn test_reply_missing_questions_is_502() {
    assert_generation_fails(
        FakeReply::Content(fenced_reply(&json!({ "title": "No questions" }))),
        "Invalid quiz data structure",
    )
    .await;
}

#[tokio::test]
async fn test_concurrent_generation_is_409() {
    let (client, _server) = client_with_reply(FakeReply::Delayed(
        Duration::from_millis(500),
        fenced_reply(&sample_quiz()),
    ))
    .await;
    let id = client.create_quiz("Draft").await;

    let first = {
        let client = client.clone();
        let id = id.clone();
        tokio::spawn(async move {
            client
                .send_json(
                    "POST",
                    &format!("/quizzes/{id}/generate"),
                    &request_body(),
                    Some(TEST_TOKEN),
                )
                .await
        })
    };

    // Wait for the first generation to claim the draft
    let mut claimed = false;
    for _ in 0..50 {
        let draft: Value = client.get(&format!("/quizzes/{id}")).await.json();
        if draft["generating"] == true {
            claimed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(claimed, "first generation never started");

    let response = client
        .send_json(
            "POST",
            &format!("/quizzes/{id}/generate"),
            &request_body(),
            Some(TEST_TOKEN),
        )
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let first = first.await.unwrap();
    first.assert_status(StatusCode::OK);
    assert_eq!(first.json::<Value>()["title"], "Cell Biology");

    let draft: Value = client.get(&format!("/quizzes/{id}")).await.json();
    assert_eq!(draft["generating"], false);
}

#[tokio::test]
async fn test_generate_accepts_numeric_model_ids() {
    let reply = fenced_reply(&json!({
        "title": "Numbers",
        "questions": [
            {"id": 1, "title": "First", "description": null, "type": "short_answer"},
            {"id": 1, "title": "Second", "type": "rating"}
        ]
    }));
    let (client, _server) = client_with_reply(FakeReply::Content(reply)).await;
    let id = client.create_quiz("Draft").await;

    let draft = generate(&client, &id, &request_body(), Some(TEST_TOKEN)).await;

    assert_eq!(question_titles(&draft), ["First", "Second"]);
    assert_eq!(draft["questions"][0]["description"], "");
    assert_ne!(draft["questions"][0]["id"], draft["questions"][1]["id"]);
}

#[tokio::test]
async fn test_reply_with_blank_title_is_502() {
    assert_generation_fails(
        FakeReply::Content(fenced_reply(&json!({ "title": "  ", "questions": [] }))),
        "title",
    )
    .await;
}

#[tokio::test]
async fn test_generate_unknown_difficulty_is_400() {
    let (client, server) = client_with_reply(FakeReply::Content(fenced_reply(&sample_quiz()))).await;
    let id = client.create_quiz("Draft").await;

    let response = client
        .send_json(
            "POST",
            &format!("/quizzes/{id}/generate"),
            &json!({ "text": "Notes", "difficulty": "extreme" }),
            Some(TEST_TOKEN),
        )
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json_error();
    assert!(server.requests().is_empty());
}
