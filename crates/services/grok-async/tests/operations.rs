use std::time::Duration;

use grok_async::prelude::*;
use grok_async::test_support::agent_body;
use grok_async::RetryPolicy;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> Client {
    let config = GrokConfig::new()
        .with_api_base(server.uri())
        .with_api_key("test-api-key")
        .with_model("grok-4-fast")
        .with_default_limit(20);
    Client::new(config)
        .unwrap()
        .with_retry_policy(RetryPolicy::with_step(Duration::from_millis(10)))
}

async fn sent_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "expected exactly one upstream call");
    requests[0].body_json().unwrap()
}

fn instruction(body: &Value) -> &str {
    body["input"][0]["content"].as_str().unwrap()
}

#[tokio::test]
async fn search_posts_sentiment_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "model": "grok-4-fast",
            "temperature": 0.3,
            "tools": [{"type": "x_search"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(agent_body(
            r#"{"summary":"Mostly upbeat","sentiment":{"overall":"positive"}}"#,
            &["https://x.com/ev_fan/status/1"],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let resp = client
        .search_posts(
            SearchParams::new("electric vehicles")
                .with_analysis(AnalysisType::Sentiment)
                .with_time_window(TimeWindow::OneHour),
        )
        .await
        .unwrap();

    assert_eq!(resp.object, "chat.completion");
    assert_eq!(resp.choices.len(), 1);
    assert!(resp.content().contains("Mostly upbeat"));
    assert_eq!(resp.citations(), ["https://x.com/ev_fan/status/1"]);
    assert_eq!(resp.usage, Some(ChatUsage::new(120, 80)));

    let body = sent_body(&server).await;
    let prompt = instruction(&body);
    assert!(prompt.contains("\"electric vehicles\""));
    assert!(prompt.contains("the last hour"));
    assert!(prompt.contains("focus on sentiment"));
    assert!(prompt.contains("up to 20 "));
    assert_eq!(body["tools"][0]["from_date"], body["tools"][0]["to_date"]);
}

#[tokio::test]
async fn blank_query_is_rejected_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    for query in ["", "   "] {
        let err = client.search_posts(SearchParams::new(query)).await.unwrap_err();
        assert!(matches!(err, GrokError::Validation(_)));
        assert_eq!(err.status(), 0);
        assert!(err.message().contains("query"));
    }

    let err = client.analyze_topic(TopicParams::new(" ")).await.unwrap_err();
    assert!(err.message().contains("topic"));
    let err = client.chat(ChatParams::new("")).await.unwrap_err();
    assert!(err.message().contains("prompt"));
}

#[tokio::test]
async fn analyze_topic_uses_given_aspects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(agent_body("{}", &[])))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let params = TopicParams {
        topic: "AI regulation".into(),
        aspects: vec!["policy".into(), " ".into(), "industry".into()],
        time_window: TimeWindow::SevenDays,
    };
    let resp = client.analyze_topic(params).await.unwrap();
    assert!(resp.citations.is_none());

    let body = sent_body(&server).await;
    assert!(instruction(&body).contains("aspects: policy, industry."));
    assert!(instruction(&body).contains("the last 7 days"));
    assert_ne!(body["tools"][0]["from_date"], body["tools"][0]["to_date"]);
}

#[tokio::test]
async fn detect_trends_names_category_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(agent_body("{\"trends\":[]}", &[])))
        .mount(&server)
        .await;

    let client = test_client(&server);
    client
        .detect_trends(TrendParams {
            category: Some("technology".into()),
            limit: Some(5),
        })
        .await
        .unwrap();

    let body = sent_body(&server).await;
    assert!(instruction(&body).contains("trending right now in the technology category"));
    assert!(instruction(&body).contains("top 5 trending topics"));
    assert!(body.get("temperature").is_none());
}

#[tokio::test]
async fn chat_without_search_omits_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(agent_body("hello there", &[])))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let resp = client.chat(ChatParams::new("say hello")).await.unwrap();
    assert_eq!(resp.content(), "hello there");

    let body = sent_body(&server).await;
    assert!(body.get("tools").is_none());
    assert_eq!(body["temperature"], 0.7);
    assert_eq!(instruction(&body), "say hello");
}

#[tokio::test]
async fn chat_with_search_sends_unbounded_directive() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(json!({"tools": [{"type": "x_search"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(agent_body("grounded", &[])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client
        .chat(ChatParams::new("what's new?").with_search(true).with_temperature(1.2))
        .await
        .unwrap();

    let body = sent_body(&server).await;
    assert!(body["tools"][0].get("from_date").is_none());
    assert_eq!(body["temperature"], 1.2);
}

#[tokio::test]
async fn out_of_range_temperature_never_reaches_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client
        .chat(ChatParams::new("hi").with_temperature(3.5))
        .await
        .unwrap_err();
    assert!(matches!(err, GrokError::Validation(ref v) if v.has_path("temperature")));
}

#[tokio::test]
async fn legacy_chat_shape_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "grok-3",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "legacy"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let resp = client.chat(ChatParams::new("hi")).await.unwrap();
    assert_eq!(resp.content(), "legacy");
    assert_eq!(resp.model, "grok-3");
}

#[tokio::test]
async fn network_failure_reports_status_zero() {
    let config = GrokConfig::new()
        .with_api_base("http://127.0.0.1:1")
        .with_api_key("test-api-key");
    let client = Client::new(config)
        .unwrap()
        .with_retry_policy(RetryPolicy::with_step(Duration::from_millis(1)));

    let err = client.chat(ChatParams::new("hi")).await.unwrap_err();
    assert!(matches!(err, GrokError::Reqwest(_)));
    assert_eq!(err.status(), 0);
    assert!(err.to_payload().response.is_none());
}
