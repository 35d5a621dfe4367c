// Integration tests for Survey Brain

use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use survey_brain::core::sanitizer::RULE_SCORE_REASON;
use survey_brain::core::{RecommendError, Recommender, SanitizerPolicy, Scorer};
use survey_brain::models::{AdvisoryRequest, Archetype};
use survey_brain::routes::{configure_routes, AppState};
use survey_brain::services::{AdvisorError, AdvisoryService, OpenAiAdvisor};

/// Replies with fixed content
struct StubAdvisor(String);

#[async_trait]
impl AdvisoryService for StubAdvisor {
    async fn advise(&self, _request: &AdvisoryRequest) -> Result<String, AdvisorError> {
        Ok(self.0.clone())
    }
}

/// Behaves like a deployment without a credential
struct UnconfiguredAdvisor;

#[async_trait]
impl AdvisoryService for UnconfiguredAdvisor {
    fn ensure_configured(&self) -> Result<(), AdvisorError> {
        Err(AdvisorError::MissingCredential)
    }

    async fn advise(&self, _request: &AdvisoryRequest) -> Result<String, AdvisorError> {
        unreachable!("advise must not be called without a credential")
    }
}

fn recommender(advisor: impl AdvisoryService + 'static, result_count: usize) -> Recommender {
    let policy = SanitizerPolicy {
        result_count,
        ..SanitizerPolicy::default()
    };
    Recommender::new(Scorer::default(), policy, Arc::new(advisor))
}

fn openai_advisor(endpoint: String) -> OpenAiAdvisor {
    OpenAiAdvisor::new(
        endpoint,
        "gpt-4o-mini".to_string(),
        0.1,
        Some("test-key".to_string()),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn chat_envelope(content: &str) -> String {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

/// Good mains with the 16 A circuit, so no caveats are appended
fn well_supplied_survey() -> Value {
    json!({
        "flow_lpm": 24,
        "standing_pressure_bar": 3,
        "working_pressure_desc": "24 L/min @ 1.8 bar",
        "pressure_test_method": "two_tap",
        "existing_system": "regular",
        "hot_water": "vented",
        "bathrooms": 2,
        "occupancy": "family",
        "electrics_16a": "yes",
    })
}

#[tokio::test]
async fn test_integration_advisor_reply_is_bounded() {
    let reply = json!({
        "recommendations": [
            { "title": "Combi", "reason": "Great mains.", "match": 100 },
            { "title": "Regular (open vented)", "reason": "Like-for-like.", "match": "70" },
        ]
    })
    .to_string();
    let recommender = recommender(StubAdvisor(reply), 4);

    let outcome = recommender.recommend(&well_supplied_survey()).await.unwrap();

    assert_eq!(outcome.recommendations.len(), 4);
    let combi = outcome
        .recommendations
        .iter()
        .find(|r| r.archetype == Archetype::Combi)
        .unwrap();
    assert_eq!(combi.reason, "Great mains.");
    assert!(combi.match_score <= outcome.baseline.get(Archetype::Combi) + 10);
}

#[tokio::test]
async fn test_integration_missing_credential() {
    let recommender = recommender(UnconfiguredAdvisor, 4);
    let result = recommender.recommend(&json!({})).await;

    assert!(matches!(
        result,
        Err(RecommendError::Advisor(AdvisorError::MissingCredential))
    ));
}

#[tokio::test]
async fn test_integration_openai_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let content = json!({
        "recommendations": [
            { "title": "System + Unvented Cylinder", "reason": "Strong mains.", "match": 80 },
            { "title": "Combi", "reason": "Compact.", "match": 60 },
        ]
    })
    .to_string();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(mockito::Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "response_format": { "type": "json_object" },
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_envelope(&content))
        .create_async()
        .await;

    let advisor = openai_advisor(format!("{}/v1/chat/completions", server.url()));
    let recommender = recommender(advisor, 2);
    let outcome = recommender.recommend(&well_supplied_survey()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.recommendations.len(), 2);
    let titles: Vec<_> = outcome.recommendations.iter().map(|r| r.archetype).collect();
    assert!(titles.contains(&Archetype::SystemUnvented));
}

#[tokio::test]
async fn test_integration_openai_failure_is_relayed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let advisor = openai_advisor(format!("{}/v1/chat/completions", server.url()));
    let result = recommender(advisor, 4).recommend(&json!({})).await;

    match result {
        Err(RecommendError::Advisor(AdvisorError::ApiError { status, body })) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected advisor error, got {:?}", other.map(|o| o.recommendations)),
    }
}

#[tokio::test]
async fn test_integration_openai_garbage_content_backfills() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(chat_envelope("Sorry, I cannot help with that."))
        .create_async()
        .await;

    let advisor = openai_advisor(format!("{}/v1/chat/completions", server.url()));
    let outcome = recommender(advisor, 4)
        .recommend(&well_supplied_survey())
        .await
        .unwrap();

    assert_eq!(outcome.recommendations.len(), 4);
    for rec in &outcome.recommendations {
        assert_eq!(rec.reason, RULE_SCORE_REASON);
        assert_eq!(rec.match_score, outcome.baseline.get(rec.archetype));
    }
}

macro_rules! app {
    ($advisor:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(recommender($advisor, 4))))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_http_health() {
    let app = app!(StubAdvisor(String::new()));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_http_non_post_is_rejected() {
    let app = app!(StubAdvisor(String::new()));

    for uri in ["/api/v1/recommend", "/api/v1/recommend/cards", "/api/v1/score"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status().as_u16(), 405);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Use POST");
    }
}

#[actix_web::test]
async fn test_http_invalid_advisor_data_returns_backfill() {
    let app = app!(StubAdvisor("{\"recommendations\": 42}".to_string()));
    let req = test::TestRequest::post()
        .uri("/api/v1/recommend")
        .set_json(well_supplied_survey())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 4);
    for rec in recs {
        assert_eq!(rec["reason"], RULE_SCORE_REASON);
        assert!(Archetype::from_title(rec["title"].as_str().unwrap()).is_some());
        assert!(rec["match"].is_u64());
    }
}

#[actix_web::test]
async fn test_http_advisor_failure_has_no_recommendations() {
    let app = app!(UnconfiguredAdvisor);
    let req = test::TestRequest::post()
        .uri("/api/v1/recommend")
        .set_payload("")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "configuration_error");
    assert_eq!(body["status_code"], 500);
    assert!(body.get("recommendations").is_none());
}

#[actix_web::test]
async fn test_http_invalid_json_body() {
    let app = app!(StubAdvisor(String::new()));
    let req = test::TestRequest::post()
        .uri("/api/v1/recommend")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"flow_lpm\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_http_cards_are_html() {
    let app = app!(StubAdvisor(String::new()));
    let req = test::TestRequest::post()
        .uri("/api/v1/recommend/cards")
        .set_json(well_supplied_survey())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert_eq!(html.matches("<article").count(), 4);
    assert!(html.contains("% match"));
}

#[actix_web::test]
async fn test_http_score_needs_no_credential() {
    let app = app!(UnconfiguredAdvisor);
    let req = test::TestRequest::post()
        .uri("/api/v1/score")
        .set_json(json!({ "space_for_cylinder": "none" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["rules_version"], "2024-10.1");
    assert_eq!(body["scores"]["System + Unvented Cylinder"], 0);
    assert_eq!(body["ranked"].as_array().unwrap().len(), 5);
    assert_eq!(body["ranked"][0]["title"], "Regular (open vented)");
}

#[actix_web::test]
async fn test_http_upstream_failure_relays_advisor_text() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let app = app!(openai_advisor(format!("{}/v1/chat/completions", server.url())));
    let req = test::TestRequest::post()
        .uri("/api/v1/recommend")
        .set_json(well_supplied_survey())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 500);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "advisor_error");
    assert_eq!(body["message"], "upstream exploded");
    assert!(body.get("recommendations").is_none());
}

#[actix_web::test]
async fn test_http_backfill_without_working_pressure_keeps_plain_reason() {
    let app = app!(StubAdvisor("not json at all".to_string()));
    let req = test::TestRequest::post()
        .uri("/api/v1/recommend")
        .set_json(json!({ "electrics_16a": "yes", "flow_lpm": 20 }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 4);
    assert!(recs.iter().any(|r| r["title"] == "Regular + Mixergy (vented)"));
    for rec in recs {
        assert_eq!(rec["reason"], RULE_SCORE_REASON);
    }
}
