//! API routes for duolog endpoints

use axum::response::sse as ax_sse;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use utoipa::OpenApi;
use uuid::Uuid;

use duolog_core::{ComparisonReport, ConversationLog, EvaluationRun};
use duolog_stream::{SessionSnapshot, StreamEvent};

use crate::debate::launch_debate;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Health check handler
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Debate creation request
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DebateRequest {
    /// The problem both variants will argue about
    pub problem: String,
    /// Strategy id; defaults to "debate"
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

fn default_strategy() -> String {
    "debate".to_string()
}

/// Debate creation response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DebateResponse {
    #[serde(rename = "debateId")]
    pub debate_id: Uuid,
}

/// Start a live debate: both conversation variants run in the background
/// and stream to `/api/stream`.
#[utoipa::path(
    post,
    path = "/api/debate",
    request_body = DebateRequest,
    responses(
        (status = 200, description = "Debate started", body = DebateResponse),
        (status = 422, description = "Unknown strategy or empty problem")
    )
)]
pub async fn start_debate(
    State(state): State<AppState>,
    Json(req): Json<DebateRequest>,
) -> ApiResult<Json<DebateResponse>> {
    let debate_id = launch_debate(&state, &req.problem, &req.strategy).await?;
    Ok(Json(DebateResponse { debate_id }))
}

/// Live session snapshot
#[utoipa::path(
    get,
    path = "/api/debate/{debate_id}",
    params(
        ("debate_id" = Uuid, Path, description = "Debate session id")
    ),
    responses(
        (status = 200, description = "Current session state"),
        (status = 404, description = "Debate not found")
    )
)]
pub async fn get_debate(
    State(state): State<AppState>,
    Path(debate_id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let snapshot = state
        .broker()
        .snapshot(debate_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("debate {}", debate_id)))?;
    Ok(Json(snapshot))
}

/// Query parameters for the SSE stream
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct StreamParams {
    /// Debate session id
    #[serde(rename = "debateId")]
    pub debate_id: Uuid,
}

fn sse_payload(event: &StreamEvent) -> serde_json::Value {
    match event {
        StreamEvent::Messages {
            messages,
            in_progress,
        } => json!({ "messages": messages, "inProgress": in_progress }),
        StreamEvent::Ping => json!({ "ping": true }),
        StreamEvent::Closed { error: None } => json!({ "messages": [], "inProgress": false }),
        StreamEvent::Closed { error: Some(message) } => {
            json!({ "error": message, "inProgress": false })
        }
    }
}

/// SSE stream of a live debate. Replays the full backlog first, then
/// pushes turns as they are produced; idle periods carry keepalive pings.
#[utoipa::path(
    get,
    path = "/api/stream",
    params(StreamParams),
    responses(
        (status = 200, description = "SSE stream of debate events"),
        (status = 404, description = "Debate not found")
    )
)]
pub async fn stream_debate(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> ApiResult<ax_sse::Sse<impl Stream<Item = Result<ax_sse::Event, Infallible>>>> {
    let subscription = state.broker().subscribe(params.debate_id).await?;

    let stream = stream::unfold(Some(subscription), |maybe_subscription| async move {
        let mut subscription = maybe_subscription?;
        let event = subscription.next_event().await?;
        let done = matches!(event, StreamEvent::Closed { .. });
        let sse_event = ax_sse::Event::default()
            .json_data(sse_payload(&event))
            .unwrap_or_else(|_| ax_sse::Event::default().data("{}"));
        Some((Ok(sse_event), (!done).then_some(subscription)))
    });

    Ok(ax_sse::Sse::new(stream))
}

/// Evaluation launch request
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct EvaluationRequest {
    pub benchmark_id: String,
    pub strategy_id: String,
    #[serde(default)]
    pub max_questions: Option<usize>,
}

/// Evaluation launch response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EvaluationResponse {
    pub evaluation_id: Uuid,
}

/// Start a benchmark evaluation. Returns immediately; poll the status
/// endpoint for completion. Unknown ids surface through the status as
/// `error`.
#[utoipa::path(
    post,
    path = "/api/evaluation/run",
    request_body = EvaluationRequest,
    responses(
        (status = 200, description = "Evaluation accepted", body = EvaluationResponse)
    )
)]
pub async fn start_evaluation(
    State(state): State<AppState>,
    Json(req): Json<EvaluationRequest>,
) -> Json<EvaluationResponse> {
    let evaluation_id = state
        .evaluations()
        .start(&req.benchmark_id, &req.strategy_id, req.max_questions)
        .await;
    Json(EvaluationResponse { evaluation_id })
}

/// Evaluation status response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Poll an evaluation's status
#[utoipa::path(
    get,
    path = "/api/evaluation/status/{evaluation_id}",
    params(
        ("evaluation_id" = Uuid, Path, description = "Evaluation id")
    ),
    responses(
        (status = 200, description = "Current status", body = StatusResponse),
        (status = 404, description = "Evaluation not found")
    )
)]
pub async fn evaluation_status(
    State(state): State<AppState>,
    Path(evaluation_id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    let status = state
        .evaluations()
        .status(evaluation_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("evaluation {}", evaluation_id)))?;
    Ok(Json(StatusResponse {
        status: status.label().to_string(),
        run_id: status.run_id().map(str::to_string),
        error: status.error_message().map(str::to_string),
    }))
}

/// One run in the history listing
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunSummary {
    pub id: String,
    pub strategy: String,
    pub benchmark: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Run history response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RunsResponse {
    pub runs: Vec<RunSummary>,
}

/// List persisted runs, newest first
#[utoipa::path(
    get,
    path = "/api/evaluation/runs",
    responses(
        (status = 200, description = "Run history", body = RunsResponse)
    )
)]
pub async fn list_runs(State(state): State<AppState>) -> ApiResult<Json<RunsResponse>> {
    let headers = state.evaluations().run_store().list().await?;
    Ok(Json(RunsResponse {
        runs: headers
            .into_iter()
            .map(|h| RunSummary {
                id: h.id,
                strategy: h.strategy,
                benchmark: h.benchmark,
                timestamp: h.timestamp,
            })
            .collect(),
    }))
}

/// Full results and summary of one run
#[utoipa::path(
    get,
    path = "/api/evaluation/runs/{run_id}",
    params(
        ("run_id" = String, Path, description = "Run id")
    ),
    responses(
        (status = 200, description = "Full evaluation run"),
        (status = 404, description = "Run not found")
    )
)]
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<EvaluationRun>> {
    let run = state.evaluations().run_store().get(&run_id).await?;
    Ok(Json(run))
}

/// Persisted transcript pair for one question
#[utoipa::path(
    get,
    path = "/api/logs/{log_id}",
    params(
        ("log_id" = String, Path, description = "Conversation log id")
    ),
    responses(
        (status = 200, description = "Conversation log"),
        (status = 404, description = "Log not found")
    )
)]
pub async fn get_log(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
) -> ApiResult<Json<ConversationLog>> {
    let log = state.evaluations().log_store().get(&log_id).await?;
    Ok(Json(log))
}

/// Comparison creation request
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ComparisonRequest {
    /// Persisted run ids sharing one benchmark
    pub run_ids: Vec<String>,
}

/// Comparison creation response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ComparisonResponse {
    pub comparison_id: String,
}

/// Derive and persist a comparison report over runs of one benchmark
#[utoipa::path(
    post,
    path = "/api/comparison",
    request_body = ComparisonRequest,
    responses(
        (status = 200, description = "Comparison created", body = ComparisonResponse),
        (status = 404, description = "A run id does not exist"),
        (status = 422, description = "Runs span multiple benchmarks")
    )
)]
pub async fn create_comparison(
    State(state): State<AppState>,
    Json(req): Json<ComparisonRequest>,
) -> ApiResult<Json<ComparisonResponse>> {
    let report = state.evaluations().build_comparison(&req.run_ids).await?;
    Ok(Json(ComparisonResponse {
        comparison_id: report.comparison_id,
    }))
}

/// One comparison in the listing
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ComparisonSummary {
    pub id: String,
    pub benchmark: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub strategies: Vec<String>,
}

/// Comparison listing response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ComparisonListResponse {
    pub comparisons: Vec<ComparisonSummary>,
}

/// List persisted comparison reports, newest first
#[utoipa::path(
    get,
    path = "/api/comparison/list",
    responses(
        (status = 200, description = "Comparison history", body = ComparisonListResponse)
    )
)]
pub async fn list_comparisons(
    State(state): State<AppState>,
) -> ApiResult<Json<ComparisonListResponse>> {
    let reports = state.evaluations().comparison_store().list().await?;
    Ok(Json(ComparisonListResponse {
        comparisons: reports
            .into_iter()
            .map(|report| {
                let mut strategies: Vec<String> = report.strategies.keys().cloned().collect();
                strategies.sort();
                ComparisonSummary {
                    id: report.comparison_id,
                    benchmark: report.benchmark,
                    timestamp: report.timestamp,
                    strategies,
                }
            })
            .collect(),
    }))
}

/// Full comparison report
#[utoipa::path(
    get,
    path = "/api/comparison/{comparison_id}",
    params(
        ("comparison_id" = String, Path, description = "Comparison id")
    ),
    responses(
        (status = 200, description = "Comparison report"),
        (status = 404, description = "Comparison not found")
    )
)]
pub async fn get_comparison(
    State(state): State<AppState>,
    Path(comparison_id): Path<String>,
) -> ApiResult<Json<ComparisonReport>> {
    let report = state
        .evaluations()
        .comparison_store()
        .get(&comparison_id)
        .await?;
    Ok(Json(report))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        start_debate,
        get_debate,
        stream_debate,
        start_evaluation,
        evaluation_status,
        list_runs,
        get_run,
        get_log,
        create_comparison,
        list_comparisons,
        get_comparison,
    ),
    components(
        schemas(
            HealthResponse,
            DebateRequest, DebateResponse,
            EvaluationRequest, EvaluationResponse,
            StatusResponse,
            RunSummary, RunsResponse,
            ComparisonRequest, ComparisonResponse,
            ComparisonSummary, ComparisonListResponse,
        )
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn api_router(state: AppState) -> Router {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        // Live debate endpoints
        .route("/api/debate", post(start_debate))
        .route("/api/debate/{debate_id}", get(get_debate))
        .route("/api/stream", get(stream_debate))
        // Evaluation endpoints
        .route("/api/evaluation/run", post(start_evaluation))
        .route("/api/evaluation/status/{evaluation_id}", get(evaluation_status))
        .route("/api/evaluation/runs", get(list_runs))
        .route("/api/evaluation/runs/{run_id}", get(get_run))
        .route("/api/logs/{log_id}", get(get_log))
        // Comparison endpoints
        .route("/api/comparison", post(create_comparison))
        .route("/api/comparison/list", get(list_comparisons))
        .route("/api/comparison/{comparison_id}", get(get_comparison))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_state, test_state_with};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use duolog_core::AnswerFormat;
    use duolog_eval::{BenchmarkRegistry, Question, StaticBenchmark};
    use duolog_llm::MockProvider;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn simple_registry() -> BenchmarkRegistry {
        let mut registry = BenchmarkRegistry::new();
        registry.register(Arc::new(StaticBenchmark::new(
            "simple",
            "SimpleBench",
            AnswerFormat::Text,
            vec![Question {
                id: "1".to_string(),
                question: "What is 6 x 7?".to_string(),
                answer: "42".to_string(),
                category: "unknown".to_string(),
                difficulty: "unknown".to_string(),
            }],
        )));
        registry
    }

    #[tokio::test]
    async fn test_health() {
        let router = api_router(test_state(MockProvider::constant("x")));
        let (status, json) = send(&router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_debate_round_trip() {
        let router = api_router(test_state(MockProvider::constant("Final Answer: 42")));

        let (status, json) = send(
            &router,
            "POST",
            "/api/debate",
            Some(serde_json::json!({"problem": "What is 6 x 7?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let debate_id = json["debateId"].as_str().unwrap().to_string();

        // The snapshot endpoint sees the session immediately
        let (status, json) =
            send(&router, "GET", &format!("/api/debate/{}", debate_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["problem"], "What is 6 x 7?");
        assert_eq!(json["strategy"], "debate");

        // Both variants finish with max_turns messages each
        for _ in 0..100 {
            let (_, json) =
                send(&router, "GET", &format!("/api/debate/{}", debate_id), None).await;
            if json["status"] == "complete" {
                assert_eq!(json["simulatedMessages"].as_array().unwrap().len(), 6);
                assert_eq!(json["dualAgentMessages"].as_array().unwrap().len(), 7);
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("debate never completed");
    }

    #[tokio::test]
    async fn test_debate_unknown_strategy_422() {
        let router = api_router(test_state(MockProvider::constant("x")));
        let (status, json) = send(
            &router,
            "POST",
            "/api/debate",
            Some(serde_json::json!({"problem": "p", "strategy": "socratic"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_evaluation_flow() {
        let router = api_router(test_state_with(
            MockProvider::constant("thinking... Final Answer: 42"),
            simple_registry(),
        ));

        let (status, json) = send(
            &router,
            "POST",
            "/api/evaluation/run",
            Some(serde_json::json!({
                "benchmark_id": "simple",
                "strategy_id": "debate",
                "max_questions": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let evaluation_id = json["evaluation_id"].as_str().unwrap().to_string();

        let run_id = {
            let mut run_id = None;
            for _ in 0..200 {
                let (status, json) = send(
                    &router,
                    "GET",
                    &format!("/api/evaluation/status/{}", evaluation_id),
                    None,
                )
                .await;
                assert_eq!(status, StatusCode::OK);
                match json["status"].as_str().unwrap() {
                    "completed" => {
                        run_id = Some(json["run_id"].as_str().unwrap().to_string());
                        break;
                    }
                    "error" => panic!("evaluation failed: {}", json["error"]),
                    _ => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
                }
            }
            run_id.expect("evaluation never completed")
        };

        // Listing shows the run, and the full record grades correctly
        let (_, json) = send(&router, "GET", "/api/evaluation/runs", None).await;
        assert_eq!(json["runs"][0]["id"], run_id.as_str());

        let (status, json) = send(
            &router,
            "GET",
            &format!("/api/evaluation/runs/{}", run_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summary"]["total_questions"], 1);
        assert_eq!(json["results"][0]["simulated"]["correct"], true);
        assert_eq!(json["results"][0]["simulated"]["answer"], "42");

        // The conversation log referenced by the result is retrievable
        let log_id = json["results"][0]["simulated"]["log_id"].as_str().unwrap();
        let (status, json) = send(&router, "GET", &format!("/api/logs/{}", log_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ground_truth"], "42");

        // A comparison over the single run round-trips
        let (status, json) = send(
            &router,
            "POST",
            "/api/comparison",
            Some(serde_json::json!({"run_ids": [run_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let comparison_id = json["comparison_id"].as_str().unwrap().to_string();

        let (_, json) = send(&router, "GET", "/api/comparison/list", None).await;
        assert_eq!(json["comparisons"][0]["id"], comparison_id.as_str());

        let (status, json) = send(
            &router,
            "GET",
            &format!("/api/comparison/{}", comparison_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["benchmark"], "simple");
    }

    #[tokio::test]
    async fn test_unknown_benchmark_reports_error_status() {
        let router = api_router(test_state(MockProvider::constant("x")));
        let (_, json) = send(
            &router,
            "POST",
            "/api/evaluation/run",
            Some(serde_json::json!({"benchmark_id": "nope", "strategy_id": "debate"})),
        )
        .await;
        let evaluation_id = json["evaluation_id"].as_str().unwrap().to_string();

        let (status, json) = send(
            &router,
            "GET",
            &format!("/api/evaluation/status/{}", evaluation_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "error");
        assert!(json["error"].as_str().unwrap().contains("Unknown benchmark"));
    }

    #[tokio::test]
    async fn test_lookup_misses_are_404() {
        let router = api_router(test_state(MockProvider::constant("x")));

        let (status, _) = send(&router, "GET", "/api/evaluation/runs/absent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, "GET", "/api/logs/absent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, "GET", "/api/comparison/absent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &router,
            "GET",
            &format!("/api/debate/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &router,
            "GET",
            &format!("/api/stream?debateId={}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &router,
            "GET",
            &format!("/api/evaluation/status/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_sse_payload_shapes() {
        let ping = sse_payload(&StreamEvent::Ping);
        assert_eq!(ping, serde_json::json!({"ping": true}));

        let closed = sse_payload(&StreamEvent::Closed { error: None });
        assert_eq!(closed["inProgress"], false);
        assert!(closed["messages"].as_array().unwrap().is_empty());

        let failed = sse_payload(&StreamEvent::Closed {
            error: Some("engine fault".to_string()),
        });
        assert_eq!(failed["error"], "engine fault");
        assert_eq!(failed["inProgress"], false);

        let messages = sse_payload(&StreamEvent::Messages {
            messages: vec![duolog_core::Message::new(
                duolog_core::Role::AgentA,
                "hi",
                duolog_core::Variant::Dual,
            )],
            in_progress: true,
        });
        assert_eq!(messages["inProgress"], true);
        assert_eq!(messages["messages"][0]["type"], "dual");
    }
}
