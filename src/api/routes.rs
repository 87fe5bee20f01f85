//! HTTP routes: health, tool catalog and question answering.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::agent::{Agent, AgentError};

use super::types::{ErrorResponse, HealthResponse, RunRequest, RunResponse, ToolsResponse};

/// Shared state for all handlers.
pub struct AppState {
    pub agent: Agent,
    pub run_timeout: Duration,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tools", get(list_tools))
        .route("/api/run", post(run))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_iterations: state.agent.max_iterations(),
    })
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.agent.tools().list_tools(),
    })
}

/// Answer a question. Each request gets its own run state and a deadline.
async fn run(State(state): State<Arc<AppState>>, Json(req): Json<RunRequest>) -> Response {
    let started_at = Utc::now();
    let cancel = CancellationToken::new();

    // Dropped with the handler, including when the client goes away mid-run.
    let deadline = Deadline::start(cancel.clone(), state.run_timeout);
    let result = state.agent.run(&req.question, &cancel).await;
    drop(deadline);

    match result {
        Ok(out) => (StatusCode::OK, Json(RunResponse::new(out, started_at))).into_response(),
        Err(err) => (status_for(&err), Json(ErrorResponse::from(&err))).into_response(),
    }
}

/// Cancels a run's token once its timeout elapses; aborts the timer on drop.
struct Deadline(JoinHandle<()>);

impl Deadline {
    fn start(cancel: CancellationToken, timeout: Duration) -> Self {
        Self(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::warn!("Run exceeded {}s, cancelling", timeout.as_secs());
            cancel.cancel();
        }))
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn status_for(err: &AgentError) -> StatusCode {
    match err {
        AgentError::Template(_) => StatusCode::BAD_REQUEST,
        AgentError::Transport { .. } => StatusCode::BAD_GATEWAY,
        AgentError::ToolNotFound { .. }
        | AgentError::ToolExecution { .. }
        | AgentError::BudgetExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AgentError::Cancelled { .. } => StatusCode::GATEWAY_TIMEOUT,
        AgentError::InvalidBudget => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentOptions, TemplateError};
    use crate::llm::{GenerationPipeline, LlmError};
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Fixed(&'static str);

    #[async_trait]
    impl GenerationPipeline for Fixed {
        async fn generate(
            &self,
            _prompt: &str,
            _cancel: &CancellationToken,
        ) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    fn state_with(reply: &'static str) -> Arc<AppState> {
        let agent = Agent::new(
            Arc::new(Fixed(reply)),
            ToolRegistry::with_defaults(false),
            AgentOptions::default(),
        )
        .unwrap();
        Arc::new(AppState {
            agent,
            run_timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn run_returns_answer() {
        let resp = run(
            State(state_with("Final Answer: Paris")),
            Json(RunRequest {
                question: "capital of France?".to_string(),
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_tool_maps_to_unprocessable() {
        let resp = run(
            State(state_with("Action: teleport\nAction Input: Paris")),
            Json(RunRequest {
                question: "go".to_string(),
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Waits for cancellation and remembers the token it was handed.
    #[derive(Default)]
    struct WaitForCancel {
        seen: Mutex<Option<CancellationToken>>,
    }

    #[async_trait]
    impl GenerationPipeline for WaitForCancel {
        async fn generate(
            &self,
            _prompt: &str,
            cancel: &CancellationToken,
        ) -> Result<String, LlmError> {
            *self.seen.lock().unwrap() = Some(cancel.clone());
            cancel.cancelled().await;
            Err(LlmError::Cancelled)
        }
    }

    fn waiting_state(pipeline: Arc<WaitForCancel>, run_timeout: Duration) -> Arc<AppState> {
        let agent = Agent::new(pipeline, ToolRegistry::empty(), AgentOptions::default()).unwrap();
        Arc::new(AppState { agent, run_timeout })
    }

    #[tokio::test]
    async fn deadline_cancels_a_slow_run() {
        let pipeline = Arc::new(WaitForCancel::default());
        let resp = run(
            State(waiting_state(pipeline, Duration::from_millis(20))),
            Json(RunRequest {
                question: "slow".to_string(),
            }),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn dropped_request_stops_its_deadline_timer() {
        let pipeline = Arc::new(WaitForCancel::default());
        let state = waiting_state(pipeline.clone(), Duration::from_millis(50));

        let handler = run(
            State(state),
            Json(RunRequest {
                question: "abandoned".to_string(),
            }),
        );
        // The client goes away while the model is still generating.
        let abandoned = tokio::time::timeout(Duration::from_millis(10), handler).await;
        assert!(abandoned.is_err());

        let token = pipeline.seen.lock().unwrap().clone().unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_a_deadline_aborts_its_timer() {
        let cancel = CancellationToken::new();
        let deadline = Deadline::start(cancel.clone(), Duration::from_millis(20));
        drop(deadline);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!cancel.is_cancelled());

        let _deadline = Deadline::start(cancel.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn error_body_carries_tool_and_iteration() {
        let err = AgentError::ToolNotFound {
            iteration: 3,
            tool: "teleport".to_string(),
        };
        let body = ErrorResponse::from(&err);
        assert_eq!(body.kind, "tool_not_found");
        assert_eq!(body.iteration, Some(3));
        assert_eq!(body.tool.as_deref(), Some("teleport"));

        let err = AgentError::Template(TemplateError::MissingQuestion);
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }
}
