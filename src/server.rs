use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::{analyzer::Analyzer, error::AnalyzeError, report::AnalysisReport};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub repo_url: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub ollama_url: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Maps the analysis error taxonomy onto HTTP statuses.
#[derive(Debug)]
pub struct ApiError(AnalyzeError);

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AnalyzeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::NotFound(_) | AnalyzeError::AuthRequired(_) => StatusCode::NOT_FOUND,
            AnalyzeError::Conflict(_) => StatusCode::CONFLICT,
            AnalyzeError::Transport(_) | AnalyzeError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match &self.0 {
            AnalyzeError::InvalidInput(msg) => msg.clone(),
            AnalyzeError::NotFound(_) | AnalyzeError::AuthRequired(_) => {
                "Repository not found or is private.".to_string()
            }
            AnalyzeError::Conflict(_) => "Repository clone conflict. Please try again.".to_string(),
            other => format!("Analysis failed: {}", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody { detail: self.detail() })).into_response()
    }
}

pub fn router(analyzer: Analyzer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .with_state(Arc::new(analyzer))
}

pub async fn serve(analyzer: Analyzer, bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "serving RepoVision API");
    axum::serve(listener, router(analyzer)).await
}

async fn health(State(analyzer): State<Arc<Analyzer>>) -> Json<HealthResponse> {
    let config = analyzer.config();
    Json(HealthResponse {
        status: "ok",
        model: config.ollama_model.clone(),
        ollama_url: config.ollama_base_url.clone(),
    })
}

async fn analyze(
    State(analyzer): State<Arc<Analyzer>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let repo_url = request.repo_url.trim().to_string();
    info!(repo = %repo_url, "analysis requested");
    match analyzer.analyze(&repo_url).await {
        Ok(report) => {
            info!(repo = %report.repo_name, source = ?report.narrative_source, "analysis complete");
            Ok(Json(report))
        }
        Err(err) => {
            error!(repo = %repo_url, error = %err, "analysis failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnalyzerConfig, narrative::DisabledNarrative, snapshot::GitCloner};

    fn state() -> Arc<Analyzer> {
        let config = AnalyzerConfig {
            ollama_model: "llama3".to_string(),
            ..AnalyzerConfig::default()
        };
        Arc::new(Analyzer::new(config, Arc::new(GitCloner), Arc::new(DisabledNarrative)))
    }

    #[tokio::test]
    async fn health_reports_model_and_url() {
        let Json(body) = health(State(state())).await;
        assert_eq!(
            body,
            HealthResponse {
                status: "ok",
                model: "llama3".to_string(),
                ollama_url: "http://localhost:11434".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn non_github_url_is_a_bad_request() {
        let request = AnalyzeRequest {
            repo_url: "https://bitbucket.org/a/b".to_string(),
        };
        let err = analyze(State(state()), Json(request)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.detail().contains("https://github.com/"));
    }

    #[test]
    fn error_taxonomy_maps_to_statuses() {
        let status = |e: AnalyzeError| ApiError(e).status();
        assert_eq!(status(AnalyzeError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AnalyzeError::AuthRequired("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AnalyzeError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(AnalyzeError::transport("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let resp = ApiError(AnalyzeError::Conflict("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
