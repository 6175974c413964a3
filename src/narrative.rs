//! Narrative fields of a report: asked of a language model, replaced wholesale
//! by a rule-based synthesis whenever the model cannot be used.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{error::NarrativeError, manifests::KeyFiles, text::truncate_chars};

pub const SYSTEM_PROMPT: &str = "You are an expert software architect and code analyst. \
Analyze the provided GitHub repository information and return a structured JSON response.
Be concise, accurate, and insightful. Always return valid JSON.";

const PROMPT_LANGUAGES: usize = 8;
const PROMPT_FRAMEWORKS: usize = 8;
const PROMPT_DATABASES: usize = 5;
const PROMPT_README_CHARS: usize = 3000;
const PROMPT_MANIFEST_CHARS: usize = 1500;
const PROMPT_TREE_CHARS: usize = 2000;

const FRONTEND_FRAMEWORKS: &[&str] = &["react", "vue.js", "angular", "next.js"];
const BACKEND_FRAMEWORKS: &[&str] = &["fastapi", "express.js", "django", "flask", "spring boot"];
const ML_FRAMEWORKS: &[&str] = &["tensorflow", "pytorch", "scikit-learn"];

/// Generates text for a system + user prompt pair.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, NarrativeError>;
}

/// Always fails, so every reconciliation ends in the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNarrative;

#[async_trait]
impl NarrativeService for DisabledNarrative {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, NarrativeError> {
        Err(NarrativeError::Network("narrative generation is disabled".to_string()))
    }
}

/// Everything the prompt and the fallback are built from.
#[derive(Debug, Clone, Default)]
pub struct RepoContext {
    pub repo_name: String,
    pub repo_url: String,
    pub primary_language: String,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub databases: Vec<String>,
    pub file_count: usize,
    pub total_lines: usize,
    pub key_files: KeyFiles,
    pub folder_tree: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiagramSet {
    pub architecture: String,
    pub component: String,
    pub flow: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeResult {
    pub summary: String,
    pub features: Vec<String>,
    pub architecture_type: String,
    pub architecture_explanation: String,
    pub improvements_suggestion: Vec<String>,
    pub security_risks: Vec<String>,
    pub diagrams: DiagramSet,
    pub source: NarrativeSource,
}

/// JSON shape requested from the model. Absent fields take neutral defaults.
#[derive(Debug, Deserialize)]
struct ModelPayload {
    summary: String,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default = "default_architecture_type")]
    architecture_type: String,
    #[serde(default)]
    architecture_explanation: String,
    #[serde(default)]
    improvements_suggestion: Vec<String>,
    #[serde(default)]
    security_risks: Vec<String>,
    #[serde(default = "default_architecture_diagram")]
    mermaid_architecture: String,
    #[serde(default = "default_component_diagram")]
    mermaid_component: String,
    #[serde(default = "default_flow_diagram")]
    mermaid_flow: String,
}

fn default_architecture_type() -> String {
    "Unknown".to_string()
}

fn default_architecture_diagram() -> String {
    "graph TD\n    A[App] --> B[Core]".to_string()
}

fn default_component_diagram() -> String {
    "graph LR\n    A[Module] --> B[Service]".to_string()
}

fn default_flow_diagram() -> String {
    "sequenceDiagram\n    User->>App: Request\n    App-->>User: Response".to_string()
}

impl From<ModelPayload> for NarrativeResult {
    fn from(p: ModelPayload) -> Self {
        NarrativeResult {
            summary: p.summary,
            features: p.features,
            architecture_type: p.architecture_type,
            architecture_explanation: p.architecture_explanation,
            improvements_suggestion: p.improvements_suggestion,
            security_risks: p.security_risks,
            diagrams: DiagramSet {
                architecture: p.mermaid_architecture,
                component: p.mermaid_component,
                flow: p.mermaid_flow,
            },
            source: NarrativeSource::Model,
        }
    }
}

/// Asks `service` for the narrative and falls back on any failure.
///
/// Never fails: transport errors, timeouts, unparsable output and output
/// without a summary all produce [`fallback_analysis`].
pub async fn reconcile(service: &dyn NarrativeService, ctx: &RepoContext, timeout: Duration) -> NarrativeResult {
    let prompt = build_prompt(ctx);
    debug!(repo = %ctx.repo_name, prompt_chars = prompt.len(), "requesting narrative");

    let outcome = match tokio::time::timeout(timeout, service.generate(SYSTEM_PROMPT, &prompt)).await {
        Ok(result) => result,
        Err(_) => Err(NarrativeError::Timeout {
            seconds: timeout.as_secs(),
        }),
    };

    let raw = match outcome {
        Ok(raw) => raw,
        Err(err) => {
            warn!(repo = %ctx.repo_name, error = %err, "narrative service unavailable, using fallback");
            return fallback_analysis(ctx);
        }
    };

    match accept(parse_llm_response(&raw)) {
        Some(result) => {
            info!(repo = %ctx.repo_name, "narrative accepted from model");
            result
        }
        None => {
            warn!(repo = %ctx.repo_name, response_chars = raw.len(), "model output rejected, using fallback");
            fallback_analysis(ctx)
        }
    }
}

/// Whole response as JSON, else the span from the first `{` to the last `}`,
/// else an empty object.
pub fn parse_llm_response(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return value;
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return value;
            }
        }
    }
    Value::Object(Default::default())
}

/// A non-empty object whose `summary` is a non-empty string, converted as a
/// whole; anything else is rejected.
fn accept(parsed: Value) -> Option<NarrativeResult> {
    let obj = parsed.as_object()?;
    let has_summary = obj
        .get("summary")
        .and_then(|s| s.as_str())
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);
    if !has_summary {
        return None;
    }
    serde_json::from_value::<ModelPayload>(parsed)
        .map(NarrativeResult::from)
        .map_err(|e| debug!(error = %e, "model JSON has the wrong shape"))
        .ok()
}

pub fn build_prompt(ctx: &RepoContext) -> String {
    let or_none = |items: &[String], limit: usize| {
        if items.is_empty() {
            "None detected".to_string()
        } else {
            items.iter().take(limit).cloned().collect::<Vec<_>>().join(", ")
        }
    };
    let languages = ctx
        .languages
        .iter()
        .take(PROMPT_LANGUAGES)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let readme = if ctx.key_files.readme.is_empty() {
        "No README found"
    } else {
        truncate_chars(&ctx.key_files.readme, PROMPT_README_CHARS)
    };

    format!(
        r#"Analyze this GitHub repository and return a JSON object with the exact structure shown below.

Repository: {name}
URL: {url}
Primary Language: {primary}
Languages Detected: {languages}
Frameworks Detected: {frameworks}
Databases Detected: {databases}
File Count: {files}
Total Lines of Code: {lines}

README (first 3000 chars):
{readme}

Requirements/Dependencies:
{requirements}
{package_json}

Folder Structure:
{tree}

Return ONLY this JSON (no markdown, no explanation):
{{
  "summary": "2-3 sentence description of what this project does and its main purpose",
  "features": ["feature 1", "feature 2", "feature 3", "feature 4", "feature 5"],
  "architecture_type": "one of: Monolithic, Microservices, MVC, REST API, CLI Tool, Library/Package, Full-Stack, Data Pipeline, ML/AI Application, Mobile App, Desktop App",
  "architecture_explanation": "2-3 sentences explaining the architecture pattern and how components interact",
  "improvements_suggestion": [
    "Specific improvement suggestion 1",
    "Specific improvement suggestion 2",
    "Specific improvement suggestion 3",
    "Specific improvement suggestion 4"
  ],
  "security_risks": [
    "Security concern 1 (or 'No major security risks detected' if none)",
    "Security concern 2"
  ],
  "mermaid_architecture": "graph TD\n    A[Client] --> B[Backend]\n    B --> C[Database]",
  "mermaid_component": "graph LR\n    A[Component1] --> B[Component2]",
  "mermaid_flow": "sequenceDiagram\n    User->>App: Action\n    App->>DB: Query\n    DB-->>App: Result\n    App-->>User: Response"
}}"#,
        name = ctx.repo_name,
        url = ctx.repo_url,
        primary = ctx.primary_language,
        languages = languages,
        frameworks = or_none(&ctx.frameworks, PROMPT_FRAMEWORKS),
        databases = or_none(&ctx.databases, PROMPT_DATABASES),
        files = ctx.file_count,
        lines = ctx.total_lines,
        readme = readme,
        requirements = truncate_chars(&ctx.key_files.requirements, PROMPT_MANIFEST_CHARS),
        package_json = truncate_chars(&ctx.key_files.package_json, PROMPT_MANIFEST_CHARS),
        tree = truncate_chars(&ctx.folder_tree, PROMPT_TREE_CHARS),
    )
}

fn uses_any(frameworks: &[String], set: &[&str]) -> bool {
    frameworks
        .iter()
        .any(|f| set.contains(&f.to_lowercase().as_str()))
}

/// First matching rule wins: frontend with backend, frontend, backend, ML.
pub fn classify_architecture(frameworks: &[String]) -> &'static str {
    let frontend = uses_any(frameworks, FRONTEND_FRAMEWORKS);
    let backend = uses_any(frameworks, BACKEND_FRAMEWORKS);
    match (frontend, backend) {
        (true, true) => "Full-Stack",
        (true, false) => "Frontend SPA",
        (false, true) => "REST API",
        _ if uses_any(frameworks, ML_FRAMEWORKS) => "ML/AI Application",
        _ => "Monolithic",
    }
}

/// Deterministic narrative built only from detection results.
pub fn fallback_analysis(ctx: &RepoContext) -> NarrativeResult {
    let architecture = classify_architecture(&ctx.frameworks);
    let top = |n: usize| ctx.frameworks.iter().take(n).cloned().collect::<Vec<_>>().join(", ");

    let mut summary = format!("{} is a {} project", ctx.repo_name, ctx.primary_language);
    if !ctx.frameworks.is_empty() {
        summary.push_str(&format!(" using {}", top(3)));
    }
    summary.push_str(". ");
    if ctx.key_files.readme.is_empty() {
        summary.push_str("See the repository for more details.");
    } else {
        summary.push_str(truncate_chars(&ctx.key_files.readme, 200));
    }

    let uses = if ctx.frameworks.is_empty() {
        "standard libraries".to_string()
    } else {
        top(2)
    };
    let features = vec![
        format!("Built with {}", ctx.primary_language),
        format!("Uses {}", uses),
        format!(
            "{} source files with {} lines of code",
            ctx.file_count,
            group_thousands(ctx.total_lines)
        ),
        "Open source project".to_string(),
        "See README for full feature list".to_string(),
    ];

    let mut explanation = format!(
        "This project follows a {} architecture pattern. It is primarily written in {}",
        architecture, ctx.primary_language
    );
    if !ctx.frameworks.is_empty() {
        explanation.push_str(&format!(" with {} as the main framework(s)", top(2)));
    }
    explanation.push('.');

    NarrativeResult {
        summary,
        features,
        architecture_type: architecture.to_string(),
        architecture_explanation: explanation,
        improvements_suggestion: vec![
            "Add comprehensive unit and integration tests".to_string(),
            "Implement CI/CD pipeline for automated testing and deployment".to_string(),
            "Add detailed API documentation (e.g., Swagger/OpenAPI)".to_string(),
            "Consider adding Docker support for containerized deployment".to_string(),
        ],
        security_risks: vec![
            "Review dependency versions for known CVEs".to_string(),
            "Ensure sensitive data is not hardcoded in source files".to_string(),
        ],
        diagrams: DiagramSet {
            architecture: architecture_diagram(ctx),
            component: format!(
                "graph LR\n    A[{}] --> B[Core Modules]\n    B --> C[Utilities]\n    B --> D[Services]\n    D --> E[External APIs]",
                ctx.repo_name
            ),
            flow: "sequenceDiagram\n    participant User\n    participant App\n    participant Service\n    User->>App: Request\n    App->>Service: Process\n    Service-->>App: Result\n    App-->>User: Response"
                .to_string(),
        },
        source: NarrativeSource::Fallback,
    }
}

/// Chains the detected layers; fewer than two layers gets a generic pipeline.
fn architecture_diagram(ctx: &RepoContext) -> String {
    let mut nodes: Vec<(&str, String)> = Vec::new();
    if uses_any(&ctx.frameworks, FRONTEND_FRAMEWORKS) {
        nodes.push(("Frontend", "Frontend".to_string()));
    }
    if uses_any(&ctx.frameworks, BACKEND_FRAMEWORKS) {
        nodes.push(("Backend", "Backend API".to_string()));
    }
    if let Some(db) = ctx.databases.first() {
        nodes.push(("DB", db.clone()));
    }

    if nodes.len() < 2 {
        return format!(
            "graph TD\n    A[{}] --> B[Core Logic]\n    B --> C[Output]",
            ctx.repo_name
        );
    }

    let mut out = String::from("graph TD\n");
    for pair in nodes.windows(2) {
        out.push_str(&format!("    {} --> {}\n", pair[0].0, pair[1].0));
    }
    for (id, label) in &nodes {
        out.push_str(&format!("    {}[{}]\n", id, label));
    }
    out
}

/// `1234567` -> `1,234,567`
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
