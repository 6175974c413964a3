use chrono::Utc;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::info;

use crate::{
    config::{AnalyzerConfig, CloneMethod},
    error::AnalyzeError,
    languages::{detect_languages, LanguageSummary},
    manifests::{read_key_files, scan_manifests, KeyFiles, ManifestScan},
    narrative::{reconcile, DisabledNarrative, NarrativeService, RepoContext},
    ollama::OllamaClient,
    project_tree::render_tree,
    report::AnalysisReport,
    scoring::{score_complexity, score_quality},
    snapshot::{prepare_snapshot, ArchiveCloner, Cloner, GitCloner, RepoLocator},
};

/// Clones, inspects and explains repositories.
#[derive(Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    cloner: Arc<dyn Cloner>,
    narrative: Arc<dyn NarrativeService>,
}

/// Filesystem facts gathered from one snapshot.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub languages: LanguageSummary,
    pub manifests: ManifestScan,
    pub folder_tree: String,
    pub key_files: KeyFiles,
    pub quality_score: u8,
}

/// Runs every filesystem pass over `root`. Language detection and manifest
/// scanning share nothing and run side by side.
pub fn inspect(root: &Path, repo_name: &str, tree_depth: usize) -> Inspection {
    let (languages, manifests) = rayon::join(|| detect_languages(root), || scan_manifests(root));

    let body = render_tree(root, tree_depth);
    let folder_tree = if body.is_empty() {
        format!("[D] {}/", repo_name)
    } else {
        format!("[D] {}/\n{}", repo_name, body)
    };

    Inspection {
        languages,
        manifests,
        folder_tree,
        key_files: read_key_files(root),
        quality_score: score_quality(root),
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig, cloner: Arc<dyn Cloner>, narrative: Arc<dyn NarrativeService>) -> Self {
        Self {
            config,
            cloner,
            narrative,
        }
    }

    /// Wires the cloner and narrative service named by `config`. With
    /// `use_model` off every report carries the rule-based narrative.
    pub fn from_config(config: AnalyzerConfig, use_model: bool) -> Result<Self, AnalyzeError> {
        let cloner: Arc<dyn Cloner> = match config.clone_method {
            CloneMethod::Archive => Arc::new(ArchiveCloner::new(config.max_repo_bytes())?),
            CloneMethod::Git => Arc::new(GitCloner),
        };
        let narrative: Arc<dyn NarrativeService> = if use_model {
            let client = OllamaClient::new(
                config.ollama_base_url.clone(),
                config.ollama_model.clone(),
                Duration::from_secs(config.narrative_timeout_secs),
            )
            .map_err(|e| AnalyzeError::transport(e.to_string()))?;
            Arc::new(client)
        } else {
            Arc::new(DisabledNarrative)
        };
        Ok(Self::new(config, cloner, narrative))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Full pipeline for a GitHub URL. The snapshot is removed before this
    /// returns, whatever the outcome.
    pub async fn analyze(&self, repo_url: &str) -> Result<AnalysisReport, AnalyzeError> {
        let locator = RepoLocator::parse(repo_url)?;
        let snapshot = prepare_snapshot(self.cloner.as_ref(), &locator, &self.config.clone_dir).await?;
        let result = self
            .analyze_dir(snapshot.root().to_path_buf(), locator.name(), &locator.url)
            .await;
        snapshot.cleanup().await;
        result
    }

    /// Analyzes a directory already on disk. Nothing is cloned or deleted.
    pub async fn analyze_local(&self, dir: &Path) -> Result<AnalysisReport, AnalyzeError> {
        if !dir.is_dir() {
            return Err(AnalyzeError::invalid_input(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        let root = tokio::fs::canonicalize(dir).await?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let url = root.display().to_string();
        self.analyze_dir(root, &name, &url).await
    }

    async fn analyze_dir(&self, root: PathBuf, repo_name: &str, repo_url: &str) -> Result<AnalysisReport, AnalyzeError> {
        let depth = self.config.tree_depth;
        let name = repo_name.to_string();
        let inspection = tokio::task::spawn_blocking(move || inspect(&root, &name, depth))
            .await
            .map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, format!("inspection task failed: {}", e))
            })?;

        let Inspection {
            languages,
            manifests,
            folder_tree,
            key_files,
            quality_score,
        } = inspection;
        info!(
            repo = repo_name,
            files = languages.file_count,
            lines = languages.total_lines,
            primary = %languages.primary_language,
            frameworks = manifests.frameworks.len(),
            "repository inspected"
        );

        let (complexity_score, complexity_label) =
            score_complexity(languages.file_count, languages.total_lines, &languages.languages);

        let ctx = RepoContext {
            repo_name: repo_name.to_string(),
            repo_url: repo_url.to_string(),
            primary_language: languages.primary_language.clone(),
            languages: languages.languages.clone(),
            frameworks: manifests.frameworks.clone(),
            databases: manifests.databases.clone(),
            file_count: languages.file_count,
            total_lines: languages.total_lines,
            key_files,
            folder_tree,
        };
        let timeout = Duration::from_secs(self.config.narrative_timeout_secs);
        let narrative = reconcile(self.narrative.as_ref(), &ctx, timeout).await;

        Ok(AnalysisReport {
            repo_name: ctx.repo_name,
            repo_url: ctx.repo_url,
            summary: narrative.summary,
            features: narrative.features,
            languages: ctx.languages,
            frameworks: ctx.frameworks,
            databases: ctx.databases,
            architecture_type: narrative.architecture_type,
            architecture_explanation: narrative.architecture_explanation,
            mermaid_diagrams: narrative.diagrams,
            folder_tree: ctx.folder_tree,
            dependencies: manifests.dependencies,
            improvements_suggestion: narrative.improvements_suggestion,
            security_risks: narrative.security_risks,
            complexity_score,
            complexity_label,
            code_quality_score: quality_score,
            file_count: languages.file_count,
            total_lines: languages.total_lines,
            primary_language: languages.primary_language,
            language_stats: languages.stats,
            narrative_source: narrative.source,
            warnings: manifests.warnings,
            analyzed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::NarrativeError, narrative::NarrativeSource, scoring::ComplexityLabel};
    use async_trait::async_trait;
    use std::fs;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }

    fn populate(root: &Path) {
        write(root, "README.md", "# Shop\nA tiny storefront.\n");
        write(root, "requirements.txt", "fastapi==0.110\nredis\n");
        write(
            root,
            "web/package.json",
            r#"{"dependencies":{"react":"18"}}"#,
        );
        write(root, "app/main.py", "a\nb\nc\n");
        write(root, "app/test_main.py", "a\n");
        write(root, "web/src/App.jsx", "x\n");
        write(root, "node_modules/left-pad/index.js", "x\n");
    }

    /// Copies a fixture instead of talking to GitHub.
    struct FixtureCloner;

    #[async_trait]
    impl Cloner for FixtureCloner {
        async fn fetch(&self, _locator: &RepoLocator, dest: &Path) -> Result<PathBuf, AnalyzeError> {
            populate(dest);
            Ok(dest.to_path_buf())
        }
    }

    struct ModelReply(&'static str);

    #[async_trait]
    impl NarrativeService for ModelReply {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, NarrativeError> {
            Ok(self.0.to_string())
        }
    }

    fn analyzer(clone_dir: &Path, narrative: Arc<dyn NarrativeService>) -> Analyzer {
        let config = AnalyzerConfig {
            clone_dir: clone_dir.to_path_buf(),
            narrative_timeout_secs: 5,
            ..AnalyzerConfig::default()
        };
        Analyzer::new(config, Arc::new(FixtureCloner), narrative)
    }

    #[tokio::test]
    async fn local_directory_gets_a_complete_fallback_report() {
        let temp = tempfile::tempdir().unwrap();
        let repo = temp.path().join("shop");
        populate(&repo);

        let report = analyzer(temp.path(), Arc::new(DisabledNarrative))
            .analyze_local(&repo)
            .await
            .unwrap();

        assert_eq!(report.repo_name, "shop");
        assert_eq!(report.languages, vec!["Python", "JavaScript"]);
        assert_eq!(report.primary_language, "Python");
        assert_eq!(report.file_count, 3);
        assert_eq!(report.total_lines, 5);
        // nested package.json is not a root manifest
        assert_eq!(report.frameworks, vec!["FastAPI"]);
        assert_eq!(report.databases, vec!["Redis"]);
        assert_eq!(report.architecture_type, "REST API");
        assert_eq!(report.narrative_source, NarrativeSource::Fallback);
        assert_eq!(report.complexity_score, 18);
        assert_eq!(report.complexity_label, ComplexityLabel::Beginner);
        // 50 + README + test file
        assert_eq!(report.code_quality_score, 75);
        assert!(report.folder_tree.starts_with("[D] shop/\n├── [D] app/"));
        assert!(!report.folder_tree.contains("node_modules"));
        assert!(repo.exists());
    }

    #[tokio::test]
    async fn remote_analysis_uses_model_output_and_removes_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        let reply = ModelReply(r#"{"summary":"A storefront.","architecture_type":"Full-Stack"}"#);
        let report = analyzer(temp.path(), Arc::new(reply))
            .analyze("https://github.com/acme/shop")
            .await
            .unwrap();

        assert_eq!(report.repo_name, "shop");
        assert_eq!(report.repo_url, "https://github.com/acme/shop");
        assert_eq!(report.summary, "A storefront.");
        assert_eq!(report.narrative_source, NarrativeSource::Model);
        assert_eq!(report.dependencies["python"], vec!["fastapi", "redis"]);
        assert!(!temp.path().join("acme__shop").exists());
    }

    #[tokio::test]
    async fn invalid_locator_never_touches_disk() {
        let temp = tempfile::tempdir().unwrap();
        let clone_dir = temp.path().join("clones");
        let err = analyzer(&clone_dir, Arc::new(DisabledNarrative))
            .analyze("https://example.com/acme/shop")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(!clone_dir.exists());

        let err = analyzer(&clone_dir, Arc::new(DisabledNarrative))
            .analyze_local(&temp.path().join("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn empty_directory_inspection() {
        let temp = tempfile::tempdir().unwrap();
        let inspection = inspect(temp.path(), "empty", 4);
        assert_eq!(inspection.folder_tree, "[D] empty/");
        assert_eq!(inspection.languages.primary_language, "Unknown");
        assert_eq!(inspection.quality_score, 50);
    }
}
