use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneMethod {
    /// Download the codeload zip archive over HTTPS.
    Archive,
    /// Shallow clone through the `git` CLI.
    Git,
}

impl FromStr for CloneMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" | "zip" => Ok(CloneMethod::Archive),
            "git" => Ok(CloneMethod::Git),
            other => Err(format!("unknown clone method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub clone_dir: PathBuf,
    pub max_repo_size_mb: u64,
    pub narrative_timeout_secs: u64,
    pub tree_depth: usize,
    pub clone_method: CloneMethod,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "mistral".to_string(),
            clone_dir: PathBuf::from("./temp_repos"),
            max_repo_size_mb: 200,
            narrative_timeout_secs: 120,
            tree_depth: 4,
            clone_method: CloneMethod::Archive,
        }
    }
}

impl AnalyzerConfig {
    /// Defaults overridden by whatever is set in the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = non_empty(lookup("OLLAMA_BASE_URL")) {
            cfg.ollama_base_url = v;
        }
        if let Some(v) = non_empty(lookup("OLLAMA_MODEL")) {
            cfg.ollama_model = v;
        }
        if let Some(v) = non_empty(lookup("TEMP_CLONE_DIR")) {
            cfg.clone_dir = PathBuf::from(v);
        }
        parse_into(&lookup, "MAX_REPO_SIZE_MB", &mut cfg.max_repo_size_mb);
        parse_into(&lookup, "NARRATIVE_TIMEOUT_SECS", &mut cfg.narrative_timeout_secs);
        parse_into(&lookup, "TREE_DEPTH", &mut cfg.tree_depth);
        parse_into(&lookup, "CLONE_METHOD", &mut cfg.clone_method);
        cfg
    }

    pub fn max_repo_bytes(&self) -> u64 {
        self.max_repo_size_mb.saturating_mul(1024 * 1024)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_into<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    let Some(raw) = non_empty(lookup(key)) else {
        return;
    };
    match raw.parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => warn!(setting = key, value = %raw, "ignoring unparsable setting, keeping default"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = AnalyzerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(cfg.ollama_base_url, "http://localhost:11434");
        assert_eq!(cfg.ollama_model, "mistral");
        assert_eq!(cfg.clone_dir, PathBuf::from("./temp_repos"));
        assert_eq!(cfg.max_repo_size_mb, 200);
        assert_eq!(cfg.tree_depth, 4);
        assert_eq!(cfg.clone_method, CloneMethod::Archive);
    }

    #[test]
    fn environment_overrides_and_bad_numbers_fall_back() {
        let cfg = AnalyzerConfig::from_lookup(lookup_from(&[
            ("OLLAMA_MODEL", "llama3"),
            ("TEMP_CLONE_DIR", "/tmp/rv"),
            ("MAX_REPO_SIZE_MB", "not-a-number"),
            ("NARRATIVE_TIMEOUT_SECS", "15"),
            ("CLONE_METHOD", "git"),
        ]));
        assert_eq!(cfg.ollama_model, "llama3");
        assert_eq!(cfg.clone_dir, PathBuf::from("/tmp/rv"));
        assert_eq!(cfg.max_repo_size_mb, 200);
        assert_eq!(cfg.narrative_timeout_secs, 15);
        assert_eq!(cfg.clone_method, CloneMethod::Git);
        assert_eq!(cfg.max_repo_bytes(), 200 * 1024 * 1024);
    }
}
