//! Complexity and quality heuristics. Thresholds are fixed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

use crate::{
    languages::walk_source_files,
    manifests::{is_regular_file, README_CANDIDATES},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum ComplexityLabel {
    Beginner,
    Simple,
    Moderate,
    Complex,
    Enterprise,
}

impl ComplexityLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=19 => Self::Beginner,
            20..=39 => Self::Simple,
            40..=59 => Self::Moderate,
            60..=79 => Self::Complex,
            _ => Self::Enterprise,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Simple => "Simple",
            Self::Moderate => "Moderate",
            Self::Complex => "Complex",
            Self::Enterprise => "Enterprise",
        }
    }
}

impl fmt::Display for ComplexityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn score_complexity(file_count: usize, total_lines: usize, languages: &[String]) -> (u8, ComplexityLabel) {
    let files: u32 = match file_count {
        0..=9 => 5,
        10..=49 => 15,
        50..=199 => 22,
        _ => 30,
    };
    let lines: u32 = match total_lines {
        0..=499 => 5,
        500..=1_999 => 15,
        2_000..=9_999 => 28,
        10_000..=49_999 => 35,
        _ => 40,
    };
    let diversity = (languages.len().min(5) as u32) * 4;

    let score = (files + lines + diversity).min(100) as u8;
    (score, ComplexityLabel::from_score(score))
}

const QUALITY_BASELINE: u32 = 50;
const CI_MARKERS: &[&str] = &[".github", ".travis.yml", "Jenkinsfile", ".circleci", ".gitlab-ci.yml"];
const LINT_MARKERS: &[&str] = &[".eslintrc", ".pylintrc", ".flake8", "pyproject.toml", ".prettierrc"];

/// Baseline 50 plus one bonus per signal present, capped at 100.
pub fn score_quality(root: &Path) -> u8 {
    let any_exists = |names: &[&str]| names.iter().any(|n| root.join(n).exists());

    let mut score = QUALITY_BASELINE;
    if README_CANDIDATES.iter().any(|n| is_regular_file(&root.join(n))) {
        score += 10;
    }
    if has_test_files(root) {
        score += 15;
    }
    if any_exists(CI_MARKERS) {
        score += 10;
    }
    if any_exists(LINT_MARKERS) {
        score += 5;
    }
    if root.join("Dockerfile").exists() {
        score += 5;
    }
    if root.join("docs").exists() {
        score += 5;
    }
    score.min(100) as u8
}

/// Stops at the first file whose name mentions "test" or "spec".
fn has_test_files(root: &Path) -> bool {
    walk_source_files(root).any(|path| {
        path.file_name()
            .map(|name| {
                let name = name.to_string_lossy().to_lowercase();
                name.contains("test") || name.contains("spec")
            })
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn langs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("L{}", i)).collect()
    }

    #[test]
    fn complexity_bands() {
        assert_eq!(score_complexity(0, 0, &[]), (10, ComplexityLabel::Beginner));
        assert_eq!(score_complexity(9, 499, &langs(2)), (18, ComplexityLabel::Beginner));
        assert_eq!(score_complexity(10, 500, &[]), (30, ComplexityLabel::Simple));
        assert_eq!(score_complexity(60, 3_000, &langs(3)), (62, ComplexityLabel::Complex));
        assert_eq!(score_complexity(500, 100_000, &langs(12)), (90, ComplexityLabel::Enterprise));
    }

    #[test]
    fn label_thresholds() {
        assert_eq!(ComplexityLabel::from_score(19), ComplexityLabel::Beginner);
        assert_eq!(ComplexityLabel::from_score(20), ComplexityLabel::Simple);
        assert_eq!(ComplexityLabel::from_score(39), ComplexityLabel::Simple);
        assert_eq!(ComplexityLabel::from_score(40), ComplexityLabel::Moderate);
        assert_eq!(ComplexityLabel::from_score(59), ComplexityLabel::Moderate);
        assert_eq!(ComplexityLabel::from_score(60), ComplexityLabel::Complex);
        assert_eq!(ComplexityLabel::from_score(79), ComplexityLabel::Complex);
        assert_eq!(ComplexityLabel::from_score(80), ComplexityLabel::Enterprise);
        assert_eq!(ComplexityLabel::Moderate.to_string(), "Moderate");
    }

    #[test]
    fn bare_directory_scores_baseline() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "print(1)\n").unwrap();
        assert_eq!(score_quality(dir.path()), 50);
    }

    #[test]
    fn every_signal_counts_once_and_total_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("README.md"), "# x").unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();
        fs::write(root.join("tests/test_a.py"), "").unwrap();
        fs::write(root.join("tests/test_b.py"), "").unwrap();
        fs::create_dir_all(root.join(".github/workflows")).unwrap();
        fs::write(root.join(".travis.yml"), "").unwrap();
        fs::write(root.join(".flake8"), "").unwrap();
        fs::write(root.join("pyproject.toml"), "").unwrap();
        fs::write(root.join("Dockerfile"), "FROM scratch").unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();

        // 50 + 10 + 15 + 10 + 5 + 5 + 5
        assert_eq!(score_quality(root), 100);
    }

    #[test]
    fn any_readme_name_earns_the_bonus() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.rst"), "Title\n").unwrap();
        assert_eq!(score_quality(dir.path()), 60);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_readme_does_not_count() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("notes.md"), "# x").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("notes.md"), dir.path().join("README.md")).unwrap();
        assert_eq!(score_quality(dir.path()), 50);
    }

    #[test]
    fn test_files_inside_excluded_dirs_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.spec.js"), "").unwrap();
        assert_eq!(score_quality(dir.path()), 50);

        fs::write(dir.path().join("App.Spec.ts"), "").unwrap();
        assert_eq!(score_quality(dir.path()), 65);
    }
}
