use ignore::WalkBuilder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{classify, text};

/// Line counting looks at this many leading bytes of each file.
const LINE_COUNT_PREFIX_BYTES: usize = 100_000;

pub const UNKNOWN_LANGUAGE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LanguageStat {
    pub language: String,
    pub files: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSummary {
    /// Ranked by descending file count; ties keep walk order.
    pub languages: Vec<String>,
    pub primary_language: String,
    pub stats: Vec<LanguageStat>,
    pub file_count: usize,
    pub total_lines: usize,
}

/// Walks `root` and tallies files and lines per ranked language.
pub fn detect_languages(root: &Path) -> LanguageSummary {
    let mut stats: Vec<LanguageStat> = Vec::new();

    for path in walk_source_files(root) {
        let Some(lang) = classify::ranked_language(&path) else {
            continue;
        };
        let lines = count_lines(&path);
        match stats.iter_mut().find(|s| s.language == lang) {
            Some(stat) => {
                stat.files += 1;
                stat.lines += lines;
            }
            None => stats.push(LanguageStat {
                language: lang.to_string(),
                files: 1,
                lines,
            }),
        }
    }

    summarize(stats)
}

fn summarize(mut stats: Vec<LanguageStat>) -> LanguageSummary {
    // stable: equal counts stay in first-seen order
    stats.sort_by(|a, b| b.files.cmp(&a.files));

    let file_count = stats.iter().map(|s| s.files).sum();
    let total_lines = stats.iter().map(|s| s.lines).sum();
    let languages: Vec<String> = stats.iter().map(|s| s.language.clone()).collect();
    let primary_language = languages
        .first()
        .cloned()
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());

    LanguageSummary {
        languages,
        primary_language,
        stats,
        file_count,
        total_lines,
    }
}

fn count_lines(path: &Path) -> usize {
    text::read_file_safe(path, LINE_COUNT_PREFIX_BYTES)
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
}

/// Every non-excluded regular file under `root`, in a deterministic order.
///
/// Excluded directories are pruned before descent, and entries that cannot be
/// read are skipped.
pub fn walk_source_files(root: &Path) -> impl Iterator<Item = std::path::PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));
    let walker = builder
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            match entry.file_name().to_str() {
                Some(name) => !classify::is_excluded(name, is_dir),
                None => true,
            }
        })
        .build();

    walker.filter_map(|result| {
        let entry = result.ok()?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        is_file.then(|| entry.into_path())
    })
}
