//! Extension-to-language mapping and the exclusion rules every traversal shares.

use std::path::Path;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".env",
    "dist",
    "build",
    "target",
    ".idea",
    ".vscode",
    "coverage",
    ".pytest_cache",
    ".mypy_cache",
    "eggs",
    ".eggs",
    ".tox",
    "htmlcov",
    ".cache",
    "vendor",
];

/// Files that are noise for every component: VCS metadata, OS droppings, lock files.
const SKIP_FILES: &[&str] = &[
    ".gitignore",
    ".gitattributes",
    ".DS_Store",
    "Thumbs.db",
    "package-lock.json",
    "yarn.lock",
    "poetry.lock",
    "Pipfile.lock",
];

/// Recognized, but never counted towards language ranking.
const UNRANKED: &[&str] = &["JSON", "YAML", "TOML", "XML", "Markdown"];

pub fn language_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|s| s.to_str())?;
    let lang = match ext.to_ascii_lowercase().as_str() {
        "py" => "Python",
        "js" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "java" => "Java",
        "kt" => "Kotlin",
        "go" => "Go",
        "rs" => "Rust",
        "cpp" => "C++",
        "c" => "C",
        "cs" => "C#",
        "rb" => "Ruby",
        "php" => "PHP",
        "swift" => "Swift",
        "scala" => "Scala",
        "r" => "R",
        "dart" => "Dart",
        "lua" => "Lua",
        "sh" | "bash" => "Shell",
        "html" => "HTML",
        "css" => "CSS",
        "scss" => "SCSS",
        "sass" => "SASS",
        "sql" => "SQL",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "xml" => "XML",
        "md" => "Markdown",
        _ => return None,
    };
    Some(lang)
}

/// Languages that say something about how a project is implemented.
pub fn is_ranked_language(language: &str) -> bool {
    !UNRANKED.contains(&language)
}

/// Ranked language for `path`, if any.
pub fn ranked_language(path: &Path) -> Option<&'static str> {
    language_from_extension(path).filter(|lang| is_ranked_language(lang))
}

pub fn is_excluded_dir(name: &str) -> bool {
    name.starts_with('.') || SKIP_DIRS.contains(&name) || name.ends_with(".egg-info")
}

pub fn is_excluded_file(name: &str) -> bool {
    SKIP_FILES.contains(&name)
}

/// Single predicate consulted by the language walk, the tree builder and the
/// quality heuristics.
pub fn is_excluded(name: &str, is_dir: bool) -> bool {
    if is_dir {
        is_excluded_dir(name)
    } else {
        is_excluded_file(name)
    }
}
